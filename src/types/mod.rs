// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types for Shelly device control.
//!
//! - [`DeviceId`] - Non-empty device identifier used in topic names
//! - [`ContactState`] - Open/close state of a contact sensor

mod contact_state;
mod device_id;

pub use contact_state::ContactState;
pub use device_id::DeviceId;
