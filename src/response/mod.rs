// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Decoded Shelly JSON reports.
//!
//! Field names match the device firmware's own lower-snake-case keys. Each
//! record is produced from exactly one payload; unknown keys are ignored.

mod contact;
mod readings;
mod valve;

pub use contact::ContactSensorInfo;
pub use readings::{BatteryReading, LuxReading, TemperatureReading};
pub use valve::{TargetTemperature, ValveInfo, ValveStatus, ValveThermostat};
