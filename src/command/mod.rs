// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Shelly command definitions.
//!
//! Commands are fire-and-forget publishes to a fixed command sub-topic. A
//! [`Command`] only knows its topic suffix and payload text; the device
//! handle supplies the base topic.
//!
//! | Command | Topic suffix | Payload |
//! |---------|--------------|---------|
//! | [`ValveCommand::ValvePosition`] | `valve_pos` | decimal text |
//! | [`ValveCommand::ScheduleEnabled`] | `schedule` | `1` or `0` |
//! | [`ValveCommand::TargetTemperature`] | `target_t` | decimal text, °C |
//! | [`ValveCommand::ExternalTemperature`] | `ext_t` | decimal text, °C |
//! | [`ValveCommand::RequestSettings`] | `settings` | empty |
//!
//! # Examples
//!
//! ```
//! use shellor_lib::command::{Command, ValveCommand};
//!
//! let cmd = ValveCommand::TargetTemperature(21.5);
//! assert_eq!(cmd.topic_suffix(), "target_t");
//! assert_eq!(cmd.payload(), "21.5");
//! ```

mod valve;

pub use valve::ValveCommand;

use crate::error::ValueError;

/// A command that can be published to a Shelly device.
pub trait Command {
    /// Returns the last topic level the command is published on.
    fn topic_suffix(&self) -> &'static str;

    /// Returns the payload text.
    fn payload(&self) -> String;

    /// Checks the command's arguments before publishing.
    ///
    /// # Errors
    ///
    /// Returns `ValueError` if an argument cannot be sent.
    fn validate(&self) -> Result<(), ValueError> {
        Ok(())
    }
}
