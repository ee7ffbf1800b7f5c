// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Radiator valve commands.

use super::Command;
use crate::error::ValueError;

/// Commands accepted on `shellies/shellytrv-<id>/thermostat/0/command/...`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValveCommand {
    /// Moves the valve to a position in percent.
    ValvePosition(f32),
    /// Enables or disables the weekly schedule.
    ScheduleEnabled(bool),
    /// Sets the target temperature in °C.
    TargetTemperature(f32),
    /// Feeds an external temperature reading in °C.
    ExternalTemperature(f32),
    /// Asks the device to publish its settings.
    RequestSettings,
}

impl ValveCommand {
    fn numeric_value(&self) -> Option<f32> {
        match self {
            Self::ValvePosition(v) | Self::TargetTemperature(v) | Self::ExternalTemperature(v) => {
                Some(*v)
            }
            Self::ScheduleEnabled(_) | Self::RequestSettings => None,
        }
    }
}

impl Command for ValveCommand {
    fn topic_suffix(&self) -> &'static str {
        match self {
            Self::ValvePosition(_) => "valve_pos",
            Self::ScheduleEnabled(_) => "schedule",
            Self::TargetTemperature(_) => "target_t",
            Self::ExternalTemperature(_) => "ext_t",
            Self::RequestSettings => "settings",
        }
    }

    fn payload(&self) -> String {
        match self {
            Self::ScheduleEnabled(enabled) => u8::from(*enabled).to_string(),
            Self::RequestSettings => String::new(),
            Self::ValvePosition(v) | Self::TargetTemperature(v) | Self::ExternalTemperature(v) => {
                v.to_string()
            }
        }
    }

    fn validate(&self) -> Result<(), ValueError> {
        match self.numeric_value() {
            Some(value) if !value.is_finite() => Err(ValueError::NonFinite {
                field: self.topic_suffix(),
                value,
            }),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_suffixes() {
        assert_eq!(ValveCommand::ValvePosition(50.0).topic_suffix(), "valve_pos");
        assert_eq!(ValveCommand::ScheduleEnabled(true).topic_suffix(), "schedule");
        assert_eq!(ValveCommand::TargetTemperature(20.0).topic_suffix(), "target_t");
        assert_eq!(ValveCommand::ExternalTemperature(20.0).topic_suffix(), "ext_t");
        assert_eq!(ValveCommand::RequestSettings.topic_suffix(), "settings");
    }

    #[test]
    fn decimal_payloads() {
        assert_eq!(ValveCommand::TargetTemperature(21.5).payload(), "21.5");
        assert_eq!(ValveCommand::TargetTemperature(20.0).payload(), "20");
        assert_eq!(ValveCommand::ValvePosition(37.25).payload(), "37.25");
        assert_eq!(ValveCommand::ExternalTemperature(-3.5).payload(), "-3.5");
    }

    #[test]
    fn schedule_payload_is_one_or_zero() {
        assert_eq!(ValveCommand::ScheduleEnabled(true).payload(), "1");
        assert_eq!(ValveCommand::ScheduleEnabled(false).payload(), "0");
    }

    #[test]
    fn settings_payload_is_empty() {
        assert_eq!(ValveCommand::RequestSettings.payload(), "");
    }

    #[test]
    fn non_finite_values_are_rejected() {
        let err = ValveCommand::TargetTemperature(f32::NAN).validate().unwrap_err();
        assert!(matches!(err, ValueError::NonFinite { field: "target_t", .. }));
        assert!(ValveCommand::ValvePosition(f32::INFINITY).validate().is_err());
        assert!(ValveCommand::ExternalTemperature(19.0).validate().is_ok());
        assert!(ValveCommand::RequestSettings.validate().is_ok());
    }
}
