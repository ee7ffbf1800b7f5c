// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Thermostatic radiator valve reports.

use serde::{Deserialize, Serialize};

use super::{BatteryReading, TemperatureReading};

/// Target temperature setting as reported under the `target_t` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetTemperature {
    /// Whether temperature control is enabled.
    pub enabled: bool,
    /// Target temperature in `units`.
    pub value: f32,
    /// Unit, `C` or `F`.
    pub units: String,
}

/// One entry of the `thermostats` array in the valve info report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValveThermostat {
    /// Valve position in percent.
    pub pos: f32,
    /// Whether the weekly schedule is active.
    pub schedule: bool,
    /// Active schedule profile.
    pub schedule_profile: u32,
    /// Remaining boost duration in minutes.
    pub boost_minutes: u32,
    /// Target temperature setting.
    pub target_t: TargetTemperature,
    /// Measured temperature.
    pub tmp: TemperatureReading,
}

/// Report published on `shellies/shellytrv-<id>/info`.
///
/// The `bat` key is missing from some firmware versions' reports, so
/// [`ValveInfo::bat`] is `None` rather than a default reading when absent.
///
/// # Examples
///
/// ```
/// use shellor_lib::response::ValveInfo;
///
/// let json = r#"{"calibrated": true, "charger": false, "ps_mode": 0,
///     "dbg_flags": 0, "thermostats": []}"#;
/// let info: ValveInfo = serde_json::from_str(json).unwrap();
/// assert!(info.calibrated);
/// assert!(info.bat.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValveInfo {
    /// Whether the valve has been calibrated.
    pub calibrated: bool,
    /// Whether a charger is attached.
    pub charger: bool,
    /// Power-save mode.
    pub ps_mode: i32,
    /// Firmware debug flags.
    pub dbg_flags: i32,
    /// Per-thermostat readings.
    pub thermostats: Vec<ValveThermostat>,
    /// Battery charge, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bat: Option<BatteryReading>,
}

/// Report published on `shellies/shellytrv-<id>/status`.
///
/// # Examples
///
/// ```
/// use shellor_lib::response::ValveStatus;
///
/// let json = r#"{"target_t":{"enabled":true,"value":20,"units":"C"},
///     "tmp":{"value":19.5,"units":"C","is_valid":true},
///     "temperature_offset":0,"bat":87.0}"#;
/// let status: ValveStatus = serde_json::from_str(json).unwrap();
/// assert_eq!(status.target_t.value, 20.0);
/// assert_eq!(status.bat, 87.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValveStatus {
    /// Target temperature setting.
    pub target_t: TargetTemperature,
    /// Measured temperature.
    pub tmp: TemperatureReading,
    /// Offset applied to the measured temperature.
    pub temperature_offset: f32,
    /// Battery charge in percent.
    pub bat: f32,
}
