// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Sensor readings shared by several Shelly reports.

use serde::{Deserialize, Serialize};

/// Battery charge as reported under the `bat` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatteryReading {
    /// Charge level in percent.
    pub value: u8,
    /// Battery voltage in volts.
    pub voltage: f32,
}

/// Temperature as reported under the `tmp` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureReading {
    /// Temperature in `units`.
    pub value: f32,
    /// Unit, `C` or `F`.
    pub units: String,
    /// Whether the sensor considers the reading valid.
    pub is_valid: bool,
}

/// Illumination as reported under the `lux` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LuxReading {
    /// Illuminance in lux.
    pub value: f32,
    /// Firmware classification such as `dark`, `twilight` or `bright`.
    pub illumination: String,
    /// Whether the sensor considers the reading valid.
    pub is_valid: bool,
}
