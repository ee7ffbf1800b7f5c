// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Door/window contact sensor info report.

use serde::{Deserialize, Serialize};

use super::{BatteryReading, LuxReading, TemperatureReading};

/// Report published on `shellies/shellydw2-<id>/info`.
///
/// # Examples
///
/// ```
/// use shellor_lib::response::ContactSensorInfo;
///
/// let json = r#"{
///     "bat": {"value": 92, "voltage": 5.8},
///     "tmp": {"value": 21.3, "units": "C", "tC": 21.3, "is_valid": true},
///     "lux": {"value": 12, "illumination": "dark", "is_valid": true}
/// }"#;
/// let info: ContactSensorInfo = serde_json::from_str(json).unwrap();
/// assert_eq!(info.bat.value, 92);
/// assert_eq!(info.lux.illumination, "dark");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactSensorInfo {
    /// Battery charge.
    pub bat: BatteryReading,
    /// Temperature reading.
    pub tmp: TemperatureReading,
    /// Illumination reading.
    pub lux: LuxReading,
}
