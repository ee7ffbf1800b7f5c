// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Shelly MQTT topic names.
//!
//! Shelly firmware publishes under `shellies/<type>-<id>/...` and listens for
//! commands under the same base topic. All functions here are pure string
//! formatting.
//!
//! ```
//! use shellor_lib::protocol::topics;
//!
//! let name = topics::device_name(topics::VALVE_PREFIX, "60A423DAE8DE");
//! assert_eq!(
//!     topics::valve_command(&topics::base_topic(&name), "target_t"),
//!     "shellies/shellytrv-60A423DAE8DE/thermostat/0/command/target_t"
//! );
//! ```

/// Namespace every Shelly device publishes under.
pub const NAMESPACE: &str = "shellies";

/// Device type prefix of the door/window contact sensor.
pub const CONTACT_SENSOR_PREFIX: &str = "shellydw2";

/// Device type prefix of the thermostatic radiator valve.
pub const VALVE_PREFIX: &str = "shellytrv";

/// Sub-topic carrying `open`/`close` contact state.
pub const SENSOR_STATE: &str = "sensor/state";

/// Sub-topic carrying the JSON info report.
pub const INFO: &str = "info";

/// Sub-topic carrying the JSON status report.
pub const STATUS: &str = "status";

/// Sub-topic prefix for thermostat commands.
pub const THERMOSTAT_COMMAND: &str = "thermostat/0/command";

/// Returns `<prefix>-<id>`.
#[must_use]
pub fn device_name(prefix: &str, id: &str) -> String {
    format!("{prefix}-{id}")
}

/// Returns `shellies/<device_name>`.
#[must_use]
pub fn base_topic(device_name: &str) -> String {
    format!("{NAMESPACE}/{device_name}")
}

/// Returns `<base>/<sub>`.
#[must_use]
pub fn sub_topic(base: &str, sub: &str) -> String {
    format!("{base}/{sub}")
}

/// Returns the filter matching every sub-topic of `base`.
#[must_use]
pub fn wildcard(base: &str) -> String {
    format!("{base}/#")
}

/// Returns `<base>/thermostat/0/command/<command>`.
#[must_use]
pub fn valve_command(base: &str, command: &str) -> String {
    format!("{base}/{THERMOSTAT_COMMAND}/{command}")
}
