// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Shelly device handles.
//!
//! A [`DeviceHandle`] pairs a device identity with its own MQTT connection
//! and derives topic names from the identity. The device types build their
//! operations on top of it:
//!
//! - [`ContactSensor`]: Shelly Door/Window 2 (`shellydw2`)
//! - [`RadiatorValve`]: Shelly TRV (`shellytrv`)
//!
//! Topic names are pure functions of the identity and never depend on the
//! connection state.
//!
//! ```no_run
//! use shellor_lib::device::RadiatorValve;
//! use shellor_lib::protocol::MqttConfig;
//!
//! # async fn example() -> shellor_lib::Result<()> {
//! let valve = RadiatorValve::new("60A423DAE8DE", MqttConfig::from_env()?)?;
//! valve.connect().await?;
//!
//! valve.subscribe_status(|status| {
//!     println!("{} °C", status.tmp.value);
//! })
//! .await?;
//! valve.set_target_temperature(21.5).await?;
//!
//! valve.close().await?;
//! # Ok(())
//! # }
//! ```

mod contact_sensor;
mod radiator_valve;

pub use contact_sensor::ContactSensor;
pub use radiator_valve::RadiatorValve;

use crate::error::Result;
use crate::protocol::{MqttClient, MqttConfig, topics};
use crate::types::DeviceId;

/// Identity of one device plus the MQTT connection it owns.
#[derive(Debug, Clone)]
pub struct DeviceHandle {
    prefix: &'static str,
    id: DeviceId,
    client: MqttClient,
}

impl DeviceHandle {
    /// Creates a handle without connecting.
    #[must_use]
    pub fn new(prefix: &'static str, id: DeviceId, config: MqttConfig) -> Self {
        let handle = Self {
            prefix,
            id,
            client: MqttClient::new(config),
        };
        tracing::debug!(device = %handle.device_name(), "Created device handle");
        handle
    }

    /// Returns the device identifier.
    #[must_use]
    pub fn id(&self) -> &DeviceId {
        &self.id
    }

    /// Returns the MQTT client owned by this device.
    #[must_use]
    pub fn client(&self) -> &MqttClient {
        &self.client
    }

    /// Returns `<prefix>-<id>`, e.g. `shellydw2-C92B94`.
    #[must_use]
    pub fn device_name(&self) -> String {
        topics::device_name(self.prefix, self.id.as_str())
    }

    /// Returns `shellies/<device_name>`.
    #[must_use]
    pub fn base_topic(&self) -> String {
        topics::base_topic(&self.device_name())
    }

    /// Returns `<base_topic>/<sub>`.
    #[must_use]
    pub fn topic(&self, sub: &str) -> String {
        topics::sub_topic(&self.base_topic(), sub)
    }

    /// Opens the device's broker connection.
    ///
    /// # Errors
    ///
    /// Returns error if the broker cannot be reached or refuses the
    /// connection.
    pub async fn connect(&self) -> Result<()> {
        self.client.connect().await?;
        tracing::info!(device = %self.device_name(), "Connected");
        Ok(())
    }

    /// Closes the device's broker connection, ending all its subscriptions.
    ///
    /// # Errors
    ///
    /// Returns error if the disconnect request fails.
    pub async fn close(&self) -> Result<()> {
        self.client.close().await?;
        tracing::info!(device = %self.device_name(), "Disconnected");
        Ok(())
    }
}
