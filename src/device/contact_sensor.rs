// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Shelly Door/Window 2 contact sensor.

use crate::error::Result;
use crate::protocol::{MqttClient, MqttConfig, topics};
use crate::response::ContactSensorInfo;
use crate::subscription::{subscribe_json, subscribe_text};
use crate::types::{ContactState, DeviceId};

use super::DeviceHandle;

/// A Shelly Door/Window 2 contact sensor.
///
/// # Examples
///
/// ```no_run
/// use shellor_lib::device::ContactSensor;
/// use shellor_lib::protocol::MqttConfig;
///
/// # async fn example() -> shellor_lib::Result<()> {
/// let sensor = ContactSensor::new("C92B94", MqttConfig::from_url("192.168.1.50")?)?;
/// sensor.connect().await?;
///
/// sensor
///     .subscribe_open_state(|| println!("opened"), || println!("closed"))
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ContactSensor {
    handle: DeviceHandle,
}

impl ContactSensor {
    /// Creates a sensor handle without connecting.
    ///
    /// # Errors
    ///
    /// Returns error if `id` is empty.
    pub fn new(id: impl Into<String>, config: MqttConfig) -> Result<Self> {
        let id = DeviceId::new(id)?;
        Ok(Self {
            handle: DeviceHandle::new(topics::CONTACT_SENSOR_PREFIX, id, config),
        })
    }

    /// Returns the underlying device handle.
    #[must_use]
    pub fn handle(&self) -> &DeviceHandle {
        &self.handle
    }

    /// Returns the MQTT client owned by this sensor.
    #[must_use]
    pub fn client(&self) -> &MqttClient {
        self.handle.client()
    }

    /// Returns `shellydw2-<id>`.
    #[must_use]
    pub fn device_name(&self) -> String {
        self.handle.device_name()
    }

    /// Returns `shellies/shellydw2-<id>`.
    #[must_use]
    pub fn base_topic(&self) -> String {
        self.handle.base_topic()
    }

    /// Opens the broker connection.
    ///
    /// # Errors
    ///
    /// Returns error if the connection fails.
    pub async fn connect(&self) -> Result<()> {
        self.handle.connect().await
    }

    /// Closes the broker connection.
    ///
    /// # Errors
    ///
    /// Returns error if the disconnect request fails.
    pub async fn close(&self) -> Result<()> {
        self.handle.close().await
    }

    /// Calls `on_open` for every `open` and `on_close` for every `close`
    /// published on the sensor state topic. Other payloads are ignored.
    ///
    /// # Errors
    ///
    /// Returns error if the subscription fails.
    pub async fn subscribe_open_state<O, C>(&self, on_open: O, on_close: C) -> Result<()>
    where
        O: Fn() + Send + Sync + 'static,
        C: Fn() + Send + Sync + 'static,
    {
        let topic = self.handle.topic(topics::SENSOR_STATE);
        let device = self.device_name();

        subscribe_text(self.client(), &topic, move |payload| {
            if let Some(state) = dispatch_contact_state(payload, &on_open, &on_close) {
                tracing::info!(device = %device, state = %state, "Contact state changed");
            }
        })
        .await?;
        Ok(())
    }

    /// Delivers every info report decoded as [`ContactSensorInfo`].
    ///
    /// # Errors
    ///
    /// Returns error if the subscription fails.
    pub async fn subscribe_info<F>(&self, callback: F) -> Result<()>
    where
        F: Fn(ContactSensorInfo) + Send + Sync + 'static,
    {
        let topic = self.handle.topic(topics::INFO);
        subscribe_json(self.client(), &topic, callback).await?;
        Ok(())
    }
}

/// Invokes the handler matching `payload` and returns the recognized state.
fn dispatch_contact_state(
    payload: &str,
    on_open: &dyn Fn(),
    on_close: &dyn Fn(),
) -> Option<ContactState> {
    let state = payload.parse::<ContactState>().ok()?;
    match state {
        ContactState::Open => on_open(),
        ContactState::Close => on_close(),
    }
    Some(state)
}
