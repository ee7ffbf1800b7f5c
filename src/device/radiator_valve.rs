// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Shelly TRV thermostatic radiator valve.

use std::sync::Arc;

use crate::command::{Command, ValveCommand};
use crate::error::Result;
use crate::protocol::{Message, MqttClient, MqttConfig, topics};
use crate::response::{ValveInfo, ValveStatus};
use crate::subscription::subscribe_json;
use crate::types::DeviceId;

use super::DeviceHandle;

/// A Shelly TRV thermostatic radiator valve.
///
/// Setters publish a single command and return once the client has accepted
/// it for transmission. Nothing waits for the device to apply it; subscribe
/// to [`status`](Self::subscribe_status) or [`info`](Self::subscribe_info)
/// to observe the result.
#[derive(Debug, Clone)]
pub struct RadiatorValve {
    handle: DeviceHandle,
}

impl RadiatorValve {
    /// Creates a valve handle without connecting.
    ///
    /// # Errors
    ///
    /// Returns error if `id` is empty.
    pub fn new(id: impl Into<String>, config: MqttConfig) -> Result<Self> {
        let id = DeviceId::new(id)?;
        Ok(Self {
            handle: DeviceHandle::new(topics::VALVE_PREFIX, id, config),
        })
    }

    /// Returns the underlying device handle.
    #[must_use]
    pub fn handle(&self) -> &DeviceHandle {
        &self.handle
    }

    /// Returns the MQTT client owned by this valve.
    #[must_use]
    pub fn client(&self) -> &MqttClient {
        self.handle.client()
    }

    /// Returns `shellytrv-<id>`.
    #[must_use]
    pub fn device_name(&self) -> String {
        self.handle.device_name()
    }

    /// Returns `shellies/shellytrv-<id>`.
    #[must_use]
    pub fn base_topic(&self) -> String {
        self.handle.base_topic()
    }

    /// Returns the topic `command` is published on.
    #[must_use]
    pub fn command_topic(&self, command: &ValveCommand) -> String {
        topics::valve_command(&self.base_topic(), command.topic_suffix())
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

    /// Publishes a command to the valve.
    ///
    /// # Errors
    ///
    /// Returns error if a numeric argument is not finite or the publish
    /// fails. Failed publishes are not retried.
    pub async fn send(&self, command: ValveCommand) -> Result<()> {
        command.validate()?;

        let topic = self.command_topic(&command);
        let payload = command.payload();
        tracing::info!(
            device = %self.device_name(),
            command = %command.topic_suffix(),
            payload = %payload,
            "Sending valve command"
        );

        self.client().publish(&topic, payload).await?;
        Ok(())
    }

    /// Moves the valve to `position` percent.
    ///
    /// # Errors
    ///
    /// See [`send`](Self::send).
    pub async fn set_valve_position(&self, position: f32) -> Result<()> {
        self.send(ValveCommand::ValvePosition(position)).await
    }

    /// Enables or disables the weekly schedule.
    ///
    /// # Errors
    ///
    /// See [`send`](Self::send).
    pub async fn set_schedule_enabled(&self, enabled: bool) -> Result<()> {
        self.send(ValveCommand::ScheduleEnabled(enabled)).await
    }

    /// Sets the target temperature in °C.
    ///
    /// # Errors
    ///
    /// See [`send`](Self::send).
    pub async fn set_target_temperature(&self, celsius: f32) -> Result<()> {
        self.send(ValveCommand::TargetTemperature(celsius)).await
    }

    /// Feeds an external temperature reading in °C.
    ///
    /// # Errors
    ///
    /// See [`send`](Self::send).
    pub async fn set_external_temperature(&self, celsius: f32) -> Result<()> {
        self.send(ValveCommand::ExternalTemperature(celsius)).await
    }

    /// Asks the valve to publish its settings.
    ///
    /// The reply is not correlated with this request; subscribe to the
    /// device's topics separately to receive it.
    ///
    /// # Errors
    ///
    /// See [`send`](Self::send).
    pub async fn request_settings(&self) -> Result<()> {
        self.send(ValveCommand::RequestSettings).await
    }

    /// Delivers every status report decoded as [`ValveStatus`].
    ///
    /// # Errors
    ///
    /// Returns error if the subscription fails.
    pub async fn subscribe_status<F>(&self, callback: F) -> Result<()>
    where
        F: Fn(ValveStatus) + Send + Sync + 'static,
    {
        let topic = self.handle.topic(topics::STATUS);
        subscribe_json(self.client(), &topic, callback).await?;
        Ok(())
    }

    /// Delivers every info report decoded as [`ValveInfo`].
    ///
    /// # Errors
    ///
    /// Returns error if the subscription fails.
    pub async fn subscribe_info<F>(&self, callback: F) -> Result<()>
    where
        F: Fn(ValveInfo) + Send + Sync + 'static,
    {
        let topic = self.handle.topic(topics::INFO);
        subscribe_json(self.client(), &topic, callback).await?;
        Ok(())
    }

    /// Logs every message published under the valve's base topic.
    ///
    /// Meant for diagnostics; payloads are not decoded.
    ///
    /// # Errors
    ///
    /// Returns error if the subscription fails.
    pub async fn subscribe_all(&self) -> Result<()> {
        let filter = topics::wildcard(&self.base_topic());
        let device = self.device_name();

        let handler = Arc::new(move |message: &Message| {
            tracing::info!(
                device = %device,
                topic = %message.topic(),
                payload = %message.payload_lossy(),
                "Received message"
            );
        });
        self.client().subscribe(&filter, handler).await?;
        Ok(())
    }
}
