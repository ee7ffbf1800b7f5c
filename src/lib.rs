// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `ShelloR` Lib - A Rust library to talk to Shelly sensors over MQTT.
//!
//! This library provides async, typed access to battery-powered Shelly
//! devices through an MQTT broker: it builds the per-device topic names,
//! publishes commands and decodes the JSON reports into typed records.
//!
//! # Supported Devices
//!
//! - **Shelly Door/Window 2** ([`ContactSensor`]): open/close events, info reports
//! - **Shelly TRV** ([`RadiatorValve`]): target/external temperature, valve
//!   position, schedule, status and info reports
//!
//! Every device handle owns its own broker connection, configured through an
//! explicit [`MqttConfig`].
//!
//! # Quick Start
//!
//! ## Contact Sensor
//!
//! ```no_run
//! use shellor_lib::{ContactSensor, MqttConfig};
//!
//! #[tokio::main]
//! async fn main() -> shellor_lib::Result<()> {
//!     let sensor = ContactSensor::new("C92B94", MqttConfig::from_env()?)?;
//!     sensor.connect().await?;
//!
//!     sensor
//!         .subscribe_open_state(|| println!("window opened"), || println!("window closed"))
//!         .await?;
//!     sensor
//!         .subscribe_info(|info| println!("battery {}%", info.bat.value))
//!         .await?;
//!
//!     tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
//!     sensor.close().await
//! }
//! ```
//!
//! ## Radiator Valve
//!
//! ```no_run
//! use shellor_lib::{MqttConfig, RadiatorValve};
//!
//! #[tokio::main]
//! async fn main() -> shellor_lib::Result<()> {
//!     let config = MqttConfig::builder()
//!         .host("192.168.1.50")
//!         .credentials("user", "password")
//!         .build()?;
//!
//!     let valve = RadiatorValve::new("60A423DAE8DE", config)?;
//!     valve.connect().await?;
//!
//!     valve
//!         .subscribe_status(|status| println!("now {} °C", status.tmp.value))
//!         .await?;
//!     valve.set_target_temperature(21.5).await?;
//!
//!     valve.close().await
//! }
//! ```

pub mod command;
pub mod device;
pub mod error;
pub mod protocol;
pub mod response;
pub mod subscription;
pub mod types;

pub use command::{Command, ValveCommand};
pub use device::{ContactSensor, DeviceHandle, RadiatorValve};
pub use error::{Error, ParseError, ProtocolError, Result, ValueError};
pub use protocol::{Message, MqttClient, MqttConfig, MqttConfigBuilder, TopicRouter};
pub use response::{
    BatteryReading, ContactSensorInfo, LuxReading, TargetTemperature, TemperatureReading,
    ValveInfo, ValveStatus, ValveThermostat,
};
pub use types::{ContactState, DeviceId};
