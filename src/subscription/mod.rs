// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Subscribe-and-decode helpers shared by the device types.
//!
//! [`subscribe_json`] decodes each payload into a typed record and hands it
//! to the callback. A payload that fails to decode is logged with its topic,
//! counted in [`MqttClient::decode_failures`](crate::protocol::MqttClient::decode_failures)
//! and dropped; the callback only ever sees fully decoded records, and later
//! messages are unaffected.
//!
//! [`subscribe_text`] delivers the raw payload text without decoding.
//!
//! ```no_run
//! use shellor_lib::protocol::{MqttClient, MqttConfig};
//! use shellor_lib::response::ValveStatus;
//! use shellor_lib::subscription::subscribe_json;
//!
//! # async fn example() -> shellor_lib::Result<()> {
//! let client = MqttClient::new(MqttConfig::from_url("mqtt://192.168.1.50:1883")?);
//! client.connect().await?;
//!
//! subscribe_json(&client, "shellies/shellytrv-60A423DAE8DE/status", |status: ValveStatus| {
//!     println!("target {} {}", status.target_t.value, status.target_t.units);
//! })
//! .await?;
//! # Ok(())
//! # }
//! ```

mod handler;

pub use handler::{decode_json, json_handler, subscribe_json, subscribe_text, text_handler};
