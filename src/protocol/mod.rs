// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! MQTT transport for Shelly devices.
//!
//! - [`MqttConfig`]: broker address, credentials and timeouts
//! - [`MqttClient`]: one broker connection with publish/subscribe
//! - [`TopicRouter`]: dispatches inbound messages to subscription handlers
//! - [`topics`]: topic names derived from a device identity
//!
//! Every publish and subscribe uses the same delivery level, [`QOS`].

mod config;
mod mqtt;
mod topic_router;
pub mod topics;

pub use config::{
    ENV_BROKER_PASSWORD, ENV_BROKER_URL, ENV_BROKER_USERNAME, MqttConfig, MqttConfigBuilder,
};
pub use mqtt::MqttClient;
pub use topic_router::{Message, MessageHandler, TopicRouter, topic_matches};

/// Delivery level used for every publish and subscribe.
pub const QOS: rumqttc::QoS = rumqttc::QoS::AtLeastOnce;
