// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! MQTT connection configuration.
//!
//! Every device handle receives its own [`MqttConfig`] value; there is no
//! process-wide broker setting.
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//! use shellor_lib::protocol::MqttConfig;
//!
//! let config = MqttConfig::builder()
//!     .host("192.168.1.50")
//!     .port(1883)
//!     .credentials("user", "password")
//!     .quiesce_timeout(Duration::from_millis(500))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.host(), "192.168.1.50");
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::error::ProtocolError;

/// Environment variable holding the broker URL.
pub const ENV_BROKER_URL: &str = "MQTT_BROKER_URL";
/// Environment variable holding the broker username.
pub const ENV_BROKER_USERNAME: &str = "MQTT_BROKER_USERNAME";
/// Environment variable holding the broker password.
pub const ENV_BROKER_PASSWORD: &str = "MQTT_BROKER_PASSWORD";

const DEFAULT_PORT: u16 = 1883;

/// Global counter for generating unique client IDs.
static CLIENT_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Configuration for one MQTT broker connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MqttConfig {
    host: String,
    port: u16,
    credentials: Option<(String, String)>,
    client_id: Option<String>,
    keep_alive: Duration,
    connection_timeout: Duration,
    subscribe_timeout: Duration,
    quiesce_timeout: Duration,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: DEFAULT_PORT,
            credentials: None,
            client_id: None,
            keep_alive: Duration::from_secs(30),
            connection_timeout: Duration::from_secs(10),
            subscribe_timeout: Duration::from_secs(10),
            quiesce_timeout: Duration::from_millis(250),
        }
    }
}

impl MqttConfig {
    /// Creates a new builder.
    #[must_use]
    pub fn builder() -> MqttConfigBuilder {
        MqttConfigBuilder::default()
    }

    /// Creates a configuration from a broker URL with default settings.
    ///
    /// Accepts `mqtt://host:port`, `tcp://host:port`, `host:port` or `host`.
    ///
    /// # Errors
    ///
    /// Returns error if the host is empty or the port is not a number.
    pub fn from_url(url: &str) -> Result<Self, ProtocolError> {
        let (host, port) = parse_mqtt_url(url)?;
        Self::builder().host(host).port(port).build()
    }

    /// Creates a configuration from the `MQTT_BROKER_*` environment variables.
    ///
    /// `MQTT_BROKER_URL` is required. Credentials are applied only when
    /// `MQTT_BROKER_USERNAME` is set; a missing password is treated as empty.
    ///
    /// # Errors
    ///
    /// Returns error if `MQTT_BROKER_URL` is unset or invalid.
    pub fn from_env() -> Result<Self, ProtocolError> {
        let url = std::env::var(ENV_BROKER_URL)
            .map_err(|_| ProtocolError::InvalidAddress(format!("{ENV_BROKER_URL} is not set")))?;
        let mut config = Self::from_url(&url)?;

        if let Ok(username) = std::env::var(ENV_BROKER_USERNAME) {
            let password = std::env::var(ENV_BROKER_PASSWORD).unwrap_or_default();
            config.credentials = Some((username, password));
        }

        Ok(config)
    }

    /// Returns the broker host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the broker port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Returns whether authentication is configured.
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }

    pub(crate) fn credentials(&self) -> Option<(&str, &str)> {
        self.credentials
            .as_ref()
            .map(|(u, p)| (u.as_str(), p.as_str()))
    }

    /// Returns the keep-alive interval.
    #[must_use]
    pub fn keep_alive(&self) -> Duration {
        self.keep_alive
    }

    /// Returns how long `connect` waits for the broker's acknowledgment.
    #[must_use]
    pub fn connection_timeout(&self) -> Duration {
        self.connection_timeout
    }

    /// Returns how long a subscribe waits for the broker's acknowledgment.
    #[must_use]
    pub fn subscribe_timeout(&self) -> Duration {
        self.subscribe_timeout
    }

    /// Returns the grace period `close` gives in-flight messages.
    #[must_use]
    pub fn quiesce_timeout(&self) -> Duration {
        self.quiesce_timeout
    }

    /// Returns the configured client id, or generates a unique one.
    pub(crate) fn resolve_client_id(&self) -> String {
        self.client_id.clone().unwrap_or_else(|| {
            let counter = CLIENT_ID_COUNTER.fetch_add(1, Ordering::Relaxed);
            format!("shellor_{}_{}", std::process::id(), counter)
        })
    }
}

/// Builder for [`MqttConfig`].
#[derive(Debug, Default)]
pub struct MqttConfigBuilder {
    config: MqttConfig,
}

impl MqttConfigBuilder {
    /// Sets the broker host address.
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Sets the broker port (default: 1883).
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Sets authentication credentials.
    #[must_use]
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.config.credentials = Some((username.into(), password.into()));
        self
    }

    /// Sets a fixed client id instead of a generated one.
    #[must_use]
    pub fn client_id(mut self, id: impl Into<String>) -> Self {
        self.config.client_id = Some(id.into());
        self
    }

    /// Sets the keep-alive interval (default: 30 seconds).
    #[must_use]
    pub fn keep_alive(mut self, duration: Duration) -> Self {
        self.config.keep_alive = duration;
        self
    }

    /// Sets the connection timeout (default: 10 seconds).
    #[must_use]
    pub fn connection_timeout(mut self, duration: Duration) -> Self {
        self.config.connection_timeout = duration;
        self
    }

    /// Sets the subscribe acknowledgment timeout (default: 10 seconds).
    #[must_use]
    pub fn subscribe_timeout(mut self, duration: Duration) -> Self {
        self.config.subscribe_timeout = duration;
        self
    }

    /// Sets the quiesce timeout used by `close` (default: 250 ms).
    #[must_use]
    pub fn quiesce_timeout(mut self, duration: Duration) -> Self {
        self.config.quiesce_timeout = duration;
        self
    }

    /// Finishes the configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the host is not set.
    pub fn build(self) -> Result<MqttConfig, ProtocolError> {
        if self.config.host.is_empty() {
            return Err(ProtocolError::InvalidAddress(
                "MQTT broker host is required".to_string(),
            ));
        }
        Ok(self.config)
    }
}

/// Parses an MQTT URL into host and port.
///
/// IPv6 hosts must be bracketed (`[::1]:1883`); the brackets are removed.
fn parse_mqtt_url(url: &str) -> Result<(String, u16), ProtocolError> {
    let address = url
        .strip_prefix("mqtt://")
        .or_else(|| url.strip_prefix("tcp://"))
        .unwrap_or(url);
    let address = address.strip_suffix('/').unwrap_or(address);

    let (host, port) = if let Some(bracketed) = address.strip_prefix('[') {
        let (host, rest) = bracketed
            .split_once(']')
            .ok_or_else(|| ProtocolError::InvalidAddress(format!("unclosed bracket in {url}")))?;
        let port = match rest {
            "" => DEFAULT_PORT,
            _ => {
                let p = rest.strip_prefix(':').ok_or_else(|| {
                    ProtocolError::InvalidAddress(format!("unexpected text after host in {url}"))
                })?;
                parse_port(p)?
            }
        };
        (host, port)
    } else if let Some((host, p)) = address.rsplit_once(':') {
        (host, parse_port(p)?)
    } else {
        (address, DEFAULT_PORT)
    };

    if host.is_empty() {
        return Err(ProtocolError::InvalidAddress(format!(
            "missing host in {url}"
        )));
    }

    Ok((host.to_string(), port))
}

fn parse_port(port: &str) -> Result<u16, ProtocolError> {
    port.parse()
        .map_err(|_| ProtocolError::InvalidAddress(format!("Invalid port: {port}")))
}
