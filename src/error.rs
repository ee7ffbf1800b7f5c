// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `ShelloR` library.
//!
//! Transport failures (connect, subscribe, publish, close) are returned to the
//! caller. Payload decoding failures are reported through [`ParseError`] inside
//! subscription handlers, where they are logged and the message is dropped.

use thiserror::Error;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// Error occurred during value validation.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// Error occurred during protocol communication.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Error occurred while parsing a payload.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
}

/// Errors related to value validation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValueError {
    /// A device identifier was empty.
    #[error("device identifier must not be empty")]
    EmptyDeviceId,

    /// A contact sensor state payload was neither `open` nor `close`.
    #[error("invalid contact state: {0}")]
    InvalidContactState(String),

    /// A numeric command value was NaN or infinite.
    #[error("{field} must be a finite number, got {value}")]
    NonFinite {
        /// The command field the value was meant for.
        field: &'static str,
        /// The rejected value.
        value: f32,
    },
}

/// Errors related to MQTT communication.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The MQTT client rejected a request.
    #[error("MQTT error: {0}")]
    Mqtt(#[from] rumqttc::ClientError),

    /// Connection to the broker failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Request timed out.
    #[error("request timed out after {0} ms")]
    Timeout(u64),

    /// Invalid URL or address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// The broker refused a subscription.
    #[error("subscription to {0} rejected by broker")]
    SubscribeRejected(String),

    /// The client is not connected.
    #[error("client is not connected")]
    NotConnected,

    /// The client is already connected or was closed.
    #[error("client is already connected")]
    AlreadyConnected,

    /// Internal channel was closed.
    #[error("channel closed: {0}")]
    ChannelClosed(String),
}

/// Errors related to decoding device payloads.
#[derive(Debug, Error)]
pub enum ParseError {
    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Payload was not valid UTF-8.
    #[error("payload is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;
