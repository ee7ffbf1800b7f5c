// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Message handlers that decode payloads before invoking user callbacks.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::de::DeserializeOwned;

use crate::error::{ParseError, ProtocolError};
use crate::protocol::{Message, MessageHandler, MqttClient};

/// Decodes a message payload as JSON.
///
/// # Errors
///
/// Returns `ParseError` if the payload is not UTF-8 text or not valid JSON
/// for `T`.
pub fn decode_json<T: DeserializeOwned>(message: &Message) -> Result<T, ParseError> {
    let text = std::str::from_utf8(message.payload())?;
    Ok(serde_json::from_str(text)?)
}

/// Builds a handler that decodes each payload into `T` and passes it to
/// `callback`.
///
/// Decode failures increment `failures` and are logged; `callback` is not
/// invoked for them.
pub fn json_handler<T, F>(failures: Arc<AtomicU64>, callback: F) -> MessageHandler
where
    T: DeserializeOwned + 'static,
    F: Fn(T) + Send + Sync + 'static,
{
    Arc::new(move |message: &Message| {
        tracing::debug!(
            topic = %message.topic(),
            payload = %message.payload_lossy(),
            "Received message"
        );

        match decode_json::<T>(message) {
            Ok(record) => callback(record),
            Err(e) => {
                failures.fetch_add(1, Ordering::Relaxed);
                tracing::error!(
                    topic = %message.topic(),
                    payload = %message.payload_lossy(),
                    error = %e,
                    "Error decoding message"
                );
            }
        }
    })
}

/// Builds a handler that passes each payload to `callback` as text.
///
/// Invalid UTF-8 sequences are replaced rather than rejected.
pub fn text_handler<F>(callback: F) -> MessageHandler
where
    F: Fn(&str) + Send + Sync + 'static,
{
    Arc::new(move |message: &Message| {
        let payload = message.payload_lossy();
        tracing::debug!(
            topic = %message.topic(),
            payload = %payload,
            "Received message"
        );
        callback(&payload);
    })
}

/// Subscribes to `topic` and delivers every payload decoded as `T`.
///
/// # Errors
///
/// Returns error if the subscription is refused or the client is not
/// connected. Decode failures of individual messages are never returned.
pub async fn subscribe_json<T, F>(
    client: &MqttClient,
    topic: &str,
    callback: F,
) -> Result<(), ProtocolError>
where
    T: DeserializeOwned + 'static,
    F: Fn(T) + Send + Sync + 'static,
{
    let handler = json_handler(client.decode_failure_counter(), callback);
    client.subscribe(topic, handler).await
}

/// Subscribes to `topic` and delivers every payload as text.
///
/// # Errors
///
/// Returns error if the subscription is refused or the client is not
/// connected.
pub async fn subscribe_text<F>(
    client: &MqttClient,
    topic: &str,
    callback: F,
) -> Result<(), ProtocolError>
where
    F: Fn(&str) + Send + Sync + 'static,
{
    client.subscribe(topic, text_handler(callback)).await
}
