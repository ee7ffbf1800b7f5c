// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! MQTT client owned by a single device handle.
//!
//! The client is created disconnected. [`MqttClient::connect`] spawns the
//! `rumqttc` event loop on the current tokio runtime and waits for the broker's
//! CONNACK. Inbound messages are dispatched from the event-loop task through a
//! [`TopicRouter`], so subscription handlers run on that task and must not
//! block.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use rumqttc::{AsyncClient, EventLoop, MqttOptions, SubscribeReasonCode};
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;

use crate::error::ProtocolError;
use crate::protocol::{Message, MessageHandler, MqttConfig, QOS, TopicRouter};

/// Pause before polling again after a transport error, while `rumqttc` reconnects.
const RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// Capacity of the request channel between the client and its event loop.
const REQUEST_CAPACITY: usize = 10;

/// A connection to an MQTT broker.
///
/// `MqttClient` is cheaply cloneable (via `Arc`); clones share the same
/// connection and subscriptions.
#[derive(Clone)]
pub struct MqttClient {
    inner: Arc<MqttClientInner>,
}

struct MqttClientInner {
    /// The MQTT async client for requests.
    client: AsyncClient,
    /// Event loop, present until `connect` hands it to the background task.
    event_loop: Mutex<Option<EventLoop>>,
    /// Background task driving the event loop. It hands the event loop back
    /// if it stops before the first CONNACK.
    task: Mutex<Option<JoinHandle<Option<EventLoop>>>>,
    /// Serializes subscribe requests so SUBACKs can be matched in order.
    subscribe_lock: tokio::sync::Mutex<()>,
    /// State shared with the event-loop task.
    shared: Arc<Shared>,
    /// Configuration used for this connection.
    config: MqttConfig,
}

impl Drop for MqttClientInner {
    fn drop(&mut self) {
        if let Some(task) = self.task.get_mut().take() {
            task.abort();
        }
    }
}

struct Shared {
    router: TopicRouter,
    pending: Mutex<PendingSubscribes>,
    connected: AtomicBool,
    closing: AtomicBool,
    /// Publishes accepted by the client and not yet acknowledged by PUBACK.
    unacked: watch::Sender<usize>,
    decode_failures: Arc<AtomicU64>,
}

/// Subscribe requests waiting for their SUBACK.
///
/// Requests are queued before they are handed to `rumqttc`, then keyed by
/// packet id once the event loop reports them as sent.
#[derive(Default)]
struct PendingSubscribes {
    queued: VecDeque<oneshot::Sender<bool>>,
    in_flight: HashMap<u16, oneshot::Sender<bool>>,
}

impl PendingSubscribes {
    fn sent(&mut self, pkid: u16) {
        if let Some(tx) = self.queued.pop_front() {
            self.in_flight.insert(pkid, tx);
        }
    }

    fn acknowledged(&mut self, pkid: u16, return_codes: &[SubscribeReasonCode]) {
        if let Some(tx) = self.in_flight.remove(&pkid) {
            let granted = return_codes
                .iter()
                .all(|code| matches!(code, SubscribeReasonCode::Success(_)));
            let _ = tx.send(granted);
        }
    }

    /// Drops every waiter; their receivers observe a closed channel.
    fn fail_all(&mut self) {
        self.queued.clear();
        self.in_flight.clear();
    }
}

impl MqttClient {
    /// Creates a client for the given configuration without connecting.
    #[must_use]
    pub fn new(config: MqttConfig) -> Self {
        let client_id = config.resolve_client_id();

        let mut mqtt_options = MqttOptions::new(&client_id, config.host(), config.port());
        mqtt_options.set_keep_alive(config.keep_alive());
        mqtt_options.set_clean_session(true);

        if let Some((username, password)) = config.credentials() {
            mqtt_options.set_credentials(username, password);
        }

        let (client, event_loop) = AsyncClient::new(mqtt_options, REQUEST_CAPACITY);

        tracing::debug!(
            client_id = %client_id,
            host = %config.host(),
            port = %config.port(),
            "Created MQTT client"
        );

        let shared = Shared {
            router: TopicRouter::new(),
            pending: Mutex::new(PendingSubscribes::default()),
            connected: AtomicBool::new(false),
            closing: AtomicBool::new(false),
            unacked: watch::Sender::new(0),
            decode_failures: Arc::new(AtomicU64::new(0)),
        };

        Self {
            inner: Arc::new(MqttClientInner {
                client,
                event_loop: Mutex::new(Some(event_loop)),
                task: Mutex::new(None),
                subscribe_lock: tokio::sync::Mutex::new(()),
                shared: Arc::new(shared),
                config,
            }),
        }
    }

    /// Returns the configuration of this client.
    #[must_use]
    pub fn config(&self) -> &MqttConfig {
        &self.inner.config
    }

    /// Returns whether the broker connection is currently up.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.inner.shared.connected.load(Ordering::Acquire)
    }

    /// Returns how many payloads failed to decode across all subscriptions.
    #[must_use]
    pub fn decode_failures(&self) -> u64 {
        self.inner.shared.decode_failures.load(Ordering::Relaxed)
    }

    pub(crate) fn decode_failure_counter(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.inner.shared.decode_failures)
    }

    /// Opens the broker connection.
    ///
    /// Waits for the broker's acknowledgment up to the configured connection
    /// timeout. After a failed attempt the client stays disconnected and
    /// `connect` may be called again.
    ///
    /// # Errors
    ///
    /// Returns error if the broker refuses or cannot be reached, if the
    /// timeout elapses, or if this client is already connected.
    pub async fn connect(&self) -> Result<(), ProtocolError> {
        let event_loop = self
            .inner
            .event_loop
            .lock()
            .take()
            .ok_or(ProtocolError::AlreadyConnected)?;

        let (connack_tx, connack_rx) = oneshot::channel();
        let (abandon_tx, abandon_rx) = oneshot::channel();
        let shared = Arc::clone(&self.inner.shared);
        let task = tokio::spawn(handle_mqtt_events(
            event_loop, shared, connack_tx, abandon_rx,
        ));
        *self.inner.task.lock() = Some(task);

        let timeout = self.inner.config.connection_timeout();
        match tokio::time::timeout(timeout, connack_rx).await {
            Ok(Ok(Ok(()))) => {
                tracing::info!(
                    host = %self.inner.config.host(),
                    port = %self.inner.config.port(),
                    "Connected to MQTT broker"
                );
                Ok(())
            }
            Ok(Ok(Err(reason))) => {
                tracing::error!(
                    host = %self.inner.config.host(),
                    error = %reason,
                    "MQTT connection failed"
                );
                self.reclaim_event_loop().await;
                Err(ProtocolError::ConnectionFailed(reason))
            }
            Ok(Err(_)) => {
                self.reclaim_event_loop().await;
                Err(ProtocolError::ConnectionFailed(
                    "MQTT event loop terminated unexpectedly".to_string(),
                ))
            }
            Err(_) => {
                tracing::error!(
                    host = %self.inner.config.host(),
                    timeout_ms = millis(timeout),
                    "MQTT connection timed out"
                );
                let _ = abandon_tx.send(());
                self.reclaim_event_loop().await;
                Err(ProtocolError::Timeout(millis(timeout)))
            }
        }
    }

    /// Waits for the event-loop task after a failed connect and puts the
    /// event loop back so the next `connect` can retry.
    async fn reclaim_event_loop(&self) {
        let task = self.inner.task.lock().take();
        let Some(mut task) = task else {
            return;
        };

        // A CONNACK racing the timeout leaves the task polling.
        let quiesce = self.inner.config.quiesce_timeout();
        match tokio::time::timeout(quiesce, &mut task).await {
            Ok(Ok(Some(event_loop))) => {
                *self.inner.event_loop.lock() = Some(event_loop);
            }
            Ok(_) => {}
            Err(_) => {
                // The event loop is lost with the task, so the client can
                // only be treated as closed.
                task.abort();
                self.inner.shared.closing.store(true, Ordering::Release);
                self.inner.shared.connected.store(false, Ordering::Release);
                tracing::warn!(
                    "MQTT event loop did not stop after failed connect, client closed"
                );
            }
        }
    }

    /// Closes the broker connection.
    ///
    /// New publishes are refused from here on. Publishes already accepted
    /// are given up to the quiesce timeout to be acknowledged by the broker,
    /// then a DISCONNECT is sent and the event loop gets another quiesce
    /// timeout to flush it and stop. All subscriptions end here.
    ///
    /// # Errors
    ///
    /// Returns error if the disconnect request cannot be queued.
    pub async fn close(&self) -> Result<(), ProtocolError> {
        self.inner.shared.closing.store(true, Ordering::Release);

        let task = self.inner.task.lock().take();
        let Some(mut task) = task else {
            return Ok(());
        };

        let quiesce = self.inner.config.quiesce_timeout();
        let result = if task.is_finished() {
            Ok(())
        } else {
            self.drain_publishes(quiesce).await;

            match self.inner.client.disconnect().await {
                Ok(()) => {
                    if tokio::time::timeout(quiesce, &mut task).await.is_err() {
                        tracing::debug!(
                            quiesce_ms = millis(quiesce),
                            "Quiesce timeout elapsed, stopping event loop"
                        );
                        task.abort();
                    }
                    Ok(())
                }
                Err(e) => {
                    task.abort();
                    Err(ProtocolError::Mqtt(e))
                }
            }
        };

        self.inner.shared.router.clear();
        self.inner.shared.pending.lock().fail_all();
        self.inner.shared.connected.store(false, Ordering::Release);
        self.inner.shared.unacked.send_replace(0);

        tracing::info!(
            host = %self.inner.config.host(),
            port = %self.inner.config.port(),
            "Disconnected from MQTT broker"
        );
        result
    }

    /// Waits until every accepted publish has been acknowledged, or until
    /// `timeout` elapses.
    async fn drain_publishes(&self, timeout: Duration) {
        let mut unacked = self.inner.shared.unacked.subscribe();
        let timed_out = tokio::time::timeout(timeout, unacked.wait_for(|count| *count == 0))
            .await
            .is_err();

        if timed_out {
            tracing::warn!(
                unacknowledged = *unacked.borrow(),
                quiesce_ms = millis(timeout),
                "Closing with unacknowledged publishes"
            );
        }
    }

    /// Subscribes `handler` to the topic filter and waits for the SUBACK.
    ///
    /// The handler is registered before the request is sent so that retained
    /// messages delivered right after the acknowledgment are not missed.
    ///
    /// # Errors
    ///
    /// Returns error if the client is not running, the broker rejects the
    /// subscription, or no acknowledgment arrives in time. The handler is
    /// removed again on failure.
    pub async fn subscribe(
        &self,
        filter: &str,
        handler: MessageHandler,
    ) -> Result<(), ProtocolError> {
        self.ensure_running()?;

        self.inner.shared.router.register(filter, handler);

        match self.request_subscribe(filter).await {
            Ok(()) => {
                tracing::info!(topic = %filter, "Subscribed");
                Ok(())
            }
            Err(e) => {
                self.inner.shared.router.unregister_last(filter);
                tracing::error!(topic = %filter, error = %e, "Error subscribing");
                Err(e)
            }
        }
    }

    async fn request_subscribe(&self, filter: &str) -> Result<(), ProtocolError> {
        let ack_rx = {
            let _guard = self.inner.subscribe_lock.lock().await;
            let (ack_tx, ack_rx) = oneshot::channel();
            self.inner.shared.pending.lock().queued.push_back(ack_tx);

            if let Err(e) = self.inner.client.subscribe(filter, QOS).await {
                self.inner.shared.pending.lock().queued.pop_back();
                return Err(ProtocolError::Mqtt(e));
            }
            ack_rx
        };

        let timeout = self.inner.config.subscribe_timeout();
        match tokio::time::timeout(timeout, ack_rx).await {
            Ok(Ok(true)) => Ok(()),
            Ok(Ok(false)) => Err(ProtocolError::SubscribeRejected(filter.to_string())),
            Ok(Err(_)) => Err(ProtocolError::ChannelClosed(
                "subscription acknowledgment".to_string(),
            )),
            Err(_) => Err(ProtocolError::Timeout(millis(timeout))),
        }
    }

    /// Publishes a payload to a topic.
    ///
    /// Returns once the client has accepted the message for transmission.
    ///
    /// # Errors
    ///
    /// Returns error if the client is not running or rejects the request.
    pub async fn publish(
        &self,
        topic: &str,
        payload: impl Into<Vec<u8>>,
    ) -> Result<(), ProtocolError> {
        self.ensure_running()?;

        let payload = payload.into();
        tracing::debug!(
            topic = %topic,
            payload = %String::from_utf8_lossy(&payload),
            "Publishing MQTT message"
        );

        // Counted before the request is queued so a fast PUBACK cannot be
        // seen first.
        let unacked = &self.inner.shared.unacked;
        unacked.send_modify(|count| *count += 1);

        if let Err(e) = self.inner.client.publish(topic, QOS, false, payload).await {
            unacked.send_modify(|count| *count = count.saturating_sub(1));
            return Err(ProtocolError::Mqtt(e));
        }
        Ok(())
    }

    fn ensure_running(&self) -> Result<(), ProtocolError> {
        let never_connected = self.inner.event_loop.lock().is_some();
        if never_connected || self.inner.shared.closing.load(Ordering::Acquire) {
            return Err(ProtocolError::NotConnected);
        }
        Ok(())
    }
}

impl std::fmt::Debug for MqttClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MqttClient")
            .field("host", &self.inner.config.host())
            .field("port", &self.inner.config.port())
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}

#[allow(clippy::cast_possible_truncation)]
fn millis(duration: Duration) -> u64 {
    duration.as_millis() as u64
}

/// Drives the event loop until disconnect or, before the first CONNACK, the
/// first transport error.
///
/// Returns the event loop when it stops before the first CONNACK, either on
/// error or because `abandon_rx` fired.
async fn handle_mqtt_events(
    mut event_loop: EventLoop,
    shared: Arc<Shared>,
    connack_tx: oneshot::Sender<Result<(), String>>,
    mut abandon_rx: oneshot::Receiver<()>,
) -> Option<EventLoop> {
    use rumqttc::{Event, Outgoing, Packet};

    let mut connack_tx = Some(connack_tx);

    loop {
        let event = if connack_tx.is_some() {
            tokio::select! {
                event = event_loop.poll() => event,
                Ok(()) = &mut abandon_rx => {
                    tracing::debug!("MQTT connection attempt abandoned");
                    return Some(event_loop);
                }
            }
        } else {
            event_loop.poll().await
        };

        match event {
            Ok(Event::Incoming(Packet::ConnAck(connack))) => {
                tracing::debug!(?connack, "MQTT connected");
                shared.connected.store(true, Ordering::Release);
                if let Some(tx) = connack_tx.take() {
                    let _ = tx.send(Ok(()));
                }
            }
            Ok(Event::Incoming(Packet::SubAck(suback))) => {
                tracing::debug!(?suback, "MQTT subscription acknowledged");
                shared
                    .pending
                    .lock()
                    .acknowledged(suback.pkid, &suback.return_codes);
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                let message = Message::new(publish.topic.clone(), publish.payload.to_vec());
                tracing::trace!(
                    topic = %message.topic(),
                    payload = %message.payload_lossy(),
                    "MQTT message received"
                );
                shared.router.route(&message);
            }
            Ok(Event::Incoming(Packet::PubAck(_))) => {
                shared
                    .unacked
                    .send_modify(|count| *count = count.saturating_sub(1));
            }
            Ok(Event::Outgoing(Outgoing::Subscribe(pkid))) => {
                shared.pending.lock().sent(pkid);
            }
            Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                // Keep polling until the broker closes the socket so the
                // DISCONNECT is flushed.
                tracing::debug!("MQTT disconnect sent");
                shared.connected.store(false, Ordering::Release);
            }
            Ok(Event::Incoming(Packet::Disconnect)) => {
                tracing::info!("MQTT broker disconnected");
                shared.connected.store(false, Ordering::Release);
                break;
            }
            Ok(_) => {}
            Err(e) => {
                shared.connected.store(false, Ordering::Release);
                shared.pending.lock().fail_all();

                if let Some(tx) = connack_tx.take() {
                    let _ = tx.send(Err(e.to_string()));
                    return Some(event_loop);
                }
                if shared.closing.load(Ordering::Acquire) {
                    break;
                }

                tracing::warn!(error = %e, "MQTT event loop error, reconnecting");
                tokio::time::sleep(RECONNECT_DELAY).await;
            }
        }
    }

    shared.pending.lock().fail_all();
    None
}
