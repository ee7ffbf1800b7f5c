// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Integration tests for the MQTT transport using mockforge-mqtt.

use std::time::Duration;

use mockforge_mqtt::broker::MqttConfig as BrokerConfig;
use mockforge_mqtt::start_mqtt_server;
use shellor_lib::protocol::{MqttClient, MqttConfig};
use shellor_lib::{ContactSensor, Error, ProtocolError, RadiatorValve};
use tokio::time::sleep;

/// Helper to find an available port for testing.
fn get_test_port() -> u16 {
    use std::sync::atomic::{AtomicU16, Ordering};
    static PORT_COUNTER: AtomicU16 = AtomicU16::new(18950);
    PORT_COUNTER.fetch_add(1, Ordering::SeqCst)
}

/// Starts a mock MQTT broker on the given port.
async fn start_mock_broker(port: u16) {
    let config = BrokerConfig {
        port,
        host: "127.0.0.1".to_string(),
        ..Default::default()
    };

    tokio::spawn(async move {
        let _ = start_mqtt_server(config).await;
    });

    // Give the broker time to start, bind to port, and be ready to accept connections
    sleep(Duration::from_millis(500)).await;
}

fn client_config(port: u16) -> MqttConfig {
    MqttConfig::builder()
        .host("127.0.0.1")
        .port(port)
        .connection_timeout(Duration::from_secs(5))
        .build()
        .unwrap()
}

// ============================================================================
// MqttClient Connection Tests
// ============================================================================

mod mqtt_client_connection {
    use super::*;

    #[tokio::test]
    async fn connect_and_close() {
        let port = get_test_port();
        start_mock_broker(port).await;

        let client = MqttClient::new(client_config(port));
        let result = client.connect().await;
        assert!(result.is_ok(), "Failed to connect: {:?}", result.err());
        assert!(client.is_connected());

        client.close().await.unwrap();
        assert!(!client.is_connected());
    }

    #[tokio::test]
    async fn connect_from_url() {
        let port = get_test_port();
        start_mock_broker(port).await;

        let config = MqttConfig::from_url(&format!("mqtt://127.0.0.1:{port}")).unwrap();
        let client = MqttClient::new(config);
        assert!(client.connect().await.is_ok());
    }

    #[tokio::test]
    async fn connect_twice_fails() {
        let port = get_test_port();
        start_mock_broker(port).await;

        let client = MqttClient::new(client_config(port));
        client.connect().await.unwrap();

        let err = client.connect().await.unwrap_err();
        assert!(matches!(err, ProtocolError::AlreadyConnected));
    }

    #[tokio::test]
    async fn unreachable_broker_is_reported() {
        // Nothing listens on this port.
        let port = get_test_port();

        let client = MqttClient::new(client_config(port));
        let err = client.connect().await.unwrap_err();
        assert!(
            matches!(
                err,
                ProtocolError::ConnectionFailed(_) | ProtocolError::Timeout(_)
            ),
            "unexpected error: {err:?}"
        );
        assert!(!client.is_connected());
    }

    #[tokio::test]
    async fn connect_can_be_retried_after_failure() {
        let port = get_test_port();

        let client = MqttClient::new(client_config(port));
        assert!(client.connect().await.is_err());

        start_mock_broker(port).await;
        client.connect().await.unwrap();
        assert!(client.is_connected());

        client.close().await.unwrap();
    }

    #[tokio::test]
    async fn publish_after_close_fails() {
        let port = get_test_port();
        start_mock_broker(port).await;

        let client = MqttClient::new(client_config(port));
        client.connect().await.unwrap();
        client.close().await.unwrap();

        let err = client.publish("shellies/test", "x").await.unwrap_err();
        assert!(matches!(err, ProtocolError::NotConnected));
    }
}

// ============================================================================
// Device Tests
// ============================================================================

mod devices {
    use super::*;

    #[tokio::test]
    async fn valve_commands_are_published() {
        let port = get_test_port();
        start_mock_broker(port).await;

        let valve = RadiatorValve::new("60A423DAE8DE", client_config(port)).unwrap();
        valve.connect().await.unwrap();

        valve.set_target_temperature(21.5).await.unwrap();
        valve.set_external_temperature(19.0).await.unwrap();
        valve.set_valve_position(40.0).await.unwrap();
        valve.set_schedule_enabled(false).await.unwrap();
        valve.request_settings().await.unwrap();

        valve.close().await.unwrap();
    }

    #[tokio::test]
    async fn valve_rejects_nan_even_when_connected() {
        let port = get_test_port();
        start_mock_broker(port).await;

        let valve = RadiatorValve::new("60A423DAE8DE", client_config(port)).unwrap();
        valve.connect().await.unwrap();

        let err = valve.set_target_temperature(f32::NAN).await.unwrap_err();
        assert!(matches!(err, Error::Value(_)));

        valve.close().await.unwrap();
    }

    #[tokio::test]
    async fn contact_sensor_connects() {
        let port = get_test_port();
        start_mock_broker(port).await;

        let sensor = ContactSensor::new("C92B94", client_config(port)).unwrap();
        sensor.connect().await.unwrap();
        assert!(sensor.client().is_connected());
        assert_eq!(sensor.base_topic(), "shellies/shellydw2-C92B94");
        sensor.close().await.unwrap();
    }

    #[tokio::test]
    async fn device_connect_failure_is_an_error() {
        let port = get_test_port();

        let sensor = ContactSensor::new("C92B94", client_config(port)).unwrap();
        let err = sensor.connect().await.unwrap_err();
        assert!(matches!(err, Error::Protocol(_)));
    }
}

// ============================================================================
// MQTT Subscription Tests
// ============================================================================

mod subscriptions {
    use super::*;
    use std::sync::Arc;

    use shellor_lib::protocol::Message;
    use tokio::sync::mpsc;

    const SENSOR_ID: &str = "C92B94";
    const VALVE_ID: &str = "60A423DAE8DE";

    const VALVE_STATUS: &str = r#"{"target_t":{"enabled":true,"value":20,"units":"C"},"tmp":{"value":19.5,"units":"C","is_valid":true},"temperature_offset":0,"bat":87.0}"#;

    const SENSOR_INFO: &str = r#"{"bat":{"value":92,"voltage":5.8},"tmp":{"value":21.3,"units":"C","is_valid":true},"lux":{"value":12,"illumination":"dark","is_valid":true}}"#;

    /// Connects a client recording every (topic, payload) published under
    /// `filter`.
    async fn recorder(
        port: u16,
        filter: &str,
    ) -> (MqttClient, mpsc::UnboundedReceiver<(String, String)>) {
        let client = MqttClient::new(client_config(port));
        client.connect().await.unwrap();

        let (tx, rx) = mpsc::unbounded_channel();
        client
            .subscribe(
                filter,
                Arc::new(move |message: &Message| {
                    let _ = tx.send((
                        message.topic().to_string(),
                        message.payload_lossy().into_owned(),
                    ));
                }),
            )
            .await
            .unwrap();
        (client, rx)
    }

    /// Connects a plain client used to publish device reports.
    async fn publisher(port: u16) -> MqttClient {
        let client = MqttClient::new(client_config(port));
        client.connect().await.unwrap();
        client
    }

    /// Receives up to `count` items, giving up after two quiet seconds.
    async fn receive<T>(rx: &mut mpsc::UnboundedReceiver<T>, count: usize) -> Vec<T> {
        let mut items = Vec::new();
        while items.len() < count {
            match tokio::time::timeout(Duration::from_secs(2), rx.recv()).await {
                Ok(Some(item)) => items.push(item),
                _ => break,
            }
        }
        items
    }

    async fn assert_quiet<T: std::fmt::Debug>(rx: &mut mpsc::UnboundedReceiver<T>) {
        let extra = tokio::time::timeout(Duration::from_millis(300), rx.recv()).await;
        assert!(extra.is_err(), "unexpected item: {extra:?}");
    }

    /// Expected (topic, payload) pairs for valve commands.
    fn commands(items: &[(&str, &str)]) -> Vec<(String, String)> {
        let base = format!("shellies/shellytrv-{VALVE_ID}/thermostat/0/command");
        items
            .iter()
            .map(|(suffix, payload)| (format!("{base}/{suffix}"), (*payload).to_string()))
            .collect()
    }

    #[tokio::test]
    async fn device_subscriptions_are_acknowledged() {
        let port = get_test_port();
        start_mock_broker(port).await;

        let sensor = ContactSensor::new(SENSOR_ID, client_config(port)).unwrap();
        sensor.connect().await.unwrap();
        sensor.subscribe_open_state(|| {}, || {}).await.unwrap();
        sensor.subscribe_info(|_| {}).await.unwrap();

        let valve = RadiatorValve::new(VALVE_ID, client_config(port)).unwrap();
        valve.connect().await.unwrap();
        valve.subscribe_status(|_| {}).await.unwrap();
        valve.subscribe_info(|_| {}).await.unwrap();
        valve.subscribe_all().await.unwrap();

        sensor.close().await.unwrap();
        valve.close().await.unwrap();
    }

    #[tokio::test]
    async fn contact_state_dispatches_open_and_close() {
        let port = get_test_port();
        start_mock_broker(port).await;

        let sensor = ContactSensor::new(SENSOR_ID, client_config(port)).unwrap();
        sensor.connect().await.unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let on_close = tx.clone();
        sensor
            .subscribe_open_state(
                move || {
                    let _ = tx.send("open");
                },
                move || {
                    let _ = on_close.send("close");
                },
            )
            .await
            .unwrap();

        let reports = publisher(port).await;
        let topic = format!("shellies/shellydw2-{SENSOR_ID}/sensor/state");
        for payload in ["open", "closed", "close", "OPEN", "open"] {
            reports.publish(&topic, payload).await.unwrap();
        }

        assert_eq!(receive(&mut rx, 3).await, ["open", "close", "open"]);
        assert_quiet(&mut rx).await;

        reports.close().await.unwrap();
        sensor.close().await.unwrap();
    }

    #[tokio::test]
    async fn contact_info_is_decoded() {
        let port = get_test_port();
        start_mock_broker(port).await;

        let sensor = ContactSensor::new(SENSOR_ID, client_config(port)).unwrap();
        sensor.connect().await.unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        sensor
            .subscribe_info(move |info| {
                let _ = tx.send(info);
            })
            .await
            .unwrap();

        let reports = publisher(port).await;
        let topic = format!("shellies/shellydw2-{SENSOR_ID}/info");
        reports.publish(&topic, SENSOR_INFO).await.unwrap();

        let received = receive(&mut rx, 1).await;
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].bat.value, 92);
        assert_eq!(received[0].lux.illumination, "dark");
        assert_eq!(sensor.client().decode_failures(), 0);

        reports.close().await.unwrap();
        sensor.close().await.unwrap();
    }

    #[tokio::test]
    async fn malformed_status_is_counted_and_dropped() {
        let port = get_test_port();
        start_mock_broker(port).await;

        let valve = RadiatorValve::new(VALVE_ID, client_config(port)).unwrap();
        valve.connect().await.unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        valve
            .subscribe_status(move |status| {
                let _ = tx.send(status);
            })
            .await
            .unwrap();

        let reports = publisher(port).await;
        let topic = format!("shellies/shellytrv-{VALVE_ID}/status");
        reports.publish(&topic, "{bad").await.unwrap();
        reports.publish(&topic, VALVE_STATUS).await.unwrap();

        let received = receive(&mut rx, 1).await;
        assert_eq!(received.len(), 1);
        assert!((received[0].tmp.value - 19.5).abs() < f32::EPSILON);
        assert_quiet(&mut rx).await;
        assert_eq!(valve.client().decode_failures(), 1);

        reports.close().await.unwrap();
        valve.close().await.unwrap();
    }

    #[tokio::test]
    async fn valve_setters_put_exact_topic_and_payload_on_the_wire() {
        let port = get_test_port();
        start_mock_broker(port).await;

        let filter = format!("shellies/shellytrv-{VALVE_ID}/thermostat/0/command/#");
        let (recorder, mut rx) = recorder(port, &filter).await;

        let valve = RadiatorValve::new(VALVE_ID, client_config(port)).unwrap();
        valve.connect().await.unwrap();
        valve.set_valve_position(40.0).await.unwrap();
        valve.set_schedule_enabled(false).await.unwrap();
        valve.set_target_temperature(21.5).await.unwrap();
        valve.set_external_temperature(19.0).await.unwrap();
        valve.request_settings().await.unwrap();

        let expected = commands(&[
            ("valve_pos", "40"),
            ("schedule", "0"),
            ("target_t", "21.5"),
            ("ext_t", "19"),
            ("settings", ""),
        ]);
        assert_eq!(receive(&mut rx, expected.len()).await, expected);

        valve.close().await.unwrap();
        recorder.close().await.unwrap();
    }

    #[tokio::test]
    async fn close_delivers_commands_already_sent() {
        let port = get_test_port();
        start_mock_broker(port).await;

        let (recorder, mut rx) = recorder(port, "shellies/#").await;

        let valve = RadiatorValve::new(VALVE_ID, client_config(port)).unwrap();
        valve.connect().await.unwrap();
        valve.set_target_temperature(21.5).await.unwrap();
        valve.set_schedule_enabled(true).await.unwrap();
        valve.set_external_temperature(19.0).await.unwrap();
        valve.request_settings().await.unwrap();
        valve.close().await.unwrap();

        let expected = commands(&[
            ("target_t", "21.5"),
            ("schedule", "1"),
            ("ext_t", "19"),
            ("settings", ""),
        ]);
        assert_eq!(receive(&mut rx, expected.len()).await, expected);

        recorder.close().await.unwrap();
    }
}
