// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! MQTT topic routing for subscription handlers.
//!
//! The [`TopicRouter`] keeps one handler per subscription, keyed by the topic
//! filter it was registered with. Incoming messages are matched against each
//! filter using MQTT wildcard rules.
//!
//! ```text
//! MQTT Message: shellies/shellytrv-60A423DAE8DE/status → {...}
//!                     ↓
//!             TopicRouter.route()
//!                     ↓
//!   filters "…/status" and "…/#" match, "…/info" does not
//!                     ↓
//!        handlers invoked in registration order
//! ```

use std::sync::Arc;

use parking_lot::RwLock;

/// An inbound MQTT message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    topic: String,
    payload: Vec<u8>,
}

impl Message {
    /// Creates a message from a topic and raw payload.
    #[must_use]
    pub fn new(topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }

    /// Returns the topic the message was published on.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Returns the raw payload bytes.
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Returns the payload as text, replacing invalid UTF-8 sequences.
    #[must_use]
    pub fn payload_lossy(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.payload)
    }
}

/// Handler invoked for each message matching a subscription.
pub type MessageHandler = Arc<dyn Fn(&Message) + Send + Sync>;

/// Routes MQTT messages to subscription handlers.
#[derive(Default)]
pub struct TopicRouter {
    routes: RwLock<Vec<(String, MessageHandler)>>,
}

impl std::fmt::Debug for TopicRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let filters: Vec<String> = self
            .routes
            .read()
            .iter()
            .map(|(filter, _)| filter.clone())
            .collect();
        f.debug_struct("TopicRouter")
            .field("filters", &filters)
            .finish()
    }
}

impl TopicRouter {
    /// Creates a new empty topic router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler for the given topic filter.
    ///
    /// Several handlers may share one filter; all of them are invoked.
    pub fn register(&self, filter: impl Into<String>, handler: MessageHandler) {
        let filter = filter.into();
        tracing::debug!(filter = %filter, "Registering subscription handler");
        self.routes.write().push((filter, handler));
    }

    /// Removes the most recently registered handler for `filter`.
    ///
    /// Returns `true` if a handler was removed.
    pub fn unregister_last(&self, filter: &str) -> bool {
        let mut routes = self.routes.write();
        match routes.iter().rposition(|(f, _)| f == filter) {
            Some(index) => {
                routes.remove(index);
                true
            }
            None => false,
        }
    }

    /// Removes every handler.
    pub fn clear(&self) {
        self.routes.write().clear();
    }

    /// Returns the number of registered handlers.
    #[must_use]
    pub fn handler_count(&self) -> usize {
        self.routes.read().len()
    }

    /// Dispatches a message to every handler whose filter matches its topic.
    ///
    /// Returns the number of handlers invoked.
    pub fn route(&self, message: &Message) -> usize {
        // Handlers run outside the lock so they may subscribe re-entrantly.
        let matching: Vec<MessageHandler> = self
            .routes
            .read()
            .iter()
            .filter(|(filter, _)| topic_matches(filter, message.topic()))
            .map(|(_, handler)| Arc::clone(handler))
            .collect();

        if matching.is_empty() {
            tracing::trace!(topic = %message.topic(), "No handler for topic");
        }

        for handler in &matching {
            handler(message);
        }
        matching.len()
    }
}

/// Returns whether `topic` matches the MQTT topic `filter`.
///
/// `+` matches exactly one level, `#` matches the remaining levels including
/// the parent level itself.
#[must_use]
pub fn topic_matches(filter: &str, topic: &str) -> bool {
    let mut filter_levels = filter.split('/');
    let mut topic_levels = topic.split('/');

    loop {
        match (filter_levels.next(), topic_levels.next()) {
            (Some("#"), _) => return true,
            (Some("+"), Some(_)) => {}
            (Some(f), Some(t)) if f == t => {}
            (None, None) => return true,
            _ => return false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn counting_handler(counter: &Arc<AtomicU32>) -> MessageHandler {
        let counter = Arc::clone(counter);
        Arc::new(move |_msg: &Message| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn exact_filter_matches() {
        assert!(topic_matches("shellies/a/status", "shellies/a/status"));
        assert!(!topic_matches("shellies/a/status", "shellies/a/info"));
        assert!(!topic_matches("shellies/a/status", "shellies/a/status/x"));
    }

    #[test]
    fn multi_level_wildcard() {
        assert!(topic_matches("shellies/a/#", "shellies/a/status"));
        assert!(topic_matches(
            "shellies/a/#",
            "shellies/a/thermostat/0/command/target_t"
        ));
        assert!(topic_matches("shellies/a/#", "shellies/a"));
        assert!(!topic_matches("shellies/a/#", "shellies/b/status"));
    }

    #[test]
    fn single_level_wildcard() {
        assert!(topic_matches("shellies/+/info", "shellies/a/info"));
        assert!(!topic_matches("shellies/+/info", "shellies/a/b/info"));
    }

    #[test]
    fn route_invokes_matching_handlers_only() {
        let router = TopicRouter::new();
        let status = Arc::new(AtomicU32::new(0));
        let info = Arc::new(AtomicU32::new(0));
        let all = Arc::new(AtomicU32::new(0));

        router.register("shellies/trv/status", counting_handler(&status));
        router.register("shellies/trv/info", counting_handler(&info));
        router.register("shellies/trv/#", counting_handler(&all));

        let invoked = router.route(&Message::new("shellies/trv/status", "{}"));
        assert_eq!(invoked, 2);
        assert_eq!(status.load(Ordering::SeqCst), 1);
        assert_eq!(info.load(Ordering::SeqCst), 0);
        assert_eq!(all.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn route_unknown_topic() {
        let router = TopicRouter::new();
        assert_eq!(router.route(&Message::new("shellies/other/info", "{}")), 0);
    }

    #[test]
    fn unregister_last_removes_newest() {
        let router = TopicRouter::new();
        let first = Arc::new(AtomicU32::new(0));
        let second = Arc::new(AtomicU32::new(0));

        router.register("t", counting_handler(&first));
        router.register("t", counting_handler(&second));
        assert!(router.unregister_last("t"));
        assert_eq!(router.handler_count(), 1);

        router.route(&Message::new("t", ""));
        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 0);

        assert!(router.unregister_last("t"));
        assert!(!router.unregister_last("t"));
    }

    #[test]
    fn clear_removes_everything() {
        let router = TopicRouter::new();
        router.register("a", counting_handler(&Arc::new(AtomicU32::new(0))));
        router.register("b", counting_handler(&Arc::new(AtomicU32::new(0))));
        router.clear();
        assert_eq!(router.handler_count(), 0);
    }

    #[test]
    fn payload_lossy_decodes_text() {
        let msg = Message::new("t", "open");
        assert_eq!(msg.payload_lossy(), "open");
        assert_eq!(msg.payload(), b"open");
    }
}
