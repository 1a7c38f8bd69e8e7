//! An in-process `BusAdapter` that records every publish and can be told to
//! fail on demand, for exercising the outbox's park/sweep/retry path
//! without a broker.

use async_trait::async_trait;
use parking_lot::Mutex;

use mission_pipeline::bus::{BusAdapter, Topic};
use mission_pipeline::error::BusError;

#[derive(Debug, Clone)]
pub struct PublishedMessage {
    pub topic: Topic,
    pub dedup_key: String,
    pub payload: Vec<u8>,
}

#[derive(Default)]
struct State {
    published: Vec<PublishedMessage>,
    /// Topics that should fail their next N publish attempts. Consumed one
    /// attempt at a time so a test can simulate "the bus recovered after
    /// two outages".
    fail_next: std::collections::HashMap<Topic, u32>,
}

/// Captures every message handed to `publish` and lets a test pre-arm a
/// topic to fail its next `n` attempts.
pub struct InMemoryBusAdapter {
    state: Mutex<State>,
}

impl InMemoryBusAdapter {
    pub fn new() -> Self {
        Self { state: Mutex::new(State::default()) }
    }

    /// Arranges for the next `n` publishes to `topic` to return an error.
    pub fn fail_next_publish(&self, topic: Topic, n: u32) {
        self.state.lock().fail_next.insert(topic, n);
    }

    pub fn published(&self) -> Vec<PublishedMessage> {
        self.state.lock().published.clone()
    }

    pub fn published_to(&self, topic: Topic) -> Vec<PublishedMessage> {
        self.state.lock().published.iter().filter(|m| m.topic == topic).cloned().collect()
    }
}

impl Default for InMemoryBusAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BusAdapter for InMemoryBusAdapter {
    async fn publish(&self, topic: Topic, dedup_key: &str, payload: &[u8]) -> Result<(), BusError> {
        let mut state = self.state.lock();
        if let Some(remaining) = state.fail_next.get_mut(&topic) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(BusError::Publish {
                    topic: topic.as_str().to_string(),
                    source: "simulated publish failure".to_string(),
                });
            }
        }
        state.published.push(PublishedMessage { topic, dedup_key: dedup_key.to_string(), payload: payload.to_vec() });
        Ok(())
    }
}
