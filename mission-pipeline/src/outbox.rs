/*
 *  Copyright 2026 Mission Platform Team
 *
 *  Licensed under the Apache License, Version 2.0 (the "License");
 *  you may not use this file except in compliance with the License.
 *  You may obtain a copy of the License at
 *
 *      http://www.apache.org/licenses/LICENSE-2.0
 *
 *  Unless required by applicable law or agreed to in writing, software
 *  distributed under the License is distributed on an "AS IS" BASIS,
 *  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 *  See the License for the specific language governing permissions and
 *  limitations under the License.
 */

//! The transactional outbox (C3): parks bus messages that failed to
//! publish inline, and sweeps them back out on a fixed interval.

use std::sync::Arc;
use std::time::Duration;

use crate::bus::{BusAdapter, Topic};
use crate::dal::EventStore;
use crate::error::DatabaseError;
use crate::models::{OutboxStatus, OUTBOX_MAX_RETRIES, OUTBOX_RETRY_BACKOFF_SECS, OUTBOX_SWEEP_INTERVAL_SECS};

pub struct Outbox {
    store: Arc<dyn EventStore>,
    bus: Arc<dyn BusAdapter>,
}

impl Outbox {
    pub fn new(store: Arc<dyn EventStore>, bus: Arc<dyn BusAdapter>) -> Self {
        Self { store, bus }
    }

    /// Parks a message that the caller already tried and failed to send
    /// inline.
    pub async fn park(&self, topic: Topic, dedup_key: &str, payload_json: String) -> Result<(), DatabaseError> {
        self.store.enqueue_outbox(topic.as_str(), dedup_key, payload_json).await
    }

    /// Runs one sweep: loads due entries, retries each, and either deletes
    /// it (delivered), bumps its retry bookkeeping (transient failure under
    /// the cap), or marks it `FAILED` (cap exhausted).
    pub async fn sweep_once(&self) -> Result<SweepReport, DatabaseError> {
        let mut report = SweepReport::default();
        let due = self.store.due_outbox_entries(100).await?;
        for entry in due {
            let Some(topic) = topic_from_str(&entry.topic) else {
                tracing::warn!(topic = %entry.topic, "outbox entry has unknown topic, marking failed");
                self.store.mark_outbox_failed(entry.id, "unknown topic".to_string()).await?;
                report.failed += 1;
                continue;
            };
            match self.bus.publish(topic, &entry.dedup_key, entry.payload_json.as_bytes()).await {
                Ok(()) => {
                    self.store.mark_outbox_delivered(entry.id).await?;
                    report.delivered += 1;
                }
                Err(e) => {
                    let next_retry_count = entry.retry_count + 1;
                    if matches!(entry.status, OutboxStatus::Pending) && next_retry_count < OUTBOX_MAX_RETRIES {
                        let next_retry_at =
                            entry.next_retry_at + chrono::Duration::seconds(OUTBOX_RETRY_BACKOFF_SECS);
                        self.store
                            .mark_outbox_retry(entry.id, next_retry_count, next_retry_at, e.to_string())
                            .await?;
                        report.retried += 1;
                    } else {
                        self.store.mark_outbox_failed(entry.id, e.to_string()).await?;
                        report.failed += 1;
                    }
                }
            }
        }
        Ok(report)
    }

    /// Runs `sweep_once` on a fixed interval until `shutdown` resolves.
    pub async fn run(&self, shutdown: impl std::future::Future<Output = ()>) {
        let mut interval = tokio::time::interval(Duration::from_secs(OUTBOX_SWEEP_INTERVAL_SECS));
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    match self.sweep_once().await {
                        Ok(report) if report.delivered + report.retried + report.failed > 0 => {
                            tracing::info!(?report, "outbox sweep");
                        }
                        Ok(_) => {}
                        Err(e) => tracing::error!(error = %e, "outbox sweep failed"),
                    }
                }
                _ = &mut shutdown => break,
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct SweepReport {
    pub delivered: u32,
    pub retried: u32,
    pub failed: u32,
}

fn topic_from_str(s: &str) -> Option<Topic> {
    match s {
        "mission-login-event" => Some(Topic::UserLogin),
        "mission-game-launch-event" => Some(Topic::GameLaunched),
        "mission-game-play-event" => Some(Topic::PlaySessionCompleted),
        "mission-completed-event" => Some(Topic::MissionCompleted),
        _ => None,
    }
}
