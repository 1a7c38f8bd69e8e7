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

//! The Completion Engine (C7): applies a CAS transition from `IN_PROGRESS`
//! to `COMPLETED` and, only when this call is the one that actually flips
//! the row, publishes `MissionCompleted` synchronously. Reward granting is
//! deliberately not performed here -- it happens only when that published
//! event is later consumed (`Router::route_mission_completed`, reward.rs),
//! so the two stages stay independently retryable.

use std::sync::Arc;

use crate::bus::{BusAdapter, MissionCompletedPayload, Topic};
use crate::dal::EventStore;
use crate::database::universal_types::{UniversalDate, UniversalTimestamp, UniversalUuid};
use crate::error::{BusError, PipelineError};
use crate::models::{Mission, MissionType};
use crate::outbox::Outbox;

pub struct CompletionEngine {
    store: Arc<dyn EventStore>,
    bus: Arc<dyn BusAdapter>,
    outbox: Arc<Outbox>,
}

impl CompletionEngine {
    pub fn new(store: Arc<dyn EventStore>, bus: Arc<dyn BusAdapter>, outbox: Arc<Outbox>) -> Self {
        Self { store, bus, outbox }
    }

    /// Persists `progress_json` and, if `complete` is true, attempts the
    /// CAS transition to `COMPLETED`. `affected == 0` on a complete
    /// attempt means another delivery already completed it first -- this
    /// call then does nothing further, which is the idempotent outcome.
    /// Returns whether *this* call was the one that completed the mission.
    pub async fn apply_progress(
        &self,
        mission: &Mission,
        progress_json: String,
        complete: bool,
    ) -> Result<bool, PipelineError> {
        if !complete {
            self.store
                .cas_update_mission_progress(mission.id, progress_json, false, UniversalTimestamp::now())
                .await?;
            return Ok(false);
        }

        let completed_at = UniversalTimestamp::now();
        let affected = self
            .store
            .cas_update_mission_progress(mission.id, progress_json, true, completed_at)
            .await?;
        if affected == 0 {
            return Ok(false);
        }

        self.publish_completed(mission.user_id, mission.mission_type, mission.cycle_start, completed_at)
            .await?;
        Ok(true)
    }

    async fn publish_completed(
        &self,
        user_id: UniversalUuid,
        mission_type: MissionType,
        cycle_start: UniversalDate,
        completed_at: UniversalTimestamp,
    ) -> Result<(), PipelineError> {
        let payload = MissionCompletedPayload {
            event_id: UniversalUuid::new_v4(),
            user_id,
            mission_type: mission_type.as_str().to_string(),
            cycle_start,
            completed_at,
        };
        let payload_json = serde_json::to_vec(&payload).expect("serializable");
        let dedup_key = format!("mission-completed:{user_id}:{mission_type}:{cycle_start}");

        // Mission-completed sends synchronously (§4.4): the caller awaits
        // this before returning, so a bus outage surfaces immediately
        // rather than being silently swallowed into the outbox.
        match self.bus.publish(Topic::MissionCompleted, &dedup_key, &payload_json).await {
            Ok(()) => Ok(()),
            Err(e) => {
                self.outbox
                    .park(
                        Topic::MissionCompleted,
                        &dedup_key,
                        String::from_utf8(payload_json).expect("json is utf8"),
                    )
                    .await?;
                Err(PipelineError::Bus(BusError::Publish {
                    topic: Topic::MissionCompleted.as_str().to_string(),
                    source: e.to_string(),
                }))
            }
        }
    }
}
