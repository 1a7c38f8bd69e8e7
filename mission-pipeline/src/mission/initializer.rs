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

//! The Mission Initializer (C6): makes sure all three missions exist for a
//! user's current cycle before any progress check runs, guarded by the
//! per-user init lock so concurrent consumers don't race to create them.

use std::sync::Arc;

use crate::dal::EventStore;
use crate::database::universal_types::{UniversalDate, UniversalTimestamp, UniversalUuid};
use crate::error::PipelineError;
use crate::idempotency::{mission_init_lock_key, IdempotencyKeeper, KeyValueStore};
use crate::models::{Mission, MissionStatus, MissionType};
use crate::retry::{MISSION_INIT_MAX_WAIT, MISSION_INIT_POLL_INTERVAL};

pub struct MissionInitializer<S: KeyValueStore> {
    store: Arc<dyn EventStore>,
    keeper: Arc<IdempotencyKeeper<S>>,
}

impl<S: KeyValueStore> MissionInitializer<S> {
    pub fn new(store: Arc<dyn EventStore>, keeper: Arc<IdempotencyKeeper<S>>) -> Self {
        Self { store, keeper }
    }

    /// Ensures all three missions exist for `user_id`'s cycle starting on
    /// `cycle_start`. Double-checked locking: checks outside the lock first
    /// (the common case once a user's cycle is warmed up), and re-checks
    /// each mission individually inside the lock before inserting, since
    /// another worker may have created some but not all of them.
    pub async fn ensure_missions(
        &self,
        user_id: UniversalUuid,
        cycle_start: UniversalDate,
    ) -> Result<(), PipelineError> {
        if self.all_present(user_id, cycle_start).await? {
            return Ok(());
        }

        let lock_key = mission_init_lock_key(user_id);
        let guard = self
            .keeper
            .acquire_with_wait(&lock_key, MISSION_INIT_MAX_WAIT, MISSION_INIT_POLL_INTERVAL)
            .await?;

        let result = self.create_missing(user_id, cycle_start).await;

        // Release regardless of outcome so a failed insert doesn't strand
        // the lock for its full TTL.
        guard.release().await?;
        result
    }

    async fn all_present(
        &self,
        user_id: UniversalUuid,
        cycle_start: UniversalDate,
    ) -> Result<bool, PipelineError> {
        for mission_type in MissionType::ALL {
            if self.store.get_mission(user_id, mission_type, cycle_start).await?.is_none() {
                return Ok(false);
            }
        }
        Ok(true)
    }

    async fn create_missing(
        &self,
        user_id: UniversalUuid,
        cycle_start: UniversalDate,
    ) -> Result<(), PipelineError> {
        for mission_type in MissionType::ALL {
            if self.store.get_mission(user_id, mission_type, cycle_start).await?.is_some() {
                continue;
            }
            let now = UniversalTimestamp::now();
            let mission = Mission {
                id: UniversalUuid::new_v4(),
                user_id,
                mission_type,
                cycle_start,
                status: MissionStatus::InProgress,
                progress_json: default_progress_json(mission_type),
                completed_at: None,
                created_at: now,
                updated_at: now,
            };
            self.store.insert_mission_if_absent(mission).await?;
        }
        Ok(())
    }
}

fn default_progress_json(mission_type: MissionType) -> String {
    use crate::mission::evaluator::{LaunchProgress, LoginProgress, PlayProgress};
    match mission_type {
        MissionType::LoginThreeConsecutive => {
            serde_json::to_string(&LoginProgress { consecutive_days: 0 }).expect("serializable")
        }
        MissionType::LaunchThreeDistinct => {
            serde_json::to_string(&LaunchProgress { distinct_games: 0 }).expect("serializable")
        }
        MissionType::PlayThreeSessionsScoreOver1000 => {
            serde_json::to_string(&PlayProgress { sessions: 0, score_sum: 0 }).expect("serializable")
        }
    }
}
