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

//! The Reward Distributor (C8): grants the fixed 777-point reward exactly
//! once per user per cycle, once all three missions are `COMPLETED`.

use std::sync::Arc;

use crate::dal::EventStore;
use crate::database::universal_types::{UniversalDate, UniversalTimestamp, UniversalUuid};
use crate::error::{DatabaseError, PipelineError};
use crate::models::{period_of, MISSION_COMPLETION_REWARD_TYPE, MISSION_CYCLE_REWARD_POINTS};

pub struct RewardDistributor {
    store: Arc<dyn EventStore>,
}

impl RewardDistributor {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self { store }
    }

    /// Called after any mission completes. Re-checks all three before
    /// granting, since this is invoked once per completing mission and
    /// only the call that observes all three `COMPLETED` should grant.
    /// `grant_reward_if_absent`'s unique constraint on `(user, reward_type,
    /// period)` is the real exactly-once guarantee; this check just avoids
    /// a wasted query in the common case.
    pub async fn on_mission_completed(
        &self,
        user_id: UniversalUuid,
        cycle_start: UniversalDate,
    ) -> Result<bool, PipelineError> {
        if !self.store.all_missions_completed(user_id, cycle_start).await? {
            return Ok(false);
        }
        let period = period_of(UniversalTimestamp::now());
        let granted = match self
            .store
            .grant_reward_if_absent(user_id, MISSION_COMPLETION_REWARD_TYPE, &period, MISSION_CYCLE_REWARD_POINTS)
            .await
        {
            Ok(granted) => granted,
            Err(DatabaseError::Invariant(msg)) => return Err(PipelineError::InvariantViolation(msg)),
            Err(e) => return Err(e.into()),
        };
        if granted {
            tracing::info!(%user_id, %period, points = MISSION_CYCLE_REWARD_POINTS, "mission cycle reward granted");
        }
        Ok(granted)
    }
}
