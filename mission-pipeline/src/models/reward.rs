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

use crate::database::universal_types::{UniversalTimestamp, UniversalUuid};
use serde::{Deserialize, Serialize};

/// The fixed 777-point reward granted once all three missions in a cycle
/// complete. Unique on `(user_id, reward_type, period)`; its existence is
/// itself the exactly-once marker the Reward Distributor checks before
/// crediting points, per spec.md §3's Reward entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reward {
    pub id: UniversalUuid,
    pub user_id: UniversalUuid,
    pub reward_type: String,
    /// Calendar string `YYYY-MM`, derived from `distributed_at` at grant
    /// time -- not from the mission cycle's `cycle_start`.
    pub period: String,
    pub points: i32,
    pub distributed_at: UniversalTimestamp,
}

/// The only reward type this pipeline ever grants.
pub const MISSION_COMPLETION_REWARD_TYPE: &str = "MISSION_COMPLETION";

/// The single reward amount this pipeline ever grants.
pub const MISSION_CYCLE_REWARD_POINTS: i32 = 777;

/// Formats `now` as the `YYYY-MM` period string used to key reward
/// idempotency (spec.md §3, §4.8).
pub fn period_of(now: UniversalTimestamp) -> String {
    now.into_inner().format("%Y-%m").to_string()
}
