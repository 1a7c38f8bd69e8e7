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

use crate::database::universal_types::{UniversalDate, UniversalTimestamp, UniversalUuid};
use serde::{Deserialize, Serialize};

/// A single launch of a game by a user. Unique on `(user_id, game_id,
/// launch_date)` (spec.md §3): repeated launches of the same game on the
/// same calendar day collapse to one row, regardless of how many distinct
/// timestamps they arrive with. `launch_date` is derived from
/// `launched_at` at insert time and carried as its own column so the
/// uniqueness constraint doesn't have to truncate a timestamp column.
/// Distinct-game counting for LAUNCH-3-DISTINCT is computed over the set
/// of `game_id`s in this table within the active cycle, not the row count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameLaunch {
    pub id: UniversalUuid,
    pub user_id: UniversalUuid,
    pub game_id: UniversalUuid,
    pub launch_date: UniversalDate,
    pub launched_at: UniversalTimestamp,
    pub created_at: UniversalTimestamp,
}
