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

/// A completed play session and its score. Unique on `session_id` so
/// re-delivery of the same session is a no-op. PLAY-3-SESSIONS-SCORE-OVER-1000
/// counts sessions in the active cycle and sums their scores.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaySession {
    pub id: UniversalUuid,
    pub user_id: UniversalUuid,
    pub game_id: UniversalUuid,
    pub session_id: UniversalUuid,
    pub score: i32,
    pub played_at: UniversalTimestamp,
    pub created_at: UniversalTimestamp,
}
