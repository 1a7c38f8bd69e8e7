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

/// A registered player, identified by the external id carried on every
/// inbound event. `points` only ever moves up, and only ever by the Reward
/// Distributor, inside the same transaction that inserts the guard Reward
/// row (spec.md §5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UniversalUuid,
    pub external_ref: String,
    pub points: i64,
    pub created_at: UniversalTimestamp,
}
