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

/// One recorded login-day for a user. Unique on `(user_id, login_date)` so
/// re-delivery of the same day's login event is a no-op, not a duplicate row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginDay {
    pub id: UniversalUuid,
    pub user_id: UniversalUuid,
    pub login_date: UniversalDate,
    pub created_at: UniversalTimestamp,
}
