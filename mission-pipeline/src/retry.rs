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

//! A small reusable retry policy, specialized by the outbox sweeper (fixed
//! 30s backoff, 10 attempts) and the mission-init wait loop (100ms polls,
//! 5s hard bound).

use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub const fn fixed(max_attempts: u32, backoff: Duration) -> Self {
        Self { max_attempts, backoff }
    }

    pub fn exhausted(&self, attempt: u32) -> bool {
        attempt >= self.max_attempts
    }
}

/// The outbox's fixed 30s-backoff, 10-attempt policy (§4.3).
pub const OUTBOX_RETRY_POLICY: RetryPolicy =
    RetryPolicy::fixed(crate::models::OUTBOX_MAX_RETRIES as u32, Duration::from_secs(30));

/// The mission-init lock's poll interval and hard wait bound (§5).
pub const MISSION_INIT_POLL_INTERVAL: Duration = Duration::from_millis(100);
pub const MISSION_INIT_MAX_WAIT: Duration = Duration::from_secs(5);
