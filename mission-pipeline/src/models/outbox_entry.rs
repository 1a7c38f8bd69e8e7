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

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutboxStatus {
    Pending,
    Failed,
}

impl OutboxStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutboxStatus::Pending => "PENDING",
            OutboxStatus::Failed => "FAILED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(OutboxStatus::Pending),
            "FAILED" => Some(OutboxStatus::Failed),
            _ => None,
        }
    }
}

/// A bus message that could not be published inline, parked here by the
/// Bus Adapter's failure path and retried by the outbox sweeper on a fixed
/// 30s cadence, up to 10 attempts, before moving to `FAILED`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboxEntry {
    pub id: UniversalUuid,
    pub topic: String,
    pub dedup_key: String,
    pub payload_json: String,
    pub status: OutboxStatus,
    pub retry_count: i32,
    pub next_retry_at: UniversalTimestamp,
    pub last_error: Option<String>,
    pub created_at: UniversalTimestamp,
}

pub const OUTBOX_MAX_RETRIES: i32 = 10;
pub const OUTBOX_RETRY_BACKOFF_SECS: i64 = 30;
pub const OUTBOX_SWEEP_INTERVAL_SECS: u64 = 30;
