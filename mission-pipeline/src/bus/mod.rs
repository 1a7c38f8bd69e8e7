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

//! The Bus Adapter (C4): a single `publish` capability fronting the four
//! fixed topics this pipeline speaks.

#[cfg(feature = "kafka")]
pub mod kafka;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::database::universal_types::{UniversalDate, UniversalTimestamp, UniversalUuid};
use crate::error::BusError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    UserLogin,
    GameLaunched,
    PlaySessionCompleted,
    MissionCompleted,
}

impl Topic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::UserLogin => "mission-login-event",
            Topic::GameLaunched => "mission-game-launch-event",
            Topic::PlaySessionCompleted => "mission-game-play-event",
            Topic::MissionCompleted => "mission-completed-event",
        }
    }
}

#[async_trait]
pub trait BusAdapter: Send + Sync {
    async fn publish(&self, topic: Topic, dedup_key: &str, payload: &[u8]) -> Result<(), BusError>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserLoginPayload {
    pub event_id: UniversalUuid,
    pub user_external_ref: String,
    pub login_date: UniversalDate,
    pub occurred_at: UniversalTimestamp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameLaunchedPayload {
    pub event_id: UniversalUuid,
    pub user_external_ref: String,
    pub game_external_ref: String,
    pub occurred_at: UniversalTimestamp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaySessionCompletedPayload {
    pub event_id: UniversalUuid,
    pub user_external_ref: String,
    pub game_external_ref: String,
    pub session_id: UniversalUuid,
    pub score: i32,
    pub occurred_at: UniversalTimestamp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissionCompletedPayload {
    pub event_id: UniversalUuid,
    pub user_id: UniversalUuid,
    pub mission_type: String,
    pub cycle_start: crate::database::universal_types::UniversalDate,
    pub completed_at: UniversalTimestamp,
}
