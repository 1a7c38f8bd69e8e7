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
use std::fmt;

/// The three fixed mission definitions. There is no mission catalog; these
/// are the only values this type can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MissionType {
    #[serde(rename = "LOGIN-3-CONSECUTIVE")]
    LoginThreeConsecutive,
    #[serde(rename = "LAUNCH-3-DISTINCT")]
    LaunchThreeDistinct,
    #[serde(rename = "PLAY-3-SESSIONS-SCORE-OVER-1000")]
    PlayThreeSessionsScoreOver1000,
}

impl MissionType {
    pub const ALL: [MissionType; 3] = [
        MissionType::LoginThreeConsecutive,
        MissionType::LaunchThreeDistinct,
        MissionType::PlayThreeSessionsScoreOver1000,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MissionType::LoginThreeConsecutive => "LOGIN-3-CONSECUTIVE",
            MissionType::LaunchThreeDistinct => "LAUNCH-3-DISTINCT",
            MissionType::PlayThreeSessionsScoreOver1000 => "PLAY-3-SESSIONS-SCORE-OVER-1000",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "LOGIN-3-CONSECUTIVE" => Some(MissionType::LoginThreeConsecutive),
            "LAUNCH-3-DISTINCT" => Some(MissionType::LaunchThreeDistinct),
            "PLAY-3-SESSIONS-SCORE-OVER-1000" => Some(MissionType::PlayThreeSessionsScoreOver1000),
            _ => None,
        }
    }
}

impl fmt::Display for MissionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MissionStatus {
    InProgress,
    Completed,
}

impl MissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MissionStatus::InProgress => "IN_PROGRESS",
            MissionStatus::Completed => "COMPLETED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "IN_PROGRESS" => Some(MissionStatus::InProgress),
            "COMPLETED" => Some(MissionStatus::Completed),
            _ => None,
        }
    }
}

/// A single mission instance for one user within one 30-day cycle.
/// `progress_json` is opaque here; `crate::mission::evaluator` owns its
/// shape per mission type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mission {
    pub id: UniversalUuid,
    pub user_id: UniversalUuid,
    pub mission_type: MissionType,
    pub cycle_start: UniversalDate,
    pub status: MissionStatus,
    pub progress_json: String,
    pub completed_at: Option<UniversalTimestamp>,
    pub created_at: UniversalTimestamp,
    pub updated_at: UniversalTimestamp,
}

impl Mission {
    pub fn is_completed(&self) -> bool {
        matches!(self.status, MissionStatus::Completed)
    }
}
