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

//! Diesel row structs for the unified schema, and their conversions to and
//! from the backend-agnostic domain types in `crate::models`.

use crate::database::schema::*;
use crate::database::universal_types::{UniversalDate, UniversalTimestamp, UniversalUuid};
use crate::models::{
    Game, GameLaunch, LoginDay, Mission, MissionStatus, MissionType, OutboxEntry, OutboxStatus,
    PlaySession, Reward, User,
};

#[derive(Debug, Clone, diesel::Queryable, diesel::Selectable)]
#[diesel(table_name = users)]
pub struct UserRow {
    pub id: UniversalUuid,
    pub external_ref: String,
    pub points: i64,
    pub created_at: UniversalTimestamp,
}

#[derive(Debug, Clone, diesel::Insertable)]
#[diesel(table_name = users)]
pub struct NewUserRow {
    pub id: UniversalUuid,
    pub external_ref: String,
    pub points: i64,
    pub created_at: UniversalTimestamp,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            external_ref: row.external_ref,
            points: row.points,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, diesel::Queryable, diesel::Selectable)]
#[diesel(table_name = games)]
pub struct GameRow {
    pub id: UniversalUuid,
    pub external_ref: String,
    pub created_at: UniversalTimestamp,
}

#[derive(Debug, Clone, diesel::Insertable)]
#[diesel(table_name = games)]
pub struct NewGameRow {
    pub id: UniversalUuid,
    pub external_ref: String,
    pub created_at: UniversalTimestamp,
}

impl From<GameRow> for Game {
    fn from(row: GameRow) -> Self {
        Game {
            id: row.id,
            external_ref: row.external_ref,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, diesel::Queryable, diesel::Selectable)]
#[diesel(table_name = user_login_records)]
pub struct LoginDayRow {
    pub id: UniversalUuid,
    pub user_id: UniversalUuid,
    pub login_date: UniversalDate,
    pub created_at: UniversalTimestamp,
}

#[derive(Debug, Clone, diesel::Insertable)]
#[diesel(table_name = user_login_records)]
pub struct NewLoginDayRow {
    pub id: UniversalUuid,
    pub user_id: UniversalUuid,
    pub login_date: UniversalDate,
    pub created_at: UniversalTimestamp,
}

impl From<LoginDayRow> for LoginDay {
    fn from(row: LoginDayRow) -> Self {
        LoginDay {
            id: row.id,
            user_id: row.user_id,
            login_date: row.login_date,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, diesel::Queryable, diesel::Selectable)]
#[diesel(table_name = user_game_launches)]
pub struct GameLaunchRow {
    pub id: UniversalUuid,
    pub user_id: UniversalUuid,
    pub game_id: UniversalUuid,
    pub launch_date: UniversalDate,
    pub launched_at: UniversalTimestamp,
    pub created_at: UniversalTimestamp,
}

#[derive(Debug, Clone, diesel::Insertable)]
#[diesel(table_name = user_game_launches)]
pub struct NewGameLaunchRow {
    pub id: UniversalUuid,
    pub user_id: UniversalUuid,
    pub game_id: UniversalUuid,
    pub launch_date: UniversalDate,
    pub launched_at: UniversalTimestamp,
    pub created_at: UniversalTimestamp,
}

impl From<GameLaunchRow> for GameLaunch {
    fn from(row: GameLaunchRow) -> Self {
        GameLaunch {
            id: row.id,
            user_id: row.user_id,
            game_id: row.game_id,
            launch_date: row.launch_date,
            launched_at: row.launched_at,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, diesel::Queryable, diesel::Selectable)]
#[diesel(table_name = games_play_record)]
pub struct PlaySessionRow {
    pub id: UniversalUuid,
    pub user_id: UniversalUuid,
    pub game_id: UniversalUuid,
    pub session_id: UniversalUuid,
    pub score: i32,
    pub played_at: UniversalTimestamp,
    pub created_at: UniversalTimestamp,
}

#[derive(Debug, Clone, diesel::Insertable)]
#[diesel(table_name = games_play_record)]
pub struct NewPlaySessionRow {
    pub id: UniversalUuid,
    pub user_id: UniversalUuid,
    pub game_id: UniversalUuid,
    pub session_id: UniversalUuid,
    pub score: i32,
    pub played_at: UniversalTimestamp,
    pub created_at: UniversalTimestamp,
}

impl From<PlaySessionRow> for PlaySession {
    fn from(row: PlaySessionRow) -> Self {
        PlaySession {
            id: row.id,
            user_id: row.user_id,
            game_id: row.game_id,
            session_id: row.session_id,
            score: row.score,
            played_at: row.played_at,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, diesel::Queryable, diesel::Selectable)]
#[diesel(table_name = missions)]
pub struct MissionRow {
    pub id: UniversalUuid,
    pub user_id: UniversalUuid,
    pub mission_type: String,
    pub cycle_start: UniversalDate,
    pub status: String,
    pub progress_json: String,
    pub completed_at: Option<UniversalTimestamp>,
    pub created_at: UniversalTimestamp,
    pub updated_at: UniversalTimestamp,
}

#[derive(Debug, Clone, diesel::Insertable)]
#[diesel(table_name = missions)]
pub struct NewMissionRow {
    pub id: UniversalUuid,
    pub user_id: UniversalUuid,
    pub mission_type: String,
    pub cycle_start: UniversalDate,
    pub status: String,
    pub progress_json: String,
    pub completed_at: Option<UniversalTimestamp>,
    pub created_at: UniversalTimestamp,
    pub updated_at: UniversalTimestamp,
}

impl TryFrom<MissionRow> for Mission {
    type Error = String;

    fn try_from(row: MissionRow) -> Result<Self, Self::Error> {
        Ok(Mission {
            id: row.id,
            user_id: row.user_id,
            mission_type: MissionType::from_str(&row.mission_type)
                .ok_or_else(|| format!("unrecognized mission_type {}", row.mission_type))?,
            cycle_start: row.cycle_start,
            status: MissionStatus::from_str(&row.status)
                .ok_or_else(|| format!("unrecognized status {}", row.status))?,
            progress_json: row.progress_json,
            completed_at: row.completed_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone, diesel::Queryable, diesel::Selectable)]
#[diesel(table_name = mission_rewards)]
pub struct RewardRow {
    pub id: UniversalUuid,
    pub user_id: UniversalUuid,
    pub reward_type: String,
    pub period: String,
    pub points: i32,
    pub distributed_at: UniversalTimestamp,
}

#[derive(Debug, Clone, diesel::Insertable)]
#[diesel(table_name = mission_rewards)]
pub struct NewRewardRow {
    pub id: UniversalUuid,
    pub user_id: UniversalUuid,
    pub reward_type: String,
    pub period: String,
    pub points: i32,
    pub distributed_at: UniversalTimestamp,
}

impl From<RewardRow> for Reward {
    fn from(row: RewardRow) -> Self {
        Reward {
            id: row.id,
            user_id: row.user_id,
            reward_type: row.reward_type,
            period: row.period,
            points: row.points,
            distributed_at: row.distributed_at,
        }
    }
}

#[derive(Debug, Clone, diesel::Queryable, diesel::Selectable)]
#[diesel(table_name = message_outbox)]
pub struct OutboxRow {
    pub id: UniversalUuid,
    pub topic: String,
    pub dedup_key: String,
    pub payload_json: String,
    pub status: String,
    pub retry_count: i32,
    pub next_retry_at: UniversalTimestamp,
    pub last_error: Option<String>,
    pub created_at: UniversalTimestamp,
}

#[derive(Debug, Clone, diesel::Insertable)]
#[diesel(table_name = message_outbox)]
pub struct NewOutboxRow {
    pub id: UniversalUuid,
    pub topic: String,
    pub dedup_key: String,
    pub payload_json: String,
    pub status: String,
    pub retry_count: i32,
    pub next_retry_at: UniversalTimestamp,
    pub last_error: Option<String>,
    pub created_at: UniversalTimestamp,
}

impl TryFrom<OutboxRow> for OutboxEntry {
    type Error = String;

    fn try_from(row: OutboxRow) -> Result<Self, Self::Error> {
        Ok(OutboxEntry {
            id: row.id,
            topic: row.topic,
            dedup_key: row.dedup_key,
            payload_json: row.payload_json,
            status: OutboxStatus::from_str(&row.status)
                .ok_or_else(|| format!("unrecognized outbox status {}", row.status))?,
            retry_count: row.retry_count,
            next_retry_at: row.next_retry_at,
            last_error: row.last_error,
            created_at: row.created_at,
        })
    }
}
