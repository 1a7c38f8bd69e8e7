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

//! The `EventStore` capability (C1): durable storage for users, games,
//! login/launch/play facts, missions, rewards, and the outbox. Every
//! component above the DAL depends on this trait, never on a concrete
//! Diesel type, so tests can swap in an in-memory fake.

use async_trait::async_trait;
use chrono::Duration;

use crate::database::universal_types::{UniversalDate, UniversalTimestamp, UniversalUuid};
use crate::error::{DatabaseError, ValidationError};
use crate::models::{GameLaunch, LoginDay, Mission, MissionType, OutboxEntry, PlaySession, Reward};

/// Outcome of recording a fact that is expected to be unique. `Recorded`
/// means this call inserted the row; `AlreadyRecorded` means a prior
/// delivery (or this one, retried) already had.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    Recorded,
    AlreadyRecorded,
}

#[async_trait]
pub trait EventStore: Send + Sync {
    async fn user_exists(&self, user_id: UniversalUuid) -> Result<bool, DatabaseError>;
    async fn game_exists(&self, game_id: UniversalUuid) -> Result<bool, DatabaseError>;

    /// Inserts a user/game row if the external id hasn't been seen before,
    /// returning its assigned internal id either way. The pipeline treats
    /// user/game identity as externally asserted, not something it
    /// validates against a catalog service (that boundary is external,
    /// §1) -- it only needs a stable internal id to key other tables on.
    async fn ensure_user(&self, external_ref: &str) -> Result<UniversalUuid, DatabaseError>;
    async fn ensure_game(&self, external_ref: &str) -> Result<UniversalUuid, DatabaseError>;

    async fn record_login_day(
        &self,
        user_id: UniversalUuid,
        login_date: UniversalDate,
    ) -> Result<RecordOutcome, DatabaseError>;

    async fn record_game_launch(
        &self,
        user_id: UniversalUuid,
        game_id: UniversalUuid,
        launched_at: UniversalTimestamp,
    ) -> Result<RecordOutcome, DatabaseError>;

    async fn record_play_session(
        &self,
        user_id: UniversalUuid,
        game_id: UniversalUuid,
        session_id: UniversalUuid,
        score: i32,
        played_at: UniversalTimestamp,
    ) -> Result<RecordOutcome, DatabaseError>;

    /// Longest consecutive login-day chain within `window_start..=as_of`,
    /// anchored at the most recent login day in that window -- not at
    /// `as_of` itself, per spec.md §4.6 ("the chain anchors at the most
    /// recent login, not at today"). `window_start` is the rolling 30-day
    /// lookback from the evaluation instant (§4.5), not the mission's
    /// `cycle_start`. Used by the LOGIN-3-CONSECUTIVE predicate.
    async fn login_streak(
        &self,
        user_id: UniversalUuid,
        window_start: UniversalDate,
        as_of: UniversalDate,
    ) -> Result<u32, DatabaseError>;

    /// Distinct games launched within `window_start..=now`.
    async fn distinct_games_launched(
        &self,
        user_id: UniversalUuid,
        window_start: UniversalDate,
    ) -> Result<u32, DatabaseError>;

    /// `(session_count, score_sum)` within `window_start..=now`.
    async fn play_session_summary(
        &self,
        user_id: UniversalUuid,
        window_start: UniversalDate,
    ) -> Result<(u32, i64), DatabaseError>;

    /// Most recent `cycle_start` this user has any mission rows for, if
    /// any. The router uses this to decide whether the user is still in
    /// their current 30-day cycle or due to start a new one.
    async fn latest_cycle_start(&self, user_id: UniversalUuid) -> Result<Option<UniversalDate>, DatabaseError>;

    async fn get_mission(
        &self,
        user_id: UniversalUuid,
        mission_type: MissionType,
        cycle_start: UniversalDate,
    ) -> Result<Option<Mission>, DatabaseError>;

    async fn insert_mission_if_absent(&self, mission: Mission) -> Result<(), DatabaseError>;

    /// All mission rows ever recorded for `user_id`, newest cycle first.
    /// Backs the read-only `get_missions` facade (§6); never filtered to
    /// the active cycle, so callers see prior cycles too.
    async fn list_missions_for_user(&self, user_id: UniversalUuid) -> Result<Vec<Mission>, DatabaseError>;

    /// All reward rows ever granted to `user_id`, newest first. Backs the
    /// read-only `get_rewards` facade (§6).
    async fn list_rewards_for_user(&self, user_id: UniversalUuid) -> Result<Vec<Reward>, DatabaseError>;

    /// Compare-and-swap: updates `progress_json` (and, when `complete` is
    /// true, status/completed_at) only if the row is still `IN_PROGRESS`,
    /// returning the number of rows affected (0 or 1). Callers treat
    /// `affected == 0` as "someone else already completed it" and act
    /// idempotently.
    async fn cas_update_mission_progress(
        &self,
        mission_id: UniversalUuid,
        progress_json: String,
        complete: bool,
        completed_at: UniversalTimestamp,
    ) -> Result<u64, DatabaseError>;

    async fn all_missions_completed(
        &self,
        user_id: UniversalUuid,
        cycle_start: UniversalDate,
    ) -> Result<bool, DatabaseError>;

    async fn get_reward(
        &self,
        user_id: UniversalUuid,
        reward_type: &str,
        period: &str,
    ) -> Result<Option<Reward>, DatabaseError>;

    /// Inserts the reward row and increments the user's point counter in
    /// the same transaction, returning `true` if this call granted it and
    /// `false` if a reward already existed for this `(user, reward_type,
    /// period)` key. An affected-row count of zero on the points update
    /// after the reward row was inserted is an invariant violation (the
    /// user must exist), surfaced as `DatabaseError::Invariant`, which
    /// `RewardDistributor::on_mission_completed` maps to
    /// `PipelineError::InvariantViolation`.
    async fn grant_reward_if_absent(
        &self,
        user_id: UniversalUuid,
        reward_type: &str,
        period: &str,
        points: i32,
    ) -> Result<bool, DatabaseError>;

    async fn user_points(&self, user_id: UniversalUuid) -> Result<i64, DatabaseError>;

    async fn enqueue_outbox(
        &self,
        topic: &str,
        dedup_key: &str,
        payload_json: String,
    ) -> Result<(), DatabaseError>;

    async fn due_outbox_entries(&self, limit: i64) -> Result<Vec<OutboxEntry>, DatabaseError>;

    async fn mark_outbox_delivered(&self, id: UniversalUuid) -> Result<(), DatabaseError>;

    async fn mark_outbox_retry(
        &self,
        id: UniversalUuid,
        retry_count: i32,
        next_retry_at: UniversalTimestamp,
        last_error: String,
    ) -> Result<(), DatabaseError>;

    async fn mark_outbox_failed(&self, id: UniversalUuid, last_error: String) -> Result<(), DatabaseError>;
}

pub(crate) fn validate_score(score: i32) -> Result<(), ValidationError> {
    if (0..=1000).contains(&score) {
        Ok(())
    } else {
        Err(ValidationError::ScoreOutOfRange(score))
    }
}

pub(crate) fn backoff_duration() -> Duration {
    Duration::seconds(crate::models::OUTBOX_RETRY_BACKOFF_SECS)
}
