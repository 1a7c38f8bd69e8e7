//! An in-process `EventStore` backed by `parking_lot`-guarded `Vec`s and
//! `HashMap`s -- no database required. Every uniqueness constraint the
//! Diesel-backed store enforces through a unique index is enforced here by
//! hand, scanning the relevant collection before inserting.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use mission_pipeline::dal::{EventStore, RecordOutcome};
use mission_pipeline::database::universal_types::{UniversalDate, UniversalTimestamp, UniversalUuid};
use mission_pipeline::error::DatabaseError;
use mission_pipeline::models::{
    GameLaunch, LoginDay, Mission, MissionStatus, MissionType, OutboxEntry, OutboxStatus, PlaySession, Reward,
};

#[derive(Default)]
struct State {
    users: HashMap<UniversalUuid, String>,
    user_points: HashMap<UniversalUuid, i64>,
    games: HashMap<UniversalUuid, String>,
    login_days: Vec<LoginDay>,
    game_launches: Vec<GameLaunch>,
    play_sessions: Vec<PlaySession>,
    missions: Vec<Mission>,
    rewards: Vec<Reward>,
    outbox: Vec<OutboxEntry>,
}

/// Fully in-memory `EventStore`. Cloning shares the underlying state (it
/// wraps an `Arc`-like `Mutex` behind a plain field), so the same instance
/// can be handed to multiple consumer tasks in a test and still see each
/// other's writes.
pub struct InMemoryEventStore {
    state: Mutex<State>,
    next_seq: AtomicI64,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self { state: Mutex::new(State::default()), next_seq: AtomicI64::new(0) }
    }

    fn new_id(&self) -> UniversalUuid {
        UniversalUuid::new_v4()
    }

    fn tick(&self) -> i64 {
        self.next_seq.fetch_add(1, Ordering::Relaxed)
    }

    /// Test helper: current point total, without going through `ensure_user`.
    pub fn points_of(&self, user_id: UniversalUuid) -> i64 {
        *self.state.lock().user_points.get(&user_id).unwrap_or(&0)
    }
}

impl Default for InMemoryEventStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn user_exists(&self, user_id: UniversalUuid) -> Result<bool, DatabaseError> {
        Ok(self.state.lock().users.contains_key(&user_id))
    }

    async fn game_exists(&self, game_id: UniversalUuid) -> Result<bool, DatabaseError> {
        Ok(self.state.lock().games.contains_key(&game_id))
    }

    async fn ensure_user(&self, external_ref: &str) -> Result<UniversalUuid, DatabaseError> {
        let mut state = self.state.lock();
        if let Some((id, _)) = state.users.iter().find(|(_, r)| r.as_str() == external_ref) {
            return Ok(*id);
        }
        let id = self.new_id();
        state.users.insert(id, external_ref.to_string());
        state.user_points.insert(id, 0);
        Ok(id)
    }

    async fn ensure_game(&self, external_ref: &str) -> Result<UniversalUuid, DatabaseError> {
        let mut state = self.state.lock();
        if let Some((id, _)) = state.games.iter().find(|(_, r)| r.as_str() == external_ref) {
            return Ok(*id);
        }
        let id = self.new_id();
        state.games.insert(id, external_ref.to_string());
        Ok(id)
    }

    async fn record_login_day(
        &self,
        user_id: UniversalUuid,
        login_date: UniversalDate,
    ) -> Result<RecordOutcome, DatabaseError> {
        let mut state = self.state.lock();
        if state.login_days.iter().any(|d| d.user_id == user_id && d.login_date == login_date) {
            return Ok(RecordOutcome::AlreadyRecorded);
        }
        let now = UniversalTimestamp::now();
        state.login_days.push(LoginDay { id: self.new_id(), user_id, login_date, created_at: now });
        Ok(RecordOutcome::Recorded)
    }

    async fn record_game_launch(
        &self,
        user_id: UniversalUuid,
        game_id: UniversalUuid,
        launched_at: UniversalTimestamp,
    ) -> Result<RecordOutcome, DatabaseError> {
        let launch_date = UniversalDate::from_timestamp(launched_at);
        let mut state = self.state.lock();
        if state
            .game_launches
            .iter()
            .any(|l| l.user_id == user_id && l.game_id == game_id && l.launch_date == launch_date)
        {
            return Ok(RecordOutcome::AlreadyRecorded);
        }
        let now = UniversalTimestamp::now();
        state.game_launches.push(GameLaunch {
            id: self.new_id(),
            user_id,
            game_id,
            launch_date,
            launched_at,
            created_at: now,
        });
        Ok(RecordOutcome::Recorded)
    }

    async fn record_play_session(
        &self,
        user_id: UniversalUuid,
        game_id: UniversalUuid,
        session_id: UniversalUuid,
        score: i32,
        played_at: UniversalTimestamp,
    ) -> Result<RecordOutcome, DatabaseError> {
        let mut state = self.state.lock();
        if state.play_sessions.iter().any(|p| p.session_id == session_id) {
            return Ok(RecordOutcome::AlreadyRecorded);
        }
        let now = UniversalTimestamp::now();
        state.play_sessions.push(PlaySession {
            id: self.new_id(),
            user_id,
            game_id,
            session_id,
            score,
            played_at,
            created_at: now,
        });
        Ok(RecordOutcome::Recorded)
    }

    async fn login_streak(
        &self,
        user_id: UniversalUuid,
        window_start: UniversalDate,
        as_of: UniversalDate,
    ) -> Result<u32, DatabaseError> {
        let state = self.state.lock();
        let mut days: Vec<UniversalDate> = state
            .login_days
            .iter()
            .filter(|d| d.user_id == user_id && d.login_date >= window_start && d.login_date <= as_of)
            .map(|d| d.login_date)
            .collect();
        days.sort_unstable();
        days.dedup();
        let Some(&most_recent) = days.last() else {
            return Ok(0);
        };
        let set: std::collections::HashSet<_> = days.into_iter().collect();
        let mut streak = 0u32;
        let mut cursor = most_recent;
        loop {
            if set.contains(&cursor) {
                streak += 1;
                cursor = cursor.pred();
            } else {
                break;
            }
        }
        Ok(streak)
    }

    async fn distinct_games_launched(&self, user_id: UniversalUuid, window_start: UniversalDate) -> Result<u32, DatabaseError> {
        let state = self.state.lock();
        let distinct: std::collections::HashSet<_> = state
            .game_launches
            .iter()
            .filter(|l| l.user_id == user_id && UniversalDate::from_timestamp(l.launched_at) >= window_start)
            .map(|l| l.game_id)
            .collect();
        Ok(distinct.len() as u32)
    }

    async fn play_session_summary(&self, user_id: UniversalUuid, window_start: UniversalDate) -> Result<(u32, i64), DatabaseError> {
        let state = self.state.lock();
        let matching: Vec<_> = state
            .play_sessions
            .iter()
            .filter(|p| p.user_id == user_id && UniversalDate::from_timestamp(p.played_at) >= window_start)
            .collect();
        let count = matching.len() as u32;
        let sum = matching.iter().map(|p| p.score as i64).sum();
        Ok((count, sum))
    }

    async fn latest_cycle_start(&self, user_id: UniversalUuid) -> Result<Option<UniversalDate>, DatabaseError> {
        let state = self.state.lock();
        Ok(state
            .missions
            .iter()
            .filter(|m| m.user_id == user_id)
            .map(|m| m.cycle_start)
            .max())
    }

    async fn get_mission(
        &self,
        user_id: UniversalUuid,
        mission_type: MissionType,
        cycle_start: UniversalDate,
    ) -> Result<Option<Mission>, DatabaseError> {
        let state = self.state.lock();
        Ok(state
            .missions
            .iter()
            .find(|m| m.user_id == user_id && m.mission_type == mission_type && m.cycle_start == cycle_start)
            .cloned())
    }

    async fn insert_mission_if_absent(&self, mission: Mission) -> Result<(), DatabaseError> {
        let mut state = self.state.lock();
        let exists = state
            .missions
            .iter()
            .any(|m| m.user_id == mission.user_id && m.mission_type == mission.mission_type && m.cycle_start == mission.cycle_start);
        if !exists {
            state.missions.push(mission);
        }
        Ok(())
    }

    async fn list_missions_for_user(&self, user_id: UniversalUuid) -> Result<Vec<Mission>, DatabaseError> {
        let state = self.state.lock();
        let mut missions: Vec<_> = state.missions.iter().filter(|m| m.user_id == user_id).cloned().collect();
        missions.sort_by(|a, b| b.cycle_start.cmp(&a.cycle_start));
        Ok(missions)
    }

    async fn list_rewards_for_user(&self, user_id: UniversalUuid) -> Result<Vec<Reward>, DatabaseError> {
        let state = self.state.lock();
        let mut rewards: Vec<_> = state.rewards.iter().filter(|r| r.user_id == user_id).cloned().collect();
        rewards.sort_by(|a, b| b.distributed_at.into_inner().cmp(&a.distributed_at.into_inner()));
        Ok(rewards)
    }

    async fn cas_update_mission_progress(
        &self,
        mission_id: UniversalUuid,
        progress_json: String,
        complete: bool,
        completed_at: UniversalTimestamp,
    ) -> Result<u64, DatabaseError> {
        let mut state = self.state.lock();
        let Some(mission) = state.missions.iter_mut().find(|m| m.id == mission_id) else {
            return Ok(0);
        };
        if complete {
            if mission.is_completed() {
                return Ok(0);
            }
            mission.status = MissionStatus::Completed;
            mission.completed_at = Some(completed_at);
        }
        mission.progress_json = progress_json;
        mission.updated_at = completed_at;
        Ok(1)
    }

    async fn all_missions_completed(&self, user_id: UniversalUuid, cycle_start: UniversalDate) -> Result<bool, DatabaseError> {
        let state = self.state.lock();
        let matching: Vec<_> =
            state.missions.iter().filter(|m| m.user_id == user_id && m.cycle_start == cycle_start).collect();
        Ok(matching.len() == MissionType::ALL.len() && matching.iter().all(|m| m.is_completed()))
    }

    async fn get_reward(&self, user_id: UniversalUuid, reward_type: &str, period: &str) -> Result<Option<Reward>, DatabaseError> {
        let state = self.state.lock();
        Ok(state
            .rewards
            .iter()
            .find(|r| r.user_id == user_id && r.reward_type == reward_type && r.period == period)
            .cloned())
    }

    async fn grant_reward_if_absent(
        &self,
        user_id: UniversalUuid,
        reward_type: &str,
        period: &str,
        points: i32,
    ) -> Result<bool, DatabaseError> {
        let mut state = self.state.lock();
        let already_granted =
            state.rewards.iter().any(|r| r.user_id == user_id && r.reward_type == reward_type && r.period == period);
        if already_granted {
            return Ok(false);
        }
        let Some(balance) = state.user_points.get_mut(&user_id) else {
            return Err(DatabaseError::Invariant(format!("reward grant affected 0 user rows for {user_id}")));
        };
        *balance += points as i64;
        state.rewards.push(Reward {
            id: self.new_id(),
            user_id,
            reward_type: reward_type.to_string(),
            period: period.to_string(),
            points,
            distributed_at: UniversalTimestamp::now(),
        });
        Ok(true)
    }

    async fn user_points(&self, user_id: UniversalUuid) -> Result<i64, DatabaseError> {
        Ok(self.points_of(user_id))
    }

    async fn enqueue_outbox(&self, topic: &str, dedup_key: &str, payload_json: String) -> Result<(), DatabaseError> {
        let mut state = self.state.lock();
        let now = UniversalTimestamp::now();
        state.outbox.push(OutboxEntry {
            id: self.new_id(),
            topic: topic.to_string(),
            dedup_key: dedup_key.to_string(),
            payload_json,
            status: OutboxStatus::Pending,
            retry_count: 0,
            next_retry_at: now,
            last_error: None,
            created_at: now,
        });
        let _ = self.tick();
        Ok(())
    }

    async fn due_outbox_entries(&self, limit: i64) -> Result<Vec<OutboxEntry>, DatabaseError> {
        let state = self.state.lock();
        let now = UniversalTimestamp::now();
        Ok(state
            .outbox
            .iter()
            .filter(|e| matches!(e.status, OutboxStatus::Pending) && e.next_retry_at.into_inner() <= now.into_inner())
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn mark_outbox_delivered(&self, id: UniversalUuid) -> Result<(), DatabaseError> {
        self.state.lock().outbox.retain(|e| e.id != id);
        Ok(())
    }

    async fn mark_outbox_retry(
        &self,
        id: UniversalUuid,
        retry_count: i32,
        next_retry_at: UniversalTimestamp,
        last_error: String,
    ) -> Result<(), DatabaseError> {
        let mut state = self.state.lock();
        if let Some(entry) = state.outbox.iter_mut().find(|e| e.id == id) {
            entry.retry_count = retry_count;
            entry.next_retry_at = next_retry_at;
            entry.last_error = Some(last_error);
        }
        Ok(())
    }

    async fn mark_outbox_failed(&self, id: UniversalUuid, last_error: String) -> Result<(), DatabaseError> {
        let mut state = self.state.lock();
        if let Some(entry) = state.outbox.iter_mut().find(|e| e.id == id) {
            entry.status = OutboxStatus::Failed;
            entry.last_error = Some(last_error);
        }
        Ok(())
    }
}
