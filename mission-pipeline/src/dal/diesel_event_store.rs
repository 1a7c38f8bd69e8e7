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

//! Diesel-backed `EventStore`. Every method opens one pooled connection via
//! `Database::interact` and issues plain Diesel queries against
//! `AnyConnection` -- `diesel::MultiConnection` makes the same query
//! compile and run against either the Postgres or the SQLite arm, so there
//! is no `_postgres`/`_sqlite` method split here.

use async_trait::async_trait;
use diesel::prelude::*;

use crate::dal::models::{
    GameRow, LoginDayRow, MissionRow, NewGameLaunchRow, NewGameRow, NewLoginDayRow, NewMissionRow,
    NewOutboxRow, NewPlaySessionRow, NewRewardRow, NewUserRow, OutboxRow, UserRow,
};
use crate::database::schema::{
    games, games_play_record, message_outbox, missions, mission_rewards, user_game_launches,
    user_login_records, users,
};
use crate::database::universal_types::{UniversalDate, UniversalTimestamp, UniversalUuid};
use crate::database::Database;
use crate::error::DatabaseError;
use crate::models::{Mission, MissionStatus, MissionType, OutboxEntry, Reward};

use super::event_store::{EventStore, RecordOutcome};

pub struct DieselEventStore {
    db: Database,
}

impl DieselEventStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl EventStore for DieselEventStore {
    async fn user_exists(&self, user_id: UniversalUuid) -> Result<bool, DatabaseError> {
        self.db
            .interact(move |conn| {
                diesel::select(diesel::dsl::exists(users::table.filter(users::id.eq(user_id))))
                    .get_result(conn)
            })
            .await
    }

    async fn game_exists(&self, game_id: UniversalUuid) -> Result<bool, DatabaseError> {
        self.db
            .interact(move |conn| {
                diesel::select(diesel::dsl::exists(games::table.filter(games::id.eq(game_id))))
                    .get_result(conn)
            })
            .await
    }

    async fn ensure_user(&self, external_ref: &str) -> Result<UniversalUuid, DatabaseError> {
        let external_ref = external_ref.to_string();
        self.db
            .interact(move |conn| {
                conn.transaction(|conn| {
                    if let Some(row) = users::table
                        .filter(users::external_ref.eq(&external_ref))
                        .select(UserRow::as_select())
                        .first(conn)
                        .optional()?
                    {
                        return Ok(row.id);
                    }
                    let id = UniversalUuid::new_v4();
                    diesel::insert_into(users::table)
                        .values(NewUserRow {
                            id,
                            external_ref: external_ref.clone(),
                            points: 0,
                            created_at: UniversalTimestamp::now(),
                        })
                        .execute(conn)?;
                    Ok(id)
                })
            })
            .await
    }

    async fn ensure_game(&self, external_ref: &str) -> Result<UniversalUuid, DatabaseError> {
        let external_ref = external_ref.to_string();
        self.db
            .interact(move |conn| {
                conn.transaction(|conn| {
                    if let Some(row) = games::table
                        .filter(games::external_ref.eq(&external_ref))
                        .select(GameRow::as_select())
                        .first(conn)
                        .optional()?
                    {
                        return Ok(row.id);
                    }
                    let id = UniversalUuid::new_v4();
                    diesel::insert_into(games::table)
                        .values(NewGameRow {
                            id,
                            external_ref: external_ref.clone(),
                            created_at: UniversalTimestamp::now(),
                        })
                        .execute(conn)?;
                    Ok(id)
                })
            })
            .await
    }

    async fn record_login_day(
        &self,
        user_id: UniversalUuid,
        login_date: UniversalDate,
    ) -> Result<RecordOutcome, DatabaseError> {
        self.db
            .interact(move |conn| {
                let existing = user_login_records::table
                    .filter(user_login_records::user_id.eq(user_id))
                    .filter(user_login_records::login_date.eq(login_date))
                    .select(LoginDayRow::as_select())
                    .first(conn)
                    .optional()?;
                if existing.is_some() {
                    return Ok(RecordOutcome::AlreadyRecorded);
                }
                let inserted = diesel::insert_into(user_login_records::table)
                    .values(NewLoginDayRow {
                        id: UniversalUuid::new_v4(),
                        user_id,
                        login_date,
                        created_at: UniversalTimestamp::now(),
                    })
                    .execute(conn);
                match inserted {
                    Ok(_) => Ok(RecordOutcome::Recorded),
                    Err(diesel::result::Error::DatabaseError(
                        diesel::result::DatabaseErrorKind::UniqueViolation,
                        _,
                    )) => Ok(RecordOutcome::AlreadyRecorded),
                    Err(e) => Err(e),
                }
            })
            .await
    }

    async fn record_game_launch(
        &self,
        user_id: UniversalUuid,
        game_id: UniversalUuid,
        launched_at: UniversalTimestamp,
    ) -> Result<RecordOutcome, DatabaseError> {
        let launch_date = UniversalDate::from_timestamp(launched_at);
        self.db
            .interact(move |conn| {
                let existing = user_game_launches::table
                    .filter(user_game_launches::user_id.eq(user_id))
                    .filter(user_game_launches::game_id.eq(game_id))
                    .filter(user_game_launches::launch_date.eq(launch_date))
                    .select(user_game_launches::id)
                    .first::<UniversalUuid>(conn)
                    .optional()?;
                if existing.is_some() {
                    return Ok(RecordOutcome::AlreadyRecorded);
                }
                let inserted = diesel::insert_into(user_game_launches::table)
                    .values(NewGameLaunchRow {
                        id: UniversalUuid::new_v4(),
                        user_id,
                        game_id,
                        launch_date,
                        launched_at,
                        created_at: UniversalTimestamp::now(),
                    })
                    .execute(conn);
                match inserted {
                    Ok(_) => Ok(RecordOutcome::Recorded),
                    Err(diesel::result::Error::DatabaseError(
                        diesel::result::DatabaseErrorKind::UniqueViolation,
                        _,
                    )) => Ok(RecordOutcome::AlreadyRecorded),
                    Err(e) => Err(e),
                }
            })
            .await
    }

    async fn record_play_session(
        &self,
        user_id: UniversalUuid,
        game_id: UniversalUuid,
        session_id: UniversalUuid,
        score: i32,
        played_at: UniversalTimestamp,
    ) -> Result<RecordOutcome, DatabaseError> {
        self.db
            .interact(move |conn| {
                let existing = games_play_record::table
                    .filter(games_play_record::session_id.eq(session_id))
                    .select(games_play_record::id)
                    .first::<UniversalUuid>(conn)
                    .optional()?;
                if existing.is_some() {
                    return Ok(RecordOutcome::AlreadyRecorded);
                }
                let inserted = diesel::insert_into(games_play_record::table)
                    .values(NewPlaySessionRow {
                        id: UniversalUuid::new_v4(),
                        user_id,
                        game_id,
                        session_id,
                        score,
                        played_at,
                        created_at: UniversalTimestamp::now(),
                    })
                    .execute(conn);
                match inserted {
                    Ok(_) => Ok(RecordOutcome::Recorded),
                    Err(diesel::result::Error::DatabaseError(
                        diesel::result::DatabaseErrorKind::UniqueViolation,
                        _,
                    )) => Ok(RecordOutcome::AlreadyRecorded),
                    Err(e) => Err(e),
                }
            })
            .await
    }

    async fn login_streak(
        &self,
        user_id: UniversalUuid,
        window_start: UniversalDate,
        as_of: UniversalDate,
    ) -> Result<u32, DatabaseError> {
        self.db
            .interact(move |conn| {
                let days: Vec<UniversalDate> = user_login_records::table
                    .filter(user_login_records::user_id.eq(user_id))
                    .filter(user_login_records::login_date.ge(window_start))
                    .filter(user_login_records::login_date.le(as_of))
                    .select(user_login_records::login_date)
                    .load(conn)?;
                Ok(consecutive_streak_from_most_recent(&days))
            })
            .await
    }

    async fn latest_cycle_start(&self, user_id: UniversalUuid) -> Result<Option<UniversalDate>, DatabaseError> {
        self.db
            .interact(move |conn| {
                missions::table
                    .filter(missions::user_id.eq(user_id))
                    .select(missions::cycle_start)
                    .order(missions::cycle_start.desc())
                    .first(conn)
                    .optional()
            })
            .await
    }

    async fn user_points(&self, user_id: UniversalUuid) -> Result<i64, DatabaseError> {
        self.db
            .interact(move |conn| {
                users::table.filter(users::id.eq(user_id)).select(users::points).first(conn)
            })
            .await
    }

    async fn distinct_games_launched(
        &self,
        user_id: UniversalUuid,
        window_start: UniversalDate,
    ) -> Result<u32, DatabaseError> {
        self.db
            .interact(move |conn| {
                let ids: Vec<UniversalUuid> = user_game_launches::table
                    .filter(user_game_launches::user_id.eq(user_id))
                    .filter(user_game_launches::launched_at.ge(
                        UniversalTimestamp::from(
                            window_start
                                .0
                                .and_hms_opt(0, 0, 0)
                                .unwrap()
                                .and_utc(),
                        ),
                    ))
                    .select(user_game_launches::game_id)
                    .load(conn)?;
                let distinct: std::collections::HashSet<_> = ids.into_iter().collect();
                Ok(distinct.len() as u32)
            })
            .await
    }

    async fn play_session_summary(
        &self,
        user_id: UniversalUuid,
        window_start: UniversalDate,
    ) -> Result<(u32, i64), DatabaseError> {
        self.db
            .interact(move |conn| {
                let scores: Vec<i32> = games_play_record::table
                    .filter(games_play_record::user_id.eq(user_id))
                    .filter(games_play_record::played_at.ge(
                        UniversalTimestamp::from(
                            window_start
                                .0
                                .and_hms_opt(0, 0, 0)
                                .unwrap()
                                .and_utc(),
                        ),
                    ))
                    .select(games_play_record::score)
                    .load(conn)?;
                let count = scores.len() as u32;
                let sum: i64 = scores.iter().map(|s| *s as i64).sum();
                Ok((count, sum))
            })
            .await
    }

    async fn get_mission(
        &self,
        user_id: UniversalUuid,
        mission_type: MissionType,
        cycle_start: UniversalDate,
    ) -> Result<Option<Mission>, DatabaseError> {
        let mission_type_str = mission_type.as_str().to_string();
        let row: Option<MissionRow> = self
            .db
            .interact(move |conn| {
                missions::table
                    .filter(missions::user_id.eq(user_id))
                    .filter(missions::mission_type.eq(mission_type_str))
                    .filter(missions::cycle_start.eq(cycle_start))
                    .select(MissionRow::as_select())
                    .first(conn)
                    .optional()
            })
            .await?;
        match row {
            Some(row) => Ok(Some(Mission::try_from(row).map_err(DatabaseError::Query)?)),
            None => Ok(None),
        }
    }

    async fn list_missions_for_user(&self, user_id: UniversalUuid) -> Result<Vec<Mission>, DatabaseError> {
        let rows: Vec<MissionRow> = self
            .db
            .interact(move |conn| {
                missions::table
                    .filter(missions::user_id.eq(user_id))
                    .order((missions::cycle_start.desc(), missions::mission_type.asc()))
                    .select(MissionRow::as_select())
                    .load(conn)
            })
            .await?;
        rows.into_iter().map(|r| Mission::try_from(r).map_err(DatabaseError::Query)).collect()
    }

    async fn list_rewards_for_user(&self, user_id: UniversalUuid) -> Result<Vec<Reward>, DatabaseError> {
        let rows: Vec<crate::dal::models::RewardRow> = self
            .db
            .interact(move |conn| {
                mission_rewards::table
                    .filter(mission_rewards::user_id.eq(user_id))
                    .order(mission_rewards::distributed_at.desc())
                    .select(crate::dal::models::RewardRow::as_select())
                    .load(conn)
            })
            .await?;
        Ok(rows.into_iter().map(Reward::from).collect())
    }

    async fn insert_mission_if_absent(&self, mission: Mission) -> Result<(), DatabaseError> {
        self.db
            .interact(move |conn| {
                let new_row = NewMissionRow {
                    id: mission.id,
                    user_id: mission.user_id,
                    mission_type: mission.mission_type.as_str().to_string(),
                    cycle_start: mission.cycle_start,
                    status: mission.status.as_str().to_string(),
                    progress_json: mission.progress_json,
                    completed_at: mission.completed_at,
                    created_at: mission.created_at,
                    updated_at: mission.updated_at,
                };
                match diesel::insert_into(missions::table).values(new_row).execute(conn) {
                    Ok(_) => Ok(()),
                    Err(diesel::result::Error::DatabaseError(
                        diesel::result::DatabaseErrorKind::UniqueViolation,
                        _,
                    )) => Ok(()),
                    Err(e) => Err(e),
                }
            })
            .await
    }

    async fn cas_update_mission_progress(
        &self,
        mission_id: UniversalUuid,
        progress_json: String,
        complete: bool,
        completed_at: UniversalTimestamp,
    ) -> Result<u64, DatabaseError> {
        self.db
            .interact(move |conn| {
                let now = UniversalTimestamp::now();
                let affected = if complete {
                    diesel::update(
                        missions::table
                            .filter(missions::id.eq(mission_id))
                            .filter(missions::status.eq(MissionStatus::InProgress.as_str())),
                    )
                    .set((
                        missions::progress_json.eq(progress_json),
                        missions::status.eq(MissionStatus::Completed.as_str()),
                        missions::completed_at.eq(Some(completed_at)),
                        missions::updated_at.eq(now),
                    ))
                    .execute(conn)?
                } else {
                    diesel::update(
                        missions::table
                            .filter(missions::id.eq(mission_id))
                            .filter(missions::status.eq(MissionStatus::InProgress.as_str())),
                    )
                    .set((
                        missions::progress_json.eq(progress_json),
                        missions::updated_at.eq(now),
                    ))
                    .execute(conn)?
                };
                Ok(affected as u64)
            })
            .await
    }

    async fn all_missions_completed(
        &self,
        user_id: UniversalUuid,
        cycle_start: UniversalDate,
    ) -> Result<bool, DatabaseError> {
        self.db
            .interact(move |conn| {
                let completed_count: i64 = missions::table
                    .filter(missions::user_id.eq(user_id))
                    .filter(missions::cycle_start.eq(cycle_start))
                    .filter(missions::status.eq(MissionStatus::Completed.as_str()))
                    .count()
                    .get_result(conn)?;
                Ok(completed_count as usize == MissionType::ALL.len())
            })
            .await
    }

    async fn get_reward(
        &self,
        user_id: UniversalUuid,
        reward_type: &str,
        period: &str,
    ) -> Result<Option<Reward>, DatabaseError> {
        let reward_type = reward_type.to_string();
        let period = period.to_string();
        let row: Option<crate::dal::models::RewardRow> = self
            .db
            .interact(move |conn| {
                mission_rewards::table
                    .filter(mission_rewards::user_id.eq(user_id))
                    .filter(mission_rewards::reward_type.eq(reward_type))
                    .filter(mission_rewards::period.eq(period))
                    .select(crate::dal::models::RewardRow::as_select())
                    .first(conn)
                    .optional()
            })
            .await?;
        Ok(row.map(Reward::from))
    }

    async fn grant_reward_if_absent(
        &self,
        user_id: UniversalUuid,
        reward_type: &str,
        period: &str,
        points: i32,
    ) -> Result<bool, DatabaseError> {
        let reward_type = reward_type.to_string();
        let period = period.to_string();
        let result = self
            .db
            .interact(move |conn| {
                conn.transaction(|conn| {
                    let existing = mission_rewards::table
                        .filter(mission_rewards::user_id.eq(user_id))
                        .filter(mission_rewards::reward_type.eq(&reward_type))
                        .filter(mission_rewards::period.eq(&period))
                        .select(mission_rewards::id)
                        .first::<UniversalUuid>(conn)
                        .optional()?;
                    if existing.is_some() {
                        return Ok(false);
                    }
                    let inserted = diesel::insert_into(mission_rewards::table)
                        .values(NewRewardRow {
                            id: UniversalUuid::new_v4(),
                            user_id,
                            reward_type: reward_type.clone(),
                            period: period.clone(),
                            points,
                            distributed_at: UniversalTimestamp::now(),
                        })
                        .execute(conn);
                    match inserted {
                        Ok(_) => {}
                        Err(diesel::result::Error::DatabaseError(
                            diesel::result::DatabaseErrorKind::UniqueViolation,
                            _,
                        )) => return Ok(false),
                        Err(e) => return Err(e),
                    }
                    // §4.8 step 4: the points increment lands in the same
                    // transaction as the guard row so the two can never
                    // diverge; zero rows affected here means `user_id`
                    // doesn't exist, which the guard row insert should have
                    // made impossible under the users/missions foreign key.
                    let affected = diesel::update(users::table.filter(users::id.eq(user_id)))
                        .set(users::points.eq(users::points + i64::from(points)))
                        .execute(conn)?;
                    if affected == 0 {
                        return Err(diesel::result::Error::QueryBuilderError(
                            format!("reward grant affected 0 user rows for {user_id}").into(),
                        ));
                    }
                    Ok(true)
                })
            })
            .await;
        // `interact` only knows the generic diesel error, so the invariant
        // case above comes back as `DatabaseError::Query` -- recognize its
        // distinctive message and reclassify it as transient (§7).
        match result {
            Err(DatabaseError::Query(msg)) if msg.contains("affected 0 user rows") => {
                Err(DatabaseError::Invariant(msg))
            }
            other => other,
        }
    }

    async fn enqueue_outbox(
        &self,
        topic: &str,
        dedup_key: &str,
        payload_json: String,
    ) -> Result<(), DatabaseError> {
        let topic = topic.to_string();
        let dedup_key = dedup_key.to_string();
        self.db
            .interact(move |conn| {
                diesel::insert_into(message_outbox::table)
                    .values(NewOutboxRow {
                        id: UniversalUuid::new_v4(),
                        topic,
                        dedup_key,
                        payload_json,
                        status: crate::models::OutboxStatus::Pending.as_str().to_string(),
                        retry_count: 0,
                        next_retry_at: UniversalTimestamp::now(),
                        last_error: None,
                        created_at: UniversalTimestamp::now(),
                    })
                    .execute(conn)?;
                Ok(())
            })
            .await
    }

    async fn due_outbox_entries(&self, limit: i64) -> Result<Vec<OutboxEntry>, DatabaseError> {
        let rows: Vec<OutboxRow> = self
            .db
            .interact(move |conn| {
                message_outbox::table
                    .filter(message_outbox::status.eq(crate::models::OutboxStatus::Pending.as_str()))
                    .filter(message_outbox::next_retry_at.le(UniversalTimestamp::now()))
                    .order(message_outbox::created_at.asc())
                    .limit(limit)
                    .select(OutboxRow::as_select())
                    .load(conn)
            })
            .await?;
        rows.into_iter()
            .map(|r| OutboxEntry::try_from(r).map_err(DatabaseError::Query))
            .collect()
    }

    async fn mark_outbox_delivered(&self, id: UniversalUuid) -> Result<(), DatabaseError> {
        self.db
            .interact(move |conn| {
                diesel::delete(message_outbox::table.filter(message_outbox::id.eq(id))).execute(conn)?;
                Ok(())
            })
            .await
    }

    async fn mark_outbox_retry(
        &self,
        id: UniversalUuid,
        retry_count: i32,
        next_retry_at: UniversalTimestamp,
        last_error: String,
    ) -> Result<(), DatabaseError> {
        self.db
            .interact(move |conn| {
                diesel::update(message_outbox::table.filter(message_outbox::id.eq(id)))
                    .set((
                        message_outbox::retry_count.eq(retry_count),
                        message_outbox::next_retry_at.eq(next_retry_at),
                        message_outbox::last_error.eq(Some(last_error)),
                    ))
                    .execute(conn)?;
                Ok(())
            })
            .await
    }

    async fn mark_outbox_failed(&self, id: UniversalUuid, last_error: String) -> Result<(), DatabaseError> {
        self.db
            .interact(move |conn| {
                diesel::update(message_outbox::table.filter(message_outbox::id.eq(id)))
                    .set((
                        message_outbox::status.eq(crate::models::OutboxStatus::Failed.as_str()),
                        message_outbox::last_error.eq(Some(last_error)),
                    ))
                    .execute(conn)?;
                Ok(())
            })
            .await
    }
}

/// Longest run of consecutive calendar days in `days`, anchored at the
/// *most recent* date present rather than at "today" -- per spec.md §4.6,
/// logging in on D, D-1, D-2 completes the mission even if a day has since
/// elapsed with no further login.
fn consecutive_streak_from_most_recent(days: &[UniversalDate]) -> u32 {
    let mut distinct: Vec<UniversalDate> = days.to_vec();
    distinct.sort_unstable();
    distinct.dedup();
    let Some(&most_recent) = distinct.last() else {
        return 0;
    };
    let set: std::collections::HashSet<_> = distinct.into_iter().collect();
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
    streak
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> UniversalDate {
        UniversalDate(NaiveDate::from_ymd_opt(y, m, day).unwrap())
    }

    #[test]
    fn streak_counts_backward_from_most_recent_login() {
        let days = vec![d(2026, 1, 1), d(2026, 1, 2), d(2026, 1, 3)];
        assert_eq!(consecutive_streak_from_most_recent(&days), 3);
    }

    #[test]
    fn streak_breaks_on_gap() {
        let days = vec![d(2026, 1, 1), d(2026, 1, 3)];
        assert_eq!(consecutive_streak_from_most_recent(&days), 1);
    }

    #[test]
    fn streak_survives_a_day_with_no_login_since() {
        // Logged in on D, D-1, D-2 and nothing since -- still a 3-streak,
        // the anchor is the most recent login, not the evaluation instant.
        let days = vec![d(2026, 1, 1), d(2026, 1, 2), d(2026, 1, 3)];
        assert_eq!(consecutive_streak_from_most_recent(&days), 3);
    }

    #[test]
    fn streak_is_zero_with_no_logins() {
        let days: Vec<UniversalDate> = vec![];
        assert_eq!(consecutive_streak_from_most_recent(&days), 0);
    }

    #[test]
    fn out_of_order_duplicate_inserts_do_not_change_the_streak() {
        let days = vec![d(2026, 1, 3), d(2026, 1, 1), d(2026, 1, 2), d(2026, 1, 2)];
        assert_eq!(consecutive_streak_from_most_recent(&days), 3);
    }
}
