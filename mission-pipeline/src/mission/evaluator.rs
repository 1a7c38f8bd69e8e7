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

//! Pure completion predicates (C5), one per mission type. Each takes the
//! raw counters the Event Store already aggregated and returns whether the
//! mission is complete plus the progress payload to persist either way.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::dal::EventStore;
use crate::database::universal_types::{UniversalDate, UniversalUuid};
use crate::error::PipelineError;
use crate::models::MissionType;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginProgress {
    pub consecutive_days: u32,
}

pub fn evaluate_login_streak(streak: u32) -> (bool, LoginProgress) {
    (streak >= 3, LoginProgress { consecutive_days: streak })
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LaunchProgress {
    pub distinct_games: u32,
}

pub fn evaluate_distinct_launches(distinct_games: u32) -> (bool, LaunchProgress) {
    (distinct_games >= 3, LaunchProgress { distinct_games })
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayProgress {
    pub sessions: u32,
    pub score_sum: i64,
}

/// Complete once at least 3 sessions are recorded AND their summed score
/// strictly exceeds 1000 -- both conditions, not either.
pub fn evaluate_play_sessions(sessions: u32, score_sum: i64) -> (bool, PlayProgress) {
    (sessions >= 3 && score_sum > 1000, PlayProgress { sessions, score_sum })
}

/// Bridges the pure predicates above to the Event Store: fetches the raw
/// counters for a mission type within its cycle window and evaluates
/// completion, returning the serialized progress payload either way so the
/// Completion Engine can persist it regardless of outcome.
pub struct MissionEvaluator {
    store: Arc<dyn EventStore>,
}

impl MissionEvaluator {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self { store }
    }

    /// `window_start` is the rolling 30-day lookback from the evaluation
    /// instant (spec.md §4.5: "all subsequent cycle-window checks use a
    /// 30-day lookback from the evaluation instant"), not the mission's
    /// `cycle_start` -- a cycle that has been open for three weeks still
    /// evaluates logins/launches/plays over the last 30 days, not just the
    /// days since the cycle began.
    pub async fn evaluate(
        &self,
        user_id: UniversalUuid,
        mission_type: MissionType,
        window_start: UniversalDate,
        as_of: UniversalDate,
    ) -> Result<(bool, String), PipelineError> {
        let (complete, progress_json) = match mission_type {
            MissionType::LoginThreeConsecutive => {
                let streak = self.store.login_streak(user_id, window_start, as_of).await?;
                let (complete, progress) = evaluate_login_streak(streak);
                (complete, serde_json::to_string(&progress).expect("serializable"))
            }
            MissionType::LaunchThreeDistinct => {
                let distinct = self.store.distinct_games_launched(user_id, window_start).await?;
                let (complete, progress) = evaluate_distinct_launches(distinct);
                (complete, serde_json::to_string(&progress).expect("serializable"))
            }
            MissionType::PlayThreeSessionsScoreOver1000 => {
                let (sessions, score_sum) = self.store.play_session_summary(user_id, window_start).await?;
                let (complete, progress) = evaluate_play_sessions(sessions, score_sum);
                (complete, serde_json::to_string(&progress).expect("serializable"))
            }
        };
        Ok((complete, progress_json))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_streak_completes_at_three() {
        assert!(!evaluate_login_streak(2).0);
        assert!(evaluate_login_streak(3).0);
        assert!(evaluate_login_streak(4).0);
    }

    #[test]
    fn distinct_launches_completes_at_three() {
        assert!(!evaluate_distinct_launches(2).0);
        assert!(evaluate_distinct_launches(3).0);
    }

    #[test]
    fn play_sessions_requires_both_count_and_strict_score() {
        assert!(!evaluate_play_sessions(3, 1000).0);
        assert!(evaluate_play_sessions(3, 1001).0);
        assert!(!evaluate_play_sessions(2, 2000).0);
    }
}
