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

//! End-to-end scenarios against the in-memory fakes: no database, no
//! broker, just `Pipeline` wired to `InMemoryEventStore` / `InMemoryBusAdapter`.

use std::sync::Arc;

use mission_pipeline::bus::{MissionCompletedPayload, Topic};
use mission_pipeline::database::universal_types::{UniversalDate, UniversalTimestamp, UniversalUuid};
use mission_pipeline::models::MissionStatus;
use mission_pipeline::router::ConsumeOutcome;
use mission_pipeline::Pipeline;
use mission_pipeline_testing::{InMemoryBusAdapter, InMemoryEventStore, InMemoryKeyValueStore};

fn new_pipeline() -> (Pipeline<InMemoryKeyValueStore>, Arc<InMemoryBusAdapter>) {
    let store = Arc::new(InMemoryEventStore::new());
    let bus = Arc::new(InMemoryBusAdapter::new());
    let pipeline = Pipeline::new(store, bus.clone(), InMemoryKeyValueStore::new());
    (pipeline, bus)
}

fn outcome_completed(outcome: &ConsumeOutcome) -> bool {
    matches!(outcome, ConsumeOutcome::Processed(true))
}

/// Stands in for the bus consumer loop's mission-completed branch: drains
/// every `mission-completed-event` message published so far and feeds it
/// through `Pipeline::consume_mission_completed`, the only path that is
/// allowed to grant a reward.
async fn drain_mission_completed(pipeline: &Pipeline<InMemoryKeyValueStore>, bus: &InMemoryBusAdapter) {
    for message in bus.published_to(Topic::MissionCompleted) {
        let payload: MissionCompletedPayload =
            serde_json::from_slice(&message.payload).expect("mission-completed payload decodes");
        pipeline.consume_mission_completed(payload.event_id, payload.user_id, payload.cycle_start).await;
    }
}

/// Three consecutive login days complete LOGIN-3-CONSECUTIVE and publish
/// exactly one `MissionCompleted` plus the reward.
#[tokio::test]
async fn login_three_consecutive_days_completes_mission_and_grants_reward() {
    let (pipeline, bus) = new_pipeline();
    let today = UniversalDate::today();

    let outcome = pipeline.consume_login(UniversalUuid::new_v4(), "player-1", today.minus_days(2)).await;
    assert!(!outcome_completed(&outcome));

    let outcome = pipeline.consume_login(UniversalUuid::new_v4(), "player-1", today.minus_days(1)).await;
    assert!(!outcome_completed(&outcome));

    let outcome = pipeline.consume_login(UniversalUuid::new_v4(), "player-1", today).await;
    assert!(outcome_completed(&outcome));

    let missions = pipeline.get_missions("player-1").await.expect("missions readable");
    let login_mission = missions
        .iter()
        .find(|m| m.mission_type == mission_pipeline::models::MissionType::LoginThreeConsecutive)
        .expect("login mission exists");
    assert_eq!(login_mission.status, MissionStatus::Completed);

    assert_eq!(bus.published_to(Topic::MissionCompleted).len(), 1);
}

/// Redelivering the same login event (identical `event_id`) must not be
/// processed twice -- the dedup key makes the second delivery a no-op.
#[tokio::test]
async fn duplicate_ingress_event_is_not_reprocessed() {
    let (pipeline, bus) = new_pipeline();
    let event_id = UniversalUuid::new_v4();
    let today = UniversalDate::today();

    let first = pipeline.consume_login(event_id, "player-2", today).await;
    assert!(matches!(first, ConsumeOutcome::Processed(_)));

    let second = pipeline.consume_login(event_id, "player-2", today).await;
    assert!(matches!(second, ConsumeOutcome::Duplicate));

    // Only one login-day row should exist; launching the same mission
    // evaluation a second time for the same day is a no-op, not a
    // second-day streak advance.
    let missions = pipeline.get_missions("player-2").await.expect("missions readable");
    let login_mission = missions
        .iter()
        .find(|m| m.mission_type == mission_pipeline::models::MissionType::LoginThreeConsecutive)
        .expect("login mission exists");
    assert_eq!(login_mission.status, MissionStatus::InProgress);

    assert!(bus.published_to(Topic::MissionCompleted).is_empty());
}

/// Three distinct game launches complete LAUNCH-3-DISTINCT; a fourth launch
/// of a game already seen does not re-trigger completion.
#[tokio::test]
async fn launch_three_distinct_games_completes_mission_once() {
    let (pipeline, _bus) = new_pipeline();

    assert!(!outcome_completed(&pipeline.consume_launch(UniversalUuid::new_v4(), "player-3", "game-a", UniversalTimestamp::now()).await));
    assert!(!outcome_completed(&pipeline.consume_launch(UniversalUuid::new_v4(), "player-3", "game-b", UniversalTimestamp::now()).await));
    assert!(outcome_completed(&pipeline.consume_launch(UniversalUuid::new_v4(), "player-3", "game-c", UniversalTimestamp::now()).await));

    // Re-launching game-a again afterward must not report a second completion.
    let after = pipeline.consume_launch(UniversalUuid::new_v4(), "player-3", "game-a", UniversalTimestamp::now()).await;
    assert!(!outcome_completed(&after));
}

/// Score must strictly exceed 1000, not merely reach it, and at least three
/// sessions are required regardless of score.
#[tokio::test]
async fn play_sessions_require_strict_score_boundary_and_session_count() {
    let (pipeline, _bus) = new_pipeline();

    // Two sessions with a huge score: not enough sessions yet.
    assert!(!outcome_completed(&pipeline.consume_play(UniversalUuid::new_v4(), "player-4", "game-x", 500, UniversalTimestamp::now()).await));
    assert!(!outcome_completed(&pipeline.consume_play(UniversalUuid::new_v4(), "player-4", "game-x", 500, UniversalTimestamp::now()).await));

    // Third session brings the sum to exactly 1000 -- strictly-greater-than
    // required, so this must not complete.
    let at_boundary = pipeline.consume_play(UniversalUuid::new_v4(), "player-4", "game-x", 0, UniversalTimestamp::now()).await;
    assert!(!outcome_completed(&at_boundary));

    // One more point tips the sum to 1001 and completes it.
    let over_boundary = pipeline.consume_play(UniversalUuid::new_v4(), "player-4", "game-x", 1, UniversalTimestamp::now()).await;
    assert!(outcome_completed(&over_boundary));
}

/// A score outside `[0, 1000]` is rejected before it ever reaches the
/// router -- no dedup key is consumed, no mission row is touched.
#[tokio::test]
async fn play_session_score_out_of_range_is_fatal() {
    let (pipeline, _bus) = new_pipeline();
    let outcome = pipeline.consume_play(UniversalUuid::new_v4(), "player-5", "game-x", 1001, UniversalTimestamp::now()).await;
    assert!(matches!(outcome, ConsumeOutcome::Fatal(_)));
}

/// Completing all three missions in one cycle grants exactly one reward for
/// that cycle's period, even though each mission's completion independently
/// publishes a `mission-completed-event` and each of those, once consumed,
/// independently triggers the reward check.
#[tokio::test]
async fn completing_all_three_missions_grants_exactly_one_reward() {
    let (pipeline, bus) = new_pipeline();
    let today = UniversalDate::today();

    pipeline.consume_login(UniversalUuid::new_v4(), "player-6", today.minus_days(2)).await;
    pipeline.consume_login(UniversalUuid::new_v4(), "player-6", today.minus_days(1)).await;
    pipeline.consume_login(UniversalUuid::new_v4(), "player-6", today).await;

    pipeline.consume_launch(UniversalUuid::new_v4(), "player-6", "game-a", UniversalTimestamp::now()).await;
    pipeline.consume_launch(UniversalUuid::new_v4(), "player-6", "game-b", UniversalTimestamp::now()).await;
    pipeline.consume_launch(UniversalUuid::new_v4(), "player-6", "game-c", UniversalTimestamp::now()).await;

    pipeline.consume_play(UniversalUuid::new_v4(), "player-6", "game-a", 400, UniversalTimestamp::now()).await;
    pipeline.consume_play(UniversalUuid::new_v4(), "player-6", "game-a", 400, UniversalTimestamp::now()).await;
    pipeline.consume_play(UniversalUuid::new_v4(), "player-6", "game-a", 400, UniversalTimestamp::now()).await;

    // Nothing is rewarded until the mission-completed-event messages are
    // actually consumed off the bus -- the Completion Engine only publishes.
    assert!(pipeline.get_rewards("player-6").await.expect("rewards readable").is_empty());
    assert_eq!(bus.published_to(Topic::MissionCompleted).len(), 3, "one event per mission completed");

    drain_mission_completed(&pipeline, &bus).await;

    let rewards = pipeline.get_rewards("player-6").await.expect("rewards readable");
    assert_eq!(rewards.len(), 1);
    assert_eq!(rewards[0].reward_type, mission_pipeline::models::MISSION_COMPLETION_REWARD_TYPE);
    assert_eq!(rewards[0].points, mission_pipeline::models::MISSION_CYCLE_REWARD_POINTS);
}

/// When the bus is down, `publish_login` parks the event in the outbox
/// instead of losing it, and a subsequent sweep delivers it once the bus
/// recovers.
#[tokio::test]
async fn publish_parks_in_outbox_on_bus_failure_and_sweep_delivers_later() {
    let (pipeline, bus) = new_pipeline();
    bus.fail_next_publish(Topic::UserLogin, 1);

    let result = pipeline.publish_login("player-7", UniversalDate::today()).await;
    assert!(result.is_err());
    assert!(bus.published_to(Topic::UserLogin).is_empty());

    let report = pipeline.outbox().sweep_once().await.expect("sweep succeeds");
    assert_eq!(report.delivered, 1);
    assert_eq!(bus.published_to(Topic::UserLogin).len(), 1);
}

/// Once a cycle is fully completed, a same-day follow-up action resolves
/// back to that same cycle (the unique key is per calendar day) and leaves
/// the completed missions untouched rather than re-evaluating them.
#[tokio::test]
async fn completed_cycle_is_left_untouched_by_further_same_day_actions() {
    let (pipeline, _bus) = new_pipeline();
    let today = UniversalDate::today();

    pipeline.consume_login(UniversalUuid::new_v4(), "player-8", today.minus_days(2)).await;
    pipeline.consume_login(UniversalUuid::new_v4(), "player-8", today.minus_days(1)).await;
    pipeline.consume_login(UniversalUuid::new_v4(), "player-8", today).await;
    pipeline.consume_launch(UniversalUuid::new_v4(), "player-8", "game-a", UniversalTimestamp::now()).await;
    pipeline.consume_launch(UniversalUuid::new_v4(), "player-8", "game-b", UniversalTimestamp::now()).await;
    pipeline.consume_launch(UniversalUuid::new_v4(), "player-8", "game-c", UniversalTimestamp::now()).await;
    pipeline.consume_play(UniversalUuid::new_v4(), "player-8", "game-a", 400, UniversalTimestamp::now()).await;
    pipeline.consume_play(UniversalUuid::new_v4(), "player-8", "game-a", 400, UniversalTimestamp::now()).await;
    pipeline.consume_play(UniversalUuid::new_v4(), "player-8", "game-a", 400, UniversalTimestamp::now()).await;

    let before = pipeline.get_missions("player-8").await.expect("missions readable");
    assert_eq!(before.len(), 3);
    assert!(before.iter().all(|m| m.status == MissionStatus::Completed));

    let outcome = pipeline.consume_launch(UniversalUuid::new_v4(), "player-8", "game-d", UniversalTimestamp::now()).await;
    assert!(matches!(outcome, ConsumeOutcome::Processed(false)));

    let after = pipeline.get_missions("player-8").await.expect("missions readable");
    assert_eq!(after.len(), 3, "same-day follow-up activity must not spawn a duplicate cycle or reopen a completed one");
    assert!(after.iter().all(|m| m.status == MissionStatus::Completed));
}

/// A cycle whose most recent mission row has aged out of the 30-day window
/// (whether or not it completed) is abandoned: the next action starts a
/// genuinely new cycle dated today, with its own fresh mission set.
#[tokio::test]
async fn stale_cycle_outside_the_window_rolls_over_to_a_new_cycle() {
    use mission_pipeline::models::{Mission, MissionStatus as Status, MissionType};

    let store = Arc::new(InMemoryEventStore::new());
    let bus = Arc::new(InMemoryBusAdapter::new());
    let pipeline = Pipeline::new(store.clone(), bus, InMemoryKeyValueStore::new());

    let user_id = store.ensure_user("player-10").await.expect("user created");
    let stale_cycle_start = UniversalDate::today().minus_days(45);
    let now = UniversalTimestamp::now();
    for mission_type in MissionType::ALL {
        store
            .insert_mission_if_absent(Mission {
                id: UniversalUuid::new_v4(),
                user_id,
                mission_type,
                cycle_start: stale_cycle_start,
                status: Status::InProgress,
                progress_json: "{}".to_string(),
                completed_at: None,
                created_at: now,
                updated_at: now,
            })
            .await
            .expect("stale mission inserted");
    }

    pipeline.consume_launch(UniversalUuid::new_v4(), "player-10", "game-a", UniversalTimestamp::now()).await;

    let missions = pipeline.get_missions("player-10").await.expect("missions readable");
    assert_eq!(missions.len(), 6, "the stale cycle's rows remain, plus a fresh set for the new cycle");
    assert!(missions.iter().any(|m| m.cycle_start == stale_cycle_start));
    assert!(missions.iter().any(|m| m.cycle_start != stale_cycle_start));
}

/// Concurrent deliveries of the action that completes the final mission
/// must not double-complete it or double-grant the reward: the CAS update
/// ensures only one caller observes `affected == 1`.
#[tokio::test]
async fn concurrent_completion_attempts_grant_the_reward_exactly_once() {
    let (pipeline, bus) = new_pipeline();
    let pipeline = Arc::new(pipeline);
    let today = UniversalDate::today();

    pipeline.consume_login(UniversalUuid::new_v4(), "player-9", today.minus_days(2)).await;
    pipeline.consume_login(UniversalUuid::new_v4(), "player-9", today.minus_days(1)).await;
    pipeline.consume_launch(UniversalUuid::new_v4(), "player-9", "game-a", UniversalTimestamp::now()).await;
    pipeline.consume_launch(UniversalUuid::new_v4(), "player-9", "game-b", UniversalTimestamp::now()).await;
    pipeline.consume_launch(UniversalUuid::new_v4(), "player-9", "game-c", UniversalTimestamp::now()).await;
    pipeline.consume_play(UniversalUuid::new_v4(), "player-9", "game-a", 400, UniversalTimestamp::now()).await;
    pipeline.consume_play(UniversalUuid::new_v4(), "player-9", "game-a", 400, UniversalTimestamp::now()).await;
    pipeline.consume_play(UniversalUuid::new_v4(), "player-9", "game-a", 400, UniversalTimestamp::now()).await;

    // This login completes the LOGIN-3-CONSECUTIVE mission, which is the
    // user's last remaining one -- race several redundant deliveries of it.
    let mut handles = Vec::new();
    for _ in 0..8 {
        let pipeline = pipeline.clone();
        handles.push(tokio::spawn(async move {
            pipeline.consume_login(UniversalUuid::new_v4(), "player-9", today).await
        }));
    }
    let outcomes: Vec<_> = futures::future::join_all(handles).await.into_iter().map(|r| r.expect("task join")).collect();
    let completions = outcomes.iter().filter(|o| outcome_completed(o)).count();
    assert_eq!(completions, 1, "exactly one of the racing deliveries should observe the completion transition");

    // Even racing multiple deliveries of the mission-completed consumer
    // itself must not double-grant: the reward row's unique key is what
    // actually enforces "exactly once" here, not the dedup key alone.
    let published = bus.published_to(Topic::MissionCompleted);
    assert_eq!(published.len(), 1);
    let payload: MissionCompletedPayload = serde_json::from_slice(&published[0].payload).expect("payload decodes");
    let mut handles = Vec::new();
    for _ in 0..4 {
        let pipeline = pipeline.clone();
        let payload = payload.clone();
        handles.push(tokio::spawn(async move {
            pipeline.consume_mission_completed(payload.event_id, payload.user_id, payload.cycle_start).await
        }));
    }
    futures::future::join_all(handles).await.into_iter().for_each(|r| r.expect("task join"));

    let rewards = pipeline.get_rewards("player-9").await.expect("rewards readable");
    assert_eq!(rewards.len(), 1);
}
