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

//! The Event Router (C9): three ingress consumers (login / launch / play)
//! and one egress consumer (mission-completed -> reward), all built on a
//! single higher-order routine so the dedup-then-init-then-record-then-check
//! sequence is written once.

use std::future::Future;
use std::sync::Arc;

use crate::dal::EventStore;
use crate::database::universal_types::{UniversalDate, UniversalUuid};
use crate::error::PipelineError;
use crate::idempotency::{IdempotencyKeeper, KeyValueStore};
use crate::mission::{CompletionEngine, MissionEvaluator, MissionInitializer};
use crate::models::MissionType;
use crate::reward::RewardDistributor;

/// Outcome of routing a single ingress message, mapped to an ack/nack by
/// whatever bus consumer loop calls `route_ingress_event`.
#[derive(Debug)]
pub enum ConsumeOutcome {
    /// Dedup key was already set; the caller should ack without redoing
    /// any work.
    Duplicate,
    /// The event was processed; `true` means the mission it advances
    /// completed on this call.
    Processed(bool),
    /// A transient failure -- the dedup key has already been released so
    /// redelivery re-attempts processing from scratch.
    Retry(PipelineError),
    /// A non-retryable failure. Still acked per spec.md's error design;
    /// logged for operator visibility.
    Fatal(PipelineError),
}

/// Everything `route_ingress_event` needs, bundled so the three ingress
/// consumers and the CLI/testing crates share one construction path.
pub struct Router<S: KeyValueStore> {
    store: Arc<dyn EventStore>,
    keeper: Arc<IdempotencyKeeper<S>>,
    initializer: Arc<MissionInitializer<S>>,
    evaluator: Arc<MissionEvaluator>,
    completion: Arc<CompletionEngine>,
    rewards: Arc<RewardDistributor>,
}

impl<S: KeyValueStore> Router<S> {
    pub fn new(
        store: Arc<dyn EventStore>,
        keeper: Arc<IdempotencyKeeper<S>>,
        initializer: Arc<MissionInitializer<S>>,
        evaluator: Arc<MissionEvaluator>,
        completion: Arc<CompletionEngine>,
        rewards: Arc<RewardDistributor>,
    ) -> Self {
        Self { store, keeper, initializer, evaluator, completion, rewards }
    }

    /// The shared ingress routine (§9 Design Note 3): dedup-check, ensure
    /// the user's missions exist, persist the action via `record_action`,
    /// then evaluate and attempt completion on `mission_type`. Every
    /// ingress consumer (login, launch, play) calls this with a different
    /// `dedup_prefix`, `record_action`, and `mission_type`.
    pub async fn route_ingress_event<F, Fut>(
        &self,
        dedup_prefix: &str,
        event_id: UniversalUuid,
        user_id: UniversalUuid,
        mission_type: MissionType,
        record_action: F,
    ) -> ConsumeOutcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(), PipelineError>>,
    {
        let dedup_key = format!("processed:{dedup_prefix}:{event_id}");
        let fresh = match self.keeper.mark_processed(&dedup_key).await {
            Ok(fresh) => fresh,
            Err(e) => return ConsumeOutcome::Retry(e.into()),
        };
        if !fresh {
            return ConsumeOutcome::Duplicate;
        }

        let cycle_start = match self.resolve_and_ensure_missions(user_id).await {
            Ok(cycle_start) => cycle_start,
            Err(e) => {
                self.release_on_failure(&dedup_key).await;
                return ConsumeOutcome::Retry(e);
            }
        };

        if let Err(e) = record_action().await {
            self.release_on_failure(&dedup_key).await;
            return if e.is_transient() { ConsumeOutcome::Retry(e) } else { ConsumeOutcome::Fatal(e) };
        }

        match self.check_and_complete(user_id, mission_type, cycle_start).await {
            Ok(completed) => ConsumeOutcome::Processed(completed),
            Err(e) if e.is_transient() => {
                self.release_on_failure(&dedup_key).await;
                ConsumeOutcome::Retry(e)
            }
            Err(e) => ConsumeOutcome::Fatal(e),
        }
    }

    /// The mission-completed consumer (§4.9): dedup, hand off to the
    /// Reward Distributor, always ack. Errors are logged rather than
    /// propagated -- the next completing mission or a future action
    /// re-triggers the `all_missions_completed` check, and the Reward
    /// row's unique key prevents a double grant.
    pub async fn route_mission_completed(&self, event_id: UniversalUuid, user_id: UniversalUuid, cycle_start: UniversalDate) {
        let dedup_key = format!("processed:mission-completed:{event_id}");
        match self.keeper.mark_processed(&dedup_key).await {
            Ok(false) => return,
            Ok(true) => {}
            Err(e) => {
                tracing::error!(error = %e, %event_id, "mission-completed dedup check failed");
                return;
            }
        }
        if let Err(e) = self.rewards.on_mission_completed(user_id, cycle_start).await {
            tracing::error!(error = %e, %user_id, %cycle_start, "reward distribution failed");
        }
    }

    async fn release_on_failure(&self, dedup_key: &str) {
        if let Err(e) = self.keeper.unlock(dedup_key).await {
            tracing::error!(error = %e, %dedup_key, "failed to release dedup key after a failed attempt");
        }
    }

    /// Resolves which `cycle_start` is active for `user_id` and ensures
    /// the three missions exist for it (§4.5). A user has at most one
    /// active cycle: the most recent mission row's `cycle_start` if it
    /// falls within the last 30 days and is not fully completed; a fresh
    /// cycle starting today otherwise.
    async fn resolve_and_ensure_missions(&self, user_id: UniversalUuid) -> Result<UniversalDate, PipelineError> {
        let cycle_start = self.active_cycle_start(user_id).await?;
        self.initializer.ensure_missions(user_id, cycle_start).await?;
        Ok(cycle_start)
    }

    async fn active_cycle_start(&self, user_id: UniversalUuid) -> Result<UniversalDate, PipelineError> {
        let today = UniversalDate::today();
        let window_start = today.minus_days(crate::mission::CYCLE_LENGTH_DAYS);

        let latest = self.store.latest_cycle_start(user_id).await?;
        match latest {
            Some(cycle_start) if cycle_start >= window_start => {
                if self.store.all_missions_completed(user_id, cycle_start).await? {
                    Ok(today)
                } else {
                    Ok(cycle_start)
                }
            }
            _ => Ok(today),
        }
    }

    /// `check-and-complete` (§4.7): loads the mission, evaluates its
    /// predicate against the Event Store, and -- on completion -- applies
    /// the CAS transition through the Completion Engine.
    async fn check_and_complete(
        &self,
        user_id: UniversalUuid,
        mission_type: MissionType,
        cycle_start: UniversalDate,
    ) -> Result<bool, PipelineError> {
        let Some(mission) = self.store.get_mission(user_id, mission_type, cycle_start).await? else {
            return Ok(false);
        };
        if mission.is_completed() {
            return Ok(false);
        }

        let as_of = UniversalDate::today();
        let window_start = as_of.minus_days(crate::mission::CYCLE_LENGTH_DAYS);
        let (complete, progress_json) = self.evaluator.evaluate(user_id, mission_type, window_start, as_of).await?;
        self.completion.apply_progress(&mission, progress_json, complete).await
    }
}
