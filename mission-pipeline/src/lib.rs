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

//! Asynchronous mission-progression pipeline.
//!
//! Three 30-day missions per user, advanced by login/launch/play events
//! consumed off a message bus, completed through a compare-and-swap
//! transition, and rewarded exactly once per cycle. See each module for
//! the component it implements; [`Pipeline`] wires them into the facade the
//! HTTP layer and the CLI both sit on top of.

pub mod bus;
pub mod config;
pub mod dal;
pub mod database;
pub mod error;
pub mod idempotency;
pub mod mission;
pub mod models;
pub mod outbox;
pub mod retry;
pub mod reward;
pub mod router;

use std::sync::Arc;

use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

use crate::bus::BusAdapter;
use crate::config::Config;
use crate::dal::{DieselEventStore, EventStore};
use crate::database::{BackendType, Database};
use crate::database::universal_types::UniversalUuid;
use crate::error::{PipelineError, ValidationError};
use crate::idempotency::{IdempotencyKeeper, InMemoryKeyValueStore, KeyValueStore};
use crate::mission::{CompletionEngine, MissionEvaluator, MissionInitializer};
use crate::models::Mission;
use crate::models::Reward;
use crate::outbox::Outbox;
use crate::reward::RewardDistributor;
use crate::router::{ConsumeOutcome, Router};

pub const POSTGRES_MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations/postgres");
pub const SQLITE_MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations/sqlite");

/// Runs the embedded migrations for whichever backend `db` is connected to.
/// Exposed as a free function (rather than tucked inside `Pipeline::boot`)
/// so the CLI's `migrate` subcommand can run it without constructing the
/// rest of the pipeline.
pub async fn run_migrations(db: &Database) -> Result<(), crate::error::DatabaseError> {
    let backend = db.backend();
    db.interact(move |conn| {
        let migrations = match backend {
            BackendType::Postgres => &POSTGRES_MIGRATIONS,
            BackendType::Sqlite => &SQLITE_MIGRATIONS,
        };
        conn.run_pending_migrations(migrations)
            .map(|_| ())
            .map_err(|e| diesel::result::Error::QueryBuilderError(e.to_string().into()))
    })
    .await
}

/// The facade every external collaborator (HTTP layer, CLI) composes
/// against: fire-and-forget ingress publishers plus the read-only query
/// paths, all backed by a `KeyValueStore` of type `S` (defaults to the
/// in-memory store everywhere except a multi-process deployment, which
/// picks `RedisKeyValueStore` instead).
pub struct Pipeline<S: KeyValueStore = InMemoryKeyValueStore> {
    store: Arc<dyn EventStore>,
    bus: Arc<dyn BusAdapter>,
    outbox: Arc<Outbox>,
    router: Router<S>,
}

impl<S: KeyValueStore + 'static> Pipeline<S> {
    /// Assembles the full dependency graph from already-constructed
    /// capabilities. Kept separate from any one backend's constructor so
    /// tests can swap in in-memory fakes for `store`/`bus`/`kv_store`.
    pub fn new(store: Arc<dyn EventStore>, bus: Arc<dyn BusAdapter>, kv_store: S) -> Self {
        let keeper = Arc::new(IdempotencyKeeper::new(kv_store));
        let outbox = Arc::new(Outbox::new(store.clone(), bus.clone()));
        let initializer = Arc::new(MissionInitializer::new(store.clone(), keeper.clone()));
        let evaluator = Arc::new(MissionEvaluator::new(store.clone()));
        let rewards = Arc::new(RewardDistributor::new(store.clone()));
        let completion = Arc::new(CompletionEngine::new(store.clone(), bus.clone(), outbox.clone()));
        let router = Router::new(store.clone(), keeper, initializer, evaluator, completion, rewards);
        Self { store, bus, outbox, router }
    }

    pub fn outbox(&self) -> &Arc<Outbox> {
        &self.outbox
    }

    pub fn router(&self) -> &Router<S> {
        &self.router
    }

    pub async fn user_exists(&self, external_ref: &str) -> Result<bool, PipelineError> {
        let user_id = self.store.ensure_user(external_ref).await?;
        Ok(self.store.user_exists(user_id).await?)
    }

    pub async fn game_exists(&self, external_ref: &str) -> Result<bool, PipelineError> {
        let game_id = self.store.ensure_game(external_ref).await?;
        Ok(self.store.game_exists(game_id).await?)
    }

    /// Publishes the `user.login` event. Fire-and-forget from the HTTP
    /// layer's perspective (§6): this resolves the internal user id, emits
    /// onto the bus, and the ingress consumer does the rest.
    pub async fn publish_login(
        &self,
        user_external_ref: &str,
        login_date: crate::database::universal_types::UniversalDate,
    ) -> Result<(), PipelineError> {
        self.store.ensure_user(user_external_ref).await?;
        let event_id = UniversalUuid::new_v4();
        let payload = crate::bus::UserLoginPayload {
            event_id,
            user_external_ref: user_external_ref.to_string(),
            login_date,
            occurred_at: crate::database::universal_types::UniversalTimestamp::now(),
        };
        self.publish_ingress(crate::bus::Topic::UserLogin, event_id, &payload).await
    }

    pub async fn publish_launch(&self, user_external_ref: &str, game_external_ref: &str) -> Result<(), PipelineError> {
        let event_id = UniversalUuid::new_v4();
        let payload = crate::bus::GameLaunchedPayload {
            event_id,
            user_external_ref: user_external_ref.to_string(),
            game_external_ref: game_external_ref.to_string(),
            occurred_at: crate::database::universal_types::UniversalTimestamp::now(),
        };
        self.publish_ingress(crate::bus::Topic::GameLaunched, event_id, &payload).await
    }

    /// Publishes the `play_session.completed` event with a server-generated
    /// score in `[0, 1000]` (§9 Open Question: the narrower `[350, 500]`
    /// range some sources use is a test aid only, never production).
    pub async fn publish_play(
        &self,
        user_external_ref: &str,
        game_external_ref: &str,
        score: i32,
    ) -> Result<UniversalUuid, PipelineError> {
        if !(0..=1000).contains(&score) {
            return Err(ValidationError::ScoreOutOfRange(score).into());
        }
        let session_id = UniversalUuid::new_v4();
        let payload = crate::bus::PlaySessionCompletedPayload {
            event_id: session_id,
            user_external_ref: user_external_ref.to_string(),
            game_external_ref: game_external_ref.to_string(),
            session_id,
            score,
            occurred_at: crate::database::universal_types::UniversalTimestamp::now(),
        };
        self.publish_ingress(crate::bus::Topic::PlaySessionCompleted, session_id, &payload).await?;
        Ok(session_id)
    }

    async fn publish_ingress<P: serde::Serialize>(
        &self,
        topic: crate::bus::Topic,
        event_id: UniversalUuid,
        payload: &P,
    ) -> Result<(), PipelineError> {
        let payload_json = serde_json::to_vec(payload).expect("serializable");
        let dedup_key = event_id.to_string();
        if let Err(e) = self.bus.publish(topic, &dedup_key, &payload_json).await {
            self.outbox
                .park(topic, &dedup_key, String::from_utf8(payload_json).expect("json is utf8"))
                .await?;
            return Err(crate::error::BusError::Publish { topic: topic.as_str().to_string(), source: e.to_string() }.into());
        }
        Ok(())
    }

    pub async fn get_missions(&self, external_ref: &str) -> Result<Vec<Mission>, PipelineError> {
        let user_id = self.store.ensure_user(external_ref).await?;
        Ok(self.store.list_missions_for_user(user_id).await?)
    }

    pub async fn get_rewards(&self, external_ref: &str) -> Result<Vec<Reward>, PipelineError> {
        let user_id = self.store.ensure_user(external_ref).await?;
        Ok(self.store.list_rewards_for_user(user_id).await?)
    }

    /// Runs the login ingress consumer for one received message.
    pub async fn consume_login(
        &self,
        event_id: UniversalUuid,
        user_external_ref: &str,
        login_date: crate::database::universal_types::UniversalDate,
    ) -> ConsumeOutcome {
        let user_id = match self.store.ensure_user(user_external_ref).await {
            Ok(id) => id,
            Err(e) => return ConsumeOutcome::Retry(e.into()),
        };
        let store = self.store.clone();
        self.router
            .route_ingress_event(
                "login",
                event_id,
                user_id,
                crate::models::MissionType::LoginThreeConsecutive,
                || async move { store.record_login_day(user_id, login_date).await.map(|_| ()).map_err(PipelineError::from) },
            )
            .await
    }

    /// Runs the game-launch ingress consumer for one received message.
    pub async fn consume_launch(
        &self,
        event_id: UniversalUuid,
        user_external_ref: &str,
        game_external_ref: &str,
        launched_at: crate::database::universal_types::UniversalTimestamp,
    ) -> ConsumeOutcome {
        let user_id = match self.store.ensure_user(user_external_ref).await {
            Ok(id) => id,
            Err(e) => return ConsumeOutcome::Retry(e.into()),
        };
        let game_id = match self.store.ensure_game(game_external_ref).await {
            Ok(id) => id,
            Err(e) => return ConsumeOutcome::Retry(e.into()),
        };
        let store = self.store.clone();
        self.router
            .route_ingress_event(
                "game-launch",
                event_id,
                user_id,
                crate::models::MissionType::LaunchThreeDistinct,
                || async move {
                    store.record_game_launch(user_id, game_id, launched_at).await.map(|_| ()).map_err(PipelineError::from)
                },
            )
            .await
    }

    /// Runs the play-session ingress consumer for one received message.
    pub async fn consume_play(
        &self,
        event_id: UniversalUuid,
        user_external_ref: &str,
        game_external_ref: &str,
        score: i32,
        played_at: crate::database::universal_types::UniversalTimestamp,
    ) -> ConsumeOutcome {
        if !(0..=1000).contains(&score) {
            return ConsumeOutcome::Fatal(ValidationError::ScoreOutOfRange(score).into());
        }
        let user_id = match self.store.ensure_user(user_external_ref).await {
            Ok(id) => id,
            Err(e) => return ConsumeOutcome::Retry(e.into()),
        };
        let game_id = match self.store.ensure_game(game_external_ref).await {
            Ok(id) => id,
            Err(e) => return ConsumeOutcome::Retry(e.into()),
        };
        let store = self.store.clone();
        self.router
            .route_ingress_event(
                "game-play",
                event_id,
                user_id,
                crate::models::MissionType::PlayThreeSessionsScoreOver1000,
                || async move {
                    store
                        .record_play_session(user_id, game_id, event_id, score, played_at)
                        .await
                        .map(|_| ())
                        .map_err(PipelineError::from)
                },
            )
            .await
    }

    /// Runs the mission-completed egress consumer for one received message.
    pub async fn consume_mission_completed(
        &self,
        event_id: UniversalUuid,
        user_id: UniversalUuid,
        cycle_start: crate::database::universal_types::UniversalDate,
    ) {
        self.router.route_mission_completed(event_id, user_id, cycle_start).await
    }
}

impl Pipeline<InMemoryKeyValueStore> {
    /// Convenience constructor wiring the Diesel-backed `EventStore` and
    /// the in-memory `KeyValueStore` -- the common single-process
    /// deployment shape.
    pub async fn boot(config: &Config) -> Result<Self, PipelineError> {
        let db = Database::connect(&config.database_url, config.max_pool_size).await?;
        run_migrations(&db).await?;
        let store: Arc<dyn EventStore> = Arc::new(DieselEventStore::new(db));
        let bus: Arc<dyn BusAdapter> = config.bus_adapter()?;
        Ok(Self::new(store, bus, InMemoryKeyValueStore::new()))
    }
}
