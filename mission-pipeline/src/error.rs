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

//! Error taxonomy shared across the pipeline.
//!
//! Every fallible boundary returns one of the enums below rather than a
//! boxed `dyn Error`, so callers can match on `is_transient()` to decide
//! between a retry and a dead-letter/ack-and-log outcome.

use thiserror::Error;

/// Errors from the connection pool / Diesel layer.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("failed to build connection pool: {0}")]
    PoolBuild(String),

    #[error("failed to check out a connection: {0}")]
    PoolGet(String),

    #[error("connection interact task panicked: {0}")]
    Interact(String),

    #[error("query failed: {0}")]
    Query(String),

    /// A data invariant the schema is supposed to guarantee didn't hold --
    /// e.g. a reward grant's points update affected zero user rows. See
    /// `EventStore::grant_reward_if_absent`.
    #[error("invariant violated: {0}")]
    Invariant(String),
}

impl DatabaseError {
    /// Pool exhaustion and interact panics are worth retrying; a malformed
    /// query is not going to succeed on a second attempt. An invariant
    /// violation is retried too (§7): it signals the database has drifted
    /// from a state the rest of the pipeline assumes, which a concurrent
    /// writer may since have corrected.
    pub fn is_transient(&self) -> bool {
        matches!(self, DatabaseError::PoolGet(_) | DatabaseError::Interact(_) | DatabaseError::Invariant(_))
    }
}

/// Errors surfaced by the `BusAdapter` trait.
#[derive(Debug, Error)]
pub enum BusError {
    #[error("failed to publish to topic {topic}: {source}")]
    Publish { topic: String, source: String },

    #[error("bus producer is not connected")]
    NotConnected,
}

/// Errors surfaced while acquiring or releasing the mission-init lock.
#[derive(Debug, Error)]
pub enum LockError {
    #[error("lock {key} is held by another worker")]
    Contended { key: String },

    #[error("timed out waiting for lock {key} after {waited_ms}ms")]
    Timeout { key: String, waited_ms: u64 },

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl LockError {
    /// §9 Design Note: lock-timeout is always retryable, never a fatal
    /// outcome for the consumer that hit it.
    pub fn is_transient(&self) -> bool {
        match self {
            LockError::Contended { .. } | LockError::Timeout { .. } => true,
            LockError::Database(e) => e.is_transient(),
        }
    }
}

/// Validation failures for malformed or out-of-range event payloads.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("unknown user {0}")]
    UnknownUser(String),

    #[error("unknown game {0}")]
    UnknownGame(String),

    #[error("score {0} is outside the permitted range")]
    ScoreOutOfRange(i32),

    #[error("event payload missing required field: {0}")]
    MissingField(&'static str),
}

/// Top-level error returned by every pipeline operation above the DAL.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Lock(#[from] LockError),

    #[error(transparent)]
    Bus(#[from] BusError),

    #[error("invariant violated: {0}")]
    InvariantViolation(String),
}

impl PipelineError {
    /// Mirrors the executor's transient/fatal split: anything rooted in a
    /// pool hiccup, lock contention, or a bus outage is worth retrying;
    /// malformed input and invariant violations are not.
    pub fn is_transient(&self) -> bool {
        match self {
            PipelineError::Database(e) => e.is_transient(),
            PipelineError::Lock(e) => e.is_transient(),
            PipelineError::Bus(_) => true,
            PipelineError::Validation(_) => false,
            PipelineError::InvariantViolation(_) => true,
        }
    }
}

/// Configuration loading/validation errors, mirroring the CLI crate's own
/// config error taxonomy.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read { path: String, source: std::io::Error },

    #[error("failed to parse config file {path}: {source}")]
    Parse { path: String, source: String },

    #[error("missing required setting: {0}")]
    MissingSetting(&'static str),

    #[error("invalid setting {field}: {reason}")]
    InvalidSetting { field: &'static str, reason: String },
}
