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

//! The Idempotency Keeper (C2): dedup-key marking and the mission-init
//! advisory lock, both backed by a `KeyValueStore` capability.

pub mod memory;
#[cfg(feature = "redis")]
pub mod redis_store;

use async_trait::async_trait;
use std::time::Duration;

use crate::error::{DatabaseError, LockError};

/// Minimal key/value capability the Idempotency Keeper is built on: set a
/// key with a TTL only if absent, and release a key early.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Sets `key` with `ttl` only if it does not already exist. Returns
    /// `true` if this call set it, `false` if it was already present.
    async fn set_if_absent(&self, key: &str, ttl: Duration) -> Result<bool, DatabaseError>;

    /// Removes `key` unconditionally.
    async fn remove(&self, key: &str) -> Result<(), DatabaseError>;

    /// Returns whether `key` is currently present and unexpired.
    async fn contains(&self, key: &str) -> Result<bool, DatabaseError>;
}

pub use memory::InMemoryKeyValueStore;
#[cfg(feature = "redis")]
pub use redis_store::RedisKeyValueStore;

const PROCESSED_KEY_TTL: Duration = Duration::from_secs(24 * 60 * 60);
const INIT_LOCK_TTL: Duration = Duration::from_secs(10);

/// Dedup-key + init-lock operations layered over a `KeyValueStore`. Every
/// consumer entry point calls `mark_processed` before doing any work, and
/// the Mission Initializer calls `try_lock`/`unlock` around `ensure_missions`.
pub struct IdempotencyKeeper<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> IdempotencyKeeper<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns `true` if this event has not been seen before (and marks it
    /// seen), `false` if it is a duplicate delivery.
    pub async fn mark_processed(&self, dedup_key: &str) -> Result<bool, DatabaseError> {
        self.store.set_if_absent(dedup_key, PROCESSED_KEY_TTL).await
    }

    /// Attempts to acquire the per-user mission-init lock, returning
    /// `Ok(true)` if acquired and `Ok(false)` if already held by someone
    /// else -- callers poll on `false` rather than treating it as an error.
    pub async fn try_lock(&self, lock_key: &str) -> Result<bool, DatabaseError> {
        self.store.set_if_absent(lock_key, INIT_LOCK_TTL).await
    }

    pub async fn unlock(&self, lock_key: &str) -> Result<(), DatabaseError> {
        self.store.remove(lock_key).await
    }

    /// Polls `try_lock` until it succeeds or `max_wait` elapses, sleeping
    /// `poll_interval` between attempts. Surfaces `LockError::Timeout` on
    /// exhaustion -- always transient, per the resolved lock-timeout
    /// Open Question.
    pub async fn acquire_with_wait(
        &self,
        lock_key: &str,
        max_wait: Duration,
        poll_interval: Duration,
    ) -> Result<LockGuard<'_, S>, LockError> {
        let start = tokio::time::Instant::now();
        loop {
            if self.try_lock(lock_key).await? {
                return Ok(LockGuard { keeper: self, lock_key: lock_key.to_string() });
            }
            if start.elapsed() >= max_wait {
                return Err(LockError::Timeout {
                    key: lock_key.to_string(),
                    waited_ms: start.elapsed().as_millis() as u64,
                });
            }
            tokio::time::sleep(poll_interval).await;
        }
    }
}

/// RAII guard releasing the init lock on drop via a detached task, since
/// `Drop` cannot be async. Callers that want to observe the unlock result
/// should call `release` explicitly instead of relying on drop.
pub struct LockGuard<'a, S: KeyValueStore> {
    keeper: &'a IdempotencyKeeper<S>,
    lock_key: String,
}

impl<'a, S: KeyValueStore> LockGuard<'a, S> {
    pub async fn release(self) -> Result<(), DatabaseError> {
        self.keeper.unlock(&self.lock_key).await
    }
}

pub fn mission_init_lock_key(user_id: crate::database::universal_types::UniversalUuid) -> String {
    format!("mission-init-lock:{user_id}")
}
