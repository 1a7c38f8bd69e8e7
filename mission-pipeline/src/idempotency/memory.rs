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

//! In-process TTL key/value store. The default `KeyValueStore` and what
//! every test fixture uses; a single process is the whole blast radius, so
//! expired entries are pruned lazily on access rather than by a background
//! sweep.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

use super::KeyValueStore;
use crate::error::DatabaseError;

pub struct InMemoryKeyValueStore {
    entries: Mutex<HashMap<String, Instant>>,
}

impl InMemoryKeyValueStore {
    pub fn new() -> Self {
        Self { entries: Mutex::new(HashMap::new()) }
    }

    fn prune(entries: &mut HashMap<String, Instant>) {
        let now = Instant::now();
        entries.retain(|_, expires_at| *expires_at > now);
    }
}

impl Default for InMemoryKeyValueStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueStore for InMemoryKeyValueStore {
    async fn set_if_absent(&self, key: &str, ttl: Duration) -> Result<bool, DatabaseError> {
        let mut entries = self.entries.lock();
        Self::prune(&mut entries);
        if entries.contains_key(key) {
            return Ok(false);
        }
        entries.insert(key.to_string(), Instant::now() + ttl);
        Ok(true)
    }

    async fn remove(&self, key: &str) -> Result<(), DatabaseError> {
        self.entries.lock().remove(key);
        Ok(())
    }

    async fn contains(&self, key: &str) -> Result<bool, DatabaseError> {
        let mut entries = self.entries.lock();
        Self::prune(&mut entries);
        Ok(entries.contains_key(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn second_set_if_absent_fails_until_expiry() {
        let store = InMemoryKeyValueStore::new();
        assert!(store.set_if_absent("k", Duration::from_millis(20)).await.unwrap());
        assert!(!store.set_if_absent("k", Duration::from_millis(20)).await.unwrap());
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(store.set_if_absent("k", Duration::from_millis(20)).await.unwrap());
    }

    #[tokio::test]
    async fn remove_releases_the_key_immediately() {
        let store = InMemoryKeyValueStore::new();
        store.set_if_absent("k", Duration::from_secs(5)).await.unwrap();
        store.remove("k").await.unwrap();
        assert!(!store.contains("k").await.unwrap());
    }
}
