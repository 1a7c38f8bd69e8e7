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

//! Redis-backed `KeyValueStore` for multi-process deployments, where the
//! in-memory store's per-process view would let two workers both believe
//! they hold the mission-init lock.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::time::Duration;

use super::KeyValueStore;
use crate::error::DatabaseError;

pub struct RedisKeyValueStore {
    conn: ConnectionManager,
}

impl RedisKeyValueStore {
    pub async fn connect(redis_url: &str) -> Result<Self, DatabaseError> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| DatabaseError::PoolBuild(e.to_string()))?;
        let conn = client
            .get_connection_manager()
            .await
            .map_err(|e| DatabaseError::PoolGet(e.to_string()))?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl KeyValueStore for RedisKeyValueStore {
    async fn set_if_absent(&self, key: &str, ttl: Duration) -> Result<bool, DatabaseError> {
        let mut conn = self.conn.clone();
        let set: bool = redis::cmd("SET")
            .arg(key)
            .arg(1)
            .arg("NX")
            .arg("PX")
            .arg(ttl.as_millis() as u64)
            .query_async(&mut conn)
            .await
            .map(|v: Option<String>| v.is_some())
            .map_err(|e| DatabaseError::Query(e.to_string()))?;
        Ok(set)
    }

    async fn remove(&self, key: &str) -> Result<(), DatabaseError> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(key).await.map_err(|e| DatabaseError::Query(e.to_string()))?;
        Ok(())
    }

    async fn contains(&self, key: &str) -> Result<bool, DatabaseError> {
        let mut conn = self.conn.clone();
        let exists: bool = conn.exists(key).await.map_err(|e| DatabaseError::Query(e.to_string()))?;
        Ok(exists)
    }
}
