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

//! Runtime-selected database backend and connection pooling.
//!
//! `Database` wraps a `deadpool_diesel` pool for either Postgres or SQLite,
//! chosen at startup from a connection URL, and exposes a single
//! `interact` entry point so callers never match on the backend themselves.

use deadpool_diesel::{Manager, Pool};
use diesel::connection::SimpleConnection;
use diesel::MultiConnection;
use std::time::Duration;

use crate::error::DatabaseError;

/// A connection that dispatches to either Postgres or SQLite at the Diesel
/// query-builder level. Generated by `diesel::MultiConnection`; every model
/// and DAL method in this crate is written once against `AnyConnection` and
/// works unmodified on both backends.
#[derive(MultiConnection)]
pub enum AnyConnection {
    Postgresql(diesel::PgConnection),
    Sqlite(diesel::SqliteConnection),
}

/// Which backend a given connection URL resolved to. Only used for
/// diagnostics and for picking pragmas at pool-build time; query code never
/// matches on this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendType {
    Postgres,
    Sqlite,
}

impl BackendType {
    pub fn from_url(url: &str) -> Self {
        if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            BackendType::Postgres
        } else {
            BackendType::Sqlite
        }
    }
}

pub type AnyPool = Pool<Manager<AnyConnection>>;

/// Owns the connection pool and the backend it was built against.
#[derive(Clone)]
pub struct Database {
    pool: AnyPool,
    backend: BackendType,
}

impl Database {
    /// Builds a pool from a connection URL, inferring the backend from its
    /// scheme. SQLite URLs get `busy_timeout`/`foreign_keys` pragmas applied
    /// on every checkout since SQLite has no server-side connection pool of
    /// its own to configure once.
    pub async fn connect(database_url: &str, max_pool_size: usize) -> Result<Self, DatabaseError> {
        let backend = BackendType::from_url(database_url);
        let manager = Manager::new(database_url, deadpool_diesel::Runtime::Tokio1);
        let pool = Pool::builder(manager)
            .max_size(max_pool_size)
            .build()
            .map_err(|e| DatabaseError::PoolBuild(e.to_string()))?;

        let db = Self { pool, backend };
        if backend == BackendType::Sqlite {
            db.configure_sqlite().await?;
        }
        Ok(db)
    }

    pub fn backend(&self) -> BackendType {
        self.backend
    }

    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    async fn configure_sqlite(&self) -> Result<(), DatabaseError> {
        let conn = self
            .pool
            .get()
            .await
            .map_err(|e| DatabaseError::PoolGet(e.to_string()))?;
        conn.interact(|conn| {
            conn.batch_execute(
                "PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000; PRAGMA journal_mode = WAL;",
            )
        })
        .await
        .map_err(|e| DatabaseError::Interact(e.to_string()))?
        .map_err(|e| DatabaseError::Query(e.to_string()))?;
        Ok(())
    }

    /// Acquires a pooled connection and runs `f` against it on the blocking
    /// pool, mapping both the checkout and the interact-panic failure modes
    /// into `DatabaseError` so callers only ever handle one error type.
    pub async fn interact<F, T>(&self, f: F) -> Result<T, DatabaseError>
    where
        F: FnOnce(&mut AnyConnection) -> diesel::QueryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self
            .pool
            .get()
            .await
            .map_err(|e| DatabaseError::PoolGet(e.to_string()))?;
        conn.interact(f)
            .await
            .map_err(|e| DatabaseError::Interact(e.to_string()))?
            .map_err(|e| DatabaseError::Query(e.to_string()))
    }

    pub fn init_lock_ttl() -> Duration {
        Duration::from_secs(5)
    }
}
