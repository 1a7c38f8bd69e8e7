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

//! Layered configuration: a `mission-pipeline.toml` or `.yaml` file,
//! overridden by `MISSION_PIPELINE_*` environment variables, overridden in
//! turn by a `.env` file loaded through `dotenvy` for local development.
//! The file format is picked from the path's extension, the same way
//! `cloacina-ctl`'s config loader dispatches on `.toml` vs `.yaml`.

use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use crate::bus::BusAdapter;
use crate::error::{BusError, ConfigError};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database_url: String,
    pub max_pool_size: usize,
    pub bus_kind: BusKind,
    pub kafka_bootstrap_servers: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BusKind {
    Kafka,
    /// Publishes are accepted and logged but never sent anywhere; used by
    /// the CLI's `publish` subcommand against a throwaway pipeline and by
    /// deployments that only run the outbox sweeper.
    Noop,
}

impl Default for BusKind {
    fn default() -> Self {
        BusKind::Noop
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite://mission_pipeline.db".to_string(),
            max_pool_size: 10,
            bus_kind: BusKind::Noop,
            kafka_bootstrap_servers: "localhost:9092".to_string(),
        }
    }
}

impl Config {
    /// Loads `.env` (if present), then an optional TOML file, then applies
    /// `MISSION_PIPELINE_*` environment variable overrides, in that order
    /// of increasing precedence.
    pub fn load(toml_path: Option<&Path>) -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let mut config = match toml_path {
            Some(path) => Self::from_file(path)?,
            None => Config::default(),
        };
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Parses `path` as TOML or YAML depending on its extension; a path
    /// with no extension, or an extension other than those two, falls back
    /// to TOML.
    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::Parse { path: path.display().to_string(), source: e.to_string() }),
            _ => toml::from_str(&contents)
                .map_err(|e| ConfigError::Parse { path: path.display().to_string(), source: e.to_string() }),
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(url) = std::env::var("MISSION_PIPELINE_DATABASE_URL") {
            self.database_url = url;
        }
        if let Ok(size) = std::env::var("MISSION_PIPELINE_MAX_POOL_SIZE") {
            self.max_pool_size = size.parse().map_err(|_| ConfigError::InvalidSetting {
                field: "max_pool_size",
                reason: format!("{size} is not a valid pool size"),
            })?;
        }
        if let Ok(kind) = std::env::var("MISSION_PIPELINE_BUS_KIND") {
            self.bus_kind = match kind.to_lowercase().as_str() {
                "kafka" => BusKind::Kafka,
                "noop" => BusKind::Noop,
                other => {
                    return Err(ConfigError::InvalidSetting {
                        field: "bus_kind",
                        reason: format!("unknown bus kind {other}"),
                    })
                }
            };
        }
        if let Ok(servers) = std::env::var("MISSION_PIPELINE_KAFKA_BOOTSTRAP_SERVERS") {
            self.kafka_bootstrap_servers = servers;
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.database_url.is_empty() {
            return Err(ConfigError::MissingSetting("database_url"));
        }
        if self.max_pool_size == 0 {
            return Err(ConfigError::InvalidSetting { field: "max_pool_size", reason: "must be at least 1".to_string() });
        }
        Ok(())
    }

    /// Builds the `BusAdapter` named by `bus_kind`. The `kafka` feature
    /// must be compiled in for `BusKind::Kafka` to resolve.
    pub fn bus_adapter(&self) -> Result<Arc<dyn BusAdapter>, crate::error::PipelineError> {
        match self.bus_kind {
            #[cfg(feature = "kafka")]
            BusKind::Kafka => {
                let adapter = crate::bus::kafka::KafkaBusAdapter::new(&self.kafka_bootstrap_servers)?;
                Ok(Arc::new(adapter))
            }
            #[cfg(not(feature = "kafka"))]
            BusKind::Kafka => Err(BusError::NotConnected.into()),
            BusKind::Noop => Ok(Arc::new(NoopBusAdapter)),
        }
    }
}

struct NoopBusAdapter;

#[async_trait::async_trait]
impl BusAdapter for NoopBusAdapter {
    async fn publish(&self, topic: crate::bus::Topic, dedup_key: &str, _payload: &[u8]) -> Result<(), BusError> {
        tracing::debug!(topic = topic.as_str(), %dedup_key, "noop bus adapter dropped a publish");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_internally_valid() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn zero_pool_size_fails_validation() {
        let config = Config { max_pool_size: 0, ..Config::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn toml_and_yaml_files_with_the_same_settings_parse_identically() {
        let dir = tempfile::tempdir().unwrap();
        let toml_path = dir.path().join("mission-pipeline.toml");
        let yaml_path = dir.path().join("mission-pipeline.yaml");
        std::fs::write(&toml_path, "database_url = \"postgres://localhost/missions\"\nbus_kind = \"kafka\"\n").unwrap();
        std::fs::write(&yaml_path, "database_url: postgres://localhost/missions\nbus_kind: kafka\n").unwrap();

        let from_toml = Config::from_file(&toml_path).unwrap();
        let from_yaml = Config::from_file(&yaml_path).unwrap();
        assert_eq!(from_toml.database_url, from_yaml.database_url);
        assert_eq!(from_toml.bus_kind, from_yaml.bus_kind);
    }
}
