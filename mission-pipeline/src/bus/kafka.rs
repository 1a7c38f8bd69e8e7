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

//! Production `BusAdapter` over `rdkafka`'s `FutureProducer`.

use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;
use std::time::Duration;

use super::{BusAdapter, Topic};
use crate::error::BusError;

pub struct KafkaBusAdapter {
    producer: FutureProducer,
}

impl KafkaBusAdapter {
    pub fn new(bootstrap_servers: &str) -> Result<Self, BusError> {
        let producer = ClientConfig::new()
            .set("bootstrap.servers", bootstrap_servers)
            .set("message.timeout.ms", "5000")
            .create()
            .map_err(|e| BusError::Publish {
                topic: "<producer-init>".to_string(),
                source: e.to_string(),
            })?;
        Ok(Self { producer })
    }
}

#[async_trait]
impl BusAdapter for KafkaBusAdapter {
    async fn publish(&self, topic: Topic, dedup_key: &str, payload: &[u8]) -> Result<(), BusError> {
        let record = FutureRecord::to(topic.as_str()).key(dedup_key).payload(payload);
        self.producer
            .send(record, Timeout::After(Duration::from_secs(5)))
            .await
            .map_err(|(e, _)| BusError::Publish {
                topic: topic.as_str().to_string(),
                source: e.to_string(),
            })?;
        Ok(())
    }
}
