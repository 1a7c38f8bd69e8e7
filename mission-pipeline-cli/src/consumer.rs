// Bus consumer loop: subscribes to the three ingress topics plus
// mission-completed and dispatches each message to the matching
// `Pipeline::consume_*` entry point. Offsets are committed only for
// non-retryable outcomes, so a crash or a `ConsumeOutcome::Retry` leaves
// the message uncommitted for redelivery -- the pipeline's own dedup key
// is what makes that redelivery safe to reprocess.

use std::sync::Arc;

use mission_pipeline::config::Config;
use mission_pipeline::idempotency::InMemoryKeyValueStore;
use mission_pipeline::Pipeline;

#[cfg(feature = "kafka")]
pub async fn run(config: &Config, pipeline: Arc<Pipeline<InMemoryKeyValueStore>>) -> anyhow::Result<()> {
    use futures::StreamExt;
    use rdkafka::config::ClientConfig;
    use rdkafka::consumer::{CommitMode, Consumer, StreamConsumer};
    use rdkafka::Message;
    use serde::Deserialize;

    use mission_pipeline::bus::Topic;

    let consumer: StreamConsumer = ClientConfig::new()
        .set("group.id", "mission-pipeline")
        .set("bootstrap.servers", &config.kafka_bootstrap_servers)
        .set("enable.auto.commit", "false")
        .create()?;
    consumer.subscribe(&[
        Topic::UserLogin.as_str(),
        Topic::GameLaunched.as_str(),
        Topic::PlaySessionCompleted.as_str(),
        Topic::MissionCompleted.as_str(),
    ])?;

    #[derive(Deserialize)]
    struct LoginBody {
        event_id: uuid::Uuid,
        user_external_ref: String,
        login_date: chrono::NaiveDate,
    }
    #[derive(Deserialize)]
    struct LaunchBody {
        event_id: uuid::Uuid,
        user_external_ref: String,
        game_external_ref: String,
        occurred_at: chrono::DateTime<chrono::Utc>,
    }
    #[derive(Deserialize)]
    struct PlayBody {
        event_id: uuid::Uuid,
        user_external_ref: String,
        game_external_ref: String,
        score: i32,
        occurred_at: chrono::DateTime<chrono::Utc>,
    }
    #[derive(Deserialize)]
    struct MissionCompletedBody {
        event_id: uuid::Uuid,
        user_id: uuid::Uuid,
        cycle_start: chrono::NaiveDate,
    }

    let mut stream = consumer.stream();
    while let Some(received) = stream.next().await {
        let msg = match received {
            Ok(msg) => msg,
            Err(e) => {
                tracing::error!(error = %e, "kafka receive failed");
                continue;
            }
        };
        let topic = msg.topic().to_string();
        let payload = msg.payload().unwrap_or_default();

        let should_commit = match topic.as_str() {
            topic if topic == Topic::UserLogin.as_str() => match serde_json::from_slice::<LoginBody>(payload) {
                Ok(body) => {
                    let outcome = pipeline
                        .consume_login(body.event_id.into(), &body.user_external_ref, body.login_date.into())
                        .await;
                    !matches!(outcome, mission_pipeline::router::ConsumeOutcome::Retry(_))
                }
                Err(e) => {
                    tracing::error!(error = %e, "malformed mission-login-event payload");
                    true
                }
            },
            topic if topic == Topic::GameLaunched.as_str() => match serde_json::from_slice::<LaunchBody>(payload) {
                Ok(body) => {
                    let outcome = pipeline
                        .consume_launch(body.event_id.into(), &body.user_external_ref, &body.game_external_ref, body.occurred_at.into())
                        .await;
                    !matches!(outcome, mission_pipeline::router::ConsumeOutcome::Retry(_))
                }
                Err(e) => {
                    tracing::error!(error = %e, "malformed mission-game-launch-event payload");
                    true
                }
            },
            topic if topic == Topic::PlaySessionCompleted.as_str() => match serde_json::from_slice::<PlayBody>(payload) {
                Ok(body) => {
                    let outcome = pipeline
                        .consume_play(body.event_id.into(), &body.user_external_ref, &body.game_external_ref, body.score, body.occurred_at.into())
                        .await;
                    !matches!(outcome, mission_pipeline::router::ConsumeOutcome::Retry(_))
                }
                Err(e) => {
                    tracing::error!(error = %e, "malformed mission-game-play-event payload");
                    true
                }
            },
            topic if topic == Topic::MissionCompleted.as_str() => match serde_json::from_slice::<MissionCompletedBody>(payload) {
                Ok(body) => {
                    pipeline.consume_mission_completed(body.event_id.into(), body.user_id.into(), body.cycle_start.into()).await;
                    true
                }
                Err(e) => {
                    tracing::error!(error = %e, "malformed mission-completed-event payload");
                    true
                }
            },
            other => {
                tracing::warn!(topic = other, "received message on unexpected topic");
                true
            }
        };

        if should_commit {
            if let Err(e) = consumer.commit_message(&msg, CommitMode::Async) {
                tracing::error!(error = %e, "failed to commit offset");
            }
        }
    }

    Ok(())
}

#[cfg(not(feature = "kafka"))]
pub async fn run(_config: &Config, _pipeline: Arc<Pipeline<InMemoryKeyValueStore>>) -> anyhow::Result<()> {
    tracing::warn!("built without the kafka feature; serve has nothing to consume, only running the outbox sweeper");
    tokio::signal::ctrl_c().await?;
    Ok(())
}
