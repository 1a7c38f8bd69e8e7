// Operator CLI for the mission-progression pipeline: run migrations, drive
// the outbox sweeper, serve the ingress consumers, or inject a test event
// by hand. HTTP request handling lives outside this crate entirely; this
// tool only ever talks to the bus and the database directly.

mod consumer;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use mission_pipeline::config::Config;
use mission_pipeline::database::Database;
use mission_pipeline::idempotency::InMemoryKeyValueStore;
use mission_pipeline::{run_migrations, Pipeline};

#[derive(Parser)]
#[command(name = "mission-pipeline-cli", about = "Operator tool for the mission-progression pipeline")]
struct Cli {
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Runs pending database migrations for the configured backend.
    Migrate,
    /// Runs the outbox sweeper, either once or in a loop until Ctrl-C.
    Outbox {
        #[command(subcommand)]
        action: OutboxAction,
    },
    /// Runs the ingress and mission-completed consumers until Ctrl-C.
    Serve,
    /// Publishes one test event by hand, bypassing any upstream API.
    Publish {
        #[command(subcommand)]
        event: PublishEvent,
    },
}

#[derive(Subcommand)]
enum OutboxAction {
    SweepOnce,
    Run,
}

#[derive(Subcommand)]
enum PublishEvent {
    Login { user: String },
    Launch { user: String, game: String },
    Play { user: String, game: String, score: i32 },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Command::Migrate => {
            let db = Database::connect(&config.database_url, config.max_pool_size).await?;
            run_migrations(&db).await?;
            tracing::info!("migrations applied");
        }
        Command::Outbox { action } => {
            let pipeline = Pipeline::boot(&config).await?;
            match action {
                OutboxAction::SweepOnce => {
                    let report = pipeline.outbox().sweep_once().await?;
                    tracing::info!(?report, "outbox sweep complete");
                }
                OutboxAction::Run => {
                    let shutdown = tokio::signal::ctrl_c();
                    pipeline.outbox().run(async { shutdown.await.ok().unwrap_or(()) }).await;
                }
            }
        }
        Command::Serve => {
            let pipeline = Arc::new(Pipeline::boot(&config).await?);
            let outbox = pipeline.outbox().clone();
            let sweeper = tokio::spawn(async move {
                outbox.run(async { tokio::signal::ctrl_c().await.ok().unwrap_or(()) }).await;
            });
            consumer::run(&config, pipeline.clone()).await?;
            sweeper.await?;
        }
        Command::Publish { event } => {
            let pipeline = Pipeline::<InMemoryKeyValueStore>::boot(&config).await?;
            match event {
                PublishEvent::Login { user } => {
                    pipeline
                        .publish_login(&user, mission_pipeline::database::universal_types::UniversalDate::today())
                        .await?;
                }
                PublishEvent::Launch { user, game } => {
                    pipeline.publish_launch(&user, &game).await?;
                }
                PublishEvent::Play { user, game, score } => {
                    pipeline.publish_play(&user, &game, score).await?;
                }
            }
            tracing::info!("event published");
        }
    }

    Ok(())
}
