use std::sync::Arc;

use clap::Parser;
use migration::{Migrator, MigratorTrait};
use server::{ServerState, realtime::Hub, sweep::IdleSweep};
use tokio_util::sync::CancellationToken;

mod settings;

#[derive(Parser, Debug)]
#[command(name = "tally")]
#[command(about = "Scorebook and ledger server")]
struct Cli {
    /// Settings file, without extension (also read from `TALLY_CONFIG`).
    #[arg(long, env = "TALLY_CONFIG", default_value = "settings")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();
    let settings = settings::Settings::new(&cli.config)?;
    let mut tasks = tokio::task::JoinSet::new();
    let shutdown = CancellationToken::new();

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "tally={level},server={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    let Some(server) = settings.server else {
        tracing::warn!("no server settings found, nothing to run");
        return Ok(());
    };

    tracing::info!("Found server settings...");
    let db = engine::database::connect(&server.database.storage(), server.max_connections).await?;
    Migrator::up(&db, None).await?;
    let engine = Arc::new(engine::Engine::builder().database(db).build().await?);
    let hub = Arc::new(Hub::new());

    let bind = server.bind.unwrap_or_else(|| "127.0.0.1".to_string());
    let addr = format!("{}:{}", bind, server.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let state = ServerState::new(Arc::clone(&engine), Arc::clone(&hub));
    tasks.spawn(async move {
        if let Err(err) = server::run_with_listener(state, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    let sweep = IdleSweep::new(engine, hub)
        .interval(settings.sweep.interval())
        .timeout(settings.sweep.timeout())
        .inactive_for(settings.sweep.inactive_for());
    tasks.spawn(sweep.run(shutdown.clone()));

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutting down");
            shutdown.cancel();
        }
        _ = tasks.join_next() => {
            shutdown.cancel();
        }
    }

    tasks.shutdown().await;
    Ok(())
}
