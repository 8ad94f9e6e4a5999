//! # nexus-console
//!
//! Line-oriented front end for the Nexus engine.
//!
//! Reads one command per line from stdin and prints results to stdout.
//! Engine events (new messages, notifications) are echoed as JSON lines
//! on stderr next to the tracing output. Type `help` for the command list.

mod shell;

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use nexus_core::{Engine, EngineConfig};
use nexus_store::{Database, MemoryBackend};

use crate::shell::{Command, Outcome};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,nexus_core=debug")),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("Starting {} console v{}", nexus_shared::constants::APP_NAME, env!("CARGO_PKG_VERSION"));

    let config = EngineConfig::from_env();
    info!(db_path = ?config.db_path, latency = ?config.login_latency, "Loaded configuration");

    let opened = match &config.db_path {
        Some(path) => Database::open_at(path),
        None => Database::open_default(),
    };
    let builder = match opened {
        Ok(db) => Engine::builder(db),
        Err(e) => {
            warn!(error = %e, "database unavailable, state will not survive this run");
            Engine::builder(MemoryBackend::new())
        }
    };
    let engine = Arc::new(builder.config(config).build());
    let driver = engine.spawn_driver();

    let mut events = engine.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    if let Ok(line) = serde_json::to_string(&event) {
                        eprintln!("{line}");
                    }
                }
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "event echo fell behind"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    if let Some(user) = engine.current_principal() {
        println!("Welcome back, {}.", user.name);
    }
    println!("Type `help` for commands.");

    // Ctrl+C is watched while waiting for input and while a command runs,
    // so a login still in its latency window is abandoned too.
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down");
                break;
            }
        };
        let Some(line) = line else { break };

        let command = match Command::parse(&line) {
            Ok(Some(c)) => c,
            Ok(None) => continue,
            Err(e) => {
                println!("error: {e}");
                continue;
            }
        };

        let outcome = tokio::select! {
            outcome = shell::execute(&engine, command) => outcome,
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down");
                break;
            }
        };
        match outcome {
            Ok(Outcome::Continue(out)) if out.is_empty() => {}
            Ok(Outcome::Continue(out)) => println!("{out}"),
            Ok(Outcome::Quit) => break,
            Err(e) => println!("error: {e}"),
        }
    }

    if let Err(e) = engine.checkpoint() {
        warn!(error = %e, "final checkpoint failed");
    }
    engine.shutdown();
    driver.await?;
    Ok(())
}
