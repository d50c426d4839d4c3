pub mod audio;
pub mod badge;
pub mod config;
pub mod db;
pub mod geometry;
pub mod monitor;
pub mod pose;
pub mod server;
pub mod session;
mod utils;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use log::{error, info};
use tokio_util::sync::CancellationToken;

use audio::AlertPlayer;
use badge::{listener::badge_listener, LineTokenReader, TokenReader};
use config::AppConfig;
use db::Database;
use monitor::{notifier::RemoteNotifier, MonitorController, MonitorSettings};
use pose::{JsonlPoseProvider, PoseProvider};
use session::SessionTracker;

fn config_path() -> PathBuf {
    std::env::var_os("SQUATGUARD_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("squatguard.json"))
}

pub async fn run() -> Result<()> {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    info!("squatguard starting up...");

    let config_path = config_path();
    let config = AppConfig::load_or_default(&config_path)
        .with_context(|| format!("failed to load {}", config_path.display()))?;

    let database = Database::new(config.db_path.clone())?;
    let tracker = SessionTracker::new(database);

    // Finalize sessions that were open when the process last stopped.
    tracker.recover().await?;

    let shutdown = CancellationToken::new();

    let badge_task = match config.badge_input.clone() {
        Some(path) => {
            let tracker = tracker.clone();
            let cancel = shutdown.clone();
            let poll_interval = config.badge_poll_interval();
            Some(tokio::spawn(async move {
                let opened = tokio::task::spawn_blocking(move || LineTokenReader::open(&path))
                    .await
                    .context("badge feed open worker failed to join")
                    .and_then(|result| result);
                match opened {
                    Ok(reader) => {
                        let reader: Box<dyn TokenReader> = Box::new(reader);
                        badge_listener(reader, tracker, poll_interval, cancel).await;
                    }
                    Err(err) => {
                        error!("badge listener unavailable: {err:?}");
                    }
                }
            }))
        }
        None => {
            info!("badge input not configured; session control via HTTP API only");
            None
        }
    };

    let provider: Box<dyn PoseProvider> = match &config.pose_input {
        Some(path) => Box::new(JsonlPoseProvider::open(path)?),
        None => Box::new(JsonlPoseProvider::stdin()),
    };

    let audio = Arc::new(AlertPlayer::new(config.alert_clip.clone()));
    let notifier = Arc::new(RemoteNotifier::new(
        config.notify_url.clone(),
        config.notify_min_interval(),
        config.notify_timeout(),
    ));

    let mut monitor = MonitorController::new();
    monitor
        .start_monitoring(
            provider,
            MonitorSettings {
                profile: config.profile.clone(),
                min_visibility: config.min_visibility,
                stabilization_window: config.stabilization_window(),
            },
            audio,
            notifier,
        )
        .await?;

    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("shutdown signal received");
                shutdown.cancel();
            }
        });
    }

    let served = server::serve(&config.listen_addr, tracker, shutdown.clone()).await;

    // The server only returns on shutdown (or bind failure); wind the
    // workers down either way.
    shutdown.cancel();
    monitor.stop_monitoring().await?;
    if let Some(task) = badge_task {
        let _ = task.await;
    }
    served?;

    info!("squatguard stopped");
    Ok(())
}
