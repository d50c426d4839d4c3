use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use log::info;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::audio::AlertPlayer;
use crate::pose::PoseProvider;

use super::classifier::ThresholdProfile;
use super::loop_worker::monitor_loop;
use super::notifier::RemoteNotifier;

/// The monitor loop's slice of the configuration.
#[derive(Debug, Clone)]
pub struct MonitorSettings {
    pub profile: ThresholdProfile,
    pub min_visibility: f64,
    pub stabilization_window: Duration,
}

/// Owns the posture evaluation loop task.
pub struct MonitorController {
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
}

impl MonitorController {
    pub fn new() -> Self {
        Self {
            handle: None,
            cancel_token: None,
        }
    }

    pub async fn start_monitoring(
        &mut self,
        provider: Box<dyn PoseProvider>,
        settings: MonitorSettings,
        audio: Arc<AlertPlayer>,
        notifier: Arc<RemoteNotifier>,
    ) -> Result<()> {
        if self.handle.is_some() {
            bail!("monitoring already active");
        }

        info!("starting posture monitor");

        let cancel_token = CancellationToken::new();
        let token_clone = cancel_token.clone();

        let handle = tokio::spawn(monitor_loop(
            provider,
            settings,
            audio,
            notifier,
            token_clone,
        ));

        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        Ok(())
    }

    /// Stop the evaluation loop and wait for it to exit. In-flight audio and
    /// notification tasks run to completion on their own.
    pub async fn stop_monitoring(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        if let Some(handle) = self.handle.take() {
            handle
                .await
                .context("monitor loop task failed to join")
                .map(|_| ())
        } else {
            Ok(())
        }
    }
}

impl Default for MonitorController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::JsonlPoseProvider;

    fn settings() -> MonitorSettings {
        MonitorSettings {
            profile: ThresholdProfile::squat(),
            min_visibility: 0.5,
            stabilization_window: Duration::from_secs(2),
        }
    }

    fn quiet_notifier() -> Arc<RemoteNotifier> {
        Arc::new(RemoteNotifier::new(
            None,
            Duration::from_secs(2),
            Duration::from_secs(1),
        ))
    }

    #[tokio::test]
    async fn consumes_the_stream_and_stops_cleanly() {
        let frames = concat!(
            r#"{"kind":"noDetection"}"#,
            "\n",
            r#"{"kind":"noDetection"}"#,
            "\n",
        );
        let provider = Box::new(JsonlPoseProvider::new(frames.as_bytes()));

        let mut controller = MonitorController::new();
        controller
            .start_monitoring(
                provider,
                settings(),
                Arc::new(AlertPlayer::new(None)),
                quiet_notifier(),
            )
            .await
            .unwrap();

        controller.stop_monitoring().await.unwrap();
    }

    #[tokio::test]
    async fn double_start_is_rejected() {
        let provider = Box::new(JsonlPoseProvider::new("".as_bytes()));
        let second = Box::new(JsonlPoseProvider::new("".as_bytes()));

        let mut controller = MonitorController::new();
        controller
            .start_monitoring(
                provider,
                settings(),
                Arc::new(AlertPlayer::new(None)),
                quiet_notifier(),
            )
            .await
            .unwrap();

        assert!(controller
            .start_monitoring(
                second,
                settings(),
                Arc::new(AlertPlayer::new(None)),
                quiet_notifier(),
            )
            .await
            .is_err());

        controller.stop_monitoring().await.unwrap();
    }
}
