use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;

use crate::audio::AlertPlayer;
use crate::pose::{PoseFrame, PoseProvider};

use super::classifier::{self, Verdict};
use super::controller::MonitorSettings;
use super::debounce::FeedbackDebouncer;
use super::notifier::RemoteNotifier;
use super::state::PostureStateMachine;

// Set to false to silence the per-frame chatter in this module
const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

pub(super) async fn monitor_loop(
    mut provider: Box<dyn PoseProvider>,
    settings: MonitorSettings,
    audio: Arc<AlertPlayer>,
    notifier: Arc<RemoteNotifier>,
    cancel_token: CancellationToken,
) {
    let mut machine = PostureStateMachine::new();
    let mut debouncer = FeedbackDebouncer::new(settings.stabilization_window);

    loop {
        // Providers may block on the upstream process; read off the runtime.
        let read = tokio::task::spawn_blocking(move || {
            let frame = provider.next_frame();
            (provider, frame)
        });

        let (returned, frame) = tokio::select! {
            _ = cancel_token.cancelled() => {
                log_info!("monitor loop shutting down");
                break;
            }
            joined = read => match joined {
                Ok(pair) => pair,
                Err(err) => {
                    log_error!("pose read worker failed to join: {err}");
                    break;
                }
            }
        };
        provider = returned;

        match frame {
            // A bad frame never stops the loop.
            Err(err) => {
                log_error!("pose frame read failed: {err:?}");
                continue;
            }
            Ok(None) => {
                log_info!("pose stream ended");
                break;
            }
            Ok(Some(frame)) => {
                evaluate_frame(frame, &settings, &mut machine, &mut debouncer, &audio, &notifier);
            }
        }
    }
}

fn evaluate_frame(
    frame: PoseFrame,
    settings: &MonitorSettings,
    machine: &mut PostureStateMachine,
    debouncer: &mut FeedbackDebouncer,
    audio: &AlertPlayer,
    notifier: &RemoteNotifier,
) {
    let verdict = match frame {
        PoseFrame::NoDetection => Verdict::no_detection(),
        PoseFrame::Detected(set) => {
            classifier::classify(&set, &settings.profile, settings.min_visibility)
        }
    };

    let Some(kind) = machine.observe(&verdict) else {
        return;
    };

    log_info!(
        "verdict {:?} (back {:?}, knees {:?}/{:?})",
        kind,
        verdict.angles.back,
        verdict.angles.knee_left,
        verdict.angles.knee_right
    );

    if kind.is_fault() {
        // Independently rate-limited; never blocks this loop.
        notifier.notify_error();
    }

    if debouncer.observe(kind, Instant::now()) && kind.is_fault() {
        let flag = debouncer.begin_actuation();
        let clear = {
            let flag = Arc::clone(&flag);
            move || flag.store(false, Ordering::SeqCst)
        };
        if let Err(err) = audio.play_alert(clear) {
            log_warn!("failed to queue posture alert: {err}");
            flag.store(false, Ordering::SeqCst);
        }
    }
}
