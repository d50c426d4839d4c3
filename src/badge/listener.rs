use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::session::SessionTracker;

use super::TokenReader;

// Set to false to silence badge polling logs in this module
const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info};

/// Waits on the badge reader and forwards each observation to the session
/// tracker. Reader failures end the loop — session control then degrades to
/// the HTTP API — while "no badge present" just waits out the poll delay.
pub async fn badge_listener(
    mut reader: Box<dyn TokenReader>,
    tracker: SessionTracker,
    poll_interval: Duration,
    cancel_token: CancellationToken,
) {
    loop {
        let read = tokio::task::spawn_blocking(move || {
            let observation = reader.wait_for_token();
            (reader, observation)
        });

        let (returned, observation) = tokio::select! {
            _ = cancel_token.cancelled() => {
                log_info!("badge listener shutting down");
                break;
            }
            joined = read => match joined {
                Ok(pair) => pair,
                Err(err) => {
                    log_error!("badge read worker failed to join: {err}");
                    break;
                }
            }
        };
        reader = returned;

        match observation {
            Ok(Some(token)) => {
                if let Err(err) = tracker.on_token_observed(&token).await {
                    log_error!("failed to process badge {token}: {err:?}");
                }
            }
            Ok(None) => {
                tokio::select! {
                    _ = cancel_token.cancelled() => {
                        log_info!("badge listener shutting down");
                        break;
                    }
                    _ = tokio::time::sleep(poll_interval) => {}
                }
            }
            Err(err) => {
                log_error!("badge reader failed, stopping listener: {err:?}");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::badge::LineTokenReader;
    use crate::db::Database;

    fn temp_tracker() -> SessionTracker {
        let path = std::env::temp_dir().join(format!(
            "squatguard-listener-test-{}.sqlite3",
            uuid::Uuid::new_v4()
        ));
        SessionTracker::new(Database::new(path).unwrap())
    }

    #[tokio::test]
    async fn forwards_tokens_until_the_feed_closes() {
        let tracker = temp_tracker();
        let reader = Box::new(LineTokenReader::new("A\nB\n".as_bytes()));

        badge_listener(
            reader,
            tracker.clone(),
            Duration::from_millis(10),
            CancellationToken::new(),
        )
        .await;

        // A was superseded by B; both rows exist.
        assert!(tracker.get_session("A").await.unwrap().is_some());
        let b = tracker.get_session("B").await.unwrap().unwrap();
        assert!(b.is_open());
    }
}
