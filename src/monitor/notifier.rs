use std::sync::Mutex;
use std::time::{Duration, Instant};

use log::{debug, warn};
use reqwest::Client;

/// Fire-and-forget dispatch of posture-error events to a remote endpoint,
/// rate-limited independently of the audio feedback. Failures are logged and
/// discarded; dispatch never blocks the evaluation loop.
pub struct RemoteNotifier {
    client: Client,
    url: Option<String>,
    min_interval: Duration,
    timeout: Duration,
    last_sent: Mutex<Option<Instant>>,
}

impl RemoteNotifier {
    pub fn new(url: Option<String>, min_interval: Duration, timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            url,
            min_interval,
            timeout,
            last_sent: Mutex::new(None),
        }
    }

    /// Whether a dispatch is allowed at `now`; records the dispatch if so.
    fn should_send(&self, now: Instant) -> bool {
        let mut guard = match self.last_sent.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(last) = *guard {
            if now.duration_since(last) < self.min_interval {
                return false;
            }
        }

        *guard = Some(now);
        true
    }

    /// Report an error verdict. At most one request per `min_interval`
    /// leaves the process; the request runs on its own task.
    pub fn notify_error(&self) {
        let Some(url) = self.url.clone() else {
            return;
        };

        if !self.should_send(Instant::now()) {
            return;
        }

        let client = self.client.clone();
        let timeout = self.timeout;
        tokio::spawn(async move {
            match client.post(&url).timeout(timeout).send().await {
                Ok(response) if response.status().is_success() => {
                    debug!("error notification delivered to {url}");
                }
                Ok(response) => {
                    warn!(
                        "error notification to {url} rejected with status {}",
                        response.status()
                    );
                }
                Err(err) => {
                    warn!("error notification to {url} failed: {err}");
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notifier(min_interval: Duration) -> RemoteNotifier {
        RemoteNotifier::new(
            Some("http://127.0.0.1:1/errors".to_string()),
            min_interval,
            Duration::from_secs(1),
        )
    }

    #[test]
    fn first_dispatch_is_allowed() {
        let notifier = notifier(Duration::from_secs(2));
        assert!(notifier.should_send(Instant::now()));
    }

    #[test]
    fn dispatches_inside_the_interval_are_dropped() {
        let notifier = notifier(Duration::from_secs(2));
        let start = Instant::now();

        assert!(notifier.should_send(start));
        assert!(!notifier.should_send(start + Duration::from_millis(500)));
        assert!(!notifier.should_send(start + Duration::from_millis(1_999)));
        assert!(notifier.should_send(start + Duration::from_secs(2)));
    }

    #[test]
    fn interval_counts_from_the_last_sent_request() {
        let notifier = notifier(Duration::from_secs(2));
        let start = Instant::now();

        assert!(notifier.should_send(start));
        // Dropped attempts do not push the window forward.
        assert!(!notifier.should_send(start + Duration::from_secs(1)));
        assert!(notifier.should_send(start + Duration::from_secs(2)));
        assert!(!notifier.should_send(start + Duration::from_secs(3)));
        assert!(notifier.should_send(start + Duration::from_secs(4)));
    }
}
