use std::fmt;
use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use log::{info, warn};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::db::{models::Session, Database};

/// What a badge presentation did.
#[derive(Debug, Clone)]
pub enum TokenOutcome {
    Opened(Session),
    Closed(Session),
}

#[derive(Debug)]
pub enum TrackerError {
    /// Counter mutation attempted with no open session.
    NoActiveSession,
    Db(anyhow::Error),
}

impl fmt::Display for TrackerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackerError::NoActiveSession => write!(f, "no active session"),
            TrackerError::Db(err) => write!(f, "database error: {err}"),
        }
    }
}

impl std::error::Error for TrackerError {}

impl From<anyhow::Error> for TrackerError {
    fn from(err: anyhow::Error) -> Self {
        TrackerError::Db(err)
    }
}

#[derive(Debug, Clone)]
struct ActiveSession {
    session_id: String,
    token: String,
}

/// Badge-keyed session lifecycle and counters.
///
/// A badge scan toggles: no open session for the token opens one, a re-scan
/// closes it. Counter increments go to the single active session. Everything
/// runs behind one async mutex, so a close and an increment can never
/// interleave — an increment that loses the race sees the cleared pointer
/// and is rejected rather than landing on the closed row.
#[derive(Clone)]
pub struct SessionTracker {
    active: Arc<Mutex<Option<ActiveSession>>>,
    db: Database,
}

impl SessionTracker {
    pub fn new(db: Database) -> Self {
        Self {
            active: Arc::new(Mutex::new(None)),
            db,
        }
    }

    /// Close sessions left open by a previous run. Called once at startup,
    /// before the badge listener starts.
    pub async fn recover(&self) -> Result<()> {
        let closed = self.db.close_open_sessions(Utc::now()).await?;
        if closed > 0 {
            warn!("Recovered {closed} session(s) left open by a previous run");
        }
        Ok(())
    }

    /// Handle one badge presentation: toggle the token's session open or
    /// closed. Scanning a different badge while a session is open closes the
    /// current session first, then opens one for the new badge.
    pub async fn on_token_observed(&self, token: &str) -> Result<TokenOutcome> {
        let mut active = self.active.lock().await;
        let now = Utc::now();

        if let Some(open) = self.db.get_open_session_by_token(token).await? {
            self.db.close_session(&open.id, now).await?;
            if active
                .as_ref()
                .is_some_and(|current| current.session_id == open.id)
            {
                *active = None;
            }

            info!(
                "Session {} closed for token {token} ({} repetitions, {} errors)",
                open.id, open.repetitions, open.errors
            );
            let closed = self
                .db
                .get_session_by_id(&open.id)
                .await?
                .unwrap_or(open);
            return Ok(TokenOutcome::Closed(closed));
        }

        // A different badge takes over: end the running session so only one
        // session is ever active.
        if let Some(previous) = active.take() {
            self.db.close_session(&previous.session_id, now).await?;
            info!(
                "Session {} closed for token {} (superseded by {token})",
                previous.session_id, previous.token
            );
        }

        let session = Session {
            id: Uuid::new_v4().to_string(),
            token: token.to_string(),
            repetitions: 0,
            errors: 0,
            started_at: now,
            ended_at: None,
            created_at: now,
            updated_at: now,
        };
        self.db.insert_session(&session).await?;
        *active = Some(ActiveSession {
            session_id: session.id.clone(),
            token: token.to_string(),
        });

        info!("Session {} opened for token {token}", session.id);
        Ok(TokenOutcome::Opened(session))
    }

    pub async fn record_repetition(&self) -> Result<(), TrackerError> {
        let active = self.active.lock().await;
        let Some(current) = active.as_ref() else {
            return Err(TrackerError::NoActiveSession);
        };
        self.db
            .increment_repetitions(&current.session_id, Utc::now())
            .await?;
        Ok(())
    }

    pub async fn record_error(&self) -> Result<(), TrackerError> {
        let active = self.active.lock().await;
        let Some(current) = active.as_ref() else {
            return Err(TrackerError::NoActiveSession);
        };
        self.db
            .increment_errors(&current.session_id, Utc::now())
            .await?;
        Ok(())
    }

    /// Most recent session for the token, open or closed.
    pub async fn get_session(&self, token: &str) -> Result<Option<Session>> {
        self.db.get_latest_session_by_token(token).await
    }
}
