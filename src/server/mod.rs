use anyhow::{Context, Result};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use log::{error, info};
use serde_json::json;

use crate::session::{SessionTracker, TrackerError};

/// Session API consumed by the repetition-counter device and by the posture
/// monitor's error notifier.
pub fn router(tracker: SessionTracker) -> Router {
    Router::new()
        .route(
            "/",
            get(|| async {
                "squatguard session API\n\n\
                 POST /repetitions      - count a repetition on the active session\n\
                 POST /errors           - count a movement error on the active session\n\
                 GET  /sessions/:token  - latest session for a badge token\n"
            }),
        )
        .route("/repetitions", post(add_repetition))
        .route("/errors", post(add_error))
        .route("/sessions/:token", get(get_session))
        .with_state(tracker)
}

pub async fn serve(
    addr: &str,
    tracker: SessionTracker,
    shutdown: tokio_util::sync::CancellationToken,
) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind session API to {addr}"))?;

    info!("Session API listening on {addr}");

    axum::serve(listener, router(tracker))
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .context("session API server error")
}

fn counter_response(result: Result<(), TrackerError>, what: &str) -> impl IntoResponse {
    match result {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "message": format!("{what} recorded") })),
        ),
        Err(TrackerError::NoActiveSession) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "no active session" })),
        ),
        Err(TrackerError::Db(err)) => {
            error!("failed to record {what}: {err:?}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "internal error" })),
            )
        }
    }
}

async fn add_repetition(State(tracker): State<SessionTracker>) -> impl IntoResponse {
    counter_response(tracker.record_repetition().await, "repetition")
}

async fn add_error(State(tracker): State<SessionTracker>) -> impl IntoResponse {
    counter_response(tracker.record_error().await, "movement error")
}

async fn get_session(
    State(tracker): State<SessionTracker>,
    Path(token): Path<String>,
) -> impl IntoResponse {
    match tracker.get_session(&token).await {
        Ok(Some(session)) => (StatusCode::OK, Json(json!(session))),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "no session for token" })),
        ),
        Err(err) => {
            error!("session lookup failed for {token}: {err:?}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "internal error" })),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn temp_tracker() -> SessionTracker {
        let path = std::env::temp_dir().join(format!(
            "squatguard-server-test-{}.sqlite3",
            uuid::Uuid::new_v4()
        ));
        SessionTracker::new(Database::new(path).unwrap())
    }

    #[tokio::test]
    async fn repetition_without_session_is_a_client_error() {
        let app = router(temp_tracker());
        let response = app
            .oneshot(
                Request::post("/repetitions")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn counters_flow_through_the_api() {
        let tracker = temp_tracker();
        tracker.on_token_observed("X1").await.unwrap();
        let app = router(tracker.clone());

        for _ in 0..3 {
            let response = app
                .clone()
                .oneshot(
                    Request::post("/repetitions")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        let session = tracker.get_session("X1").await.unwrap().unwrap();
        assert_eq!(session.repetitions, 3);
    }

    #[tokio::test]
    async fn unknown_token_is_not_found() {
        let app = router(temp_tracker());
        let response = app
            .oneshot(
                Request::get("/sessions/nobody")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
