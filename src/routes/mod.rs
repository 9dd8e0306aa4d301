//! Router assembly: HTTP endpoints, WebSocket upgrade, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod http;
pub mod ws;

/// Build the application router with:
/// - WebSocket at `/ws` (one game per connection)
/// - REST-ish API under `/api/v1/...` (games addressed by session id)
/// - CORS (allow any origin/method/headers), adjust for production if needed
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        // WebSocket
        .route("/ws", get(ws::ws_upgrade))
        // HTTP API
        .route("/api/v1/health", get(http::http_health))
        .route("/api/v1/roster", get(http::http_get_roster))
        .route("/api/v1/sessions", post(http::http_create_session))
        .route(
            "/api/v1/sessions/:id",
            get(http::http_get_session).delete(http::http_delete_session),
        )
        .route("/api/v1/sessions/:id/select", post(http::http_select))
        .route("/api/v1/sessions/:id/advance", post(http::http_advance))
        .route("/api/v1/sessions/:id/reset", post(http::http_reset))
        // State + CORS + HTTP tracing
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::logic::tests::test_state;
    use crate::protocol::SessionOut;
    use crate::session::Phase;

    async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
        let mut req = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(v) => {
                req = req.header(header::CONTENT_TYPE, "application/json");
                Body::from(v.to_string())
            }
            None => Body::empty(),
        };
        let res = app.clone().oneshot(req.body(body).unwrap()).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    fn session(bytes: &[u8]) -> SessionOut {
        serde_json::from_slice(bytes).unwrap()
    }

    #[tokio::test]
    async fn health_reports_descriptions_disabled() {
        let app = build_router(Arc::new(test_state(6)));
        let (status, body) = call(&app, Method::GET, "/api/v1/health", None).await;
        assert_eq!(status, StatusCode::OK);
        let v: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(v["ok"], true);
        assert_eq!(v["descriptions"], false);
        assert_eq!(v["sessions"], 0);
    }

    #[tokio::test]
    async fn roster_lists_local_bank() {
        let app = build_router(Arc::new(test_state(6)));
        let (status, body) = call(&app, Method::GET, "/api/v1/roster", None).await;
        assert_eq!(status, StatusCode::OK);
        let v: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(v["source"], "local_bank");
        assert_eq!(v["candidates"].as_array().unwrap().len(), 6);
        assert_eq!(v["candidates"][0]["name"], "President 0");
    }

    #[tokio::test]
    async fn full_game_over_http() {
        let app = build_router(Arc::new(test_state(40)));
        let (status, body) = call(&app, Method::POST, "/api/v1/sessions", None).await;
        assert_eq!(status, StatusCode::CREATED);
        let mut s = session(&body);
        let id = s.id.clone();

        let mut rounds = 0;
        while s.phase == Phase::AwaitingSelection {
            assert_eq!(s.options.len(), 4);
            assert!(s.correct.is_none());
            assert!(s.portrait.is_some());

            let pick = s.options[0].clone();
            let (status, body) = call(
                &app,
                Method::POST,
                &format!("/api/v1/sessions/{id}/select"),
                Some(serde_json::json!({ "name": pick })),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
            let answered = session(&body);
            assert_eq!(answered.phase, Phase::ShowingFeedback);
            assert_eq!(answered.selected.as_deref(), Some(pick.as_str()));
            let correct = answered.correct.clone().unwrap();
            if pick == correct {
                assert_eq!(answered.feedback.as_deref(), Some("✅ Correct!"));
            } else {
                assert!(answered.feedback.as_deref().unwrap().contains(&correct));
            }

            let (status, body) = call(&app, Method::POST, &format!("/api/v1/sessions/{id}/advance"), None).await;
            assert_eq!(status, StatusCode::OK);
            s = session(&body);
            rounds += 1;
        }

        assert_eq!(rounds, 10);
        assert_eq!(s.phase, Phase::GameOver);
        assert!(s.score <= 10);
        assert_eq!(s.question, None);
        assert_eq!(s.summary, Some(format!("Game Over! You scored {} out of 10.", s.score)));

        let (status, body) = call(&app, Method::POST, &format!("/api/v1/sessions/{id}/reset"), None).await;
        assert_eq!(status, StatusCode::OK);
        let fresh = session(&body);
        assert_eq!(fresh.phase, Phase::AwaitingSelection);
        assert_eq!((fresh.score, fresh.question), (0, Some(1)));
    }

    #[tokio::test]
    async fn out_of_order_calls_conflict() {
        let app = build_router(Arc::new(test_state(6)));
        let (_, body) = call(&app, Method::POST, "/api/v1/sessions", None).await;
        let s = session(&body);
        let id = s.id;

        let (status, body) = call(&app, Method::POST, &format!("/api/v1/sessions/{id}/advance"), None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        let v: Value = serde_json::from_slice(&body).unwrap();
        assert!(v["error"].as_str().unwrap().contains("no option"));

        let (status, _) = call(
            &app,
            Method::POST,
            &format!("/api/v1/sessions/{id}/select"),
            Some(serde_json::json!({ "name": "Somebody Else" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let pick = s.options[1].clone();
        let select_uri = format!("/api/v1/sessions/{id}/select");
        let (status, body) = call(&app, Method::POST, &select_uri, Some(serde_json::json!({ "name": pick }))).await;
        assert_eq!(status, StatusCode::OK);
        let score = session(&body).score;
        let (status, _) = call(&app, Method::POST, &select_uri, Some(serde_json::json!({ "name": pick }))).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (_, body) = call(&app, Method::GET, &format!("/api/v1/sessions/{id}"), None).await;
        assert_eq!(session(&body).score, score);
    }

    #[tokio::test]
    async fn unknown_and_deleted_sessions_are_not_found() {
        let app = build_router(Arc::new(test_state(6)));
        let (status, _) = call(&app, Method::GET, "/api/v1/sessions/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, body) = call(&app, Method::POST, "/api/v1/sessions", None).await;
        let id = session(&body).id;
        let (status, _) = call(&app, Method::DELETE, &format!("/api/v1/sessions/{id}"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = call(&app, Method::GET, &format!("/api/v1/sessions/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test(start_paused = true)]
    async fn idle_session_is_not_found() {
        let app = build_router(Arc::new(test_state(6)));
        let (_, body) = call(&app, Method::POST, "/api/v1/sessions", None).await;
        let id = session(&body).id;
        let uri = format!("/api/v1/sessions/{id}");

        let (status, _) = call(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::OK);

        tokio::time::advance(std::time::Duration::from_secs(1801)).await;
        let (status, body) = call(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let v: Value = serde_json::from_slice(&body).unwrap();
        assert!(v["error"].as_str().unwrap().contains(&id));

        let (_, body) = call(&app, Method::GET, "/api/v1/health", None).await;
        let v: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(v["sessions"], 0);
    }

    #[tokio::test]
    async fn tiny_roster_cannot_create_a_session() {
        let app = build_router(Arc::new(test_state(3)));
        let (status, _) = call(&app, Method::POST, "/api/v1/sessions", None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
