//! Login/logout relay.
//!
//! The dashboard never stores upstream credentials: login forwards them to
//! the upstream once, and the returned session cookie pairs are handed back
//! to the browser in an httponly cookie for later request forwarding.
//! Invalid credentials and a missing session cookie are reported
//! identically as a generic failure.

use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json};
use serde::Deserialize;
use tracing::warn;

use crate::server::{upstream_session, AppState, SESSION_COOKIE, USER_COOKIE};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub login: String,
    pub password: String,
}

pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> impl IntoResponse {
    if state.config.active_user(&request.login).is_none() {
        return (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({"error": "User not found or not active"})),
        )
            .into_response();
    }

    match state.client.login(&request.login, &request.password).await {
        Ok(Some(cookie_pairs)) => {
            let session = format!(
                "{SESSION_COOKIE}={}; HttpOnly; Path=/; SameSite=Lax",
                urlencoding::encode(&cookie_pairs)
            );
            let user = format!(
                "{USER_COOKIE}={}; Path=/; SameSite=Lax",
                urlencoding::encode(&request.login)
            );
            (
                [(SET_COOKIE, session), (SET_COOKIE, user)],
                Json(serde_json::json!({"success": true})),
            )
                .into_response()
        }
        Ok(None) => (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({"error": "Upstream login failed"})),
        )
            .into_response(),
        Err(err) => {
            warn!(error = %err, "Upstream login request failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": "Upstream login failed"})),
            )
                .into_response()
        }
    }
}

pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    let session = upstream_session(&headers);
    if session.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "No session token"})),
        )
            .into_response();
    }

    if let Err(err) = state.client.logout(&session).await {
        warn!(error = %err, "Upstream logout request failed");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"error": "Logout failed"})),
        )
            .into_response();
    }

    let clear_session = format!("{SESSION_COOKIE}=; Path=/; Max-Age=0");
    let clear_user = format!("{USER_COOKIE}=; Path=/; Max-Age=0");
    (
        [(SET_COOKIE, clear_session), (SET_COOKIE, clear_user)],
        Json(serde_json::json!({"success": true})),
    )
        .into_response()
}
