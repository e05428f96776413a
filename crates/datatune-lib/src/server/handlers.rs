//! HTTP endpoint handlers.
//!
//! Handlers on protected routes receive the caller's [`Session`] as an
//! extension set by [`super::middleware::require_session`].

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum::{Extension, Json};
use axum_extra::extract::CookieJar;
use reqwest::Url;
use serde::Deserialize;
use serde_json::json;

use crate::connect::{CallbackParams, ConnectError};
use crate::errors::DataTuneError;

use super::config::OAUTH_CALLBACK_PATH;
use super::session::{session_cookie, session_cookie_removal, session_id, LoginPayload, Session};
use super::AppState;

/// Maps a `DataTuneError` to an HTTP status code and JSON error body.
pub fn error_to_response(err: &DataTuneError) -> (StatusCode, Json<serde_json::Value>) {
    let status = match err {
        DataTuneError::Auth(_) | DataTuneError::OAuth2(_) => StatusCode::UNAUTHORIZED,
        DataTuneError::Broker { .. } | DataTuneError::Provider { .. } | DataTuneError::Http(_) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        DataTuneError::Config(_) | DataTuneError::Command(_) | DataTuneError::Json(_) => {
            StatusCode::BAD_REQUEST
        }
        DataTuneError::Server { status, .. } => {
            StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(json!({
            "success": false,
            "error": err.to_string()
        })),
    )
}

fn failure(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "success": false, "error": message }))).into_response()
}

/// Unwrap a JSON body, answering 400 in the usual error shape when it is
/// missing or malformed.
fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, Response> {
    payload.map(|Json(body)| body).map_err(|rejection| {
        tracing::debug!("Rejected request body: {}", rejection.body_text());
        failure(StatusCode::BAD_REQUEST, "Invalid request body")
    })
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

pub async fn health() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({ "status": "healthy", "service": "DataTune API" })),
    )
}

// ---------------------------------------------------------------------------
// Login / logout
// ---------------------------------------------------------------------------

pub async fn auth_callback(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    payload: Result<Json<LoginPayload>, JsonRejection>,
) -> Response {
    let body = match json_body(payload) {
        Ok(body) => body,
        Err(resp) => return resp,
    };
    match state.sessions.create(body).await {
        Ok(session) => (
            StatusCode::OK,
            jar.add(session_cookie(&session.id)),
            Json(json!({ "success": true, "redirect": "/index" })),
        )
            .into_response(),
        Err(DataTuneError::Auth(msg)) => failure(StatusCode::BAD_REQUEST, &msg),
        Err(e) => {
            tracing::error!("Auth callback error: {}", e);
            error_to_response(&e).into_response()
        }
    }
}

pub async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    if let Some(id) = session_id(&jar) {
        state.sessions.remove(id).await;
    }
    (jar.remove(session_cookie_removal()), Redirect::to("/login")).into_response()
}

pub async fn home(State(state): State<Arc<AppState>>, jar: CookieJar) -> Redirect {
    let signed_in = match session_id(&jar) {
        Some(id) => state.sessions.get(id).await.is_some(),
        None => false,
    };
    Redirect::to(if signed_in { "/index" } else { "/login" })
}

pub async fn get_user(Extension(session): Extension<Session>) -> impl IntoResponse {
    Json(json!({
        "user_id": session.user_id,
        "user_email": session.email,
        "user_name": session.name,
    }))
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub query: String,
}

pub async fn search_files(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> Response {
    let body = match json_body(payload) {
        Ok(body) => body,
        Err(resp) => return resp,
    };
    if body.query.trim().is_empty() {
        return failure(StatusCode::BAD_REQUEST, "Search query is required");
    }
    let result = state.aggregator.search_all(&session.user_id, &body.query).await;
    (StatusCode::OK, Json(result.report())).into_response()
}

pub async fn connected_services(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> impl IntoResponse {
    let connected = state.aggregator.connected_services(&session.user_id).await;
    Json(json!({ "success": true, "connected_services": connected }))
}

// ---------------------------------------------------------------------------
// Connect flow
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct ConnectServiceRequest {
    #[serde(default)]
    pub service: String,
}

pub async fn connect_service(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    headers: HeaderMap,
    payload: Result<Json<ConnectServiceRequest>, JsonRejection>,
) -> Response {
    let body = match json_body(payload) {
        Ok(body) => body,
        Err(resp) => return resp,
    };
    let Some(refresh_token) = session.refresh_token.as_deref() else {
        return failure(StatusCode::UNAUTHORIZED, "User not authenticated");
    };

    let callback_url = callback_url(state.public_url.as_deref(), &headers);
    match state
        .connect
        .begin(&session.user_id, &body.service, refresh_token, &callback_url)
        .await
    {
        Ok(start) => Json(json!({
            "success": true,
            "message": format!("{} connection initiated", start.service),
            "auth_url": start.auth_url,
            "redirect_required": true,
        }))
        .into_response(),
        Err(ConnectError::UnsupportedService(_)) => {
            failure(StatusCode::BAD_REQUEST, "Unsupported service")
        }
        Err(e) => {
            tracing::warn!(service = %body.service, "Connect service error: {}", e);
            failure(StatusCode::BAD_REQUEST, "Failed to initiate connection")
        }
    }
}

pub async fn oauth_callback(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Query(params): Query<CallbackParams>,
) -> Redirect {
    match state.connect.complete(&session.user_id, &params).await {
        Ok(provider) => connections_redirect("connected", provider.as_str()),
        Err(e) => {
            tracing::warn!(user_id = %session.user_id, "OAuth callback failed: {}", e);
            connections_redirect("error", &e.redirect_code())
        }
    }
}

/// Absolute URL of the OAuth callback route as seen by the browser.
fn callback_url(public_url: Option<&str>, headers: &HeaderMap) -> String {
    let base = match public_url {
        Some(url) => url.trim_end_matches('/').to_string(),
        None => {
            let host = headers
                .get(header::HOST)
                .and_then(|h| h.to_str().ok())
                .unwrap_or("localhost");
            format!("http://{}", host)
        }
    };
    format!("{}{}", base, OAUTH_CALLBACK_PATH)
}

/// Redirect to the connections page with one escaped query parameter.
fn connections_redirect(key: &str, value: &str) -> Redirect {
    let mut url = match Url::parse("http://localhost/connections") {
        Ok(url) => url,
        Err(_) => return Redirect::to("/connections"),
    };
    url.query_pairs_mut().append_pair(key, value);
    match url.query() {
        Some(query) => Redirect::to(&format!("{}?{}", url.path(), query)),
        None => Redirect::to(url.path()),
    }
}
