//! Session gate for protected routes.
//!
//! A request with a live `datatune_session` cookie gets its [`Session`]
//! attached as a request extension. Without one, `/api/` paths answer 401
//! JSON and page routes redirect to `/login`.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use axum_extra::extract::CookieJar;
use serde_json::json;

use super::session::{session_id, Session};
use super::AppState;

pub async fn require_session(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    let session: Option<Session> = match session_id(&jar) {
        Some(id) => state.sessions.get(id).await,
        None => None,
    };

    match session {
        Some(session) => {
            req.extensions_mut().insert(session);
            next.run(req).await
        }
        None => unauthenticated(req.uri().path()),
    }
}

fn unauthenticated(path: &str) -> Response {
    tracing::debug!(path, "request without a valid session");
    if path.starts_with("/api/") {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "success": false, "error": "User not authenticated" })),
        )
            .into_response()
    } else {
        Redirect::to("/login").into_response()
    }
}
