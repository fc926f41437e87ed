//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
};
use nexskill_core::domain::UserRole;
use std::sync::Arc;
use tracing::error;
use uuid::Uuid;

use crate::web::state::AppState;

/// The authenticated caller, inserted into request extensions by `require_auth`.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: UserRole,
}

/// Middleware that validates the auth session cookie and resolves the caller.
///
/// If valid, inserts an `AuthUser` into request extensions for handlers to use.
/// If invalid or missing, returns 401 Unauthorized.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    // 1. Extract cookie header
    let cookie_header = req
        .headers()
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    // 2. Parse session ID from cookie
    let auth_session_id = parse_session_cookie(cookie_header).ok_or(StatusCode::UNAUTHORIZED)?;

    // 3. Validate auth session in database, get user_id
    let user_id = state
        .db
        .validate_auth_session(auth_session_id)
        .await
        .map_err(|e| {
            error!("Failed to validate auth session: {:?}", e);
            StatusCode::UNAUTHORIZED
        })?;

    // 4. Resolve the caller's role
    let user = state.db.get_user_by_id(user_id).await.map_err(|e| {
        error!("Failed to load user {} for auth: {:?}", user_id, e);
        StatusCode::UNAUTHORIZED
    })?;

    // 5. Insert the caller into request extensions
    req.extensions_mut().insert(AuthUser {
        user_id,
        role: user.role,
    });

    // 6. Continue to the handler
    Ok(next.run(req).await)
}

/// Pulls the session id out of a Cookie header value.
pub(crate) fn parse_session_cookie(cookie_header: &str) -> Option<&str> {
    cookie_header.split(';').find_map(|c| {
        let c = c.trim();
        c.strip_prefix("session=")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_cookie_is_found_among_others() {
        let header = "theme=dark; session=abc123; locale=en";
        assert_eq!(parse_session_cookie(header), Some("abc123"));
    }

    #[test]
    fn missing_session_cookie_yields_none() {
        assert_eq!(parse_session_cookie("theme=dark; locale=en"), None);
        assert_eq!(parse_session_cookie(""), None);
    }
}
