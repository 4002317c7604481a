//! Query endpoint.
//!
//! Normalizes the paging UI's query string, loads the caller's session,
//! runs the orchestrator and writes the session back if it changed.

use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderMap, HeaderValue, header},
    response::{IntoResponse, Response},
};
use stackpager_core::FilterParams;

use crate::error::ApiError;
use crate::handler::AppState;
use crate::query;

/// Cookie carrying the caller's session id.
pub const SESSION_COOKIE: &str = "sessionid";

/// Extract the session id from the `Cookie` header, if any.
pub fn session_from_cookies(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

fn new_session_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

pub async fn fetch_handler(
    State(state): State<AppState>, headers: HeaderMap, Query(params): Query<FilterParams>,
) -> Result<Response, ApiError> {
    let key = params.normalize()?;

    let (session_id, minted) = match session_from_cookies(&headers) {
        Some(id) => (id, false),
        None => (new_session_id(), true),
    };

    let mut ctx = state.sessions.load(&session_id).await?;
    let envelope = query::run_query(&mut ctx, state.source.as_ref(), &key).await?;

    if ctx.is_modified()
        && let Err(e) = state.sessions.save(&ctx).await
    {
        tracing::warn!("failed to save session: {}", e);
    }

    let mut response = Json(envelope).into_response();

    if minted {
        let cookie = format!(
            "{SESSION_COOKIE}={session_id}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            state.session_ttl_secs
        );
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                response.headers_mut().insert(header::SET_COOKIE, value);
            }
            Err(e) => tracing::warn!("failed to build session cookie: {}", e),
        }
    }

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_from_cookies() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("csrftoken=x; sessionid=abc123; theme=dark"));
        assert_eq!(session_from_cookies(&headers).as_deref(), Some("abc123"));
    }

    #[test]
    fn test_session_from_cookies_absent_or_empty() {
        let mut headers = HeaderMap::new();
        assert!(session_from_cookies(&headers).is_none());

        headers.insert(header::COOKIE, HeaderValue::from_static("sessionid="));
        assert!(session_from_cookies(&headers).is_none());
    }

    #[test]
    fn test_new_session_ids_are_unique() {
        let a = new_session_id();
        let b = new_session_id();
        assert_ne!(a, b);
        assert_eq!(a.len(), 32);
    }
}
