//! Session guard middleware.
//!
//! Classifies every inbound path as Protected, AuthOnly or Public and
//! short-circuits with a redirect when the session state does not fit the
//! class. Runs before any protected- or auth-page handler.

use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{header, request::Parts, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use regex::Regex;
use serde_json::json;

use crate::config::schema::SessionConfig;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::session::provider::{SessionLookup, SessionUser};

/// Access class of a request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// Requires a valid session.
    Protected,
    /// Only makes sense without a session (login, register).
    AuthOnly,
    /// No session requirements.
    Public,
}

/// Compiled route classification rules. Rebuilt on config hot reload.
#[derive(Debug)]
pub struct RouteMatcher {
    protected_prefixes: Vec<String>,
    protected_patterns: Vec<Regex>,
    auth_paths: Vec<String>,
    login_path: String,
    landing_path: String,
}

impl RouteMatcher {
    /// Compile prefix lists and parameterized-path patterns.
    pub fn compile(config: &SessionConfig) -> Result<Self, regex::Error> {
        let protected_patterns = config
            .protected_patterns
            .iter()
            .map(|p| Regex::new(p))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            protected_prefixes: config.protected_prefixes.clone(),
            protected_patterns,
            auth_paths: config.auth_paths.clone(),
            login_path: config.login_path.clone(),
            landing_path: config.landing_path.clone(),
        })
    }

    /// Classify a request path. Auth-only paths win over protected ones so
    /// a login page under a protected prefix stays reachable.
    pub fn classify(&self, path: &str) -> RouteClass {
        if self.auth_paths.iter().any(|p| prefix_match(path, p)) {
            return RouteClass::AuthOnly;
        }
        if self
            .protected_prefixes
            .iter()
            .any(|p| prefix_match(path, p))
            || self.protected_patterns.iter().any(|re| re.is_match(path))
        {
            return RouteClass::Protected;
        }
        RouteClass::Public
    }

    /// Login redirect target preserving the original path.
    pub fn login_redirect(&self, original: &str) -> String {
        let encoded: String = url::form_urlencoded::byte_serialize(original.as_bytes()).collect();
        format!("{}?redirectTo={}", self.login_path, encoded)
    }

    pub fn landing_path(&self) -> &str {
        &self.landing_path
    }
}

/// Segment-aware prefix match: `/account` matches `/account` and
/// `/account/settings`, not `/accountant`.
fn prefix_match(path: &str, prefix: &str) -> bool {
    path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Middleware enforcing the route class against the current session.
pub async fn session_guard(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let matcher = state.routes.load_full();
    let class = matcher.classify(request.uri().path());
    if class == RouteClass::Public {
        return next.run(request).await;
    }

    let cookie_header = request
        .headers()
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_owned())
        .unwrap_or_default();
    let lookup = resolve_session(&state, &cookie_header).await;

    match (class, lookup) {
        (RouteClass::Protected, None) => {
            let original = request
                .uri()
                .path_and_query()
                .map(|pq| pq.as_str())
                .unwrap_or("/");
            tracing::debug!(path = %original, "Unauthenticated request to protected path");
            metrics::record_guard_redirect("login");
            Redirect::temporary(&matcher.login_redirect(original)).into_response()
        }
        (RouteClass::Protected, Some(lookup)) => {
            let mut request = request;
            request.extensions_mut().insert(lookup.user.clone());
            let mut response = next.run(request).await;
            refresh_cookies(&mut response, &lookup.refreshed_cookies);
            response
        }
        (RouteClass::AuthOnly, Some(_)) => {
            metrics::record_guard_redirect("landing");
            Redirect::temporary(matcher.landing_path()).into_response()
        }
        (RouteClass::AuthOnly, None) => next.run(request).await,
        (RouteClass::Public, _) => unreachable!("public paths returned above"),
    }
}

/// Look up the session behind the request's cookies. Provider errors are
/// logged and read as "no session"; the guard never renders an error page.
async fn resolve_session(state: &AppState, cookie_header: &str) -> Option<SessionLookup> {
    if cookie_header.is_empty() {
        return None;
    }
    match state.sessions.current_user(cookie_header).await {
        Ok(lookup) => lookup,
        Err(e) => {
            tracing::warn!(error = %e, "Session lookup failed, treating as no session");
            None
        }
    }
}

/// Extract the authenticated user the guard attached to the request.
///
/// Rejects with 401 when no session was established, which only happens if
/// a handler requiring a user sits on a path the guard does not protect.
impl<S> FromRequestParts<S> for SessionUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<SessionUser>().cloned().ok_or_else(|| {
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "success": false,
                    "message": "Authentication required.",
                })),
            )
                .into_response()
        })
    }
}

/// Copy provider-refreshed cookies onto the outbound response.
fn refresh_cookies(response: &mut Response, cookies: &[String]) {
    for cookie in cookies {
        if let Ok(value) = header::HeaderValue::from_str(cookie) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher() -> RouteMatcher {
        RouteMatcher::compile(&SessionConfig::default()).unwrap()
    }

    #[test]
    fn classifies_route_classes() {
        let m = matcher();
        assert_eq!(m.classify("/"), RouteClass::Public);
        assert_eq!(m.classify("/services/skip-hire"), RouteClass::Public);
        assert_eq!(m.classify("/dashboard"), RouteClass::Protected);
        assert_eq!(m.classify("/account/settings"), RouteClass::Protected);
        assert_eq!(m.classify("/login"), RouteClass::AuthOnly);
        assert_eq!(m.classify("/register"), RouteClass::AuthOnly);
    }

    #[test]
    fn prefix_match_respects_segments() {
        let m = matcher();
        assert_eq!(m.classify("/accountant"), RouteClass::Public);
        assert_eq!(m.classify("/account"), RouteClass::Protected);
    }

    #[test]
    fn parameterized_pattern_protects_edit_pages() {
        let m = matcher();
        assert_eq!(m.classify("/requests/abc-123/edit"), RouteClass::Protected);
        assert_eq!(m.classify("/requests/abc-123"), RouteClass::Public);
        assert_eq!(m.classify("/requests/abc/123/edit"), RouteClass::Public);
    }

    #[test]
    fn login_redirect_encodes_original_path() {
        let m = matcher();
        assert_eq!(
            m.login_redirect("/dashboard"),
            "/login?redirectTo=%2Fdashboard"
        );
        assert_eq!(
            m.login_redirect("/requests/a b/edit"),
            "/login?redirectTo=%2Frequests%2Fa+b%2Fedit"
        );
    }

    #[test]
    fn bad_pattern_fails_compilation() {
        let mut config = SessionConfig::default();
        config.protected_patterns.push("(open".to_string());
        assert!(RouteMatcher::compile(&config).is_err());
    }
}
