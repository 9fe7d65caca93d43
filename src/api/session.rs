use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use std::convert::Infallible;
use std::sync::Arc;
use tower_sessions::Session;

use super::{ApiError, AppState};
use crate::auth::{self, Permission, SessionClaims};

/// Server-side session key holding the signed session token.
pub const SESSION_TOKEN_KEY: &str = "session_token";

/// The caller's decoded session, injected into every request.
///
/// Absent, expired and tampered tokens all produce an anonymous context.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    claims: Option<Arc<SessionClaims>>,
}

impl SessionContext {
    #[must_use]
    pub fn new(claims: Option<SessionClaims>) -> Self {
        Self {
            claims: claims.map(Arc::new),
        }
    }

    #[must_use]
    pub fn claims(&self) -> Option<&SessionClaims> {
        self.claims.as_deref()
    }

    /// The signed-in member's claims and id.
    pub fn require_member(&self) -> Result<(i32, &SessionClaims), ApiError> {
        let claims = self
            .claims()
            .ok_or_else(|| ApiError::unauthorized("Not authenticated"))?;
        let user_id = claims
            .user_id()
            .ok_or_else(|| ApiError::unauthorized("Invalid session subject"))?;
        Ok((user_id, claims))
    }

    /// Any signed-in member holding admin access.
    pub fn require_admin_access(&self) -> Result<&SessionClaims, ApiError> {
        let (user_id, claims) = self.require_member()?;
        if !auth::has_admin_access(&claims.admin_roles) {
            tracing::warn!(user_id, "Admin access denied");
            return Err(ApiError::unauthorized("Unauthorized"));
        }
        Ok(claims)
    }

    pub fn require(&self, permission: Permission) -> Result<&SessionClaims, ApiError> {
        let (user_id, claims) = self.require_member()?;
        if !auth::has_permission(&claims.admin_roles, permission) {
            tracing::warn!(user_id, %permission, "Permission denied");
            return Err(ApiError::unauthorized("Unauthorized"));
        }
        Ok(claims)
    }
}

impl<S: Send + Sync> FromRequestParts<S> for SessionContext {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<Self>()
            .cloned()
            .unwrap_or_default())
    }
}

/// Decodes the caller's session token, from `Authorization: Bearer` or the
/// session cookie, and attaches a [`SessionContext`] to the request.
pub async fn session_context_middleware(
    State(state): State<Arc<AppState>>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Response {
    let token = match bearer_token(request.headers()) {
        Some(token) => Some(token),
        None => session
            .get::<String>(SESSION_TOKEN_KEY)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!("Session store error: {e}");
                None
            }),
    };

    let claims = token.and_then(|token| match state.sessions().decode(&token) {
        Ok(claims) => Some(claims),
        Err(e) => {
            tracing::debug!("Ignoring session token: {e}");
            None
        }
    });

    if let Some(claims) = &claims {
        tracing::Span::current().record("user_id", claims.sub.as_str());
    }

    request.extensions_mut().insert(SessionContext::new(claims));
    next.run(request).await
}

/// Applies the path-based access rules before any page or handler runs.
pub async fn route_gate_middleware(
    session: SessionContext,
    request: Request,
    next: Next,
) -> Response {
    // Classify the path the static file service will actually resolve.
    let Some(path) = auth::normalize_path(request.uri().path()) else {
        tracing::warn!(path = request.uri().path(), "Rejected unresolvable request path");
        return ApiError::validation("Invalid request path").into_response();
    };
    let decision = auth::decide(&path, session.claims());

    match decision.location() {
        None => next.run(request).await,
        Some(location) => {
            tracing::debug!(path = %path, location, ?decision, "Route gate redirect");
            Redirect::temporary(location).into_response()
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get("Authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AdminRole, MemberType};
    use axum::http::HeaderValue;

    fn claims(sub: &str, admin_roles: Vec<AdminRole>) -> SessionClaims {
        SessionClaims {
            sub: sub.into(),
            member_type: MemberType::Primary,
            admin_roles,
            iss: "guildhall".into(),
            iat: 0,
            exp: i64::MAX,
        }
    }

    #[test]
    fn test_bearer_token() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert("Authorization", HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers), Some("abc.def".to_string()));

        headers.insert("Authorization", HeaderValue::from_static("Basic xyz"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert("Authorization", HeaderValue::from_static("Bearer   "));
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn test_anonymous_context() {
        let ctx = SessionContext::default();
        assert!(ctx.claims().is_none());
        assert!(ctx.require_member().is_err());
        assert!(ctx.require(Permission::MembersRead).is_err());
    }

    #[test]
    fn test_member_context() {
        let ctx = SessionContext::new(Some(claims("7", vec![])));
        assert_eq!(ctx.require_member().unwrap().0, 7);
        assert!(ctx.require(Permission::MembersApprove).is_err());
    }

    #[test]
    fn test_admin_context() {
        let ctx = SessionContext::new(Some(claims("1", vec![AdminRole::SuperAdmin])));
        assert!(ctx.require(Permission::MembersApprove).is_ok());
        assert!(ctx.require_admin_access().is_ok());
    }

    #[test]
    fn test_news_admin_lacks_admin_access() {
        let ctx = SessionContext::new(Some(claims("3", vec![AdminRole::NewsAdmin])));
        assert!(ctx.require_admin_access().is_err());
        assert!(SessionContext::default().require_admin_access().is_err());
    }

    #[test]
    fn test_foreign_subject_is_rejected() {
        let ctx = SessionContext::new(Some(claims("not-a-number", vec![AdminRole::SuperAdmin])));
        assert!(ctx.require_member().is_err());
    }
}
