//! Authentication and role guard middleware.
//!
//! `auth_middleware` re-derives the principal from the bearer token on every
//! request; `require_admin` and `require_employee` then check its role.
//! Guards must be layered inside the auth layer.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};

use crate::api::SharedState;
use crate::error::AppError;
use crate::models::user::Role;
use crate::session::AuthState;

/// Extension that holds the authenticated principal
#[derive(Debug, Clone)]
pub struct AuthExtension {
    pub user_id: i32,
    pub login: String,
    pub role: Role,
    pub expires_at: DateTime<Utc>,
}

/// Extract a bearer token from the Authorization header
fn extract_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn authenticate(state: &SharedState, request: &Request) -> AuthState {
    AuthState::derive(extract_token(request), state.tokens.as_ref(), Utc::now())
}

fn to_extension(state: AuthState) -> Result<AuthExtension, &'static str> {
    match state {
        AuthState::Authenticated { claims, expires_at } => Ok(AuthExtension {
            user_id: claims.sub,
            login: claims.name,
            role: claims.role,
            expires_at,
        }),
        AuthState::Anonymous {
            reason: Some(reason),
        } => Err(reason.message()),
        AuthState::Anonymous { reason: None } => Err("Missing bearer token"),
    }
}

/// Requires a valid token
pub async fn auth_middleware(
    State(state): State<SharedState>,
    mut request: Request,
    next: Next,
) -> Response {
    match to_extension(authenticate(&state, &request)) {
        Ok(auth) => {
            request.extensions_mut().insert(auth);
            next.run(request).await
        }
        Err(message) => AppError::Authentication(message.to_string()).into_response(),
    }
}

/// Attaches `Option<AuthExtension>`; anonymous requests proceed.
pub async fn optional_auth_middleware(
    State(state): State<SharedState>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth = to_extension(authenticate(&state, &request)).ok();
    request.extensions_mut().insert(auth);
    next.run(request).await
}

async fn require_role(request: Request, next: Next, allowed: &[Role]) -> Response {
    let denied = match request.extensions().get::<AuthExtension>() {
        None => Some(AppError::Authentication(
            "Authentication required".to_string(),
        )),
        Some(auth) if !auth.role.is_any_of(allowed) => {
            tracing::warn!(
                user_id = auth.user_id,
                role = %auth.role,
                path = %request.uri().path(),
                "Role not permitted"
            );
            Some(AppError::Authorization("Insufficient role".to_string()))
        }
        Some(_) => None,
    };

    match denied {
        Some(rejection) => rejection.into_response(),
        None => next.run(request).await,
    }
}

/// Admin only
pub async fn require_admin(request: Request, next: Next) -> Response {
    require_role(request, next, &[Role::Admin]).await
}

/// Employee or above
pub async fn require_employee(request: Request, next: Next) -> Response {
    require_role(request, next, &[Role::Employee, Role::Admin]).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn test_extract_bearer_token() {
        let request = Request::builder()
            .header(AUTHORIZATION, "Bearer abc.def.ghi")
            .body(Body::empty())
            .unwrap();
        assert_eq!(extract_token(&request), Some("abc.def.ghi"));
    }

    #[test]
    fn test_extract_ignores_other_schemes() {
        let request = Request::builder()
            .header(AUTHORIZATION, "Basic dXNlcjpwYXNz")
            .body(Body::empty())
            .unwrap();
        assert_eq!(extract_token(&request), None);

        let bare = Request::builder().body(Body::empty()).unwrap();
        assert_eq!(extract_token(&bare), None);
    }

    #[test]
    fn test_anonymous_without_reason_message() {
        assert_eq!(
            to_extension(AuthState::Anonymous { reason: None }).unwrap_err(),
            "Missing bearer token"
        );
    }
}
