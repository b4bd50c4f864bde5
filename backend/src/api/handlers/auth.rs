//! Authentication handlers.

use axum::{
    extract::{Extension, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};

use crate::api::handlers::users::UserResponse;
use crate::api::middleware::auth::AuthExtension;
use crate::api::SharedState;
use crate::error::{AppError, Result};
use crate::services::user_service::SYSTEM_ACTOR;

/// Create public auth routes (optional auth)
pub fn public_router() -> Router<SharedState> {
    Router::new()
        .route("/login", post(login))
        .route("/register", post(register))
}

/// Create protected auth routes (auth required)
pub fn protected_router() -> Router<SharedState> {
    Router::new().route("/me", get(get_current_user))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub login: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub login: String,
    pub user_name: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegisterError {
    pub error: String,
}

/// Exchange credentials for a bearer token
#[utoipa::path(
    post,
    path = "/login",
    context_path = "/api/auth",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = LoginResponse),
        (status = 401, description = "Invalid credentials"),
    )
)]
pub async fn login(
    State(state): State<SharedState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Response> {
    match state.auth.login(&payload.login, &payload.password).await? {
        Some((_, issued)) => Ok(Json(LoginResponse {
            token: issued.token,
        })
        .into_response()),
        None => Ok(StatusCode::UNAUTHORIZED.into_response()),
    }
}

/// Register an employee account
#[utoipa::path(
    post,
    path = "/register",
    context_path = "/api/auth",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Account created"),
        (status = 400, description = "Login already taken", body = RegisterError),
    )
)]
pub async fn register(
    State(state): State<SharedState>,
    Extension(caller): Extension<Option<AuthExtension>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Response> {
    let acting_user_id = caller.map_or(SYSTEM_ACTOR, |auth| auth.user_id);

    match state
        .users
        .create_user(
            acting_user_id,
            &payload.login,
            &payload.user_name,
            &payload.password,
        )
        .await
    {
        Ok(_) => Ok(StatusCode::OK.into_response()),
        Err(AppError::DuplicateIdentity(error)) => {
            Ok((StatusCode::BAD_REQUEST, Json(RegisterError { error })).into_response())
        }
        Err(e) => Err(e),
    }
}

/// Current principal
#[utoipa::path(
    get,
    path = "/me",
    context_path = "/api/auth",
    tag = "auth",
    responses(
        (status = 200, description = "Signed-in user", body = UserResponse),
        (status = 401, description = "Not signed in"),
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_current_user(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
) -> Result<Json<UserResponse>> {
    let user = state.users.get_user(auth.user_id).await?;
    Ok(Json(user.into()))
}

#[derive(OpenApi)]
#[openapi(
    paths(login, register, get_current_user),
    components(schemas(LoginRequest, LoginResponse, RegisterRequest, RegisterError))
)]
pub struct AuthApiDoc;
