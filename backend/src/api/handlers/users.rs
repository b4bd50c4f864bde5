//! Staff account management handlers (admin only).

use axum::{
    extract::{Extension, Path, State},
    routing::{get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};

use crate::api::middleware::auth::AuthExtension;
use crate::api::SharedState;
use crate::error::Result;
use crate::models::audit_log::AuditRecord;
use crate::models::user::{Role, User};

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/:id/role", put(change_role))
        .route("/:id/audit", get(user_audit))
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: i32,
    pub login: String,
    pub user_name: String,
    pub role: Role,
    /// Human-readable role label
    pub role_name: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            role_name: user.role.display_name().to_string(),
            login: user.login,
            user_name: user.user_name,
            role: user.role,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    pub login: String,
    pub user_name: String,
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChangeRoleRequest {
    pub role: Role,
}

/// List staff accounts, admins first
#[utoipa::path(
    get,
    path = "",
    context_path = "/api/users",
    tag = "users",
    responses(
        (status = 200, description = "Staff accounts", body = Vec<UserResponse>),
        (status = 403, description = "Admin role required"),
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_users(State(state): State<SharedState>) -> Result<Json<Vec<UserResponse>>> {
    let users = state.users.list_users().await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// Create an employee account
#[utoipa::path(
    post,
    path = "",
    context_path = "/api/users",
    tag = "users",
    request_body = CreateUserRequest,
    responses(
        (status = 200, description = "User created", body = UserResponse),
        (status = 400, description = "Login already taken or invalid input"),
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_user(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<Json<UserResponse>> {
    let user = state
        .users
        .create_user(
            auth.user_id,
            &payload.login,
            &payload.user_name,
            &payload.password,
        )
        .await?;
    Ok(Json(user.into()))
}

/// Change a user's role
#[utoipa::path(
    put,
    path = "/{id}/role",
    context_path = "/api/users",
    tag = "users",
    params(("id" = i32, Path, description = "User ID")),
    request_body = ChangeRoleRequest,
    responses(
        (status = 200, description = "Role updated", body = UserResponse),
        (status = 404, description = "User not found"),
    ),
    security(("bearer_auth" = []))
)]
pub async fn change_role(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
    Path(id): Path<i32>,
    Json(payload): Json<ChangeRoleRequest>,
) -> Result<Json<UserResponse>> {
    let user = state.users.change_role(auth.user_id, id, payload.role).await?;
    Ok(Json(user.into()))
}

/// Actions performed by a user
#[utoipa::path(
    get,
    path = "/{id}/audit",
    context_path = "/api/users",
    tag = "users",
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "Audit entries, newest first", body = Vec<AuditRecord>),
    ),
    security(("bearer_auth" = []))
)]
pub async fn user_audit(
    State(state): State<SharedState>,
    Path(id): Path<i32>,
) -> Result<Json<Vec<AuditRecord>>> {
    Ok(Json(state.audit.list_by_user(id).await?))
}

#[derive(OpenApi)]
#[openapi(
    paths(list_users, create_user, change_role, user_audit),
    components(schemas(UserResponse, CreateUserRequest, ChangeRoleRequest, Role))
)]
pub struct UsersApiDoc;
