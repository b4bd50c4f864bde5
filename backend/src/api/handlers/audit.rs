//! Audit trail handlers (admin only).

use axum::{extract::State, routing::get, Json, Router};
use utoipa::OpenApi;

use crate::api::SharedState;
use crate::error::Result;
use crate::models::audit_log::{AuditAction, AuditCustomer, AuditEntry, AuditRecord, AuditUser};

pub fn router() -> Router<SharedState> {
    Router::new().route("/", get(list_audit))
}

/// Entire audit trail, newest first
#[utoipa::path(
    get,
    path = "",
    context_path = "/api/audit",
    tag = "audit",
    responses(
        (status = 200, description = "Audit entries", body = Vec<AuditRecord>),
        (status = 403, description = "Admin role required"),
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_audit(State(state): State<SharedState>) -> Result<Json<Vec<AuditRecord>>> {
    Ok(Json(state.audit.list_all().await?))
}

#[derive(OpenApi)]
#[openapi(
    paths(list_audit),
    components(schemas(AuditRecord, AuditEntry, AuditAction, AuditUser, AuditCustomer))
)]
pub struct AuditApiDoc;
