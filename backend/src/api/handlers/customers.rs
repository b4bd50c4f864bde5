//! Customer ledger handlers.

use axum::{
    extract::{Extension, Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};

use crate::api::dto::{Pagination, PaginationQuery};
use crate::api::middleware::auth::AuthExtension;
use crate::api::SharedState;
use crate::error::Result;
use crate::models::audit_log::AuditRecord;
use crate::models::customer::Customer;

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", get(list_customers).post(create_customer))
        .route("/:id", get(get_customer).put(update_customer))
        .route("/:id/balance/increase", post(increase_balance))
        .route("/:id/balance/withdraw", post(withdraw_balance))
        .route("/:id/audit", get(customer_audit))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CustomerListResponse {
    pub items: Vec<Customer>,
    pub pagination: Pagination,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCustomerRequest {
    pub name: String,
    pub phone: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCustomerRequest {
    pub name: String,
    pub phone_last_four_digits: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct BalanceChangeRequest {
    /// Positive number of points
    pub amount: Decimal,
}

/// Customers, newest first
#[utoipa::path(
    get,
    path = "",
    context_path = "/api/customers",
    tag = "customers",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Page of customers", body = CustomerListResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_customers(
    State(state): State<SharedState>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<CustomerListResponse>> {
    let (page, page_size) = query.resolve();
    let items = state.customers.list_customers(page, page_size).await?;
    let total = state.customers.count_customers().await?;

    Ok(Json(CustomerListResponse {
        items,
        pagination: Pagination::new(page, page_size, total),
    }))
}

/// Register a customer
#[utoipa::path(
    post,
    path = "",
    context_path = "/api/customers",
    tag = "customers",
    request_body = CreateCustomerRequest,
    responses(
        (status = 200, description = "Customer created", body = Customer),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Phone number already registered"),
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_customer(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
    Json(payload): Json<CreateCustomerRequest>,
) -> Result<Json<Customer>> {
    let customer = state
        .customers
        .create_customer(auth.user_id, &payload.name, &payload.phone)
        .await?;
    Ok(Json(customer))
}

/// Fetch one customer
#[utoipa::path(
    get,
    path = "/{id}",
    context_path = "/api/customers",
    tag = "customers",
    params(("id" = i32, Path, description = "Customer ID")),
    responses(
        (status = 200, description = "Customer", body = Customer),
        (status = 404, description = "Customer not found"),
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_customer(
    State(state): State<SharedState>,
    Path(id): Path<i32>,
) -> Result<Json<Customer>> {
    Ok(Json(state.customers.get_customer(id).await?))
}

/// Edit name and redacted phone
#[utoipa::path(
    put,
    path = "/{id}",
    context_path = "/api/customers",
    tag = "customers",
    params(("id" = i32, Path, description = "Customer ID")),
    request_body = UpdateCustomerRequest,
    responses(
        (status = 200, description = "Customer updated", body = Customer),
        (status = 404, description = "Customer not found"),
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_customer(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateCustomerRequest>,
) -> Result<Json<Customer>> {
    let customer = state
        .customers
        .edit_customer(auth.user_id, id, &payload.name, &payload.phone_last_four_digits)
        .await?;
    Ok(Json(customer))
}

/// Credit points
#[utoipa::path(
    post,
    path = "/{id}/balance/increase",
    context_path = "/api/customers",
    tag = "customers",
    params(("id" = i32, Path, description = "Customer ID")),
    request_body = BalanceChangeRequest,
    responses(
        (status = 200, description = "Balance credited", body = Customer),
        (status = 400, description = "Amount not positive"),
        (status = 404, description = "Customer not found"),
    ),
    security(("bearer_auth" = []))
)]
pub async fn increase_balance(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
    Path(id): Path<i32>,
    Json(payload): Json<BalanceChangeRequest>,
) -> Result<Json<Customer>> {
    let customer = state
        .customers
        .increase_balance(auth.user_id, id, payload.amount)
        .await?;
    Ok(Json(customer))
}

/// Debit points
#[utoipa::path(
    post,
    path = "/{id}/balance/withdraw",
    context_path = "/api/customers",
    tag = "customers",
    params(("id" = i32, Path, description = "Customer ID")),
    request_body = BalanceChangeRequest,
    responses(
        (status = 200, description = "Balance debited", body = Customer),
        (status = 404, description = "Customer not found"),
        (status = 409, description = "Insufficient funds"),
    ),
    security(("bearer_auth" = []))
)]
pub async fn withdraw_balance(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
    Path(id): Path<i32>,
    Json(payload): Json<BalanceChangeRequest>,
) -> Result<Json<Customer>> {
    let customer = state
        .customers
        .withdraw_balance(auth.user_id, id, payload.amount)
        .await?;
    Ok(Json(customer))
}

/// Audit trail of one customer
#[utoipa::path(
    get,
    path = "/{id}/audit",
    context_path = "/api/customers",
    tag = "customers",
    params(("id" = i32, Path, description = "Customer ID")),
    responses(
        (status = 200, description = "Audit entries, newest first", body = Vec<AuditRecord>),
    ),
    security(("bearer_auth" = []))
)]
pub async fn customer_audit(
    State(state): State<SharedState>,
    Path(id): Path<i32>,
) -> Result<Json<Vec<AuditRecord>>> {
    Ok(Json(state.audit.list_by_customer(id).await?))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        list_customers,
        create_customer,
        get_customer,
        update_customer,
        increase_balance,
        withdraw_balance,
        customer_audit,
    ),
    components(schemas(
        Customer,
        CustomerListResponse,
        CreateCustomerRequest,
        UpdateCustomerRequest,
        BalanceChangeRequest,
        Pagination,
    ))
)]
pub struct CustomersApiDoc;
