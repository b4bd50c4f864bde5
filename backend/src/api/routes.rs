//! Route definitions for the API.

use axum::{middleware, routing::get, Json, Router};

use super::handlers;
use super::middleware::auth::{
    auth_middleware, optional_auth_middleware, require_admin, require_employee,
};
use super::SharedState;

/// Create the main API router
pub fn create_router(state: SharedState) -> Router {
    let openapi = super::openapi::build_openapi();

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route(
            "/api/openapi.json",
            get(move || {
                let doc = openapi.clone();
                async move { Json(doc) }
            }),
        )
        .nest("/api", api_routes(state.clone()))
        .with_state(state)
}

fn api_routes(state: SharedState) -> Router<SharedState> {
    // Layers run bottom-up: authentication before the role guard.
    let employee = |router: Router<SharedState>| {
        router
            .layer(middleware::from_fn(require_employee))
            .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
    };
    let admin = |router: Router<SharedState>| {
        router
            .layer(middleware::from_fn(require_admin))
            .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
    };

    Router::new()
        .nest(
            "/auth",
            handlers::auth::public_router().layer(middleware::from_fn_with_state(
                state.clone(),
                optional_auth_middleware,
            )),
        )
        .nest("/auth", employee(handlers::auth::protected_router()))
        .nest("/customers", employee(handlers::customers::router()))
        .nest("/users", admin(handlers::users::router()))
        .nest("/audit", admin(handlers::audit::router()))
}
