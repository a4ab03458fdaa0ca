use axum::routing::{get, post};
use axum::Router;

use boxoffice_application::AppState;

use crate::handlers::{ops_handlers, transaction_handlers};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/transaction/create",
            post(transaction_handlers::create_purchase),
        )
        .route(
            "/api/transaction/admin/all",
            get(transaction_handlers::list_all_transactions),
        )
        .route(
            "/api/transaction/user/:usuario_id",
            get(transaction_handlers::list_purchaser_transactions),
        )
        .route(
            "/api/transaction/:id",
            get(transaction_handlers::get_transaction_by_id),
        )
        .route("/ops/health/live", get(ops_handlers::health_live))
        .route("/ops/health/ready", get(ops_handlers::health_ready))
        .route(
            "/ops/metrics/prometheus",
            get(ops_handlers::metrics_prometheus),
        )
        .with_state(state)
}
