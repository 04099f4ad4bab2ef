use axum::{routing::get, Json, Router};
use common::{types::Health, UpstreamClient};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::{loaders, proxy};

/// Shared per-request state: the upstream client and the fixed user id that
/// parameterizes most upstream paths.
#[derive(Clone)]
pub struct ServerState {
    pub upstream: UpstreamClient,
    pub user_id: String,
}

pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

/// Build the full application router: proxy endpoints under `/api`, page
/// loaders on their page paths, plus health.
pub fn build_router(state: ServerState, cors: CorsLayer) -> Router {
    let api = Router::new()
        .route(
            "/api/files",
            get(proxy::list_files)
                .post(proxy::upload_dataset)
                .delete(proxy::delete_file),
        )
        .route("/api/files/data", get(proxy::project_data))
        .route("/api/headers/column_headers", get(proxy::column_headers));

    let pages = Router::new()
        .route("/", get(loaders::files))
        .route("/Transactions", get(loaders::transactions))
        .route("/SavedRules", get(loaders::saved_rules))
        .route("/admin/AssetClass", get(loaders::asset_classes))
        .route("/admin/Transactions", get(loaders::system_transaction_columns))
        .route("/DebtSheet/file_overview/:file", get(loaders::file_overview))
        .route("/DebtSheet/Tagging/:file", get(loaders::tagging))
        .route("/Transactions/custom_rules/:file", get(loaders::custom_rules))
        .route("/Transactions/rbi_guidelines/:file", get(loaders::rbi_guidelines));

    Router::new()
        .route("/health", get(health))
        .merge(api)
        .merge(pages)
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(
                    DefaultMakeSpan::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
