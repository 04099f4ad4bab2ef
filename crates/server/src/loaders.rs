//! Page loaders. Each one runs before a page renders, fetches its upstream
//! resource, and returns the data bag the template reads. Loaders never fail
//! past their boundary: every error is folded into the bag (empty collection
//! plus an `error` string) and the HTTP status stays 200.

use axum::extract::{Path, State};
use axum::Json;
use common::ProxyError;
use serde_json::{json, Value};
use tracing::warn;

use crate::routes::ServerState;

/// Loader fallback message: a fixed string for upstream-status failures (the
/// status code is an implementation detail to the page), the error's own
/// message otherwise.
fn fallback_message(e: &ProxyError, on_status: &str) -> String {
    match e {
        ProxyError::Upstream { .. } => on_status.to_string(),
        other => other.to_string(),
    }
}

/// `/` — the home page lists the user's uploaded files.
pub async fn files(State(state): State<ServerState>) -> Json<Value> {
    let path = format!("project/get_projects/{}", state.user_id);
    match state.upstream.get_json(&path).await {
        Ok(fwd) => Json(json!({ "files": fwd.body })),
        Err(e) => {
            warn!(error = %e, "files loader failed");
            Json(json!({
                "files": [],
                "error": fallback_message(&e, "Failed to fetch initial files data"),
            }))
        }
    }
}

/// `/Transactions` — all transactions for the configured user.
pub async fn transactions(State(state): State<ServerState>) -> Json<Value> {
    let path = format!("transaction/get_all_transactions/{}", state.user_id);
    match state.upstream.get_json(&path).await {
        Ok(fwd) => Json(json!({ "files": fwd.body })),
        Err(e) => {
            warn!(error = %e, "transactions loader failed");
            Json(json!({
                "files": [],
                "error": fallback_message(&e, "Failed to fetch initial files data"),
            }))
        }
    }
}

/// `/SavedRules` — the user's saved rule book.
pub async fn saved_rules(State(state): State<ServerState>) -> Json<Value> {
    let path = format!("rules_book_debt/get_all_rules/{}", state.user_id);
    match state.upstream.get_json(&path).await {
        Ok(fwd) => Json(json!({ "rules": fwd.body })),
        Err(e) => {
            warn!(error = %e, "saved rules loader failed");
            Json(json!({
                "rules": [],
                "error": fallback_message(&e, "Failed to fetch initial Rules data"),
            }))
        }
    }
}

/// `/admin/AssetClass` — asset-class settings; the upstream bag is relayed
/// as-is on success.
pub async fn asset_classes(State(state): State<ServerState>) -> Json<Value> {
    admin_settings(&state, "admin/get_asset_classes").await
}

/// `/admin/Transactions` — system transaction-column settings.
pub async fn system_transaction_columns(State(state): State<ServerState>) -> Json<Value> {
    admin_settings(&state, "admin/get_system_transaction_columns").await
}

async fn admin_settings(state: &ServerState, path: &str) -> Json<Value> {
    match state.upstream.get_json(path).await {
        Ok(fwd) => Json(fwd.body),
        Err(e) => {
            warn!(error = %e, path, "admin settings loader failed");
            Json(json!({
                "settings": [],
                "error": "Error fetching data from server side",
            }))
        }
    }
}

/// `/DebtSheet/file_overview/:file` — full project data wrapped in a
/// `{result: {success, data|error}}` envelope.
pub async fn file_overview(
    State(state): State<ServerState>,
    Path(file): Path<String>,
) -> Json<Value> {
    let path = format!("project/get_project_data/{file}");
    match state.upstream.get_json(&path).await {
        Ok(fwd) => Json(json!({ "result": { "success": true, "data": fwd.body } })),
        Err(e) => {
            warn!(error = %e, project_id = %file, "file overview loader failed");
            Json(json!({
                "result": {
                    "success": false,
                    "error": fallback_message(&e, "Failed to fetch file data"),
                }
            }))
        }
    }
}

/// `/DebtSheet/Tagging/:file` — tag analysis for one dataset. The filename
/// comes from the route parameter; the tag column names are fixed by the UI.
pub async fn tagging(
    State(state): State<ServerState>,
    Path(file): Path<String>,
) -> Json<Value> {
    let body = json!({
        "filename": file,
        "tag_column": "Tags",
        "tag_type_column": "Tag Type",
    });
    match state.upstream.post_json("analyze_tags", &body).await {
        Ok(fwd) => Json(fwd.body),
        Err(e) => {
            warn!(error = %e, filename = %file, "tagging loader failed");
            Json(json!({
                "tag_groups": [],
                "error": fallback_message(&e, "Failed to fetch tag data"),
            }))
        }
    }
}

/// `/Transactions/custom_rules/:file` — every rule version for a project,
/// spread directly into the `result` bag.
pub async fn custom_rules(
    State(state): State<ServerState>,
    Path(file): Path<String>,
) -> Json<Value> {
    let path = format!("transaction_dataset/fetch_all_rule_versions/{file}");
    match state.upstream.get_json(&path).await {
        Ok(fwd) => Json(json!({ "result": fwd.body })),
        Err(e) => {
            warn!(error = %e, project_id = %file, "custom rules loader failed");
            Json(json!({
                "result": {
                    "success": false,
                    "error": fallback_message(&e, "Failed to fetch file data"),
                }
            }))
        }
    }
}

/// `/Transactions/rbi_guidelines/:file` — transaction data for the RBI
/// guidelines page, `{result: {success, data|error}}` shaped.
pub async fn rbi_guidelines(
    State(state): State<ServerState>,
    Path(file): Path<String>,
) -> Json<Value> {
    let path = format!("transaction/get_transaction_data/{file}");
    match state.upstream.get_json(&path).await {
        Ok(fwd) => Json(json!({ "result": { "success": true, "data": fwd.body } })),
        Err(e) => {
            warn!(error = %e, project_id = %file, "rbi guidelines loader failed");
            Json(json!({
                "result": {
                    "success": false,
                    "error": fallback_message(&e, "Failed to fetch file data"),
                }
            }))
        }
    }
}
