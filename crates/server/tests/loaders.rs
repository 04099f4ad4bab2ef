use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use axum::extract::Path;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use common::UpstreamClient;
use serde_json::{json, Value};
use server::routes::{build_router, ServerState};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

async fn serve(router: Router) -> anyhow::Result<String> {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await?;
    let addr: SocketAddr = listener.local_addr()?;
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            eprintln!("test server error: {e}");
        }
    });
    Ok(format!("http://{}:{}", addr.ip(), addr.port()))
}

async fn start_app(upstream_base: &str) -> anyhow::Result<String> {
    let upstream = UpstreamClient::new(upstream_base, Duration::from_secs(5))?;
    let state = ServerState { upstream, user_id: "u1".into() };
    serve(build_router(state, CorsLayer::very_permissive())).await
}

async fn dead_upstream() -> anyhow::Result<String> {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await?;
    let addr = listener.local_addr()?;
    drop(listener);
    Ok(format!("http://{}:{}", addr.ip(), addr.port()))
}

fn client() -> reqwest::Client {
    reqwest::Client::new()
}

#[tokio::test]
async fn files_loader_folds_failure_into_bag() -> anyhow::Result<()> {
    let app = start_app(&dead_upstream().await?).await?;
    // Loader contract: failures surface inside the bag, never as a status.
    let res = client().get(format!("{app}/")).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["files"], json!([]));
    assert!(body["error"].is_string());
    Ok(())
}

#[tokio::test]
async fn files_loader_returns_files_bag() -> anyhow::Result<()> {
    let upstream = Router::new().route(
        "/project/get_projects/:user",
        get(|| async { Json(json!([{"id": 1, "name": "Q1"}])) }),
    );
    let app = start_app(&serve(upstream).await?).await?;

    let res = client().get(format!("{app}/")).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body, json!({"files": [{"id": 1, "name": "Q1"}]}));
    Ok(())
}

#[tokio::test]
async fn saved_rules_loader_uses_fixed_status_message() -> anyhow::Result<()> {
    let upstream = Router::new().route(
        "/rules_book_debt/get_all_rules/:user",
        get(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
    );
    let app = start_app(&serve(upstream).await?).await?;

    let res = client().get(format!("{app}/SavedRules")).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["rules"], json!([]));
    assert_eq!(body["error"], "Failed to fetch initial Rules data");
    Ok(())
}

#[tokio::test]
async fn transactions_loader_returns_files_bag() -> anyhow::Result<()> {
    let upstream = Router::new().route(
        "/transaction/get_all_transactions/:user",
        get(|Path(user): Path<String>| async move {
            assert_eq!(user, "u1");
            Json(json!([{"id": 10}]))
        }),
    );
    let app = start_app(&serve(upstream).await?).await?;

    let res = client().get(format!("{app}/Transactions")).send().await?;
    let body = res.json::<Value>().await?;
    assert_eq!(body, json!({"files": [{"id": 10}]}));
    Ok(())
}

#[tokio::test]
async fn admin_loaders_relay_bag_or_fall_back_to_settings() -> anyhow::Result<()> {
    let upstream = Router::new().route(
        "/admin/get_asset_classes",
        get(|| async { Json(json!({"settings": [{"class": "secured"}]})) }),
    );
    let app = start_app(&serve(upstream).await?).await?;

    let res = client().get(format!("{app}/admin/AssetClass")).send().await?;
    assert_eq!(res.json::<Value>().await?, json!({"settings": [{"class": "secured"}]}));

    // No route for system columns on this mock, so the loader falls back.
    let res = client().get(format!("{app}/admin/Transactions")).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["settings"], json!([]));
    assert_eq!(body["error"], "Error fetching data from server side");
    Ok(())
}

#[tokio::test]
async fn file_overview_wraps_data_in_result_envelope() -> anyhow::Result<()> {
    let upstream = Router::new().route(
        "/project/get_project_data/:id",
        get(|Path(id): Path<String>| async move {
            assert_eq!(id, "15");
            Json(json!({"rows": [1, 2]}))
        }),
    );
    let app = start_app(&serve(upstream).await?).await?;

    let res = client()
        .get(format!("{app}/DebtSheet/file_overview/15"))
        .send()
        .await?;
    let body = res.json::<Value>().await?;
    assert_eq!(body, json!({"result": {"success": true, "data": {"rows": [1, 2]}}}));
    Ok(())
}

#[tokio::test]
async fn file_overview_failure_sets_success_false() -> anyhow::Result<()> {
    let app = start_app(&dead_upstream().await?).await?;
    let res = client()
        .get(format!("{app}/DebtSheet/file_overview/15"))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["result"]["success"], json!(false));
    assert!(body["result"]["error"].is_string());
    Ok(())
}

#[tokio::test]
async fn tagging_loader_posts_filename_from_route() -> anyhow::Result<()> {
    let upstream = Router::new().route(
        "/analyze_tags",
        post(|Json(body): Json<Value>| async move {
            assert_eq!(body["filename"], "q1.csv");
            assert_eq!(body["tag_column"], "Tags");
            assert_eq!(body["tag_type_column"], "Tag Type");
            Json(json!({"tag_groups": [{"tag": "EMI", "count": 3}]}))
        }),
    );
    let app = start_app(&serve(upstream).await?).await?;

    let res = client()
        .get(format!("{app}/DebtSheet/Tagging/q1.csv"))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["tag_groups"][0]["tag"], "EMI");
    Ok(())
}

#[tokio::test]
async fn custom_rules_loader_spreads_upstream_bag() -> anyhow::Result<()> {
    let upstream = Router::new().route(
        "/transaction_dataset/fetch_all_rule_versions/:id",
        get(|| async { Json(json!({"versions": [1, 2, 3], "active": 3})) }),
    );
    let app = start_app(&serve(upstream).await?).await?;

    let res = client()
        .get(format!("{app}/Transactions/custom_rules/15"))
        .send()
        .await?;
    let body = res.json::<Value>().await?;
    assert_eq!(body, json!({"result": {"versions": [1, 2, 3], "active": 3}}));
    Ok(())
}

#[tokio::test]
async fn rbi_guidelines_loader_uses_result_envelope() -> anyhow::Result<()> {
    let upstream = Router::new().route(
        "/transaction/get_transaction_data/:id",
        get(|| async { Json(json!({"transactions": []})) }),
    );
    let app = start_app(&serve(upstream).await?).await?;

    let res = client()
        .get(format!("{app}/Transactions/rbi_guidelines/15"))
        .send()
        .await?;
    let body = res.json::<Value>().await?;
    assert_eq!(body, json!({"result": {"success": true, "data": {"transactions": []}}}));
    Ok(())
}
