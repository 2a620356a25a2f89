//! Basic integration tests for the Beacon HTTP surface over a real socket.

#[path = "test_utils/mod.rs"]
mod test_utils;

use reqwest::Client;
use serde_json::{Value, json};
use test_utils::*;
use tokio::net::TcpListener;

/// Start the app on a random local port and return its base URL
async fn start_test_server() -> anyhow::Result<String> {
    let db = setup_test_db().await?;
    let app = test_app(test_config(), db)?;

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    Ok(format!("http://{}", addr))
}

#[tokio::test]
async fn test_root_endpoint() -> anyhow::Result<()> {
    let server_url = start_test_server().await?;

    let response = Client::new().get(format!("{}/", server_url)).send().await?;

    assert_eq!(response.status(), 200);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/json"
    );
    let body: Value = response.json().await?;
    assert_eq!(body["service"], "beacon");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));

    Ok(())
}

#[tokio::test]
async fn test_health_endpoints() -> anyhow::Result<()> {
    let server_url = start_test_server().await?;
    let client = Client::new();

    let healthz = client.get(format!("{}/healthz", server_url)).send().await?;
    assert_eq!(healthz.status(), 200);
    let body: Value = healthz.json().await?;
    assert_eq!(body["status"], "ok");

    let readyz = client.get(format!("{}/readyz", server_url)).send().await?;
    assert_eq!(readyz.status(), 200);
    let body: Value = readyz.json().await?;
    assert_eq!(body["status"], "ready");

    Ok(())
}

#[tokio::test]
async fn test_openapi_endpoint() -> anyhow::Result<()> {
    let server_url = start_test_server().await?;

    let response = Client::new()
        .get(format!("{}/openapi.json", server_url))
        .send()
        .await?;
    assert_eq!(response.status(), 200);

    let spec: Value = response.json().await?;
    assert_eq!(spec["info"]["title"], "Beacon API");
    assert!(spec["components"]["securitySchemes"]["bearer_auth"].is_object());

    let paths = spec["paths"].as_object().unwrap();
    for path in [
        "/api/surveys/issue",
        "/api/surveys/{token}",
        "/api/responses",
        "/api/dashboard",
        "/api/export",
        "/api/clients/{id}/thresholds",
        "/api/admin/sms/batch",
        "/api/demo/seed",
        "/api/demo/seed-balanced",
    ] {
        assert!(paths.contains_key(path), "missing {}", path);
    }

    Ok(())
}

#[tokio::test]
async fn test_unknown_route_is_not_found() -> anyhow::Result<()> {
    let server_url = start_test_server().await?;

    let response = Client::new()
        .get(format!("{}/api/nothing-here", server_url))
        .send()
        .await?;
    assert_eq!(response.status(), 404);

    Ok(())
}

#[tokio::test]
async fn test_full_round_trip_over_http() -> anyhow::Result<()> {
    let db = setup_test_db().await?;
    let client_row = create_test_client(&db).await?;
    let app = test_app(test_config(), db)?;
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let base = format!("http://{}", listener.local_addr()?);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let http = Client::new();
    let issued: Value = http
        .post(format!("{}/api/surveys/issue", base))
        .bearer_auth(ADMIN_TOKEN)
        .json(&json!({ "client_id": client_row.id }))
        .send()
        .await?
        .json()
        .await?;
    let token = issued["token"].as_str().unwrap();
    assert!(issued["url"].as_str().unwrap().starts_with(&format!("{}/survey/", base)));

    let submitted = http
        .post(format!("{}/api/responses", base))
        .json(&json!({
            "token": token,
            "sentiment_3": 2,
            "clarity_3": 2,
            "workload_3": 2,
            "safety_3": 2,
            "leadership_3": 2,
            "support_requested": true,
            "support_contact_method": "phone",
        }))
        .send()
        .await?;
    assert_eq!(submitted.status(), 201);

    let dashboard: Value = http
        .get(format!("{}/api/dashboard", base))
        .query(&[("client_id", client_row.id.to_string())])
        .bearer_auth(ADMIN_TOKEN)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(dashboard["total_responses"], 1);
    assert_eq!(dashboard["support_requests"], 1);
    assert_eq!(dashboard["wellbeing_score"], 60.0);

    Ok(())
}
