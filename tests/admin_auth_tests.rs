//! Admin route protection: bearer tokens, the login cookie and logout.

#[path = "test_utils/mod.rs"]
mod test_utils;

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use beacon::auth::session_token;
use chrono::Utc;
use serde_json::json;
use test_utils::*;

fn cookie_from(response: &TestResponse) -> String {
    response
        .headers
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .unwrap_or_default()
        .to_string()
}

#[tokio::test]
async fn admin_routes_require_credentials() -> anyhow::Result<()> {
    let db = setup_test_db().await?;
    let client = create_test_client(&db).await?;
    let app = test_app(test_config(), db)?;

    for uri in [
        format!("/api/dashboard?client_id={}", client.id),
        format!("/api/export?client_id={}", client.id),
        format!("/api/clients/{}/thresholds", client.id),
        "/api/sms/status".to_string(),
    ] {
        let response = send(&app, public_get(&uri)).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED, "{}", uri);
        assert_eq!(response.json()["code"], "UNAUTHORIZED");
    }

    let response = send(
        &app,
        public_json("POST", "/api/surveys/issue", json!({ "client_id": client.id })),
    )
    .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    Ok(())
}

#[tokio::test]
async fn wrong_bearer_token_is_rejected() -> anyhow::Result<()> {
    let db = setup_test_db().await?;
    let app = test_app(test_config(), db)?;

    let request = Request::builder()
        .uri("/api/sms/status")
        .header(header::AUTHORIZATION, "Bearer not-the-token")
        .body(Body::empty())?;
    let response = send(&app, request).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    Ok(())
}

#[tokio::test]
async fn login_cookie_grants_access_until_logout() -> anyhow::Result<()> {
    let db = setup_test_db().await?;
    let app = test_app(test_config(), db)?;

    let rejected = send(
        &app,
        public_json("POST", "/api/admin/auth", json!({ "password": "guess" })),
    )
    .await;
    assert_eq!(rejected.status, StatusCode::UNAUTHORIZED);
    assert!(rejected.headers.get(header::SET_COOKIE).is_none());

    let login = send(
        &app,
        public_json("POST", "/api/admin/auth", json!({ "password": ADMIN_PASSWORD })),
    )
    .await;
    assert_eq!(login.status, StatusCode::OK);
    assert_eq!(login.json()["ok"], true);
    let cookie = cookie_from(&login);
    assert!(cookie.starts_with("beacon_admin="));
    assert!(!cookie.contains(ADMIN_PASSWORD));
    let (issued_at, _) = cookie["beacon_admin=".len()..].split_once('.').unwrap();
    let issued_at: i64 = issued_at.parse()?;
    assert!((Utc::now().timestamp() - issued_at).abs() < 60);

    let request = Request::builder()
        .uri("/api/sms/status")
        .header(header::COOKIE, &cookie)
        .body(Body::empty())?;
    let status = send(&app, request).await;
    assert_eq!(status.status, StatusCode::OK);
    assert_eq!(status.json()["twilio_configured"], false);

    let logout = send(&app, public_json("POST", "/api/admin/logout", json!({}))).await;
    assert_eq!(logout.status, StatusCode::OK);
    assert_eq!(cookie_from(&logout), "beacon_admin=");

    let request = Request::builder()
        .uri("/api/sms/status")
        .header(header::COOKIE, "beacon_admin=")
        .body(Body::empty())?;
    let after = send(&app, request).await;
    assert_eq!(after.status, StatusCode::UNAUTHORIZED);

    Ok(())
}

#[tokio::test]
async fn cookie_from_another_password_is_rejected() -> anyhow::Result<()> {
    let db = setup_test_db().await?;
    let app = test_app(test_config(), db.clone())?;
    let other = test_app(
        beacon::config::AppConfig {
            admin_password: Some("another-password".to_string()),
            ..test_config()
        },
        db,
    )?;

    let login = send(
        &other,
        public_json("POST", "/api/admin/auth", json!({ "password": "another-password" })),
    )
    .await;
    let cookie = cookie_from(&login);

    let request = Request::builder()
        .uri("/api/sms/status")
        .header(header::COOKIE, cookie)
        .body(Body::empty())?;
    let response = send(&app, request).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    Ok(())
}

#[tokio::test]
async fn responses_carry_a_trace_id_header() -> anyhow::Result<()> {
    let db = setup_test_db().await?;
    let app = test_app(test_config(), db)?;

    let request = Request::builder()
        .uri("/api/sms/status")
        .header("x-trace-id", "req-abc_123")
        .body(Body::empty())?;
    let response = send(&app, request).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.headers.get("x-trace-id").unwrap(), "req-abc_123");
    assert_eq!(response.json()["trace_id"], "req-abc_123");

    Ok(())
}

#[tokio::test]
async fn session_older_than_max_age_is_rejected() -> anyhow::Result<()> {
    let db = setup_test_db().await?;
    let config = test_config();
    let max_age = config.admin_session_max_age_seconds as i64;
    let app = test_app(config, db)?;

    let issued_at = Utc::now().timestamp() - max_age - 1;
    let stale = session_token(ADMIN_PASSWORD, issued_at).unwrap();
    let request = Request::builder()
        .uri("/api/sms/status")
        .header(header::COOKIE, format!("beacon_admin={}", stale))
        .body(Body::empty())?;
    let response = send(&app, request).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.json()["message"], "Admin session is invalid");

    Ok(())
}
