//! Client administration routes: creation, thresholds, hierarchy and the
//! employee roster.

#[path = "test_utils/mod.rs"]
mod test_utils;

use axum::http::StatusCode;
use beacon::models::{Department, Division, Team};
use sea_orm::{EntityTrait, PaginatorTrait};
use serde_json::json;
use test_utils::*;
use uuid::Uuid;

#[tokio::test]
async fn create_client_validates_name() -> anyhow::Result<()> {
    let db = setup_test_db().await?;
    let app = test_app(test_config(), db)?;

    let created = send(&app, admin_json("POST", "/api/clients", json!({ "name": "  Acme  " }))).await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.json()["name"], "Acme");

    let blank = send(&app, admin_json("POST", "/api/clients", json!({ "name": "   " }))).await;
    assert_eq!(blank.status, StatusCode::BAD_REQUEST);
    assert_eq!(blank.json()["code"], "VALIDATION_FAILED");

    Ok(())
}

#[tokio::test]
async fn thresholds_default_then_merge_overrides() -> anyhow::Result<()> {
    let db = setup_test_db().await?;
    let client = create_test_client(&db).await?;
    let app = test_app(test_config(), db)?;
    let uri = format!("/api/clients/{}/thresholds", client.id);

    let defaults = send(&app, admin_get(&uri)).await;
    assert_eq!(defaults.status, StatusCode::OK);
    let body = defaults.json();
    assert_eq!(body["overridden"], false);
    assert_eq!(
        body["thresholds"],
        json!({
            "team_attention": 60.0,
            "below_tolerance": 60.0,
            "domain_at_risk": 70.0,
            "psych_safety_critical": 50.0,
            "consecutive_declines": 3,
            "range_high": 30.0,
            "variance_high": 12.0
        })
    );

    let first = send(&app, admin_json("PUT", &uri, json!({ "team_attention": 55 }))).await;
    assert_eq!(first.status, StatusCode::OK, "{}", first.text());
    let second = send(&app, admin_json("PUT", &uri, json!({ "consecutive_declines": 4 }))).await;
    assert_eq!(second.status, StatusCode::OK);

    let resolved = send(&app, admin_get(&uri)).await.json();
    assert_eq!(resolved["overridden"], true);
    assert_eq!(resolved["thresholds"]["team_attention"], 55.0);
    assert_eq!(resolved["thresholds"]["consecutive_declines"], 4);
    assert_eq!(resolved["thresholds"]["domain_at_risk"], 70.0);

    Ok(())
}

#[tokio::test]
async fn thresholds_reject_unknown_keys_and_out_of_range_values() -> anyhow::Result<()> {
    let db = setup_test_db().await?;
    let client = create_test_client(&db).await?;
    let app = test_app(test_config(), db)?;
    let uri = format!("/api/clients/{}/thresholds", client.id);

    for body in [
        json!({ "made_up": 1 }),
        json!({ "team_attention": "high" }),
        json!({ "team_attention": 140 }),
        json!({ "consecutive_declines": 0 }),
    ] {
        let response = send(&app, admin_json("PUT", &uri, body.clone())).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "{}", body);
    }

    let resolved = send(&app, admin_get(&uri)).await.json();
    assert_eq!(resolved["overridden"], false);

    let missing = send(
        &app,
        admin_get(&format!("/api/clients/{}/thresholds", Uuid::new_v4())),
    )
    .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn hierarchy_setup_is_idempotent() -> anyhow::Result<()> {
    let db = setup_test_db().await?;
    let client = create_test_client(&db).await?;
    let app = test_app(test_config(), db.clone())?;
    let uri = format!("/api/clients/{}/hierarchy", client.id);
    let plan = json!({
        "divisions": ["Operations", "Corporate", "Operations "],
        "departments_per_division": ["Field", "Support"],
        "teams_per_department": ["North", "South", "West"]
    });

    let first = send(&app, admin_json("POST", &uri, plan.clone())).await;
    assert_eq!(first.status, StatusCode::OK, "{}", first.text());
    let first = first.json();
    assert_eq!(first["divisions"]["created"], 2);
    assert_eq!(first["departments"]["created"], 4);
    assert_eq!(first["teams"]["created"], 12);
    assert_eq!(first["errors"], json!([]));

    let second = send(&app, admin_json("POST", &uri, plan)).await.json();
    assert_eq!(second["divisions"]["created"], 0);
    assert_eq!(second["divisions"]["reused"], 2);
    assert_eq!(second["teams"]["reused"], 12);

    assert_eq!(Division::find().count(&db).await?, 2);
    assert_eq!(Department::find().count(&db).await?, 4);
    assert_eq!(Team::find().count(&db).await?, 12);

    let empty = send(&app, admin_json("POST", &uri, json!({ "divisions": [] }))).await;
    assert_eq!(empty.status, StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test]
async fn employee_placement_follows_team() -> anyhow::Result<()> {
    let db = setup_test_db().await?;
    let client = create_test_client(&db).await?;
    let other = create_test_client(&db).await?;
    let app = test_app(test_config(), db.clone())?;

    send(
        &app,
        admin_json(
            "POST",
            &format!("/api/clients/{}/hierarchy", client.id),
            json!({
                "divisions": ["Operations"],
                "departments_per_division": ["Field"],
                "teams_per_department": ["North"]
            }),
        ),
    )
    .await;
    let team = Team::find().one(&db).await?.unwrap();

    let created = send(
        &app,
        admin_json(
            "POST",
            &format!("/api/clients/{}/employees", client.id),
            json!({ "first_name": "Ana", "phone": "+61 412 345 678", "team_id": team.id }),
        ),
    )
    .await;
    assert_eq!(created.status, StatusCode::CREATED, "{}", created.text());
    let body = created.json();
    assert_eq!(body["phone"], "+61412345678");
    assert_eq!(body["team_id"], team.id.to_string());
    assert_eq!(body["department_id"], team.department_id.to_string());
    assert!(body["division_id"].is_string());

    let bad_phone = send(
        &app,
        admin_json(
            "POST",
            &format!("/api/clients/{}/employees", client.id),
            json!({ "phone": "12345" }),
        ),
    )
    .await;
    assert_eq!(bad_phone.status, StatusCode::BAD_REQUEST);

    let foreign_team = send(
        &app,
        admin_json(
            "POST",
            &format!("/api/clients/{}/employees", other.id),
            json!({ "team_id": team.id }),
        ),
    )
    .await;
    assert_eq!(foreign_team.status, StatusCode::BAD_REQUEST);
    assert_eq!(foreign_team.json()["details"]["team_id"], "team does not exist");

    Ok(())
}
