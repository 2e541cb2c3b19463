//! HTTP-level integration tests for the `/resources` endpoints.
//!
//! Requests go straight to the router via `tower::ServiceExt::oneshot`; the
//! store is in-memory so no database is needed.

mod common;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use common::{
    body_json, create_resource, delete, get, post_json, put_json, seed_lead, send, setup,
    speech_body, token,
};
use serde_json::json;
use tower::ServiceExt;

// ---------------------------------------------------------------------------
// Health and auth
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_health_reports_ok() {
    let (_, app) = setup();
    let response = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["storeHealthy"], true);
}

#[tokio::test]
async fn test_missing_token_is_401_envelope() {
    let (_, app) = setup();
    let response = send(&app, Method::GET, "/api/v1/resources", None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_garbage_token_is_401() {
    let (_, app) = setup();
    let response = get(&app, "/api/v1/resources", "not-a-jwt").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_response_carries_request_id() {
    let (_, app) = setup();
    let response = get(&app, "/api/v1/resources", &token(1, "ADMIN")).await;
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_cors_exposes_request_id_to_frontend() {
    let (_, app) = setup();
    let request = Request::builder()
        .uri("/health")
        .header("origin", "http://localhost:5173")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(
        response.headers()["access-control-allow-origin"],
        "http://localhost:5173"
    );
    let exposed = response.headers()["access-control-expose-headers"]
        .to_str()
        .unwrap()
        .to_ascii_lowercase();
    assert!(exposed.contains("x-request-id"));
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_create_resource_returns_201() {
    let (_, app) = setup();
    let response = post_json(
        &app,
        "/api/v1/resources",
        &token(1, "CRM_MANAGER"),
        speech_body("primer-contacte", "Hola {{contact.name}}", &["EMPRESA"]),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["message"], "Resource created");
    assert_eq!(json["data"]["slug"], "primer-contacte");
    assert_eq!(json["data"]["type"], "SPEECH");
    assert_eq!(json["data"]["content"]["type"], "SPEECH");
    assert_eq!(json["data"]["version"], "1.0");
    assert_eq!(json["data"]["isActive"], true);
    assert_eq!(json["data"]["accessRoles"], json!(["EMPRESA"]));
}

#[tokio::test]
async fn test_create_requires_resource_manager() {
    let (_, app) = setup();
    let response = post_json(
        &app,
        "/api/v1/resources",
        &token(2, "EMPRESA"),
        speech_body("a", "x", &[]),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["code"], "FORBIDDEN");
}

#[tokio::test]
async fn test_create_invalid_slug_is_validation_error() {
    let (_, app) = setup();
    let response = post_json(
        &app,
        "/api/v1/resources",
        &token(1, "ADMIN"),
        speech_body("Not A Slug", "x", &[]),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert!(json["error"].as_str().unwrap().contains("slug"));
}

#[tokio::test]
async fn test_create_unknown_namespace_rejected() {
    let (_, app) = setup();
    let mut body = speech_body("a", "{{lead.name}}", &[]);
    body["placeholders"] = json!([
        { "key": "lead.name", "label": "Nom", "type": "CUSTOM", "required": true }
    ]);
    let response = post_json(&app, "/api/v1/resources", &token(1, "ADMIN"), body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_json_is_bad_request_envelope() {
    let (_, app) = setup();
    let response = post_json(
        &app,
        "/api/v1/resources",
        &token(1, "ADMIN"),
        json!({ "slug": "a" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_duplicate_slug_is_conflict() {
    let (_, app) = setup();
    create_resource(&app, speech_body("a", "x", &[])).await;
    let response = post_json(
        &app,
        "/api/v1/resources",
        &token(1, "ADMIN"),
        speech_body("a", "y", &[]),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

// ---------------------------------------------------------------------------
// Read and access control
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_get_respects_access_roles() {
    let (_, app) = setup();
    let id = create_resource(&app, speech_body("a", "x", &["EMPLEAT_PUBLIC"])).await;
    let uri = format!("/api/v1/resources/{id}");

    let denied = get(&app, &uri, &token(2, "EMPRESA")).await;
    assert_eq!(denied.status(), StatusCode::FORBIDDEN);

    let allowed = get(&app, &uri, &token(3, "EMPLEAT_PUBLIC")).await;
    assert_eq!(allowed.status(), StatusCode::OK);
    assert_eq!(body_json(allowed).await["data"]["id"], id);

    let admin = get(&app, &uri, &token(1, "ADMIN")).await;
    assert_eq!(admin.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_get_by_slug() {
    let (_, app) = setup();
    create_resource(&app, speech_body("guio-basic", "x", &["EMPRESA"])).await;

    let found = get(&app, "/api/v1/resources/slug/guio-basic", &token(2, "EMPRESA")).await;
    assert_eq!(found.status(), StatusCode::OK);

    let missing = get(&app, "/api/v1/resources/slug/no-existeix", &token(2, "EMPRESA")).await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(missing).await["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_non_numeric_id_is_bad_request() {
    let (_, app) = setup();
    let response = get(&app, "/api/v1/resources/abc", &token(1, "ADMIN")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_filters_by_role_and_type() {
    let (_, app) = setup();
    create_resource(&app, speech_body("public", "x", &["EMPRESA"])).await;
    create_resource(&app, speech_body("internal", "y", &[])).await;

    let company = body_json(get(&app, "/api/v1/resources", &token(2, "EMPRESA")).await).await;
    let slugs: Vec<&str> = company["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["slug"].as_str().unwrap())
        .collect();
    assert_eq!(slugs, vec!["public"]);

    let admin = body_json(
        get(&app, "/api/v1/resources?type=SPEECH&limit=10", &token(1, "ADMIN")).await,
    )
    .await;
    assert_eq!(admin["data"].as_array().unwrap().len(), 2);

    let none = body_json(
        get(&app, "/api/v1/resources?type=GUIDE", &token(1, "ADMIN")).await,
    )
    .await;
    assert!(none["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_list_rejects_unknown_type() {
    let (_, app) = setup();
    let response = get(&app, "/api/v1/resources?type=VIDEO", &token(1, "ADMIN")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Update, delete, duplicate
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_update_bumps_version() {
    let (_, app) = setup();
    let id = create_resource(&app, speech_body("a", "x", &[])).await;

    let response = put_json(
        &app,
        &format!("/api/v1/resources/{id}"),
        &token(1, "ADMIN"),
        json!({ "title": "Guió revisat", "newVersion": true }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["title"], "Guió revisat");
    assert_eq!(json["data"]["version"], "1.1");
}

#[tokio::test]
async fn test_update_requires_resource_manager() {
    let (_, app) = setup();
    let id = create_resource(&app, speech_body("a", "x", &["EMPRESA"])).await;
    let response = put_json(
        &app,
        &format!("/api/v1/resources/{id}"),
        &token(2, "EMPRESA"),
        json!({ "title": "Hack" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_delete_is_soft() {
    let (_, app) = setup();
    let id = create_resource(&app, speech_body("a", "x", &["EMPRESA"])).await;
    let uri = format!("/api/v1/resources/{id}");

    let response = delete(&app, &uri, &token(1, "ADMIN")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["isActive"], false);

    let hidden = get(&app, &uri, &token(2, "EMPRESA")).await;
    assert_eq!(hidden.status(), StatusCode::NOT_FOUND);

    let kept = body_json(get(&app, &uri, &token(1, "ADMIN")).await).await;
    assert_eq!(kept["data"]["isActive"], false);
}

#[tokio::test]
async fn test_duplicate_creates_copy() {
    let (_, app) = setup();
    let id = create_resource(&app, speech_body("guio", "Hola {{contact.name}}", &[])).await;

    let response = post_json(
        &app,
        &format!("/api/v1/resources/{id}/duplicate"),
        &token(1, "ADMIN"),
        json!({}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["slug"], "guio-copy");
    assert_eq!(json["data"]["title"], "Guió de primer contacte (còpia)");
    assert_eq!(json["data"]["content"]["script"], "Hola {{contact.name}}");
    assert_ne!(json["data"]["id"], id);
}

#[tokio::test]
async fn test_duplicate_without_body_uses_defaults() {
    let (_, app) = setup();
    let id = create_resource(&app, speech_body("guio", "Hola", &[])).await;
    let admin = token(1, "ADMIN");

    let response = send(
        &app,
        Method::POST,
        &format!("/api/v1/resources/{id}/duplicate"),
        Some(admin.as_str()),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["slug"], "guio-copy");
}

#[tokio::test]
async fn test_duplicate_with_malformed_body_is_bad_request() {
    let (_, app) = setup();
    let id = create_resource(&app, speech_body("guio", "Hola", &[])).await;

    let response = post_json(
        &app,
        &format!("/api/v1/resources/{id}/duplicate"),
        &token(1, "ADMIN"),
        json!({ "slug": 42 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "BAD_REQUEST");
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_extract_renders_and_records_usage() {
    let (store, app) = setup();
    seed_lead(&store, 5, "", "Jordi Garcia");
    let id = create_resource(
        &app,
        speech_body("guio", "Dear {{contact.name}} at {{company.name}}", &[]),
    )
    .await;

    let response = post_json(
        &app,
        "/api/v1/resources/extract",
        &token(1, "ADMIN"),
        json!({ "resourceId": id, "leadId": 5, "context": "trucada" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let extracted = &json["data"]["extractedContent"];
    assert_eq!(extracted["processedContent"], "Dear Jordi at [COMPANY.NAME]");
    assert_eq!(extracted["placeholdersUsed"], json!(["contact.name"]));
    assert_eq!(extracted["missingPlaceholders"], json!(["company.name"]));
    assert_eq!(json["data"]["usageRecorded"], true);
    assert_eq!(json["data"]["resource"]["id"], id);

    let usages = store.usages();
    assert_eq!(usages.len(), 1);
    assert_eq!(usages[0].content, "Dear Jordi at [COMPANY.NAME]");
    assert_eq!(usages[0].user_id, 1);
}

#[tokio::test]
async fn test_extract_custom_values_override() {
    let (store, app) = setup();
    seed_lead(&store, 5, "Acme", "Anna Puig");
    let id = create_resource(&app, speech_body("guio", "{{company.name}}", &[])).await;

    let json = body_json(
        post_json(
            &app,
            "/api/v1/resources/extract",
            &token(1, "ADMIN"),
            json!({
                "resourceId": id,
                "leadId": 5,
                "customValues": { "company.name": "Acme Global" }
            }),
        )
        .await,
    )
    .await;
    assert_eq!(
        json["data"]["extractedContent"]["processedContent"],
        "Acme Global"
    );
}

#[tokio::test]
async fn test_extract_rejects_mismatched_user_id() {
    let (store, app) = setup();
    seed_lead(&store, 5, "Acme", "Anna");
    let id = create_resource(&app, speech_body("guio", "x", &[])).await;

    let response = post_json(
        &app,
        "/api/v1/resources/extract",
        &token(1, "ADMIN"),
        json!({ "resourceId": id, "leadId": 5, "userId": 99 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(store.usages().is_empty());
}

#[tokio::test]
async fn test_extract_denied_for_unlisted_role() {
    let (store, app) = setup();
    seed_lead(&store, 5, "Acme", "Anna");
    let id = create_resource(&app, speech_body("guio", "x", &["EMPLEAT_PUBLIC"])).await;

    let response = post_json(
        &app,
        "/api/v1/resources/extract",
        &token(2, "EMPRESA"),
        json!({ "resourceId": id, "leadId": 5 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(store.usages().is_empty());
}

#[tokio::test]
async fn test_extract_unknown_lead_is_404() {
    let (_, app) = setup();
    let id = create_resource(&app, speech_body("guio", "x", &[])).await;
    let response = post_json(
        &app,
        "/api/v1/resources/extract",
        &token(1, "ADMIN"),
        json!({ "resourceId": id, "leadId": 404 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_extract_survives_audit_failure() {
    let (store, app) = setup();
    seed_lead(&store, 5, "Acme", "Anna");
    store.set_fail_usage_writes(true);
    let id = create_resource(&app, speech_body("guio", "Hola {{contact.name}}", &[])).await;

    let response = post_json(
        &app,
        "/api/v1/resources/extract",
        &token(1, "ADMIN"),
        json!({ "resourceId": id, "leadId": 5 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["extractedContent"]["processedContent"], "Hola Anna");
    assert_eq!(json["data"]["usageRecorded"], false);
}

#[tokio::test]
async fn test_preview_does_not_record_usage() {
    let (store, app) = setup();
    let id = create_resource(
        &app,
        speech_body("guio", "{{system.platform_name}}: {{contact.name}}", &[]),
    )
    .await;

    let response = post_json(
        &app,
        &format!("/api/v1/resources/{id}/preview"),
        &token(1, "ADMIN"),
        json!({}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(
        json["data"]["preview"]["processedContent"],
        "La Pública: [CONTACT.NAME]"
    );
    assert!(store.usages().is_empty());
}

#[tokio::test]
async fn test_preview_without_body_renders_system_values() {
    let (_, app) = setup();
    let id = create_resource(&app, speech_body("guio", "{{system.platform_name}}", &[])).await;
    let admin = token(1, "ADMIN");

    let response = send(
        &app,
        Method::POST,
        &format!("/api/v1/resources/{id}/preview"),
        Some(admin.as_str()),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["preview"]["processedContent"], "La Pública");
}

// ---------------------------------------------------------------------------
// Validation, usage history, stats
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_validate_values() {
    let (_, app) = setup();
    let mut body = speech_body("guio", "Codi postal: {{custom.postal_code}}", &[]);
    body["placeholders"] = json!([{
        "key": "custom.postal_code",
        "label": "Codi postal",
        "type": "CUSTOM",
        "required": true,
        "validation": { "pattern": "^\\d{5}$" }
    }]);
    let id = create_resource(&app, body).await;
    let uri = format!("/api/v1/resources/{id}/validate-values");

    let bad = body_json(
        post_json(
            &app,
            &uri,
            &token(1, "ADMIN"),
            json!({ "values": { "custom.postal_code": "801" } }),
        )
        .await,
    )
    .await;
    assert_eq!(bad["data"]["valid"], false);
    assert_eq!(bad["data"]["results"]["custom.postal_code"]["status"], "invalid");

    let good = body_json(
        post_json(
            &app,
            &uri,
            &token(1, "ADMIN"),
            json!({ "values": { "custom.postal_code": "08001" } }),
        )
        .await,
    )
    .await;
    assert_eq!(good["data"]["valid"], true);
}

#[tokio::test]
async fn test_record_and_list_usages() {
    let (store, app) = setup();
    seed_lead(&store, 5, "Acme", "Anna");
    let id = create_resource(&app, speech_body("guio", "x", &[])).await;
    let uri = format!("/api/v1/resources/{id}/usages");

    let created = post_json(
        &app,
        &uri,
        &token(1, "ADMIN"),
        json!({ "leadId": 5, "content": "Text enviat", "context": "email" }),
    )
    .await;
    assert_eq!(created.status(), StatusCode::CREATED);

    let json = body_json(get(&app, &uri, &token(1, "ADMIN")).await).await;
    let items = json["data"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["content"], "Text enviat");
    assert_eq!(items[0]["leadId"], 5);
}

#[tokio::test]
async fn test_stats_for_managers_only() {
    let (_, app) = setup();
    create_resource(&app, speech_body("a", "x", &[])).await;

    let json = body_json(get(&app, "/api/v1/resources/stats", &token(1, "CRM_MANAGER")).await).await;
    assert_eq!(json["data"]["total"], 1);
    assert_eq!(json["data"]["byType"]["SPEECH"], 1);

    let response = get(&app, "/api/v1/resources/stats", &token(2, "EMPRESA")).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
