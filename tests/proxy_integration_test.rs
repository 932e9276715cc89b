use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use erp_portal::domain::model::ApiCredentials;
use erp_portal::{build_router, AppState, PortalConfig};
use httpmock::prelude::*;
use httpmock::Method::{HEAD, PATCH};
use tower::ServiceExt;

fn portal_for(server: &MockServer) -> axum::Router {
    build_router(AppState::new(
        &PortalConfig::default().with_erp_url(server.base_url()),
    ))
}

async fn body_json(response: Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_create_project_through_proxy() {
    let server = MockServer::start();
    let csrf = server.mock(|when, then| {
        when.method(GET)
            .path("/api/method/frappe.auth.get_csrf_token")
            .header("cookie", "sid=abc123");
        then.status(200)
            .json_body(serde_json::json!({"message": "token-123"}));
    });
    let create = server.mock(|when, then| {
        when.method(POST)
            .path("/api/resource/Project")
            .header("cookie", "sid=abc123")
            .header("x-frappe-csrf-token", "token-123")
            .header("content-type", "application/json")
            .json_body(serde_json::json!({"project_name": "Acme"}));
        then.status(200).json_body(serde_json::json!({
            "data": {"name": "PROJ-0001", "project_name": "Acme"}
        }));
    });

    let response = portal_for(&server)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/erp/api/resource/Project")
                .header(header::COOKIE, "sid=abc123")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"project_name":"Acme"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    csrf.assert_hits(1);
    create.assert_hits(1);
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["name"], "PROJ-0001");
}

#[tokio::test]
async fn test_get_keeps_query_and_encoded_path() {
    let server = MockServer::start();
    let read = server.mock(|when, then| {
        when.method(GET)
            .path("/api/resource/Sales%20Order/SO-0001")
            .query_param("fields", r#"["name","status"]"#);
        then.status(200)
            .json_body(serde_json::json!({"data": {"name": "SO-0001"}}));
    });

    let response = portal_for(&server)
        .oneshot(
            Request::builder()
                .uri("/api/erp/api/resource/Sales%20Order/SO-0001?fields=%5B%22name%22%2C%22status%22%5D")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    read.assert();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_every_set_cookie_is_relayed() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/api/method/logout");
        then.status(200)
            .header("set-cookie", "sid=Guest; Path=/")
            .header("set-cookie", "user_id=Guest; Path=/")
            .header("set-cookie", "full_name=Guest; Path=/")
            .json_body(serde_json::json!({}));
    });
    server.mock(|when, then| {
        when.method(GET).path("/api/method/frappe.auth.get_csrf_token");
        then.status(200).json_body(serde_json::json!({"message": "t"}));
    });

    let response = portal_for(&server)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/erp/api/method/logout")
                .header(header::COOKIE, "sid=abc123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let cookies: Vec<_> = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect();
    assert_eq!(
        cookies,
        vec!["sid=Guest; Path=/", "user_id=Guest; Path=/", "full_name=Guest; Path=/"]
    );
}

#[tokio::test]
async fn test_upstream_status_and_body_relayed() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(DELETE).path("/api/resource/Project/PROJ-0001");
        then.status(417)
            .header("content-type", "application/json")
            .body(r#"{"exc_type":"LinkExistsError","_server_messages":"[]"}"#);
    });
    server.mock(|when, then| {
        when.method(GET).path("/api/method/frappe.auth.get_csrf_token");
        then.status(200).json_body(serde_json::json!({"message": "t"}));
    });

    let response = portal_for(&server)
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/api/erp/api/resource/Project/PROJ-0001")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::EXPECTATION_FAILED);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/json"
    );
    let json = body_json(response).await;
    assert_eq!(json["exc_type"], "LinkExistsError");
}

#[tokio::test]
async fn test_delete_keeps_body() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/method/frappe.auth.get_csrf_token");
        then.status(200).json_body(serde_json::json!({"message": "t"}));
    });
    let delete = server.mock(|when, then| {
        when.method(DELETE)
            .path("/api/resource/Timesheet/TS-0001")
            .header("x-frappe-csrf-token", "t")
            .body(r#"{"reason":"duplicate"}"#);
        then.status(202).json_body(serde_json::json!({"message": "ok"}));
    });

    let response = portal_for(&server)
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/api/erp/api/resource/Timesheet/TS-0001")
                .header(header::COOKIE, "sid=abc123")
                .body(Body::from(r#"{"reason":"duplicate"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    delete.assert();
}

#[tokio::test]
async fn test_head_relays_cookies_without_csrf() {
    let server = MockServer::start();
    let csrf = server.mock(|when, then| {
        when.method(GET).path("/api/method/frappe.auth.get_csrf_token");
        then.status(200).json_body(serde_json::json!({"message": "t"}));
    });
    let head = server.mock(|when, then| {
        when.method(HEAD)
            .path("/api/resource/Project")
            .header("cookie", "sid=abc123");
        then.status(200)
            .header("set-cookie", "sid=abc123; Path=/")
            .header("set-cookie", "system_user=yes; Path=/");
    });

    let response = portal_for(&server)
        .oneshot(
            Request::builder()
                .method("HEAD")
                .uri("/api/erp/api/resource/Project")
                .header(header::COOKIE, "sid=abc123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    head.assert_hits(1);
    csrf.assert_hits(0);
    assert_eq!(response.headers().get_all(header::SET_COOKIE).iter().count(), 2);
}

#[tokio::test]
async fn test_api_credentials_skip_csrf() {
    let server = MockServer::start();
    let csrf = server.mock(|when, then| {
        when.method(GET).path("/api/method/frappe.auth.get_csrf_token");
        then.status(200).json_body(serde_json::json!({"message": "t"}));
    });
    let update = server.mock(|when, then| {
        when.method(PATCH)
            .path("/api/resource/Project/PROJ-0001")
            .header("authorization", "token key:secret")
            .body(r#"{"status":"Completed"}"#);
        then.status(200).json_body(serde_json::json!({"data": {}}));
    });

    let portal = build_router(AppState::new(
        &PortalConfig::default()
            .with_erp_url(server.base_url())
            .with_credentials(ApiCredentials {
                api_key: "key".into(),
                api_secret: "secret".into(),
            }),
    ));
    let response = portal
        .oneshot(
            Request::builder()
                .method("PATCH")
                .uri("/api/erp/api/resource/Project/PROJ-0001")
                .body(Body::from(r#"{"status":"Completed"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    update.assert();
    csrf.assert_hits(0);
}

#[tokio::test]
async fn test_unreachable_erp_is_bad_gateway() {
    let portal = build_router(AppState::new(
        &PortalConfig::default().with_erp_url("http://127.0.0.1:1"),
    ));

    let response = portal
        .oneshot(
            Request::builder()
                .uri("/api/erp/api/resource/Project")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Failed to connect to ERP server");
    assert_eq!(json["url"], "http://127.0.0.1:1/api/resource/Project");
}

#[tokio::test]
async fn test_missing_erp_url_is_config_error() {
    let portal = build_router(AppState::new(&PortalConfig::default()));

    let response = portal
        .oneshot(
            Request::builder()
                .uri("/api/erp/api/resource/Project")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(json["code"], "CONFIG_MISSING");
}
