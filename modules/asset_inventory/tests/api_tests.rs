//! HTTP-level tests: auth gating, status codes and Problem responses

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

mod common;
use common::{print_test_header, TestContext};

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, axum::http::HeaderMap, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, headers, json)
}

fn laptop_body() -> Value {
    json!({
        "category_name": "Laptop",
        "fields": [
            {"name": "Asset Tag", "type": "string"},
            {"name": "RAM GB", "type": "integer"}
        ]
    })
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let ctx = TestContext::new().await;
    let app = ctx.module.router().unwrap();

    let (status, headers, body) = send(&app, Method::GET, "/get-categories", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(headers.get(header::WWW_AUTHENTICATE).unwrap(), "Bearer");
    assert_eq!(body["status"], json!(401));

    let (status, _, _) = send(
        &app,
        Method::GET,
        "/get-categories",
        Some("not-a-token"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_non_admin_is_forbidden() {
    print_test_header(
        "test_non_admin_is_forbidden",
        &["Regular users are refused on every category and asset route"],
    );
    let ctx = TestContext::new().await;
    let app = ctx.module.router().unwrap();
    let token = ctx.token_for("ravi", "User").await;
    let admin = ctx.token_for("asha", "Admin").await;

    let (status, _, _) = send(
        &app,
        Method::POST,
        "/create-category",
        Some(&token),
        Some(laptop_body()),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _, body) = send(&app, Method::GET, "/get-categories", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["status"], json!(403));

    let (status, _, _) = send(
        &app,
        Method::GET,
        "/search-asset?table_name=laptop&identifier=LT-001",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _, body) = send(&app, Method::GET, "/get-categories", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_admin_category_and_asset_flow() {
    print_test_header(
        "test_admin_category_and_asset_flow",
        &["Create a category, add an asset and find it over HTTP"],
    );
    let ctx = TestContext::new().await;
    let app = ctx.module.router().unwrap();
    let admin = ctx.token_for("asha", "Admin").await;
    ctx.token_for("ravi", "User").await;

    let (status, _, body) = send(
        &app,
        Method::POST,
        "/create-category",
        Some(&admin),
        Some(laptop_body()),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["category"]["table"], json!("laptop"));

    let (status, _, _) = send(
        &app,
        Method::POST,
        "/add-asset",
        Some(&admin),
        Some(json!({"table_name": "laptop", "data": {"asset_tag": "LT-001", "ram_gb": 16}})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _, body) = send(
        &app,
        Method::GET,
        "/search-asset?table_name=laptop&identifier=LT-001",
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"][0]["ram_gb"], json!(16));

    let (status, _, body) = send(
        &app,
        Method::GET,
        "/search-asset?table_name=laptop&identifier=LT-404",
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], json!(404));

    let (status, _, _) = send(
        &app,
        Method::POST,
        "/add-fields",
        Some(&admin),
        Some(json!({"category_name": "laptop", "fields": [{"name": "ram gb", "type": "integer"}]})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _, body) = send(&app, Method::GET, "/dashboard-stats", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_assets"], json!(1));
    assert_eq!(body["total_users"], json!(2));
}

#[tokio::test]
async fn test_add_fields_partial_failure_is_multi_status() {
    print_test_header(
        "test_add_fields_partial_failure_is_multi_status",
        &["A failed column after a successful one answers 207 with both lists"],
    );
    let ctx = TestContext::new().await;
    let app = ctx.module.router().unwrap();
    let admin = ctx.token_for("asha", "Admin").await;

    send(
        &app,
        Method::POST,
        "/create-category",
        Some(&admin),
        Some(laptop_body()),
    )
    .await;
    ctx.execute(r#"ALTER TABLE "laptop" ADD COLUMN "vendor" text"#)
        .await;

    let (status, _, body) = send(
        &app,
        Method::POST,
        "/add-fields",
        Some(&admin),
        Some(json!({
            "category_name": "laptop",
            "fields": [
                {"name": "Serial No", "type": "string"},
                {"name": "Vendor", "type": "string"},
                {"name": "Color", "type": "string"}
            ]
        })),
    )
    .await;
    println!("   body: {}", body);

    assert_eq!(status, StatusCode::MULTI_STATUS);
    assert_eq!(body["added"], json!(["serial_no"]));
    assert_eq!(body["failed"][0]["name"], json!("vendor"));
    assert_eq!(body["failed"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn test_register_and_login() {
    let ctx = TestContext::new().await;
    let app = ctx.module.router().unwrap();

    let user = json!({"username": "asha", "mail": "asha@example.com", "password": "pw"});
    let (status, _, body) = send(&app, Method::POST, "/register", None, Some(user.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["role"], json!("User"));
    assert!(body.get("hashed_password").is_none());

    let (status, _, _) = send(&app, Method::POST, "/register", None, Some(user)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _, body) = send(
        &app,
        Method::POST,
        "/login",
        None,
        Some(json!({"mail": "asha@example.com", "password": "pw"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], json!("bearer"));
    let token = body["access_token"].as_str().unwrap().to_string();

    let (status, _, _) = send(&app, Method::GET, "/admin-only", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _, _) = send(
        &app,
        Method::POST,
        "/login",
        None,
        Some(json!({"mail": "asha@example.com", "password": "wrong"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_download_table_is_xlsx() {
    let ctx = TestContext::new().await;
    let app = ctx.module.router().unwrap();
    let admin = ctx.token_for("asha", "Admin").await;

    send(
        &app,
        Method::POST,
        "/create-category",
        Some(&admin),
        Some(laptop_body()),
    )
    .await;

    let request = Request::builder()
        .uri("/download-table?table_name=Laptop")
        .header(header::AUTHORIZATION, format!("Bearer {}", admin))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_DISPOSITION).unwrap(),
        "attachment; filename=\"laptop.xlsx\""
    );

    let (status, _, _) = send(
        &app,
        Method::GET,
        "/download-table?table_name=users",
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_openapi_document() {
    let ctx = TestContext::new().await;
    let app = ctx.module.router().unwrap();

    let (status, _, body) = send(&app, Method::GET, "/openapi.json", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["components"]["schemas"]["CategoryCreate"].is_object());
}
