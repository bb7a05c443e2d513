//! Router tests driven through `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use chrono::{FixedOffset, TimeZone};
use folio_api::{AppState, create_router};
use folio_core::auth::hash_password;
use folio_core::storage::{BucketConfig, MemoryObjectStore, StorageGateway, inline};
use folio_db::entities::{projects, users};
use folio_shared::{JwtConfig, JwtService};
use http_body_util::BodyExt;
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};
use serde_json::{Value, json};
use tower::ServiceExt;

const BOUNDARY: &str = "folio-test-boundary";

fn jwt() -> Arc<JwtService> {
    Arc::new(JwtService::new(JwtConfig {
        secret: "test-secret".to_string(),
        expires_in_secs: 3600,
    }))
}

fn app_with(db: DatabaseConnection, store: Arc<MemoryObjectStore>) -> Router {
    let config = Arc::new(BucketConfig::new("localhost", 9000, "project-images"));
    create_router(AppState {
        db: Arc::new(db),
        jwt_service: jwt(),
        storage: Arc::new(StorageGateway::new(store, config)),
    })
}

fn app() -> Router {
    app_with(
        DatabaseConnection::Disconnected,
        Arc::new(MemoryObjectStore::new()),
    )
}

fn multipart(field: &str, filename: &str, content_type: &str, data: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/api/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn timestamp() -> chrono::DateTime<FixedOffset> {
    FixedOffset::east_opt(0)
        .unwrap()
        .with_ymd_and_hms(2026, 1, 2, 3, 4, 5)
        .unwrap()
}

#[tokio::test]
async fn test_health() {
    let response = app().oneshot(get("/api/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "OK");
}

#[tokio::test]
async fn test_health_at_root() {
    let response = app().oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "OK");
}

#[tokio::test]
async fn test_unknown_route() {
    let response = app().oneshot(get("/api/nope")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        body_json(response).await,
        json!({ "error": "Route not found" })
    );
}

#[tokio::test]
async fn test_upload_to_object_store() {
    let store = Arc::new(MemoryObjectStore::new());
    let app = app_with(DatabaseConnection::Disconnected, store.clone());

    let response = app
        .oneshot(multipart("image", "cat.PNG", "image/png", b"\x89PNG\r\n"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let filename = body["filename"].as_str().unwrap().to_string();
    assert!(filename.ends_with(".png"));
    assert_eq!(body["bucket"], "project-images");
    assert_eq!(
        body["url"],
        format!("http://localhost:9000/project-images/{filename}")
    );

    let object = store.object("project-images", &filename).unwrap();
    assert_eq!(object.data.as_ref(), b"\x89PNG\r\n");
}

#[tokio::test]
async fn test_upload_falls_back_inline() {
    let store = Arc::new(MemoryObjectStore::new());
    store.set_unreachable(true);
    let app = app_with(DatabaseConnection::Disconnected, store.clone());

    let response = app
        .oneshot(multipart("image", "a.gif", "image/gif", &[1, 2, 3]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["storage"], "base64");
    assert_eq!(body["mimeType"], "image/gif");
    assert_eq!(body["size"], 3);

    let decoded = inline::decode_data_url(body["url"].as_str().unwrap()).unwrap();
    assert_eq!(decoded.bytes, vec![1, 2, 3]);
    assert_eq!(store.calls().put_object, 0);
}

#[tokio::test]
async fn test_upload_rejects_non_image() {
    let store = Arc::new(MemoryObjectStore::new());
    let app = app_with(DatabaseConnection::Disconnected, store.clone());

    let response = app
        .oneshot(multipart("image", "notes.txt", "text/plain", b"hello"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["message"], "File must be an image");
    assert_eq!(store.calls().bucket_exists, 0);
}

#[tokio::test]
async fn test_upload_rejects_oversize() {
    let data = vec![0u8; 5 * 1024 * 1024 + 1];
    let response = app()
        .oneshot(multipart("image", "big.jpg", "image/jpeg", &data))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["message"],
        "Image size must be less than 5MB"
    );
}

#[tokio::test]
async fn test_upload_without_image_field() {
    let response = app()
        .oneshot(multipart("avatar", "a.png", "image/png", &[1]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["message"], "No file uploaded");
}

#[tokio::test]
async fn test_upload_misconfigured_bucket() {
    let config = Arc::new(BucketConfig::new("localhost", 9000, "undefined"));
    let app = create_router(AppState {
        db: Arc::new(DatabaseConnection::Disconnected),
        jwt_service: jwt(),
        storage: Arc::new(StorageGateway::new(
            Arc::new(MemoryObjectStore::new()),
            config,
        )),
    });

    let response = app
        .oneshot(multipart("image", "a.png", "image/png", &[1]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await["error"], "storage_misconfigured");
}

#[tokio::test]
async fn test_upload_requires_multipart_body() {
    let response = app()
        .oneshot(json_request("POST", "/api/upload", &json!({ "image": "x" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "validation_error");
}

#[tokio::test]
async fn test_signup_missing_field() {
    let response = app()
        .oneshot(json_request(
            "POST",
            "/api/users/signup",
            &json!({ "name": "Ada", "email": "ada@example.com" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "validation_error");
}

#[tokio::test]
async fn test_create_project_missing_user_id() {
    let response = app()
        .oneshot(json_request(
            "POST",
            "/api/projects",
            &json!({ "projectName": "Atlas" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "validation_error");
}

#[tokio::test]
async fn test_malformed_json_body() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/users/signin")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "validation_error");
}

#[tokio::test]
async fn test_signup_validation() {
    let response = app()
        .oneshot(json_request(
            "POST",
            "/api/users/signup",
            &json!({ "name": "Ada", "email": "not-an-email", "password": "secret1" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "validation_error");
}

#[tokio::test]
async fn test_signin_issues_token() {
    let user = users::Model {
        id: 7,
        name: "Ada".to_string(),
        email: "ada@example.com".to_string(),
        password_hash: hash_password("secret1").unwrap(),
        created_at: timestamp(),
        updated_at: timestamp(),
    };
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![user]])
        .into_connection();

    let response = app_with(db, Arc::new(MemoryObjectStore::new()))
        .oneshot(json_request(
            "POST",
            "/api/users/signin",
            &json!({ "email": "Ada@Example.com", "password": "secret1" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["user"]["id"], 7);
    assert!(body["user"].get("passwordHash").is_none());
    assert!(body["user"]["createdAt"].is_string());

    let claims = jwt()
        .validate_token(body["token"].as_str().unwrap())
        .unwrap();
    assert_eq!(claims.user_id(), 7);
}

#[tokio::test]
async fn test_signin_wrong_password() {
    let user = users::Model {
        id: 7,
        name: "Ada".to_string(),
        email: "ada@example.com".to_string(),
        password_hash: hash_password("secret1").unwrap(),
        created_at: timestamp(),
        updated_at: timestamp(),
    };
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![user]])
        .into_connection();

    let response = app_with(db, Arc::new(MemoryObjectStore::new()))
        .oneshot(json_request(
            "POST",
            "/api/users/signin",
            &json!({ "email": "ada@example.com", "password": "wrong" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_get_user_not_found() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<users::Model>::new()])
        .into_connection();

    let response = app_with(db, Arc::new(MemoryObjectStore::new()))
        .oneshot(get("/api/users/42"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_projects_camel_case() {
    let project = projects::Model {
        id: 1,
        user_id: 7,
        project_name: "Atlas".to_string(),
        image: Some("data:image/png;base64,AQID".to_string()),
        description: None,
        created_at: timestamp(),
        updated_at: timestamp(),
    };
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![project]])
        .into_connection();

    let response = app_with(db, Arc::new(MemoryObjectStore::new()))
        .oneshot(get("/api/projects?userId=7"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body[0]["projectName"], "Atlas");
    assert_eq!(body[0]["userId"], 7);
    assert_eq!(body[0]["image"], "data:image/png;base64,AQID");
}

#[tokio::test]
async fn test_search_requires_query() {
    let response = app().oneshot(get("/api/projects/search")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_requires_user_id() {
    let response = app()
        .oneshot(json_request(
            "PUT",
            "/api/projects/1",
            &json!({ "projectName": "Renamed" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["message"], "userId is required");
}

#[tokio::test]
async fn test_delete_requires_user_id() {
    let request = Request::builder()
        .method("DELETE")
        .uri("/api/projects/1")
        .body(Body::empty())
        .unwrap();
    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_with_user_id_in_body() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results([MockExecResult {
            last_insert_id: 0,
            rows_affected: 1,
        }])
        .into_connection();

    let response = app_with(db, Arc::new(MemoryObjectStore::new()))
        .oneshot(json_request(
            "DELETE",
            "/api/projects/1",
            &json!({ "userId": 7 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}
