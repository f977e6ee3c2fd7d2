use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use hadir::config::Config;
use hadir::mailer::MemoryMailer;
use http_body_util::BodyExt;
use serde_json::json;
use tower::ServiceExt;

/// Seeded by the initial migration.
const ADMIN_EMAIL: &str = "admin@hadir.local";
const ADMIN_PASSWORD: &str = "password";

/// Seeded office coordinates.
const OFFICE_LAT: f64 = -6.97321;
const OFFICE_LON: f64 = 107.63014;

async fn spawn_app() -> (Router, Arc<MemoryMailer>) {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.server.secure_cookies = false;

    let mailer = Arc::new(MemoryMailer::default());

    let state = hadir::api::create_app_state_with_mailer(config, mailer.clone(), None)
        .await
        .expect("Failed to create app state");

    (hadir::api::router(state).await, mailer)
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Pulls the six-digit code out of the most recent email.
fn delivered_code(mailer: &MemoryMailer) -> String {
    let mail = mailer.last().expect("No email was delivered");
    let idx = mail
        .body
        .find("code is ")
        .expect("Email body has no code marker");
    mail.body[idx + 8..idx + 14].to_string()
}

/// Runs login + verify for the seeded admin and returns the session cookie.
async fn authenticate(app: &Router, mailer: &MemoryMailer) -> String {
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/auth/login",
            json!({"email": ADMIN_EMAIL, "password": ADMIN_PASSWORD}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let login = body_json(response).await;
    let user_id = login["data"]["user_id"].as_i64().unwrap();

    let code = delivered_code(mailer);

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/auth/verify",
            json!({"user_id": user_id, "code": code}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("Verify did not set a session cookie")
        .to_str()
        .unwrap();
    cookie.split(';').next().unwrap().to_string()
}

#[tokio::test]
async fn test_protected_routes_require_session() {
    let (app, _mailer) = spawn_app().await;

    for uri in [
        "/api/system/status",
        "/api/users",
        "/api/location",
        "/api/attendance",
        "/api/notifications",
    ] {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "uri: {uri}");
    }
}

#[tokio::test]
async fn test_login_rejects_wrong_password() {
    let (app, mailer) = spawn_app().await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/auth/login",
            json!({"email": ADMIN_EMAIL, "password": "not-the-password"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(mailer.sent().is_empty(), "No email should go out");
}

#[tokio::test]
async fn test_login_rejects_malformed_email() {
    let (app, _mailer) = spawn_app().await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/auth/login",
            json!({"email": "not-an-email", "password": "whatever"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_full_login_flow_and_me() {
    let (app, mailer) = spawn_app().await;
    let cookie = authenticate(&app, &mailer).await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/auth/me")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["email"], ADMIN_EMAIL);
}

#[tokio::test]
async fn test_verify_code_cannot_be_replayed() {
    let (app, mailer) = spawn_app().await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/auth/login",
            json!({"email": ADMIN_EMAIL, "password": ADMIN_PASSWORD}),
        ))
        .await
        .unwrap();
    let user_id = body_json(response).await["data"]["user_id"]
        .as_i64()
        .unwrap();
    let code = delivered_code(&mailer);

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/auth/verify",
            json!({"user_id": user_id, "code": code}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/auth/verify",
            json!({"user_id": user_id, "code": code}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_resend_supersedes_previous_code() {
    let (app, mailer) = spawn_app().await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/auth/login",
            json!({"email": ADMIN_EMAIL, "password": ADMIN_PASSWORD}),
        ))
        .await
        .unwrap();
    let user_id = body_json(response).await["data"]["user_id"]
        .as_i64()
        .unwrap();
    let first_code = delivered_code(&mailer);

    let response = app
        .clone()
        .oneshot(post_json("/api/auth/resend", json!({"user_id": user_id})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(mailer.sent().len(), 2);

    // The first code is dead once a new one is issued.
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/auth/verify",
            json!({"user_id": user_id, "code": first_code}),
        ))
        .await
        .unwrap();

    // Unless the resend happened to generate the same code again.
    let second_code = delivered_code(&mailer);
    if first_code == second_code {
        assert_eq!(response.status(), StatusCode::OK);
    } else {
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}

#[tokio::test]
async fn test_check_in_inside_geofence() {
    let (app, mailer) = spawn_app().await;
    let cookie = authenticate(&app, &mailer).await;

    let mut request = post_json(
        "/api/attendance/check-in",
        json!({
            "user_id": 1,
            "user_latitude": OFFICE_LAT,
            "user_longitude": OFFICE_LON,
        }),
    );
    request
        .headers_mut()
        .insert(header::COOKIE, cookie.parse().unwrap());

    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert!(body["data"]["attendance_id"].as_i64().unwrap() > 0);
    assert!(body["data"]["timestamp"].is_string());
}

#[tokio::test]
async fn test_check_in_outside_geofence() {
    let (app, mailer) = spawn_app().await;
    let cookie = authenticate(&app, &mailer).await;

    // Roughly a kilometre north of the office.
    let mut request = post_json(
        "/api/attendance/check-in",
        json!({
            "user_id": 1,
            "user_latitude": OFFICE_LAT + 0.009,
            "user_longitude": OFFICE_LON,
        }),
    );
    request
        .headers_mut()
        .insert(header::COOKIE, cookie.parse().unwrap());

    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // Nothing was recorded.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/attendance?user_id=1")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_check_in_then_check_out_history() {
    let (app, mailer) = spawn_app().await;
    let cookie = authenticate(&app, &mailer).await;

    for (uri, note) in [
        ("/api/attendance/check-in", "morning"),
        ("/api/attendance/check-out", "evening"),
    ] {
        let mut request = post_json(
            uri,
            json!({
                "user_id": 1,
                "user_latitude": OFFICE_LAT,
                "user_longitude": OFFICE_LON,
                "notes": note,
            }),
        );
        request
            .headers_mut()
            .insert(header::COOKIE, cookie.parse().unwrap());
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/attendance?user_id=1")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let records = body["data"].as_array().unwrap();
    assert_eq!(records.len(), 2);
    // Newest first.
    assert_eq!(records[0]["kind"], "checkout");
    assert_eq!(records[1]["kind"], "check-in");
    assert_eq!(records[0]["note"], "evening");
}

#[tokio::test]
async fn test_check_in_requires_coordinates() {
    let (app, mailer) = spawn_app().await;
    let cookie = authenticate(&app, &mailer).await;

    let mut request = post_json("/api/attendance/check-in", json!({"user_id": 1}));
    request
        .headers_mut()
        .insert(header::COOKIE, cookie.parse().unwrap());

    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_user_crud_and_duplicate_email() {
    let (app, mailer) = spawn_app().await;
    let cookie = authenticate(&app, &mailer).await;

    let mut request = post_json(
        "/api/users",
        json!({
            "name": "Siti Rahma",
            "email": "siti@hadir.local",
            "password": "a-long-password",
            "role": "student",
        }),
    );
    request
        .headers_mut()
        .insert(header::COOKIE, cookie.parse().unwrap());
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let created = body_json(response).await;
    let new_id = created["data"]["id"].as_i64().unwrap();
    assert_eq!(created["data"]["email"], "siti@hadir.local");

    // Same email again conflicts.
    let mut request = post_json(
        "/api/users",
        json!({
            "name": "Someone Else",
            "email": "siti@hadir.local",
            "password": "another-password",
        }),
    );
    request
        .headers_mut()
        .insert(header::COOKIE, cookie.parse().unwrap());
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Rename, then fetch.
    let mut request = post_json("/api/users", json!({}));
    *request.method_mut() = axum::http::Method::PUT;
    *request.uri_mut() = format!("/api/users/{new_id}").parse().unwrap();
    *request.body_mut() = Body::from(json!({"name": "Siti R."}).to_string());
    request
        .headers_mut()
        .insert(header::COOKIE, cookie.parse().unwrap());
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/users/{new_id}"))
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"]["name"], "Siti R.");

    // Delete, then 404.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/users/{new_id}"))
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/users/{new_id}"))
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_office_location_read_and_update() {
    let (app, mailer) = spawn_app().await;
    let cookie = authenticate(&app, &mailer).await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/location")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["name"], "Head Office");
    assert!((body["data"]["radius_m"].as_f64().unwrap() - 50.0).abs() < f64::EPSILON);

    let mut request = post_json("/api/location", json!({"radius_m": 120.0}));
    *request.method_mut() = axum::http::Method::PUT;
    request
        .headers_mut()
        .insert(header::COOKIE, cookie.parse().unwrap());
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!((body["data"]["radius_m"].as_f64().unwrap() - 120.0).abs() < f64::EPSILON);

    // Out-of-range latitude is rejected.
    let mut request = post_json("/api/location", json!({"latitude": 123.0}));
    *request.method_mut() = axum::http::Method::PUT;
    request
        .headers_mut()
        .insert(header::COOKIE, cookie.parse().unwrap());
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_notifications_crud() {
    let (app, mailer) = spawn_app().await;
    let cookie = authenticate(&app, &mailer).await;

    let mut request = post_json(
        "/api/notifications",
        json!({"title": "Holiday", "message": "Office closed on Friday"}),
    );
    request
        .headers_mut()
        .insert(header::COOKIE, cookie.parse().unwrap());
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let id = body_json(response).await["data"]["id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/notifications")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/notifications/{id}"))
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/notifications/{id}"))
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_system_status() {
    let (app, mailer) = spawn_app().await;
    let cookie = authenticate(&app, &mailer).await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/system/status")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["data"]["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(body["data"]["users"], 1);
}

#[tokio::test]
async fn test_health_endpoints_are_public() {
    let (app, _mailer) = spawn_app().await;

    for uri in ["/api/system/health/live", "/api/system/health/ready"] {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "uri: {uri}");
    }
}
