use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{
        Request, StatusCode,
        header::{AUTHORIZATION, CONTENT_DISPOSITION, CONTENT_TYPE},
    },
};
use chrono::{Duration, SecondsFormat, Utc};
use http_body_util::BodyExt;
use jms_backend::{
    app,
    config::Config,
    database::{KvStore, MemoryStore},
    records::{Record, SiteVisit, storage_key},
    state::AppState,
};
use serde_json::{Value, json};
use tower::ServiceExt;

const TOKEN: &str = "pit-lane-secret";

fn test_app(admin_token: Option<&str>) -> (Router, Arc<MemoryStore>) {
    let kv = Arc::new(MemoryStore::new());

    let state = Arc::new(AppState {
        config: Config {
            port: 0,
            redis_url: String::new(),
            admin_token: admin_token.map(str::to_string),
        },
        kv: kv.clone(),
    });

    (app(state), kv)
}

fn post_json(path: &str, body: Value) -> Request<Body> {
    Request::post(path)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_as_admin(path: &str, token: &str) -> Request<Body> {
    Request::get(path)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

fn get_plain(path: &str) -> Request<Body> {
    Request::get(path).body(Body::empty()).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, String) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();

    (status, String::from_utf8(body.to_vec()).unwrap())
}

async fn seed_visit(kv: &MemoryStore, page: &str, referrer: &str, back: Duration) {
    let timestamp = (Utc::now() - back).to_rfc3339_opts(SecondsFormat::Millis, true);

    let visit = SiteVisit {
        page: page.into(),
        referrer: referrer.into(),
        user_agent: "Mozilla/5.0".into(),
        timestamp: timestamp.clone(),
    };

    kv.set(
        &storage_key(SiteVisit::PREFIX, &timestamp),
        serde_json::to_value(&visit).unwrap(),
    )
    .await
    .unwrap();
}

#[tokio::test]
async fn health_reports_ok() {
    let (app, _) = test_app(None);

    let (status, body) = send(&app, get_plain("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"status":"ok"}"#);
}

#[tokio::test]
async fn contact_round_trips_through_export() {
    let (app, _) = test_app(Some(TOKEN));

    let (status, body) = send(
        &app,
        post_json(
            "/contact",
            json!({
                "name": "Jett Morris",
                "email": "jett@example.com",
                "message": "He said \"hi\""
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let ack: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(ack["success"], json!(true));
    assert_eq!(ack["message"], json!("Contact form submitted successfully"));

    let (status, csv) = send(&app, get_as_admin("/export/contacts", TOKEN)).await;

    assert_eq!(status, StatusCode::OK);

    let mut lines = csv.lines();
    assert_eq!(lines.next(), Some("Timestamp,Name,Email,Message"));

    let row = lines.next().unwrap();
    assert!(row.contains("\"Jett Morris\""));
    assert!(row.contains("\"jett@example.com\""));
    assert!(row.contains("\"He said \"\"hi\"\"\""));
    assert_eq!(lines.next(), None, "exactly one record expected");
}

#[tokio::test]
async fn contact_missing_email_writes_nothing() {
    let (app, kv) = test_app(Some(TOKEN));

    let (status, body) = send(
        &app,
        post_json("/contact", json!({ "name": "Jett", "message": "hello" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Missing required fields"));

    assert!(kv.get_by_prefix("contact:").await.unwrap().is_empty());
}

#[tokio::test]
async fn signup_persists_one_record() {
    let (app, kv) = test_app(None);

    let (status, _) = send(&app, post_json("/signup", json!({ "email": "fan@example.com" }))).await;
    assert_eq!(status, StatusCode::OK);

    let records = kv.get_by_prefix("signup:").await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["email"], json!("fan@example.com"));
}

#[tokio::test]
async fn signup_requires_email() {
    let (app, _) = test_app(None);

    let (status, body) = send(&app, post_json("/signup", json!({}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Email is required"));
}

#[tokio::test]
async fn empty_export_is_not_found_plain_text() {
    let (app, _) = test_app(Some(TOKEN));

    let (status, body) = send(&app, get_as_admin("/export/contacts", TOKEN)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, "No contact submissions found");

    let (status, body) = send(&app, get_as_admin("/export/signups", TOKEN)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, "No email signups found");

    let (status, body) = send(&app, get_as_admin("/export/visits", TOKEN)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, "No site visits found");
}

#[tokio::test]
async fn export_rejects_wrong_token() {
    let (app, kv) = test_app(Some(TOKEN));
    seed_visit(&kv, "/", "", Duration::minutes(5)).await;

    let (status, _) = send(&app, get_as_admin("/export/visits", "wrong-token")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, get_plain("/export/visits")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn export_without_configured_token_is_server_error() {
    let (app, _) = test_app(None);

    let (status, body) = send(&app, get_as_admin("/export/contacts", TOKEN)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains("Server misconfiguration"));
}

#[tokio::test]
async fn export_sets_download_headers() {
    let (app, kv) = test_app(Some(TOKEN));
    seed_visit(&kv, "/", "", Duration::minutes(5)).await;

    let response = app
        .clone()
        .oneshot(get_as_admin("/export/visits", TOKEN))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[CONTENT_TYPE], "text/csv");
    assert_eq!(
        response.headers()[CONTENT_DISPOSITION],
        "attachment; filename=site-visits.csv"
    );
}

#[tokio::test]
async fn visit_beacon_acks_without_message() {
    let (app, _) = test_app(None);

    let (status, body) = send(
        &app,
        post_json(
            "/track/visit",
            json!({ "page": "/", "referrer": "", "userAgent": "Mozilla/5.0" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"success":true}"#);
}

#[tokio::test]
async fn visit_requires_page() {
    let (app, kv) = test_app(None);

    let (status, _) = send(&app, post_json("/track/visit", json!({ "referrer": "x" }))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(kv.get_by_prefix("visit:").await.unwrap().is_empty());
}

#[tokio::test]
async fn stats_with_no_visits_is_zeroed() {
    let (app, _) = test_app(None);

    let (status, body) = send(&app, get_plain("/stats/visits")).await;

    assert_eq!(status, StatusCode::OK);
    let summary: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(summary["totalVisits"], json!(0));
    assert_eq!(summary["visitsToday"], json!(0));
    assert_eq!(summary["visitsThisWeek"], json!(0));
    assert_eq!(summary["visitsThisMonth"], json!(0));
    assert_eq!(summary["pages"], json!({}));
    assert_eq!(summary["topReferrers"], json!([]));
}

#[tokio::test]
async fn stats_buckets_visits_by_window() {
    let (app, kv) = test_app(None);

    seed_visit(&kv, "/", "", Duration::minutes(40)).await;
    seed_visit(&kv, "/schedule", "https://google.com", Duration::days(2)).await;
    seed_visit(&kv, "/", "", Duration::days(10)).await;
    seed_visit(&kv, "/sponsors", "https://google.com", Duration::days(40)).await;

    let (status, body) = send(&app, get_plain("/stats/visits")).await;

    assert_eq!(status, StatusCode::OK);
    let summary: Value = serde_json::from_str(&body).unwrap();

    assert_eq!(summary["totalVisits"], json!(4));
    assert_eq!(summary["visitsThisWeek"], json!(2));
    assert_eq!(summary["visitsThisMonth"], json!(3));
    assert_eq!(summary["pages"]["/"], json!(2));
    assert_eq!(summary["pages"]["/schedule"], json!(1));

    let referrers = summary["topReferrers"].as_array().unwrap();
    assert_eq!(referrers[0]["referrer"], json!("direct"));
    assert_eq!(referrers[0]["count"], json!(2));
    assert_eq!(referrers[1]["referrer"], json!("https://google.com"));
}

#[tokio::test]
async fn export_rows_are_chronological() {
    let (app, kv) = test_app(Some(TOKEN));

    // Seeded newest-first, the download should still read oldest-first.
    seed_visit(&kv, "/new", "", Duration::minutes(1)).await;
    seed_visit(&kv, "/old", "", Duration::days(3)).await;

    let (status, csv) = send(&app, get_as_admin("/export/visits", TOKEN)).await;

    assert_eq!(status, StatusCode::OK);
    let rows: Vec<&str> = csv.lines().skip(1).collect();
    assert_eq!(rows.len(), 2);
    assert!(rows[0].contains("\"/old\""));
    assert!(rows[1].contains("\"/new\""));
}
