use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use futures::StreamExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use vod_gateway::{
    auth::TokenService,
    config::Config,
    database::Database,
    models::Role,
    services::{AnalyticsService, MetricsService, TrendingService},
    web::{AppState, WebServer},
};

async fn test_state() -> AppState {
    let mut config = Config::default();
    config.database.url = "sqlite::memory:".to_string();
    config.database.max_connections = Some(1);
    config.auth.token_secret = "admin-integration-secret".to_string();

    let database = Database::new(&config.database).await.unwrap();
    database.migrate().await.unwrap();

    let token_service = TokenService::new(&config.auth);
    AppState {
        analytics: AnalyticsService::new(database.clone()),
        trending: TrendingService::new(database.clone()),
        metrics: MetricsService::new(database.clone()),
        http_client: reqwest::Client::new(),
        token_service,
        database,
        config,
    }
}

fn admin_bearer(state: &AppState) -> String {
    let token = state
        .token_service
        .mint_session_token(&Uuid::new_v4().to_string(), Role::Admin)
        .unwrap();
    format!("Bearer {token}")
}

fn user_bearer(state: &AppState) -> String {
    let token = state
        .token_service
        .mint_session_token(&Uuid::new_v4().to_string(), Role::User)
        .unwrap();
    format!("Bearer {token}")
}

async fn send_request(
    app: &Router,
    method: Method,
    uri: &str,
    headers: &[(&str, &str)],
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request_builder = Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        request_builder = request_builder.header(*name, *value);
    }

    let request = if let Some(body) = body {
        request_builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap()
    } else {
        request_builder.body(Body::empty()).unwrap()
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();

    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    let json: Value = if body_bytes.is_empty() {
        json!({})
    } else {
        serde_json::from_slice(&body_bytes).unwrap_or(json!({}))
    };

    (status, json)
}

async fn seed_video(database: &Database, title: &str, views: i64, age_hours: i64) -> Uuid {
    let id = Uuid::new_v4();
    let created_at = (Utc::now() - Duration::hours(age_hours)).to_rfc3339();
    sqlx::query(
        "INSERT INTO videos (id, title, source_url, duration_seconds, views, is_trending, created_at, updated_at)
         VALUES (?, ?, ?, 300, ?, FALSE, ?, ?)",
    )
    .bind(id.to_string())
    .bind(title)
    .bind("http://127.0.0.1:9/video.mp4")
    .bind(views)
    .bind(&created_at)
    .bind(&created_at)
    .execute(&database.pool())
    .await
    .unwrap();
    id
}

async fn seed_session(database: &Database, session_id: &str, ip_hash: &str, seen: DateTime<Utc>) {
    sqlx::query(
        "INSERT INTO analytics_sessions (session_id, user_id, user_agent, ip_hash, first_seen_at, last_seen_at)
         VALUES (?, NULL, 'seed', ?, ?, ?)",
    )
    .bind(session_id)
    .bind(ip_hash)
    .bind(seen.to_rfc3339())
    .bind(seen.to_rfc3339())
    .execute(&database.pool())
    .await
    .unwrap();
}

async fn seed_event(
    database: &Database,
    session_id: &str,
    event_type: &str,
    watch_seconds: Option<i64>,
    at: DateTime<Utc>,
) {
    sqlx::query(
        "INSERT INTO analytics_events (session_id, event_type, path, video_id, watch_seconds, created_at)
         VALUES (?, ?, NULL, NULL, ?, ?)",
    )
    .bind(session_id)
    .bind(event_type)
    .bind(watch_seconds)
    .bind(at.to_rfc3339())
    .execute(&database.pool())
    .await
    .unwrap();
}

async fn seed_comment(database: &Database, video_id: Uuid) {
    sqlx::query("INSERT INTO comments (id, video_id, body, created_at) VALUES (?, ?, '', ?)")
        .bind(Uuid::new_v4().to_string())
        .bind(video_id.to_string())
        .bind(Utc::now().to_rfc3339())
        .execute(&database.pool())
        .await
        .unwrap();
}

async fn seed_like(database: &Database, video_id: Uuid) {
    sqlx::query("INSERT INTO video_likes (video_id, user_id, created_at) VALUES (?, ?, ?)")
        .bind(video_id.to_string())
        .bind(Uuid::new_v4().to_string())
        .bind(Utc::now().to_rfc3339())
        .execute(&database.pool())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_health_endpoint() {
    let state = test_state().await;
    let app = WebServer::create_router(state);

    let (status, response) = send_request(&app, Method::GET, "/health", &[], None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["status"], "healthy");
    assert!(response.get("timestamp").is_some());
}

#[tokio::test]
async fn test_admin_endpoints_require_the_admin_role() {
    let state = test_state().await;
    let admin = admin_bearer(&state);
    let user = user_bearer(&state);
    let app = WebServer::create_router(state);

    let (status, response) =
        send_request(&app, Method::GET, "/api/admin/trending-settings", &[], None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(response["error"], "unauthorized");

    let (status, response) = send_request(
        &app,
        Method::GET,
        "/api/admin/trending-settings",
        &[("authorization", "Bearer garbage")],
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(response["error"], "unauthorized");

    let (status, response) = send_request(
        &app,
        Method::GET,
        "/api/admin/trending-settings",
        &[("authorization", user.as_str())],
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(response["error"], "forbidden");

    let (status, _) = send_request(
        &app,
        Method::GET,
        "/api/admin/trending-settings",
        &[("authorization", admin.as_str())],
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_settings_default_on_first_access() {
    let state = test_state().await;
    let admin = admin_bearer(&state);
    let app = WebServer::create_router(state);

    let (status, settings) = send_request(
        &app,
        Method::GET,
        "/api/admin/trending-settings",
        &[("authorization", admin.as_str())],
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(settings["minViews"], 1000);
    assert_eq!(settings["maxAgeHours"], 72);
    assert_eq!(settings["maxItems"], 20);
    assert_eq!(settings["autoRefresh"], true);
    assert_eq!(settings["pinnedVideoIds"], json!([]));
}

#[tokio::test]
async fn test_settings_patch_merges_and_validates() {
    let state = test_state().await;
    let admin = admin_bearer(&state);
    let app = WebServer::create_router(state);
    let auth = [("authorization", admin.as_str())];

    let (status, response) = send_request(
        &app,
        Method::PATCH,
        "/api/admin/trending-settings",
        &auth,
        Some(json!({ "minViews": 10, "autoRefresh": false })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["success"], true);

    let (_, settings) = send_request(
        &app,
        Method::GET,
        "/api/admin/trending-settings",
        &auth,
        None,
    )
    .await;
    assert_eq!(settings["minViews"], 10);
    assert_eq!(settings["autoRefresh"], false);
    // Untouched fields keep their values.
    assert_eq!(settings["maxAgeHours"], 72);
    assert_eq!(settings["maxItems"], 20);

    for invalid in [
        json!({ "minViews": -1 }),
        json!({ "maxAgeHours": 0 }),
        json!({ "maxAgeHours": 9000 }),
        json!({ "maxItems": 0 }),
        json!({ "maxItems": 500 }),
    ] {
        let (status, response) = send_request(
            &app,
            Method::PATCH,
            "/api/admin/trending-settings",
            &auth,
            Some(invalid),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(response["error"], "invalid_settings");
    }
}

#[tokio::test]
async fn test_settings_patch_dedupes_pins() {
    let state = test_state().await;
    let admin = admin_bearer(&state);
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();
    let app = WebServer::create_router(state);
    let auth = [("authorization", admin.as_str())];

    let (status, _) = send_request(
        &app,
        Method::PATCH,
        "/api/admin/trending-settings",
        &auth,
        Some(json!({
            "pinnedVideoIds": [a.to_string(), b.to_string(), a.to_string()],
            "autoRefresh": false,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, settings) = send_request(
        &app,
        Method::GET,
        "/api/admin/trending-settings",
        &auth,
        None,
    )
    .await;
    assert_eq!(
        settings["pinnedVideoIds"],
        json!([a.to_string(), b.to_string()])
    );
}

#[tokio::test]
async fn test_recompute_reconciles_pins_and_organic_selection() {
    let state = test_state().await;
    let admin = admin_bearer(&state);

    // Pinned despite being old and unpopular.
    let p1 = seed_video(&state.database, "pinned", 10, 2000).await;
    let a = seed_video(&state.database, "a", 5000, 10).await;
    let b = seed_video(&state.database, "b", 3000, 50).await;
    // Popular but beyond the age window.
    let c = seed_video(&state.database, "c", 9000, 200).await;

    let app = WebServer::create_router(state.clone());
    let auth = [("authorization", admin.as_str())];

    let (status, _) = send_request(
        &app,
        Method::PATCH,
        "/api/admin/trending-settings",
        &auth,
        Some(json!({
            "minViews": 1000,
            "maxAgeHours": 72,
            "maxItems": 2,
            "pinnedVideoIds": [p1.to_string()],
            "autoRefresh": false,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, response) = send_request(
        &app,
        Method::POST,
        "/api/admin/trending-settings/recompute",
        &auth,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["success"], true);

    let trending = state.database.list_trending_video_ids().await.unwrap();
    assert_eq!(trending.len(), 3);
    assert!(trending.contains(&p1));
    assert!(trending.contains(&a));
    assert!(trending.contains(&b));
    assert!(!trending.contains(&c));
    // Most viewed first.
    assert_eq!(trending[0], a);
    assert_eq!(trending[1], b);

    // Recomputing again over unchanged data yields the same set.
    let (status, _) = send_request(
        &app,
        Method::POST,
        "/api/admin/trending-settings/recompute",
        &auth,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let again = state.database.list_trending_video_ids().await.unwrap();
    assert_eq!(again, trending);
}

#[tokio::test]
async fn test_saving_with_auto_refresh_triggers_recompute() {
    let state = test_state().await;
    let admin = admin_bearer(&state);
    let video = seed_video(&state.database, "fresh hit", 5000, 5).await;
    let app = WebServer::create_router(state.clone());

    let (status, _) = send_request(
        &app,
        Method::PATCH,
        "/api/admin/trending-settings",
        &[("authorization", admin.as_str())],
        Some(json!({ "minViews": 100, "autoRefresh": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // No explicit recompute call: the save itself reconciled the flags.
    let trending = state.database.list_trending_video_ids().await.unwrap();
    assert_eq!(trending, vec![video]);
}

#[tokio::test]
async fn test_unknown_pinned_ids_are_ignored() {
    let state = test_state().await;
    let admin = admin_bearer(&state);
    let video = seed_video(&state.database, "organic", 2000, 10).await;
    let app = WebServer::create_router(state.clone());
    let auth = [("authorization", admin.as_str())];

    let (status, _) = send_request(
        &app,
        Method::PATCH,
        "/api/admin/trending-settings",
        &auth,
        Some(json!({
            "minViews": 1000,
            "pinnedVideoIds": [Uuid::new_v4().to_string()],
            "autoRefresh": false,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send_request(
        &app,
        Method::POST,
        "/api/admin/trending-settings/recompute",
        &auth,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let trending = state.database.list_trending_video_ids().await.unwrap();
    assert_eq!(trending, vec![video]);
}

#[tokio::test]
async fn test_insights_rank_recent_engagement() {
    let state = test_state().await;
    let admin = admin_bearer(&state);

    let strong = seed_video(&state.database, "strong", 2000, 5).await;
    for _ in 0..3 {
        seed_comment(&state.database, strong).await;
    }
    seed_like(&state.database, strong).await;
    seed_like(&state.database, strong).await;

    let weak = seed_video(&state.database, "weak", 50, 100).await;
    // Outside the 7-day window entirely.
    seed_video(&state.database, "stale", 90000, 200).await;

    let app = WebServer::create_router(state);
    let (status, response) = send_request(
        &app,
        Method::GET,
        "/api/admin/trending-insights",
        &[("authorization", admin.as_str())],
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let insights = response["insights"].as_array().unwrap();
    assert_eq!(insights.len(), 2);

    assert_eq!(insights[0]["id"], strong.to_string());
    assert_eq!(insights[0]["title"], "strong");
    assert_eq!(insights[0]["views"], 2000);
    assert_eq!(insights[0]["comments"], 3);
    assert_eq!(insights[0]["likes"], 2);
    assert_eq!(insights[0]["saves"], 0);
    assert_eq!(insights[0]["isTrending"], false);
    let strong_age = insights[0]["ageHours"].as_f64().unwrap();
    assert!((strong_age - 5.0).abs() < 0.2);

    assert_eq!(insights[1]["id"], weak.to_string());
    let strong_score = insights[0]["trendingScore"].as_f64().unwrap();
    let weak_score = insights[1]["trendingScore"].as_f64().unwrap();
    assert!(strong_score > weak_score);
}

#[tokio::test]
async fn test_category_lifecycle() {
    let state = test_state().await;
    let admin = admin_bearer(&state);
    let video = seed_video(&state.database, "curated", 10, 1).await;
    let app = WebServer::create_router(state);
    let auth = [("authorization", admin.as_str())];

    // Create
    let (status, response) = send_request(
        &app,
        Method::POST,
        "/api/admin/trending-categories",
        &auth,
        Some(json!({ "name": "Editors Picks" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let category_id = response["id"].as_str().unwrap().to_string();

    // Duplicate name
    let (status, response) = send_request(
        &app,
        Method::POST,
        "/api/admin/trending-categories",
        &auth,
        Some(json!({ "name": "Editors Picks" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(response["error"], "category_exists");

    // Invalid names
    let too_long = "x".repeat(61);
    for bad in ["", "   ", too_long.as_str()] {
        let (status, response) = send_request(
            &app,
            Method::POST,
            "/api/admin/trending-categories",
            &auth,
            Some(json!({ "name": bad })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(response["error"], "invalid_name");
    }

    // List
    let (status, response) = send_request(
        &app,
        Method::GET,
        "/api/admin/trending-categories",
        &auth,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let categories = response["categories"].as_array().unwrap();
    assert_eq!(categories.len(), 1);
    assert_eq!(categories[0]["name"], "Editors Picks");

    // Assign, idempotently
    let assign_uri = format!("/api/admin/trending-categories/{category_id}/videos");
    for _ in 0..2 {
        let (status, _) = send_request(
            &app,
            Method::POST,
            &assign_uri,
            &auth,
            Some(json!({ "videoId": video.to_string() })),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    let (status, response) = send_request(&app, Method::GET, &assign_uri, &auth, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["videoIds"], json!([video.to_string()]));

    // Unassign is idempotent too
    let unassign_uri = format!("/api/admin/trending-categories/{category_id}/videos/{video}");
    for _ in 0..2 {
        let (status, _) = send_request(&app, Method::DELETE, &unassign_uri, &auth, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    let (_, response) = send_request(&app, Method::GET, &assign_uri, &auth, None).await;
    assert_eq!(response["videoIds"], json!([]));

    // Delete the category
    let delete_uri = format!("/api/admin/trending-categories/{category_id}");
    let (status, _) = send_request(&app, Method::DELETE, &delete_uri, &auth, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, response) = send_request(&app, Method::DELETE, &delete_uri, &auth, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(response["error"], "not_found");
}

#[tokio::test]
async fn test_category_name_cap_counts_characters() {
    let state = test_state().await;
    let admin = admin_bearer(&state);
    let app = WebServer::create_router(state);
    let auth = [("authorization", admin.as_str())];

    // Sixty characters is within the cap even when every one is multibyte.
    let (status, _) = send_request(
        &app,
        Method::POST,
        "/api/admin/trending-categories",
        &auth,
        Some(json!({ "name": "é".repeat(60) })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, response) = send_request(
        &app,
        Method::POST,
        "/api/admin/trending-categories",
        &auth,
        Some(json!({ "name": "é".repeat(61) })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["error"], "invalid_name");
}

#[tokio::test]
async fn test_category_assignment_checks_both_sides() {
    let state = test_state().await;
    let admin = admin_bearer(&state);
    let video = seed_video(&state.database, "curated", 10, 1).await;
    let app = WebServer::create_router(state);
    let auth = [("authorization", admin.as_str())];

    // Unknown category
    let uri = format!("/api/admin/trending-categories/{}/videos", Uuid::new_v4());
    let (status, response) = send_request(
        &app,
        Method::POST,
        &uri,
        &auth,
        Some(json!({ "videoId": video.to_string() })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(response["error"], "not_found");

    // Known category, unknown video
    let (status, response) = send_request(
        &app,
        Method::POST,
        "/api/admin/trending-categories",
        &auth,
        Some(json!({ "name": "Staff" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let category_id = response["id"].as_str().unwrap().to_string();

    let uri = format!("/api/admin/trending-categories/{category_id}/videos");
    let (status, response) = send_request(
        &app,
        Method::POST,
        &uri,
        &auth,
        Some(json!({ "videoId": Uuid::new_v4().to_string() })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(response["error"], "not_found");
}

#[tokio::test]
async fn test_live_stream_authorizes_before_opening() {
    let state = test_state().await;
    let admin_token = state
        .token_service
        .mint_session_token(&Uuid::new_v4().to_string(), Role::Admin)
        .unwrap();
    let user_token = state
        .token_service
        .mint_session_token(&Uuid::new_v4().to_string(), Role::User)
        .unwrap();
    let app = WebServer::create_router(state);

    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/admin/live")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .method(Method::GET)
        .uri(format!("/api/admin/live?token={user_token}"))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Valid admin token: stream opens and pushes a snapshot right away.
    let request = Request::builder()
        .method(Method::GET)
        .uri(format!("/api/admin/live?token={admin_token}"))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "text/event-stream"
    );
    assert_eq!(
        response.headers().get("cache-control").unwrap(),
        "no-cache, no-transform"
    );

    let mut frames = response.into_body().into_data_stream();
    let first = tokio::time::timeout(std::time::Duration::from_secs(5), frames.next())
        .await
        .expect("first frame arrives on open")
        .unwrap()
        .unwrap();
    let frame = String::from_utf8(first.to_vec()).unwrap();
    assert!(frame.starts_with("event: metrics\n"), "frame: {frame}");
    let data = frame
        .lines()
        .find_map(|line| line.strip_prefix("data: "))
        .unwrap();
    let payload: Value = serde_json::from_str(data).unwrap();
    assert!(payload["totals"]["totalViews"].is_number());
    assert!(payload["serverTime"].is_string());
}

#[tokio::test]
async fn test_metrics_snapshot_aggregates_current_totals() {
    let state = test_state().await;
    let now = Utc::now();

    let watched = seed_video(&state.database, "watched", 100, 3).await;
    seed_video(&state.database, "other", 50, 3).await;
    seed_comment(&state.database, watched).await;

    seed_session(&state.database, "active", "hash-a", now - Duration::minutes(1)).await;
    seed_session(&state.database, "stale", "hash-b", now - Duration::hours(30)).await;
    seed_event(&state.database, "active", "view", None, now - Duration::minutes(10)).await;
    seed_event(&state.database, "active", "watch", Some(25), now - Duration::minutes(9)).await;
    seed_event(&state.database, "stale", "view", None, now - Duration::hours(30)).await;

    let snapshot = state.metrics.snapshot(now).await.unwrap();

    assert_eq!(snapshot.totals.total_views, 150);
    assert_eq!(snapshot.totals.active_now, 1);
    assert_eq!(snapshot.totals.visitors_24h, 1);
    assert_eq!(snapshot.totals.views_today, 1);
    assert_eq!(snapshot.totals.watch_seconds_today, 25);
    assert_eq!(snapshot.totals.videos, 2);
    assert_eq!(snapshot.totals.comments, 1);
    assert_eq!(snapshot.totals.trending, 0);

    // The SSE frame payload for this snapshot is camelCase.
    let frame = serde_json::to_value(&snapshot).unwrap();
    assert_eq!(frame["totals"]["totalViews"], 150);
    assert_eq!(frame["totals"]["visitors24h"], 1);
    assert_eq!(frame["totals"]["watchSecondsToday"], 25);
    assert!(frame["serverTime"].is_string());
}

#[tokio::test]
async fn test_analytics_report_buckets_by_hour() {
    let state = test_state().await;
    let admin = admin_bearer(&state);

    let base = Utc.with_ymd_and_hms(2026, 8, 20, 10, 0, 0).unwrap();
    seed_session(&state.database, "sa", "h1", base).await;
    seed_session(&state.database, "sb", "h2", base).await;
    seed_session(&state.database, "sc", "h3", base).await;

    seed_event(&state.database, "sa", "view", None, base + Duration::minutes(5)).await;
    seed_event(&state.database, "sb", "view", None, base + Duration::minutes(25)).await;
    seed_event(&state.database, "sc", "watch", Some(20), base + Duration::minutes(30)).await;
    seed_event(&state.database, "sa", "view", None, base + Duration::minutes(75)).await;

    let app = WebServer::create_router(state);
    let uri = "/api/admin/analytics?from=2026-08-20T10:00:00Z&to=2026-08-20T12:00:00Z&bucket=hour";
    let (status, report) = send_request(
        &app,
        Method::GET,
        uri,
        &[("authorization", admin.as_str())],
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["range"]["bucket"], "hour");
    assert_eq!(report["totals"]["viewsInRange"], 3);
    assert_eq!(report["totals"]["watchSecondsInRange"], 20);

    let series = report["series"].as_array().unwrap();
    assert_eq!(series.len(), 2);
    assert_eq!(series[0]["bucket"], "2026-08-20T10:00:00Z");
    assert_eq!(series[0]["views"], 2);
    assert_eq!(series[0]["visitors"], 3);
    assert_eq!(series[1]["bucket"], "2026-08-20T11:00:00Z");
    assert_eq!(series[1]["views"], 1);
    assert_eq!(series[1]["visitors"], 1);
}

#[tokio::test]
async fn test_analytics_report_scopes_visitors_to_the_window() {
    let state = test_state().await;
    let admin = admin_bearer(&state);

    let inside = Utc.with_ymd_and_hms(2026, 8, 20, 11, 0, 0).unwrap();
    let long_ago = Utc.with_ymd_and_hms(2026, 5, 1, 0, 0, 0).unwrap();
    seed_session(&state.database, "current", "h-current", inside).await;
    seed_session(&state.database, "dormant", "h-dormant", long_ago).await;

    let app = WebServer::create_router(state);
    let uri = "/api/admin/analytics?from=2026-08-20T00:00:00Z&to=2026-08-21T00:00:00Z";
    let (status, report) = send_request(
        &app,
        Method::GET,
        uri,
        &[("authorization", admin.as_str())],
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    // Only the session last seen inside the window counts as a visitor.
    assert_eq!(report["totals"]["visitors"], 1);
}

#[tokio::test]
async fn test_analytics_report_defaults_to_a_week_of_days() {
    let state = test_state().await;
    let admin = admin_bearer(&state);
    let now = Utc::now();

    seed_session(&state.database, "recent", "h1", now - Duration::hours(1)).await;
    seed_event(&state.database, "recent", "view", None, now - Duration::hours(1)).await;

    let app = WebServer::create_router(state);
    let (status, report) = send_request(
        &app,
        Method::GET,
        "/api/admin/analytics",
        &[("authorization", admin.as_str())],
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["range"]["bucket"], "day");
    assert!(report["range"]["from"].is_string());
    assert!(report["range"]["to"].is_string());
    assert_eq!(report["totals"]["viewsInRange"], 1);
    assert_eq!(report["totals"]["todayViews"], 1);
    assert_eq!(report["series"].as_array().unwrap().len(), 1);
    assert!(report["serverTime"].is_string());
}

#[tokio::test]
async fn test_analytics_report_rejects_bad_query() {
    let state = test_state().await;
    let admin = admin_bearer(&state);
    let app = WebServer::create_router(state);
    let auth = [("authorization", admin.as_str())];

    let (status, response) = send_request(
        &app,
        Method::GET,
        "/api/admin/analytics?bucket=weekly",
        &auth,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["error"], "invalid_query");

    let (status, response) = send_request(
        &app,
        Method::GET,
        "/api/admin/analytics?from=yesterday",
        &auth,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["error"], "invalid_query");
}

#[tokio::test]
async fn test_analytics_report_inverted_window_is_empty() {
    let state = test_state().await;
    let admin = admin_bearer(&state);
    let now = Utc::now();
    seed_session(&state.database, "s", "h", now).await;
    seed_event(&state.database, "s", "view", None, now).await;

    let app = WebServer::create_router(state);
    let uri = "/api/admin/analytics?from=2026-08-20T00:00:00Z&to=2026-08-10T00:00:00Z";
    let (status, report) = send_request(
        &app,
        Method::GET,
        uri,
        &[("authorization", admin.as_str())],
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["totals"]["viewsInRange"], 0);
    assert_eq!(report["series"].as_array().unwrap().len(), 0);
}
