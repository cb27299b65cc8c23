//! HTTP API integration tests
//!
//! **Coverage:**
//! - Request validation and error-status mapping at the JSON boundary
//! - The create → join → suggest → vote group lifecycle over HTTP
//! - Conflict and permission rejections (double respond, outsider vote)
//! - Quota degradation surfaced as 429/502 without touching the network
//! - Health reporting of quota usage and cache counters
//!
//! **Infrastructure:**
//! - In-process router driven through `tower::ServiceExt::oneshot`
//! - No network: availability requests stop at validation or the quota gate

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use slotwise_api::{app, AppContext};
use slotwise_domain::Config;

// ============================================================================
// Test Helpers
// ============================================================================

fn quiet_config() -> Config {
    let mut config = Config::default();
    config.coordination.sweep_enabled = false;
    config
}

async fn test_app() -> (Router, Arc<AppContext>) {
    test_app_with(quiet_config()).await
}

async fn test_app_with(config: Config) -> (Router, Arc<AppContext>) {
    let ctx = Arc::new(AppContext::new_with_config(config).await.unwrap());
    (app(Arc::clone(&ctx)), ctx)
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn delete(uri: &str) -> Request<Body> {
    Request::builder().method("DELETE").uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

/// Creates a group and returns the parsed creation body.
async fn create_group(app: &Router, creator: &str, name: &str, invitees: &[&str]) -> Value {
    let response = send(
        app,
        post_json(
            "/api/groups",
            &json!({ "creatorEmail": creator, "groupName": name, "inviteeEmails": invitees }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await
}

async fn join(app: &Router, group_id: &str, email: &str) -> Response {
    send(
        app,
        post_json(&format!("/api/groups/{group_id}/join"), &json!({ "email": email })),
    )
    .await
}

fn valid_availability_body() -> Value {
    json!({
        "participants": [
            { "accessToken": "ya29.first" },
            { "accessToken": "ya29.second" }
        ],
        "windowStart": "2026-09-07T00:00:00Z",
        "windowEnd": "2026-09-08T00:00:00Z",
        "slotDurationMinutes": 30,
        "dayWindowStart": "09:00",
        "dayWindowEnd": "17:00"
    })
}

// ============================================================================
// Validation and Error Mapping
// ============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn availability_rejects_empty_participants() {
    let (app, _ctx) = test_app().await;

    let mut body = valid_availability_body();
    body["participants"] = json!([]);
    let response = send(&app, post_json("/api/availability", &body)).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error = body_json(response).await;
    assert_eq!(error["error"]["type"], "NoParticipants");
}

#[tokio::test(flavor = "multi_thread")]
async fn availability_rejects_malformed_day_window() {
    let (app, _ctx) = test_app().await;

    let mut body = valid_availability_body();
    body["dayWindowStart"] = json!("9am");
    let response = send(&app, post_json("/api/availability", &body)).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error = body_json(response).await;
    assert_eq!(error["error"]["type"], "InvalidRequest");
    assert!(error["error"]["message"].as_str().unwrap().contains("dayWindowStart"));
}

#[tokio::test(flavor = "multi_thread")]
async fn unknown_group_status_is_not_found() {
    let (app, _ctx) = test_app().await;

    let response = send(&app, get(&format!("/api/groups/{}/status", Uuid::new_v4()))).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let error = body_json(response).await;
    assert_eq!(error["error"]["type"], "NotFound");
}

#[tokio::test(flavor = "multi_thread")]
async fn joining_without_an_invitation_is_forbidden() {
    let (app, _ctx) = test_app().await;
    let created = create_group(&app, "ada@example.com", "Sprint sync", &["bob@example.com"]).await;
    let group_id = created["groupId"].as_str().unwrap();

    let response = join(&app, group_id, "mallory@example.com").await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let error = body_json(response).await;
    assert_eq!(error["error"]["type"], "NotInvited");
}

// ============================================================================
// Group Lifecycle
// ============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn group_lifecycle_reaches_a_finalized_suggestion() {
    let (app, _ctx) = test_app().await;

    // The organizer invites themselves along with the attendee.
    let created = create_group(
        &app,
        "ada@example.com",
        "Design review",
        &["ada@example.com", "bob@example.com"],
    )
    .await;
    let group_id = created["groupId"].as_str().unwrap().to_string();
    assert_eq!(created["invitations"].as_array().unwrap().len(), 2);

    assert_eq!(join(&app, &group_id, "ada@example.com").await.status(), StatusCode::OK);

    let response = send(&app, get(&format!("/api/groups/{group_id}/status"))).await;
    let status = body_json(response).await;
    assert_eq!(status["status"], "forming");

    assert_eq!(join(&app, &group_id, "bob@example.com").await.status(), StatusCode::OK);

    let response = send(&app, get(&format!("/api/groups/{group_id}/status"))).await;
    let status = body_json(response).await;
    assert_eq!(status["status"], "all_joined");

    let response = send(
        &app,
        post_json(
            &format!("/api/groups/{group_id}/suggest"),
            &json!({
                "fromEmail": "ada@example.com",
                "start": "2026-09-07T10:00:00Z",
                "end": "2026-09-07T10:30:00Z",
                "title": "Kickoff"
            }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let suggestion_id = body_json(response).await["suggestionId"].as_str().unwrap().to_string();

    let vote_uri = format!("/api/groups/{group_id}/suggestions/{suggestion_id}/vote");
    let response = send(
        &app,
        post_json(&vote_uri, &json!({ "email": "ada@example.com", "choice": "accepted" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["finalized"], false);

    let response = send(
        &app,
        post_json(&vote_uri, &json!({ "email": "bob@example.com", "choice": "accepted" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["finalized"], true);

    // A vote after finalization is a state conflict.
    let response = send(
        &app,
        post_json(&vote_uri, &json!({ "email": "bob@example.com", "choice": "declined" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let error = body_json(response).await;
    assert_eq!(error["error"]["type"], "SuggestionFinalized");

    let response = send(&app, get(&format!("/api/groups/{group_id}/suggestions"))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let suggestions = body_json(response).await;
    assert_eq!(suggestions.as_array().unwrap().len(), 1);
    assert_eq!(suggestions[0]["finalized"], true);
    assert_eq!(suggestions[0]["votes"]["bob@example.com"], "accepted");
}

#[tokio::test(flavor = "multi_thread")]
async fn responding_twice_conflicts_and_decline_sticks() {
    let (app, _ctx) = test_app().await;
    let created =
        create_group(&app, "carol@example.com", "One on one", &["dave@example.com"]).await;
    let group_id = created["groupId"].as_str().unwrap().to_string();
    let invitation_id = created["invitations"][0]["invitationId"].as_str().unwrap().to_string();

    let respond_uri = format!("/api/groups/{group_id}/respond");
    let response = send(
        &app,
        post_json(&respond_uri, &json!({ "invitationId": invitation_id, "accept": false })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let view = body_json(response).await;
    assert_eq!(view["members"][0]["state"], "declined");
    // The only invitee declined, so nothing active remains.
    assert_eq!(view["status"], "abandoned");

    let response = send(
        &app,
        post_json(&respond_uri, &json!({ "invitationId": invitation_id, "accept": true })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let error = body_json(response).await;
    assert_eq!(error["error"]["type"], "AlreadyResponded");

    // Membership stays declined after the rejected second response.
    let response = send(&app, get(&format!("/api/groups/{group_id}/status"))).await;
    let view = body_json(response).await;
    assert_eq!(view["members"][0]["state"], "declined");
}

#[tokio::test(flavor = "multi_thread")]
async fn outsiders_cannot_propose_or_vote() {
    let (app, _ctx) = test_app().await;
    let created = create_group(
        &app,
        "ada@example.com",
        "Retro",
        &["ada@example.com", "bob@example.com"],
    )
    .await;
    let group_id = created["groupId"].as_str().unwrap().to_string();
    join(&app, &group_id, "ada@example.com").await;

    let response = send(
        &app,
        post_json(
            &format!("/api/groups/{group_id}/suggest"),
            &json!({
                "fromEmail": "mallory@example.com",
                "start": "2026-09-07T10:00:00Z",
                "end": "2026-09-07T11:00:00Z",
                "title": "Hijack"
            }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let error = body_json(response).await;
    assert_eq!(error["error"]["type"], "NotJoined");

    // Invited but not joined is still not enough to vote.
    let response = send(
        &app,
        post_json(
            &format!("/api/groups/{group_id}/suggest"),
            &json!({
                "fromEmail": "ada@example.com",
                "start": "2026-09-07T10:00:00Z",
                "end": "2026-09-07T11:00:00Z",
                "title": "Planning"
            }),
        ),
    )
    .await;
    let suggestion_id = body_json(response).await["suggestionId"].as_str().unwrap().to_string();
    let response = send(
        &app,
        post_json(
            &format!("/api/groups/{group_id}/suggestions/{suggestion_id}/vote"),
            &json!({ "email": "bob@example.com", "choice": "accepted" }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test(flavor = "multi_thread")]
async fn deleting_a_group_erases_it() {
    let (app, _ctx) = test_app().await;
    let created = create_group(&app, "ada@example.com", "Temporary", &["bob@example.com"]).await;
    let group_id = created["groupId"].as_str().unwrap().to_string();

    let response = send(&app, delete(&format!("/api/groups/{group_id}"))).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = send(&app, get(&format!("/api/groups/{group_id}/status"))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ============================================================================
// Quota Degradation
// ============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn exhausted_read_quota_maps_to_too_many_requests() {
    let mut config = quiet_config();
    config.quota.read_ceiling = 0;
    let (app, _ctx) = test_app_with(config).await;

    // The denied status read flips the read quota into maintenance.
    let response = send(&app, get(&format!("/api/groups/{}/status", Uuid::new_v4()))).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    // Availability now fails fast at the engine's quota gate.
    let response = send(&app, post_json("/api/availability", &valid_availability_body())).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let error = body_json(response).await;
    assert_eq!(error["error"]["type"], "QuotaExhausted");
}

#[tokio::test(flavor = "multi_thread")]
async fn zero_readable_calendars_map_to_bad_gateway() {
    let mut config = quiet_config();
    config.quota.read_ceiling = 0;
    let (app, _ctx) = test_app_with(config).await;

    // Maintenance is not active yet, so the request fans out; every per-call
    // admission is denied and no participant is readable.
    let response = send(&app, post_json("/api/availability", &valid_availability_body())).await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let error = body_json(response).await;
    assert_eq!(error["error"]["type"], "AllProvidersFailed");
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn health_reports_quota_and_cache_counters() {
    let (app, ctx) = test_app().await;

    let response = send(&app, get("/api/health")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let health = body_json(response).await;
    assert_eq!(health["status"], "ok");
    assert_eq!(health["groups"], 0);
    assert_eq!(health["quota"]["reads"], 0);
    assert_eq!(health["cache"]["entries"], 0);

    create_group(&app, "ada@example.com", "Tracked", &["bob@example.com"]).await;

    let response = send(&app, get("/api/health")).await;
    let health = body_json(response).await;
    assert_eq!(health["groups"], 1);
    assert_eq!(health["quota"]["writes"], 1);
    assert_eq!(
        health["quota"]["writeCeiling"],
        ctx.config.quota.write_ceiling
    );
}
