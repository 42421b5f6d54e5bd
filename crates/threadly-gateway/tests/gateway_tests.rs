// SPDX-FileCopyrightText: 2026 Threadly Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Router-level tests driven in-process with `tower::ServiceExt`.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use secrecy::SecretString;
use serde_json::{Value, json};
use threadly_core::{MentionStatus, MentionType, StorageAdapter};
use threadly_gateway::{AuthConfig, GatewayState, HealthState, build_router};
use threadly_test_utils::{
    ACCOUNT_PLATFORM_ID, FailPoint, PipelineHarness, analysis, sign_payload,
};
use threadly_threads::SignatureVerifier;
use tower::ServiceExt;

const APP_SECRET: &str = "app-secret";
const VERIFY_TOKEN: &str = "hub-token";
const OPERATOR_TOKEN: &str = "op-token";

fn verifier() -> SignatureVerifier {
    SignatureVerifier::new(SecretString::from(APP_SECRET), SecretString::from(VERIFY_TOKEN))
}

fn router(h: &PipelineHarness) -> Router {
    build_router(GatewayState {
        pipeline: h.pipeline.clone(),
        verifier: Arc::new(verifier()),
        auth: AuthConfig {
            bearer_token: Some(OPERATOR_TOKEN.to_string()),
        },
        health: HealthState {
            start_time: std::time::Instant::now(),
            storage: h.store.clone(),
        },
    })
}

fn delivery(post_id: &str, text: &str) -> String {
    json!({
        "object": "threads",
        "entry": [{
            "id": ACCOUNT_PLATFORM_ID,
            "time": 1719835200,
            "changes": [{
                "field": "mentions",
                "value": {
                    "from": {"id": "u-7", "username": "carol"},
                    "media_id": post_id,
                    "text": text,
                    "timestamp": "2024-07-01T12:00:00+0000"
                }
            }]
        }]
    })
    .to_string()
}

fn signed_post(body: &str) -> Request<Body> {
    Request::post("/webhooks/threads")
        .header("content-type", "application/json")
        .header("x-hub-signature-256", sign_payload(APP_SECRET, body.as_bytes()))
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn operator(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {OPERATOR_TOKEN}"))
        .body(Body::empty())
        .unwrap()
}

async fn body_bytes(resp: axum::response::Response) -> Vec<u8> {
    resp.into_body().collect().await.unwrap().to_bytes().to_vec()
}

async fn body_json(resp: axum::response::Response) -> Value {
    serde_json::from_slice(&body_bytes(resp).await).unwrap()
}

// --- Handshake ---

#[tokio::test]
async fn handshake_echoes_challenge() {
    let h = PipelineHarness::new().await.unwrap();
    let uri = format!(
        "/webhooks/threads?hub.mode=subscribe&hub.verify_token={VERIFY_TOKEN}&hub.challenge=abc123"
    );
    let resp = router(&h)
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_bytes(resp).await, b"abc123");
}

#[tokio::test]
async fn handshake_with_wrong_token_is_forbidden() {
    let h = PipelineHarness::new().await.unwrap();
    let resp = router(&h)
        .oneshot(
            Request::get(
                "/webhooks/threads?hub.mode=subscribe&hub.verify_token=nope&hub.challenge=abc",
            )
            .body(Body::empty())
            .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn handshake_missing_parameters_is_bad_request() {
    let h = PipelineHarness::new().await.unwrap();
    let resp = router(&h)
        .oneshot(
            Request::get("/webhooks/threads?hub.mode=subscribe")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- Delivery ---

#[tokio::test]
async fn signed_delivery_is_admitted_and_processed() {
    let h = PipelineHarness::new().await.unwrap();
    h.analyzer.push_analysis(analysis(MentionType::Complaint, -0.6));
    h.platform.push_publish_id("R123");

    let resp = router(&h)
        .oneshot(signed_post(&delivery("post-1", "This app is broken, please fix it")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    h.settle().await;
    let mention = h.mention_for_post("post-1").await.unwrap();
    assert_eq!(mention.status, MentionStatus::Replied);
    let reply = h.reply_for(&mention.id).await.unwrap();
    assert_eq!(reply.threads_reply_id.as_deref(), Some("R123"));
}

#[tokio::test]
async fn redelivery_is_acknowledged_without_a_second_mention() {
    let h = PipelineHarness::new().await.unwrap();
    let app = router(&h);
    let body = delivery("post-1", "hello");

    for _ in 0..2 {
        let resp = app.clone().oneshot(signed_post(&body)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }
    h.settle().await;

    assert_eq!(h.store.mention_count(), 1);
    assert_eq!(h.platform.sent().len(), 1);
}

#[tokio::test]
async fn missing_signature_is_unauthorized() {
    let h = PipelineHarness::new().await.unwrap();
    let resp = router(&h)
        .oneshot(
            Request::post("/webhooks/threads")
                .body(Body::from(delivery("post-1", "hi")))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(h.store.mention_count(), 0);
}

#[tokio::test]
async fn tampered_body_is_unauthorized() {
    let h = PipelineHarness::new().await.unwrap();
    let signed = delivery("post-1", "hi");
    let resp = router(&h)
        .oneshot(
            Request::post("/webhooks/threads")
                .header("x-hub-signature-256", sign_payload(APP_SECRET, signed.as_bytes()))
                .body(Body::from(delivery("post-1", "hi!")))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(h.store.mention_count(), 0);
}

#[tokio::test]
async fn malformed_envelope_is_bad_request() {
    let h = PipelineHarness::new().await.unwrap();
    let resp = router(&h)
        .oneshot(signed_post("{\"entry\": 5}"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn admission_storage_failure_is_server_error() {
    let h = PipelineHarness::new().await.unwrap();
    h.store.fail(FailPoint::CreateMention);
    let resp = router(&h)
        .oneshot(signed_post(&delivery("post-1", "hi")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

// --- Health ---

#[tokio::test]
async fn health_is_public() {
    let h = PipelineHarness::new().await.unwrap();
    let resp = router(&h)
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["storage"], "healthy");
}

#[tokio::test]
async fn health_reports_closed_storage() {
    let h = PipelineHarness::new().await.unwrap();
    h.store.close().await.unwrap();
    let resp = router(&h)
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
}

// --- Operator API ---

#[tokio::test]
async fn operator_routes_require_bearer_token() {
    let h = PipelineHarness::new().await.unwrap();
    let uri = format!("/v1/accounts/{}/mentions", h.account.id);

    let resp = router(&h)
        .oneshot(Request::get(&uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = router(&h)
        .oneshot(
            Request::get(&uri)
                .header("authorization", "Bearer wrong")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn operator_routes_fail_closed_without_token() {
    let h = PipelineHarness::new().await.unwrap();
    let app = build_router(GatewayState {
        pipeline: h.pipeline.clone(),
        verifier: Arc::new(verifier()),
        auth: AuthConfig::default(),
        health: HealthState {
            start_time: std::time::Instant::now(),
            storage: h.store.clone(),
        },
    });
    let resp = app
        .oneshot(operator("GET", &format!("/v1/accounts/{}/mentions", h.account.id)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn list_get_and_retry_flow() {
    let h = PipelineHarness::new().await.unwrap();
    h.platform.push_publish_error("threads API error: boom (code: 1)");
    let app = router(&h);

    app.clone()
        .oneshot(signed_post(&delivery("post-1", "hello")))
        .await
        .unwrap();
    h.settle().await;
    let mention = h.mention_for_post("post-1").await.unwrap();
    assert_eq!(mention.status, MentionStatus::Failed);

    let resp = app
        .clone()
        .oneshot(operator(
            "GET",
            &format!("/v1/accounts/{}/mentions?status=failed&limit=500", h.account.id),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["limit"], 100);
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["items"][0]["status"], "failed");

    let resp = app
        .clone()
        .oneshot(operator(
            "GET",
            &format!("/v1/accounts/{}/mentions/{}", h.account.id, mention.id),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["data"]["id"], mention.id.as_str());

    let retry_uri = format!(
        "/v1/accounts/{}/mentions/{}/retry",
        h.account.id, mention.id
    );
    let resp = app.clone().oneshot(operator("POST", &retry_uri)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    h.settle().await;
    assert_eq!(
        h.mention_for_post("post-1").await.unwrap().status,
        MentionStatus::Replied
    );

    let resp = app.oneshot(operator("POST", &retry_uri)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn foreign_and_missing_mentions_map_to_403_and_404() {
    let h = PipelineHarness::new().await.unwrap();
    let app = router(&h);
    app.clone()
        .oneshot(signed_post(&delivery("post-1", "hello")))
        .await
        .unwrap();
    h.settle().await;
    let mention = h.mention_for_post("post-1").await.unwrap();

    let resp = app
        .clone()
        .oneshot(operator(
            "GET",
            &format!("/v1/accounts/someone-else/mentions/{}", mention.id),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = app
        .oneshot(operator(
            "GET",
            &format!("/v1/accounts/{}/mentions/missing", h.account.id),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body = body_json(resp).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn sync_returns_pull_counters() {
    let h = PipelineHarness::new().await.unwrap();
    h.platform.add_post("p1");
    h.platform.add_reply("p1", "r1", "carol", "nice");

    let resp = router(&h)
        .oneshot(operator(
            "POST",
            &format!("/v1/accounts/{}/sync", h.account.id),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["data"]["posts_checked"], 1);
    assert_eq!(body["data"]["new_mentions"], 1);
    assert_eq!(body["data"]["errors"], 0);
    h.settle().await;
}

#[tokio::test]
async fn sync_for_unknown_account_is_not_found() {
    let h = PipelineHarness::new().await.unwrap();
    let resp = router(&h)
        .oneshot(operator("POST", "/v1/accounts/missing/sync"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
