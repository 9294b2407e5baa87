//! Integration tests for the webhook and credit HTTP endpoints.
//!
//! The full router runs against in-memory adapters; requests are signed the
//! way each provider signs them.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use guide_ledger::adapters::http::{app_router, AppState};
use guide_ledger::adapters::{InMemoryDeliveryEvents, InMemoryLedger};
use guide_ledger::domain::foundation::OwnerId;
use guide_ledger::domain::webhook::{signature_header, HmacWebhookVerifier, WebhookVerifier};
use guide_ledger::ports::CreditLedger;
use secrecy::SecretString;

const PAYMENT_SECRET: &str = "whsec_integration";
const DELIVERY_SECRET: &str = "delivery_integration";

// =============================================================================
// Test Infrastructure
// =============================================================================

struct TestApp {
    state: AppState,
    ledger: Arc<InMemoryLedger>,
    delivery_events: Arc<InMemoryDeliveryEvents>,
}

impl TestApp {
    fn new() -> Self {
        Self::build(true, InMemoryDeliveryEvents::with_campaigns(["C1"]))
    }

    fn without_secrets() -> Self {
        Self::build(false, InMemoryDeliveryEvents::new())
    }

    fn build(with_secrets: bool, delivery_events: InMemoryDeliveryEvents) -> Self {
        let ledger = Arc::new(InMemoryLedger::new());
        let delivery_events = Arc::new(delivery_events);
        let verifier = |secret: &str| -> Option<Arc<dyn WebhookVerifier>> {
            if !with_secrets {
                return None;
            }
            Some(Arc::new(HmacWebhookVerifier::new(SecretString::new(
                secret.to_string(),
            ))))
        };

        let state = AppState {
            ledger: ledger.clone(),
            purchases: ledger.clone(),
            delivery_events: delivery_events.clone(),
            payment_verifier: verifier(PAYMENT_SECRET),
            delivery_verifier: verifier(DELIVERY_SECRET),
        };

        Self {
            state,
            ledger,
            delivery_events,
        }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let router = app_router(self.state.clone(), std::time::Duration::from_secs(5));
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    async fn balance(&self, owner: &str) -> Option<i64> {
        self.ledger
            .find_account(&OwnerId::new(owner).unwrap())
            .await
            .unwrap()
            .map(|a| a.credits_balance)
    }
}

fn now_secs() -> i64 {
    chrono::Utc::now().timestamp()
}

fn signed_post(uri: &str, header: &str, secret: &str, timestamp: i64, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header(header, signature_header(secret, timestamp, &body))
        .body(Body::from(body))
        .unwrap()
}

fn payment_request(body: &Value) -> Request<Body> {
    signed_post(
        "/webhooks/payments",
        "Payment-Signature",
        PAYMENT_SECRET,
        now_secs(),
        serde_json::to_vec(body).unwrap(),
    )
}

fn delivery_request(body: &Value) -> Request<Body> {
    signed_post(
        "/webhooks/delivery",
        "Delivery-Signature",
        DELIVERY_SECRET,
        now_secs(),
        serde_json::to_vec(body).unwrap(),
    )
}

fn checkout_completed(session_id: &str, owner: &str, credits: i64) -> Value {
    json!({
        "id": format!("evt_{}", session_id),
        "type": "checkout.session.completed",
        "created": now_secs(),
        "livemode": false,
        "data": {
            "object": {
                "id": session_id,
                "payment_intent": "pi_123",
                "amount_total": 2900,
                "currency": "eur",
                "metadata": {
                    "owner_id": owner,
                    "product_type": "credits_pack",
                    "credits_amount": credits.to_string()
                }
            }
        }
    })
}

// =============================================================================
// Payment Webhook
// =============================================================================

#[tokio::test]
async fn signed_checkout_grants_credits() {
    let app = TestApp::new();

    let (status, body) = app
        .send(payment_request(&checkout_completed("cs_1", "host@example.com", 30)))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "received": true }));
    assert_eq!(app.balance("host@example.com").await, Some(30));
    assert_eq!(app.ledger.purchase_count().await, 1);
}

#[tokio::test]
async fn replayed_checkout_grants_once() {
    let app = TestApp::new();
    let event = checkout_completed("cs_replay", "host@example.com", 30);

    let (first, _) = app.send(payment_request(&event)).await;
    let (second, body) = app.send(payment_request(&event)).await;

    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::OK);
    assert_eq!(body, json!({ "received": true }));
    assert_eq!(app.balance("host@example.com").await, Some(30));
}

#[tokio::test]
async fn tampered_payment_body_is_rejected_with_400() {
    let app = TestApp::new();
    let original = serde_json::to_vec(&checkout_completed("cs_2", "host@example.com", 30)).unwrap();
    let header = signature_header(PAYMENT_SECRET, now_secs(), &original);
    let tampered = serde_json::to_vec(&checkout_completed("cs_2", "host@example.com", 3000)).unwrap();

    let request = Request::builder()
        .method("POST")
        .uri("/webhooks/payments")
        .header("Payment-Signature", header)
        .body(Body::from(tampered))
        .unwrap();
    let (status, body) = app.send(request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "INVALID_SIGNATURE");
    assert_eq!(app.balance("host@example.com").await, None);
}

#[tokio::test]
async fn stale_payment_signature_looks_like_invalid_signature() {
    let app = TestApp::new();
    let body = serde_json::to_vec(&checkout_completed("cs_3", "host@example.com", 30)).unwrap();

    let (status, response) = app
        .send(signed_post(
            "/webhooks/payments",
            "Payment-Signature",
            PAYMENT_SECRET,
            now_secs() - 3600,
            body,
        ))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["error_code"], "INVALID_SIGNATURE");
    assert_eq!(response["message"], "Invalid signature");
}

#[tokio::test]
async fn missing_payment_signature_header_is_rejected() {
    let app = TestApp::new();
    let request = Request::builder()
        .method("POST")
        .uri("/webhooks/payments")
        .body(Body::from(
            serde_json::to_vec(&checkout_completed("cs_4", "host@example.com", 30)).unwrap(),
        ))
        .unwrap();

    let (status, _) = app.send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unconfigured_payment_secret_returns_500() {
    let app = TestApp::without_secrets();

    let (status, body) = app
        .send(payment_request(&checkout_completed("cs_5", "host@example.com", 30)))
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error_code"], "NOT_CONFIGURED");
    assert_eq!(app.balance("host@example.com").await, None);
}

#[tokio::test]
async fn signed_garbage_is_malformed() {
    let app = TestApp::new();

    let (status, body) = app
        .send(signed_post(
            "/webhooks/payments",
            "Payment-Signature",
            PAYMENT_SECRET,
            now_secs(),
            b"not json".to_vec(),
        ))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "MALFORMED_PAYLOAD");
}

#[tokio::test]
async fn checkout_without_owner_is_acknowledged_but_not_credited() {
    let app = TestApp::new();
    let mut event = checkout_completed("cs_6", "host@example.com", 30);
    event["data"]["object"]["metadata"]
        .as_object_mut()
        .unwrap()
        .remove("owner_id");

    let (status, body) = app.send(payment_request(&event)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "received": true }));
    assert_eq!(app.ledger.purchase_count().await, 0);
}

#[tokio::test]
async fn other_payment_events_are_acknowledged() {
    let app = TestApp::new();
    let event = json!({
        "id": "evt_other",
        "type": "invoice.paid",
        "data": { "object": { "id": "in_1" } }
    });

    let (status, _) = app.send(payment_request(&event)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.ledger.purchase_count().await, 0);
}

#[tokio::test]
async fn failed_grant_returns_500_and_retry_succeeds() {
    let app = TestApp::new();
    let event = checkout_completed("cs_retry", "host@example.com", 10);

    app.ledger.set_fail_grants(true);
    let (status, body) = app.send(payment_request(&event)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error_code"], "PROCESSING_FAILED");
    assert_eq!(app.ledger.purchase_count().await, 0);

    app.ledger.set_fail_grants(false);
    let (status, _) = app.send(payment_request(&event)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.balance("host@example.com").await, Some(10));
}

// =============================================================================
// Delivery Webhook
// =============================================================================

fn clicked_event(email_id: &str, campaign: &str) -> Value {
    json!({
        "type": "email.clicked",
        "created_at": "2024-05-01T10:00:00.000Z",
        "data": {
            "email_id": email_id,
            "to": ["guest@example.com"],
            "tags": { "campaign_id": campaign },
            "click": {
                "link": "https://x",
                "timestamp": "2024-05-01T10:00:00.000Z",
                "ipAddress": "198.51.100.7",
                "userAgent": "Mozilla/5.0"
            }
        }
    })
}

#[tokio::test]
async fn click_is_recorded_with_campaign_and_normalized_data() {
    let app = TestApp::new();

    let (status, body) = app.send(delivery_request(&clicked_event("e1", "C1"))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "received": true }));

    let events = app.delivery_events.events_for("e1").await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].campaign_id.as_deref(), Some("C1"));
    assert_eq!(events[0].recipient.as_deref(), Some("guest@example.com"));
    assert_eq!(events[0].event_data["link"], "https://x");
    assert_eq!(events[0].event_data["ip"], "198.51.100.7");
}

#[tokio::test]
async fn unknown_campaign_is_recorded_without_association() {
    let app = TestApp::new();

    let (status, _) = app.send(delivery_request(&clicked_event("e2", "C404"))).await;

    assert_eq!(status, StatusCode::OK);
    let events = app.delivery_events.events_for("e2").await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].campaign_id, None);
}

#[tokio::test]
async fn bad_delivery_signature_returns_401() {
    let app = TestApp::new();
    let body = serde_json::to_vec(&clicked_event("e3", "C1")).unwrap();

    let (status, response) = app
        .send(signed_post(
            "/webhooks/delivery",
            "Delivery-Signature",
            "wrong-secret",
            now_secs(),
            body,
        ))
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(response["error_code"], "INVALID_SIGNATURE");
    assert!(app.delivery_events.events().await.is_empty());
}

#[tokio::test]
async fn unsupported_delivery_type_is_acknowledged_and_dropped() {
    let app = TestApp::new();
    let event = json!({ "type": "email.unsubscribed", "data": { "email_id": "e4" } });

    let (status, _) = app.send(delivery_request(&event)).await;

    assert_eq!(status, StatusCode::OK);
    assert!(app.delivery_events.events().await.is_empty());
}

#[tokio::test]
async fn unconfigured_delivery_secret_returns_500() {
    let app = TestApp::without_secrets();

    let (status, body) = app.send(delivery_request(&clicked_event("e5", "C1"))).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error_code"], "NOT_CONFIGURED");
}

#[tokio::test]
async fn delivery_status_lists_supported_events() {
    let app = TestApp::new();
    let request = Request::builder()
        .uri("/webhooks/delivery")
        .body(Body::empty())
        .unwrap();

    let (status, body) = app.send(request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    let supported = body["supported_events"].as_array().unwrap();
    assert_eq!(supported.len(), 7);
    assert!(supported.contains(&json!("delivery_delayed")));
}

// =============================================================================
// Credits API and health
// =============================================================================

#[tokio::test]
async fn credit_summary_reflects_purchase() {
    let app = TestApp::new();
    app.send(payment_request(&checkout_completed("cs_sum", "Host@Example.com", 30)))
        .await;

    let request = Request::builder()
        .uri("/api/credits/host@example.com")
        .body(Body::empty())
        .unwrap();
    let (status, body) = app.send(request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["owner_id"], "host@example.com");
    assert_eq!(body["credits_balance"], 30);
    assert_eq!(body["lifetime_earned"], 30);
    assert_eq!(body["account_status"], "active");
}

#[tokio::test]
async fn credit_summary_for_unknown_owner_is_404() {
    let app = TestApp::new();
    let request = Request::builder()
        .uri("/api/credits/nobody@example.com")
        .body(Body::empty())
        .unwrap();

    let (status, body) = app.send(request).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error_code"], "OWNER_NOT_FOUND");
}

#[tokio::test]
async fn health_reports_ok_and_echoes_request_id() {
    let app = TestApp::new();
    let router = app_router(app.state.clone(), std::time::Duration::from_secs(5));

    let response = router
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
}
