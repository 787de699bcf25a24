//! Chapa webhook integration tests.

mod common;

use std::future::IntoFuture;
use std::io;
use std::sync::{Arc, Mutex};

use common::TestHarness;
use serde_json::json;

use boxoffice_core::ReservationStatus;
use boxoffice_service::crypto::hmac_sha256_hex;

const TX_REF: &str = "tx-7-169999-42";

fn success(tx_ref: &str) -> serde_json::Value {
    json!({"status": "success", "amount": 500, "tx_ref": tx_ref, "reference": "R1"})
}

// ============================================================================
// Issuance
// ============================================================================

#[tokio::test]
async fn successful_payment_issues_ticket() {
    let harness = TestHarness::new().await;
    let reservation = harness.seed_reservation(TX_REF).await;

    let response = harness
        .server
        .post("/webhooks/chapa")
        .json(&success(TX_REF))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["message"], "Webhook processed successfully");

    let sales = harness.store.sales().await;
    assert_eq!(sales.len(), 1);
    assert_eq!(sales[0].tx_ref, TX_REF);
    assert_eq!(sales[0].status, "completed");
    assert_eq!(sales[0].event_id, reservation.event_id);
    assert_eq!(sales[0].user_id, harness.test_user_id);

    let tickets = harness.store.tickets().await;
    assert_eq!(tickets.len(), 1);
    assert_eq!(tickets[0].ticket_number, "TKT-tx-7-169999-42");
    assert_eq!(tickets[0].status, "active");
    assert_eq!(tickets[0].sale_id, sales[0].id);

    let reservations = harness.store.reservations().await;
    assert_eq!(reservations[0].status, ReservationStatus::Completed);
    assert!(reservations[0].completed_at.is_some());
}

#[tokio::test]
async fn duplicate_delivery_issues_one_ticket() {
    let harness = TestHarness::new().await;
    harness.seed_reservation(TX_REF).await;

    for _ in 0..2 {
        harness
            .server
            .post("/webhooks/chapa")
            .json(&success(TX_REF))
            .await
            .assert_status_ok();
    }

    assert_eq!(harness.store.sales().await.len(), 1);
    assert_eq!(harness.store.tickets().await.len(), 1);
}

#[tokio::test]
async fn redelivery_with_other_amount_reports_already_processed() {
    let harness = TestHarness::new().await;
    harness.seed_reservation(TX_REF).await;

    harness
        .server
        .post("/webhooks/chapa")
        .json(&success(TX_REF))
        .await
        .assert_status_ok();

    let response = harness
        .server
        .post("/webhooks/chapa")
        .json(&json!({"status": "success", "amount": 1, "tx_ref": TX_REF}))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["message"], "Webhook already processed");
    assert_eq!(harness.store.tickets().await.len(), 1);
}

#[tokio::test]
async fn concurrent_deliveries_issue_one_ticket() {
    let harness = TestHarness::new().await;
    harness.seed_reservation(TX_REF).await;

    let body = success(TX_REF);
    let deliveries = (0..8).map(|_| {
        harness
            .server
            .post("/webhooks/chapa")
            .json(&body)
            .into_future()
    });
    let responses = futures::future::join_all(deliveries).await;

    for response in &responses {
        response.assert_status_ok();
    }
    let messages: Vec<String> = responses
        .iter()
        .map(|r| r.json::<serde_json::Value>()["message"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(
        messages
            .iter()
            .filter(|m| *m == "Webhook processed successfully")
            .count(),
        1
    );
    assert_eq!(harness.store.sales().await.len(), 1);
    assert_eq!(harness.store.tickets().await.len(), 1);
}

#[tokio::test]
async fn string_amount_is_accepted() {
    let harness = TestHarness::new().await;
    harness.seed_reservation(TX_REF).await;

    let response = harness
        .server
        .post("/webhooks/chapa")
        .json(&json!({"status": "success", "amount": "500.00", "tx_ref": TX_REF}))
        .await;

    response.assert_status_ok();
    assert_eq!(harness.store.tickets().await.len(), 1);
}

// ============================================================================
// No-op acknowledgements
// ============================================================================

#[tokio::test]
async fn failed_payment_is_acknowledged_without_issuing() {
    let harness = TestHarness::new().await;
    harness.seed_reservation(TX_REF).await;

    let response = harness
        .server
        .post("/webhooks/chapa")
        .json(&json!({"status": "failed", "tx_ref": TX_REF}))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["message"], "Payment not successful, no ticket issued");
    assert!(harness.store.sales().await.is_empty());
    assert_eq!(
        harness.store.reservations().await[0].status,
        ReservationStatus::Pending
    );
}

#[tokio::test]
async fn malformed_reference_is_acknowledged() {
    let harness = TestHarness::new().await;
    harness.seed_reservation(TX_REF).await;

    for tx_ref in ["bad-ref", "tx-7-abc-42", "tx-7-1-2-3"] {
        let response = harness
            .server
            .post("/webhooks/chapa")
            .json(&success(tx_ref))
            .await;

        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["message"], "Invalid reference format");
    }

    assert!(harness.store.sales().await.is_empty());
    assert!(harness.store.tickets().await.is_empty());
}

#[tokio::test]
async fn unparseable_body_is_acknowledged() {
    let harness = TestHarness::new().await;

    let response = harness
        .server
        .post("/webhooks/chapa")
        .text("{not json")
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["message"], "Invalid webhook data");
}

#[tokio::test]
async fn unknown_reference_is_acknowledged() {
    let harness = TestHarness::new().await;

    let response = harness
        .server
        .post("/webhooks/chapa")
        .json(&success(TX_REF))
        .await;

    response.assert_status_ok();
    assert!(harness.store.sales().await.is_empty());
}

#[tokio::test]
async fn reference_for_another_user_is_not_trusted() {
    let harness = TestHarness::new().await;
    harness.seed_reservation(TX_REF).await;

    // Same stored reference, but with the buyer segment rewritten. The store
    // has no reservation under the forged string, so nothing is issued.
    let response = harness
        .server
        .post("/webhooks/chapa")
        .json(&success("tx-7-169999-99"))
        .await;

    response.assert_status_ok();
    assert!(harness.store.sales().await.is_empty());
}

#[tokio::test]
async fn reference_that_disagrees_with_its_reservation_is_not_trusted() {
    let harness = TestHarness::new().await;
    // The stored reference names user 99 but the reservation belongs to 42.
    harness.seed_reservation("tx-7-169999-99").await;

    let response = harness
        .server
        .post("/webhooks/chapa")
        .json(&success("tx-7-169999-99"))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(
        body["message"],
        "Reference does not match reservation, no ticket issued"
    );
    assert!(harness.store.sales().await.is_empty());
}

#[tokio::test]
async fn wrong_amount_is_not_issued() {
    let harness = TestHarness::new().await;
    harness.seed_reservation(TX_REF).await;

    let response = harness
        .server
        .post("/webhooks/chapa")
        .json(&json!({"status": "success", "amount": 1, "tx_ref": TX_REF}))
        .await;

    response.assert_status_ok();
    assert!(harness.store.sales().await.is_empty());
}

// ============================================================================
// Store failures
// ============================================================================

#[tokio::test]
async fn ticket_failure_rolls_back_and_asks_for_retry() {
    let harness = TestHarness::new().await;
    harness.seed_reservation(TX_REF).await;
    harness.store.inject_ticket_fault();

    let response = harness
        .server
        .post("/webhooks/chapa")
        .json(&success(TX_REF))
        .await;

    response.assert_status_internal_server_error();
    let body: serde_json::Value = response.json();
    assert_eq!(body["message"], "Failed to issue ticket");
    assert!(harness.store.sales().await.is_empty());
    assert!(harness.store.tickets().await.is_empty());

    // The gateway's redelivery succeeds.
    harness
        .server
        .post("/webhooks/chapa")
        .json(&success(TX_REF))
        .await
        .assert_status_ok();
    assert_eq!(harness.store.sales().await.len(), 1);
    assert_eq!(harness.store.tickets().await.len(), 1);
}

// ============================================================================
// Signatures
// ============================================================================

#[tokio::test]
async fn signed_webhook_is_accepted() {
    let harness = TestHarness::with_webhook_secret(Some("whsec")).await;
    harness.seed_reservation(TX_REF).await;

    let body = success(TX_REF).to_string();
    let signature = hmac_sha256_hex("whsec", body.as_bytes());

    let response = harness
        .server
        .post("/webhooks/chapa")
        .add_header("x-chapa-signature", signature)
        .text(body)
        .await;

    response.assert_status_ok();
    assert_eq!(harness.store.tickets().await.len(), 1);
}

#[tokio::test]
async fn unsigned_or_forged_webhook_is_rejected_when_secret_set() {
    let harness = TestHarness::with_webhook_secret(Some("whsec")).await;
    harness.seed_reservation(TX_REF).await;

    harness
        .server
        .post("/webhooks/chapa")
        .json(&success(TX_REF))
        .await
        .assert_status_unauthorized();

    let body = success(TX_REF).to_string();
    let forged = hmac_sha256_hex("guess", body.as_bytes());
    harness
        .server
        .post("/webhooks/chapa")
        .add_header("chapa-signature", forged)
        .text(body)
        .await
        .assert_status_unauthorized();

    assert!(harness.store.sales().await.is_empty());
}

/// Log sink shared with the subscriber under test.
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn unsigned_webhook_does_not_warn_per_request() {
    let harness = TestHarness::new().await;
    harness.seed_reservation(TX_REF).await;

    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    for _ in 0..2 {
        harness
            .server
            .post("/webhooks/chapa")
            .json(&success(TX_REF))
            .await
            .assert_status_ok();
    }

    let output = logs.contents();
    assert!(output.contains("Received Chapa webhook"));
    assert!(!output.contains("skipping signature verification"));
}
