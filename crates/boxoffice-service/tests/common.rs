//! Common test utilities for boxoffice integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::Arc;

use axum::Router;
use axum_test::TestServer;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use boxoffice_core::{
    Decimal, EventId, NewReservation, Reservation, SessionAttachment, TicketTypeId, UserId,
};
use boxoffice_service::{create_router, AppState, ServiceConfig};
use boxoffice_store::{MemoryStore, ReservationStore};

/// Secret the harness signs user tokens with.
pub const JWT_SECRET: &str = "test-jwt-secret";

/// Gateway API key the harness configures.
pub const CHAPA_SECRET: &str = "CHASECK_TEST-harness";

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// The store behind the server, for direct inspection.
    pub store: Arc<MemoryStore>,
    /// Stand-in for the Chapa API.
    pub gateway: MockServer,
    /// A test user ID for authenticated requests.
    pub test_user_id: UserId,
}

impl TestHarness {
    /// Create a new test harness with an empty store and no webhook secret.
    pub async fn new() -> Self {
        Self::with_webhook_secret(None).await
    }

    /// Create a new test harness that requires signed webhooks.
    pub async fn with_webhook_secret(webhook_secret: Option<&str>) -> Self {
        let webhook_secret = webhook_secret.map(String::from);
        Self::with_config(|config| config.chapa_webhook_secret = webhook_secret).await
    }

    /// Create a new test harness, adjusting the default test config first.
    pub async fn with_config(adjust: impl FnOnce(&mut ServiceConfig)) -> Self {
        let gateway = MockServer::start().await;
        let store = Arc::new(MemoryStore::new());

        let mut config = ServiceConfig {
            listen_addr: "127.0.0.1:0".into(),
            jwt_secret: JWT_SECRET.into(),
            chapa_secret: Some(CHAPA_SECRET.into()),
            chapa_base_url: gateway.uri(),
            ..ServiceConfig::default()
        };
        adjust(&mut config);

        let state = AppState::new(store.clone(), store.clone(), config);
        let router: Router = create_router(state);

        let server = TestServer::new(router).expect("Failed to create test server");

        Self {
            server,
            store,
            gateway,
            test_user_id: UserId::new(42),
        }
    }

    /// Get the authorization header for user authentication.
    pub fn user_auth_header(&self) -> String {
        auth_header(self.test_user_id)
    }

    /// Get a different user's auth header (for testing isolation).
    pub fn other_user_auth_header() -> String {
        auth_header(UserId::new(99))
    }

    /// Make the gateway open sessions successfully.
    pub async fn gateway_accepts(&self, checkout_url: &str, reference: &str) {
        Mock::given(method("POST"))
            .and(path("/transaction/initialize"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "success",
                "message": "Hosted Link",
                "data": {
                    "checkout_url": checkout_url,
                    "reference": reference,
                }
            })))
            .mount(&self.gateway)
            .await;
    }

    /// Make the gateway answer every session request with `status`.
    pub async fn gateway_fails(&self, status: u16) {
        Mock::given(method("POST"))
            .and(path("/transaction/initialize"))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({
                "status": "failed",
                "message": "Invalid API Key",
                "data": null,
            })))
            .mount(&self.gateway)
            .await;
    }

    /// Seed a pending reservation for the test user with a known reference,
    /// as if a checkout session had been opened for it.
    pub async fn seed_reservation(&self, tx_ref: &str) -> Reservation {
        let new = NewReservation::new(
            EventId::new(7),
            TicketTypeId::new(3),
            self.test_user_id,
            2,
            Decimal::new(500, 0),
        )
        .expect("valid reservation");
        let reservation = self.store.create(&new).await.expect("create");
        self.store
            .attach_reference(
                reservation.id,
                &SessionAttachment {
                    tx_ref: tx_ref.into(),
                    checkout_url: "https://pay.example/abc".into(),
                    gateway_reference: Some("R1".into()),
                },
            )
            .await
            .expect("attach");
        self.store
            .get(reservation.id)
            .await
            .expect("get")
            .expect("present")
    }
}

/// A valid Bearer header for `user_id`, using the Hasura claims layout.
pub fn auth_header(user_id: UserId) -> String {
    let claims = json!({
        "https://hasura.io/jwt/claims": {
            "x-hasura-user-id": user_id.to_string(),
            "x-hasura-default-role": "user",
        },
        "exp": chrono::Utc::now().timestamp() + 3600,
    });
    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("Failed to sign token");
    format!("Bearer {token}")
}
