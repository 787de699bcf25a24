//! Chapa API types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Status string Chapa uses for successful calls and payments.
pub const STATUS_SUCCESS: &str = "success";

/// What the orchestrator asks the gateway for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRequest {
    /// Amount to charge.
    pub amount: Decimal,
    /// Payer email. May be empty.
    pub email: String,
    /// Payer first name.
    pub first_name: String,
    /// Payer last name.
    pub last_name: String,
    /// Our transaction reference.
    pub tx_ref: String,
    /// Overrides the client's default callback URL.
    pub callback_url: Option<String>,
    /// Overrides the client's default return URL.
    pub return_url: Option<String>,
}

/// An open checkout session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSession {
    /// Where the buyer is redirected to pay.
    pub checkout_url: String,
    /// Chapa's own reference, when it returns one.
    pub gateway_reference: Option<String>,
}

/// Body of `POST /transaction/initialize`.
#[derive(Debug, Clone, Serialize)]
pub struct InitializeRequest {
    /// Amount as a two-decimal string.
    pub amount: String,
    /// ISO currency code.
    pub currency: String,
    /// Payer email.
    pub email: String,
    /// Payer first name.
    pub first_name: String,
    /// Payer last name.
    pub last_name: String,
    /// Our transaction reference.
    pub tx_ref: String,
    /// Webhook target.
    pub callback_url: String,
    /// Post-checkout redirect.
    pub return_url: String,
    /// Checkout page text.
    pub customization: Customization,
}

/// Checkout page customization.
#[derive(Debug, Clone, Serialize)]
pub struct Customization {
    /// Page title.
    pub title: String,
    /// Page description.
    pub description: String,
}

impl Default for Customization {
    fn default() -> Self {
        Self {
            title: "Event Ticket".into(),
            description: "Local event ticket purchase".into(),
        }
    }
}

/// Response of `POST /transaction/initialize`.
#[derive(Debug, Clone, Deserialize)]
pub struct InitializeResponse {
    /// `"success"` or `"failed"`.
    pub status: String,
    /// Human-readable message; Chapa sometimes sends an object here.
    #[serde(default)]
    pub message: Option<serde_json::Value>,
    /// Session details, present on success.
    #[serde(default)]
    pub data: Option<InitializeData>,
}

/// Session details in an initialize response.
#[derive(Debug, Clone, Deserialize)]
pub struct InitializeData {
    /// Hosted checkout page.
    pub checkout_url: String,
    /// Chapa's reference for the session.
    #[serde(default)]
    pub reference: Option<String>,
}

/// Payment notification posted by Chapa to the callback URL.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookNotification {
    /// Payment status; only `"success"` issues a ticket.
    pub status: String,
    /// Amount paid. Accepts JSON numbers and numeric strings.
    #[serde(default)]
    pub amount: Option<Decimal>,
    /// Our transaction reference, echoed back.
    #[serde(default, alias = "trx_ref")]
    pub tx_ref: String,
    /// Chapa's own reference.
    #[serde(default)]
    pub reference: Option<String>,
}

impl WebhookNotification {
    /// Whether the gateway reports the payment as successful.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == STATUS_SUCCESS
    }
}
