//! Chapa API client implementation.

use reqwest::Client;
use std::time::Duration;

use super::types::{
    CheckoutSession, Customization, InitializeRequest, InitializeResponse, SessionRequest,
    STATUS_SUCCESS,
};

/// Error type for Chapa operations.
#[derive(Debug, thiserror::Error)]
pub enum ChapaError {
    /// The request never got a response (connect failure, timeout).
    #[error("gateway unreachable: {0}")]
    GatewayUnreachable(String),

    /// Chapa answered with a non-success HTTP status.
    #[error("gateway rejected the request: HTTP {status}: {message}")]
    GatewayRejected {
        /// HTTP status code.
        status: u16,
        /// Message from the error body, or the raw body.
        message: String,
    },

    /// Chapa answered 2xx but the body was not a usable session.
    #[error("gateway protocol error: {0}")]
    GatewayProtocolError(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Configuration(String),
}

/// Chapa API client.
#[derive(Debug, Clone)]
pub struct ChapaClient {
    client: Client,
    api_key: String,
    base_url: String,
    currency: String,
    callback_url: String,
    return_url: String,
}

impl ChapaClient {
    /// Create a new Chapa client.
    ///
    /// # Arguments
    ///
    /// * `api_key` - Chapa secret key, sent as a Bearer token
    /// * `base_url` - API root, e.g. `https://api.chapa.co/v1`
    /// * `timeout` - Bound on every outbound call
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ChapaError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChapaError::Configuration(e.to_string()))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            currency: "ETB".into(),
            callback_url: String::new(),
            return_url: String::new(),
        })
    }

    /// Set the currency code sent with every session.
    #[must_use]
    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    /// Set the callback and return URLs used when a request carries none.
    #[must_use]
    pub fn with_default_urls(
        mut self,
        callback_url: impl Into<String>,
        return_url: impl Into<String>,
    ) -> Self {
        self.callback_url = callback_url.into();
        self.return_url = return_url.into();
        self
    }

    /// Open a hosted checkout session.
    ///
    /// Sends exactly one request; retry policy belongs to the caller.
    pub async fn open_session(
        &self,
        request: &SessionRequest,
    ) -> Result<CheckoutSession, ChapaError> {
        let body = InitializeRequest {
            amount: format!("{:.2}", request.amount),
            currency: self.currency.clone(),
            email: request.email.clone(),
            first_name: request.first_name.clone(),
            last_name: request.last_name.clone(),
            tx_ref: request.tx_ref.clone(),
            callback_url: request
                .callback_url
                .clone()
                .unwrap_or_else(|| self.callback_url.clone()),
            return_url: request
                .return_url
                .clone()
                .unwrap_or_else(|| self.return_url.clone()),
            customization: Customization::default(),
        };

        tracing::debug!(
            tx_ref = %body.tx_ref,
            amount = %body.amount,
            currency = %body.currency,
            "Opening Chapa checkout session"
        );

        let response = self
            .client
            .post(format!("{}/transaction/initialize", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ChapaError::GatewayUnreachable(e.to_string()))?;

        let parsed: InitializeResponse = self.handle_response(response).await?;

        if parsed.status != STATUS_SUCCESS {
            return Err(ChapaError::GatewayProtocolError(format!(
                "status {:?}: {}",
                parsed.status,
                message_text(parsed.message.as_ref())
            )));
        }

        let data = parsed.data.ok_or_else(|| {
            ChapaError::GatewayProtocolError("response has no session data".into())
        })?;

        if data.checkout_url.is_empty() {
            return Err(ChapaError::GatewayProtocolError(
                "response has an empty checkout_url".into(),
            ));
        }

        Ok(CheckoutSession {
            checkout_url: data.checkout_url,
            gateway_reference: data.reference.filter(|r| !r.is_empty()),
        })
    }

    /// Handle API response and convert errors.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ChapaError> {
        let status = response.status();

        let text = response
            .text()
            .await
            .map_err(|e| ChapaError::GatewayUnreachable(e.to_string()))?;

        if !status.is_success() {
            // Chapa error bodies share the initialize shape; fall back to raw text.
            let message = serde_json::from_str::<InitializeResponse>(&text)
                .map(|body| message_text(body.message.as_ref()))
                .unwrap_or(text);
            return Err(ChapaError::GatewayRejected {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&text).map_err(|e| ChapaError::GatewayProtocolError(e.to_string()))
    }
}

fn message_text(message: Option<&serde_json::Value>) -> String {
    match message {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}
