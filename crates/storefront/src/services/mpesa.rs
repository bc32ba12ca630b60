//! M-PESA Daraja API client for STK push payments.
//!
//! A stateless client: it authenticates with a short-lived bearer token via
//! the client-credentials endpoint, then submits a push-payment request that
//! prompts the payer's phone for their PIN. It knows nothing about carts or
//! orders; callers correlate the result through `CheckoutRequestID`.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::Utc;
use secrecy::ExposeSecret;
use serde::Deserialize;
use thiserror::Error;

use soko_core::{Msisdn, MsisdnError, Price};

use crate::config::MpesaConfig;

/// Account reference shown on the payer's statement.
const ACCOUNT_REFERENCE: &str = "SokoTech";

/// Transaction description sent with every push.
const TRANSACTION_DESC: &str = "Payment for goods";

/// Errors that can occur when talking to the gateway.
///
/// Credential-exchange failures and push failures are distinct variants,
/// each carrying the upstream detail when available.
#[derive(Debug, Error)]
pub enum MpesaError {
    /// A required configuration value is absent.
    #[error("M-PESA configuration missing: {0}")]
    MissingConfig(&'static str),

    /// The phone number could not be normalized.
    #[error("invalid phone number: {0}")]
    Phone(#[from] MsisdnError),

    /// The HTTP request itself failed (connect, timeout, ...).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The credential exchange was rejected.
    #[error("credential exchange failed: {status} - {detail}")]
    Auth { status: u16, detail: String },

    /// The push request was rejected.
    #[error("STK push request failed: {status} - {detail}")]
    Push { status: u16, detail: String },
}

/// Response to a successful token request.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Response to an accepted STK push request.
#[derive(Debug, Clone, Deserialize)]
pub struct StkPushResponse {
    #[serde(rename = "MerchantRequestID")]
    pub merchant_request_id: String,
    #[serde(rename = "CheckoutRequestID")]
    pub checkout_request_id: String,
    #[serde(rename = "ResponseCode", default)]
    pub response_code: Option<String>,
    #[serde(rename = "ResponseDescription", default)]
    pub response_description: Option<String>,
    #[serde(rename = "CustomerMessage", default)]
    pub customer_message: Option<String>,
}

/// Envelope of the asynchronous result the gateway POSTs to the callback
/// URL once the payer confirms or the push times out.
#[derive(Debug, Deserialize)]
pub struct StkCallbackEnvelope {
    #[serde(rename = "Body")]
    pub body: StkCallbackBody,
}

#[derive(Debug, Deserialize)]
pub struct StkCallbackBody {
    #[serde(rename = "stkCallback")]
    pub stk_callback: StkCallback,
}

#[derive(Debug, Deserialize)]
pub struct StkCallback {
    #[serde(rename = "MerchantRequestID")]
    pub merchant_request_id: String,
    #[serde(rename = "CheckoutRequestID")]
    pub checkout_request_id: String,
    #[serde(rename = "ResultCode")]
    pub result_code: i64,
    #[serde(rename = "ResultDesc")]
    pub result_desc: String,
}

/// M-PESA Daraja API client.
#[derive(Clone)]
pub struct MpesaClient {
    http: reqwest::Client,
    config: MpesaConfig,
}

impl MpesaClient {
    /// Create a new client over the given gateway configuration.
    #[must_use]
    pub fn new(config: MpesaConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Obtain a short-lived bearer token via the client-credentials exchange.
    ///
    /// # Errors
    ///
    /// Returns `MissingConfig` when credentials are not configured, `Auth`
    /// when the gateway rejects the exchange, and `Http` on transport
    /// failures.
    async fn access_token(&self) -> Result<String, MpesaError> {
        let consumer_key = self
            .config
            .consumer_key
            .as_deref()
            .ok_or(MpesaError::MissingConfig("MPESA_CONSUMER_KEY"))?;
        let consumer_secret = self
            .config
            .consumer_secret
            .as_ref()
            .ok_or(MpesaError::MissingConfig("MPESA_CONSUMER_SECRET"))?;

        let response = self
            .http
            .get(&self.config.auth_url)
            .basic_auth(consumer_key, Some(consumer_secret.expose_secret()))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(MpesaError::Auth {
                status: status.as_u16(),
                detail,
            });
        }

        let token: TokenResponse = response.json().await.map_err(|e| MpesaError::Auth {
            status: status.as_u16(),
            detail: e.to_string(),
        })?;

        Ok(token.access_token)
    }

    /// Initiate an STK push prompting `phone_number` for `amount`.
    ///
    /// The phone number is normalized to international format; the amount is
    /// truncated to whole shillings as the gateway requires.
    ///
    /// # Errors
    ///
    /// Returns `MissingConfig` for absent configuration, `Phone` for an
    /// unusable phone number, `Auth` when the credential exchange fails, and
    /// `Push` when the gateway rejects the push request.
    pub async fn stk_push(
        &self,
        phone_number: &str,
        amount: Price,
    ) -> Result<StkPushResponse, MpesaError> {
        let shortcode = self
            .config
            .shortcode
            .as_deref()
            .ok_or(MpesaError::MissingConfig("MPESA_BUSINESS_SHORTCODE"))?;
        let passkey = self
            .config
            .passkey
            .as_ref()
            .ok_or(MpesaError::MissingConfig("MPESA_PASSKEY"))?;
        let callback_url = self
            .config
            .callback_url
            .as_deref()
            .ok_or(MpesaError::MissingConfig("MPESA_CALLBACK_URL"))?;

        let phone = Msisdn::parse(phone_number)?;
        let access_token = self.access_token().await?;

        let timestamp = Utc::now().format("%Y%m%d%H%M%S").to_string();
        let password = stk_password(shortcode, passkey.expose_secret(), &timestamp);

        let payload = serde_json::json!({
            "BusinessShortCode": shortcode,
            "Password": password,
            "Timestamp": timestamp,
            "TransactionType": "CustomerPayBillOnline",
            "Amount": amount.whole_shillings().to_string(),
            "PartyA": phone.as_str(),
            "PartyB": shortcode,
            "PhoneNumber": phone.as_str(),
            "CallBackURL": callback_url,
            "AccountReference": ACCOUNT_REFERENCE,
            "TransactionDesc": TRANSACTION_DESC,
        });

        let response = self
            .http
            .post(&self.config.stk_push_url)
            .bearer_auth(&access_token)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(MpesaError::Push {
                status: status.as_u16(),
                detail,
            });
        }

        let parsed: StkPushResponse = response.json().await.map_err(|e| MpesaError::Push {
            status: status.as_u16(),
            detail: e.to_string(),
        })?;

        Ok(parsed)
    }
}

/// Derive the STK password: base64 of shortcode + passkey + timestamp.
fn stk_password(shortcode: &str, passkey: &str, timestamp: &str) -> String {
    BASE64.encode(format!("{shortcode}{passkey}{timestamp}"))
}
