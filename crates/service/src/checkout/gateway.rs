//! Payment gateway client (Paystack hosted checkout).

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use configs::PaystackConfig;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("payment gateway not configured")]
    NotConfigured,
    #[error("payment gateway unreachable: {0}")]
    Transport(String),
    #[error("payment gateway rejected request: {0}")]
    Rejected(String),
}

/// Body of `POST /transaction/initialize`. `amount` is in minor units.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct InitializeRequest {
    pub email: String,
    pub amount: i64,
    pub reference: String,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct InitializeResponse {
    pub authorization_url: String,
    #[serde(default)]
    pub access_code: Option<String>,
    pub reference: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn initialize(&self, req: InitializeRequest) -> Result<InitializeResponse, GatewayError>;
}

#[derive(Deserialize)]
struct Envelope<T> {
    status: bool,
    #[serde(default)]
    message: String,
    data: Option<T>,
}

pub struct PaystackClient {
    client: reqwest::Client,
    cfg: PaystackConfig,
}

impl PaystackClient {
    pub fn new(cfg: PaystackConfig) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        Ok(Self { client, cfg })
    }
}

#[async_trait]
impl PaymentGateway for PaystackClient {
    async fn initialize(&self, req: InitializeRequest) -> Result<InitializeResponse, GatewayError> {
        if self.cfg.secret_key.trim().is_empty() {
            return Err(GatewayError::NotConfigured);
        }
        let url = format!("{}/transaction/initialize", self.cfg.base_url.trim_end_matches('/'));
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.cfg.secret_key)
            .json(&req)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        let status = resp.status();
        let body: Envelope<InitializeResponse> = resp
            .json()
            .await
            .map_err(|e| GatewayError::Rejected(format!("{status}: invalid body: {e}")))?;
        match body.data {
            Some(data) if status.is_success() && body.status => Ok(data),
            _ => Err(GatewayError::Rejected(format!("{status}: {}", body.message))),
        }
    }
}

/// Scriptable gateway for tests.
pub mod mock {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct StubGateway {
        pub fail: bool,
        calls: Mutex<Vec<InitializeRequest>>,
    }

    impl StubGateway {
        pub fn failing() -> Self { Self { fail: true, calls: Mutex::new(Vec::new()) } }

        pub fn calls(&self) -> Vec<InitializeRequest> { self.calls.lock().unwrap().clone() }
    }

    #[async_trait]
    impl PaymentGateway for StubGateway {
        async fn initialize(&self, req: InitializeRequest) -> Result<InitializeResponse, GatewayError> {
            self.calls.lock().unwrap().push(req.clone());
            if self.fail {
                return Err(GatewayError::Transport("stub offline".into()));
            }
            Ok(InitializeResponse {
                authorization_url: format!("https://checkout.test/{}", req.reference),
                access_code: Some("ac_test".into()),
                reference: req.reference,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_omits_missing_callback() {
        let req = InitializeRequest {
            email: "a@b.co".into(),
            amount: 150_000,
            reference: "AS-1".into(),
            currency: "NGN".into(),
            callback_url: None,
        };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["amount"], 150_000);
        assert!(v.get("callback_url").is_none());
    }

    #[test]
    fn envelope_parses_paystack_shape() {
        let raw = r#"{"status":true,"message":"Authorization URL created","data":{"authorization_url":"https://checkout.paystack.com/x","access_code":"x","reference":"AS-1"}}"#;
        let env: Envelope<InitializeResponse> = serde_json::from_str(raw).unwrap();
        assert!(env.status);
        assert_eq!(env.data.unwrap().reference, "AS-1");
    }

    #[tokio::test]
    async fn missing_secret_is_not_configured() {
        let client = PaystackClient::new(PaystackConfig::default()).unwrap();
        let req = InitializeRequest { email: "a@b.co".into(), amount: 1, reference: "r".into(), currency: "NGN".into(), callback_url: None };
        assert!(matches!(client.initialize(req).await, Err(GatewayError::NotConfigured)));
    }
}
