//! Transactional email via provider-side templates.
//!
//! Callers treat delivery as best-effort: a failed send is logged and never
//! fails the business operation that triggered it.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{info, warn};

use configs::EmailConfig;

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("Zepto API key not configured")]
    NotConfigured,
    #[error("email transport error: {0}")]
    Transport(String),
    #[error("email provider rejected request: {status} {body}")]
    Rejected { status: u16, body: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EmailTemplate {
    Welcome,
    PaymentInitiated,
    OrderConfirmation,
    PasswordReset,
}

/// One templated message.
#[derive(Clone, Debug, PartialEq)]
pub struct TemplateEmail {
    pub to: String,
    pub to_name: Option<String>,
    pub subject: String,
    pub template: EmailTemplate,
    pub merge_info: Value,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: TemplateEmail) -> Result<(), EmailError>;
}

/// Send and log the outcome without propagating failures.
pub async fn send_best_effort(mailer: &dyn Mailer, email: TemplateEmail) {
    let to = email.to.clone();
    let template = email.template;
    match mailer.send(email).await {
        Ok(()) => info!(%to, ?template, "email_sent"),
        Err(e) => warn!(%to, ?template, error = %e, "email_send_failed"),
    }
}

/// ZeptoMail template API client.
pub struct ZeptoMailer {
    client: reqwest::Client,
    cfg: EmailConfig,
}

#[derive(Serialize)]
struct Address<'a> {
    address: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

impl ZeptoMailer {
    pub fn new(cfg: EmailConfig) -> Result<Self, EmailError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| EmailError::Transport(e.to_string()))?;
        Ok(Self { client, cfg })
    }

    fn template_id(&self, t: EmailTemplate) -> &str {
        let tpl = &self.cfg.templates;
        match t {
            EmailTemplate::Welcome => &tpl.welcome,
            EmailTemplate::PaymentInitiated => &tpl.payment_initiated,
            EmailTemplate::OrderConfirmation => &tpl.order_confirmation,
            EmailTemplate::PasswordReset => &tpl.password_reset,
        }
    }

    fn body(&self, email: &TemplateEmail) -> Value {
        json!({
            "from": Address { address: &self.cfg.from_address, name: Some(&self.cfg.from_name) },
            "to": [{ "email_address": Address { address: &email.to, name: email.to_name.as_deref() } }],
            "subject": email.subject,
            "template_id": self.template_id(email.template),
            "merge_info": email.merge_info,
        })
    }
}

#[async_trait]
impl Mailer for ZeptoMailer {
    async fn send(&self, email: TemplateEmail) -> Result<(), EmailError> {
        if self.cfg.api_key.trim().is_empty() {
            return Err(EmailError::NotConfigured);
        }
        let url = format!("{}/email/template", self.cfg.api_url);
        let resp = self
            .client
            .post(&url)
            .header(reqwest::header::AUTHORIZATION, format!("Zoho-enczapikey {}", self.cfg.api_key))
            .json(&self.body(&email))
            .send()
            .await
            .map_err(|e| EmailError::Transport(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(EmailError::Rejected { status: status.as_u16(), body });
        }
        Ok(())
    }
}

/// In-memory mailer for tests
pub mod mock {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct RecordingMailer {
        sent: Mutex<Vec<TemplateEmail>>,
        pub fail: bool,
    }

    impl RecordingMailer {
        pub fn failing() -> Self { Self { sent: Mutex::new(Vec::new()), fail: true } }

        pub fn sent(&self) -> Vec<TemplateEmail> { self.sent.lock().unwrap().clone() }
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, email: TemplateEmail) -> Result<(), EmailError> {
            if self.fail {
                return Err(EmailError::Transport("mock failure".into()));
            }
            self.sent.lock().unwrap().push(email);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::mock::RecordingMailer;

    fn msg() -> TemplateEmail {
        TemplateEmail {
            to: "buyer@example.com".into(),
            to_name: Some("Buyer".into()),
            subject: "Order confirmed".into(),
            template: EmailTemplate::OrderConfirmation,
            merge_info: json!({"orderId": "abc"}),
        }
    }

    #[test]
    fn body_uses_configured_template_and_sender() {
        let mailer = ZeptoMailer::new(EmailConfig::default()).unwrap();
        let b = mailer.body(&msg());
        assert_eq!(b["template_id"], json!("order_confirmation"));
        assert_eq!(b["from"]["address"], json!("noreply@autoshop.com"));
        assert_eq!(b["to"][0]["email_address"]["address"], json!("buyer@example.com"));
        assert_eq!(b["merge_info"]["orderId"], json!("abc"));
    }

    #[tokio::test]
    async fn missing_key_is_not_configured() {
        let mailer = ZeptoMailer::new(EmailConfig::default()).unwrap();
        assert!(matches!(mailer.send(msg()).await, Err(EmailError::NotConfigured)));
    }

    #[tokio::test]
    async fn best_effort_swallows_failures() {
        let failing = RecordingMailer::failing();
        send_best_effort(&failing, msg()).await;
        assert!(failing.sent().is_empty());

        let ok = RecordingMailer::default();
        send_best_effort(&ok, msg()).await;
        assert_eq!(ok.sent().len(), 1);
    }
}
