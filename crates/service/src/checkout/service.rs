use std::sync::Arc;

use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set, TransactionTrait};
use serde::Serialize;
use serde_json::json;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use configs::PaystackConfig;
use models::status::{OrderStatus, PaymentStatus};
use models::{cart as cart_model, order, order_history, order_item, payment_intent, user};

use crate::cart;
use crate::email::{send_best_effort, EmailTemplate, Mailer, TemplateEmail};
use crate::errors::ServiceError;
use crate::views::products_by_id;

use super::gateway::{GatewayError, InitializeRequest, PaymentGateway};
use super::webhook::{amount_matches, verify_signature, WebhookEvent, CHARGE_SUCCESS};

/// Hosted-checkout session handed back to the client.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CheckoutSession {
    pub authorization_url: String,
    pub reference: String,
}

/// Result of processing one webhook delivery.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// Event type we do not act on.
    Ignored,
    /// Unknown reference, or the intent was already settled.
    Acknowledged,
    OrderCreated(Uuid),
}

impl WebhookOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            WebhookOutcome::Ignored => "ignored",
            _ => "ok",
        }
    }

    pub fn order_id(&self) -> Option<Uuid> {
        match self {
            WebhookOutcome::OrderCreated(id) => Some(*id),
            _ => None,
        }
    }
}

pub struct CheckoutService {
    db: DatabaseConnection,
    gateway: Arc<dyn PaymentGateway>,
    mailer: Option<Arc<dyn Mailer>>,
    cfg: PaystackConfig,
}

fn new_reference() -> String {
    format!("AS-{}", Uuid::new_v4().simple())
}

impl CheckoutService {
    pub fn new(db: DatabaseConnection, gateway: Arc<dyn PaymentGateway>, cfg: PaystackConfig) -> Self {
        Self { db, gateway, mailer: None, cfg }
    }

    pub fn with_mailer(mut self, mailer: Arc<dyn Mailer>) -> Self {
        self.mailer = Some(mailer);
        self
    }

    async fn notify(&self, email: TemplateEmail) {
        if let Some(m) = &self.mailer {
            send_best_effort(m.as_ref(), email).await;
        }
    }

    /// Price the caller's cart and open a hosted checkout session.
    #[instrument(skip(self))]
    pub async fn initiate(&self, user_id: Uuid) -> Result<CheckoutSession, ServiceError> {
        let buyer = user::Entity::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("User"))?;
        let Some(c) = cart_model::find_by_user(&self.db, user_id).await? else {
            return Err(ServiceError::validation("Cart is empty"));
        };
        let view = cart::load_view(&self.db, &c).await?;
        if view.is_empty() {
            return Err(ServiceError::validation("Cart is empty"));
        }
        let amount = view.subtotal.round_dp(2);
        if amount <= Decimal::ZERO {
            return Err(ServiceError::validation("Cart total must be greater than zero"));
        }
        let minor = payment_intent::to_minor_units(amount)
            .ok_or_else(|| ServiceError::validation("Cart total out of range"))?;

        let req = InitializeRequest {
            email: buyer.email.clone(),
            amount: minor,
            reference: new_reference(),
            currency: self.cfg.currency.clone(),
            callback_url: self.cfg.callback_url.clone(),
        };
        let session = self.gateway.initialize(req).await.map_err(|e| {
            warn!(user_id = %user_id, error = %e, "payment_initialize_failed");
            match e {
                GatewayError::NotConfigured => ServiceError::Unavailable("Payment gateway not configured".into()),
                _ => ServiceError::Upstream("Failed to initiate payment".into()),
            }
        })?;

        payment_intent::create_pending(&self.db, user_id, &session.reference, amount, &self.cfg.currency).await?;
        info!(user_id = %user_id, reference = %session.reference, amount = %amount, "payment_initiated");

        self.notify(TemplateEmail {
            to: buyer.email.clone(),
            to_name: Some(buyer.full_name.clone()),
            subject: "Order Payment Initiated".into(),
            template: EmailTemplate::PaymentInitiated,
            merge_info: json!({ "fullName": buyer.full_name, "reference": session.reference, "amount": amount }),
        })
        .await;

        Ok(CheckoutSession { authorization_url: session.authorization_url, reference: session.reference })
    }

    /// Verify, parse and apply a gateway callback. Safe to call repeatedly
    /// and concurrently for the same reference.
    #[instrument(skip(self, body, signature))]
    pub async fn handle_webhook(&self, body: &[u8], signature: Option<&str>) -> Result<WebhookOutcome, ServiceError> {
        if !self.cfg.webhook_secret.is_empty() {
            let ok = signature.map(|s| verify_signature(&self.cfg.webhook_secret, body, s)).unwrap_or(false);
            if !ok {
                warn!("webhook_signature_rejected");
                return Err(ServiceError::Unauthorized("Invalid webhook signature".into()));
            }
        }
        let event: WebhookEvent = serde_json::from_slice(body)
            .map_err(|_| ServiceError::validation("Invalid webhook payload"))?;
        if event.event != CHARGE_SUCCESS {
            info!(event = %event.event, "webhook_ignored");
            return Ok(WebhookOutcome::Ignored);
        }
        let reference = event
            .data
            .reference
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .ok_or_else(|| ServiceError::validation("Missing payment reference"))?;

        let Some(intent) = payment_intent::find_by_reference(&self.db, reference).await? else {
            warn!(%reference, "webhook_unknown_reference");
            return Ok(WebhookOutcome::Acknowledged);
        };
        if intent.status == PaymentStatus::Succeeded.as_str() {
            return Ok(WebhookOutcome::Acknowledged);
        }
        if !amount_matches(intent.amount, event.data.amount) {
            warn!(%reference, stored = %intent.amount, reported = ?event.data.amount, "webhook_amount_mismatch");
        }

        let txn = self.db.begin().await?;
        if !payment_intent::claim_pending(&txn, intent.id).await? {
            // 另一个并发投递已处理该支付
            txn.rollback().await?;
            return Ok(WebhookOutcome::Acknowledged);
        }

        let items = match cart_model::find_by_user(&txn, intent.user_id).await? {
            Some(c) => {
                models::cart_item::Entity::find()
                    .filter(models::cart_item::Column::CartId.eq(c.id))
                    .all(&txn)
                    .await?
            }
            None => Vec::new(),
        };
        if items.is_empty() {
            warn!(%reference, user_id = %intent.user_id, "webhook_cart_empty");
        }
        let products = products_by_id(&txn, items.iter().map(|i| i.product_id).collect()).await?;

        let created = order::create(&txn, intent.user_id, intent.amount, OrderStatus::Paid).await?;
        let mut lines = Vec::with_capacity(items.len());
        for item in &items {
            let Some(p) = products.get(&item.product_id) else { continue };
            order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(created.id),
                product_id: Set(item.product_id),
                quantity: Set(item.quantity),
                price: Set(p.price),
            }
            .insert(&txn)
            .await?;
            lines.push(json!({ "title": p.title, "quantity": item.quantity, "price": p.price }));
        }
        order_history::append(&txn, created.id, OrderStatus::Paid, Some(format!("Payment {reference} confirmed"))).await?;
        payment_intent::link_order(&txn, intent.id, created.id).await?;
        cart::clear(&txn, intent.user_id).await?;
        txn.commit().await?;
        info!(order_id = %created.id, %reference, user_id = %intent.user_id, "order_created");

        if let Some(buyer) = user::Entity::find_by_id(intent.user_id).one(&self.db).await? {
            self.notify(TemplateEmail {
                to: buyer.email,
                to_name: Some(buyer.full_name.clone()),
                subject: "Order Confirmation".into(),
                template: EmailTemplate::OrderConfirmation,
                merge_info: json!({
                    "fullName": buyer.full_name,
                    "orderId": created.id,
                    "total": created.total,
                    "items": lines,
                }),
            })
            .await;
        }
        Ok(WebhookOutcome::OrderCreated(created.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::{add_item, AddItemInput};
    use crate::checkout::gateway::mock::StubGateway;
    use crate::checkout::webhook::sign;
    use crate::email::mock::RecordingMailer;
    use crate::test_support::{get_db, make_product, make_user, skip_db};

    fn cfg(secret: &str) -> PaystackConfig {
        PaystackConfig { webhook_secret: secret.into(), ..PaystackConfig::default() }
    }

    fn success_body(reference: &str, amount: i64) -> Vec<u8> {
        serde_json::to_vec(&json!({"event": "charge.success", "data": {"reference": reference, "amount": amount}})).unwrap()
    }

    #[tokio::test]
    async fn signature_is_checked_before_anything_else() {
        let svc = CheckoutService::new(DatabaseConnection::Disconnected, Arc::new(StubGateway::default()), cfg("whsec"));
        let body = success_body("AS-x", 100);
        assert!(matches!(svc.handle_webhook(&body, None).await, Err(ServiceError::Unauthorized(_))));
        assert!(matches!(svc.handle_webhook(&body, Some("deadbeef")).await, Err(ServiceError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn other_events_are_ignored() {
        let svc = CheckoutService::new(DatabaseConnection::Disconnected, Arc::new(StubGateway::default()), cfg("whsec"));
        let body = br#"{"event":"transfer.success","data":{}}"#;
        let sig = sign("whsec", body);
        let out = svc.handle_webhook(body, Some(&sig)).await.unwrap();
        assert_eq!(out, WebhookOutcome::Ignored);
        assert_eq!(out.message(), "ignored");

        let garbage = b"not json";
        let sig = sign("whsec", garbage);
        assert!(matches!(svc.handle_webhook(garbage, Some(&sig)).await, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn empty_cart_cannot_check_out() -> Result<(), anyhow::Error> {
        if skip_db() { return Ok(()); }
        let db = get_db().await?;
        let u = make_user(&db).await?;
        let gw = Arc::new(StubGateway::default());
        let svc = CheckoutService::new(db, gw.clone(), cfg(""));
        let r = svc.initiate(u.id).await;
        assert!(matches!(r, Err(ServiceError::Validation(m)) if m == "Cart is empty"));
        assert!(gw.calls().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn gateway_failure_is_upstream_and_persists_nothing() -> Result<(), anyhow::Error> {
        if skip_db() { return Ok(()); }
        let db = get_db().await?;
        let u = make_user(&db).await?;
        let p = make_product(&db, "12.00").await?;
        add_item(&db, u.id, AddItemInput { product_id: p.id, quantity: Some(1) }).await?;

        let svc = CheckoutService::new(db.clone(), Arc::new(StubGateway::failing()), cfg(""));
        assert!(matches!(svc.initiate(u.id).await, Err(ServiceError::Upstream(_))));
        let intents = payment_intent::Entity::find()
            .filter(payment_intent::Column::UserId.eq(u.id))
            .all(&db)
            .await?;
        assert!(intents.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn full_checkout_creates_one_order() -> Result<(), anyhow::Error> {
        if skip_db() { return Ok(()); }
        let db = get_db().await?;
        let u = make_user(&db).await?;
        let p = make_product(&db, "750.50").await?;
        add_item(&db, u.id, AddItemInput { product_id: p.id, quantity: Some(2) }).await?;

        let gw = Arc::new(StubGateway::default());
        let mailer = Arc::new(RecordingMailer::default());
        let svc = CheckoutService::new(db.clone(), gw.clone(), cfg("whsec")).with_mailer(mailer.clone());

        let session = svc.initiate(u.id).await?;
        assert_eq!(gw.calls()[0].amount, 150_100);
        assert_eq!(mailer.sent()[0].template, EmailTemplate::PaymentInitiated);

        let body = success_body(&session.reference, 150_100);
        let sig = sign("whsec", &body);
        let (a, b) = tokio::join!(svc.handle_webhook(&body, Some(&sig)), svc.handle_webhook(&body, Some(&sig)));
        let outcomes = [a?, b?];
        let created: Vec<Uuid> = outcomes.iter().filter_map(|o| o.order_id()).collect();
        assert_eq!(created.len(), 1);

        let again = svc.handle_webhook(&body, Some(&sig)).await?;
        assert_eq!(again, WebhookOutcome::Acknowledged);

        let o = order::Entity::find_by_id(created[0]).one(&db).await?.unwrap();
        assert_eq!(o.status, "PAID");
        assert_eq!(o.total, Decimal::new(150_100, 2));
        let items = order_item::Entity::find().filter(order_item::Column::OrderId.eq(o.id)).all(&db).await?;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 2);

        let intent = payment_intent::find_by_reference(&db, &session.reference).await?.unwrap();
        assert_eq!(intent.status, "succeeded");
        assert_eq!(intent.order_id, Some(o.id));
        assert!(cart::get(&db, u.id).await?.is_empty());
        assert!(mailer.sent().iter().any(|m| m.template == EmailTemplate::OrderConfirmation));
        Ok(())
    }
}
