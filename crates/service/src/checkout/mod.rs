//! Checkout: hosted payment initiation and the payment webhook.

pub mod gateway;
pub mod service;
pub mod webhook;

pub use gateway::{PaymentGateway, PaystackClient};
pub use service::{CheckoutService, CheckoutSession, WebhookOutcome};
