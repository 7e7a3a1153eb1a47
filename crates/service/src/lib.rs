//! Service layer for the shop backend, built on top of `models`.
//! - Keeps business rules (cart merging, checkout, disputes) out of the HTTP layer.
//! - Reuses validation and entity definitions in `models` crate.
//! - Outbound integrations (Paystack, ZeptoMail, Cloudinary) sit behind traits.

pub mod errors;
pub mod pagination;
pub mod filters;
pub mod stats;
pub mod views;

pub mod auth;
pub mod email;
pub mod checkout;
pub mod uploads;

pub mod users;
pub mod products;
pub mod cart;
pub mod orders;
pub mod disputes;
pub mod transactions;
pub mod analytics;

#[cfg(test)]
pub mod test_support;
