//! Auth module: three-layer architecture (domain, repository, service).
//!
//! Registration, login, JWT issuing and password reset live here; the web
//! layer only extracts input and maps `AuthError` to responses.

pub mod domain;
pub mod errors;
pub mod password;
pub mod repository;
pub mod service;
pub mod token;
pub mod repo;

pub use service::AuthService;
