//! Auth module: three-layer architecture (domain, repository, service).
//!
//! Login, token refresh with rotation, logout and bearer token validation.

pub mod domain;
pub mod errors;
pub mod repository;
pub mod repo;
pub mod revocation;
pub mod service;
pub mod token;

pub use service::AuthService;
