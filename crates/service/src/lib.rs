//! Service layer for the association backend.
//! - Business rules on top of the `models` entities.
//! - Authentication, role/permission checks and the audit trail.
//! - Framework independent: handlers in `server` call these functions.

pub mod errors;
pub mod pagination;
pub mod authz;
pub mod password;
pub mod auth;
pub mod cache;
pub mod services;
pub mod bootstrap;
pub mod scheduler;
#[cfg(test)]
pub mod test_support;
