//! First-start provisioning.

use std::io::Write;

use sea_orm::{DatabaseConnection, EntityTrait, PaginatorTrait};
use tracing::{info, warn};
use uuid::Uuid;

use crate::authz::Role;
use crate::errors::ServiceError;
use crate::password;
use crate::services::user;

const GENERATED_PASSWORD_LEN: usize = 20;

/// Creates the SUPER_ADMIN account when the user table is empty.
///
/// Returns the new user's id, or `None` when users already exist. A password
/// is generated when none is configured and printed once to stderr, never to the log.
pub async fn ensure_super_admin(db: &DatabaseConnection, cfg: &configs::BootstrapConfig) -> Result<Option<Uuid>, ServiceError> {
    ensure_super_admin_with(db, cfg, &mut std::io::stderr()).await
}

async fn ensure_super_admin_with<W: Write>(
    db: &DatabaseConnection,
    cfg: &configs::BootstrapConfig,
    notice: &mut W,
) -> Result<Option<Uuid>, ServiceError> {
    if models::user::Entity::find().count(db).await? > 0 {
        return Ok(None);
    }
    let (plain, generated) = match cfg.admin_password.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
        Some(p) => (p.to_string(), false),
        None => (password::generate_password(GENERATED_PASSWORD_LEN), true),
    };
    password::check_strength(&plain)?;
    let created = user::create_unchecked(
        db,
        &cfg.admin_username,
        &cfg.admin_email,
        "Administrator",
        &plain,
        &[Role::SuperAdmin],
    )
    .await?;
    if generated {
        warn!(username = %created.username, "bootstrap admin created with generated password; change it after first login");
        if let Err(e) = writeln!(notice, "bootstrap admin '{}' password: {plain}", created.username) {
            warn!(error = %e, "could not print the generated bootstrap password");
        }
    } else {
        info!(username = %created.username, "bootstrap admin created");
    }
    Ok(Some(created.id))
}
