//! Role hierarchy and permission rules.
//!
//! Roles are totally ordered: `USER < MODERATOR < EDITOR < ADMIN < SUPER_ADMIN`.
//! Each role directly grants a handful of permissions and inherits every
//! grant of the roles below it.
//!
//! ```
//! use service::authz::{Permission, Principal, Role};
//! let editor = Principal::new(uuid::Uuid::new_v4(), "eva", vec![Role::Editor]);
//! assert!(editor.has_permission(Permission::NewsPublish));
//! assert!(editor.has_permission(Permission::MediaDelete)); // inherited from MODERATOR
//! assert!(!editor.has_permission(Permission::MemberCreate));
//! ```

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Role {
    User,
    Moderator,
    Editor,
    Admin,
    SuperAdmin,
}

impl Role {
    /// Ascending by level.
    pub const ALL: [Role; 5] = [Role::User, Role::Moderator, Role::Editor, Role::Admin, Role::SuperAdmin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Moderator => "MODERATOR",
            Role::Editor => "EDITOR",
            Role::Admin => "ADMIN",
            Role::SuperAdmin => "SUPER_ADMIN",
        }
    }

    pub fn level(&self) -> u8 {
        *self as u8 + 1
    }

    /// Permissions granted by this role alone, without inheritance.
    pub fn direct_grants(&self) -> &'static [Permission] {
        use Permission::*;
        match self {
            Role::User => &[MemberRead, PlayerRead, TournamentRead, DistrictRead, NewsRead, MediaRead, DownloadRead],
            Role::Moderator => &[NewsUpdate, MediaCreate, MediaUpdate, MediaDelete],
            Role::Editor => &[
                NewsCreate,
                NewsDelete,
                NewsPublish,
                PlayerCreate,
                PlayerUpdate,
                TournamentCreate,
                TournamentUpdate,
                DownloadCreate,
                DownloadUpdate,
                DownloadDelete,
            ],
            Role::Admin => &[
                MemberCreate,
                MemberUpdate,
                MemberDelete,
                PlayerDelete,
                TournamentDelete,
                DistrictCreate,
                DistrictUpdate,
                DistrictDelete,
                UserRead,
                UserCreate,
                UserUpdate,
                AuditRead,
                BulkOperations,
                SystemHealth,
            ],
            Role::SuperAdmin => &[UserDelete, RoleAssign, SystemManage],
        }
    }

    /// Direct grants of this role and of every lower role.
    pub fn effective_permissions(&self) -> BTreeSet<Permission> {
        Role::ALL
            .iter()
            .filter(|r| *r <= self)
            .flat_map(|r| r.direct_grants().iter().copied())
            .collect()
    }

    pub fn grants(&self, permission: Permission) -> bool {
        Role::ALL.iter().filter(|r| *r <= self).any(|r| r.direct_grants().contains(&permission))
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AuthzError;

    /// Case-insensitive; an optional `ROLE_` prefix is accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        let name = upper.strip_prefix("ROLE_").unwrap_or(&upper);
        Role::ALL
            .iter()
            .copied()
            .find(|r| r.as_str() == name)
            .ok_or_else(|| AuthzError::UnknownRole(s.to_string()))
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

macro_rules! permissions {
    ($($variant:ident => $name:literal),+ $(,)?) => {
        /// Fine-grained capability checked per endpoint.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum Permission {
            $($variant),+
        }

        impl Permission {
            pub const ALL: &'static [Permission] = &[$(Permission::$variant),+];

            /// Canonical name, e.g. `PERMISSION_MEMBER_CREATE`.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Permission::$variant => concat!("PERMISSION_", $name)),+
                }
            }
        }
    };
}

permissions! {
    MemberRead => "MEMBER_READ",
    MemberCreate => "MEMBER_CREATE",
    MemberUpdate => "MEMBER_UPDATE",
    MemberDelete => "MEMBER_DELETE",
    PlayerRead => "PLAYER_READ",
    PlayerCreate => "PLAYER_CREATE",
    PlayerUpdate => "PLAYER_UPDATE",
    PlayerDelete => "PLAYER_DELETE",
    TournamentRead => "TOURNAMENT_READ",
    TournamentCreate => "TOURNAMENT_CREATE",
    TournamentUpdate => "TOURNAMENT_UPDATE",
    TournamentDelete => "TOURNAMENT_DELETE",
    DistrictRead => "DISTRICT_READ",
    DistrictCreate => "DISTRICT_CREATE",
    DistrictUpdate => "DISTRICT_UPDATE",
    DistrictDelete => "DISTRICT_DELETE",
    NewsRead => "NEWS_READ",
    NewsCreate => "NEWS_CREATE",
    NewsUpdate => "NEWS_UPDATE",
    NewsDelete => "NEWS_DELETE",
    NewsPublish => "NEWS_PUBLISH",
    MediaRead => "MEDIA_READ",
    MediaCreate => "MEDIA_CREATE",
    MediaUpdate => "MEDIA_UPDATE",
    MediaDelete => "MEDIA_DELETE",
    DownloadRead => "DOWNLOAD_READ",
    DownloadCreate => "DOWNLOAD_CREATE",
    DownloadUpdate => "DOWNLOAD_UPDATE",
    DownloadDelete => "DOWNLOAD_DELETE",
    UserRead => "USER_READ",
    UserCreate => "USER_CREATE",
    UserUpdate => "USER_UPDATE",
    UserDelete => "USER_DELETE",
    RoleAssign => "ROLE_ASSIGN",
    AuditRead => "AUDIT_READ",
    BulkOperations => "BULK_OPERATIONS",
    SystemHealth => "SYSTEM_HEALTH",
    SystemManage => "SYSTEM_MANAGE",
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = AuthzError;

    /// Accepts `PERMISSION_MEMBER_CREATE` or `MEMBER_CREATE`, any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        let name = upper.strip_prefix("PERMISSION_").unwrap_or(&upper);
        Permission::ALL
            .iter()
            .copied()
            .find(|p| &p.as_str()["PERMISSION_".len()..] == name)
            .ok_or_else(|| AuthzError::UnknownPermission(s.to_string()))
    }
}

impl Serialize for Permission {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Permission {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthzError {
    #[error("requires role {0}")]
    MissingRole(Role),
    #[error("requires permission {0}")]
    MissingPermission(Permission),
    #[error("requires any of: {0}")]
    MissingAny(String),
    #[error("requires all of: {0}")]
    MissingAll(String),
    #[error("not allowed to grant role {0}")]
    CannotGrant(Role),
    #[error("unknown role: {0}")]
    UnknownRole(String),
    #[error("unknown permission: {0}")]
    UnknownPermission(String),
}

/// Authenticated caller attached to a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: Uuid,
    pub username: String,
    pub roles: Vec<Role>,
}

impl Principal {
    pub fn new(user_id: Uuid, username: impl Into<String>, roles: Vec<Role>) -> Self {
        Self { user_id, username: username.into(), roles }
    }

    pub fn highest_role(&self) -> Option<Role> {
        self.roles.iter().copied().max()
    }

    /// True when any held role is at or above `role`.
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.iter().any(|r| *r >= role)
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        self.highest_role().map_or(false, |r| r.grants(permission))
    }

    pub fn has_any_permission(&self, permissions: &[Permission]) -> bool {
        permissions.iter().any(|p| self.has_permission(*p))
    }

    pub fn has_all_permissions(&self, permissions: &[Permission]) -> bool {
        permissions.iter().all(|p| self.has_permission(*p))
    }

    pub fn permissions(&self) -> BTreeSet<Permission> {
        self.highest_role().map(|r| r.effective_permissions()).unwrap_or_default()
    }

    pub fn require_role(&self, role: Role) -> Result<(), AuthzError> {
        if self.has_role(role) { Ok(()) } else { Err(AuthzError::MissingRole(role)) }
    }

    pub fn require_permission(&self, permission: Permission) -> Result<(), AuthzError> {
        if self.has_permission(permission) {
            Ok(())
        } else {
            Err(AuthzError::MissingPermission(permission))
        }
    }

    pub fn require_any_permission(&self, permissions: &[Permission]) -> Result<(), AuthzError> {
        if self.has_any_permission(permissions) {
            Ok(())
        } else {
            Err(AuthzError::MissingAny(join(permissions)))
        }
    }

    pub fn require_all_permissions(&self, permissions: &[Permission]) -> Result<(), AuthzError> {
        if self.has_all_permissions(permissions) {
            Ok(())
        } else {
            Err(AuthzError::MissingAll(join(permissions)))
        }
    }

    /// A SUPER_ADMIN grants anything; others only roles strictly below their own.
    pub fn can_grant(&self, role: Role) -> bool {
        match self.highest_role() {
            Some(Role::SuperAdmin) => true,
            Some(highest) => role < highest,
            None => false,
        }
    }

    pub fn require_grantable(&self, roles: &[Role]) -> Result<(), AuthzError> {
        match roles.iter().find(|r| !self.can_grant(**r)) {
            Some(r) => Err(AuthzError::CannotGrant(*r)),
            None => Ok(()),
        }
    }
}

fn join(permissions: &[Permission]) -> String {
    permissions.iter().map(Permission::as_str).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(roles: &[Role]) -> Principal {
        Principal::new(Uuid::new_v4(), "tester", roles.to_vec())
    }

    #[test]
    fn hierarchy_is_totally_ordered() {
        assert!(Role::SuperAdmin > Role::Admin);
        assert!(Role::Admin > Role::Editor);
        assert!(Role::Editor > Role::Moderator);
        assert!(Role::Moderator > Role::User);
        assert_eq!(Role::User.level(), 1);
        assert_eq!(Role::SuperAdmin.level(), 5);
    }

    #[test]
    fn higher_roles_inherit_every_lower_grant() {
        for pair in Role::ALL.windows(2) {
            let lower = pair[0].effective_permissions();
            let higher = pair[1].effective_permissions();
            assert!(lower.is_subset(&higher), "{} should include {}", pair[1], pair[0]);
        }
        assert_eq!(Role::SuperAdmin.effective_permissions().len(), Permission::ALL.len());
    }

    #[test]
    fn every_permission_is_granted_exactly_once() {
        for p in Permission::ALL {
            let n = Role::ALL.iter().filter(|r| r.direct_grants().contains(p)).count();
            assert_eq!(n, 1, "{p} granted {n} times");
        }
    }

    #[test]
    fn grant_table_boundaries() {
        let moderator = principal(&[Role::Moderator]);
        assert!(moderator.has_permission(Permission::NewsUpdate));
        assert!(!moderator.has_permission(Permission::NewsCreate));

        let admin = principal(&[Role::Admin]);
        assert!(admin.has_permission(Permission::BulkOperations));
        assert!(!admin.has_permission(Permission::UserDelete));
        assert!(!admin.has_permission(Permission::SystemManage));

        let root = principal(&[Role::SuperAdmin]);
        assert!(root.has_permission(Permission::RoleAssign));
    }

    #[test]
    fn has_role_uses_hierarchy() {
        let editor = principal(&[Role::Editor]);
        assert!(editor.has_role(Role::User));
        assert!(editor.has_role(Role::Editor));
        assert!(!editor.has_role(Role::Admin));
        assert_eq!(editor.require_role(Role::Admin), Err(AuthzError::MissingRole(Role::Admin)));
    }

    #[test]
    fn empty_lists_follow_any_all_semantics() {
        let user = principal(&[Role::User]);
        assert!(!user.has_any_permission(&[]));
        assert!(user.has_all_permissions(&[]));
        assert!(user.require_any_permission(&[]).is_err());
        assert!(user.require_all_permissions(&[]).is_ok());
    }

    #[test]
    fn any_and_all_mixed() {
        let user = principal(&[Role::User]);
        let perms = [Permission::NewsRead, Permission::NewsCreate];
        assert!(user.has_any_permission(&perms));
        assert!(!user.has_all_permissions(&perms));
        let err = user.require_all_permissions(&perms).unwrap_err();
        assert_eq!(err.to_string(), "requires all of: PERMISSION_NEWS_READ, PERMISSION_NEWS_CREATE");
    }

    #[test]
    fn principal_without_roles_has_nothing() {
        let nobody = principal(&[]);
        assert_eq!(nobody.highest_role(), None);
        assert!(nobody.permissions().is_empty());
        assert!(!nobody.has_role(Role::User));
    }

    #[test]
    fn multiple_roles_use_the_highest() {
        let p = principal(&[Role::User, Role::Admin, Role::Moderator]);
        assert_eq!(p.highest_role(), Some(Role::Admin));
        assert_eq!(p.permissions(), Role::Admin.effective_permissions());
    }

    #[test]
    fn parsing_and_rendering() {
        assert_eq!("ROLE_super_admin".parse::<Role>(), Ok(Role::SuperAdmin));
        assert_eq!("editor".parse::<Role>(), Ok(Role::Editor));
        assert!("OWNER".parse::<Role>().is_err());
        assert_eq!(Permission::MemberCreate.to_string(), "PERMISSION_MEMBER_CREATE");
        assert_eq!("member_create".parse::<Permission>(), Ok(Permission::MemberCreate));
        assert_eq!("PERMISSION_AUDIT_READ".parse::<Permission>(), Ok(Permission::AuditRead));
        let json = serde_json::to_string(&vec![Role::Admin]).unwrap();
        assert_eq!(json, r#"["ADMIN"]"#);
        let back: Vec<Role> = serde_json::from_str(r#"["ROLE_USER"]"#).unwrap();
        assert_eq!(back, vec![Role::User]);
    }

    #[test]
    fn grant_rules() {
        let admin = principal(&[Role::Admin]);
        assert!(admin.can_grant(Role::Editor));
        assert!(!admin.can_grant(Role::Admin));
        assert!(!admin.can_grant(Role::SuperAdmin));
        assert_eq!(
            admin.require_grantable(&[Role::User, Role::SuperAdmin]),
            Err(AuthzError::CannotGrant(Role::SuperAdmin))
        );
        let root = principal(&[Role::SuperAdmin]);
        assert!(root.can_grant(Role::SuperAdmin));
    }
}
