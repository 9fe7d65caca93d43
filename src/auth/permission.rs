//! Administrative permission checks.
//!
//! Every handler and every UI affordance asks this module. Grants are
//! currently coarse: `superAdmin` is the wildcard and holds every
//! permission, no other role grants anything.

use serde::Serialize;
use std::fmt;

use crate::models::AdminRole;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Permission {
    #[serde(rename = "members.read")]
    MembersRead,
    #[serde(rename = "members.approve")]
    MembersApprove,
    #[serde(rename = "payments.read")]
    PaymentsRead,
    #[serde(rename = "news.write")]
    NewsWrite,
    #[serde(rename = "events.write")]
    EventsWrite,
    #[serde(rename = "gallery.write")]
    GalleryWrite,
    #[serde(rename = "content.write")]
    ContentWrite,
}

impl Permission {
    pub const ALL: [Self; 7] = [
        Self::MembersRead,
        Self::MembersApprove,
        Self::PaymentsRead,
        Self::NewsWrite,
        Self::EventsWrite,
        Self::GalleryWrite,
        Self::ContentWrite,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MembersRead => "members.read",
            Self::MembersApprove => "members.approve",
            Self::PaymentsRead => "payments.read",
            Self::NewsWrite => "news.write",
            Self::EventsWrite => "events.write",
            Self::GalleryWrite => "gallery.write",
            Self::ContentWrite => "content.write",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a role set unlocks the admin area at all.
#[must_use]
pub fn has_admin_access(roles: &[AdminRole]) -> bool {
    roles.contains(&AdminRole::SuperAdmin)
}

#[must_use]
pub fn has_permission(roles: &[AdminRole], permission: Permission) -> bool {
    let granted = has_admin_access(roles);
    tracing::trace!(%permission, granted, "permission check");
    granted
}

/// Permissions held by a role set, for UI affordance gating.
#[must_use]
pub fn granted_permissions(roles: &[AdminRole]) -> Vec<Permission> {
    Permission::ALL
        .into_iter()
        .filter(|p| has_permission(roles, *p))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_super_admin_holds_everything() {
        let roles = [AdminRole::SuperAdmin];
        for permission in Permission::ALL {
            assert!(has_permission(&roles, permission), "{permission}");
        }
        assert_eq!(granted_permissions(&roles).len(), Permission::ALL.len());
    }

    #[test]
    fn test_news_admin_holds_nothing() {
        let roles = [AdminRole::NewsAdmin];
        assert!(!has_admin_access(&roles));
        assert!(!has_permission(&roles, Permission::NewsWrite));
        assert!(granted_permissions(&roles).is_empty());
    }

    #[test]
    fn test_no_roles() {
        assert!(!has_admin_access(&[]));
        assert!(!has_permission(&[], Permission::MembersRead));
    }

    #[test]
    fn test_permission_strings() {
        assert_eq!(Permission::MembersApprove.to_string(), "members.approve");
        assert_eq!(
            serde_json::to_string(&Permission::PaymentsRead).unwrap(),
            "\"payments.read\""
        );
    }
}
