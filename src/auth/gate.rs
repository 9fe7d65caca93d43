//! Path-based access rules evaluated before any page or handler runs.

use super::permission::has_admin_access;
use super::session::SessionClaims;

pub const SIGN_IN_PATH: &str = "/auth/signin";
pub const HOME_PATH: &str = "/";
pub const DASHBOARD_PATH: &str = "/dashboard";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathClass {
    Auth,
    Admin,
    Dashboard,
    Public,
}

impl PathClass {
    #[must_use]
    pub fn of(path: &str) -> Self {
        // Order matters: auth pages first so a signed-in member never sees them.
        if under(path, "/auth") {
            Self::Auth
        } else if under(path, "/admin") {
            Self::Admin
        } else if under(path, DASHBOARD_PATH) {
            Self::Dashboard
        } else {
            Self::Public
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Continue,
    RedirectToSignIn,
    RedirectToHome,
    RedirectToDashboard,
}

impl GateDecision {
    /// Redirect target, `None` for [`GateDecision::Continue`].
    #[must_use]
    pub const fn location(self) -> Option<&'static str> {
        match self {
            Self::Continue => None,
            Self::RedirectToSignIn => Some(SIGN_IN_PATH),
            Self::RedirectToHome => Some(HOME_PATH),
            Self::RedirectToDashboard => Some(DASHBOARD_PATH),
        }
    }
}

#[must_use]
pub fn decide(path: &str, claims: Option<&SessionClaims>) -> GateDecision {
    let is_admin = claims.is_some_and(|c| has_admin_access(&c.admin_roles));

    match (PathClass::of(path), claims) {
        (PathClass::Auth, Some(_)) => GateDecision::RedirectToHome,
        (PathClass::Admin | PathClass::Dashboard, None) => GateDecision::RedirectToSignIn,
        (PathClass::Admin, Some(_)) if !is_admin => GateDecision::RedirectToDashboard,
        _ => GateDecision::Continue,
    }
}

/// Canonical form of a request path as the static file service resolves it:
/// percent-decoded, with empty and `.` segments dropped.
///
/// Returns `None` for paths that cannot be classified safely, such as
/// invalid UTF-8 after decoding or any `..` segment.
#[must_use]
pub fn normalize_path(raw: &str) -> Option<String> {
    let decoded = urlencoding::decode(raw).ok()?;
    if decoded.contains('\\') || decoded.contains('\0') {
        return None;
    }

    let mut normalized = String::with_capacity(decoded.len());
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => return None,
            segment => {
                normalized.push('/');
                normalized.push_str(segment);
            }
        }
    }

    if normalized.is_empty() {
        normalized.push('/');
    }
    Some(normalized)
}

/// Segment-aware prefix match: `/admin` and `/admin/x`, never `/administer`.
fn under(path: &str, prefix: &str) -> bool {
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AdminRole, MemberType};

    fn claims(admin_roles: Vec<AdminRole>) -> SessionClaims {
        SessionClaims {
            sub: "1".into(),
            member_type: MemberType::Full,
            admin_roles,
            iss: "guildhall".into(),
            iat: 0,
            exp: i64::MAX,
        }
    }

    #[test]
    fn test_path_classes() {
        assert_eq!(PathClass::of("/auth/signin"), PathClass::Auth);
        assert_eq!(PathClass::of("/auth"), PathClass::Auth);
        assert_eq!(PathClass::of("/authors"), PathClass::Public);
        assert_eq!(PathClass::of("/admin/dashboard"), PathClass::Admin);
        assert_eq!(PathClass::of("/administer"), PathClass::Public);
        assert_eq!(PathClass::of("/dashboard"), PathClass::Dashboard);
        assert_eq!(PathClass::of("/dashboard/projects"), PathClass::Dashboard);
        assert_eq!(PathClass::of("/"), PathClass::Public);
        assert_eq!(PathClass::of("/members"), PathClass::Public);
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/admin/x").as_deref(), Some("/admin/x"));
        assert_eq!(normalize_path("/%61dmin/x").as_deref(), Some("/admin/x"));
        assert_eq!(normalize_path("/./admin/x").as_deref(), Some("/admin/x"));
        assert_eq!(normalize_path("//admin//x/").as_deref(), Some("/admin/x"));
        assert_eq!(normalize_path("/%2Fdashboard").as_deref(), Some("/dashboard"));
        assert_eq!(normalize_path("/").as_deref(), Some("/"));
        assert_eq!(normalize_path("").as_deref(), Some("/"));
        assert_eq!(normalize_path("/../admin"), None);
        assert_eq!(normalize_path("/events/%2E%2E/admin"), None);
        assert_eq!(normalize_path("/admin%5Cx"), None);
        assert_eq!(normalize_path("/%FF"), None);
    }

    #[test]
    fn test_encoded_variants_classify_like_canonical() {
        for raw in ["/%61dmin/x", "/./admin/x", "//admin/x", "/admin"] {
            let path = normalize_path(raw).unwrap();
            assert_eq!(decide(&path, None), GateDecision::RedirectToSignIn, "{raw}");
        }
    }

    #[test]
    fn test_full_table() {
        let member = claims(vec![]);
        let admin = claims(vec![AdminRole::SuperAdmin]);

        let cases = [
            ("/auth/signin", None, GateDecision::Continue),
            ("/auth/signin", Some(&member), GateDecision::RedirectToHome),
            ("/auth/signin", Some(&admin), GateDecision::RedirectToHome),
            ("/admin/dashboard", None, GateDecision::RedirectToSignIn),
            ("/admin/dashboard", Some(&member), GateDecision::RedirectToDashboard),
            ("/admin/dashboard", Some(&admin), GateDecision::Continue),
            ("/dashboard/profile", None, GateDecision::RedirectToSignIn),
            ("/dashboard/profile", Some(&member), GateDecision::Continue),
            ("/dashboard/profile", Some(&admin), GateDecision::Continue),
            ("/events", None, GateDecision::Continue),
            ("/events", Some(&member), GateDecision::Continue),
            ("/events", Some(&admin), GateDecision::Continue),
        ];

        for (path, session, expected) in cases {
            assert_eq!(decide(path, session), expected, "{path} {session:?}");
        }
    }

    #[test]
    fn test_news_admin_is_not_admin() {
        let news = claims(vec![AdminRole::NewsAdmin]);
        assert_eq!(
            decide("/admin/news", Some(&news)),
            GateDecision::RedirectToDashboard
        );
    }

    #[test]
    fn test_locations() {
        assert_eq!(GateDecision::Continue.location(), None);
        assert_eq!(GateDecision::RedirectToSignIn.location(), Some("/auth/signin"));
        assert_eq!(GateDecision::RedirectToHome.location(), Some("/"));
        assert_eq!(GateDecision::RedirectToDashboard.location(), Some("/dashboard"));
    }
}
