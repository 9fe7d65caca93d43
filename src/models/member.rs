use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Guild membership tier. `Pending` accounts cannot sign in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MemberType {
    #[default]
    Pending,
    Primary,
    Full,
    Permanent,
    Executive,
}

impl MemberType {
    pub const ALL: [Self; 5] = [
        Self::Pending,
        Self::Primary,
        Self::Full,
        Self::Permanent,
        Self::Executive,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Primary => "primary",
            Self::Full => "full",
            Self::Permanent => "permanent",
            Self::Executive => "executive",
        }
    }

    #[must_use]
    pub const fn is_pending(self) -> bool {
        matches!(self, Self::Pending)
    }
}

impl fmt::Display for MemberType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MemberType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!(
                    "Invalid member type '{s}'. Expected one of: pending, primary, full, permanent, executive"
                )
            })
    }
}

/// Administrative role tag, orthogonal to [`MemberType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AdminRole {
    #[serde(rename = "superAdmin")]
    SuperAdmin,
    #[serde(rename = "newsAdmin")]
    NewsAdmin,
}

impl AdminRole {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SuperAdmin => "superAdmin",
            Self::NewsAdmin => "newsAdmin",
        }
    }
}

impl fmt::Display for AdminRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AdminRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "superAdmin" => Ok(Self::SuperAdmin),
            "newsAdmin" => Ok(Self::NewsAdmin),
            other => Err(format!(
                "Invalid admin role '{other}'. Expected superAdmin or newsAdmin"
            )),
        }
    }
}

/// Member record as exposed to the rest of the application. The password
/// hash never leaves the repository through this type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub member_type: MemberType,
    pub admin_roles: Vec<AdminRole>,
    pub phone: Option<String>,
    pub blood_group: Option<String>,
    pub address: Option<String>,
    pub biography: Option<String>,
    pub profile_image: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Fields required to create a member record.
#[derive(Debug, Clone)]
pub struct NewMember {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub phone: Option<String>,
    pub blood_group: Option<String>,
    pub address: Option<String>,
    pub biography: Option<String>,
}

/// Self-service profile changes. `None` leaves the stored value untouched;
/// `Some(None)` clears an optional field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileChanges {
    pub name: Option<String>,
    pub phone: Option<Option<String>>,
    pub blood_group: Option<Option<String>>,
    pub address: Option<Option<String>>,
    pub biography: Option<Option<String>>,
    pub profile_image: Option<Option<String>>,
}

impl ProfileChanges {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.phone.is_none()
            && self.blood_group.is_none()
            && self.address.is_none()
            && self.biography.is_none()
            && self.profile_image.is_none()
    }
}

/// Filter and page selection for admin member listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberQuery {
    pub member_type: Option<MemberType>,
    pub search: Option<String>,
    pub page: u64,
    pub page_size: u64,
}

impl Default for MemberQuery {
    fn default() -> Self {
        Self {
            member_type: None,
            search: None,
            page: 1,
            page_size: 20,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberPage {
    pub members: Vec<Member>,
    pub page: u64,
    pub page_size: u64,
    pub total_pages: u64,
    pub total: u64,
}

/// Normalizes an email for storage and lookup.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_type_parse() {
        assert_eq!("primary".parse::<MemberType>(), Ok(MemberType::Primary));
        assert_eq!("Executive".parse::<MemberType>(), Ok(MemberType::Executive));
        assert!("gold".parse::<MemberType>().is_err());
        assert!(MemberType::default().is_pending());
    }

    #[test]
    fn test_member_type_serde() {
        let json = serde_json::to_string(&MemberType::Permanent).unwrap();
        assert_eq!(json, "\"permanent\"");
        let parsed: MemberType = serde_json::from_str("\"full\"").unwrap();
        assert_eq!(parsed, MemberType::Full);
    }

    #[test]
    fn test_admin_role_serde() {
        let roles = vec![AdminRole::SuperAdmin, AdminRole::NewsAdmin];
        let json = serde_json::to_string(&roles).unwrap();
        assert_eq!(json, r#"["superAdmin","newsAdmin"]"#);
        assert!(serde_json::from_str::<AdminRole>("\"*\"").is_err());
        assert_eq!("newsAdmin".parse::<AdminRole>(), Ok(AdminRole::NewsAdmin));
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  A@X.Com "), "a@x.com");
    }
}
