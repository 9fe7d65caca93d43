use regex::Regex;
use std::sync::OnceLock;

use super::ApiError;

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("Invalid regex"))
}

const MAX_NAME_LEN: usize = 120;
const MAX_FIELD_LEN: usize = 2000;

pub fn validate_email(email: &str) -> Result<String, ApiError> {
    let trimmed = email.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation("Email is required"));
    }
    if !email_regex().is_match(trimmed) {
        return Err(ApiError::validation(format!(
            "Invalid email address: {trimmed}"
        )));
    }
    Ok(trimmed.to_lowercase())
}

pub fn validate_name(name: &str) -> Result<String, ApiError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation("Name is required"));
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(ApiError::validation(format!(
            "Name must be {MAX_NAME_LEN} characters or less"
        )));
    }
    Ok(trimmed.to_string())
}

pub fn validate_password_present(password: &str, field: &str) -> Result<(), ApiError> {
    if password.is_empty() {
        return Err(ApiError::validation(format!("{field} is required")));
    }
    Ok(())
}

/// Trims a free-text field; blank becomes `None`.
pub fn optional_text(value: Option<String>, field: &str) -> Result<Option<String>, ApiError> {
    let Some(value) = value else {
        return Ok(None);
    };

    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if trimmed.chars().count() > MAX_FIELD_LEN {
        return Err(ApiError::validation(format!(
            "{field} must be {MAX_FIELD_LEN} characters or less"
        )));
    }
    Ok(Some(trimmed.to_string()))
}

/// Profile edit of a free-text field: absent leaves it alone, blank clears it.
pub fn text_update(
    value: Option<String>,
    field: &str,
) -> Result<Option<Option<String>>, ApiError> {
    match value {
        None => Ok(None),
        Some(value) => optional_text(Some(value), field).map(Some),
    }
}

pub fn validate_member_id(id: i32) -> Result<i32, ApiError> {
    if id <= 0 {
        return Err(ApiError::validation(format!(
            "Invalid member ID: {}. ID must be a positive integer",
            id
        )));
    }
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert_eq!(validate_email(" A@X.com ").unwrap(), "a@x.com");
        assert!(validate_email("").is_err());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("a@b").is_err());
        assert!(validate_email("a b@c.com").is_err());
    }

    #[test]
    fn test_validate_name() {
        assert_eq!(validate_name("  Ritwik ").unwrap(), "Ritwik");
        assert!(validate_name("   ").is_err());
        assert!(validate_name(&"a".repeat(121)).is_err());
    }

    #[test]
    fn test_optional_text() {
        assert_eq!(optional_text(None, "Phone").unwrap(), None);
        assert_eq!(optional_text(Some("  ".into()), "Phone").unwrap(), None);
        assert_eq!(
            optional_text(Some(" O+ ".into()), "Blood group").unwrap(),
            Some("O+".to_string())
        );
        assert!(optional_text(Some("x".repeat(2001)), "Biography").is_err());
    }

    #[test]
    fn test_text_update() {
        assert_eq!(text_update(None, "Phone").unwrap(), None);
        assert_eq!(text_update(Some(" ".into()), "Phone").unwrap(), Some(None));
        assert_eq!(
            text_update(Some("555".into()), "Phone").unwrap(),
            Some(Some("555".to_string()))
        );
        assert!(text_update(Some("x".repeat(2001)), "Address").is_err());
    }

    #[test]
    fn test_validate_member_id() {
        assert!(validate_member_id(1).is_ok());
        assert!(validate_member_id(0).is_err());
        assert!(validate_member_id(-4).is_err());
    }
}
