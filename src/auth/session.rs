//! Signed session tokens.
//!
//! A session is an HS256 JWT carrying the minimal claim set the route gate
//! and API handlers need: who the member is, their tier and their admin
//! roles. There is no revocation list; expiry is the only lifecycle.

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SessionConfig;
use crate::models::{AdminRole, MemberType};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session expired")]
    Expired,

    #[error("Invalid session token: {0}")]
    Invalid(String),

    #[error("Failed to sign session token: {0}")]
    Signing(String),
}

/// Identity fields produced by a successful credential check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiedIdentity {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub member_type: MemberType,
    pub admin_roles: Vec<AdminRole>,
}

/// Claims embedded in every session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionClaims {
    /// Member id.
    pub sub: String,
    pub member_type: MemberType,
    #[serde(default)]
    pub admin_roles: Vec<AdminRole>,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
}

impl SessionClaims {
    /// Numeric member id, `None` if the subject is not one of ours.
    #[must_use]
    pub fn user_id(&self) -> Option<i32> {
        self.sub.parse().ok()
    }
}

pub struct SessionIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    ttl_secs: i64,
}

impl SessionIssuer {
    #[must_use]
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            issuer: config.issuer.clone(),
            ttl_secs: config.ttl_hours.saturating_mul(3600),
        }
    }

    /// Build the claim set for an identity without signing it.
    #[must_use]
    pub fn claims_for(&self, identity: &VerifiedIdentity) -> SessionClaims {
        let now = Utc::now().timestamp();
        let mut admin_roles = identity.admin_roles.clone();
        admin_roles.sort();
        admin_roles.dedup();

        SessionClaims {
            sub: identity.id.to_string(),
            member_type: identity.member_type,
            admin_roles,
            iss: self.issuer.clone(),
            iat: now,
            exp: now + self.ttl_secs,
        }
    }

    pub fn issue(&self, identity: &VerifiedIdentity) -> Result<(String, SessionClaims), SessionError> {
        let claims = self.claims_for(identity);
        let token = self.sign(&claims)?;
        Ok((token, claims))
    }

    pub fn sign(&self, claims: &SessionClaims) -> Result<String, SessionError> {
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| SessionError::Signing(e.to_string()))
    }

    pub fn decode(&self, token: &str) -> Result<SessionClaims, SessionError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["sub", "exp", "iat", "iss"]);
        validation.leeway = 0;

        jsonwebtoken::decode::<SessionClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => SessionError::Expired,
                _ => SessionError::Invalid(e.to_string()),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> SessionConfig {
        SessionConfig {
            secret: "0123456789abcdef0123456789abcdef".into(),
            issuer: "guildhall-test".into(),
            ttl_hours: 1,
        }
    }

    fn identity(admin_roles: Vec<AdminRole>) -> VerifiedIdentity {
        VerifiedIdentity {
            id: 42,
            name: "Satyajit".into(),
            email: "s@guild.test".into(),
            member_type: MemberType::Primary,
            admin_roles,
        }
    }

    #[test]
    fn test_issue_and_decode() {
        let issuer = SessionIssuer::new(&test_config());
        let (token, issued) = issuer.issue(&identity(vec![AdminRole::SuperAdmin])).unwrap();

        let claims = issuer.decode(&token).unwrap();
        assert_eq!(claims, issued);
        assert_eq!(claims.user_id(), Some(42));
        assert_eq!(claims.member_type, MemberType::Primary);
        assert_eq!(claims.admin_roles, vec![AdminRole::SuperAdmin]);
        assert_eq!(claims.iss, "guildhall-test");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_roles_are_a_native_list() {
        let issuer = SessionIssuer::new(&test_config());
        let (token, _) = issuer
            .issue(&identity(vec![AdminRole::NewsAdmin, AdminRole::SuperAdmin]))
            .unwrap();

        let claims = issuer.decode(&token).unwrap();
        assert_eq!(
            claims.admin_roles,
            vec![AdminRole::SuperAdmin, AdminRole::NewsAdmin]
        );
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let issuer = SessionIssuer::new(&test_config());
        let mut claims = issuer.claims_for(&identity(vec![]));
        claims.iat -= 7200;
        claims.exp = claims.iat + 60;
        let token = issuer.sign(&claims).unwrap();

        assert!(matches!(issuer.decode(&token), Err(SessionError::Expired)));
    }

    #[test]
    fn test_foreign_secret_is_rejected() {
        let issuer = SessionIssuer::new(&test_config());
        let other = SessionIssuer::new(&SessionConfig {
            secret: "another-secret-another-secret-xx".into(),
            ..test_config()
        });
        let (token, _) = other.issue(&identity(vec![])).unwrap();

        assert!(matches!(issuer.decode(&token), Err(SessionError::Invalid(_))));
    }

    #[test]
    fn test_wrong_issuer_is_rejected() {
        let issuer = SessionIssuer::new(&test_config());
        let other = SessionIssuer::new(&SessionConfig {
            issuer: "someone-else".into(),
            ..test_config()
        });
        let (token, _) = other.issue(&identity(vec![])).unwrap();

        assert!(issuer.decode(&token).is_err());
    }

    #[test]
    fn test_garbage_is_rejected() {
        let issuer = SessionIssuer::new(&test_config());
        assert!(issuer.decode("not.a.jwt").is_err());
        assert!(issuer.decode("").is_err());
    }
}
