//! Domain service for authentication and self-service account management.
//!
//! Handles sign-up, credential verification, session issuance, password
//! changes and profile edits.

use serde::Serialize;
use thiserror::Error;

use crate::auth::{SessionClaims, SessionError, VerifiedIdentity};
use crate::models::{Member, MemberType, ProfileChanges};

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Correct password for an account that has not been approved yet.
    #[error("Account pending approval")]
    PendingApproval,

    #[error("User not found")]
    UserNotFound,

    #[error("An account with this email already exists")]
    EmailTaken,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Sign-up input after request-shape validation.
#[derive(Debug, Clone)]
pub struct SignUp {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
    pub blood_group: Option<String>,
    pub address: Option<String>,
    pub biography: Option<String>,
}

/// A freshly issued session.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInResult {
    pub token: String,
    pub claims: SessionClaims,
    pub identity: VerifiedIdentity,
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Creates a pending member.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Validation`] for password policy violations and
    /// [`AuthError::EmailTaken`] if the email is already registered.
    async fn sign_up(&self, input: SignUp) -> Result<Member, AuthError>;

    /// Checks an email/password pair.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] when the email is unknown,
    /// the password does not match, or the account is still pending.
    async fn verify_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<VerifiedIdentity, AuthError>;

    /// Verifies credentials and issues a signed session.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::PendingApproval`] only when the password matched;
    /// every other credential failure is [`AuthError::InvalidCredentials`].
    async fn sign_in(&self, email: &str, password: &str) -> Result<SignInResult, AuthError>;

    /// Reports the member type behind a credential pair. The password must
    /// match, so the answer never reveals whether an email is registered.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::UserNotFound`] for unknown emails and wrong
    /// passwords alike.
    async fn member_type_for(
        &self,
        email: &str,
        password: &str,
    ) -> Result<MemberType, AuthError>;

    /// Changes a member's password.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Validation`] if the current password is incorrect
    /// or the new password violates policy.
    async fn change_password(
        &self,
        user_id: i32,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError>;

    async fn get_profile(&self, user_id: i32) -> Result<Member, AuthError>;

    async fn update_profile(
        &self,
        user_id: i32,
        changes: ProfileChanges,
    ) -> Result<Member, AuthError>;
}
