//! `SeaORM` implementation of the `AuthService` trait.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use tokio::sync::OnceCell;

use crate::auth::{PasswordHasher, SessionIssuer, VerifiedIdentity};
use crate::db::Store;
use crate::models::{Member, MemberType, NewMember, ProfileChanges};
use crate::services::auth_service::{AuthError, AuthService, SignInResult, SignUp};

/// Hashed once per service with the configured parameters; compared against
/// when an email is unknown.
const DUMMY_PASSWORD: &str = "guildhall-unknown-account";

pub struct SeaOrmAuthService {
    store: Store,
    hasher: PasswordHasher,
    sessions: Arc<SessionIssuer>,
    min_password_length: usize,
    dummy_hash: OnceCell<String>,
}

impl SeaOrmAuthService {
    #[must_use]
    pub fn new(
        store: Store,
        hasher: PasswordHasher,
        sessions: Arc<SessionIssuer>,
        min_password_length: usize,
    ) -> Self {
        Self {
            store,
            hasher,
            sessions,
            min_password_length,
            dummy_hash: OnceCell::new(),
        }
    }

    fn check_password_policy(&self, password: &str) -> Result<(), AuthError> {
        if password.chars().count() < self.min_password_length {
            return Err(AuthError::Validation(format!(
                "Password must be at least {} characters",
                self.min_password_length
            )));
        }
        Ok(())
    }

    /// Looks up a member and checks the password, ignoring member type.
    ///
    /// Runs exactly one Argon2 verification whether or not the email exists.
    async fn check_password(&self, email: &str, password: &str) -> Result<Option<Member>, AuthError> {
        let Some((member, password_hash)) = self.store.get_user_credentials(email).await? else {
            let dummy_hash = self
                .dummy_hash
                .get_or_try_init(|| self.hasher.hash(DUMMY_PASSWORD))
                .await?;
            self.hasher.verify(password, dummy_hash).await?;
            return Ok(None);
        };

        if self.hasher.verify(password, &password_hash).await? {
            Ok(Some(member))
        } else {
            Ok(None)
        }
    }

    /// Like [`AuthService::verify_credentials`], but reports
    /// [`AuthError::PendingApproval`] once the password has been confirmed.
    async fn authenticate(&self, email: &str, password: &str) -> Result<VerifiedIdentity, AuthError> {
        let member = self
            .check_password(email, password)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if member.member_type.is_pending() {
            return Err(AuthError::PendingApproval);
        }

        Ok(VerifiedIdentity {
            id: member.id,
            name: member.name,
            email: member.email,
            member_type: member.member_type,
            admin_roles: member.admin_roles,
        })
    }

    #[cfg(test)]
    fn dummy_hash_ready(&self) -> bool {
        self.dummy_hash.initialized()
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn sign_up(&self, input: SignUp) -> Result<Member, AuthError> {
        self.check_password_policy(&input.password)?;

        if self.store.get_user_by_email(&input.email).await?.is_some() {
            return Err(AuthError::EmailTaken);
        }

        let password_hash = self.hasher.hash(&input.password).await?;

        let member = self
            .store
            .create_user(NewMember {
                name: input.name,
                email: input.email,
                password_hash,
                phone: input.phone,
                blood_group: input.blood_group,
                address: input.address,
                biography: input.biography,
            })
            .await?
            .ok_or(AuthError::EmailTaken)?;

        info!(user_id = member.id, "Member signed up, awaiting approval");
        Ok(member)
    }

    async fn verify_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<VerifiedIdentity, AuthError> {
        self.authenticate(email, password)
            .await
            .map_err(|e| match e {
                AuthError::PendingApproval => AuthError::InvalidCredentials,
                other => other,
            })
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<SignInResult, AuthError> {
        let identity = self.authenticate(email, password).await?;
        let (token, claims) = self.sessions.issue(&identity)?;

        info!(user_id = identity.id, member_type = %identity.member_type, "Session issued");

        Ok(SignInResult {
            token,
            claims,
            identity,
        })
    }

    async fn member_type_for(
        &self,
        email: &str,
        password: &str,
    ) -> Result<MemberType, AuthError> {
        self.check_password(email, password)
            .await?
            .map(|m| m.member_type)
            .ok_or(AuthError::UserNotFound)
    }

    async fn change_password(
        &self,
        user_id: i32,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        self.check_password_policy(new_password)?;

        if current_password == new_password {
            return Err(AuthError::Validation(
                "New password must be different from current password".to_string(),
            ));
        }

        let password_hash = self
            .store
            .get_user_password_hash(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if !self.hasher.verify(current_password, &password_hash).await? {
            warn!(user_id, "Password change rejected: current password mismatch");
            return Err(AuthError::Validation(
                "Current password is incorrect".to_string(),
            ));
        }

        let new_hash = self.hasher.hash(new_password).await?;

        if !self.store.update_user_password_hash(user_id, new_hash).await? {
            return Err(AuthError::UserNotFound);
        }

        info!(user_id, "Password changed");
        Ok(())
    }

    async fn get_profile(&self, user_id: i32) -> Result<Member, AuthError> {
        self.store
            .get_user(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    async fn update_profile(
        &self,
        user_id: i32,
        changes: ProfileChanges,
    ) -> Result<Member, AuthError> {
        if changes.is_empty() {
            return self.get_profile(user_id).await;
        }

        self.store
            .update_user_profile(user_id, &changes)
            .await?
            .ok_or(AuthError::UserNotFound)
    }
}
