//! Domain service for administrative member management.

use thiserror::Error;

use crate::models::{AdminRole, Member, MemberPage, MemberQuery, MemberType};

#[derive(Debug, Error)]
pub enum MemberError {
    #[error("Member not found: {0}")]
    NotFound(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for MemberError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for MemberError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[async_trait::async_trait]
pub trait MemberService: Send + Sync {
    /// Lists members matching the query, password hashes excluded.
    async fn list_members(&self, query: MemberQuery) -> Result<MemberPage, MemberError>;

    async fn get_member(&self, id: i32) -> Result<Member, MemberError>;

    /// Moves a member to another tier. Setting the current tier again is a
    /// no-op that still succeeds.
    async fn change_member_type(
        &self,
        id: i32,
        member_type: MemberType,
    ) -> Result<Member, MemberError>;

    async fn change_member_type_by_email(
        &self,
        email: &str,
        member_type: MemberType,
    ) -> Result<Member, MemberError>;

    async fn grant_role(&self, email: &str, role: AdminRole) -> Result<Member, MemberError>;

    async fn revoke_role(&self, email: &str, role: AdminRole) -> Result<Member, MemberError>;
}
