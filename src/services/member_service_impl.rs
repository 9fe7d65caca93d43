//! `SeaORM` implementation of the `MemberService` trait.

use async_trait::async_trait;
use tracing::info;

use crate::db::Store;
use crate::models::{AdminRole, Member, MemberPage, MemberQuery, MemberType};
use crate::services::member_service::{MemberError, MemberService};

pub const MAX_PAGE_SIZE: u64 = 100;

pub struct SeaOrmMemberService {
    store: Store,
}

impl SeaOrmMemberService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    async fn member_by_email(&self, email: &str) -> Result<Member, MemberError> {
        self.store
            .get_user_by_email(email)
            .await?
            .ok_or_else(|| MemberError::NotFound(email.to_string()))
    }

    async fn write_roles(&self, member: &Member, roles: &[AdminRole]) -> Result<Member, MemberError> {
        self.store
            .set_user_admin_roles(member.id, roles)
            .await?
            .ok_or_else(|| MemberError::NotFound(member.id.to_string()))
    }
}

#[async_trait]
impl MemberService for SeaOrmMemberService {
    async fn list_members(&self, query: MemberQuery) -> Result<MemberPage, MemberError> {
        if query.page == 0 {
            return Err(MemberError::Validation("Page must be at least 1".to_string()));
        }
        if !(1..=MAX_PAGE_SIZE).contains(&query.page_size) {
            return Err(MemberError::Validation(format!(
                "Page size must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }

        let (members, total_pages, total) = self.store.list_users(&query).await?;

        Ok(MemberPage {
            members,
            page: query.page,
            page_size: query.page_size,
            total_pages,
            total,
        })
    }

    async fn get_member(&self, id: i32) -> Result<Member, MemberError> {
        self.store
            .get_user(id)
            .await?
            .ok_or_else(|| MemberError::NotFound(id.to_string()))
    }

    async fn change_member_type(
        &self,
        id: i32,
        member_type: MemberType,
    ) -> Result<Member, MemberError> {
        let current = self.get_member(id).await?;
        if current.member_type == member_type {
            return Ok(current);
        }

        let member = self
            .store
            .set_user_member_type(id, member_type)
            .await?
            .ok_or_else(|| MemberError::NotFound(id.to_string()))?;

        info!(user_id = id, member_type = %member_type, "Member type changed");
        Ok(member)
    }

    async fn change_member_type_by_email(
        &self,
        email: &str,
        member_type: MemberType,
    ) -> Result<Member, MemberError> {
        let member = self.member_by_email(email).await?;
        self.change_member_type(member.id, member_type).await
    }

    async fn grant_role(&self, email: &str, role: AdminRole) -> Result<Member, MemberError> {
        let member = self.member_by_email(email).await?;
        if member.admin_roles.contains(&role) {
            return Ok(member);
        }

        let mut roles = member.admin_roles.clone();
        roles.push(role);
        let member = self.write_roles(&member, &roles).await?;

        info!(user_id = member.id, %role, "Admin role granted");
        Ok(member)
    }

    async fn revoke_role(&self, email: &str, role: AdminRole) -> Result<Member, MemberError> {
        let member = self.member_by_email(email).await?;
        if !member.admin_roles.contains(&role) {
            return Ok(member);
        }

        let roles: Vec<AdminRole> = member
            .admin_roles
            .iter()
            .copied()
            .filter(|r| *r != role)
            .collect();
        let member = self.write_roles(&member, &roles).await?;

        info!(user_id = member.id, %role, "Admin role revoked");
        Ok(member)
    }
}
