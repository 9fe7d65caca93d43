use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, SqlErr,
};
use tracing::warn;

use crate::entities::users;
use crate::models::member::normalize_email;
use crate::models::{AdminRole, Member, MemberQuery, MemberType, NewMember, ProfileChanges};

impl TryFrom<users::Model> for Member {
    type Error = anyhow::Error;

    fn try_from(model: users::Model) -> Result<Self> {
        let member_type = model
            .member_type
            .parse::<MemberType>()
            .map_err(|e| anyhow::anyhow!("User {}: {e}", model.id))?;

        Ok(Self {
            id: model.id,
            admin_roles: parse_admin_roles(model.id, &model.admin_roles),
            name: model.name,
            email: model.email,
            member_type,
            phone: model.phone,
            blood_group: model.blood_group,
            address: model.address,
            biography: model.biography,
            profile_image: model.profile_image,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

fn parse_admin_roles(user_id: i32, value: &serde_json::Value) -> Vec<AdminRole> {
    let Some(items) = value.as_array() else {
        warn!(user_id, "admin_roles is not a JSON array, treating as empty");
        return Vec::new();
    };

    let mut roles: Vec<AdminRole> = items
        .iter()
        .filter_map(|item| {
            let parsed = item.as_str().map(str::parse::<AdminRole>);
            match parsed {
                Some(Ok(role)) => Some(role),
                _ => {
                    warn!(user_id, role = %item, "Ignoring unknown admin role");
                    None
                }
            }
        })
        .collect();
    roles.sort();
    roles.dedup();
    roles
}

fn admin_roles_json(roles: &[AdminRole]) -> serde_json::Value {
    let mut roles = roles.to_vec();
    roles.sort();
    roles.dedup();
    serde_json::Value::Array(
        roles
            .into_iter()
            .map(|r| serde_json::Value::String(r.as_str().to_string()))
            .collect(),
    )
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    async fn find_model_by_email(&self, email: &str) -> Result<Option<users::Model>> {
        users::Entity::find()
            .filter(users::Column::Email.eq(normalize_email(email)))
            .one(&self.conn)
            .await
            .context("Failed to query user by email")
    }

    /// Get user by email (case-insensitive)
    pub async fn get_by_email(&self, email: &str) -> Result<Option<Member>> {
        self.find_model_by_email(email)
            .await?
            .map(Member::try_from)
            .transpose()
    }

    /// Get user by email together with the password hash (credential checks only)
    pub async fn get_credentials_by_email(&self, email: &str) -> Result<Option<(Member, String)>> {
        let Some(user) = self.find_model_by_email(email).await? else {
            return Ok(None);
        };

        let password_hash = user.password_hash.clone();
        Ok(Some((Member::try_from(user)?, password_hash)))
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i32) -> Result<Option<Member>> {
        users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user by ID")?
            .map(Member::try_from)
            .transpose()
    }

    /// Explicit re-fetch of the password hash used by password changes
    pub async fn get_password_hash(&self, id: i32) -> Result<Option<String>> {
        let user = users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user for password hash")?;

        Ok(user.map(|u| u.password_hash))
    }

    /// Insert a new pending member. Returns `None` if the email is taken.
    pub async fn create(&self, new: NewMember) -> Result<Option<Member>> {
        let now = chrono::Utc::now().to_rfc3339();

        let active = users::ActiveModel {
            name: Set(new.name),
            email: Set(normalize_email(&new.email)),
            password_hash: Set(new.password_hash),
            member_type: Set(MemberType::Pending.as_str().to_string()),
            admin_roles: Set(admin_roles_json(&[])),
            phone: Set(new.phone),
            blood_group: Set(new.blood_group),
            address: Set(new.address),
            biography: Set(new.biography),
            profile_image: Set(None),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        match active.insert(&self.conn).await {
            Ok(model) => Ok(Some(Member::try_from(model)?)),
            Err(e) if is_unique_violation(&e) => Ok(None),
            Err(e) => Err(e).context("Failed to insert user"),
        }
    }

    /// Apply profile changes. Returns `None` if the user does not exist.
    pub async fn update_profile(&self, id: i32, changes: &ProfileChanges) -> Result<Option<Member>> {
        let Some(user) = users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user for profile update")?
        else {
            return Ok(None);
        };

        let mut active: users::ActiveModel = user.into();
        if let Some(name) = &changes.name {
            active.name = Set(name.clone());
        }
        if let Some(phone) = &changes.phone {
            active.phone = Set(phone.clone());
        }
        if let Some(blood_group) = &changes.blood_group {
            active.blood_group = Set(blood_group.clone());
        }
        if let Some(address) = &changes.address {
            active.address = Set(address.clone());
        }
        if let Some(biography) = &changes.biography {
            active.biography = Set(biography.clone());
        }
        if let Some(profile_image) = &changes.profile_image {
            active.profile_image = Set(profile_image.clone());
        }
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let model = active.update(&self.conn).await?;
        Ok(Some(Member::try_from(model)?))
    }

    /// Replace the stored password hash. Returns `false` if the user does not exist.
    pub async fn update_password_hash(&self, id: i32, password_hash: String) -> Result<bool> {
        let Some(user) = users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user for password update")?
        else {
            return Ok(false);
        };

        let mut active: users::ActiveModel = user.into();
        active.password_hash = Set(password_hash);
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active.update(&self.conn).await?;

        Ok(true)
    }

    /// Only a real transition touches `updated_at`.
    pub async fn set_member_type(&self, id: i32, member_type: MemberType) -> Result<Option<Member>> {
        let Some(user) = users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user for member type update")?
        else {
            return Ok(None);
        };

        if user.member_type == member_type.as_str() {
            return Ok(Some(Member::try_from(user)?));
        }

        let mut active: users::ActiveModel = user.into();
        active.member_type = Set(member_type.as_str().to_string());
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let model = active.update(&self.conn).await?;
        Ok(Some(Member::try_from(model)?))
    }

    pub async fn set_admin_roles(&self, id: i32, roles: &[AdminRole]) -> Result<Option<Member>> {
        let Some(user) = users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user for admin role update")?
        else {
            return Ok(None);
        };

        let admin_roles = admin_roles_json(roles);
        if admin_roles_json(&parse_admin_roles(user.id, &user.admin_roles)) == admin_roles {
            return Ok(Some(Member::try_from(user)?));
        }

        let mut active: users::ActiveModel = user.into();
        active.admin_roles = Set(admin_roles);
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let model = active.update(&self.conn).await?;
        Ok(Some(Member::try_from(model)?))
    }

    /// Page through members, newest first. Returns `(members, total_pages, total)`.
    pub async fn list(&self, query: &MemberQuery) -> Result<(Vec<Member>, u64, u64)> {
        let mut select = users::Entity::find().order_by_desc(users::Column::Id);

        if let Some(member_type) = query.member_type {
            select = select.filter(users::Column::MemberType.eq(member_type.as_str()));
        }

        if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            select = select.filter(
                Condition::any()
                    .add(users::Column::Name.contains(search))
                    .add(users::Column::Email.contains(search.to_lowercase())),
            );
        }

        let paginator = select.paginate(&self.conn, query.page_size.max(1));
        let totals = paginator
            .num_items_and_pages()
            .await
            .context("Failed to count users")?;
        let models = paginator
            .fetch_page(query.page.saturating_sub(1))
            .await
            .context("Failed to list users")?;

        let members = models
            .into_iter()
            .map(Member::try_from)
            .collect::<Result<Vec<_>>>()?;

        Ok((members, totals.number_of_pages, totals.number_of_items))
    }
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}
