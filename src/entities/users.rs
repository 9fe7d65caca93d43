use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub name: String,

    /// Stored lower-cased.
    #[sea_orm(unique)]
    pub email: String,

    /// Argon2id password hash
    pub password_hash: String,

    /// One of pending, primary, full, permanent, executive.
    pub member_type: String,

    /// JSON array of admin role tags.
    pub admin_roles: Json,

    pub phone: Option<String>,

    pub blood_group: Option<String>,

    pub address: Option<String>,

    pub biography: Option<String>,

    pub profile_image: Option<String>,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
