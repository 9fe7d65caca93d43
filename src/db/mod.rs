use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::models::{AdminRole, Member, MemberQuery, MemberType, NewMember, ProfileChanges};

pub mod migrator;
pub mod repositories;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        let in_memory = db_url.contains(":memory:");

        // Every pooled connection to an in-memory database sees its own empty schema.
        let (max_connections, min_connections) = if in_memory {
            (1, 1)
        } else {
            (max_connections, min_connections)
        };

        if !in_memory {
            let path_str = db_url.trim_start_matches("sqlite:").trim_start_matches("//");
            let path_str = path_str.split('?').next().unwrap_or(path_str);
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<Member>> {
        self.user_repo().get_by_email(email).await
    }

    pub async fn get_user_credentials(&self, email: &str) -> Result<Option<(Member, String)>> {
        self.user_repo().get_credentials_by_email(email).await
    }

    pub async fn get_user(&self, id: i32) -> Result<Option<Member>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn get_user_password_hash(&self, id: i32) -> Result<Option<String>> {
        self.user_repo().get_password_hash(id).await
    }

    pub async fn create_user(&self, new: NewMember) -> Result<Option<Member>> {
        self.user_repo().create(new).await
    }

    pub async fn update_user_profile(
        &self,
        id: i32,
        changes: &ProfileChanges,
    ) -> Result<Option<Member>> {
        self.user_repo().update_profile(id, changes).await
    }

    pub async fn update_user_password_hash(&self, id: i32, password_hash: String) -> Result<bool> {
        self.user_repo().update_password_hash(id, password_hash).await
    }

    pub async fn set_user_member_type(
        &self,
        id: i32,
        member_type: MemberType,
    ) -> Result<Option<Member>> {
        self.user_repo().set_member_type(id, member_type).await
    }

    pub async fn set_user_admin_roles(
        &self,
        id: i32,
        roles: &[AdminRole],
    ) -> Result<Option<Member>> {
        self.user_repo().set_admin_roles(id, roles).await
    }

    pub async fn list_users(&self, query: &MemberQuery) -> Result<(Vec<Member>, u64, u64)> {
        self.user_repo().list(query).await
    }
}
