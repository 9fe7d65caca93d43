use std::sync::Arc;

use crate::auth::{PasswordHasher, SessionIssuer};
use crate::config::Config;
use crate::db::Store;
use crate::services::{AuthService, MemberService, SeaOrmAuthService, SeaOrmMemberService};

/// Long-lived collaborators shared by the HTTP layer and the CLI.
#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub store: Store,

    pub sessions: Arc<SessionIssuer>,

    pub auth_service: Arc<dyn AuthService>,

    pub member_service: Arc<dyn MemberService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        config.validate()?;

        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        Ok(Self::with_store(config, store))
    }

    #[must_use]
    pub fn with_store(config: Config, store: Store) -> Self {
        let sessions = Arc::new(SessionIssuer::new(&config.security.session));
        let hasher = PasswordHasher::new(&config.security);

        let auth_service = Arc::new(SeaOrmAuthService::new(
            store.clone(),
            hasher,
            sessions.clone(),
            config.security.min_password_length,
        )) as Arc<dyn AuthService + Send + Sync + 'static>;

        let member_service = Arc::new(SeaOrmMemberService::new(store.clone()))
            as Arc<dyn MemberService + Send + Sync + 'static>;

        Self {
            config: Arc::new(config),
            store,
            sessions,
            auth_service,
            member_service,
        }
    }
}
