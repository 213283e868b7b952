//! Service wiring: which store, which hasher, which session issuer.

use std::sync::Arc;

use anyhow::Context as _;

use hcm_auth::{Argon2PasswordHasher, Hs256JwtSessions, PasswordHasher};
use hcm_directory::{DirectoryService, DirectoryStore};
use hcm_infra::{InMemoryDirectoryStore, PostgresDirectoryStore};

use crate::config::ApiConfig;

pub type Directory = DirectoryService<Arc<dyn DirectoryStore>>;

/// Everything the handlers need, shared behind one `Arc`.
pub struct AppServices {
    pub directory: Directory,
    pub sessions: Arc<Hs256JwtSessions>,
}

impl AppServices {
    pub fn new(
        store: Arc<dyn DirectoryStore>,
        hasher: Arc<dyn PasswordHasher>,
        sessions: Hs256JwtSessions,
    ) -> Self {
        Self {
            directory: DirectoryService::new(store, hasher),
            sessions: Arc::new(sessions),
        }
    }
}

pub async fn build_services(config: ApiConfig) -> anyhow::Result<AppServices> {
    let store: Arc<dyn DirectoryStore> = match &config.database_url {
        Some(url) => {
            let store = PostgresDirectoryStore::connect(url)
                .await
                .context("failed to connect to Postgres")?;
            tracing::info!("using Postgres directory store");
            Arc::new(store)
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory directory store");
            Arc::new(InMemoryDirectoryStore::new())
        }
    };

    let sessions = Hs256JwtSessions::new(config.jwt_secret.as_bytes(), config.session_ttl);
    let services = AppServices::new(store, Arc::new(Argon2PasswordHasher::new()), sessions);

    if let Some(admin) = config.bootstrap_admin {
        let seeded = services
            .directory
            .bootstrap_admin(admin.into_new_employee())
            .await
            .context("failed to bootstrap administrator")?;
        if let Some(employee) = seeded {
            tracing::info!(
                employee_id = %employee.id,
                email = %employee.email,
                "seeded bootstrap administrator"
            );
        }
    }

    Ok(services)
}
