use std::sync::Arc;

use sqlx::PgPool;

use crate::{
    auth::{jwt::JwtKeys, repo::UserRepo},
    config::AppConfig,
    db::PgStore,
    files::{intents::IntentLog, FileGateway},
    portfolio::{
        repo::Repository,
        repo_types::{Certificate, Education, Project, WorkExperience},
    },
    storage::{Storage, StorageClient},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub jwt: JwtKeys,
    pub files: FileGateway,
    pub users: Arc<dyn UserRepo>,
    pub intents: Arc<dyn IntentLog>,
    pub work_experiences: Arc<dyn Repository<WorkExperience>>,
    pub certificates: Arc<dyn Repository<Certificate>>,
    pub educations: Arc<dyn Repository<Education>>,
    pub projects: Arc<dyn Repository<Project>>,
}

/// Persistence backends, one per concern.
pub struct Stores {
    pub users: Arc<dyn UserRepo>,
    pub intents: Arc<dyn IntentLog>,
    pub work_experiences: Arc<dyn Repository<WorkExperience>>,
    pub certificates: Arc<dyn Repository<Certificate>>,
    pub educations: Arc<dyn Repository<Education>>,
    pub projects: Arc<dyn Repository<Project>>,
}

impl Stores {
    pub fn postgres(pool: PgPool) -> Self {
        let pg = Arc::new(PgStore::new(pool));
        Self {
            users: pg.clone(),
            intents: pg.clone(),
            work_experiences: pg.clone(),
            certificates: pg.clone(),
            educations: pg.clone(),
            projects: pg,
        }
    }
}

impl AppState {
    pub async fn init(config: AppConfig, pool: PgPool) -> anyhow::Result<Self> {
        let storage = Arc::new(Storage::new(&config.storage).await?) as Arc<dyn StorageClient>;
        Ok(Self::from_parts(
            Arc::new(config),
            storage,
            Stores::postgres(pool),
        ))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        storage: Arc<dyn StorageClient>,
        stores: Stores,
    ) -> Self {
        Self {
            jwt: JwtKeys::new(&config.jwt),
            files: FileGateway::new(storage, &config.storage),
            users: stores.users,
            intents: stores.intents,
            work_experiences: stores.work_experiences,
            certificates: stores.certificates,
            educations: stores.educations,
            projects: stores.projects,
            config,
        }
    }
}
