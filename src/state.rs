use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::repository::postgres::PgRepository;
use crate::repository::{
    EventRepository, OrganizerRequestRepository, SessionRepository, UserRepository,
};

/// Shared handler state: the config plus one handle per repository seam.
/// In production all four point at the same `PgRepository`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub events: Arc<dyn EventRepository>,
    pub users: Arc<dyn UserRepository>,
    pub sessions: Arc<dyn SessionRepository>,
    pub requests: Arc<dyn OrganizerRequestRepository>,
}

impl AppState {
    pub fn new(pool: PgPool, config: Config) -> Self {
        let repository = Arc::new(PgRepository::new(pool));
        Self {
            config: Arc::new(config),
            events: repository.clone(),
            users: repository.clone(),
            sessions: repository.clone(),
            requests: repository,
        }
    }

    pub fn from_parts(
        config: Config,
        events: Arc<dyn EventRepository>,
        users: Arc<dyn UserRepository>,
        sessions: Arc<dyn SessionRepository>,
        requests: Arc<dyn OrganizerRequestRepository>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            events,
            users,
            sessions,
            requests,
        }
    }
}
