use std::sync::Arc;

use crate::{
    config::Config, realtime::RealtimeHub, repository::SocialRepository, responder::Responder,
    seeder, session::SessionStore, store::EntityStore,
};

#[derive(Clone)]
pub struct AppState {
    pub repository: SocialRepository,
    pub realtime: Arc<RealtimeHub>,
    pub responder: Responder,
    pub sessions: Arc<SessionStore>,
    pub config: Config,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        // Initialize the in-memory store, re-seeded on every boot
        let store = Arc::new(EntityStore::new());
        if config.seed.enabled {
            seeder::seed_store(&store).await;
        }

        let repository = SocialRepository::new(store);
        let responder =
            Responder::from_api_key(config.openai.api_key.clone(), config.openai.model.clone());

        Ok(Self {
            repository,
            realtime: Arc::new(RealtimeHub::new()),
            responder,
            sessions: Arc::new(SessionStore::new()),
            config,
        })
    }
}
