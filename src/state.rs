use crate::auth::SessionStore;
use crate::config::Config;
use crate::models::{PlayerRecord, TeamStatsRecord};
use crate::storage::{load_players, load_team_stats, Loaded, PathCache};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub sessions: SessionStore,
    players: PathCache<PlayerRecord>,
    team_stats: PathCache<TeamStatsRecord>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
            sessions: SessionStore::default(),
            players: PathCache::default(),
            team_stats: PathCache::default(),
        }
    }

    pub async fn players(&self) -> Loaded<PlayerRecord> {
        self.players
            .get_or_load(&self.config.players_path(), |path| async move {
                load_players(&path).await
            })
            .await
    }

    pub async fn team_stats(&self) -> Loaded<TeamStatsRecord> {
        self.team_stats
            .get_or_load(&self.config.team_stats_path(), |path| async move {
                load_team_stats(&path).await
            })
            .await
    }
}
