use std::{env, path::PathBuf};

use crate::storage::{PLAYERS_FILE, TEAM_STATS_FILE};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DATA_DIR: &str = "data";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    pub data_dir: PathBuf,
}

impl Config {
    /// Reads `PORT` and `DASHBOARD_DATA_DIR`; unset or unparsable values use the defaults.
    pub fn from_env() -> Self {
        Self::from_vars(env::var("PORT").ok(), env::var("DASHBOARD_DATA_DIR").ok())
    }

    fn from_vars(port: Option<String>, data_dir: Option<String>) -> Self {
        let port = port
            .and_then(|value| value.trim().parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);
        let data_dir = data_dir
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));

        Self { port, data_dir }
    }

    pub fn players_path(&self) -> PathBuf {
        self.data_dir.join(PLAYERS_FILE)
    }

    pub fn team_stats_path(&self) -> PathBuf {
        self.data_dir.join(TEAM_STATS_FILE)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_vars(None, None)
    }
}
