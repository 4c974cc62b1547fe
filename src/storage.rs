use crate::errors::LoadError;
use crate::models::{PlayerRecord, TeamStatsRecord};
use serde::de::DeserializeOwned;
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::{fs, sync::Mutex};
use tracing::{info, warn};

pub const PLAYERS_FILE: &str = "jugadores.csv";
pub const TEAM_STATS_FILE: &str = "equipos_stats.csv";

#[derive(Debug, Clone, PartialEq)]
pub enum DataSource {
    File(PathBuf),
    Fallback { path: PathBuf, reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Loaded<T> {
    pub records: Vec<T>,
    pub source: DataSource,
}

impl<T> Loaded<T> {
    pub fn is_fallback(&self) -> bool {
        matches!(self.source, DataSource::Fallback { .. })
    }

    /// User-facing notice when sample data is being shown.
    pub fn warning(&self) -> Option<String> {
        match &self.source {
            DataSource::File(_) => None,
            DataSource::Fallback { path, reason } => Some(format!(
                "File '{}' could not be used ({reason}). Showing sample data.",
                path.display()
            )),
        }
    }
}

pub async fn load_players(path: &Path) -> Loaded<PlayerRecord> {
    load_or_fallback(path, fallback_players).await
}

pub async fn load_team_stats(path: &Path) -> Loaded<TeamStatsRecord> {
    load_or_fallback(path, fallback_team_stats).await
}

async fn load_or_fallback<T, F>(path: &Path, fallback: F) -> Loaded<T>
where
    T: DeserializeOwned,
    F: FnOnce() -> Vec<T>,
{
    match read_records(path).await {
        Ok(records) => {
            info!(path = %path.display(), rows = records.len(), "loaded data file");
            Loaded {
                records,
                source: DataSource::File(path.to_path_buf()),
            }
        }
        Err(err) => {
            warn!(path = %path.display(), "using fallback table: {err}");
            Loaded {
                records: fallback(),
                source: DataSource::Fallback {
                    path: path.to_path_buf(),
                    reason: err.to_string(),
                },
            }
        }
    }
}

pub async fn read_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, LoadError> {
    let bytes = fs::read(path).await.map_err(|err| {
        if err.kind() == std::io::ErrorKind::NotFound {
            LoadError::NotFound(path.to_path_buf())
        } else {
            LoadError::Io(err)
        }
    })?;
    parse_records(&bytes)
}

pub fn parse_records<T: DeserializeOwned>(bytes: &[u8]) -> Result<Vec<T>, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(bytes);
    reader
        .deserialize()
        .collect::<Result<Vec<T>, _>>()
        .map_err(LoadError::from)
}

/// Per-path memo of loader results. Files are treated as static, so entries never expire.
pub struct PathCache<T> {
    entries: Arc<Mutex<HashMap<PathBuf, Loaded<T>>>>,
}

impl<T> Clone for PathCache<T> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
        }
    }
}

impl<T> Default for PathCache<T> {
    fn default() -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl<T: Clone> PathCache<T> {
    pub async fn get_or_load<F, Fut>(&self, path: &Path, load: F) -> Loaded<T>
    where
        F: FnOnce(PathBuf) -> Fut,
        Fut: std::future::Future<Output = Loaded<T>>,
    {
        let mut entries = self.entries.lock().await;
        if let Some(hit) = entries.get(path) {
            return hit.clone();
        }
        let loaded = load(path.to_path_buf()).await;
        entries.insert(path.to_path_buf(), loaded.clone());
        loaded
    }
}

pub fn fallback_players() -> Vec<PlayerRecord> {
    let rows: [(&str, &str, i64, i64, i64, i64, f64); 5] = [
        ("Lionel Messi", "PSG", 36, 30, 20, 34, 35.0),
        ("Cristiano Ronaldo", "Al Nassr", 39, 35, 8, 32, 15.0),
        ("Kylian Mbappé", "PSG", 25, 29, 17, 36, 180.0),
        ("Erling Haaland", "Manchester City", 23, 36, 8, 35, 150.0),
        ("Vinicius Jr.", "Real Madrid", 23, 20, 16, 32, 100.0),
    ];
    rows.into_iter()
        .map(
            |(name, team, age, goals, assists, matches, market_value)| PlayerRecord {
                name: name.to_string(),
                team: team.to_string(),
                age,
                goals,
                assists,
                matches,
                market_value,
            },
        )
        .collect()
}

pub fn fallback_team_stats() -> Vec<TeamStatsRecord> {
    let rows: [(&str, i64, i64, i64, i64, i64, i64); 6] = [
        ("Real Madrid", 38, 28, 6, 4, 89, 32),
        ("FC Barcelona", 38, 24, 8, 6, 76, 38),
        ("Atlético Madrid", 38, 22, 10, 6, 65, 35),
        ("Manchester United", 38, 20, 8, 10, 72, 48),
        ("Liverpool", 38, 24, 8, 6, 84, 28),
        ("Bayern Munich", 34, 26, 6, 2, 92, 25),
    ];
    rows.into_iter()
        .map(
            |(team, played, wins, draws, losses, goals_for, goals_against)| TeamStatsRecord {
                team: team.to_string(),
                played,
                wins,
                draws,
                losses,
                goals_for,
                goals_against,
            },
        )
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{Table, Tabular};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn unique_path(name: &str) -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let mut path = std::env::temp_dir();
        path.push(format!("sports_dashboard_{}_{}_{name}", std::process::id(), nanos));
        path
    }

    #[tokio::test]
    async fn missing_file_falls_back_to_literal_players() {
        let path = unique_path("absent.csv");
        let loaded = load_players(&path).await;

        assert!(loaded.is_fallback());
        assert_eq!(loaded.records, fallback_players());
        assert!(loaded.warning().unwrap().contains("absent.csv"));
        let table = Table::from_records(&loaded.records);
        assert_eq!(table.columns, PlayerRecord::COLUMNS);
    }

    #[tokio::test]
    async fn malformed_file_falls_back_to_literal_stats() {
        let path = unique_path("broken.csv");
        fs::write(&path, "Equipo,Victorias\nReal Madrid,not-a-number\n")
            .await
            .unwrap();

        let loaded = load_team_stats(&path).await;
        assert!(loaded.is_fallback());
        assert_eq!(loaded.records, fallback_team_stats());

        let _ = fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn well_formed_file_is_returned_unmodified() {
        let path = unique_path("players.csv");
        fs::write(
            &path,
            "Nombre,Equipo,Edad,Goles,Asistencias,Partidos,Valor_Mercado\n\
             Pedri,FC Barcelona,21,8,10,30,80.5\n\
             Bellingham,Real Madrid,20,19,6,28,180\n",
        )
        .await
        .unwrap();

        let loaded = load_players(&path).await;
        assert!(!loaded.is_fallback());
        assert_eq!(loaded.warning(), None);
        assert_eq!(loaded.records.len(), 2);
        assert_eq!(loaded.records[0].name, "Pedri");
        assert_eq!(loaded.records[0].market_value, 80.5);
        assert_eq!(loaded.records[1].goals, 19);

        let _ = fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn padded_team_names_are_kept_verbatim() {
        let path = unique_path("padded.csv");
        fs::write(
            &path,
            "Equipo,Partidos_Jugados,Victorias,Empates,Derrotas,Goles_Favor,Goles_Contra\n\
             \x20Real Madrid ,38,29,8,1,87,26\n\
             FC Barcelona,38,26,7,5,79,44\n",
        )
        .await
        .unwrap();

        let loaded = load_team_stats(&path).await;
        assert!(!loaded.is_fallback());
        assert_eq!(loaded.records[0].team, " Real Madrid ");

        let view = crate::views::teams_view(crate::reference::fetch_all(), &loaded).unwrap();
        let names: Vec<String> = view
            .combined
            .column("nombre")
            .unwrap()
            .map(ToString::to_string)
            .collect();
        assert_eq!(names, ["FC Barcelona"]);

        let _ = fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn header_only_file_is_empty_not_fallback() {
        let path = unique_path("empty.csv");
        fs::write(
            &path,
            "Equipo,Partidos_Jugados,Victorias,Empates,Derrotas,Goles_Favor,Goles_Contra\n",
        )
        .await
        .unwrap();

        let loaded = load_team_stats(&path).await;
        assert!(!loaded.is_fallback());
        assert!(loaded.records.is_empty());

        let _ = fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn cache_loads_each_path_once() {
        let cache: PathCache<PlayerRecord> = PathCache::default();
        let path = unique_path("cached.csv");
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let loaded = cache
                .get_or_load(&path, |p| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async move { load_players(&p).await }
                })
                .await;
            assert!(loaded.is_fallback());
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
