use crate::aggregate::{inner_join, mean, round1, sum, top_n, value_counts};
use crate::chart::{build_chart, Chart, ChartKind, ChartRequest};
use crate::models::{PlayerRecord, TeamRecord, TeamStatsRecord};
use crate::storage::Loaded;
use crate::table::{Table, TableError, Value};
use serde::{Deserialize, Serialize};

pub const TOP_SCORERS: usize = 5;

const TEAM_DISPLAY_COLUMNS: [&str; 9] = [
    "nombre",
    "liga",
    "estadio",
    "Partidos_Jugados",
    "Victorias",
    "Empates",
    "Derrotas",
    "Goles_Favor",
    "Goles_Contra",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Page {
    #[default]
    Players,
    Teams,
}

impl Page {
    pub const ALL: [Page; 2] = [Page::Players, Page::Teams];

    pub fn from_slug(slug: &str) -> Option<Page> {
        Page::ALL.into_iter().find(|page| page.slug() == slug)
    }

    pub fn slug(self) -> &'static str {
        match self {
            Page::Players => "players",
            Page::Teams => "teams",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Page::Players => "Players analysis",
            Page::Teams => "Teams analysis",
        }
    }
}

/// Charts that can be downloaded as PDF, keyed by their file stem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChartExport {
    #[serde(rename = "top_goleadores")]
    TopScorers,
    #[serde(rename = "rendimiento_equipos")]
    TeamPerformance,
    #[serde(rename = "distribucion_ligas")]
    LeagueDistribution,
}

impl ChartExport {
    pub fn file_stem(self) -> &'static str {
        match self {
            ChartExport::TopScorers => "top_goleadores",
            ChartExport::TeamPerformance => "rendimiento_equipos",
            ChartExport::LeagueDistribution => "distribucion_ligas",
        }
    }

    pub fn page(self) -> Page {
        match self {
            ChartExport::TopScorers => Page::Players,
            ChartExport::TeamPerformance | ChartExport::LeagueDistribution => Page::Teams,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TableExport {
    #[serde(rename = "jugadores")]
    Players,
    #[serde(rename = "equipos")]
    Teams,
}

impl TableExport {
    pub fn file_stem(self) -> &'static str {
        match self {
            TableExport::Players => "jugadores",
            TableExport::Teams => "equipos",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerMetrics {
    pub total_goals: Value,
    pub total_assists: Value,
    pub average_age: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayersView {
    pub warning: Option<String>,
    pub top_scorers: Table,
    pub top_scorers_chart: Chart,
    pub metrics: PlayerMetrics,
    pub players: Table,
}

#[derive(Debug, Clone, Serialize)]
pub struct TeamsView {
    pub warning: Option<String>,
    pub performance_chart: Chart,
    pub league_chart: Chart,
    pub league_counts: Vec<(String, usize)>,
    pub combined: Table,
}

pub fn players_view(loaded: &Loaded<PlayerRecord>) -> Result<PlayersView, TableError> {
    let players = Table::from_records(&loaded.records);
    let top_scorers = top_n(&players, "Goles", TOP_SCORERS)?;
    let top_scorers_chart = build_chart(
        &top_scorers,
        &ChartRequest::new(ChartKind::Bar, "Top 5 Goleadores", "Nombre", "Goles").color("Goles"),
    )?;

    let metrics = PlayerMetrics {
        total_goals: sum(&players, "Goles")?,
        total_assists: sum(&players, "Asistencias")?,
        average_age: mean(&players, "Edad")?.map(round1),
    };

    Ok(PlayersView {
        warning: loaded.warning(),
        top_scorers,
        top_scorers_chart,
        metrics,
        players,
    })
}

pub fn teams_view(
    teams: &[TeamRecord],
    stats: &Loaded<TeamStatsRecord>,
) -> Result<TeamsView, TableError> {
    let teams = Table::from_records(teams);
    let stats_table = Table::from_records(&stats.records);
    let joined = inner_join(&teams, &stats_table, "nombre", "Equipo")?;

    let performance_chart = build_chart(
        &joined,
        &ChartRequest::new(
            ChartKind::Scatter,
            "Rendimiento Ofensivo vs Defensivo",
            "Goles_Contra",
            "Goles_Favor",
        )
        .size("Victorias")
        .color("liga")
        .hover("nombre"),
    )?;

    let league_counts = value_counts(&teams, "liga")?;
    let counts_table = Table::new(
        vec!["liga".to_string(), "equipos".to_string()],
        league_counts
            .iter()
            .map(|(league, count)| vec![Value::Text(league.clone()), Value::Int(*count as i64)])
            .collect(),
    );
    let league_chart = build_chart(
        &counts_table,
        &ChartRequest::new(ChartKind::Pie, "Equipos por Liga", "liga", "equipos"),
    )?;

    Ok(TeamsView {
        warning: stats.warning(),
        performance_chart,
        league_chart,
        league_counts,
        combined: joined.select(&TEAM_DISPLAY_COLUMNS)?,
    })
}

impl PlayersView {
    pub fn chart(&self, export: ChartExport) -> Option<&Chart> {
        match export {
            ChartExport::TopScorers => Some(&self.top_scorers_chart),
            _ => None,
        }
    }
}

impl TeamsView {
    pub fn chart(&self, export: ChartExport) -> Option<&Chart> {
        match export {
            ChartExport::TeamPerformance => Some(&self.performance_chart),
            ChartExport::LeagueDistribution => Some(&self.league_chart),
            ChartExport::TopScorers => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference;
    use crate::storage::{fallback_players, fallback_team_stats, DataSource};
    use std::path::PathBuf;

    fn fallback<T>(records: Vec<T>) -> Loaded<T> {
        Loaded {
            records,
            source: DataSource::Fallback {
                path: PathBuf::from("data/missing.csv"),
                reason: "file data/missing.csv not found".into(),
            },
        }
    }

    #[test]
    fn players_view_on_fallback_data() {
        let view = players_view(&fallback(fallback_players())).unwrap();

        assert!(view.warning.is_some());
        assert_eq!(view.metrics.total_goals, Value::Int(150));
        assert_eq!(view.metrics.total_assists, Value::Int(69));
        assert_eq!(view.metrics.average_age, Some(29.2));

        let labels: Vec<&str> = view
            .top_scorers_chart
            .points
            .iter()
            .map(|p| p.label.as_str())
            .collect();
        assert_eq!(
            labels,
            [
                "Erling Haaland",
                "Cristiano Ronaldo",
                "Lionel Messi",
                "Kylian Mbappé",
                "Vinicius Jr."
            ]
        );
        let goals: Vec<f64> = view.top_scorers_chart.points.iter().map(|p| p.y).collect();
        assert_eq!(goals, [36.0, 35.0, 30.0, 29.0, 20.0]);
        assert_eq!(view.players.len(), 5);
    }

    #[test]
    fn players_view_with_no_rows() {
        let loaded = Loaded {
            records: Vec::<PlayerRecord>::new(),
            source: DataSource::File(PathBuf::from("data/jugadores.csv")),
        };
        let view = players_view(&loaded).unwrap();
        assert!(view.warning.is_none());
        assert!(view.top_scorers_chart.is_empty());
        assert_eq!(view.metrics.average_age, None);
        assert_eq!(view.metrics.total_goals, Value::Int(0));
    }

    #[test]
    fn teams_view_joins_all_six() {
        let view = teams_view(reference::fetch_all(), &fallback(fallback_team_stats())).unwrap();

        assert_eq!(view.combined.len(), 6);
        assert_eq!(view.combined.columns, TEAM_DISPLAY_COLUMNS);
        assert_eq!(view.performance_chart.points.len(), 6);
        assert_eq!(view.league_chart.points.len(), 3);
        assert_eq!(view.league_counts[0], ("La Liga".to_string(), 3));

        let bayern = view
            .performance_chart
            .points
            .iter()
            .find(|p| p.label == "Bayern Munich")
            .unwrap();
        assert_eq!((bayern.x, bayern.y, bayern.size), (25.0, 92.0, Some(26.0)));
    }

    #[test]
    fn teams_view_drops_unmatched_stats() {
        let mut stats = fallback_team_stats();
        stats[0].team = "real madrid".into();
        stats.truncate(4);
        let view = teams_view(reference::fetch_all(), &fallback(stats)).unwrap();

        assert_eq!(view.combined.len(), 3);
        // League distribution is taken from the reference table, not the join.
        assert_eq!(view.league_counts.iter().map(|(_, n)| n).sum::<usize>(), 6);
    }

    #[test]
    fn page_slugs_are_matched_exactly() {
        assert_eq!(Page::from_slug("teams"), Some(Page::Teams));
        assert_eq!(Page::from_slug("players"), Some(Page::Players));
        assert_eq!(Page::from_slug("Teams"), None);
        assert_eq!(Page::from_slug("bogus"), None);
    }

    #[test]
    fn exports_belong_to_their_page() {
        let teams = teams_view(reference::fetch_all(), &fallback(fallback_team_stats())).unwrap();
        assert!(teams.chart(ChartExport::LeagueDistribution).is_some());
        assert!(teams.chart(ChartExport::TopScorers).is_none());
        assert_eq!(ChartExport::TopScorers.page(), Page::Players);
        assert_eq!(ChartExport::TeamPerformance.file_stem(), "rendimiento_equipos");
    }
}
