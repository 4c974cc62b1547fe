use crate::table::{Tabular, Value};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    #[serde(rename = "Nombre")]
    pub name: String,
    #[serde(rename = "Equipo")]
    pub team: String,
    #[serde(rename = "Edad")]
    pub age: i64,
    #[serde(rename = "Goles")]
    pub goals: i64,
    #[serde(rename = "Asistencias")]
    pub assists: i64,
    #[serde(rename = "Partidos")]
    pub matches: i64,
    #[serde(rename = "Valor_Mercado")]
    pub market_value: f64,
}

impl Tabular for PlayerRecord {
    const COLUMNS: &'static [&'static str] = &[
        "Nombre",
        "Equipo",
        "Edad",
        "Goles",
        "Asistencias",
        "Partidos",
        "Valor_Mercado",
    ];

    fn cells(&self) -> Vec<Value> {
        vec![
            Value::Text(self.name.clone()),
            Value::Text(self.team.clone()),
            Value::Int(self.age),
            Value::Int(self.goals),
            Value::Int(self.assists),
            Value::Int(self.matches),
            Value::Float(self.market_value),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamRecord {
    pub id: i64,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "liga")]
    pub league: String,
    #[serde(rename = "fundacion")]
    pub founded: i64,
    #[serde(rename = "estadio")]
    pub stadium: String,
}

impl Tabular for TeamRecord {
    const COLUMNS: &'static [&'static str] = &["id", "nombre", "liga", "fundacion", "estadio"];

    fn cells(&self) -> Vec<Value> {
        vec![
            Value::Int(self.id),
            Value::Text(self.name.clone()),
            Value::Text(self.league.clone()),
            Value::Int(self.founded),
            Value::Text(self.stadium.clone()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamStatsRecord {
    #[serde(rename = "Equipo")]
    pub team: String,
    #[serde(rename = "Partidos_Jugados")]
    pub played: i64,
    #[serde(rename = "Victorias")]
    pub wins: i64,
    #[serde(rename = "Empates")]
    pub draws: i64,
    #[serde(rename = "Derrotas")]
    pub losses: i64,
    #[serde(rename = "Goles_Favor")]
    pub goals_for: i64,
    #[serde(rename = "Goles_Contra")]
    pub goals_against: i64,
}

impl Tabular for TeamStatsRecord {
    const COLUMNS: &'static [&'static str] = &[
        "Equipo",
        "Partidos_Jugados",
        "Victorias",
        "Empates",
        "Derrotas",
        "Goles_Favor",
        "Goles_Contra",
    ];

    fn cells(&self) -> Vec<Value> {
        vec![
            Value::Text(self.team.clone()),
            Value::Int(self.played),
            Value::Int(self.wins),
            Value::Int(self.draws),
            Value::Int(self.losses),
            Value::Int(self.goals_for),
            Value::Int(self.goals_against),
        ]
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub status: crate::auth::AuthStatus,
}
