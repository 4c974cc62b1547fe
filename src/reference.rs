use crate::models::TeamRecord;
use crate::table::Table;
use once_cell::sync::Lazy;

static TEAMS: Lazy<Vec<TeamRecord>> = Lazy::new(|| {
    [
        (1, "Real Madrid", "La Liga", 1902, "Santiago Bernabéu"),
        (2, "FC Barcelona", "La Liga", 1899, "Camp Nou"),
        (3, "Atlético Madrid", "La Liga", 1903, "Cívitas Metropolitano"),
        (4, "Manchester United", "Premier League", 1878, "Old Trafford"),
        (5, "Liverpool", "Premier League", 1892, "Anfield"),
        (6, "Bayern Munich", "Bundesliga", 1900, "Allianz Arena"),
    ]
    .into_iter()
    .map(|(id, name, league, founded, stadium)| TeamRecord {
        id,
        name: name.to_string(),
        league: league.to_string(),
        founded,
        stadium: stadium.to_string(),
    })
    .collect()
});

pub fn fetch_all() -> &'static [TeamRecord] {
    &TEAMS
}

pub fn fetch_all_table() -> Table {
    Table::from_records(fetch_all())
}
