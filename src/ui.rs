use crate::auth::{AuthStatus, SessionContext};
use crate::chart::{ChartRenderer, SvgRenderer};
use crate::table::Table;
use crate::views::{ChartExport, Page, PlayersView, TableExport, TeamsView};
use std::fmt::Write as _;

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn render_login(session: &SessionContext) -> String {
    let error = if session.status == AuthStatus::Rejected {
        r#"<p class="alert error" id="login-error">Incorrect username or password</p>"#
    } else {
        ""
    };
    let title = if session.status == AuthStatus::Rejected {
        "Welcome to the football data"
    } else {
        "Authentication"
    };

    LOGIN_HTML
        .replace("{{STYLE}}", STYLE)
        .replace("{{TITLE}}", title)
        .replace("{{ERROR}}", error)
}

pub fn render_players(view: &PlayersView, clock: &str) -> String {
    let renderer = SvgRenderer::default();
    let mut body = String::new();
    push_warning(&mut body, view.warning.as_deref());

    if view.players.is_empty() {
        body.push_str(r#"<p class="alert info">No player data available.</p>"#);
        return render_shell(Page::Players, clock, &body);
    }

    let average_age = view
        .metrics
        .average_age
        .map(|age| format!("{age:.1}"))
        .unwrap_or_else(|| "--".to_string());

    let _ = write!(
        body,
        r#"<section class="grid two-one">
  <div class="card"><h2>Top scorers</h2>{chart}</div>
  <div class="card metrics">
    <h2>General stats</h2>
    <div class="stat"><span class="label">Total goals</span><span class="value" id="total-goals">{goals}</span></div>
    <div class="stat"><span class="label">Total assists</span><span class="value" id="total-assists">{assists}</span></div>
    <div class="stat"><span class="label">Average age</span><span class="value" id="average-age">{age}</span></div>
  </div>
</section>
<section class="card"><h2>Player data</h2>{table}</section>"#,
        chart = renderer.render(&view.top_scorers_chart),
        goals = view.metrics.total_goals,
        assists = view.metrics.total_assists,
        age = average_age,
        table = render_table(&view.players),
    );
    push_actions(&mut body, &[ChartExport::TopScorers], TableExport::Players);

    render_shell(Page::Players, clock, &body)
}

pub fn render_teams(view: &TeamsView, clock: &str) -> String {
    let renderer = SvgRenderer::default();
    let mut body = String::new();
    push_warning(&mut body, view.warning.as_deref());
    if view.combined.is_empty() {
        body.push_str(r#"<p class="alert info">No team statistics matched the reference teams.</p>"#);
    }

    let _ = write!(
        body,
        r#"<section class="grid three-one">
  <div class="card"><h2>Goals for vs goals against</h2>{scatter}</div>
  <div class="card"><h2>League distribution</h2>{pie}</div>
</section>
<section class="card"><h2>Full team information</h2>{table}</section>"#,
        scatter = renderer.render(&view.performance_chart),
        pie = renderer.render(&view.league_chart),
        table = render_table(&view.combined),
    );
    push_actions(
        &mut body,
        &[ChartExport::TeamPerformance, ChartExport::LeagueDistribution],
        TableExport::Teams,
    );

    render_shell(Page::Teams, clock, &body)
}

fn push_warning(body: &mut String, warning: Option<&str>) {
    if let Some(warning) = warning {
        let _ = write!(
            body,
            r#"<p class="alert warning" id="data-warning">{}</p>"#,
            escape_html(warning)
        );
    }
}

fn push_actions(body: &mut String, charts: &[ChartExport], table: TableExport) {
    body.push_str(
        r#"<section class="actions"><button type="button" class="btn" onclick="window.print()">Print page</button>"#,
    );
    for chart in charts {
        let _ = write!(
            body,
            r#"<a class="btn primary" href="/export/chart/{stem}" download="{stem}.pdf">Export {stem} to PDF</a>"#,
            stem = chart.file_stem(),
        );
    }
    let _ = write!(
        body,
        r#"<a class="btn" href="/export/table/{stem}" download="{stem}.pdf">Table report (PDF)</a></section>"#,
        stem = table.file_stem(),
    );
}

pub fn render_table(table: &Table) -> String {
    let mut html = String::from(r#"<div class="table-wrap"><table><thead><tr>"#);
    for column in &table.columns {
        let _ = write!(html, "<th>{}</th>", escape_html(column));
    }
    html.push_str("</tr></thead><tbody>");
    for row in table.display_rows() {
        html.push_str("<tr>");
        for cell in row {
            let _ = write!(html, "<td>{}</td>", escape_html(&cell));
        }
        html.push_str("</tr>");
    }
    html.push_str("</tbody></table></div>");
    html
}

fn render_shell(page: Page, clock: &str, body: &str) -> String {
    let mut options = String::new();
    for candidate in Page::ALL {
        let selected = if candidate == page { " selected" } else { "" };
        let _ = write!(
            options,
            r#"<option value="{}"{selected}>{}</option>"#,
            candidate.slug(),
            candidate.title()
        );
    }

    DASHBOARD_HTML
        .replace("{{STYLE}}", STYLE)
        .replace("{{PAGE_TITLE}}", page.title())
        .replace("{{OPTIONS}}", &options)
        .replace("{{CLOCK}}", &escape_html(clock))
        .replace("{{BODY}}", body)
}

const STYLE: &str = r#"
    :root {
      --bg: #f4f6f2;
      --ink: #1f2a24;
      --muted: #6b766f;
      --accent: #1f8a4c;
      --card: #ffffff;
      --border: rgba(31, 42, 36, 0.1);
      --shadow: 0 18px 40px rgba(31, 42, 36, 0.12);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: var(--bg);
      color: var(--ink);
      font-family: "Space Grotesk", "Trebuchet MS", sans-serif;
    }

    h1, h2 {
      margin: 0 0 12px;
    }

    .layout {
      display: grid;
      grid-template-columns: 260px 1fr;
      min-height: 100vh;
    }

    aside {
      background: #14281d;
      color: #e8f1ea;
      padding: 24px 18px;
      display: grid;
      align-content: start;
      gap: 18px;
    }

    aside select, aside button {
      width: 100%;
      padding: 10px;
      border-radius: 10px;
      border: none;
      font: inherit;
    }

    main {
      padding: 32px;
      display: grid;
      gap: 24px;
      align-content: start;
    }

    .card {
      background: var(--card);
      border: 1px solid var(--border);
      border-radius: 18px;
      box-shadow: var(--shadow);
      padding: 20px;
    }

    .grid {
      display: grid;
      gap: 24px;
    }

    .grid.two-one {
      grid-template-columns: 2fr 1fr;
    }

    .grid.three-one {
      grid-template-columns: 3fr 2fr;
    }

    .metrics .stat {
      display: grid;
      gap: 4px;
      margin-bottom: 14px;
    }

    .stat .label {
      font-size: 0.8rem;
      text-transform: uppercase;
      letter-spacing: 0.12em;
      color: var(--muted);
    }

    .stat .value {
      font-size: 1.8rem;
      font-weight: 600;
      color: var(--accent);
    }

    .alert {
      padding: 12px 16px;
      border-radius: 12px;
      margin: 0;
    }

    .alert.warning { background: #fff4d6; color: #7a5600; }
    .alert.error { background: #fde2e1; color: #8a1c16; }
    .alert.info { background: #e2effd; color: #1c4a8a; }
    .alert.success { background: #dff3e6; color: #1f6b3a; }

    .table-wrap {
      overflow-x: auto;
    }

    table {
      width: 100%;
      border-collapse: collapse;
      font-size: 0.92rem;
    }

    th, td {
      padding: 8px 10px;
      border-bottom: 1px solid var(--border);
      text-align: left;
    }

    .actions {
      display: flex;
      gap: 12px;
      flex-wrap: wrap;
    }

    .btn {
      appearance: none;
      border: 1px solid var(--accent);
      border-radius: 999px;
      padding: 12px 18px;
      background: white;
      color: var(--accent);
      font: inherit;
      font-weight: 600;
      text-decoration: none;
      cursor: pointer;
    }

    .btn.primary {
      background: var(--accent);
      color: white;
    }

    .chart {
      width: 100%;
      height: auto;
    }

    .chart-title {
      font-size: 15px;
      font-weight: 600;
      fill: var(--ink);
    }

    .chart-label {
      fill: var(--muted);
      font-size: 11px;
    }

    .chart-grid {
      stroke: rgba(31, 42, 36, 0.08);
    }

    .login {
      width: min(420px, 92vw);
      margin: 10vh auto;
      display: grid;
      gap: 14px;
    }

    .login input {
      width: 100%;
      padding: 12px;
      border-radius: 10px;
      border: 1px solid var(--border);
      font: inherit;
    }

    @media print {
      aside, .actions {
        display: none;
      }
      .layout {
        grid-template-columns: 1fr;
      }
    }

    @media (max-width: 860px) {
      .layout, .grid.two-one, .grid.three-one {
        grid-template-columns: 1fr;
      }
    }
"#;

const LOGIN_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Sports Analysis</title>
  <style>{{STYLE}}</style>
</head>
<body>
  <form class="card login" method="post" action="/login">
    <h1>{{TITLE}}</h1>
    {{ERROR}}
    <p class="alert info"><strong>User:</strong> admin | <strong>Password:</strong> admin</p>
    <label>User <input name="username" autocomplete="username" placeholder="Enter your username" /></label>
    <label>Password <input name="password" type="password" autocomplete="current-password" placeholder="Enter your password" /></label>
    <button class="btn primary" type="submit">Log in</button>
  </form>
</body>
</html>
"#;

const DASHBOARD_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>{{PAGE_TITLE}} | Sports Analysis</title>
  <style>{{STYLE}}</style>
</head>
<body>
  <div class="layout">
    <aside>
      <p class="alert success">Session started</p>
      <h2>Navigation</h2>
      <form method="get" action="/">
        <label for="page">Select a page:</label>
        <select id="page" name="page" onchange="this.form.submit()">{{OPTIONS}}</select>
        <noscript><button type="submit">Go</button></noscript>
      </form>
      <p class="alert info">User: admin<br />Session: {{CLOCK}}</p>
      <form method="post" action="/logout">
        <button type="submit" id="logout">Log out</button>
      </form>
    </aside>
    <main>
      <h1>{{PAGE_TITLE}}</h1>
      {{BODY}}
    </main>
  </div>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference;
    use crate::storage::{fallback_players, fallback_team_stats, DataSource, Loaded};
    use crate::views::{players_view, teams_view};
    use std::path::PathBuf;

    fn from_file<T>(records: Vec<T>) -> Loaded<T> {
        Loaded {
            records,
            source: DataSource::File(PathBuf::from("data/x.csv")),
        }
    }

    #[test]
    fn login_shows_error_only_after_rejection() {
        let unset = render_login(&SessionContext::default());
        assert!(!unset.contains("login-error"));

        let rejected = render_login(&SessionContext {
            status: AuthStatus::Rejected,
        });
        assert!(rejected.contains("Incorrect username or password"));
    }

    #[test]
    fn players_page_shows_metrics_and_exports() {
        let view = players_view(&from_file(fallback_players())).unwrap();
        let html = render_players(&view, "12:00:00");

        assert!(html.contains(r#"id="total-goals">150<"#));
        assert!(html.contains(r#"id="total-assists">69<"#));
        assert!(html.contains(r#"id="average-age">29.2<"#));
        assert!(html.contains("/export/chart/top_goleadores"));
        assert!(html.contains(r#"<option value="players" selected>"#));
        assert!(!html.contains("data-warning"));
    }

    #[test]
    fn teams_page_lists_combined_rows() {
        let view = teams_view(reference::fetch_all(), &from_file(fallback_team_stats())).unwrap();
        let html = render_teams(&view, "12:00:00");

        assert!(html.contains("Allianz Arena"));
        assert!(html.contains("/export/chart/rendimiento_equipos"));
        assert!(html.contains("/export/chart/distribucion_ligas"));
        assert!(html.contains(r#"<option value="teams" selected>"#));
    }

    #[test]
    fn teams_page_notes_missing_stats() {
        let view = teams_view(reference::fetch_all(), &from_file(Vec::new())).unwrap();
        let html = render_teams(&view, "12:00:00");

        assert!(html.contains("No team statistics matched the reference teams."));
        assert!(!html.contains("data-warning"));
    }

    #[test]
    fn escape_covers_markup() {
        assert_eq!(escape_html(r#"<a href="x">'&'</a>"#), "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;");
    }
}
