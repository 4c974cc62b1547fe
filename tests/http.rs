use once_cell::sync::Lazy;
use reqwest::{redirect::Policy, Client, StatusCode};
use serde::Deserialize;
use std::net::{TcpListener, TcpStream};
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, MutexGuard};
use tokio::time::sleep;

#[derive(Debug, Deserialize)]
struct SessionResponse {
    status: String,
}

#[derive(Debug, Deserialize)]
struct Metrics {
    total_goals: i64,
    total_assists: i64,
    average_age: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ChartPoint {
    label: String,
    y: f64,
}

#[derive(Debug, Deserialize)]
struct Chart {
    points: Vec<ChartPoint>,
}

#[derive(Debug, Deserialize)]
struct PlayersResponse {
    warning: Option<String>,
    metrics: Metrics,
    top_scorers_chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
struct TeamsResponse {
    combined: Table,
    league_counts: Vec<(String, usize)>,
}

/// The dashboard binary, started once and shared. Holding the guard also
/// keeps tests from interleaving their logins.
static DASHBOARD: Lazy<Mutex<Option<Dashboard>>> = Lazy::new(|| Mutex::new(None));

struct Dashboard {
    base_url: String,
    _process: Child,
}

impl Dashboard {
    async fn start() -> Self {
        let port = TcpListener::bind("127.0.0.1:0")
            .and_then(|listener| listener.local_addr())
            .expect("reserve a port")
            .port();
        // Nothing exists at this path, so every table comes from the built-in samples.
        let data_dir = std::env::temp_dir().join(format!("sports_dashboard_http_{}", std::process::id()));

        let process = Command::new(env!("CARGO_BIN_EXE_sports_dashboard"))
            .env("PORT", port.to_string())
            .env("DASHBOARD_DATA_DIR", data_dir)
            .env("RUST_LOG", "info")
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .expect("failed to spawn dashboard");
        #[cfg(unix)]
        terminate_at_exit(process.id());

        let deadline = Instant::now() + Duration::from_secs(3);
        while TcpStream::connect(("127.0.0.1", port)).is_err() {
            assert!(Instant::now() < deadline, "dashboard did not start listening");
            sleep(Duration::from_millis(50)).await;
        }

        Self {
            base_url: format!("http://127.0.0.1:{port}"),
            _process: process,
        }
    }
}

async fn dashboard() -> (MutexGuard<'static, Option<Dashboard>>, String) {
    let mut guard = DASHBOARD.lock().await;
    if guard.is_none() {
        *guard = Some(Dashboard::start().await);
    }
    let base_url = guard.as_ref().map(|d| d.base_url.clone()).unwrap_or_default();
    (guard, base_url)
}

/// Statics are never dropped, so the shared process is signalled from an atexit hook.
#[cfg(unix)]
fn terminate_at_exit(pid: u32) {
    use std::sync::atomic::{AtomicI32, Ordering};

    static PID: AtomicI32 = AtomicI32::new(0);

    extern "C" fn terminate() {
        let pid = PID.load(Ordering::SeqCst);
        if pid > 0 {
            unsafe {
                libc::kill(pid, libc::SIGTERM);
            }
        }
    }

    if PID.swap(pid as i32, Ordering::SeqCst) == 0 {
        unsafe {
            libc::atexit(terminate);
        }
    }
}

fn browser() -> Client {
    Client::builder()
        .cookie_store(true)
        .redirect(Policy::none())
        .build()
        .unwrap()
}

async fn session_status(client: &Client, base_url: &str) -> String {
    let session: SessionResponse = client
        .get(format!("{base_url}/api/session"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    session.status
}

async fn log_in(client: &Client, base_url: &str, username: &str, password: &str) {
    let response = client
        .post(format!("{base_url}/login"))
        .form(&[("username", username), ("password", password)])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn http_wrong_password_is_rejected() {
    let (_guard, base_url) = dashboard().await;
    let client = browser();

    assert_eq!(session_status(&client, &base_url).await, "unset");
    log_in(&client, &base_url, "admin", "hunter2").await;
    assert_eq!(session_status(&client, &base_url).await, "rejected");

    let page = client
        .get(format!("{base_url}/"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(page.contains("Incorrect username or password"));

    let api = client
        .get(format!("{base_url}/api/players"))
        .send()
        .await
        .unwrap();
    assert_eq!(api.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn http_players_view_uses_fallback_data() {
    let (_guard, base_url) = dashboard().await;
    let client = browser();
    log_in(&client, &base_url, "admin", "admin").await;

    let players: PlayersResponse = client
        .get(format!("{base_url}/api/players"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert!(players.warning.is_some());
    assert_eq!(players.metrics.total_goals, 150);
    assert_eq!(players.metrics.total_assists, 69);
    assert_eq!(players.metrics.average_age, Some(29.2));
    let top: Vec<(&str, f64)> = players
        .top_scorers_chart
        .points
        .iter()
        .map(|p| (p.label.as_str(), p.y))
        .collect();
    assert_eq!(
        top,
        [
            ("Erling Haaland", 36.0),
            ("Cristiano Ronaldo", 35.0),
            ("Lionel Messi", 30.0),
            ("Kylian Mbappé", 29.0),
            ("Vinicius Jr.", 20.0),
        ]
    );

    let page = client
        .get(format!("{base_url}/?page=players"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(page.contains("Players analysis"));
    assert!(page.contains("data-warning"));
}

#[tokio::test]
async fn http_teams_view_joins_reference_data() {
    let (_guard, base_url) = dashboard().await;
    let client = browser();
    log_in(&client, &base_url, "admin", "admin").await;

    let teams: TeamsResponse = client
        .get(format!("{base_url}/api/teams"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(teams.combined.rows.len(), 6);
    assert_eq!(teams.combined.columns[0], "nombre");
    assert_eq!(teams.league_counts[0], ("La Liga".to_string(), 3));

    let page = client
        .get(format!("{base_url}/?page=teams"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(page.contains("Teams analysis"));
    assert!(page.contains("Santiago Bernab"));
}

#[tokio::test]
async fn http_exports_download_pdf_files() {
    let (_guard, base_url) = dashboard().await;
    let client = browser();

    let denied = client
        .get(format!("{base_url}/export/chart/top_goleadores"))
        .send()
        .await
        .unwrap();
    assert_eq!(denied.status(), StatusCode::UNAUTHORIZED);

    log_in(&client, &base_url, "admin", "admin").await;
    for path in [
        "export/chart/top_goleadores",
        "export/chart/rendimiento_equipos",
        "export/chart/distribucion_ligas",
        "export/table/jugadores",
        "export/table/equipos",
    ] {
        let response = client
            .get(format!("{base_url}/{path}"))
            .send()
            .await
            .unwrap();
        assert!(response.status().is_success(), "{path}");
        assert_eq!(
            response.headers()["content-type"].to_str().unwrap(),
            "application/pdf"
        );
        let stem = path.rsplit('/').next().unwrap();
        let disposition = response.headers()["content-disposition"]
            .to_str()
            .unwrap()
            .to_string();
        assert!(disposition.contains(&format!("{stem}.pdf")), "{disposition}");
        let bytes = response.bytes().await.unwrap();
        assert!(bytes.starts_with(b"%PDF"), "{path}");
    }

    let unknown = client
        .get(format!("{base_url}/export/chart/nope"))
        .send()
        .await
        .unwrap();
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn http_logout_resets_session_to_unset() {
    let (_guard, base_url) = dashboard().await;
    let client = browser();

    log_in(&client, &base_url, "admin", "admin").await;
    assert_eq!(session_status(&client, &base_url).await, "accepted");

    let response = client
        .post(format!("{base_url}/logout"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(session_status(&client, &base_url).await, "unset");

    let page = client
        .get(format!("{base_url}/"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(page.contains("action=\"/login\""));
    assert!(!page.contains("Incorrect username or password"));
}

#[tokio::test]
async fn http_partial_login_form_is_a_rejection() {
    let (_guard, base_url) = dashboard().await;
    let client = browser();

    let response = client
        .post(format!("{base_url}/login"))
        .form(&[("username", "admin")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(session_status(&client, &base_url).await, "rejected");

    let response = client
        .post(format!("{base_url}/login"))
        .form(&[("password", "admin")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(session_status(&client, &base_url).await, "rejected");
}

#[tokio::test]
async fn http_unknown_page_falls_back_to_players() {
    let (_guard, base_url) = dashboard().await;
    let client = browser();
    log_in(&client, &base_url, "admin", "admin").await;

    let response = client
        .get(format!("{base_url}/?page=bogus"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.text().await.unwrap().contains("Players analysis"));
}
