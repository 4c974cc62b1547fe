use crate::auth::{expired_session_cookie, session_cookie, session_id, SessionContext};
use crate::errors::AppError;
use crate::export::{export_table_report, ChartExporter, PdfExporter};
use crate::models::{LoginForm, SessionResponse};
use crate::reference;
use crate::state::AppState;
use crate::ui::{render_login, render_players, render_teams};
use crate::views::{players_view, teams_view, ChartExport, Page, PlayersView, TableExport, TeamsView};
use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap},
    response::{Html, IntoResponse, Redirect, Response},
    Form, Json,
};
use chrono::Local;
use serde::Deserialize;
use tracing::{error, info};

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

pub async fn index(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<PageQuery>,
) -> Result<Html<String>, AppError> {
    let session = current_session(&state, &headers).await;
    if !session.is_authenticated() {
        return Ok(Html(render_login(&session)));
    }

    let clock = Local::now().format("%H:%M:%S").to_string();
    let page = query
        .page
        .as_deref()
        .and_then(Page::from_slug)
        .unwrap_or_default();
    let html = match page {
        Page::Players => render_players(&build_players(&state).await?, &clock),
        Page::Teams => render_teams(&build_teams(&state).await?, &clock),
    };
    Ok(Html(html))
}

pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<LoginForm>,
) -> Response {
    let existing = session_id(&headers);
    let (id, _status) = state
        .sessions
        .login(existing.as_deref(), &form.username, &form.password)
        .await;

    ([(header::SET_COOKIE, session_cookie(&id))], Redirect::to("/")).into_response()
}

pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    state.sessions.logout(session_id(&headers).as_deref()).await;
    ([(header::SET_COOKIE, expired_session_cookie())], Redirect::to("/")).into_response()
}

pub async fn get_session(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Json<SessionResponse> {
    let session = current_session(&state, &headers).await;
    Json(SessionResponse {
        status: session.status,
    })
}

pub async fn get_players(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<PlayersView>, AppError> {
    require_login(&state, &headers).await?;
    Ok(Json(build_players(&state).await?))
}

pub async fn get_teams(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<TeamsView>, AppError> {
    require_login(&state, &headers).await?;
    Ok(Json(build_teams(&state).await?))
}

pub async fn export_chart(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(name): Path<String>,
) -> Result<Response, AppError> {
    require_login(&state, &headers).await?;
    let export = parse_slug::<ChartExport>(&name)?;

    let chart = match export.page() {
        Page::Players => build_players(&state).await?.chart(export).cloned(),
        Page::Teams => build_teams(&state).await?.chart(export).cloned(),
    }
    .ok_or_else(|| AppError::not_found(format!("unknown chart '{name}'")))?;

    let bytes = PdfExporter.export_pdf(&chart).inspect_err(|err| {
        error!(chart = export.file_stem(), "chart export failed: {err}");
    })?;
    info!(chart = export.file_stem(), bytes = bytes.len(), "exported chart");
    Ok(pdf_download(export.file_stem(), bytes))
}

pub async fn export_table(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(report): Path<String>,
) -> Result<Response, AppError> {
    require_login(&state, &headers).await?;
    let export = parse_slug::<TableExport>(&report)?;

    let (title, table) = match export {
        TableExport::Players => ("Player data", build_players(&state).await?.players),
        TableExport::Teams => ("Full team information", build_teams(&state).await?.combined),
    };
    let bytes = export_table_report(title, &table.columns, &table.display_rows())
        .inspect_err(|err| {
            error!(report = export.file_stem(), "table export failed: {err}");
        })?;
    info!(report = export.file_stem(), bytes = bytes.len(), "exported table report");
    Ok(pdf_download(export.file_stem(), bytes))
}

async fn current_session(state: &AppState, headers: &HeaderMap) -> SessionContext {
    state.sessions.context(session_id(headers).as_deref()).await
}

async fn require_login(state: &AppState, headers: &HeaderMap) -> Result<(), AppError> {
    if current_session(state, headers).await.is_authenticated() {
        Ok(())
    } else {
        Err(AppError::unauthorized())
    }
}

async fn build_players(state: &AppState) -> Result<PlayersView, AppError> {
    let loaded = state.players().await;
    Ok(players_view(&loaded)?)
}

async fn build_teams(state: &AppState) -> Result<TeamsView, AppError> {
    let stats = state.team_stats().await;
    Ok(teams_view(reference::fetch_all(), &stats)?)
}

fn parse_slug<T: serde::de::DeserializeOwned>(slug: &str) -> Result<T, AppError> {
    serde_json::from_value(serde_json::Value::String(slug.to_string()))
        .map_err(|_| AppError::not_found(format!("no export named '{slug}'")))
}

fn pdf_download(stem: &str, bytes: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{stem}.pdf\""),
            ),
        ],
        bytes,
    )
        .into_response()
}
