//! HTTP handlers for the PathCORE-T pages and JSON API

use super::error::AppError;
use super::pages::{self, path_segment, PageContext};
use super::server::AppState;
use crate::model::{EdgeName, EdgeSide};
use crate::network::load_network;
use crate::report::{
    edge_export, edge_gene_odds_ratios, edge_view, experiment_view, write_csv, EdgeSession,
    EdgeView, ExperimentRef, ReportError,
};
use crate::session::SessionId;
use axum::extract::{Path, Query, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE, SET_COOKIE};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

pub const PAO1_NETWORK_FILE: &str = "PAO1_KEGG_10_eADAGE_network.tsv";
pub const TCGA_NETWORK_FILE: &str = "TCGA_PID_NMF_network.tsv";

/// Attach the session cookie when the session was created by this request
fn with_session(session: SessionId, response: impl IntoResponse) -> Response {
    let mut response = response.into_response();
    if let Some(cookie) = session.set_cookie() {
        response.headers_mut().append(SET_COOKIE, cookie);
    }
    response
}

pub async fn home_handler() -> Result<Response, AppError> {
    Ok(pages::render("home.html", &PageContext::new())?.into_response())
}

pub async fn docs_handler() -> Redirect {
    Redirect::to("/static/data/docs_pathcore/index.html")
}

pub async fn pao1_file_handler() -> Redirect {
    Redirect::to(&format!("/static/data/{}", PAO1_NETWORK_FILE))
}

async fn network_page(
    state: &AppState,
    session: SessionId,
    title: &str,
    filename: &str,
    view_only: bool,
) -> Result<Response, AppError> {
    state.sessions.update(&session, |s| s.start_visit()).await;
    let context = PageContext::new()
        .text("title", title)
        .json("config", &json!({ "filename": filename, "view_only": view_only }))?;
    Ok(with_session(session, pages::render("network.html", &context)?))
}

pub async fn pao1_handler(
    State(state): State<AppState>,
    session: SessionId,
) -> Result<Response, AppError> {
    network_page(
        &state,
        session,
        "PAO1 KEGG network, built from 10 eADAGE models (each k=300 features)",
        PAO1_NETWORK_FILE,
        false,
    )
    .await
}

pub async fn tcga_handler(
    State(state): State<AppState>,
    session: SessionId,
) -> Result<Response, AppError> {
    network_page(
        &state,
        session,
        "TCGA PID network, built from 1 NMF model (k=300)",
        TCGA_NETWORK_FILE,
        true,
    )
    .await
}

pub async fn quickview_handler(
    State(state): State<AppState>,
    session: SessionId,
) -> Result<Response, AppError> {
    state.sessions.update(&session, |s| s.start_visit()).await;
    let context = PageContext::new().text("title", "Temporary network view");
    Ok(with_session(session, pages::render("quickview.html", &context)?))
}

pub async fn asset_handler(Path(path): Path<String>) -> Response {
    pages::asset(&path)
}

/// `/edge/*rest` dispatch.
///
/// Pathway names may contain `/`, so the edge page, the experiment page and
/// the download share one wildcard route and are told apart by suffix.
pub async fn edge_handler(
    State(state): State<AppState>,
    session: SessionId,
    Path(rest): Path<String>,
) -> Result<Response, AppError> {
    if let Some(edge) = rest.strip_suffix("/download") {
        return download(&state, session, edge).await;
    }
    if let Some((edge, experiment)) = rest.rsplit_once("/experiment/") {
        return experiment_page(&state, session, edge, experiment).await;
    }
    edge_page(&state, session, &rest).await
}

fn edge_href(edge_name: &EdgeName) -> String {
    format!("/edge/{}", path_segment(&edge_name.to_string()))
}

fn no_edge_page(edge_name: &EdgeName, status: StatusCode) -> Result<Response, AppError> {
    let context = PageContext::new()
        .text("pw0", &edge_name.pw0)
        .text("pw1", &edge_name.pw1);
    Ok((status, pages::render("no_edge.html", &context)?).into_response())
}

async fn edge_page(state: &AppState, session: SessionId, raw: &str) -> Result<Response, AppError> {
    let edge_name = EdgeName::parse(raw).map_err(ReportError::from)?;
    state.sessions.update(&session, |s| s.start_visit()).await;

    let view = match edge_view(state.store.as_ref(), &edge_name) {
        Ok(view) => view,
        Err(ReportError::EdgeNotFound(name)) => {
            info!("No edge data for {}", name);
            return Ok(with_session(session, no_edge_page(&name, StatusCode::NOT_FOUND)?));
        }
        Err(e) => return Err(e.into()),
    };

    match view {
        EdgeView::Found { page, session: edge } => {
            state
                .sessions
                .update(&session, |s| s.edge = Some(edge))
                .await;
            let href = edge_href(&edge_name);
            let context = PageContext::new()
                .text("pw0", &page.pw0)
                .text("pw1", &page.pw1)
                .text("n_samples", &page.n_samples.to_string())
                .text("edge_href", &href)
                .text("download_href", &format!("{}/download", href))
                .json("edge_info", &page.edge_info)?;
            Ok(with_session(session, pages::render("edge.html", &context)?))
        }
        EdgeView::NoEdge(name) => Ok(with_session(session, no_edge_page(&name, StatusCode::OK)?)),
    }
}

/// Edge held by the session, rebuilt from the store when it is missing or
/// belongs to another edge
async fn session_edge(
    state: &AppState,
    session: &SessionId,
    edge_name: &EdgeName,
) -> Result<EdgeSession, AppError> {
    let current = state.sessions.get(session).await;
    if let Some(edge) = current.edge_for(edge_name) {
        return Ok(edge.clone());
    }

    debug!("Rebuilding session edge {}", edge_name);
    match edge_view(state.store.as_ref(), edge_name)? {
        EdgeView::Found { session: edge, .. } => {
            let cached = edge.clone();
            state
                .sessions
                .update(session, |s| {
                    s.start_visit();
                    s.edge = Some(cached);
                })
                .await;
            Ok(edge)
        }
        EdgeView::NoEdge(name) => Err(ReportError::EdgeFlagged(name).into()),
    }
}

async fn experiment_page(
    state: &AppState,
    session: SessionId,
    raw_edge: &str,
    raw_experiment: &str,
) -> Result<Response, AppError> {
    let edge_name = EdgeName::parse(raw_edge).map_err(ReportError::from)?;
    let reference = ExperimentRef::parse(raw_experiment)?;
    let edge = session_edge(state, &session, &edge_name).await?;

    let page = experiment_view(state.store.as_ref(), &edge, &reference)?;
    let context = PageContext::new()
        .text("pw0", &edge_name.pw0)
        .text("pw1", &edge_name.pw1)
        .text("edge_href", &edge_href(&edge_name))
        .text("experiment_name", &page.experiment_name)
        .json("experiment_info", &page.experiment_info)?;
    Ok(with_session(session, pages::render("experiment.html", &context)?))
}

/// `attachment` disposition with an ASCII fallback and a UTF-8 file name
fn content_disposition(file_name: &str) -> Result<HeaderValue, AppError> {
    let fallback: String = file_name
        .chars()
        .filter(|c| c.is_ascii() && !c.is_ascii_control() && *c != '"' && *c != '\\')
        .collect();
    let value = format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        utf8_percent_encode(file_name, NON_ALPHANUMERIC)
    );
    HeaderValue::from_str(&value)
        .map_err(|e| AppError::Internal(format!("Invalid download file name: {}", e)))
}

async fn download(state: &AppState, session: SessionId, raw: &str) -> Result<Response, AppError> {
    let edge_name = EdgeName::parse(raw).map_err(ReportError::from)?;
    state.sessions.update(&session, |s| s.count_visit()).await;

    let export = edge_export(state.store.as_ref(), &edge_name)?;
    let mut body = Vec::new();
    write_csv(&export.rows, &mut body)?;
    info!("Exported {} rows for edge {}", export.rows.len(), edge_name);

    let headers = [
        (CONTENT_TYPE, HeaderValue::from_static("text/csv; charset=utf-8")),
        (CONTENT_DISPOSITION, content_disposition(&export.file_name)?),
    ];
    Ok(with_session(session, (headers, body)))
}

/// Handler for system status
pub async fn status_handler(State(state): State<AppState>) -> Result<Response, AppError> {
    let statistics = state.store.statistics()?;
    Ok(Json(json!({
        "status": "healthy",
        "version": crate::VERSION,
        "storage": statistics,
        "sessions": state.sessions.len().await,
    }))
    .into_response())
}

fn edge_side(etype: Option<i8>) -> Result<Option<EdgeSide>, AppError> {
    etype
        .map(EdgeSide::try_from)
        .transpose()
        .map_err(AppError::BadRequest)
}

#[derive(Debug, Deserialize)]
pub struct NetworkQuery {
    pub pw1: String,
    pub pw2: String,
    pub etype: Option<i8>,
}

/// Stored network edges between two pathways
pub async fn network_edges_handler(
    State(state): State<AppState>,
    Query(query): Query<NetworkQuery>,
) -> Result<Response, AppError> {
    let side = edge_side(query.etype)?;
    let store = state.store.as_ref();
    let pathway = |name: &str| {
        store
            .find_pathway(name)
            .map_err(AppError::from)?
            .ok_or_else(|| AppError::NotFound(format!("Pathway not found: {}", name)))
    };
    let pw1 = pathway(&query.pw1)?;
    let pw2 = pathway(&query.pw2)?;
    let edges = store.find_network_edges(pw1.id, pw2.id, side)?;
    Ok(Json(edges).into_response())
}

#[derive(Debug, Deserialize)]
pub struct EdgeGenesQuery {
    pub pw0: String,
    pub pw1: String,
    pub etype: Option<i8>,
}

/// Genes over-represented in the features containing an edge
pub async fn edge_genes_handler(
    State(state): State<AppState>,
    Query(query): Query<EdgeGenesQuery>,
) -> Result<Response, AppError> {
    let side = edge_side(query.etype)?;
    let genes = edge_gene_odds_ratios(state.store.as_ref(), &query.pw0, &query.pw1, side)?;
    Ok(Json(genes).into_response())
}

/// Parsed network file from the static data directory
pub async fn network_file_handler(
    State(state): State<AppState>,
    Path(file): Path<String>,
) -> Result<Response, AppError> {
    let graph = load_network(&state.config.static_path.join("data"), &file)?;
    Ok(Json(graph).into_response())
}
