use std::path::Path as FsPath;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use cliparr_catalog::SeriesResource;
use cliparr_core::error::ApiError;
use cliparr_importer::service::{DeleteReport, ImportReport, ShowDetail, ShowPage};
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::AppError;
use crate::extract;
use crate::state::AppState;

pub const DEFAULT_PAGE_SIZE: i64 = 50;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .nest("/api", api_router())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// Serve a built frontend from `dir`, falling back to `index.html` for
/// client-side routes. API routes keep precedence.
pub fn with_frontend(router: Router, dir: &FsPath) -> Router {
    router.fallback_service(
        ServeDir::new(dir).not_found_service(ServeFile::new(dir.join("index.html"))),
    )
}

fn api_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        // Shows
        .route("/shows", get(list_shows))
        .route("/shows/unimported", get(list_unimported))
        .route("/shows/import", post(import_shows))
        .route("/shows/delete", post(delete_shows))
        .route("/shows/{id}", get(get_show))
        // Settings
        .route(
            "/settings/import-mode",
            get(get_import_mode).post(set_import_mode),
        )
        .route(
            "/settings/polling-interval",
            get(get_polling_interval).post(set_polling_interval),
        )
        // Polling task
        .route("/import/status", get(import_status))
        .route("/import/run", post(run_import))
        // Push channel
        .route("/events", get(crate::events::sse_events))
        .route("/ws", get(crate::events::ws_handler))
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    timestamp: String,
}

async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, AppError> {
    sqlx::query("SELECT 1")
        .execute(&state.db)
        .await
        .map_err(|e| ApiError::Internal(format!("database check failed: {e}")))?;

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    }))
}

// ---------------------------------------------------------------------------
// Shows
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageQuery {
    page: Option<i64>,
    page_size: Option<i64>,
}

async fn list_shows(
    State(state): State<AppState>,
    extract::Query(q): extract::Query<PageQuery>,
) -> Result<Json<ShowPage>, AppError> {
    let page = state
        .importer
        .list_shows(q.page.unwrap_or(1), q.page_size.unwrap_or(DEFAULT_PAGE_SIZE))
        .await?;
    Ok(Json(page))
}

async fn get_show(
    State(state): State<AppState>,
    extract::Path(id): extract::Path<i64>,
) -> Result<Json<ShowDetail>, AppError> {
    let detail = state
        .importer
        .show_detail(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("show {id}")))?;
    Ok(Json(detail))
}

async fn list_unimported(
    State(state): State<AppState>,
) -> Result<Json<Vec<SeriesResource>>, AppError> {
    Ok(Json(state.importer.list_unimported().await?))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ShowIdsBody {
    show_ids: Vec<i64>,
}

async fn import_shows(
    State(state): State<AppState>,
    extract::Json(body): extract::Json<ShowIdsBody>,
) -> Result<Json<ImportReport>, AppError> {
    let report = state.importer.import_shows(&body.show_ids).await?;
    info!(
        requested = body.show_ids.len(),
        imported = report.imported_count,
        "import request finished"
    );
    Ok(Json(report))
}

async fn delete_shows(
    State(state): State<AppState>,
    extract::Json(body): extract::Json<ShowIdsBody>,
) -> Result<Json<DeleteReport>, AppError> {
    let report = state.importer.delete_shows(&body.show_ids).await?;
    info!(
        requested = body.show_ids.len(),
        deleted = report.deleted_count,
        "delete request finished"
    );
    Ok(Json(report))
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

#[derive(Serialize, Deserialize)]
struct ModeBody {
    mode: String,
}

async fn get_import_mode(State(state): State<AppState>) -> Result<Json<ModeBody>, AppError> {
    let mode = state.settings.get_import_mode().await?;
    Ok(Json(ModeBody {
        mode: mode.to_string(),
    }))
}

async fn set_import_mode(
    State(state): State<AppState>,
    extract::Json(body): extract::Json<ModeBody>,
) -> Result<Json<ModeBody>, AppError> {
    let mode = state.settings.set_import_mode(&body.mode).await?;
    state.poller.mode_changed();
    info!(mode = %mode, "import mode changed");
    Ok(Json(ModeBody {
        mode: mode.to_string(),
    }))
}

#[derive(Serialize, Deserialize)]
struct IntervalBody {
    interval: i64,
}

async fn get_polling_interval(
    State(state): State<AppState>,
) -> Result<Json<IntervalBody>, AppError> {
    let interval = state.settings.get_polling_interval().await?;
    Ok(Json(IntervalBody {
        interval: interval.as_secs() as i64,
    }))
}

async fn set_polling_interval(
    State(state): State<AppState>,
    extract::Json(body): extract::Json<IntervalBody>,
) -> Result<Json<IntervalBody>, AppError> {
    let interval = state.settings.set_polling_interval(body.interval).await?;
    state.poller.update_interval(interval).await;
    Ok(Json(IntervalBody {
        interval: interval.as_secs() as i64,
    }))
}

// ---------------------------------------------------------------------------
// Polling task
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct ImportStatusResponse {
    state: String,
    mode: String,
    interval: u64,
}

async fn import_status(
    State(state): State<AppState>,
) -> Result<Json<ImportStatusResponse>, AppError> {
    let mode = state.settings.get_import_mode().await?;
    let interval = state.settings.get_polling_interval().await?;
    Ok(Json(ImportStatusResponse {
        state: state.poller.state().await.to_string(),
        mode: mode.to_string(),
        interval: interval.as_secs(),
    }))
}

#[derive(Serialize)]
struct RunResponse {
    triggered: bool,
}

async fn run_import(State(state): State<AppState>) -> (StatusCode, Json<RunResponse>) {
    let triggered = state.poller.trigger().await;
    (StatusCode::ACCEPTED, Json(RunResponse { triggered }))
}
