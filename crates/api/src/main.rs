use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tradingagents_core::config::{ApiKeyStatus, Settings};
use tradingagents_core::domain::analysis::render_value;
use tradingagents_core::domain::report::{ReportListing, StockIndexEntry, StoredReport};
use tradingagents_core::storage::error::ReportStoreError;
use tradingagents_core::storage::reports::FsReportStore;
use tradingagents_core::storage::{ReportRepository, StoreResult};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let store = FsReportStore::new(&settings.reports_dir)?;
    tracing::info!(reports_dir = %store.root().display(), "report store ready");

    let state = AppState {
        store: Arc::new(store),
        settings: Arc::new(settings),
    };

    // The history UI is served from a different origin.
    let app = router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/config", get(get_config))
        .route("/stocks", get(list_stocks))
        .route(
            "/stocks/:symbol/reports",
            get(list_reports).post(create_report),
        )
        .route(
            "/reports/:symbol/:filename",
            get(get_report).delete(delete_report),
        )
        .route("/reports/:symbol/:filename/text", get(get_report_text))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    store: Arc<dyn ReportRepository>,
    settings: Arc<Settings>,
}

#[derive(Debug, Serialize)]
struct ApiConfig {
    llm_provider: String,
    llm_model: String,
    deep_think_model: String,
    quick_think_model: String,
    backend_url: String,
    api_keys: Vec<ApiKeyStatus>,
}

#[derive(Debug, Deserialize)]
struct SaveReportRequest {
    analysis_date: Value,
    #[serde(default = "empty_results")]
    results: Value,
}

#[derive(Debug, Serialize)]
struct SavedReport {
    filename: String,
    path: String,
}

fn empty_results() -> Value {
    Value::Object(serde_json::Map::new())
}

async fn get_config(State(state): State<AppState>) -> Json<ApiConfig> {
    let settings = &state.settings;
    Json(ApiConfig {
        llm_provider: settings.llm_provider.clone(),
        llm_model: settings.llm_model().to_string(),
        deep_think_model: settings.deep_think_model.clone(),
        quick_think_model: settings.quick_think_model.clone(),
        backend_url: settings.backend_url.clone(),
        api_keys: settings.api_key_statuses(),
    })
}

async fn list_stocks(
    State(state): State<AppState>,
) -> Result<Json<Vec<StockIndexEntry>>, StatusCode> {
    let stocks = with_store(&state, |store| store.list_stocks()).await?;
    Ok(Json(stocks))
}

async fn list_reports(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<Vec<ReportListing>>, StatusCode> {
    let reports = with_store(&state, move |store| store.list_reports(&symbol)).await?;
    Ok(Json(reports))
}

async fn create_report(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Json(req): Json<SaveReportRequest>,
) -> Result<(StatusCode, Json<SavedReport>), StatusCode> {
    let analysis_date = render_value(&req.analysis_date);
    let path = with_store(&state, move |store| {
        store.save(&symbol, &analysis_date, &req.results)
    })
    .await?;

    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok((
        StatusCode::CREATED,
        Json(SavedReport {
            filename,
            path: path.display().to_string(),
        }),
    ))
}

async fn get_report(
    State(state): State<AppState>,
    Path((symbol, filename)): Path<(String, String)>,
) -> Result<Json<StoredReport>, StatusCode> {
    let report = with_store(&state, move |store| {
        let path = store.report_path(&symbol, &filename)?;
        store.load(&path)
    })
    .await?;
    Ok(Json(report))
}

async fn get_report_text(
    State(state): State<AppState>,
    Path((symbol, filename)): Path<(String, String)>,
) -> Result<String, StatusCode> {
    with_store(&state, move |store| {
        let path = store.report_path(&symbol, &filename)?;
        store.load_text(&path)
    })
    .await
}

async fn delete_report(
    State(state): State<AppState>,
    Path((symbol, filename)): Path<(String, String)>,
) -> Result<StatusCode, StatusCode> {
    with_store(&state, move |store| {
        let path = store.report_path(&symbol, &filename)?;
        store.delete(&path)
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Runs a blocking store call off the async runtime and maps failures to HTTP statuses.
async fn with_store<T, F>(state: &AppState, f: F) -> Result<T, StatusCode>
where
    T: Send + 'static,
    F: FnOnce(&dyn ReportRepository) -> StoreResult<T> + Send + 'static,
{
    let store = Arc::clone(&state.store);
    tokio::task::spawn_blocking(move || f(store.as_ref()))
        .await
        .map_err(|e| {
            let err = anyhow::Error::new(e).context("report store task panicked");
            sentry_anyhow::capture_anyhow(&err);
            tracing::error!(error = %err, "report store call failed");
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .map_err(status_for)
}

fn status_for(err: ReportStoreError) -> StatusCode {
    if err.is_not_found() {
        tracing::debug!(error = %err, "report not found");
        return StatusCode::NOT_FOUND;
    }
    if err.is_invalid_input() {
        tracing::debug!(error = %err, "rejected report request");
        return StatusCode::BAD_REQUEST;
    }

    let err = anyhow::Error::new(err);
    sentry_anyhow::capture_anyhow(&err);
    tracing::error!(error = %err, "report store call failed");
    StatusCode::INTERNAL_SERVER_ERROR
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
