//! HTTP server for fortunes.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/fortune/` | Random fortune (`jars`, `sw`, `outputfmt` query) |
//! | `GET`  | `/fortune/{jar}` | Random fortune from one jar |
//! | `GET`  | `/fortune/{jar}/{index}` | Fortune by id |
//! | `GET`  | `/info/` | Per-jar statistics (`jars`, `outputfmt`) |
//! | `GET`  | `/fortuneweb/` | HTML browse page (`jar`, `jarid`) |
//! | `GET`  | `/` | Help (text, or HTML with `outputfmt=html`) |
//! | `GET`  | `/asset/*` | Static files from `[server].asset_dir` |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "not_found", "message": "jar not found: news" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404), `internal` (500).
//!
//! # CORS
//!
//! Fortune responses allow every origin so the API can be embedded in other
//! sites.

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::db;
use crate::error::FortuneError;
use crate::info;
use crate::models::Fortune;
use crate::render::{self, OutputFormat};
use crate::select::{self, SelectionMode};
use crate::store::JarStore;

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub store: JarStore,
    pub config: Arc<Config>,
}

/// Starts the HTTP server and serves until the process is terminated.
///
/// `port` overrides `[server].port`.
pub async fn run_server(config: &Config, port: Option<u16>) -> anyhow::Result<()> {
    let bind_addr = config.bind_addr(port);
    let store = JarStore::new(db::connect(config).await?);

    let state = AppState {
        store,
        config: Arc::new(config.clone()),
    };
    let app = router(state);

    println!("Listening on http://{}", bind_addr);
    tracing::info!(addr = %bind_addr, db = %config.db.path.display(), "fortune server starting");

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let fortune_routes = Router::new()
        .route("/fortune", get(handle_fortune))
        .route("/fortune/", get(handle_fortune))
        .route("/fortune/{jar}", get(handle_jar_fortune))
        .route("/fortune/{jar}/", get(handle_jar_fortune))
        .route("/fortune/{jar}/{index}", get(handle_indexed_fortune))
        .layer(cors);

    let assets = ServeDir::new(&state.config.server.asset_dir);

    Router::new()
        .merge(fortune_routes)
        .route("/info", get(handle_info))
        .route("/info/", get(handle_info))
        .route("/fortuneweb", get(handle_fortuneweb))
        .route("/fortuneweb/", get(handle_fortuneweb))
        .route("/health", get(handle_health))
        .route("/", get(handle_root))
        .nest_service("/asset", assets)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ============ Error response ============

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

/// Inner error detail with a machine-readable code and human-readable message.
#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

/// Constructs a 400 Bad Request error.
fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

/// Constructs a 404 Not Found error.
fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found".to_string(),
        message: message.into(),
    }
}

fn internal(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: message.into(),
    }
}

impl From<FortuneError> for AppError {
    fn from(err: FortuneError) -> Self {
        if err.is_not_found() {
            return not_found(err.to_string());
        }
        match err {
            FortuneError::InvalidJarName(_)
            | FortuneError::EmptyPattern
            | FortuneError::InvalidPattern(_) => bad_request(err.to_string()),
            other => {
                tracing::error!(error = %other, "request failed");
                internal(other.to_string())
            }
        }
    }
}

// ============ Request parsing ============

/// Query string accepted by the `/fortune` routes.
#[derive(Debug, Default, Deserialize)]
struct FortuneParams {
    /// Comma-separated jar names.
    jars: Option<String>,
    /// Switch letters: `e` uniform jar choice, `c` show the jar name.
    sw: Option<String>,
    outputfmt: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct InfoParams {
    jars: Option<String>,
    outputfmt: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PageParams {
    jar: Option<String>,
    jarid: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct HelpParams {
    outputfmt: Option<String>,
}

#[derive(Debug, Default, Clone, Copy)]
struct Switches {
    uniform: bool,
    show_jar: bool,
}

impl Switches {
    fn parse(sw: Option<&str>) -> Self {
        let sw = sw.unwrap_or_default();
        Switches {
            uniform: sw.contains('e'),
            show_jar: sw.contains('c'),
        }
    }

    fn mode(self) -> SelectionMode {
        if self.uniform {
            SelectionMode::Uniform
        } else {
            SelectionMode::Weighted
        }
    }
}

fn split_jars(jars: Option<&str>) -> Vec<String> {
    jars.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Jar names in URLs are limited to word characters and `-`.
fn validate_jar_name(jar: &str) -> Result<(), AppError> {
    let valid = !jar.is_empty()
        && jar
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(FortuneError::InvalidJarName(jar.to_string()).into())
    }
}

fn parse_index(index: &str) -> Result<i64, AppError> {
    index
        .parse::<i64>()
        .ok()
        .filter(|id| *id >= 1)
        .ok_or_else(|| bad_request(format!("invalid fortune index: {:?}", index)))
}

fn fortune_response(fortune: &Fortune, format: OutputFormat, show_jar: bool) -> Response {
    (
        [(header::CONTENT_TYPE, format.content_type())],
        render::render_fortune(fortune, format, show_jar),
    )
        .into_response()
}

// ============ GET /fortune ============

/// Handler for `GET /fortune/`: choose a jar from `jars` (or all jars), then a fortune.
async fn handle_fortune(
    State(state): State<AppState>,
    Query(params): Query<FortuneParams>,
) -> Result<Response, AppError> {
    let switches = Switches::parse(params.sw.as_deref());
    let format = OutputFormat::from_name(params.outputfmt.as_deref());
    let jars = split_jars(params.jars.as_deref());

    let fortune = select::random_fortune(&state.store, &jars, switches.mode()).await?;
    Ok(fortune_response(&fortune, format, switches.show_jar))
}

/// Handler for `GET /fortune/{jar}`. The path jar overrides any `jars` query.
async fn handle_jar_fortune(
    State(state): State<AppState>,
    Path(jar): Path<String>,
    Query(params): Query<FortuneParams>,
) -> Result<Response, AppError> {
    validate_jar_name(&jar)?;
    let switches = Switches::parse(params.sw.as_deref());
    let format = OutputFormat::from_name(params.outputfmt.as_deref());

    let mut rng = OsRng;
    let fortune = select::draw_fortune(&state.store, &jar, &mut rng).await?;
    Ok(fortune_response(&fortune, format, switches.show_jar))
}

/// Handler for `GET /fortune/{jar}/{index}`: deterministic lookup.
async fn handle_indexed_fortune(
    State(state): State<AppState>,
    Path((jar, index)): Path<(String, String)>,
    Query(params): Query<FortuneParams>,
) -> Result<Response, AppError> {
    validate_jar_name(&jar)?;
    let id = parse_index(&index)?;
    let switches = Switches::parse(params.sw.as_deref());
    let format = OutputFormat::from_name(params.outputfmt.as_deref());

    let fortune = state.store.fortune(&jar, id).await?;
    Ok(fortune_response(&fortune, format, switches.show_jar))
}

// ============ GET /info ============

async fn handle_info(
    State(state): State<AppState>,
    Query(params): Query<InfoParams>,
) -> Result<Response, AppError> {
    let jars = split_jars(params.jars.as_deref());
    let infos = info::jars_info(&state.store, &jars).await?;

    let response = match OutputFormat::from_name(params.outputfmt.as_deref()) {
        OutputFormat::Json => (
            [(header::CONTENT_TYPE, OutputFormat::Json.content_type())],
            render::format_jar_stats_json(&infos),
        )
            .into_response(),
        _ => (
            [(header::CONTENT_TYPE, OutputFormat::Plain.content_type())],
            render::format_jar_stats(&infos),
        )
            .into_response(),
    };
    Ok(response)
}

// ============ GET /fortuneweb ============

/// Handler for the browse page. Lookups that find nothing render the page
/// with "No fortune exists." rather than an error status.
async fn handle_fortuneweb(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Html<String>, AppError> {
    let jar = params
        .jar
        .as_deref()
        .map(str::trim)
        .filter(|j| !j.is_empty() && *j != "(random)")
        .unwrap_or_default()
        .to_string();
    let jarid = params.jarid.as_deref().map(str::trim).unwrap_or_default().to_string();

    let mut rng = OsRng;
    let drawn = if !jar.is_empty() && !jarid.is_empty() {
        match jarid.parse::<i64>() {
            Ok(id) => state.store.fortune(&jar, id).await,
            Err(_) => Err(FortuneError::FortuneNotFound {
                jar: jar.clone(),
                id: 0,
            }),
        }
    } else if !jar.is_empty() {
        select::draw_fortune(&state.store, &jar, &mut rng).await
    } else {
        select::random_fortune(&state.store, &[], SelectionMode::Weighted).await
    };

    let fortune = match drawn {
        Ok(f) => Some(f),
        Err(e) if e.is_not_found() => None,
        Err(e) => return Err(e.into()),
    };

    let jars = state.store.list_jars().await?;
    Ok(Html(render::render_fortune_page(
        fortune.as_ref(),
        &jars,
        &jar,
        &jarid,
    )))
}

// ============ GET / ============

async fn handle_root(Query(params): Query<HelpParams>) -> Response {
    match OutputFormat::from_name(params.outputfmt.as_deref()) {
        OutputFormat::Html => Html(render::HELP_HTML).into_response(),
        _ => (
            [(header::CONTENT_TYPE, OutputFormat::Plain.content_type())],
            render::HELP_TEXT,
        )
            .into_response(),
    }
}

// ============ GET /health ============

/// JSON response body for `GET /health`.
#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
