use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use session::{
    controller::ReviewEvent,
    dataset::{CsvFile, ItemSource},
    export::EXPORT_FILE_NAME,
    ReviewSession, SessionError,
};
use shared::{
    domain::Rating,
    error::{ApiError, ErrorCode},
};
use storage::Storage;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod app_state;
mod config;
mod render;

use app_state::AppState;
use config::{load_settings, prepare_database_url};
use render::PageSettings;

// Action forms carry no fields.
const MAX_FORM_BYTES: usize = 16 * 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let settings = load_settings();
    let database_url = prepare_database_url(&settings.database_url)?;
    let storage = Storage::new(&database_url).await.map_err(|error| {
        error!(
            %database_url,
            %error,
            "failed to open SQLite database; verify parent directory exists and permissions are correct"
        );
        error
    })?;

    let review = ReviewSession::new(storage, CsvFile::new(&settings.dataset_path))
        .with_batch_cap(settings.batch_cap);
    let page = PageSettings {
        title: settings.page_title.clone(),
        image_width: settings.image_width,
    };
    let app = build_router(Arc::new(AppState::new(review, page)));

    let addr: SocketAddr = settings
        .server_bind
        .parse()
        .with_context(|| format!("invalid bind address '{}'", settings.server_bind))?;
    info!(
        %addr,
        dataset = %settings.dataset_path.display(),
        batch_cap = settings.batch_cap,
        "review server listening"
    );
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(review_page))
        .route("/actions/good", post(choose_good))
        .route("/actions/bad", post(choose_bad))
        .route("/actions/submit", post(submit))
        .route("/actions/skip", post(skip))
        .route("/ratings.csv", get(download_ratings))
        .route("/healthz", get(healthz))
        .layer(RequestBodyLimitLayer::new(MAX_FORM_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz(
    State(state): State<Arc<AppState>>,
) -> Result<&'static str, (StatusCode, Json<ApiError>)> {
    state.review.storage().health_check().await.map_err(|e| {
        error!(error = %e, "health check failed");
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ApiError::new(ErrorCode::Unavailable, e.to_string())),
        )
    })?;
    Ok("ok")
}

async fn review_page(State(state): State<Arc<AppState>>) -> Response {
    let mut session = state.session.lock().await;
    match state.review.evaluate(&session).await {
        Ok(pass) => {
            let html = render::review_page(&state.page, &pass.view);
            *session = pass.state;
            Html(html).into_response()
        }
        Err(err) => failure_response(&state, err),
    }
}

async fn choose_good(State(state): State<Arc<AppState>>) -> Response {
    run_event(&state, ReviewEvent::Choose(Rating::Good)).await
}

async fn choose_bad(State(state): State<Arc<AppState>>) -> Response {
    run_event(&state, ReviewEvent::Choose(Rating::Bad)).await
}

async fn submit(State(state): State<Arc<AppState>>) -> Response {
    run_event(&state, ReviewEvent::Submit).await
}

async fn skip(State(state): State<Arc<AppState>>) -> Response {
    run_event(&state, ReviewEvent::Skip).await
}

/// Commits `event` with the session locked, then sends the browser back to
/// the review page, which computes the next pass.
async fn run_event(state: &AppState, event: ReviewEvent) -> Response {
    let mut session = state.session.lock().await;
    match state.review.dispatch(event, &session).await {
        Ok(next) => {
            *session = next;
            Redirect::to("/").into_response()
        }
        Err(err) => failure_response(state, err),
    }
}

fn failure_response(state: &AppState, err: SessionError) -> Response {
    let source = state.review.source().describe();
    let status = match &err {
        SessionError::Dataset(dataset_err) if dataset_err.is_source_not_found() => {
            warn!(%source, error = %err, "dataset source missing");
            StatusCode::NOT_FOUND
        }
        SessionError::Dataset(_) => {
            warn!(%source, error = %err, "dataset could not be loaded");
            StatusCode::UNPROCESSABLE_ENTITY
        }
        SessionError::Store(_) | SessionError::Export(_) => {
            error!(error = %err, "review pass failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Html(render::error_page(&state.page, &err.to_string()))).into_response()
}

async fn download_ratings(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, Json<ApiError>)> {
    let csv = state.review.export_csv().await.map_err(|e| {
        error!(error = %e, "ratings export failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiError::new(ErrorCode::Internal, e.to_string())),
        )
    })?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/csv; charset=utf-8"),
    );
    if let Ok(value) =
        HeaderValue::from_str(&format!("attachment; filename=\"{EXPORT_FILE_NAME}\""))
    {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }

    Ok((StatusCode::OK, headers, csv))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
