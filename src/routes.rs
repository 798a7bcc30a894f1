//! HTTP front door: dispatches by path prefix and method, attaches CORS
//! headers to every response.

use axum::body::Body;
use axum::extract::{Path, Query, Request, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, MethodRouter};
use axum::Router;
use serde::Deserialize;
use tokio_util::io::ReaderStream;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::archive;
use crate::errors::{AppError, AppResult};
use crate::relay::{publisher, subscriber};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let archive_route = format!("/{}/{{*rest}}", url_segment(&state.config.folder));

    Router::new()
        .route("/", get(catalog_handler))
        .route("/favicon.ico", get(favicon_handler))
        .route(&archive_route, get(archive_handler))
        .route("/{*path}", relay_method_router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn relay_method_router() -> MethodRouter<AppState> {
    get(relay_get).post(relay_post).fallback(|| async { StatusCode::OK })
}

fn url_segment(folder: &std::path::Path) -> String {
    folder.to_string_lossy().trim_matches('/').to_string()
}

async fn favicon_handler() -> StatusCode {
    StatusCode::OK
}

async fn catalog_handler(State(state): State<AppState>) -> AppResult<Html<String>> {
    let archived = archive::list_archived(&state.config.folder);
    let items = state.hub.advertised_paths();
    let folder_url = url_segment(&state.config.folder);
    let page = crate::catalog::render(&state.renderer, &folder_url, items, &archived)?;
    Ok(Html(page))
}

#[derive(Debug, Deserialize, Default)]
struct ArchiveParams {
    #[serde(default)]
    remove: bool,
    #[serde(default)]
    rename: bool,
    newname: Option<String>,
}

async fn archive_handler(
    State(state): State<AppState>,
    Path(rest): Path<String>,
    Query(params): Query<ArchiveParams>,
) -> Response {
    let root = &state.config.folder;

    if params.remove {
        if let Err(err) = archive::remove_file(root, &rest).await {
            warn!(file = %rest, error = %err, "archive remove failed");
        }
        return "OK".into_response();
    }

    if params.rename {
        let Some(newname) = params.newname.as_deref() else {
            warn!(file = %rest, "archive rename missing newname parameter");
            return "ERROR".into_response();
        };
        if let Err(err) = archive::rename_file(root, &rest, newname).await {
            warn!(file = %rest, error = %err, "archive rename failed");
        }
        return "OK".into_response();
    }

    serve_archived_file(root, &rest).await
}

async fn serve_archived_file(root: &std::path::Path, requested: &str) -> Response {
    let resolved = match archive::resolve_under_root(root, requested) {
        Ok(path) => path,
        Err(err) => return err_response(err),
    };
    match tokio::fs::File::open(&resolved).await {
        Ok(file) => {
            let content_type = mime_guess::from_path(&resolved).first_or_octet_stream();
            let stream = ReaderStream::new(file);
            Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, content_type.as_ref())
                .body(Body::from_stream(stream))
                .expect("failed to build archive file response")
        }
        Err(_) => err_response(AppError::NotFound),
    }
}

fn err_response(err: AppError) -> Response {
    err.into_response()
}

async fn relay_get(State(state): State<AppState>, Path(path): Path<String>) -> Response {
    let full_path = format!("/{path}");
    state.hub.ensure_path(&full_path);
    subscriber::handle(state, full_path).await
}

async fn relay_post(
    State(state): State<AppState>,
    Path(path): Path<String>,
    Query(params): Query<publisher::PublishParams>,
    request: Request,
) -> StatusCode {
    let full_path = format!("/{path}");
    state.hub.ensure_path(&full_path);
    publisher::handle(state, full_path, params, request.into_body()).await
}
