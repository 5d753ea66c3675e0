use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode, Uri},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio_util::io::ReaderStream;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::{
    config::ServerConfig,
    error::{BrowseError, Result},
    render,
    service::{BrowseService, Browsed},
    types::{DirectoryListing, LinkSet},
};

type SharedService = Arc<BrowseService>;

#[derive(Deserialize, Debug)]
struct PathQuery {
    path: Option<String>,
}

impl IntoResponse for BrowseError {
    fn into_response(self) -> Response {
        if self.is_not_found() {
            (StatusCode::NOT_FOUND, "Not Found").into_response()
        } else {
            error!("Request failed: {}", self);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        }
    }
}

/// Build the HTTP routes for a service
pub fn router(service: SharedService) -> Router {
    Router::new()
        .route("/", get(browse_handler))
        .route("/browse", get(browse_handler))
        .route("/browse/", get(browse_handler))
        .route("/browse/{*path}", get(browse_handler))
        .route("/get_links", get(links_handler))
        .route("/api/list", get(list_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

/// Bind and serve until the process is stopped
pub async fn serve(config: ServerConfig) -> Result<()> {
    let service = Arc::new(BrowseService::from_config(&config)?);
    let listener = TcpListener::bind(config.bind_addr).await?;

    info!("Serving files from: {}", config.root_dir.display());
    info!("Listening on: {} (public base URL {})", config.bind_addr, config.base_url);

    axum::serve(listener, router(service)).await?;
    Ok(())
}

/// The browse path as it appears on the wire, still percent-encoded
fn raw_browse_path(uri: &Uri) -> &str {
    let path = uri.path();
    path.strip_prefix("/browse").unwrap_or(path)
}

async fn browse_handler(State(service): State<SharedService>, uri: Uri) -> Response {
    match service.browse_encoded(raw_browse_path(&uri)).await {
        Ok(Browsed::Directory(listing)) => {
            Html(render::listing_page(&listing).into_string()).into_response()
        }
        Ok(Browsed::File { path, entry }) => match tokio::fs::File::open(&path).await {
            Ok(file) => {
                let mime_type = mime_guess::from_path(&path).first_or_octet_stream();
                let mut headers = HeaderMap::new();
                headers.insert(
                    header::CONTENT_TYPE,
                    HeaderValue::from_str(mime_type.as_ref())
                        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
                );
                if let Some(len) = entry.size_bytes {
                    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(len));
                }

                let body = Body::from_stream(ReaderStream::with_capacity(file, 1 << 16));
                (StatusCode::OK, headers, body).into_response()
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                BrowseError::not_found(entry.relative_path).into_response()
            }
            Err(e) => BrowseError::Io(e).into_response(),
        },
        Err(e) => e.into_response(),
    }
}

async fn links_handler(
    State(service): State<SharedService>,
    Query(query): Query<PathQuery>,
) -> Result<Json<LinkSet>> {
    let links = service.links(query.path.as_deref().unwrap_or("")).await?;
    Ok(Json(links))
}

async fn list_handler(
    State(service): State<SharedService>,
    Query(query): Query<PathQuery>,
) -> Result<Json<DirectoryListing>> {
    match service.browse(query.path.as_deref().unwrap_or("")).await? {
        Browsed::Directory(listing) => Ok(Json(listing)),
        Browsed::File { entry, .. } => Err(BrowseError::NotADirectory {
            path: entry.relative_path,
        }),
    }
}
