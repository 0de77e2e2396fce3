//! HTTP boundary.
//!
//! Routes, session-cookie extraction, and the mapping from core outcomes to
//! status codes. Handlers stay thin: they validate the request shape, push
//! all filesystem and image work onto the blocking pool, and stream the
//! resulting file. Error bodies are fixed strings: an observer learns
//! whether a request worked, never what the filesystem looks like.
//!
//! | Outcome | Status |
//! |---|---|
//! | malformed / unsafe identifiers | 400 |
//! | missing album, photo, or source file | 404 |
//! | unreadable source, cache write failure | 500 |
//! | missing or invalid session | 401 (pages render the login form) |

use std::io::ErrorKind;
use std::sync::Arc;

use axum::{
    Json, Router, async_trait,
    body::{Body, Bytes},
    extract::{FromRequestParts, Path as UrlPath, Query, State},
    http::{HeaderMap, StatusCode, header, request::Parts},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::task;
use tokio_util::io::ReaderStream;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::auth::{self, User};
use crate::config::Settings;
use crate::library;
use crate::paths::{self, VariantKind};
use crate::store::{ArtifactStore, StoreError};
use crate::web;

const SESSION_COOKIE: &str = "photoshelf_session";

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub store: Arc<ArtifactStore>,
}

/// Build the application router, nested under the configured root path.
pub fn app(settings: Arc<Settings>, store: Arc<ArtifactStore>) -> Router {
    let root_path = settings.root_path.clone();
    let routes = Router::new()
        .route("/", get(index))
        .route("/album/:album", get(album_view))
        .route("/health", get(health))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me))
        .route("/albums", get(albums_api))
        .route("/album/:album/contents", get(album_contents))
        .route("/thumbnails/:album/:photo", get(thumbnails))
        .route("/previews/:album/:photo", get(previews))
        .route("/download/:album/:photo", get(download))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { settings, store });

    if root_path.is_empty() {
        routes
    } else {
        Router::new().nest(&root_path, routes)
    }
}

// =========================================================================
// Errors and authentication
// =========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiError {
    Unauthorized,
    BadRequest,
    NotFound,
    Internal,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Not authenticated"),
            ApiError::BadRequest => (StatusCode::BAD_REQUEST, "Invalid path"),
            ApiError::NotFound => (StatusCode::NOT_FOUND, "Not found"),
            ApiError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "Internal error"),
        };
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

fn map_store_error(err: StoreError) -> ApiError {
    match err {
        StoreError::InvalidPath(_) => ApiError::BadRequest,
        StoreError::SourceNotFound => ApiError::NotFound,
        StoreError::SourceUnreadable(e) => {
            warn!(error = %e, "source image unreadable");
            ApiError::Internal
        }
        StoreError::CacheWriteFailed(e) => {
            warn!(error = %e, "cache write failed");
            ApiError::Internal
        }
    }
}

/// Extract the session user from the request's cookies.
fn session_user(headers: &HeaderMap, settings: &Settings) -> Option<User> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    let prefix = format!("{SESSION_COOKIE}=");
    let token = cookies
        .split(';')
        .map(str::trim)
        .find_map(|cookie| cookie.strip_prefix(prefix.as_str()))?;
    auth::verify_session_token(&settings.session_secret, token)
}

/// Require a valid session; rejects with 401.
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        session_user(&parts.headers, &state.settings)
            .map(CurrentUser)
            .ok_or(ApiError::Unauthorized)
    }
}

fn session_cookie(settings: &Settings, token: &str, max_age_secs: u64) -> String {
    format!(
        "{SESSION_COOKIE}={token}; Path={}; Max-Age={max_age_secs}; HttpOnly; SameSite=Lax",
        settings.cookie_path()
    )
}

// =========================================================================
// Pages
// =========================================================================

async fn index(
    State(state): State<AppState>,
    user: Option<CurrentUser>,
) -> Result<Response, ApiError> {
    let Some(CurrentUser(user)) = user else {
        return Ok(login_page_response(&state, false, StatusCode::OK));
    };

    let settings = Arc::clone(&state.settings);
    let cards = task::spawn_blocking(move || {
        library::list_albums(&settings.source_dir)
            .into_iter()
            .map(|name| {
                let cover = library::list_photos(&settings.source_dir.join(&name))
                    .into_iter()
                    .next();
                web::AlbumCard { name, cover }
            })
            .collect::<Vec<_>>()
    })
    .await
    .map_err(|_| ApiError::Internal)?;

    let page = web::album_index(&state.settings.root_path, &user.username, &cards);
    Ok(Html(page.into_string()).into_response())
}

async fn album_view(
    State(state): State<AppState>,
    UrlPath(album): UrlPath<String>,
    user: Option<CurrentUser>,
) -> Result<Response, ApiError> {
    let Some(CurrentUser(user)) = user else {
        return Ok(Redirect::to(state.settings.cookie_path()).into_response());
    };

    let settings = Arc::clone(&state.settings);
    let album_name = album.clone();
    let photos = task::spawn_blocking(move || {
        let album_dir = paths::resolve_album_dir(&settings.source_dir, &album_name)
            .map_err(|_| ApiError::BadRequest)?;
        album_dir
            .is_dir()
            .then(|| library::list_photos(&album_dir))
            .ok_or(ApiError::NotFound)
    })
    .await
    .map_err(|_| ApiError::Internal)??;

    let page = web::album_page(&state.settings.root_path, &user.username, &album, &photos);
    Ok(Html(page.into_string()).into_response())
}

fn login_page_response(state: &AppState, failed: bool, status: StatusCode) -> Response {
    let page = web::login_page(&state.settings.root_path, failed);
    (status, Html(page.into_string())).into_response()
}

// =========================================================================
// Session endpoints
// =========================================================================

#[derive(Deserialize)]
struct Credentials {
    username: String,
    password: String,
}

/// Log in with a JSON body (API clients) or a form body (the login page).
async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let is_json = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json"));

    let creds: Credentials = if is_json {
        serde_json::from_slice(&body).map_err(|_| ApiError::BadRequest)?
    } else {
        serde_urlencoded::from_bytes(&body).map_err(|_| ApiError::BadRequest)?
    };

    let settings = Arc::clone(&state.settings);
    let username = creds.username.trim().to_string();
    let user = task::spawn_blocking(move || {
        auth::authenticate(&settings.users_file, &username, &creds.password)
    })
    .await
    .map_err(|_| ApiError::Internal)?;

    let Some(user) = user else {
        return Ok(if is_json {
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "ok": false, "detail": "Invalid username/password" })),
            )
                .into_response()
        } else {
            login_page_response(&state, true, StatusCode::UNAUTHORIZED)
        });
    };

    let token = auth::create_session_token(
        &state.settings.session_secret,
        &user.username,
        auth::SESSION_TTL,
    );
    let cookie = session_cookie(&state.settings, &token, auth::SESSION_TTL.as_secs());

    Ok(if is_json {
        (
            [(header::SET_COOKIE, cookie)],
            Json(json!({ "ok": true, "username": user.username })),
        )
            .into_response()
    } else {
        (
            [(header::SET_COOKIE, cookie)],
            Redirect::to(state.settings.cookie_path()),
        )
            .into_response()
    })
}

async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let cookie = session_cookie(&state.settings, "", 0);
    let wants_html = headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|accept| accept.contains("text/html"));

    if wants_html {
        (
            [(header::SET_COOKIE, cookie)],
            Redirect::to(state.settings.cookie_path()),
        )
            .into_response()
    } else {
        ([(header::SET_COOKIE, cookie)], Json(json!({ "ok": true }))).into_response()
    }
}

async fn me(CurrentUser(user): CurrentUser) -> Json<serde_json::Value> {
    Json(json!({ "username": user.username }))
}

// =========================================================================
// JSON API
// =========================================================================

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

#[derive(Serialize)]
struct AlbumSummary {
    id: String,
    title: String,
}

async fn albums_api(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> Result<Json<Vec<AlbumSummary>>, ApiError> {
    let settings = Arc::clone(&state.settings);
    let albums = task::spawn_blocking(move || library::list_albums(&settings.source_dir))
        .await
        .map_err(|_| ApiError::Internal)?;

    Ok(Json(
        albums
            .into_iter()
            .map(|name| AlbumSummary {
                id: name.clone(),
                title: name,
            })
            .collect(),
    ))
}

async fn album_contents(
    State(state): State<AppState>,
    UrlPath(album): UrlPath<String>,
    _user: CurrentUser,
) -> Result<Json<Vec<String>>, ApiError> {
    let settings = Arc::clone(&state.settings);
    task::spawn_blocking(move || {
        let album_dir = paths::resolve_album_dir(&settings.source_dir, &album)
            .map_err(|_| ApiError::BadRequest)?;
        album_dir
            .is_dir()
            .then(|| library::list_photos(&album_dir))
            .ok_or(ApiError::NotFound)
    })
    .await
    .map_err(|_| ApiError::Internal)?
    .map(Json)
}

// =========================================================================
// Image endpoints
// =========================================================================

#[derive(Deserialize, Default)]
struct VariantQuery {
    /// Request the enhanced rendition (`?enhanced=true`).
    #[serde(default)]
    enhanced: bool,
}

async fn thumbnails(
    State(state): State<AppState>,
    UrlPath((album, photo)): UrlPath<(String, String)>,
    Query(query): Query<VariantQuery>,
    _user: CurrentUser,
) -> Result<Response, ApiError> {
    serve_variant(state, album, photo, VariantKind::Thumbnail, query.enhanced, false).await
}

async fn previews(
    State(state): State<AppState>,
    UrlPath((album, photo)): UrlPath<(String, String)>,
    Query(query): Query<VariantQuery>,
    _user: CurrentUser,
) -> Result<Response, ApiError> {
    serve_variant(state, album, photo, VariantKind::Preview, query.enhanced, false).await
}

async fn download(
    State(state): State<AppState>,
    UrlPath((album, photo)): UrlPath<(String, String)>,
    Query(query): Query<VariantQuery>,
    _user: CurrentUser,
) -> Result<Response, ApiError> {
    serve_variant(state, album, photo, VariantKind::Full, query.enhanced, true).await
}

/// Resolve, ensure, and stream one artifact.
///
/// All path resolution, cache checks, and (on a miss) the decode/encode run
/// on the blocking pool so a slow encode never stalls unrelated requests.
async fn serve_variant(
    state: AppState,
    album: String,
    photo: String,
    kind: VariantKind,
    enhanced: bool,
    attachment: bool,
) -> Result<Response, ApiError> {
    let settings = Arc::clone(&state.settings);
    let store = Arc::clone(&state.store);
    let filename = photo.clone();

    let served = task::spawn_blocking(move || {
        let paths = paths::resolve(
            &settings.source_dir,
            &settings.cache_dir,
            &album,
            &photo,
            enhanced,
            kind,
        )
        .map_err(|_| ApiError::BadRequest)?;

        if !paths.source_path.is_file() {
            return Err(ApiError::NotFound);
        }

        store.ensure(&paths, kind, enhanced).map_err(map_store_error)
    })
    .await
    .map_err(|_| ApiError::Internal)??;

    let file = tokio::fs::File::open(&served).await.map_err(|e| match e.kind() {
        ErrorKind::NotFound => ApiError::NotFound,
        _ => ApiError::Internal,
    })?;

    let mut builder =
        Response::builder().header(header::CONTENT_TYPE, paths::content_type_for(&served));
    if attachment {
        let safe_name = filename.replace('"', "");
        builder = builder.header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{safe_name}\""),
        );
    }
    builder
        .body(Body::from_stream(ReaderStream::new(file)))
        .map_err(|_| ApiError::Internal)
}
