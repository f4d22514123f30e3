use std::{convert::Infallible, sync::Arc};

use hyper::{body::Incoming, Method, Request, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, warn};

use super::response::{self, HttpResponse};
use crate::app::App;

#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    Preflight,
    Health,
    Login,
    Callback,
    Me,
    Profile,
    UserPlaylists,
    Generate,
    GenerateCustom,
    CreateFromTracks,
    History,
    DeleteHistory(String),
}

impl Route {
    pub fn requires_auth(&self) -> bool {
        !matches!(
            self,
            Route::Preflight | Route::Health | Route::Login | Route::Callback
        )
    }
}

pub fn map_request_to_route(method: &Method, path: &str) -> Option<Route> {
    if *method == Method::OPTIONS {
        return Some(Route::Preflight);
    }

    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    match (method, segments.as_slice()) {
        (&Method::GET, ["health"]) => Some(Route::Health),
        (&Method::GET, ["auth", "login"]) => Some(Route::Login),
        (&Method::GET, ["auth", "callback"]) => Some(Route::Callback),
        (&Method::GET, ["auth", "me"]) => Some(Route::Me),
        (&Method::GET, ["user", "profile"]) => Some(Route::Profile),
        (&Method::GET, ["user", "playlists"]) => Some(Route::UserPlaylists),
        (&Method::POST, ["playlist", "generate"]) => Some(Route::Generate),
        (&Method::POST, ["playlist", "custom"]) => Some(Route::GenerateCustom),
        (&Method::POST, ["playlist", "create-from-tracks"]) => Some(Route::CreateFromTracks),
        (&Method::GET, ["playlist", "history"]) => Some(Route::History),
        (&Method::DELETE, ["playlist", "history", id]) => Some(Route::DeleteHistory(id.to_string())),
        _ => None,
    }
}

pub async fn handle(app: Arc<App>, req: Request<Incoming>) -> Result<HttpResponse, Infallible> {
    let response = match map_request_to_route(req.method(), req.uri().path()) {
        Some(route) => dispatch(&app, route, req).await,
        None => response::failure(StatusCode::NOT_FOUND, "Not found"),
    };
    Ok(response::with_cors(response))
}

async fn dispatch(app: &App, route: Route, req: Request<Incoming>) -> HttpResponse {
    if !route.requires_auth() {
        return match route {
            Route::Preflight => response::no_content(),
            Route::Health => response::json(
                StatusCode::OK,
                &json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }),
            ),
            Route::Login => login(app).await,
            _ => callback(app, req.uri().query()).await,
        };
    }

    let claims = match app.sessions.authenticate(req.headers()) {
        Ok(claims) => claims,
        Err(e) => return response::failure(StatusCode::UNAUTHORIZED, &e.to_string()),
    };
    let user_id = claims.sub.as_str();

    match route {
        Route::Me => me(app, user_id).await,
        Route::Profile => profile(app, user_id).await,
        Route::UserPlaylists => user_playlists(app, user_id).await,
        Route::Generate => generate(app, user_id).await,
        Route::GenerateCustom => generate_custom(app, user_id, req.into_body()).await,
        Route::CreateFromTracks => create_from_tracks(app, user_id, req.into_body()).await,
        Route::History => history(app, user_id).await,
        Route::DeleteHistory(record_id) => delete_history(app, user_id, &record_id).await,
        _ => response::failure(StatusCode::NOT_FOUND, "Not found"),
    }
}

fn internal_error(e: impl std::fmt::Display + std::fmt::Debug) -> HttpResponse {
    error!("{e:?}");
    response::failure(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
}

// ── Auth ─────────────────────────────────────────────────────────────────────

async fn login(app: &App) -> HttpResponse {
    match app.begin_login().await {
        Ok(url) => response::redirect(&url),
        Err(e) => internal_error(e),
    }
}

async fn callback(app: &App, query: Option<&str>) -> HttpResponse {
    let params = response::parse_query(query);
    let Some(code) = params.get("code") else {
        return response::text(StatusCode::BAD_REQUEST, "Code is required");
    };
    let state = params.get("state").map(String::as_str).unwrap_or("");
    let frontend = &app.config.frontend_url;

    match app.complete_login(code, state).await {
        Ok(session) => {
            let user = serde_json::to_string(&session.user).unwrap_or_default();
            response::redirect(&format!(
                "{frontend}/auth/callback?token={}&user={}",
                session.token,
                urlencoding::encode(&user)
            ))
        }
        Err(e) => {
            warn!("Login failed: {e:#}");
            response::redirect(&format!("{frontend}/auth/callback?error=auth_failed"))
        }
    }
}

async fn me(app: &App, user_id: &str) -> HttpResponse {
    match app.user(user_id).await {
        Ok(Some(user)) => response::success(json!({ "user": user })),
        Ok(None) => response::failure(StatusCode::NOT_FOUND, "User not found"),
        Err(e) => internal_error(e),
    }
}

// ── Profile ──────────────────────────────────────────────────────────────────

async fn profile(app: &App, user_id: &str) -> HttpResponse {
    match app.music_profile(user_id).await {
        Ok(profile) => response::success(json!({ "profile": profile })),
        Err(e) => internal_error(e),
    }
}

async fn user_playlists(app: &App, user_id: &str) -> HttpResponse {
    match app.spotify_playlists(user_id).await {
        Ok(playlists) => response::success(json!({ "playlists": playlists })),
        Err(e) => internal_error(e),
    }
}

// ── Playlists ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CustomRequest {
    keywords: Option<String>,
    #[serde(default)]
    discovery_mode: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateFromTracksRequest {
    name: Option<String>,
    description: Option<String>,
    track_uris: Option<Vec<String>>,
    keywords: Option<String>,
}

async fn generate(app: &App, user_id: &str) -> HttpResponse {
    match app.generate(user_id).await {
        Ok(published) => response::success(json!({ "playlistUrl": published.external_url })),
        Err(e) => internal_error(e),
    }
}

async fn generate_custom(app: &App, user_id: &str, body: Incoming) -> HttpResponse {
    let request: CustomRequest = match response::read_json(body).await {
        Ok(request) => request,
        Err(e) => return response::failure(StatusCode::BAD_REQUEST, &format!("Invalid request body: {e}")),
    };
    let Some(keywords) = request.keywords.as_deref().map(str::trim).filter(|k| !k.is_empty()) else {
        return response::failure(StatusCode::BAD_REQUEST, "Keywords are required");
    };

    match app.generate_custom(user_id, keywords, request.discovery_mode).await {
        Ok(draft) => response::success(json!({
            "tracks": draft.tracks,
            "playlistConcept": {
                "name": draft.concept_name,
                "description": draft.concept_description,
            },
        })),
        Err(e) => internal_error(e),
    }
}

async fn create_from_tracks(app: &App, user_id: &str, body: Incoming) -> HttpResponse {
    let request: CreateFromTracksRequest = match response::read_json(body).await {
        Ok(request) => request,
        Err(e) => return response::failure(StatusCode::BAD_REQUEST, &format!("Invalid request body: {e}")),
    };
    let (Some(name), Some(track_uris)) = (request.name.filter(|n| !n.trim().is_empty()), request.track_uris) else {
        return response::failure(StatusCode::BAD_REQUEST, "Name and trackUris are required");
    };
    let description = request.description.unwrap_or_default();

    match app
        .create_from_tracks(user_id, &name, &description, &track_uris, request.keywords)
        .await
    {
        Ok(published) => response::success(json!({ "playlistUrl": published.external_url })),
        Err(e) => internal_error(e),
    }
}

async fn history(app: &App, user_id: &str) -> HttpResponse {
    match app.history(user_id).await {
        Ok(playlists) => response::success(json!({ "playlists": playlists })),
        Err(e) => internal_error(e),
    }
}

async fn delete_history(app: &App, user_id: &str, record_id: &str) -> HttpResponse {
    match app.delete_from_history(user_id, record_id).await {
        Ok(true) => response::success(json!({})),
        Ok(false) => response::failure(StatusCode::NOT_FOUND, "Playlist not found"),
        Err(e) => internal_error(e),
    }
}
