use axum::{
    body::Body,
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        FromRequestParts, Path, Query, State,
    },
    http::{header, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::Engine;
use log::{error, info};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc as StdArc;
use tower_http::cors::{Any, CorsLayer};

use crate::audio;
use crate::config::{ServerConfig, SessionConfig};
use crate::constants::{DEFAULT_OWNER_LIMIT, DEFAULT_RECENT_LIMIT};
use crate::db::{self, DynError};
use crate::error::AppError;
use crate::gateway::{GatewaySettings, SynthesisGateway};
use crate::generations;
use crate::models::{TtsRequest, User};
use crate::regenerate::{self, Phase, Regenerator, Rendered, ReplayMode};
use crate::sessions;
use crate::stats;
use crate::users::{self, LoginRequest, RegisterRequest};
use crate::voices;

// Shared state for all handlers
pub struct AppState {
    pub regenerator: Regenerator,
    pub session: SessionConfig,
    pub default_monthly_quota: i64,
}

impl AppState {
    pub fn new(regenerator: Regenerator, session: SessionConfig, default_monthly_quota: i64) -> Self {
        Self {
            regenerator,
            session,
            default_monthly_quota,
        }
    }

    fn pool(&self) -> &sqlx::SqlitePool {
        self.regenerator.pool()
    }

    fn session_cookie(&self, token: String) -> Cookie<'static> {
        Cookie::build((self.session.cookie_name.clone(), token))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.session.secure_cookie)
            .max_age(cookie::time::Duration::days(self.session.ttl_days))
            .build()
    }

    /// Matches the issued cookie's name and path so browsers drop it
    fn removal_cookie(&self) -> Cookie<'static> {
        Cookie::build((self.session.cookie_name.clone(), ""))
            .path("/")
            .build()
    }

    fn session_token(&self, jar: &CookieJar) -> Option<String> {
        jar.get(&self.session.cookie_name)
            .map(|c| c.value().to_string())
            .filter(|v| !v.is_empty())
    }
}

type SharedState = StdArc<AppState>;

/// The authenticated caller, resolved from the session cookie on every request
pub struct CurrentUser(pub User);

impl FromRequestParts<SharedState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = state
            .session_token(&jar)
            .ok_or(AppError::AuthenticationRequired)?;
        let user_id = sessions::resolve(state.pool(), &token)
            .await?
            .ok_or(AppError::AuthenticationRequired)?;
        let user = users::find_by_id(state.pool(), user_id)
            .await?
            .ok_or(AppError::AuthenticationRequired)?;
        Ok(CurrentUser(user))
    }
}

/// Build the HTTP router over an initialised state
pub fn build_router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/register", post(register_handler))
        .route("/api/login", post(login_handler))
        .route("/api/logout", post(logout_handler))
        .route("/api/user", get(user_handler))
        .route("/api/voices", get(voices_handler))
        .route("/api/voices/usage", get(voice_usage_handler))
        .route("/api/text-to-speech", post(tts_handler))
        .route("/api/generations", get(recent_generations_handler))
        .route("/api/user/generations", get(user_generations_handler))
        .route("/api/generations/{id}", delete(delete_generation_handler))
        .route("/api/generations/{id}/audio", get(audio_handler))
        .route("/api/generations/{id}/download", get(download_handler))
        .route(
            "/api/generations/{id}/increment-download",
            post(increment_download_handler),
        )
        .route("/api/user/stats", get(user_stats_handler))
        .route("/api/status", get(status_handler))
        .layer(cors)
        .with_state(state)
}

/// Open the datastore, wire up the provider and assemble the shared state
pub async fn build_state(config: &ServerConfig) -> Result<SharedState, DynError> {
    let pool = db::open_pool(
        &config.database.path,
        config.database.max_connections,
        config.database.acquire_timeout(),
    )
    .await?;
    db::init_database_schema(&pool).await?;

    let purged = sessions::purge_expired(&pool).await?;
    if purged > 0 {
        info!("Purged {} expired sessions", purged);
    }

    let gateway = SynthesisGateway::new(gateway_settings(config)?)?;
    Ok(StdArc::new(AppState::new(
        Regenerator::new(pool, gateway),
        config.session.clone(),
        config.users.default_monthly_quota,
    )))
}

pub fn gateway_settings(config: &ServerConfig) -> Result<GatewaySettings, DynError> {
    Ok(GatewaySettings {
        base_url: config.provider.base_url.clone(),
        api_key: config.provider.resolve_api_key()?,
        model_id: config.provider.model_id.clone(),
        output_format: config.provider.output_format.clone(),
        timeout: config.provider.timeout(),
    })
}

/// Run the server until it fails (for the serve command)
pub fn serve(config: ServerConfig) -> Result<(), DynError> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let state = build_state(&config).await?;
        let app = build_router(state);

        let addr = format!("{}:{}", config.bind, config.port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| format!("Failed to bind to {}: {}", addr, e))?;
        info!("Listening on: http://{}", addr);

        axum::serve(listener, app)
            .await
            .map_err(|e| format!("Server error: {}", e))?;
        Ok::<(), DynError>(())
    })
}

fn parse_id(path: Result<Path<i64>, PathRejection>) -> Result<i64, AppError> {
    path.map(|Path(id)| id)
        .map_err(|e| AppError::Validation(format!("Invalid generation id: {}", e.body_text())))
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    limit: Option<u64>,
}

fn parse_limit(query: Result<Query<ListQuery>, QueryRejection>, default: u64) -> Result<u64, AppError> {
    let Query(q) = query.map_err(|e| AppError::Validation(e.body_text()))?;
    Ok(generations::clamp_limit(q.limit, default))
}

fn audio_response(rendered: Rendered) -> Response {
    let filename = audio::download_filename(rendered.record.id, &rendered.record.format);
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, rendered.audio.content_type),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
            (header::CACHE_CONTROL, "no-store".to_string()),
        ],
        Body::from(rendered.audio.bytes),
    )
        .into_response()
}

async fn register_handler(
    State(state): State<SharedState>,
    jar: CookieJar,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(req) = body.map_err(|e| AppError::Validation(e.body_text()))?;
    let user = users::register(state.pool(), req, state.default_monthly_quota).await?;
    let ttl = chrono::Duration::days(state.session.ttl_days);
    let token = sessions::create(state.pool(), user.id, ttl).await?;
    Ok((
        StatusCode::CREATED,
        jar.add(state.session_cookie(token)),
        Json(user),
    )
        .into_response())
}

async fn login_handler(
    State(state): State<SharedState>,
    jar: CookieJar,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(req) = body.map_err(|e| AppError::Validation(e.body_text()))?;
    let user = users::authenticate(state.pool(), req).await?;
    let ttl = chrono::Duration::days(state.session.ttl_days);
    let token = sessions::create(state.pool(), user.id, ttl).await?;
    info!("User {} logged in", user.username);
    Ok((jar.add(state.session_cookie(token)), Json(user)).into_response())
}

async fn logout_handler(
    State(state): State<SharedState>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    if let Some(token) = state.session_token(&jar) {
        sessions::delete(state.pool(), &token).await?;
    }
    Ok((
        jar.remove(state.removal_cookie()),
        Json(json!({ "success": true })),
    )
        .into_response())
}

async fn user_handler(CurrentUser(user): CurrentUser) -> Json<User> {
    Json(user)
}

async fn voices_handler(State(state): State<SharedState>) -> Result<Response, AppError> {
    let catalog = voices::refresh_catalog(state.pool(), state.regenerator.gateway()).await?;
    Ok(Json(catalog).into_response())
}

async fn voice_usage_handler(State(state): State<SharedState>) -> Result<Response, AppError> {
    let usage = stats::voice_usage_list(state.pool()).await?;
    Ok(Json(usage).into_response())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TtsResponse {
    id: i64,
    audio: String,
    format: String,
    content_type: String,
    duration: f64,
    voice_name: String,
}

async fn tts_handler(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    body: Result<Json<TtsRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let label = format!("user:{}", user.id);
    regenerate::enter(&label, Phase::Received);
    let Json(req) = body.map_err(|e| AppError::Validation(e.body_text()))?;

    regenerate::enter(&label, Phase::Validating);
    let params = req.validate()?;

    let rendered = state.regenerator.generate(Some(user.id), params).await?;
    let response = TtsResponse {
        id: rendered.record.id,
        audio: base64::engine::general_purpose::STANDARD.encode(&rendered.audio.bytes),
        format: rendered.record.format,
        content_type: rendered.audio.content_type,
        duration: rendered.record.duration,
        voice_name: rendered.record.voice_name,
    };
    Ok(Json(response).into_response())
}

async fn recent_generations_handler(
    State(state): State<SharedState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Response, AppError> {
    let limit = parse_limit(query, DEFAULT_RECENT_LIMIT)?;
    let records = generations::list_recent(state.pool(), limit).await?;
    Ok(Json(records).into_response())
}

async fn user_generations_handler(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Response, AppError> {
    let limit = parse_limit(query, DEFAULT_OWNER_LIMIT)?;
    let records = generations::list_for_owner(state.pool(), user.id, limit).await?;
    Ok(Json(records).into_response())
}

async fn audio_handler(
    State(state): State<SharedState>,
    CurrentUser(_user): CurrentUser,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Response, AppError> {
    let id = parse_id(path)?;
    let rendered = state.regenerator.replay(id, ReplayMode::Playback).await?;
    Ok(audio_response(rendered))
}

async fn download_handler(
    State(state): State<SharedState>,
    CurrentUser(_user): CurrentUser,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Response, AppError> {
    let id = parse_id(path)?;
    let rendered = state.regenerator.replay(id, ReplayMode::Download).await?;
    Ok(audio_response(rendered))
}

async fn increment_download_handler(
    State(state): State<SharedState>,
    CurrentUser(_user): CurrentUser,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Response, AppError> {
    let id = parse_id(path)?;
    generations::increment_download_count(state.pool(), id).await?;
    let record = generations::get(state.pool(), id).await?;
    Ok(Json(json!({ "success": true, "downloadCount": record.download_count })).into_response())
}

async fn delete_generation_handler(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Response, AppError> {
    let id = parse_id(path)?;
    let record = generations::get(state.pool(), id).await?;
    if record.owner_id != Some(user.id) {
        return Err(AppError::AuthorizationDenied(
            "You can only delete your own generations".to_string(),
        ));
    }
    generations::delete(state.pool(), id).await?;
    info!("User {} deleted generation {}", user.id, id);
    Ok(Json(json!({ "success": true })).into_response())
}

async fn user_stats_handler(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
) -> Result<Response, AppError> {
    let summary = stats::user_summary(state.pool(), &user).await?;
    Ok(Json(summary).into_response())
}

async fn status_handler(State(state): State<SharedState>) -> Response {
    match state.regenerator.gateway().check_connection().await {
        Ok(()) => Json(json!({
            "status": "connected",
            "message": "API connection successful",
        }))
        .into_response(),
        Err(e) => {
            error!("Provider status check failed: {}", e);
            (
                StatusCode::BAD_GATEWAY,
                Json(json!({
                    "status": "error",
                    "message": "API connection failed",
                })),
            )
                .into_response()
        }
    }
}
