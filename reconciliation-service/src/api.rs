use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use session_energy::{domain::UsageRecord, engine::RecordQuery, DomainTimestamp, Engine, RoomReport};

use crate::cache::RoomCache;

#[derive(Clone)]
pub struct ApiState {
    pub cache: Arc<RoomCache>,
    pub engine: Engine,
    pub default_window_hours: f64,
}

#[derive(Debug)]
pub enum ApiError {
    NoData(String),
    BadRequest(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            ApiError::NoData(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
        };
        (status, Json(ErrorBody { error })).into_response()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RecordsParams {
    pub center: Option<String>,
    pub window_hours: Option<f64>,
    pub q: Option<String>,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/rooms", get(list_rooms))
        .route("/rooms/:room", get(get_room))
        .route("/rooms/:room/records", get(room_records))
        .with_state(state)
}

/// Bind and serve the query API in the background.
pub async fn serve(bind_addr: &str, state: ApiState) -> anyhow::Result<()> {
    let addr: SocketAddr = bind_addr
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid api.bind_addr: {e}"))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let app = router(state);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app.into_make_service()).await {
            tracing::error!(error = %e, "query api server error");
        }
    });
    tracing::info!(%addr, "query api listening");
    Ok(())
}

pub async fn list_rooms(State(state): State<ApiState>) -> Json<Vec<RoomReport>> {
    Json(state.cache.all().iter().map(|r| RoomReport::clone(r)).collect())
}

pub async fn get_room(State(state): State<ApiState>, Path(room): Path<String>) -> Result<Json<RoomReport>, ApiError> {
    state
        .cache
        .get(&room)
        .map(|r| Json(RoomReport::clone(&r)))
        .ok_or_else(|| ApiError::NoData(format!("no data for room {room}")))
}

/// Usage table around `center`, or around the room's latest reading when
/// no center is given.
pub async fn room_records(
    State(state): State<ApiState>,
    Path(room): Path<String>,
    Query(params): Query<RecordsParams>,
) -> Result<Json<Vec<UsageRecord>>, ApiError> {
    let snapshot = state
        .cache
        .latest_snapshot()
        .ok_or_else(|| ApiError::NoData("no snapshot received yet".to_string()))?;

    let center = match params.center.as_deref() {
        Some(raw) => DomainTimestamp::parse(raw).map_err(|e| ApiError::BadRequest(format!("invalid center: {e}")))?,
        None => state
            .cache
            .get(&room)
            .and_then(|r| r.resolution.sample.timestamp)
            .ok_or_else(|| ApiError::NoData(format!("no data for room {room}")))?,
    };

    let window_hours = params.window_hours.unwrap_or(state.default_window_hours);
    if !window_hours.is_finite() || window_hours < 0.0 {
        return Err(ApiError::BadRequest("window_hours must be a non-negative number".to_string()));
    }

    let query = RecordQuery::new(room, center, window_hours).with_text(params.q.unwrap_or_default());
    Ok(Json(state.engine.aggregate(&snapshot.instructors, &query)))
}
