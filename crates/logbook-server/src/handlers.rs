//! HTTP request handlers for the log API.

use std::str::FromStr;
use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use logbook_core::usecase::{
    CreateLogRequest, CreateLogResponse, GetLogStatsResponse, QueryLogsResponse,
};
use logbook_core::{LogEntry, LogFilter, LogLevel, Metadata, SortField, SortOrder};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ApiError;
use crate::state::AppState;

/// Name reported by the health endpoint.
pub const SERVICE_NAME: &str = "logbook";

/// Raw query parameters, in request order.
pub type QueryParams = Vec<(String, String)>;

/// JSON body of `POST /log`.
///
/// The level stays a string here so an unknown level is reported as such
/// instead of as malformed JSON. An explicit `null` reads as an absent field.
#[derive(Debug, Deserialize)]
pub struct CreateLogBody {
    /// Level name
    #[serde(default)]
    pub level: Option<String>,
    /// Emitting service
    #[serde(default)]
    pub service: Option<String>,
    /// Event name
    #[serde(default)]
    pub event: Option<String>,
    /// Message text
    #[serde(default)]
    pub message: Option<String>,
    /// Optional user ID
    #[serde(default)]
    pub user_id: Option<i64>,
    /// Optional chat ID
    #[serde(default)]
    pub chat_id: Option<i64>,
    /// Extra fields
    #[serde(default)]
    pub metadata: Option<Metadata>,
}

impl TryFrom<CreateLogBody> for CreateLogRequest {
    type Error = ApiError;

    fn try_from(body: CreateLogBody) -> Result<Self, Self::Error> {
        let level = LogLevel::from_str(body.level.as_deref().unwrap_or_default())
            .map_err(|_| ApiError::InvalidLevel)?;

        Ok(Self {
            level,
            service: body.service.unwrap_or_default(),
            event: body.event.unwrap_or_default(),
            message: body.message.unwrap_or_default(),
            user_id: body.user_id,
            chat_id: body.chat_id,
            metadata: body.metadata.unwrap_or_default(),
        })
    }
}

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"healthy"` while the process serves requests.
    pub status: String,
    /// Time of the check.
    pub timestamp: DateTime<Utc>,
    /// Server version.
    pub version: String,
    /// Service name.
    pub service: String,
    /// Whether the alert channel reports itself healthy.
    pub alerts_healthy: bool,
    /// Server uptime in seconds.
    pub uptime_secs: u64,
}

/// Handle POST /log - ingest one entry.
pub async fn create_log(
    State(state): State<Arc<AppState>>,
    body: Result<Json<CreateLogBody>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateLogResponse>), ApiError> {
    let Json(body) = body.map_err(|rejection| {
        debug!(error = %rejection, "rejected log body");
        ApiError::InvalidJson
    })?;

    let request = CreateLogRequest::try_from(body)?;
    let response = state.create_log().execute(request).await?;

    Ok((StatusCode::CREATED, Json(response)))
}

/// Handle GET /log - filtered, paginated search.
pub async fn query_logs(
    State(state): State<Arc<AppState>>,
    params: Result<Query<QueryParams>, QueryRejection>,
) -> Result<Json<QueryLogsResponse>, ApiError> {
    let filter = parse_filter(&query_params(params)?)?;
    let response = state.query_logs().execute(filter).await?;
    Ok(Json(response))
}

/// Handle GET /log/stats - aggregate counts.
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
    params: Result<Query<QueryParams>, QueryRejection>,
) -> Result<Json<GetLogStatsResponse>, ApiError> {
    let filter = parse_filter(&query_params(params)?)?;
    let response = state.get_stats().execute(filter).await?;
    Ok(Json(response))
}

/// Handle GET /log/{id} - fetch one entry.
pub async fn get_log(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<LogEntry>, ApiError> {
    let entry = state.get_log().execute(&id).await?;
    Ok(Json(entry))
}

/// Handle GET /health - liveness check.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        service: SERVICE_NAME.to_string(),
        alerts_healthy: state.alerts().is_healthy().await,
        uptime_secs: state.uptime().as_secs(),
    })
}

fn query_params(params: Result<Query<QueryParams>, QueryRejection>) -> Result<QueryParams, ApiError> {
    params.map(|Query(p)| p).map_err(|rejection| {
        debug!(error = %rejection, "rejected query string");
        ApiError::InvalidParameter("query".to_string())
    })
}

/// First non-empty value of a singular parameter.
fn single<'a>(params: &'a [(String, String)], name: &str) -> Option<&'a str> {
    params
        .iter()
        .filter(|(key, value)| key == name && !value.is_empty())
        .map(|(_, value)| value.as_str())
        .next()
}

/// Every non-empty value of a repeatable parameter.
fn all<'a>(params: &'a [(String, String)], name: &'a str) -> impl Iterator<Item = &'a str> {
    params
        .iter()
        .filter(move |(key, value)| key == name && !value.is_empty())
        .map(|(_, value)| value.as_str())
}

fn parse_int(params: &[(String, String)], name: &str) -> Result<Option<i64>, ApiError> {
    single(params, name)
        .map(|value| {
            value
                .parse::<i64>()
                .map_err(|_| ApiError::InvalidParameter(name.to_string()))
        })
        .transpose()
}

fn parse_time(params: &[(String, String)], name: &str) -> Result<Option<DateTime<Utc>>, ApiError> {
    single(params, name)
        .map(|value| {
            DateTime::parse_from_rfc3339(value)
                .map(|t| t.with_timezone(&Utc))
                .map_err(|_| ApiError::InvalidTimestamp(name.to_string()))
        })
        .transpose()
}

/// Builds a filter from query parameters.
///
/// `service`, `event` and `level` may repeat; every other parameter uses
/// its first non-empty value. Empty values are ignored.
///
/// # Errors
///
/// Returns an error naming the first parameter that fails to parse.
pub fn parse_filter(params: &[(String, String)]) -> Result<LogFilter, ApiError> {
    let mut filter = LogFilter::new();

    if let Some(limit) = parse_int(params, "limit")? {
        filter.limit = limit;
    }
    if let Some(offset) = parse_int(params, "offset")? {
        filter.offset = offset;
    }

    filter.services = all(params, "service").map(str::to_string).collect();
    filter.events = all(params, "event").map(str::to_string).collect();
    filter.levels = all(params, "level")
        .map(|level| {
            LogLevel::from_str(level).map_err(|_| ApiError::InvalidParameter("level".to_string()))
        })
        .collect::<Result<_, _>>()?;

    filter.user_id = parse_int(params, "user_id")?;
    filter.chat_id = parse_int(params, "chat_id")?;
    filter.message_contains = single(params, "message_contains").map(str::to_string);

    filter.time_from = parse_time(params, "time_from")?;
    filter.time_to = parse_time(params, "time_to")?;

    filter.sort_by = single(params, "sort_by")
        .map(SortField::from_str)
        .transpose()?;
    filter.sort_order = single(params, "sort_order")
        .map(SortOrder::from_str)
        .transpose()?;

    Ok(filter)
}
