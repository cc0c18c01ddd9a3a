// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! HTTP surface.
//!
//! | Method | Path           | Description                                   |
//! |--------|----------------|-----------------------------------------------|
//! | GET    | `/healthz`     | Liveness probe                                |
//! | GET    | `/metrics`     | Prometheus text exposition                    |
//! | GET    | `/dns/records` | Read view of the managed network's records    |
//! | POST   | `/dns/records` | Replace records (optionally within one zone)  |
//!
//! Errors are returned as `{"reason": "...", "message": "..."}`.

use crate::dns::{DnsRecords, RecordQuery};
use crate::errors::Error;
use crate::metrics::gather_metrics;
use crate::session::{ChangeInfo, Session};
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;

/// Shared handler state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub session: Arc<Session>,
    /// Name of the managed network
    pub network: String,
}

/// Build the router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics))
        .route("/dns/records", get(list_records).post(replace_records))
        .with_state(state)
}

/// Query parameters of `GET /dns/records`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordsParams {
    pub zone: Option<String>,
    /// Comma-separated zones to leave out
    pub exclude_zone: Option<String>,
    #[serde(default)]
    pub include_soa_ns: bool,
    #[serde(default)]
    pub include_eager_cname: bool,
}

impl RecordsParams {
    #[must_use]
    pub fn to_query(&self) -> RecordQuery {
        let mut query = RecordQuery::new();
        if let Some(zone) = self.zone.as_deref().filter(|zone| !zone.is_empty()) {
            query = query.zone(zone);
        }
        for zone in self
            .exclude_zone
            .iter()
            .flat_map(|zones| zones.split(','))
            .map(str::trim)
            .filter(|zone| !zone.is_empty())
        {
            query = query.exclude_zone(zone);
        }
        if self.include_soa_ns {
            query = query.with_soa_ns();
        }
        if self.include_eager_cname {
            query = query.with_eager_cname();
        }
        query
    }
}

/// Body of `POST /dns/records`.
#[derive(Debug, Clone, Deserialize)]
pub struct ReplaceRecordsRequest {
    /// Only replace records inside this zone
    #[serde(default)]
    pub zone: Option<String>,
    pub records: DnsRecords,
}

/// Response of `POST /dns/records`.
#[derive(Debug, Clone, Serialize)]
pub struct ReplaceRecordsResponse {
    pub change: ChangeInfo,
    /// Records as read back after the change
    pub records: DnsRecords,
}

/// Error body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub reason: String,
    pub message: String,
}

/// Handler error wrapping a library [`Error`].
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(value: Error) -> Self {
        Self(value)
    }
}

impl ApiError {
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match &self.0 {
            Error::Lookup(_) => StatusCode::NOT_FOUND,
            Error::Record(_) | Error::Config(_) => StatusCode::BAD_REQUEST,
            e if e.is_transient() => StatusCode::SERVICE_UNAVAILABLE,
            Error::Backend(_) => StatusCode::BAD_GATEWAY,
            Error::Xml(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(reason = self.0.status_reason(), error = %self.0, "Request failed");
        }
        let body = ErrorBody {
            reason: self.0.status_reason().to_string(),
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

pub async fn healthz() -> &'static str {
    "ok"
}

pub async fn metrics() -> Response {
    match gather_metrics() {
        Ok(text) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

pub async fn list_records(
    State(state): State<AppState>,
    Query(params): Query<RecordsParams>,
) -> Result<Json<DnsRecords>, ApiError> {
    let records = state
        .session
        .get_dns_records(&state.network, &params.to_query())
        .await?;
    Ok(Json(records))
}

pub async fn replace_records(
    State(state): State<AppState>,
    Json(request): Json<ReplaceRecordsRequest>,
) -> Result<Json<ReplaceRecordsResponse>, ApiError> {
    let change = state
        .session
        .replace_zone_records(&state.network, request.zone.as_deref(), &request.records)
        .await?;

    let mut query = RecordQuery::new();
    if let Some(zone) = request.zone {
        query = query.zone(zone);
    }
    let records = state
        .session
        .get_dns_records(&state.network, &query)
        .await?;

    Ok(Json(ReplaceRecordsResponse { change, records }))
}

#[cfg(test)]
#[path = "api_tests.rs"]
mod api_tests;
