// Copyright 2025 Memophor Labs
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! HTTP API handlers for the rating service.
//!
//! - `GET /` and `GET /rating` - lookup by `username` query parameter
//! - `GET /user/:username` and `GET /rating/:username` - lookup by path
//! - `GET /healthz` - Service health check
//! - `GET /metrics` - Prometheus metrics export
//!
//! Every lookup runs the same pipeline: read the username, fetch the profile
//! page, extract the embedded settings, interpret the rating history. Any
//! failure short-circuits into an `{"error": ...}` body.

use axum::extract::{Path, Query, State};
use axum::http::{header, Method};
use axum::routing::get;
use axum::{Json, Router};
use tokio::time::Instant;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::{AppConfig, MissingUsernamePolicy};
use crate::error::{AppError, ExtractError, FetchError, InputError};
use crate::extract::extract_settings;
use crate::metrics::{LookupOutcome, Metrics};
use crate::model::{LookupResponse, ProfileQuery, RatingStatus, WelcomeResponse};
use crate::rating::interpret;
use crate::upstream::ProfileFetcher;

#[derive(Clone)]
pub struct AppState {
    pub fetcher: ProfileFetcher,
    pub metrics: Metrics,
    pub missing_username: MissingUsernamePolicy,
    pub public_url: String,
}

impl AppState {
    pub fn try_new(cfg: &AppConfig) -> Result<Self, AppError> {
        Ok(Self {
            fetcher: ProfileFetcher::try_new(cfg.upstream.clone())?,
            metrics: Metrics::new()?,
            missing_username: cfg.missing_username,
            public_url: cfg.public_url.clone(),
        })
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(handle_query_lookup))
        .route("/rating", get(handle_query_lookup))
        .route("/user/:username", get(handle_path_lookup))
        .route("/rating/:username", get(handle_path_lookup))
        .route("/healthz", get(health))
        .route("/metrics", get(metrics))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
pub async fn health() -> Result<Json<serde_json::Value>, AppError> {
    Ok(Json(serde_json::json!({
        "status": "healthy",
        "service": "chefrating",
        "version": env!("CARGO_PKG_VERSION"),
    })))
}

/// Metrics endpoint
pub async fn metrics(State(state): State<AppState>) -> Result<String, AppError> {
    state.metrics.export()
}

/// Lookup by `?username=` query parameter
pub async fn handle_query_lookup(
    State(state): State<AppState>,
    query: Option<Query<Vec<(String, String)>>>,
) -> Result<Json<LookupResponse>, AppError> {
    let query = query
        .map(|Query(pairs)| ProfileQuery::from_pairs(pairs))
        .unwrap_or_default();
    lookup(&state, query.username()).await.map(Json)
}

/// Lookup by `/user/:username` path segment
pub async fn handle_path_lookup(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<LookupResponse>, AppError> {
    let username = username.trim();
    let username = (!username.is_empty()).then_some(username);
    lookup(&state, username).await.map(Json)
}

async fn lookup(state: &AppState, username: Option<&str>) -> Result<LookupResponse, AppError> {
    let Some(username) = username else {
        state.metrics.record_lookup(LookupOutcome::MissingUsername);
        return match state.missing_username {
            MissingUsernamePolicy::Welcome => Ok(LookupResponse::Welcome(WelcomeResponse::new(
                &state.public_url,
            ))),
            MissingUsernamePolicy::Reject => Err(InputError::MissingUsername.into()),
        };
    };

    // Fetching
    state.metrics.record_upstream_request();
    let start = Instant::now();
    let fetched = state.fetcher.fetch(username).await;
    state
        .metrics
        .record_upstream_latency(start.elapsed().as_secs_f64());

    let page = match fetched {
        Ok(page) => page,
        Err(err) => {
            state.metrics.record_upstream_failure();
            state.metrics.record_lookup(match err {
                FetchError::NotFoundOrPrivate { .. } => LookupOutcome::NotFound,
                FetchError::Unexpected { .. } => LookupOutcome::FetchError,
            });
            tracing::warn!(username, error = %err, "profile fetch failed");
            return Err(err.into());
        }
    };

    // Extracting
    let settings = match extract_settings(page.as_str()) {
        Ok(settings) => settings,
        Err(err) => {
            state.metrics.record_lookup(match err {
                ExtractError::MarkerNotFound => LookupOutcome::MarkerNotFound,
                ExtractError::JsonParseFailure(_) => LookupOutcome::ParseError,
            });
            tracing::warn!(
                username,
                error = %err,
                "could not extract settings from profile page"
            );
            return Err(err.into());
        }
    };
    drop(page);

    let summary = match interpret(&settings, username) {
        Ok(summary) => summary,
        Err(err) => {
            state.metrics.record_lookup(LookupOutcome::ParseError);
            tracing::warn!(username, error = %err, "could not interpret rating history");
            return Err(err.into());
        }
    };

    // Responding
    state.metrics.record_lookup(match summary.status {
        RatingStatus::Success => LookupOutcome::Success,
        RatingStatus::Unrated => LookupOutcome::Unrated,
    });
    tracing::debug!(
        username,
        status = ?summary.status,
        current = summary.current_rating,
        peak = summary.peak_rating,
        "rating lookup complete"
    );

    Ok(LookupResponse::Summary(summary))
}
