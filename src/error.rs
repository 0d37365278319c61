// Copyright 2025 Memophor Labs
// SPDX-License-Identifier: Apache-2.0

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

pub const MARKER_NOT_FOUND: &str = "Could not find data object in page source.";
pub const PARSE_FAILURE: &str = "Failed to parse user rating data from page.";

#[derive(Debug, Error)]
pub enum InputError {
    #[error("Username parameter is required")]
    MissingUsername,
}

/// Failures while fetching the profile page.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("User '{username}' not found or profile is private.")]
    NotFoundOrPrivate { username: String },
    #[error("An unexpected error occurred: {message}")]
    Unexpected { message: String },
}

/// Failures while locating the embedded settings object.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("settings marker not found in page")]
    MarkerNotFound,
    #[error("embedded settings are not valid JSON: {0}")]
    JsonParseFailure(#[from] serde_json::Error),
}

/// Failures while reading the rating history out of the settings object.
#[derive(Debug, Error)]
pub enum InterpretError {
    #[error("malformed rating data: {0}")]
    MalformedData(String),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Unparseable(String),
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl AppError {
    pub fn not_found<T: Into<String>>(message: T) -> Self {
        Self::NotFound(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unparseable(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<InputError> for AppError {
    fn from(err: InputError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<FetchError> for AppError {
    fn from(err: FetchError) -> Self {
        AppError::NotFound(err.to_string())
    }
}

impl From<ExtractError> for AppError {
    fn from(err: ExtractError) -> Self {
        match err {
            ExtractError::MarkerNotFound => AppError::not_found(MARKER_NOT_FOUND),
            ExtractError::JsonParseFailure(_) => AppError::Unparseable(PARSE_FAILURE.to_string()),
        }
    }
}

impl From<InterpretError> for AppError {
    fn from(_: InterpretError) -> Self {
        AppError::Unparseable(PARSE_FAILURE.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = ErrorBody {
            error: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}
