// Copyright 2025 Memophor Labs
// SPDX-License-Identifier: Apache-2.0

//! Request and response shapes for the rating API.

use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Default)]
pub struct ProfileQuery {
    pub username: Option<String>,
}

impl ProfileQuery {
    /// Build from raw query pairs; the first `username` wins.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let username = pairs
            .into_iter()
            .find_map(|(key, value)| (key == "username").then_some(value));
        Self { username }
    }

    /// The username if present and non-blank.
    pub fn username(&self) -> Option<&str> {
        self.username
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RatingStatus {
    Success,
    Unrated,
}

/// Summary returned to callers for a looked-up profile.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingSummary {
    pub username: String,
    pub status: RatingStatus,
    pub current_rating: i64,
    pub peak_rating: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating_history: Option<Vec<Value>>,
}

impl RatingSummary {
    pub fn unrated(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            status: RatingStatus::Unrated,
            current_rating: 0,
            peak_rating: 0,
            rating_history: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WelcomeResponse {
    pub message: String,
    pub usage: String,
    pub example: String,
}

impl WelcomeResponse {
    pub fn new(public_url: &str) -> Self {
        Self {
            message: "Welcome to the Unofficial CodeChef Rating API!".to_string(),
            usage: "To get a user's rating, use the /user/<username> path.".to_string(),
            example: format!("{public_url}/user/gennady"),
        }
    }
}

/// Body of a successful lookup request.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum LookupResponse {
    Welcome(WelcomeResponse),
    Summary(RatingSummary),
}
