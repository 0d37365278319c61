// Copyright 2025 Memophor Labs
// SPDX-License-Identifier: Apache-2.0

//! Upstream fetcher for CodeChef profile pages.
//!
//! Builds the profile URL for a username, downloads the page with a browser-like
//! identity and classifies failures for the request handler.

use anyhow::anyhow;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::header::USER_AGENT;
use reqwest::Client;

use crate::config::UpstreamConfig;
use crate::error::{AppError, FetchError};

/// Everything except RFC 3986 unreserved characters is escaped, so a username
/// always lands in exactly one path segment.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Raw HTML of a profile page.
#[derive(Debug)]
pub struct RawProfilePage(pub String);

impl RawProfilePage {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// HTTP client wrapper for fetching profile pages.
#[derive(Clone)]
pub struct ProfileFetcher {
    base_url: String,
    user_agent: String,
    client: Client,
}

impl ProfileFetcher {
    /// Construct a new fetcher using the provided configuration.
    pub fn try_new(config: UpstreamConfig) -> Result<Self, AppError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder
            .build()
            .map_err(|e| AppError::Internal(anyhow!("Failed to build upstream client: {}", e)))?;

        Ok(Self {
            base_url: config.base_url,
            user_agent: config.user_agent,
            client,
        })
    }

    pub fn profile_url(&self, username: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            utf8_percent_encode(username, PATH_SEGMENT)
        )
    }

    /// Fetch the profile page for `username`.
    pub async fn fetch(&self, username: &str) -> Result<RawProfilePage, FetchError> {
        let url = self.profile_url(username);

        let response = self
            .client
            .get(&url)
            .header(USER_AGENT, &self.user_agent)
            .send()
            .await
            .map_err(|e| FetchError::Unexpected {
                message: e.to_string(),
            })?;

        let status = response.status();

        if status.is_client_error() || status.is_server_error() {
            tracing::debug!(username, %status, "Upstream rejected profile request");
            return Err(FetchError::NotFoundOrPrivate {
                username: username.to_string(),
            });
        }

        let body = response.text().await.map_err(|e| FetchError::Unexpected {
            message: e.to_string(),
        })?;

        tracing::debug!(username, %status, bytes = body.len(), "Fetched profile page");

        Ok(RawProfilePage(body))
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn fetcher(base_url: &str) -> ProfileFetcher {
        ProfileFetcher::try_new(UpstreamConfig {
            base_url: base_url.to_string(),
            user_agent: "Mozilla/5.0".to_string(),
            timeout: None,
        })
        .expect("client construction should not fail")
    }

    #[test]
    fn profile_url_escapes_username_into_one_segment() {
        let fetcher = fetcher("https://www.codechef.com/users/");
        assert_eq!(
            fetcher.profile_url("gennady"),
            "https://www.codechef.com/users/gennady"
        );
        assert_eq!(
            fetcher.profile_url("tourist_01.x~y-z"),
            "https://www.codechef.com/users/tourist_01.x~y-z"
        );
        assert_eq!(
            fetcher.profile_url("../admin?x=1#frag"),
            "https://www.codechef.com/users/..%2Fadmin%3Fx%3D1%23frag"
        );
        assert_eq!(
            fetcher.profile_url("a b%c"),
            "https://www.codechef.com/users/a%20b%25c"
        );
    }

    #[tokio::test]
    async fn fetch_returns_body_and_sends_user_agent() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/users/gennady"))
            .and(header("user-agent", "Mozilla/5.0"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = fetcher(&format!("{}/users", server.uri()));
        let page = fetcher.fetch("gennady").await.expect("page fetched");

        assert_eq!(page.as_str(), "<html>ok</html>");
    }

    #[tokio::test]
    async fn client_and_server_errors_mean_not_found_or_private() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/users/ghost"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/users/flaky"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let fetcher = fetcher(&format!("{}/users", server.uri()));

        let err = fetcher.fetch("ghost").await.expect_err("404 should fail");
        assert!(matches!(
            err,
            FetchError::NotFoundOrPrivate { ref username } if username == "ghost"
        ));

        let err = fetcher.fetch("flaky").await.expect_err("503 should fail");
        assert!(matches!(err, FetchError::NotFoundOrPrivate { .. }));
    }

    #[tokio::test]
    async fn transport_failures_are_unexpected() {
        // Nothing listens on port 9 of the loopback interface.
        let fetcher = fetcher("http://127.0.0.1:9/users");

        let err = fetcher.fetch("gennady").await.expect_err("connect should fail");
        match err {
            FetchError::Unexpected { message } => assert!(!message.is_empty()),
            other => panic!("expected unexpected error, got {other:?}"),
        }
    }
}
