use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

const DEFAULT_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_PROFILE_BASE_URL: &str = "https://www.codechef.com/users";
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";
const DEFAULT_PUBLIC_URL: &str = "https://codechefapi.netlify.app";

pub struct AppConfig {
    pub listen_addr: SocketAddr,
    pub upstream: UpstreamConfig,
    pub missing_username: MissingUsernamePolicy,
    pub public_url: String,
    pub log_format: LogFormat,
}

/// Settings for the outbound profile fetch.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    pub base_url: String,
    pub user_agent: String,
    /// `None` keeps the transport default.
    pub timeout: Option<Duration>,
}

/// What to answer when a request carries no username.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingUsernamePolicy {
    Welcome,
    Reject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let listen_addr: SocketAddr = lookup("RATING_API_ADDR")
            .unwrap_or_else(|| DEFAULT_ADDR.to_string())
            .parse()
            .context("invalid RATING_API_ADDR")?;

        let base_url = lookup("RATING_API_PROFILE_BASE_URL")
            .unwrap_or_else(|| DEFAULT_PROFILE_BASE_URL.to_string());
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            bail!("RATING_API_PROFILE_BASE_URL must be an http(s) URL");
        }

        let user_agent =
            lookup("RATING_API_USER_AGENT").unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());
        if user_agent.trim().is_empty() {
            bail!("RATING_API_USER_AGENT cannot be empty");
        }

        let timeout = parse_optional_duration(&lookup, "RATING_API_UPSTREAM_TIMEOUT_SECS")?;

        let missing_username = if parse_bool(&lookup, "RATING_API_REQUIRE_USERNAME", false)? {
            MissingUsernamePolicy::Reject
        } else {
            MissingUsernamePolicy::Welcome
        };

        let public_url = lookup("RATING_API_PUBLIC_URL")
            .unwrap_or_else(|| DEFAULT_PUBLIC_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let log_format = match lookup("RATING_API_LOG_FORMAT").as_deref() {
            None | Some("text") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(other) => bail!("RATING_API_LOG_FORMAT must be 'text' or 'json', got '{other}'"),
        };

        Ok(Self {
            listen_addr,
            upstream: UpstreamConfig {
                base_url,
                user_agent,
                timeout,
            },
            missing_username,
            public_url,
            log_format,
        })
    }

    pub fn listen_addr(&self) -> SocketAddr {
        self.listen_addr
    }
}

fn parse_optional_duration<F>(lookup: &F, env_key: &str) -> Result<Option<Duration>>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(env_key) else {
        return Ok(None);
    };

    let secs: u64 = raw
        .trim()
        .parse()
        .with_context(|| format!("{env_key} must be an integer number of seconds"))?;

    Ok((secs > 0).then(|| Duration::from_secs(secs)))
}

fn parse_bool<F>(lookup: &F, env_key: &str, default: bool) -> Result<bool>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(env_key) {
        None => Ok(default),
        Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" | "" => Ok(false),
            _ => bail!("{env_key} must be a boolean, got '{raw}'"),
        },
    }
}
