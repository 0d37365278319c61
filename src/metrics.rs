// Copyright 2025 Memophor Labs
// SPDX-License-Identifier: Apache-2.0

//! Prometheus metrics collection for the rating API.
//!
//! Tracks lookup outcomes and upstream profile fetches.

use prometheus::{Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry};
use std::sync::Arc;

use crate::error::AppError;

/// Terminal state of a single lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupOutcome {
    Success,
    Unrated,
    MissingUsername,
    NotFound,
    FetchError,
    MarkerNotFound,
    ParseError,
}

impl LookupOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            LookupOutcome::Success => "success",
            LookupOutcome::Unrated => "unrated",
            LookupOutcome::MissingUsername => "missing_username",
            LookupOutcome::NotFound => "not_found",
            LookupOutcome::FetchError => "fetch_error",
            LookupOutcome::MarkerNotFound => "marker_not_found",
            LookupOutcome::ParseError => "parse_error",
        }
    }
}

/// Metrics collector
#[derive(Clone)]
pub struct Metrics {
    pub registry: Arc<Registry>,

    // Lookup metrics
    pub lookups: IntCounterVec,

    // Upstream fetch metrics
    pub upstream_requests: IntCounter,
    pub upstream_failures: IntCounter,
    pub upstream_latency: Histogram,
}

impl Metrics {
    pub fn new() -> Result<Self, AppError> {
        let registry = Registry::new();

        let lookups = IntCounterVec::new(
            Opts::new(
                "chefrating_lookups_total",
                "Total number of rating lookups by outcome",
            ),
            &["outcome"],
        )
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to create metric: {}", e)))?;

        let upstream_requests = IntCounter::with_opts(Opts::new(
            "chefrating_upstream_requests_total",
            "Total number of profile page fetches attempted",
        ))
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to create metric: {}", e)))?;

        let upstream_failures = IntCounter::with_opts(Opts::new(
            "chefrating_upstream_failures_total",
            "Total number of profile page fetches that resulted in an error",
        ))
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to create metric: {}", e)))?;

        let upstream_latency = Histogram::with_opts(
            HistogramOpts::new(
                "chefrating_upstream_latency_seconds",
                "Duration of profile page fetches in seconds",
            )
            .buckets(vec![
                0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0, 2.0, 5.0, 10.0,
            ]),
        )
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to create metric: {}", e)))?;

        registry
            .register(Box::new(lookups.clone()))
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to register metric: {}", e)))?;
        registry
            .register(Box::new(upstream_requests.clone()))
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to register metric: {}", e)))?;
        registry
            .register(Box::new(upstream_failures.clone()))
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to register metric: {}", e)))?;
        registry
            .register(Box::new(upstream_latency.clone()))
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to register metric: {}", e)))?;

        Ok(Self {
            registry: Arc::new(registry),
            lookups,
            upstream_requests,
            upstream_failures,
            upstream_latency,
        })
    }

    /// Record how a lookup ended
    pub fn record_lookup(&self, outcome: LookupOutcome) {
        self.lookups.with_label_values(&[outcome.as_str()]).inc();
    }

    /// Record an upstream fetch attempt
    pub fn record_upstream_request(&self) {
        self.upstream_requests.inc();
    }

    /// Record an upstream fetch failure
    pub fn record_upstream_failure(&self) {
        self.upstream_failures.inc();
    }

    /// Observe latency for an upstream fetch in seconds
    pub fn record_upstream_latency(&self, seconds: f64) {
        self.upstream_latency.observe(seconds);
    }

    /// Export metrics in Prometheus format
    pub fn export(&self) -> Result<String, AppError> {
        use prometheus::Encoder;

        let encoder = prometheus::TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to encode metrics: {}", e)))?;

        String::from_utf8(buffer).map_err(|e| {
            AppError::Internal(anyhow::anyhow!(
                "Failed to convert metrics to string: {}",
                e
            ))
        })
    }
}
