// SPDX-FileCopyrightText: 2026 Arcanum Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Arcanum reading client.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level Arcanum configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to the local
/// development service ports.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ArcanumConfig {
    /// Base URLs for the three backend services.
    #[serde(default)]
    pub services: ServicesConfig,

    /// Interpretation polling policy.
    #[serde(default)]
    pub poller: PollerConfig,

    /// Client-side behavior settings.
    #[serde(default)]
    pub client: ClientConfig,
}

/// Base URLs and transport settings for the backend services.
///
/// Each service is independently addressable; the defaults match the local
/// development compose stack.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServicesConfig {
    /// Base URL of the reading service (session + card draw).
    #[serde(default = "default_reading_url")]
    pub reading_url: String,

    /// Base URL of the layout service (spread catalog).
    #[serde(default = "default_layout_url")]
    pub layout_url: String,

    /// Base URL of the interpretation service (generation + conversation).
    #[serde(default = "default_interpretation_url")]
    pub interpretation_url: String,

    /// Per-request HTTP timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            reading_url: default_reading_url(),
            layout_url: default_layout_url(),
            interpretation_url: default_interpretation_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_reading_url() -> String {
    "http://localhost:3002".to_string()
}

fn default_layout_url() -> String {
    "http://localhost:3003".to_string()
}

fn default_interpretation_url() -> String {
    "http://localhost:3004".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

/// Interpretation polling policy.
///
/// Fixed interval and fixed attempt cap: generation latency is bounded and
/// roughly constant (30-60s), so predictable worst-case latency beats
/// exponential backoff here.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PollerConfig {
    /// Wait between `get_interpretation` attempts, in milliseconds.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Maximum number of attempts before reporting the interpretation
    /// unavailable.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            max_attempts: default_max_attempts(),
        }
    }
}

impl PollerConfig {
    /// The interval as a [`Duration`].
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

fn default_interval_ms() -> u64 {
    2000
}

fn default_max_attempts() -> u32 {
    15
}

/// Client-side behavior settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
