// SPDX-FileCopyrightText: 2026 Arcanum Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./arcanum.toml` > `~/.config/arcanum/arcanum.toml`
//! > `/etc/arcanum/arcanum.toml` with environment variable overrides via the
//! `ARCANUM_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::ArcanumConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/arcanum/arcanum.toml` (system-wide)
/// 3. `~/.config/arcanum/arcanum.toml` (user XDG config)
/// 4. `./arcanum.toml` (local directory)
/// 5. `ARCANUM_*` environment variables
pub fn load_config() -> Result<ArcanumConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ArcanumConfig::default()))
        .merge(Toml::file("/etc/arcanum/arcanum.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("arcanum/arcanum.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("arcanum.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<ArcanumConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ArcanumConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<ArcanumConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ArcanumConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `ARCANUM_SERVICES_READING_URL` must map
/// to `services.reading_url`, not `services.reading.url`.
fn env_provider() -> Env {
    Env::prefixed("ARCANUM_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        // Example: ARCANUM_SERVICES_READING_URL -> "services_reading_url"
        let mapped = key
            .as_str()
            .replacen("services_", "services.", 1)
            .replacen("poller_", "poller.", 1)
            .replacen("client_", "client.", 1);
        mapped.into()
    })
}
