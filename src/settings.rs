//! Runtime configuration.
//!
//! Settings are layered with the `config` crate: built-in defaults, then an
//! optional file (`gumshoe.toml`, `gumshoe.json`, ...), then environment
//! variables prefixed `GUMSHOE__` (`GUMSHOE__SALT`, `GUMSHOE__CLUES__CRIME`).
//! The resulting [`Settings`] value is handed to the engine explicitly; no
//! module reads the environment on its own.

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::Result;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub limits: Limits,
    pub clues: ClueConfig,
    /// Appended to a suspect name before the solution counter is looked up.
    pub salt: String,
}

impl Settings {
    /// Load settings from `name` (extension optional, file optional) and the environment.
    pub fn load(name: &str) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::with_name(name).required(false))
            .add_source(
                Environment::with_prefix("GUMSHOE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub bind: String,
    pub allowed_origin: String,
    pub request_timeout_ms: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".into(),
            allowed_origin: "https://mongomurdermystery.com".into(),
            request_timeout_ms: 5_000,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// SQLite file; in-memory when absent.
    pub path: Option<String>,
    /// JSON file of `{ "<collection>": [documents...] }` loaded at start-up.
    pub seed_file: Option<String>,
}

/// Bounds applied while validating and building a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Limits {
    pub default_limit: usize,
    pub max_limit: usize,
    pub max_query_length: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            default_limit: 30,
            max_limit: 30,
            max_query_length: 1024,
        }
    }
}

/// Identifiers of the documents that count as clues. Only used to annotate results.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClueConfig {
    pub crime: String,
    pub witness1: String,
    pub witness2: String,
    pub suspect: String,
}

impl Default for ClueConfig {
    fn default() -> Self {
        Self {
            crime: "missing".into(),
            witness1: "missing".into(),
            witness2: "missing".into(),
            suspect: "missing".into(),
        }
    }
}
