//! Typed configuration loader.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*`
//! env vars into one `AppConfig` built at process start and passed into
//! component constructors. No ambient global settings anywhere else.

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;
use std::env;

use crate::error::{Error, Result};

/// Default boosts match the production search endpoint: lexical match is
/// kept light and the embedding term dominates.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchDefaults {
    pub k: usize,
    pub text_boost: f32,
    pub embedding_boost: f32,
    pub rerank_top_k: usize,
}

impl Default for SearchDefaults {
    fn default() -> Self {
        Self { k: 5, text_boost: 0.25, embedding_boost: 4.0, rerank_top_k: 0 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EvalSettings {
    /// A correctness score at or above this passes (1..5 scale).
    pub correctness_threshold: f64,
    /// Directory the evaluation ledgers are written to.
    pub ledger_dir: String,
}

impl Default for EvalSettings {
    fn default() -> Self {
        Self { correctness_threshold: 4.0, ledger_dir: "./data".to_string() }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub search: SearchDefaults,
    pub eval: EvalSettings,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::new().merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        figment
            .extract()
            .map_err(|e| Error::InvalidConfig(e.to_string()))
    }
}
