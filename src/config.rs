// src/config.rs
//! Runtime configuration: optional TOML file + environment overrides.
//!
//! Resolution order (later wins):
//! 1. built-in defaults
//! 2. `$SURVEY_CONFIG_PATH` or `config/survey.toml`
//! 3. `SURVEY_DEBUG_MODE`, `SURVEY_ANSWERS_PATH`

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "config/survey.toml";
pub const DEFAULT_ANSWERS_PATH: &str = "state/survey_answers.json";

pub const ENV_CONFIG_PATH: &str = "SURVEY_CONFIG_PATH";
pub const ENV_DEBUG_MODE: &str = "SURVEY_DEBUG_MODE";
pub const ENV_ANSWERS_PATH: &str = "SURVEY_ANSWERS_PATH";

fn default_answers_path() -> PathBuf {
    PathBuf::from(DEFAULT_ANSWERS_PATH)
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SurveyConfig {
    /// Ignore campaign windows and use the short debug display delay.
    #[serde(default)]
    pub debug_mode: bool,
    /// JSON file holding answer records.
    #[serde(default = "default_answers_path")]
    pub answers_path: PathBuf,
}

impl Default for SurveyConfig {
    fn default() -> Self {
        Self {
            debug_mode: false,
            answers_path: default_answers_path(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ConfigRoot {
    #[serde(default)]
    survey: Option<SurveyConfig>,
}

impl SurveyConfig {
    /// Load `.env`, then the config file, then apply env overrides.
    pub fn load() -> Result<Self> {
        let _ = dotenvy::dotenv();

        let mut cfg = match std::env::var(ENV_CONFIG_PATH) {
            Ok(p) => {
                let pb = PathBuf::from(p);
                if !pb.exists() {
                    return Err(anyhow!(
                        "{ENV_CONFIG_PATH} points to non-existent path {}",
                        pb.display()
                    ));
                }
                Self::from_file(&pb)?
            }
            Err(_) => {
                let pb = PathBuf::from(DEFAULT_CONFIG_PATH);
                if pb.exists() {
                    Self::from_file(&pb)?
                } else {
                    Self::default()
                }
            }
        };

        cfg.apply_env_overrides();
        Ok(cfg)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading survey config from {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("parsing survey config {}", path.display()))
    }

    /// Parse a `[survey]` table. An absent table yields defaults.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let root: ConfigRoot = toml::from_str(s)?;
        Ok(root.survey.unwrap_or_default())
    }

    fn apply_env_overrides(&mut self) {
        if let Some(flag) = parse_bool_env(std::env::var(ENV_DEBUG_MODE).ok()) {
            self.debug_mode = flag;
        }
        if let Ok(p) = std::env::var(ENV_ANSWERS_PATH) {
            let p = p.trim();
            if !p.is_empty() {
                self.answers_path = PathBuf::from(p);
            }
        }
    }
}

// "1"/"true"/"yes"/"on" and their negatives; anything else is ignored
fn parse_bool_env(raw: Option<String>) -> Option<bool> {
    let v = raw?.trim().to_ascii_lowercase();
    match v.as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
