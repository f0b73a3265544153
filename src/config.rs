//! Startup configuration: environment variables plus an optional TOML file.
//!
//! Env variables:
//!   API_KEY                 : Gemini API key (required, startup fails without it)
//!   GEMINI_BASE_URL         : default "https://generativelanguage.googleapis.com/v1beta"
//!   GENERATION_TIMEOUT_SECS : deadline for one model call (default 180)
//!   STRICT_VALIDATION       : reject exams that fail the content audit (default false)
//!   PORT                    : u16 (default 3000)
//!   APP_CONFIG_PATH         : path to TOML config (prompt overrides + [generation])
//!
//! Environment values win over the TOML file.

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::prompt::{DEFAULT_EXAM_TEMPLATE, DEFAULT_PERSONA};

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_TIMEOUT_SECS: u64 = 180;
pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("API_KEY environment variable not set")]
  MissingCredential,
  #[error("invalid value for {key}: {value:?}")]
  InvalidValue { key: &'static str, value: String },
  #[error("failed to read config file {path}: {source}")]
  Read { path: String, source: std::io::Error },
  #[error("failed to parse config file {path}: {source}")]
  Parse { path: String, source: toml::de::Error },
}

/// Optional TOML file contents.
#[derive(Clone, Debug, Deserialize, Default)]
pub struct AppConfig {
  #[serde(default)]
  pub prompts: Prompts,
  #[serde(default)]
  pub generation: GenerationFile,
}

#[derive(Clone, Debug, Deserialize, Default)]
pub struct GenerationFile {
  #[serde(default)] pub timeout_secs: Option<u64>,
  #[serde(default)] pub strict_validation: Option<bool>,
}

/// Prompt texts used for exam generation. Defaults live in `crate::prompt`;
/// any field can be overridden in TOML under `[prompts]`.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Prompts {
  pub persona: String,
  pub exam_template: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      persona: DEFAULT_PERSONA.into(),
      exam_template: DEFAULT_EXAM_TEMPLATE.into(),
    }
  }
}

/// Settings of the exam generator itself.
#[derive(Clone, Debug)]
pub struct GenerationSettings {
  pub timeout: Duration,
  pub strict_validation: bool,
  pub prompts: Prompts,
}

impl Default for GenerationSettings {
  fn default() -> Self {
    Self {
      timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
      strict_validation: false,
      prompts: Prompts::default(),
    }
  }
}

#[derive(Clone)]
pub struct Settings {
  pub api_key: String,
  pub gemini_base_url: String,
  pub port: u16,
  pub generation: GenerationSettings,
}

// Keep the key out of Debug output.
impl std::fmt::Debug for Settings {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Settings")
      .field("api_key", &"<redacted>")
      .field("gemini_base_url", &self.gemini_base_url)
      .field("port", &self.port)
      .field("generation", &self.generation)
      .finish()
  }
}

impl Settings {
  /// Read settings from the process environment (and the TOML file it points at).
  pub fn from_env() -> Result<Self, ConfigError> {
    Self::from_lookup(|k| std::env::var(k).ok())
  }

  /// Same as `from_env` with an injectable variable lookup.
  pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
  where
    F: Fn(&str) -> Option<String>,
  {
    let api_key = lookup("API_KEY")
      .map(|k| k.trim().to_string())
      .filter(|k| !k.is_empty())
      .ok_or(ConfigError::MissingCredential)?;

    let file = match lookup("APP_CONFIG_PATH") {
      Some(path) => load_app_config(&path)?,
      None => AppConfig::default(),
    };

    let gemini_base_url = lookup("GEMINI_BASE_URL")
      .map(|u| u.trim().trim_end_matches('/').to_string())
      .filter(|u| !u.is_empty())
      .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.into());

    let port = match lookup("PORT") {
      Some(v) => v.trim().parse::<u16>().map_err(|_| ConfigError::InvalidValue { key: "PORT", value: v })?,
      None => DEFAULT_PORT,
    };

    let timeout_secs = match lookup("GENERATION_TIMEOUT_SECS") {
      Some(v) => v.trim().parse::<u64>().ok().filter(|s| *s > 0)
        .ok_or(ConfigError::InvalidValue { key: "GENERATION_TIMEOUT_SECS", value: v })?,
      None => match file.generation.timeout_secs {
        Some(0) => return Err(ConfigError::InvalidValue { key: "generation.timeout_secs", value: "0".into() }),
        Some(s) => s,
        None => DEFAULT_TIMEOUT_SECS,
      },
    };

    let strict_validation = match lookup("STRICT_VALIDATION") {
      Some(v) => parse_bool(&v).ok_or(ConfigError::InvalidValue { key: "STRICT_VALIDATION", value: v })?,
      None => file.generation.strict_validation.unwrap_or(false),
    };

    Ok(Settings {
      api_key,
      gemini_base_url,
      port,
      generation: GenerationSettings {
        timeout: Duration::from_secs(timeout_secs),
        strict_validation,
        prompts: file.prompts,
      },
    })
  }
}

fn parse_bool(v: &str) -> Option<bool> {
  match v.trim().to_ascii_lowercase().as_str() {
    "1" | "true" | "yes" | "on" => Some(true),
    "0" | "false" | "no" | "off" => Some(false),
    _ => None,
  }
}

/// Load `AppConfig` from a TOML file. Unlike the env lookup this is strict:
/// a path that was given but cannot be read or parsed fails startup.
pub fn load_app_config(path: &str) -> Result<AppConfig, ConfigError> {
  let s = std::fs::read_to_string(path)
    .map_err(|source| ConfigError::Read { path: path.to_string(), source })?;
  let cfg = toml::from_str::<AppConfig>(&s)
    .map_err(|source| ConfigError::Parse { path: path.to_string(), source })?;
  info!(target: "mts_exam_generator", %path, "Loaded app config (TOML)");
  Ok(cfg)
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashMap;

  fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    move |k: &str| map.get(k).cloned()
  }

  #[test]
  fn missing_credential_is_fatal() {
    let err = Settings::from_lookup(lookup(&[("PORT", "8080")])).unwrap_err();
    assert!(matches!(err, ConfigError::MissingCredential));
  }

  #[test]
  fn blank_credential_counts_as_missing() {
    let err = Settings::from_lookup(lookup(&[("API_KEY", "   ")])).unwrap_err();
    assert!(matches!(err, ConfigError::MissingCredential));
  }

  #[test]
  fn defaults_apply() {
    let s = Settings::from_lookup(lookup(&[("API_KEY", "k")])).unwrap();
    assert_eq!(s.api_key, "k");
    assert_eq!(s.gemini_base_url, DEFAULT_GEMINI_BASE_URL);
    assert_eq!(s.port, DEFAULT_PORT);
    assert_eq!(s.generation.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    assert!(!s.generation.strict_validation);
    assert_eq!(s.generation.prompts.persona, DEFAULT_PERSONA);
  }

  #[test]
  fn env_overrides_and_validation() {
    let s = Settings::from_lookup(lookup(&[
      ("API_KEY", "k"),
      ("GEMINI_BASE_URL", "http://127.0.0.1:9999/v1beta/"),
      ("GENERATION_TIMEOUT_SECS", "30"),
      ("STRICT_VALIDATION", "yes"),
      ("PORT", "8080"),
    ]))
    .unwrap();
    assert_eq!(s.gemini_base_url, "http://127.0.0.1:9999/v1beta");
    assert_eq!(s.generation.timeout, Duration::from_secs(30));
    assert!(s.generation.strict_validation);
    assert_eq!(s.port, 8080);

    let err = Settings::from_lookup(lookup(&[("API_KEY", "k"), ("GENERATION_TIMEOUT_SECS", "0")])).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { key: "GENERATION_TIMEOUT_SECS", .. }));
  }

  #[test]
  fn debug_output_redacts_key() {
    let s = Settings::from_lookup(lookup(&[("API_KEY", "super-secret")])).unwrap();
    assert!(!format!("{s:?}").contains("super-secret"));
  }

  #[test]
  fn toml_overrides_prompts_and_generation() {
    let cfg: AppConfig = toml::from_str(
      r#"
        [prompts]
        persona = "Anda adalah guru MTs."

        [generation]
        timeout_secs = 60
        strict_validation = true
      "#,
    )
    .unwrap();
    assert_eq!(cfg.prompts.persona, "Anda adalah guru MTs.");
    assert_eq!(cfg.prompts.exam_template, DEFAULT_EXAM_TEMPLATE);
    assert_eq!(cfg.generation.timeout_secs, Some(60));
    assert_eq!(cfg.generation.strict_validation, Some(true));
  }

  #[test]
  fn example_config_file_parses() {
    let cfg = load_app_config(concat!(env!("CARGO_MANIFEST_DIR"), "/exam.example.toml")).unwrap();
    assert_eq!(cfg.generation.timeout_secs, Some(180));
    assert_eq!(cfg.generation.strict_validation, Some(false));
    assert_eq!(cfg.prompts.persona, DEFAULT_PERSONA);
  }

  #[test]
  fn unreadable_config_file_fails() {
    let err = Settings::from_lookup(lookup(&[("API_KEY", "k"), ("APP_CONFIG_PATH", "/nonexistent/exam.toml")])).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
  }
}
