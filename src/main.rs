//! MTs Exam Generator · Backend
//!
//! - Axum HTTP API for the exam form (generate, export, option lists)
//! - Gemini integration for exam package generation (one call per request)
//! - Static SPA fallback (./static/index.html)
//!
//! Important env variables:
//!   API_KEY                 : Gemini API key, required; startup fails without it
//!   GEMINI_BASE_URL         : default "https://generativelanguage.googleapis.com/v1beta"
//!   GENERATION_TIMEOUT_SECS : deadline for one generation call (default 180)
//!   STRICT_VALIDATION       : "true" rejects exams failing the content audit
//!   APP_CONFIG_PATH         : path to TOML config (prompt overrides + [generation])
//!   PORT                    : u16 (default 3000)
//!   LOG_LEVEL               : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT              : "pretty" (default) or "json"

mod telemetry;
mod util;
mod domain;
mod config;
mod prompt;
mod gemini;
mod validation;
mod generator;
mod render;
mod error;
mod protocol;
mod state;
mod routes;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::config::Settings;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // Credential and settings are read once; a missing API_KEY stops startup here,
  // before any client is constructed or any request accepted.
  let settings = Settings::from_env().map_err(|e| {
    error!(target: "mts_exam_generator", error = %e, "Invalid configuration; refusing to start");
    e
  })?;

  let state = Arc::new(AppState::new(&settings)?);
  let app = build_router(state);

  let addr = SocketAddr::from(([0, 0, 0, 0], settings.port));
  let listener = TcpListener::bind(addr).await?;
  info!(target: "mts_exam_generator", %addr, version = env!("CARGO_PKG_VERSION"), "HTTP server listening");
  axum::serve(listener, app).await?;
  Ok(())
}
