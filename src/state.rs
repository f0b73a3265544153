//! Application state shared by the HTTP handlers.
//!
//! Holds only immutable collaborators built once at startup: the exam
//! generator with its injected model client. Nothing here is mutated per
//! request and generated exams are never stored.

use std::sync::Arc;

use tracing::{info, instrument};

use crate::config::Settings;
use crate::gemini::{Gemini, ModelError, TextModel};
use crate::generator::ExamGenerator;

#[derive(Clone)]
pub struct AppState {
    pub generator: ExamGenerator,
}

impl AppState {
    /// Build state from validated settings: construct the Gemini client once
    /// and inject it into the generator.
    #[instrument(level = "info", skip_all)]
    pub fn new(settings: &Settings) -> Result<Self, ModelError> {
        let gemini = Gemini::new(
            settings.api_key.clone(),
            settings.gemini_base_url.clone(),
            settings.generation.timeout,
        )?;
        info!(
            target: "mts_exam_generator",
            base_url = %gemini.base_url(),
            model = %gemini.model_name(),
            timeout = ?settings.generation.timeout,
            strict_validation = settings.generation.strict_validation,
            "Gemini client ready"
        );
        Ok(Self::with_model(Arc::new(gemini), settings))
    }

    /// Build state around any model client (used by tests with a scripted model).
    pub fn with_model(model: Arc<dyn TextModel>, settings: &Settings) -> Self {
        Self {
            generator: ExamGenerator::new(model, settings.generation.clone()),
        }
    }
}
