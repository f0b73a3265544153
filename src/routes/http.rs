//! HTTP endpoint handlers. These are thin wrappers that forward to the generator
//! and renderer. Each handler is instrumented and logs parameters and basic
//! result info (never topic text or model output).

use std::sync::Arc;
use axum::{extract::State, http::header, response::IntoResponse, Json};
use tracing::{info, instrument};

use crate::domain::{GeneratedExam, GenerationRequest};
use crate::error::AppError;
use crate::protocol::*;
use crate::render::to_plain_text;
use crate::state::AppState;

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

#[instrument(level = "info")]
pub async fn http_get_options() -> impl IntoResponse { Json(OptionsOut::all()) }

#[instrument(
  level = "info",
  skip(state, body),
  fields(subject = %body.subject, grade = body.kelas.number(), count = body.question_count.get(), topic_len = body.topic.len(), forms = body.bentuk_soal.len())
)]
pub async fn http_post_exam(
  State(state): State<Arc<AppState>>,
  Json(body): Json<GenerateIn>,
) -> Result<Json<GenerateOut>, AppError> {
  let req = GenerationRequest::try_from(body).map_err(|e| {
    info!(target: "exam", error = %e, "Rejected exam form");
    e
  })?;

  let outcome = state.generator.generate(&req).await?;
  let exam = outcome.exam;

  let warnings: Vec<String> = outcome.issues.iter().map(ToString::to_string).collect();
  let plain_text = to_plain_text(&exam);
  info!(target: "exam", questions = exam.questions.len(), warnings = warnings.len(), "HTTP exam served");
  Ok(Json(GenerateOut { exam, warnings, plain_text }))
}

#[instrument(level = "info", skip(exam), fields(questions = exam.questions.len()))]
pub async fn http_post_plain_text(Json(exam): Json<GeneratedExam>) -> impl IntoResponse {
  (
    [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
    to_plain_text(&exam),
  )
}
