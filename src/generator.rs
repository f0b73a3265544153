//! Exam generation: prompt -> one model call -> fence stripping -> decoding.
//!
//! Flow:
//! 1) Build the prompt from the validated request.
//! 2) Await exactly one `TextModel` call under a deadline (no retries, no cache).
//! 3) Strip an optional markdown code fence around the returned text.
//! 4) Decode into `GeneratedExam`, all or nothing.
//! 5) Audit the content against the request; log issues, or reject in strict mode.
//!
//! Failures collapse into two sanitized errors: `RequestFailed` when the call did
//! not complete, `InvalidResponseFormat` when it did but the payload is unusable.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::config::GenerationSettings;
use crate::domain::{GeneratedExam, GenerationRequest};
use crate::error::GenerationError;
use crate::gemini::TextModel;
use crate::prompt::build_prompt_with;
use crate::util::trunc_for_log;
use crate::validation::{audit_exam, AuditIssue};

/// A decoded exam together with the content issues found by the audit.
/// `issues` is always empty in strict mode.
#[derive(Debug)]
pub struct GenerationOutcome {
  pub exam: GeneratedExam,
  pub issues: Vec<AuditIssue>,
}

#[derive(Clone)]
pub struct ExamGenerator {
  model: Arc<dyn TextModel>,
  settings: GenerationSettings,
}

impl ExamGenerator {
  pub fn new(model: Arc<dyn TextModel>, settings: GenerationSettings) -> Self {
    Self { model, settings }
  }

  /// Generate an exam package using the configured deadline.
  pub async fn generate(&self, req: &GenerationRequest) -> Result<GenerationOutcome, GenerationError> {
    self.generate_with_deadline(req, self.settings.timeout).await
  }

  /// Generate an exam package; the model call is abandoned once `deadline` elapses.
  #[instrument(
    level = "info",
    skip(self, req),
    fields(
      generation_id = %Uuid::new_v4(),
      model = %self.model.model_name(),
      subject = %req.subject(),
      grade = req.grade().number(),
      count = req.question_count().get(),
      forms = %req.forms_label(),
    )
  )]
  pub async fn generate_with_deadline(
    &self,
    req: &GenerationRequest,
    deadline: Duration,
  ) -> Result<GenerationOutcome, GenerationError> {
    let prompt = build_prompt_with(&self.settings.prompts, req);
    let start = Instant::now();

    let raw = match tokio::time::timeout(deadline, self.model.generate_text(&prompt)).await {
      Ok(Ok(text)) => text,
      Ok(Err(e)) => {
        error!(target: "exam", elapsed = ?start.elapsed(), error = %e, "Model call failed");
        return Err(GenerationError::RequestFailed);
      }
      Err(_) => {
        error!(target: "exam", ?deadline, "Model call timed out");
        return Err(GenerationError::RequestFailed);
      }
    };
    info!(target: "exam", elapsed = ?start.elapsed(), response_len = raw.len(), "Model response received");

    let exam = decode_exam(&raw)?;

    let issues = audit_exam(req, &exam);
    if !issues.is_empty() {
      let summary = issues.iter().map(|i| i.to_string()).collect::<Vec<_>>().join("; ");
      if self.settings.strict_validation {
        error!(target: "exam", issues = issues.len(), %summary, "Exam rejected by content audit (strict mode)");
        return Err(GenerationError::InvalidResponseFormat);
      }
      warn!(target: "exam", issues = issues.len(), %summary, "Exam accepted with content issues");
    }

    info!(
      target: "exam",
      questions = exam.questions.len(),
      blueprint_rows = exam.blueprint.len(),
      has_answer_key = exam.answer_key.is_some(),
      issues = issues.len(),
      "Exam package generated"
    );
    Ok(GenerationOutcome { exam, issues })
  }
}

/// Strip markdown code fences around the text: leading ```` ``` ```` markers
/// with an optional info string (```` ```json ````), trailing ```` ``` ````
/// markers, and the whitespace next to them. The info string may be followed
/// by a newline, a space or the payload itself. Unfenced text only gets
/// trimmed, and the result never starts or ends with a fence, so a second
/// pass is a no-op.
pub fn strip_code_fences(text: &str) -> &str {
  let mut t = text.trim();
  while let Some(rest) = t.strip_prefix("```") {
    t = rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric()).trim_start();
  }
  while let Some(rest) = t.strip_suffix("```") {
    t = rest.trim_end();
  }
  t
}

/// Decode raw model text into an exam package, all or nothing.
pub fn decode_exam(raw: &str) -> Result<GeneratedExam, GenerationError> {
  let cleaned = strip_code_fences(raw);
  serde_json::from_str::<GeneratedExam>(cleaned).map_err(|e| {
    error!(
      target: "exam",
      error = %e,
      preview = %trunc_for_log(cleaned, 200),
      "Failed to decode model response as an exam package"
    );
    GenerationError::InvalidResponseFormat
  })
}

#[cfg(test)]
pub(crate) mod tests {
  use super::*;
  use crate::domain::{Grade, QuestionCount, QuestionForm, Subject};
  use crate::gemini::ModelError;
  use async_trait::async_trait;
  use std::sync::atomic::{AtomicUsize, Ordering};

  pub(crate) const FIXTURE: &str = include_str!("testdata/exam.json");

  /// Scripted model: returns a fixed outcome and counts calls.
  pub(crate) struct Scripted {
    reply: Result<String, u16>,
    delay: Duration,
    pub(crate) calls: AtomicUsize,
  }

  impl Scripted {
    pub(crate) fn ok(text: &str) -> Arc<Self> {
      Arc::new(Self { reply: Ok(text.to_string()), delay: Duration::ZERO, calls: AtomicUsize::new(0) })
    }
    pub(crate) fn failing(status: u16) -> Arc<Self> {
      Arc::new(Self { reply: Err(status), delay: Duration::ZERO, calls: AtomicUsize::new(0) })
    }
    fn slow(text: &str, delay: Duration) -> Arc<Self> {
      Arc::new(Self { reply: Ok(text.to_string()), delay, calls: AtomicUsize::new(0) })
    }
  }

  #[async_trait]
  impl TextModel for Scripted {
    async fn generate_text(&self, _prompt: &str) -> Result<String, ModelError> {
      self.calls.fetch_add(1, Ordering::SeqCst);
      if !self.delay.is_zero() {
        tokio::time::sleep(self.delay).await;
      }
      match &self.reply {
        Ok(t) => Ok(t.clone()),
        Err(status) => Err(ModelError::Api { status: *status, message: "API key not valid".into() }),
      }
    }
    fn model_name(&self) -> &str { "scripted" }
  }

  fn request() -> GenerationRequest {
    GenerationRequest::new(
      Subject::Matematika,
      "Persamaan Linear",
      Grade::Seven,
      QuestionCount::Thirty,
      vec![QuestionForm::MultipleChoice, QuestionForm::ComplexMultipleChoice, QuestionForm::ShortAnswer],
    )
    .unwrap()
  }

  fn generator(model: Arc<Scripted>, strict: bool) -> ExamGenerator {
    let settings = GenerationSettings { strict_validation: strict, ..GenerationSettings::default() };
    ExamGenerator::new(model, settings)
  }

  #[test]
  fn strip_leaves_unfenced_text_trimmed() {
    assert_eq!(strip_code_fences("  {\"a\": 1}\n"), "{\"a\": 1}");
    assert_eq!(strip_code_fences("Sorry, I cannot help with that."), "Sorry, I cannot help with that.");
  }

  #[test]
  fn strip_removes_json_and_plain_fences() {
    assert_eq!(strip_code_fences("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
    assert_eq!(strip_code_fences("```\n{\"a\": 1}\n```"), "{\"a\": 1}");
    assert_eq!(strip_code_fences("\n```JSON\n{\"a\": 1}\n```  \n"), "{\"a\": 1}");
  }

  #[test]
  fn strip_removes_info_string_without_newline() {
    assert_eq!(strip_code_fences("```json {\"a\": 1}```"), "{\"a\": 1}");
    assert_eq!(strip_code_fences("```json{\"a\": 1}\n```"), "{\"a\": 1}");
    assert_eq!(strip_code_fences("```[1, 2]```"), "[1, 2]");
  }

  #[test]
  fn strip_is_idempotent() {
    for input in [
      "```json\n{\"a\": 1}\n```",
      "{\"a\": 1}",
      "  plain  ",
      "```\n[1]\n```",
      "A``````",
      "``````json{}",
      "```json {\"a\": 1}```",
      "```",
    ] {
      let once = strip_code_fences(input);
      assert_eq!(strip_code_fences(once), once);
    }
  }

  #[test]
  fn decode_round_trips() {
    let exam = decode_exam(FIXTURE).unwrap();
    let encoded = serde_json::to_string(&exam).unwrap();
    assert_eq!(decode_exam(&encoded).unwrap(), exam);
  }

  #[test]
  fn fenced_and_unfenced_decode_equal() {
    let expected = decode_exam(FIXTURE).unwrap();
    for fenced in [
      format!("```json\n{FIXTURE}\n```"),
      format!("```json {FIXTURE}```"),
      format!("```json{FIXTURE}\n```"),
    ] {
      assert_eq!(decode_exam(&fenced).unwrap(), expected);
    }
  }

  #[test]
  fn non_json_and_wrong_shape_are_invalid_format() {
    assert_eq!(decode_exam("Sorry, I cannot help with that."), Err(GenerationError::InvalidResponseFormat));
    assert_eq!(decode_exam("{\"identitasSoal\": {}}"), Err(GenerationError::InvalidResponseFormat));
    assert_eq!(
      decode_exam(&FIXTURE.replace("\"jumlahSoal\": 30", "\"jumlahSoal\": \"tiga puluh\"")),
      Err(GenerationError::InvalidResponseFormat)
    );
  }

  #[tokio::test]
  async fn generate_returns_decoded_exam_after_one_call() {
    let model = Scripted::ok(&format!("```json\n{FIXTURE}\n```"));
    let out = generator(model.clone(), false).generate(&request()).await.unwrap();
    assert_eq!(out.exam, decode_exam(FIXTURE).unwrap());
    assert_eq!(model.calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn permissive_mode_returns_audit_issues_with_exam() {
    // Fixture holds 3 questions while 30 were requested.
    let out = generator(Scripted::ok(FIXTURE), false).generate(&request()).await.unwrap();
    assert_eq!(out.issues, vec![AuditIssue::QuestionCountMismatch { expected: 30, actual: 3 }]);
  }

  #[tokio::test]
  async fn refusal_text_is_invalid_format() {
    let model = Scripted::ok("Sorry, I cannot help with that.");
    let err = generator(model, false).generate(&request()).await.unwrap_err();
    assert_eq!(err, GenerationError::InvalidResponseFormat);
  }

  #[tokio::test]
  async fn transport_failure_is_request_failed_without_retry() {
    let model = Scripted::failing(401);
    let err = generator(model.clone(), false).generate(&request()).await.unwrap_err();
    assert_eq!(err, GenerationError::RequestFailed);
    assert_eq!(model.calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test(start_paused = true)]
  async fn deadline_elapsing_is_request_failed() {
    let model = Scripted::slow(FIXTURE, Duration::from_secs(600));
    let err = generator(model, false)
      .generate_with_deadline(&request(), Duration::from_secs(5))
      .await
      .unwrap_err();
    assert_eq!(err, GenerationError::RequestFailed);
  }

  #[tokio::test]
  async fn strict_mode_rejects_audit_issues() {
    // Fixture holds 3 questions while 30 were requested.
    let err = generator(Scripted::ok(FIXTURE), true).generate(&request()).await.unwrap_err();
    assert_eq!(err, GenerationError::InvalidResponseFormat);
  }

  #[tokio::test]
  async fn http_failures_from_gemini_surface_as_request_failed() {
    use crate::gemini::{tests::serve, Gemini};
    use axum::{http::StatusCode, routing::post, Router};

    let router = Router::new().route("/models/:call", post(|| async { (StatusCode::UNAUTHORIZED, "denied") }));
    let base = serve(router).await;
    let gemini = Gemini::new("bad-key", base, Duration::from_secs(5)).unwrap();
    let gen = ExamGenerator::new(Arc::new(gemini), GenerationSettings::default());
    assert_eq!(gen.generate(&request()).await.unwrap_err(), GenerationError::RequestFailed);
  }
}
