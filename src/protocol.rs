//! Public protocol structs for the HTTP endpoints (serde ready).
//! Field names follow the form frontend (camelCase, Indonesian where the form uses it).

use serde::{Deserialize, Serialize};

use crate::domain::{
    GeneratedExam, GenerationRequest, Grade, QuestionCount, QuestionForm, RequestError, Subject,
};

/// Exam form submission.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateIn {
    pub subject: Subject,
    pub topic: String,
    pub kelas: Grade,
    pub question_count: QuestionCount,
    pub bentuk_soal: Vec<QuestionForm>,
}

impl TryFrom<GenerateIn> for GenerationRequest {
    type Error = RequestError;

    fn try_from(body: GenerateIn) -> Result<Self, Self::Error> {
        GenerationRequest::new(body.subject, &body.topic, body.kelas, body.question_count, body.bentuk_soal)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateOut {
    pub exam: GeneratedExam,
    /// Human-readable content audit findings; empty when the exam is clean.
    pub warnings: Vec<String>,
    pub plain_text: String,
}

/// Option lists for the form widgets.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionsOut {
    pub subjects: Vec<Subject>,
    pub grades: Vec<Grade>,
    pub question_counts: Vec<QuestionCount>,
    pub question_forms: Vec<FormOption>,
}

#[derive(Debug, Serialize)]
pub struct FormOption {
    pub value: QuestionForm,
    pub label: String,
}

impl OptionsOut {
    pub fn all() -> Self {
        Self {
            subjects: Subject::ALL.to_vec(),
            grades: Grade::ALL.to_vec(),
            question_counts: QuestionCount::ALL.to_vec(),
            question_forms: QuestionForm::ALL
                .into_iter()
                .map(|f| FormOption { value: f, label: format!("{} ({})", f.label(), f.abbreviation()) })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorOut {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}
