//! Content audit of a decoded exam against the request that produced it.
//!
//! Decoding already guarantees the shape (types, required arrays). The audit
//! covers what the model is only asked to honour: count, forms, answer shapes.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use crate::domain::{Answer, GeneratedExam, GenerationRequest, QuestionForm};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AuditIssue {
    QuestionCountMismatch { expected: u32, actual: usize },
    IdentityCountMismatch { expected: u32, declared: u32 },
    UnknownForm { number: u32, form: String },
    UnrequestedForm { number: u32, form: String },
    MissingOptions { number: u32 },
    AnswerShape { number: u32, form: String, multiple: bool },
    EmptyQuestionText { number: u32 },
    DuplicateNumber { number: u32 },
}

impl fmt::Display for AuditIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditIssue::QuestionCountMismatch { expected, actual } => {
                write!(f, "expected {expected} questions, got {actual}")
            }
            AuditIssue::IdentityCountMismatch { expected, declared } => {
                write!(f, "identity declares {declared} questions, requested {expected}")
            }
            AuditIssue::UnknownForm { number, form } => {
                write!(f, "question {number}: unknown form {form:?}")
            }
            AuditIssue::UnrequestedForm { number, form } => {
                write!(f, "question {number}: form {form:?} was not requested")
            }
            AuditIssue::MissingOptions { number } => {
                write!(f, "question {number}: answer choices missing")
            }
            AuditIssue::AnswerShape { number, form, multiple } => {
                let shape = if *multiple { "a list" } else { "a single value" };
                write!(f, "question {number}: answer key for {form:?} is {shape}")
            }
            AuditIssue::EmptyQuestionText { number } => {
                write!(f, "question {number}: empty question text")
            }
            AuditIssue::DuplicateNumber { number } => {
                write!(f, "question number {number} appears more than once")
            }
        }
    }
}

/// List every deviation of `exam` from `req`. Empty means the exam is clean.
pub fn audit_exam(req: &GenerationRequest, exam: &GeneratedExam) -> Vec<AuditIssue> {
    let mut issues = Vec::new();
    let expected = req.question_count().get();

    if exam.questions.len() != expected as usize {
        issues.push(AuditIssue::QuestionCountMismatch { expected, actual: exam.questions.len() });
    }
    if exam.identity.question_count != expected {
        issues.push(AuditIssue::IdentityCountMismatch {
            expected,
            declared: exam.identity.question_count,
        });
    }

    let mut seen = HashSet::new();
    for q in &exam.questions {
        if !seen.insert(q.number) {
            issues.push(AuditIssue::DuplicateNumber { number: q.number });
        }
        if q.prompt_text.trim().is_empty() {
            issues.push(AuditIssue::EmptyQuestionText { number: q.number });
        }

        let Some(form) = QuestionForm::from_label(&q.question_form) else {
            issues.push(AuditIssue::UnknownForm { number: q.number, form: q.question_form.clone() });
            continue;
        };
        if !req.question_forms().contains(&form) {
            issues.push(AuditIssue::UnrequestedForm { number: q.number, form: q.question_form.clone() });
        }
        if form.expects_options() && q.options.as_ref().map_or(true, |o| o.is_empty()) {
            issues.push(AuditIssue::MissingOptions { number: q.number });
        }
        let multiple = matches!(q.correct_answer, Answer::Multiple(_));
        if multiple != form.admits_multiple_answers() {
            issues.push(AuditIssue::AnswerShape {
                number: q.number,
                form: q.question_form.clone(),
                multiple,
            });
        }
    }

    issues
}
