//! Domain models: the closed option sets of the exam form, the validated
//! generation request, and the exam package decoded from the model.
//!
//! Wire names follow the form/frontend contract (Indonesian camelCase keys),
//! Rust names are English.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fixed time allocation written into every exam package.
pub const ALLOTTED_MINUTES: u32 = 90;

/// Longest topic accepted from the form.
pub const TOPIC_MAX_CHARS: usize = 200;

/// School subjects offered by the form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Subject {
  #[serde(rename = "Bahasa Indonesia")] BahasaIndonesia,
  #[serde(rename = "Bahasa Inggris")] BahasaInggris,
  #[serde(rename = "Bahasa Arab")] BahasaArab,
  #[serde(rename = "Matematika")] Matematika,
  #[serde(rename = "Fikih")] Fikih,
  #[serde(rename = "SKI (Sejarah Kebudayaan Islam)")] Ski,
  #[serde(rename = "Al-Qur’an Hadis")] AlQuranHadis,
  #[serde(rename = "Akidah Akhlak")] AkidahAkhlak,
  #[serde(rename = "IPA")] Ipa,
  #[serde(rename = "IPS")] Ips,
  #[serde(rename = "Informatika")] Informatika,
  #[serde(rename = "PJOK (Penjas)")] Pjok,
  #[serde(rename = "Seni Budaya")] SeniBudaya,
  #[serde(rename = "PKN")] Pkn,
  #[serde(rename = "Bahasa Sunda")] BahasaSunda,
}

impl Subject {
  pub const ALL: [Subject; 15] = [
    Subject::BahasaIndonesia,
    Subject::BahasaInggris,
    Subject::BahasaArab,
    Subject::Matematika,
    Subject::Fikih,
    Subject::Ski,
    Subject::AlQuranHadis,
    Subject::AkidahAkhlak,
    Subject::Ipa,
    Subject::Ips,
    Subject::Informatika,
    Subject::Pjok,
    Subject::SeniBudaya,
    Subject::Pkn,
    Subject::BahasaSunda,
  ];

  pub fn label(self) -> &'static str {
    match self {
      Subject::BahasaIndonesia => "Bahasa Indonesia",
      Subject::BahasaInggris => "Bahasa Inggris",
      Subject::BahasaArab => "Bahasa Arab",
      Subject::Matematika => "Matematika",
      Subject::Fikih => "Fikih",
      Subject::Ski => "SKI (Sejarah Kebudayaan Islam)",
      Subject::AlQuranHadis => "Al-Qur’an Hadis",
      Subject::AkidahAkhlak => "Akidah Akhlak",
      Subject::Ipa => "IPA",
      Subject::Ips => "IPS",
      Subject::Informatika => "Informatika",
      Subject::Pjok => "PJOK (Penjas)",
      Subject::SeniBudaya => "Seni Budaya",
      Subject::Pkn => "PKN",
      Subject::BahasaSunda => "Bahasa Sunda",
    }
  }
}

impl fmt::Display for Subject {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.label()) }
}

/// MTs grade (kelas). All three belong to curriculum phase D.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Grade {
  Seven,
  Eight,
  Nine,
}

impl Grade {
  pub const ALL: [Grade; 3] = [Grade::Seven, Grade::Eight, Grade::Nine];

  pub fn number(self) -> u8 {
    match self {
      Grade::Seven => 7,
      Grade::Eight => 8,
      Grade::Nine => 9,
    }
  }

  /// e.g. "Fase D (Kelas 7 MTs)"
  pub fn phase_label(self) -> String {
    format!("Fase D (Kelas {} MTs)", self.number())
  }
}

impl TryFrom<u8> for Grade {
  type Error = String;
  fn try_from(v: u8) -> Result<Self, Self::Error> {
    match v {
      7 => Ok(Grade::Seven),
      8 => Ok(Grade::Eight),
      9 => Ok(Grade::Nine),
      other => Err(format!("unsupported grade {other}; expected 7, 8 or 9")),
    }
  }
}

impl From<Grade> for u8 {
  fn from(g: Grade) -> u8 { g.number() }
}

/// Number of questions in the exam (jumlah soal).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum QuestionCount {
  Thirty,
  Forty,
  Fifty,
}

impl QuestionCount {
  pub const ALL: [QuestionCount; 3] = [QuestionCount::Thirty, QuestionCount::Forty, QuestionCount::Fifty];

  pub fn get(self) -> u32 {
    match self {
      QuestionCount::Thirty => 30,
      QuestionCount::Forty => 40,
      QuestionCount::Fifty => 50,
    }
  }
}

impl TryFrom<u32> for QuestionCount {
  type Error = String;
  fn try_from(v: u32) -> Result<Self, Self::Error> {
    match v {
      30 => Ok(QuestionCount::Thirty),
      40 => Ok(QuestionCount::Forty),
      50 => Ok(QuestionCount::Fifty),
      other => Err(format!("unsupported question count {other}; expected 30, 40 or 50")),
    }
  }
}

impl From<QuestionCount> for u32 {
  fn from(c: QuestionCount) -> u32 { c.get() }
}

/// Question form (bentuk soal).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuestionForm {
  #[serde(rename = "Pilihan Ganda")] MultipleChoice,
  #[serde(rename = "Benar atau Salah")] TrueFalse,
  #[serde(rename = "Pilihan Ganda Kompleks")] ComplexMultipleChoice,
  #[serde(rename = "Menjodohkan")] Matching,
  #[serde(rename = "Isian Singkat")] ShortAnswer,
}

impl QuestionForm {
  pub const ALL: [QuestionForm; 5] = [
    QuestionForm::MultipleChoice,
    QuestionForm::TrueFalse,
    QuestionForm::ComplexMultipleChoice,
    QuestionForm::Matching,
    QuestionForm::ShortAnswer,
  ];

  pub fn label(self) -> &'static str {
    match self {
      QuestionForm::MultipleChoice => "Pilihan Ganda",
      QuestionForm::TrueFalse => "Benar atau Salah",
      QuestionForm::ComplexMultipleChoice => "Pilihan Ganda Kompleks",
      QuestionForm::Matching => "Menjodohkan",
      QuestionForm::ShortAnswer => "Isian Singkat",
    }
  }

  pub fn abbreviation(self) -> &'static str {
    match self {
      QuestionForm::MultipleChoice => "PG",
      QuestionForm::TrueFalse => "BS",
      QuestionForm::ComplexMultipleChoice => "PGK",
      QuestionForm::Matching => "MJ",
      QuestionForm::ShortAnswer => "IS",
    }
  }

  /// Forms rendered with a list of answer choices.
  pub fn expects_options(self) -> bool {
    matches!(self, QuestionForm::MultipleChoice | QuestionForm::ComplexMultipleChoice)
  }

  /// Only complex multiple choice admits more than one correct selection.
  pub fn admits_multiple_answers(self) -> bool {
    matches!(self, QuestionForm::ComplexMultipleChoice)
  }

  /// Lenient lookup of a form name as written by the model
  /// (case-insensitive label, or the short abbreviation).
  pub fn from_label(s: &str) -> Option<Self> {
    let s = s.trim();
    QuestionForm::ALL
      .into_iter()
      .find(|f| f.label().eq_ignore_ascii_case(s) || f.abbreviation().eq_ignore_ascii_case(s))
  }
}

impl fmt::Display for QuestionForm {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.label()) }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError {
  #[error("Topik/materi tidak boleh kosong.")]
  EmptyTopic,
  #[error("Topik/materi terlalu panjang (maksimal {max} karakter).")]
  TopicTooLong { max: usize },
  #[error("Pilih minimal satu bentuk soal.")]
  NoQuestionForms,
}

/// One validated submission of the exam form. Immutable once built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenerationRequest {
  subject: Subject,
  topic: String,
  grade: Grade,
  question_count: QuestionCount,
  question_forms: Vec<QuestionForm>,
}

impl GenerationRequest {
  /// Trims the topic and drops duplicate forms, keeping first-seen order.
  pub fn new(
    subject: Subject,
    topic: &str,
    grade: Grade,
    question_count: QuestionCount,
    forms: impl IntoIterator<Item = QuestionForm>,
  ) -> Result<Self, RequestError> {
    let topic = topic.trim();
    if topic.is_empty() {
      return Err(RequestError::EmptyTopic);
    }
    if topic.chars().count() > TOPIC_MAX_CHARS {
      return Err(RequestError::TopicTooLong { max: TOPIC_MAX_CHARS });
    }

    let mut question_forms: Vec<QuestionForm> = Vec::new();
    for f in forms {
      if !question_forms.contains(&f) { question_forms.push(f); }
    }
    if question_forms.is_empty() {
      return Err(RequestError::NoQuestionForms);
    }

    Ok(Self { subject, topic: topic.to_string(), grade, question_count, question_forms })
  }

  pub fn subject(&self) -> Subject { self.subject }
  pub fn topic(&self) -> &str { &self.topic }
  pub fn grade(&self) -> Grade { self.grade }
  pub fn question_count(&self) -> QuestionCount { self.question_count }
  pub fn question_forms(&self) -> &[QuestionForm] { &self.question_forms }

  /// Requested form labels joined for display, e.g. "Pilihan Ganda, Isian Singkat".
  pub fn forms_label(&self) -> String {
    self.question_forms.iter().map(|f| f.label()).collect::<Vec<_>>().join(", ")
  }
}

// --- Generated exam package ---

/// Correct answer of a question: one value, or several for complex multiple choice.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
  Single(String),
  Multiple(Vec<String>),
}

impl Answer {
  /// Display form; multiple answers are joined with ", ".
  pub fn joined(&self) -> String {
    match self {
      Answer::Single(s) => s.clone(),
      Answer::Multiple(v) => v.join(", "),
    }
  }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamIdentity {
  #[serde(rename = "mataPelajaran")] pub subject_name: String,
  #[serde(rename = "faseKelas")] pub grade_label: String,
  #[serde(rename = "topikMateri")] pub topic: String,
  #[serde(rename = "alokasiWaktu")] pub time_allotted: String,
  #[serde(rename = "jumlahSoal")] pub question_count: u32,
}

/// One row of the kisi-kisi (exam blueprint).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlueprintRow {
  #[serde(rename = "no")] pub number: u32,
  #[serde(rename = "capaianPembelajaran")] pub learning_outcome: String,
  #[serde(rename = "tujuanPembelajaran")] pub objective: String,
  #[serde(rename = "indikatorSoal")] pub indicator: String,
  #[serde(rename = "levelKognitif")] pub cognitive_level: String,
  #[serde(rename = "bentukSoal")] pub question_form: String,
  #[serde(rename = "tingkatKesulitan")] pub difficulty: String,
  #[serde(rename = "nomorSoal")] pub question_number_ref: String,
}

/// Left/right item of a matching (menjodohkan) question.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchingPair {
  #[serde(rename = "A")] pub left: String,
  #[serde(rename = "B")] pub right: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
  #[serde(rename = "nomor")] pub number: u32,
  #[serde(rename = "bentukSoal")] pub question_form: String,
  #[serde(rename = "soal")] pub prompt_text: String,
  #[serde(rename = "pilihan", default, skip_serializing_if = "Option::is_none")]
  pub options: Option<Vec<String>>,
  #[serde(rename = "pernyataan", default, skip_serializing_if = "Option::is_none")]
  pub statement: Option<String>,
  #[serde(rename = "pasangan", default, skip_serializing_if = "Option::is_none")]
  pub pairs: Option<Vec<MatchingPair>>,
  #[serde(rename = "kunciJawaban")] pub correct_answer: Answer,
  #[serde(rename = "pembahasan")] pub explanation: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerKeyRow {
  #[serde(rename = "no")] pub number: u32,
  #[serde(rename = "bentukSoal")] pub question_form: String,
  #[serde(rename = "jawabanBenar")] pub correct_answer: Answer,
  #[serde(rename = "pembahasanSingkat")] pub short_explanation: String,
}

/// Complete exam package as returned by the model. Produced only by decoding.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedExam {
  #[serde(rename = "identitasSoal")] pub identity: ExamIdentity,
  #[serde(rename = "tujuanPembelajaran")] pub objectives: Vec<String>,
  #[serde(rename = "kisiKisi")] pub blueprint: Vec<BlueprintRow>,
  #[serde(rename = "soalUjian")] pub questions: Vec<Question>,
  #[serde(rename = "kunciJawabanTabel", default, skip_serializing_if = "Option::is_none")]
  pub answer_key: Option<Vec<AnswerKeyRow>>,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn forms(v: &[QuestionForm]) -> Vec<QuestionForm> { v.to_vec() }

  #[test]
  fn subject_labels_match_wire_names() {
    assert_eq!(Subject::ALL.len(), 15);
    for s in Subject::ALL {
      let wire = serde_json::to_string(&s).unwrap();
      assert_eq!(wire, format!("\"{}\"", s.label()));
      let back: Subject = serde_json::from_str(&wire).unwrap();
      assert_eq!(back, s);
    }
  }

  #[test]
  fn grade_and_count_are_numbers_on_the_wire() {
    assert_eq!(serde_json::to_string(&Grade::Eight).unwrap(), "8");
    assert_eq!(serde_json::from_str::<Grade>("9").unwrap(), Grade::Nine);
    assert!(serde_json::from_str::<Grade>("10").is_err());

    assert_eq!(serde_json::to_string(&QuestionCount::Forty).unwrap(), "40");
    assert_eq!(serde_json::from_str::<QuestionCount>("50").unwrap(), QuestionCount::Fifty);
    assert!(serde_json::from_str::<QuestionCount>("35").is_err());
  }

  #[test]
  fn phase_label_names_grade() {
    assert_eq!(Grade::Seven.phase_label(), "Fase D (Kelas 7 MTs)");
  }

  #[test]
  fn form_lookup_is_lenient() {
    assert_eq!(QuestionForm::from_label("pilihan ganda"), Some(QuestionForm::MultipleChoice));
    assert_eq!(QuestionForm::from_label(" PGK "), Some(QuestionForm::ComplexMultipleChoice));
    assert_eq!(QuestionForm::from_label("Esai"), None);
  }

  #[test]
  fn request_rejects_blank_topic_and_empty_forms() {
    let err = GenerationRequest::new(Subject::Ipa, "   ", Grade::Seven, QuestionCount::Thirty, forms(&[QuestionForm::MultipleChoice]));
    assert_eq!(err.unwrap_err(), RequestError::EmptyTopic);

    let err = GenerationRequest::new(Subject::Ipa, "Sel", Grade::Seven, QuestionCount::Thirty, Vec::new());
    assert_eq!(err.unwrap_err(), RequestError::NoQuestionForms);

    let long = "x".repeat(TOPIC_MAX_CHARS + 1);
    let err = GenerationRequest::new(Subject::Ipa, &long, Grade::Seven, QuestionCount::Thirty, forms(&[QuestionForm::TrueFalse]));
    assert_eq!(err.unwrap_err(), RequestError::TopicTooLong { max: TOPIC_MAX_CHARS });
  }

  #[test]
  fn request_trims_topic_and_dedups_forms_in_order() {
    let req = GenerationRequest::new(
      Subject::Matematika,
      "  Persamaan Linear ",
      Grade::Seven,
      QuestionCount::Thirty,
      forms(&[QuestionForm::ShortAnswer, QuestionForm::MultipleChoice, QuestionForm::ShortAnswer]),
    ).unwrap();
    assert_eq!(req.topic(), "Persamaan Linear");
    assert_eq!(req.question_forms(), &[QuestionForm::ShortAnswer, QuestionForm::MultipleChoice]);
    assert_eq!(req.forms_label(), "Isian Singkat, Pilihan Ganda");
  }

  #[test]
  fn answer_decodes_string_or_list() {
    let one: Answer = serde_json::from_str("\"B\"").unwrap();
    assert_eq!(one, Answer::Single("B".into()));
    let many: Answer = serde_json::from_str("[\"A\", \"C\"]").unwrap();
    assert_eq!(many, Answer::Multiple(vec!["A".into(), "C".into()]));
    assert_eq!(many.joined(), "A, C");
    assert!(serde_json::from_str::<Answer>("{\"x\": 1}").is_err());
  }

  #[test]
  fn exam_fixture_decodes_with_optional_fields() {
    let exam: GeneratedExam = serde_json::from_str(include_str!("testdata/exam.json")).unwrap();
    assert_eq!(exam.identity.subject_name, "Matematika");
    assert_eq!(exam.questions.len(), 3);
    assert_eq!(exam.questions[0].options.as_ref().map(|o| o.len()), Some(4));
    assert_eq!(exam.questions[1].correct_answer, Answer::Multiple(vec!["A".into(), "C".into()]));
    assert!(exam.questions[2].options.is_none());
    assert_eq!(exam.answer_key.as_ref().map(|k| k.len()), Some(3));
  }
}
