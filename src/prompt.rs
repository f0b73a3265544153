//! Prompt construction for exam generation.
//!
//! The model call carries no response schema; the instruction text alone holds
//! the response to the `GeneratedExam` shape.

use crate::config::Prompts;
use crate::domain::{GenerationRequest, ALLOTTED_MINUTES};
use crate::util::fill_template;

/// Default persona line (`{persona}` in the template).
pub const DEFAULT_PERSONA: &str = "You are an expert curriculum developer and teacher for Indonesian Madrasah Tsanawiyah (MTs) schools, specializing in high-quality exam materials based on Kurikulum Merdeka (the Indonesian national curriculum).";

/// Default exam template. Placeholders: {persona} {subject} {phase} {grade}
/// {topic} {minutes} {count} {forms} {schema}.
pub const DEFAULT_EXAM_TEMPLATE: &str = r#"
{persona}

Your task is to generate a complete exam package based on the following specifications. Follow every instruction carefully.

**SPECIFICATIONS:**
- **Nama Mata Pelajaran:** {subject}
- **Fase/Kelas:** {phase}
- **Topik/Materi:** {topic}
- **Alokasi Waktu:** {minutes} menit
- **Jumlah Soal:** {count} butir
- **Bentuk Soal yang Diinginkan:** {forms}

**STRUCTURE AND CONTENT REQUIREMENTS:**

**Bagian 1. Identitas Soal**
- Fill this section with EXACTLY the specifications above (subject, phase/class, topic, time allocation, number of questions).

**Bagian 2. Tujuan Pembelajaran**
- Write learning objectives relevant to the topic and to the Kurikulum Merdeka Phase D learning outcomes (Capaian Pembelajaran) for class {grade}.

**Bagian 3. Kisi-Kisi Soal (Tabel)**
- Create a detailed exam blueprint with the columns: No | Capaian Pembelajaran | Tujuan Pembelajaran | Indikator Soal | Level Kognitif (C1-C6) | Bentuk Soal | Tingkat Kesulitan (Mudah/Sedang/Sulit) | Nomor Soal.
- The blueprint MUST align with the questions you create. The "Bentuk Soal" column MUST ONLY contain types from this list: {forms}.

**Bagian 4. Soal Ujian**
- Create EXACTLY {count} questions. Not fewer, not more.
- IMPORTANT: You MUST ONLY use the following question types: {forms}. Do NOT use any other type.
- Distribute the number of questions across the selected types logically.
- For EACH question you MUST provide:
    1. The question number and type (e.g. "Pilihan Ganda", "Benar atau Salah").
    2. The main question text.
    3. Answer choices, if applicable ("Pilihan Ganda" and "Pilihan Ganda Kompleks").
    4. The correct answer key. For "Pilihan Ganda Kompleks" the key MUST be a list of all correct choices; for every other type it MUST be a single string.
    5. A brief explanation (pembahasan).
- For "Benar atau Salah" put the statement to judge in "pernyataan". For "Menjodohkan" put the pairs to match in "pasangan".
- For Matematika, include the step-by-step solution in the explanation.
- For Bahasa Arab, include harakat, transliteration and translation.

**Bagian 5. Kunci Jawaban dan Pembahasan (Tabel)**
- Create a final summary table with the columns: No | Bentuk Soal | Jawaban Benar | Pembahasan Singkat, one row per question.

**GENERAL RULES:**
- Use clear, communicative language appropriate for MTs students of class {grade}.
- Vary the difficulty level (Mudah, Sedang, Sulit).
- Use a range of cognitive levels (C1-C6, Bloom's Taxonomy).
- Use real-world contexts relevant to students' lives for PAI and language subjects.

**OUTPUT FORMAT:**
Your final and ONLY output MUST be a single, valid JSON object. Do NOT include any text, explanation or markdown formatting (no ```json fences) before or after the JSON object.
The JSON object MUST strictly follow this structure (types shown as values, "?" marks optional keys):

{schema}

Now, generate the exam package. Respond with the JSON object ONLY.
"#;

/// Field list of the expected response, embedded into the template as `{schema}`.
pub const RESPONSE_SCHEMA: &str = r#"{
  "identitasSoal": {
    "mataPelajaran": string,
    "faseKelas": string,
    "topikMateri": string,
    "alokasiWaktu": string,
    "jumlahSoal": number
  },
  "tujuanPembelajaran": [string],
  "kisiKisi": [{
    "no": number,
    "capaianPembelajaran": string,
    "tujuanPembelajaran": string,
    "indikatorSoal": string,
    "levelKognitif": string,          // "C1" .. "C6"
    "bentukSoal": string,             // one of the requested types
    "tingkatKesulitan": string,       // "Mudah", "Sedang" or "Sulit"
    "nomorSoal": string
  }],
  "soalUjian": [{
    "nomor": number,
    "bentukSoal": string,
    "soal": string,
    "pilihan"?: [string],             // e.g. ["A. ...", "B. ..."]
    "pernyataan"?: string,
    "pasangan"?: [{ "A": string, "B": string }],
    "kunciJawaban": string | [string], // [string] only for "Pilihan Ganda Kompleks"
    "pembahasan": string
  }],
  "kunciJawabanTabel": [{
    "no": number,
    "bentukSoal": string,
    "jawabanBenar": string | [string],
    "pembahasanSingkat": string
  }]
}"#;

/// Build the generation prompt with the built-in prompt texts.
#[cfg(test)]
pub fn build_prompt(req: &GenerationRequest) -> String {
  build_prompt_with(&Prompts::default(), req)
}

/// Build the generation prompt from (possibly configured) prompt texts.
/// Pure and deterministic for a given request.
pub fn build_prompt_with(prompts: &Prompts, req: &GenerationRequest) -> String {
  let grade = req.grade().number().to_string();
  let minutes = ALLOTTED_MINUTES.to_string();
  let count = req.question_count().get().to_string();
  let phase = req.grade().phase_label();
  let forms = req.forms_label();

  fill_template(
    &prompts.exam_template,
    &[
      ("persona", prompts.persona.as_str()),
      ("subject", req.subject().label()),
      ("phase", phase.as_str()),
      ("grade", grade.as_str()),
      ("topic", req.topic()),
      ("minutes", minutes.as_str()),
      ("count", count.as_str()),
      ("forms", forms.as_str()),
      ("schema", RESPONSE_SCHEMA),
    ],
  )
  .trim()
  .to_string()
}
