//! Plain-text export of an exam package (the "copy" / download view).
//!
//! Sections mirror the on-screen layout: identity, objectives, blueprint
//! (tab-separated), questions with key and explanation, and the optional
//! answer-key table.

use std::fmt::Write;

use crate::domain::GeneratedExam;

const BLUEPRINT_HEADERS: [&str; 8] = [
    "No",
    "Capaian Pembelajaran",
    "Tujuan Pembelajaran",
    "Indikator Soal",
    "Level Kognitif",
    "Bentuk Soal",
    "Tingkat Kesulitan",
    "Nomor Soal",
];

const ANSWER_KEY_HEADERS: [&str; 4] = ["No", "Bentuk Soal", "Jawaban Benar", "Pembahasan Singkat"];

fn heading(out: &mut String, title: &str) {
    out.push_str(title);
    out.push('\n');
    out.push_str(&"=".repeat(title.chars().count()));
    out.push('\n');
}

/// Flatten an exam package into plain text.
pub fn to_plain_text(exam: &GeneratedExam) -> String {
    let mut out = String::new();
    let id = &exam.identity;

    // fmt::Write on String is infallible.
    heading(&mut out, "BAGIAN 1: IDENTITAS SOAL");
    let _ = writeln!(out, "Nama Mata Pelajaran: {}", id.subject_name);
    let _ = writeln!(out, "Fase/Kelas: {}", id.grade_label);
    let _ = writeln!(out, "Topik/Materi: {}", id.topic);
    let _ = writeln!(out, "Alokasi Waktu: {}", id.time_allotted);
    let _ = writeln!(out, "Jumlah Soal: {} butir", id.question_count);
    out.push('\n');

    heading(&mut out, "BAGIAN 2: TUJUAN PEMBELAJARAN");
    for (i, objective) in exam.objectives.iter().enumerate() {
        let _ = writeln!(out, "{}. {}", i + 1, objective);
    }
    out.push('\n');

    heading(&mut out, "BAGIAN 3: KISI-KISI SOAL");
    out.push_str(&BLUEPRINT_HEADERS.join("\t"));
    out.push('\n');
    for row in &exam.blueprint {
        let _ = writeln!(
            out,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            row.number,
            row.learning_outcome,
            row.objective,
            row.indicator,
            row.cognitive_level,
            row.question_form,
            row.difficulty,
            row.question_number_ref,
        );
    }
    out.push('\n');

    heading(&mut out, "BAGIAN 4: SOAL UJIAN");
    for q in &exam.questions {
        let _ = writeln!(out, "\n{}. ({})", q.number, q.question_form);
        let _ = writeln!(out, "{}", q.prompt_text);
        if let Some(statement) = &q.statement {
            let _ = writeln!(out, "Pernyataan: {statement}");
        }
        for option in q.options.iter().flatten() {
            let _ = writeln!(out, "{option}");
        }
        for pair in q.pairs.iter().flatten() {
            let _ = writeln!(out, "{}  ->  {}", pair.left, pair.right);
        }
        let _ = writeln!(out, "\nKunci Jawaban: {}", q.correct_answer.joined());
        let _ = writeln!(out, "Pembahasan: {}", q.explanation);
    }
    out.push('\n');

    if let Some(key) = &exam.answer_key {
        heading(&mut out, "BAGIAN 5: KUNCI JAWABAN DAN PEMBAHASAN");
        out.push_str(&ANSWER_KEY_HEADERS.join("\t"));
        out.push('\n');
        for row in key {
            let _ = writeln!(
                out,
                "{}\t{}\t{}\t{}",
                row.number,
                row.question_form,
                row.correct_answer.joined(),
                row.short_explanation,
            );
        }
    }

    out
}
