//! Seed data: built-in quizzes, decks and summary modules that make the service useful
//! even without a remote backend or external config.

use crate::domain::{
  CorrectAnswerRow, Deck, Flashcard, Module, PdfFile, QuestionRow, QuestionType, Quiz, Section, SectionType,
};

#[allow(clippy::too_many_arguments)]
fn question(
  quiz_id: &str,
  id: &str,
  kind: QuestionType,
  text: &str,
  options: &[&str],
  correct: Option<CorrectAnswerRow>,
  feedback: &str,
  order: i64,
) -> QuestionRow {
  QuestionRow {
    id: id.into(),
    quiz_id: Some(quiz_id.into()),
    kind,
    question: text.into(),
    options: if options.is_empty() { None } else { Some(options.iter().map(|s| s.to_string()).collect()) },
    correct_answer: correct,
    feedback: Some(feedback.into()),
    order,
  }
}

pub fn seed_quizzes() -> Vec<(Quiz, Vec<QuestionRow>)> {
  let basics = Quiz {
    id: "berufspaedagogik-grundlagen".into(),
    title: "Einführung in die Berufspädagogik".into(),
    description: "Grundlagen, Geschichte und theoretische Konzepte der Berufspädagogik.".into(),
    difficulty: "Grundlagen".into(),
    time_limit_seconds: None,
  };
  let basics_questions = vec![
    question(
      &basics.id, "bp-1", QuestionType::SingleChoice,
      "Welches Gesetz regelt die duale Berufsausbildung?",
      &["Berufsbildungsgesetz (BBiG)", "Jugendarbeitsschutzgesetz (JArbSchG)", "Schulgesetz"],
      Some(CorrectAnswerRow::Indices(vec![0])),
      "Das BBiG ist die rechtliche Grundlage der betrieblichen Ausbildung.",
      0,
    ),
    question(
      &basics.id, "bp-2", QuestionType::MultipleChoice,
      "Welche Lernorte kooperieren im dualen System?",
      &["Betrieb", "Berufsschule", "Universität", "Gymnasium"],
      Some(CorrectAnswerRow::Indices(vec![0, 1])),
      "Betrieb und Berufsschule sind die beiden Lernorte des dualen Systems.",
      1,
    ),
    question(
      &basics.id, "bp-3", QuestionType::ShortAnswer,
      "Wie hat sich die Rolle des Ausbilders gewandelt?",
      &[],
      Some(CorrectAnswerRow::Text(String::new())),
      "Vom Unterweiser zum Lernbegleiter und Moderator von Lernprozessen.",
      2,
    ),
  ];

  let didactics = Quiz {
    id: "didaktik-pruefung".into(),
    title: "Didaktik der beruflichen Bildung".into(),
    description: "Methoden und Modelle für den Unterricht in beruflichen Schulen.".into(),
    difficulty: "Prüfungsvorbereitung".into(),
    time_limit_seconds: Some(10 * 60),
  };
  let didactics_questions = vec![
    question(
      &didactics.id, "dd-1", QuestionType::MultipleChoice,
      "Welche Methoden gelten als handlungsorientiert?",
      &["Projektmethode", "Frontalunterricht", "Leittextmethode"],
      Some(CorrectAnswerRow::Indices(vec![0, 2])),
      "Projekt- und Leittextmethode fördern selbstständiges Handeln.",
      0,
    ),
    question(
      &didactics.id, "dd-2", QuestionType::SingleChoice,
      "Wofür steht das Lernfeldkonzept?",
      &["Fächerorientierung", "Orientierung an beruflichen Handlungsfeldern", "Reines Auswendiglernen"],
      Some(CorrectAnswerRow::Indices(vec![1])),
      "Lernfelder sind aus beruflichen Handlungsfeldern abgeleitet.",
      1,
    ),
  ];

  vec![(basics, basics_questions), (didactics, didactics_questions)]
}

pub fn seed_decks() -> Vec<Deck> {
  let card = |id: &str, front: &str, back: &str| Flashcard { id: id.into(), front: front.into(), back: back.into() };
  vec![
    Deck {
      id: "d1".into(),
      title: "Rechtliche Grundlagen".into(),
      cards: vec![
        card("c1", "BBiG", "Berufsbildungsgesetz"),
        card("c2", "JArbSchG", "Jugendarbeitsschutzgesetz"),
        card("c3", "Ausbildungsordnung", "Rechtsverbindliche Grundlage für die betriebliche Ausbildung"),
      ],
    },
    Deck {
      id: "d2".into(),
      title: "Lernpsychologie".into(),
      cards: vec![card("c1", "Kognitivismus", "Lernen als Informationsverarbeitungsprozess")],
    },
  ]
}

pub fn seed_modules() -> Vec<Module> {
  let section = |id: &str, kind: SectionType, title: &str, content: &str| Section {
    id: id.into(),
    kind,
    title: title.into(),
    content: content.into(),
  };
  vec![
    Module {
      id: "m1".into(),
      title: "Berufspädagogik Grundlagen".into(),
      description: "Geschichte, Recht und Akteure der beruflichen Bildung.".into(),
      added_by: "Redaktion".into(),
      sections: vec![
        section("m1-s1", SectionType::Schwerpunkte, "Schwerpunkte", "Duales System, Lernorte Betrieb und Berufsschule, Rolle der Kammern."),
        section("m1-s2", SectionType::Begriffe, "Wichtige Begriffe", "BBiG, Ausbildungsordnung, Rahmenlehrplan."),
        section("m1-s3", SectionType::Fazit, "Fazit", "Die Kooperation der Lernorte ist der Kern des dualen Systems."),
      ],
      pdfs: vec![PdfFile {
        id: "m1-p1".into(),
        name: "Berufsbildungsgesetz_Auszug.pdf".into(),
        upload_date: "2024-03-12".into(),
        url: "/files/m1/bbig-auszug.pdf".into(),
      }],
    },
    Module {
      id: "m2".into(),
      title: "Didaktik der beruflichen Bildung".into(),
      description: "Handlungsorientierung und Unterrichtsplanung.".into(),
      added_by: "Redaktion".into(),
      sections: vec![
        section("m2-s1", SectionType::Schwerpunkte, "Schwerpunkte", "Das Lernfeldkonzept orientiert den Unterricht an beruflichen Handlungsfeldern."),
        section("m2-s2", SectionType::Beispiele, "Beispiele", "Projektmethode, Leittextmethode, Fallstudie."),
        section("m2-s3", SectionType::Fragen, "Prüfungsfragen", "Was kennzeichnet eine vollständige Handlung?"),
      ],
      pdfs: vec![],
    },
  ]
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::questions_from_rows;

  #[test]
  fn seed_questions_are_valid() {
    for (quiz, rows) in seed_quizzes() {
      let questions = questions_from_rows(rows).unwrap_or_else(|e| panic!("{}: {e}", quiz.id));
      assert!(!questions.is_empty());
    }
  }

  #[test]
  fn seed_ids_are_unique() {
    let decks = seed_decks();
    let modules = seed_modules();
    assert!(decks.iter().enumerate().all(|(i, d)| decks[..i].iter().all(|o| o.id != d.id)));
    assert!(modules.iter().enumerate().all(|(i, m)| modules[..i].iter().all(|o| o.id != m.id)));
  }
}
