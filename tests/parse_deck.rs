use std::fs;
use std::path::PathBuf;

use termdrill::model::{BodyElement, ItemType};
use termdrill::parser::parse_deck;
use termdrill::services::{ContentProvider, DeckDirectory};

fn fixture_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
}

#[test]
fn parses_vocabulary_fixture() {
    let content = fs::read_to_string(fixture_dir().join("n5-vocabulary.md")).expect("Cannot read fixture");
    let deck = parse_deck(&content, "n5-vocabulary").unwrap();

    assert_eq!(deck.node.title, "JLPT N5 Vocabulary Check");
    assert_eq!(deck.node.item_type, ItemType::Exam);
    assert_eq!(deck.node.time_limit, Some(600));
    assert_eq!(deck.node.preamble.len(), 1);
    assert_eq!(deck.questions.len(), 10);

    let q1 = &deck.questions[0];
    assert_eq!(q1.id, "q1");
    assert_eq!(q1.kind, "vocabulary");
    assert_eq!(q1.options.len(), 4);
    assert_eq!(q1.correct_option_id, "b");
    assert_eq!(q1.option("b").map(|o| o.text.as_str()), Some("water"));
    assert!(q1.explanation.starts_with("水"));

    let q4 = &deck.questions[3];
    assert_eq!(q4.kind, "grammar");
    assert_eq!(q4.passage.as_deref(), Some("わたしは まいあさ パン（　）たべます。"));

    let q8 = &deck.questions[7];
    assert_eq!(q8.kind, "reading");
    assert!(q8.passage.as_deref().unwrap().contains("こうえん"));
    assert_eq!(
        q8.body,
        vec![BodyElement::Text("Where did the writer eat lunch?".to_string())]
    );
    assert_eq!(q8.correct_option_id, "c");
}

#[test]
fn untyped_questions_default_to_general() {
    let content = fs::read_to_string(fixture_dir().join("kana-drill.md")).expect("Cannot read fixture");
    let deck = parse_deck(&content, "kana-drill").unwrap();

    assert_eq!(deck.node.item_type, ItemType::Drill);
    assert_eq!(deck.node.time_limit, None);
    assert_eq!(deck.questions[0].kind, "general");
    assert_eq!(deck.questions[2].kind, "kana");
    assert!(deck.questions.iter().all(|q| q.explanation.is_empty()));
}

#[test]
fn listing_skips_private_and_empty_decks() {
    let decks = DeckDirectory::new(fixture_dir());
    let ids: Vec<String> = decks.list().unwrap().into_iter().map(|n| n.id).collect();
    assert_eq!(ids, vec!["kana-drill", "n5-vocabulary"]);

    assert!(decks.get_session_data("draft-n4").is_err());
    assert!(decks.get_session_data("../fixtures/kana-drill").is_err());
}
