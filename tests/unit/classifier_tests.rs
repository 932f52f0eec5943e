/*!
 * Tests for translatability classification
 */

use std::sync::Arc;

use gstl::classifier::{Classifier, RejectReason, Verdict, classify_records, score};
use gstl::language_utils::TargetScript;
use gstl::protection::PlaceholderCodec;
use gstl::records::Record;
use serde_json::json;

fn vietnamese_classifier() -> Classifier {
    Classifier::new(
        PlaceholderCodec::new(),
        Arc::new(TargetScript::for_language("vi").unwrap()),
    )
}

fn mixed_records() -> Vec<Record> {
    let values = [
        json!("You have reached the summit."),
        json!("Press <b>{0}</b> to open the map."),
        json!("UnityEngine.GameObject"),
        json!("player_health_max"),
        json!("Hello, __there__!"),
        json!("Sword"),
        json!("Open"),
        json!(""),
        json!(null),
        json!("Bạn đã đến đỉnh núi."),
        json!("if (hp <= 0) return;"),
        json!("敵が現れた"),
        json!("[1.2.3 Patch Notes]"),
    ];
    values
        .into_iter()
        .enumerate()
        .map(|(i, value)| Record { index: i as u64, value, extra: Default::default() })
        .collect()
}

#[test]
fn test_evaluate_withPlainSentence_shouldScoreSeventeen() {
    let verdict = vietnamese_classifier().evaluate("You have reached the summit.");
    assert_eq!(verdict.score(), Some(17));
}

#[test]
fn test_evaluate_withUnderscoredGreeting_shouldScoreMinusTwo() {
    let classifier = vietnamese_classifier();
    assert_eq!(score("Hello, __there__!"), -2);
    assert!(!classifier.should_translate("Hello, __there__!", 0));
}

#[test]
fn test_evaluate_withHardRules_shouldRejectWithReason() {
    let classifier = vietnamese_classifier();
    let cases = [
        ("   ", RejectReason::Empty),
        ("[Internal Test Version 3 Patch Notes]", RejectReason::PatchNote),
        ("a == b", RejectReason::CodeLike),
        ("player.GetComponent(x)", RejectReason::CodeLike),
        ("敵が現れた", RejectReason::AsianScript),
        ("Xin chào các bạn", RejectReason::AlreadyTranslated),
        ("12345 !!", RejectReason::NoLetters),
        ("player_health_max", RejectReason::Identifier),
        ("Textures/ui/icon", RejectReason::Identifier),
    ];
    for (text, expected) in cases {
        assert_eq!(classifier.evaluate(text), Verdict::Rejected(expected), "text: {:?}", text);
    }
}

#[test]
fn test_evaluateValue_withNonString_shouldRejectAsNotText() {
    let classifier = vietnamese_classifier();
    assert_eq!(classifier.evaluate_value(&json!(7)), Verdict::Rejected(RejectReason::NotText));
    assert_eq!(classifier.evaluate_value(&json!({"a": 1})), Verdict::Rejected(RejectReason::NotText));
}

#[test]
fn test_shouldTranslate_shouldBeMonotonicInThreshold() {
    let classifier = vietnamese_classifier();
    for record in mixed_records() {
        let Some(text) = record.text() else { continue };
        for threshold in -20..20 {
            if classifier.should_translate(text, threshold + 1) {
                assert!(classifier.should_translate(text, threshold), "text: {:?} at {}", text, threshold);
            }
        }
    }
}

#[test]
fn test_evaluate_shouldBeDeterministic() {
    let classifier = vietnamese_classifier();
    for record in mixed_records() {
        assert_eq!(classifier.evaluate_value(&record.value), classifier.evaluate_value(&record.value));
    }
}

#[test]
fn test_classifyRecords_shouldBeDisjointAndExhaustive() {
    let classifier = vietnamese_classifier();
    let input = mixed_records();
    let count = input.len();
    let mut seen = 0;

    let partition = classify_records(&classifier, input, 5, 0, |_, _| seen += 1);

    assert_eq!(seen, count);
    assert_eq!(partition.total(), count);

    let mut indices: Vec<u64> = partition
        .safe
        .iter()
        .chain(&partition.review)
        .chain(&partition.skipped)
        .map(|r| r.index)
        .collect();
    indices.sort_unstable();
    assert_eq!(indices, (0..count as u64).collect::<Vec<_>>());

    let safe: Vec<u64> = partition.safe.iter().map(|r| r.index).collect();
    assert!(safe.contains(&0));
    assert!(safe.contains(&1));
    for skipped in [2u64, 3, 4, 7, 8, 9, 10, 11, 12] {
        assert!(partition.skipped.iter().any(|r| r.index == skipped), "index {} should be skipped", skipped);
    }
}
