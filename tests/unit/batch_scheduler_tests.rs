/*!
 * Tests for batch planning and response realignment
 */

use vidslides::app_config::AiProvider;
use vidslides::translation::{BatchLimits, BatchScheduler, parse_numbered_response};

fn texts_of_len(lens: &[usize]) -> Vec<String> {
    lens.iter().map(|&n| "x".repeat(n)).collect()
}

#[test]
fn test_next_batch_len_withShortTexts_shouldCapAtMaxItems() {
    let scheduler = BatchScheduler::new(BatchLimits::new(1000, 5));
    let texts = texts_of_len(&[10; 12]);

    assert_eq!(scheduler.next_batch_len(&texts), 5);
}

#[test]
fn test_next_batch_len_withLongTexts_shouldStopAtCharTarget() {
    let scheduler = BatchScheduler::new(BatchLimits::new(100, 10));
    let texts = texts_of_len(&[40, 40, 40, 40]);

    assert_eq!(scheduler.next_batch_len(&texts), 2);
}

#[test]
fn test_next_batch_len_withOversizedFirstItem_shouldStillTakeOne() {
    let scheduler = BatchScheduler::new(BatchLimits::new(50, 5));
    let texts = texts_of_len(&[500, 10]);

    assert_eq!(scheduler.next_batch_len(&texts), 1);
}

#[test]
fn test_next_batch_len_withEmptyInput_shouldBeZero() {
    let scheduler = BatchScheduler::new(BatchLimits::for_provider(AiProvider::OpenAI));
    let empty: Vec<String> = Vec::new();

    assert_eq!(scheduler.next_batch_len(&empty), 0);
    assert!(scheduler.plan(&empty).is_empty());
}

#[test]
fn test_plan_shouldCoverEveryItemOnceInOrder() {
    let scheduler = BatchScheduler::new(BatchLimits::new(120, 4));
    let texts = texts_of_len(&[30, 90, 10, 200, 5, 5, 5, 5, 5, 60, 61, 1]);
    let plan = scheduler.plan(&texts);

    let mut next = 0;
    for range in &plan {
        assert_eq!(range.start, next);
        assert!(!range.is_empty());
        assert!(range.len() <= 4);
        next = range.end;
    }
    assert_eq!(next, texts.len());
}

#[test]
fn test_for_provider_withOllama_shouldUseSmallerTarget() {
    let local = BatchLimits::for_provider(AiProvider::Ollama);
    let remote = BatchLimits::for_provider(AiProvider::OpenAI);

    assert!(local.target_chars < remote.target_chars);
    assert_eq!(local.max_items, 5);
}

#[test]
fn test_batch_limits_new_withZeroItems_shouldKeepOne() {
    assert_eq!(BatchLimits::new(100, 0).max_items, 1);
}

#[test]
fn test_parse_numbered_response_withExtraChatter_shouldKeepMarkedLines() {
    let response = "Here you go:\n[0] Hallo\n[1] Welt\nHope this helps";
    let parsed = parse_numbered_response(response, 2);

    assert_eq!(parsed, vec![Some("Hallo".to_string()), Some("Welt".to_string())]);
}

#[test]
fn test_parse_numbered_response_withMultilineItems_shouldScanMarkers() {
    let response = "[0] line one\ncontinued\n[1] two";
    let parsed = parse_numbered_response(response, 2);

    assert_eq!(parsed.len(), 2);
    assert_eq!(parsed[1].as_deref(), Some("two"));
}
