/*!
 * Batch and per-item translation end to end
 */

use std::sync::Arc;

use parking_lot::Mutex;
use vidslides::pipeline::ProgressSink;
use vidslides::providers::mock::MockBackend;
use vidslides::translation::{BatchLimits, BatchScheduler, TextTranslator, TranslationCache, batch_translate};

use crate::common::mock_collaborators::MockTextTranslator;

fn texts(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("line {}", i)).collect()
}

fn scheduler() -> BatchScheduler {
    BatchScheduler::new(BatchLimits::new(1000, 5))
}

#[tokio::test]
async fn test_translate_withWorkingBackend_shouldTranslateEveryItemInOrder() {
    let backend = MockBackend::working();
    let input = texts(7);

    let output = scheduler().translate(&input, "en", "fr", &backend, None).await;

    assert_eq!(output.len(), 7);
    for (i, translated) in output.iter().enumerate() {
        assert_eq!(translated, &format!("TR: line {}", i));
    }
    assert_eq!(backend.request_count(), 2);

    let batch_sizes: Vec<usize> = backend.prompts().iter().map(|p| MockBackend::prompt_items(p).len()).collect();
    assert_eq!(batch_sizes, vec![5, 2]);
}

#[tokio::test]
async fn test_translate_withFailingBackend_shouldReturnOriginals() {
    let backend = MockBackend::failing();
    let input = texts(6);

    let output = scheduler().translate(&input, "en", "fr", &backend, None).await;

    assert_eq!(output, input);
    assert_eq!(backend.request_count(), 2);
}

#[tokio::test]
async fn test_translate_withDroppedItems_shouldPadWithOriginals() {
    let backend = MockBackend::dropping_last();
    let input = texts(7);

    let output = scheduler().translate(&input, "en", "fr", &backend, None).await;

    assert_eq!(output.len(), 7);
    assert_eq!(output[0], "TR: line 0");
    assert_eq!(output[3], "TR: line 3");
    assert_eq!(output[4], "line 4");
    assert_eq!(output[5], "TR: line 5");
    assert_eq!(output[6], "line 6");
}

#[tokio::test]
async fn test_translate_withBlankItemInBatch_shouldKeepSlidesAligned() {
    let backend = MockBackend::working();
    let input = vec!["Hello".to_string(), "".to_string(), "World".to_string()];

    let output = scheduler().translate(&input, "en", "fr", &backend, None).await;

    assert_eq!(output, vec!["TR: Hello", "", "TR: World"]);
    let items = MockBackend::prompt_items(&backend.prompts()[0]);
    assert_eq!(items, vec![(0, "Hello".to_string()), (1, "World".to_string())]);
}

#[tokio::test]
async fn test_translate_withSkippedMarker_shouldFillThatSlotWithOriginal() {
    fn skip_middle(_prompt: &str) -> String {
        "[0] FR:Hello\n[2] FR:World".to_string()
    }
    let backend = MockBackend::working().with_custom_response(skip_middle);
    let input = vec!["Hello".to_string(), "Middle".to_string(), "World".to_string()];

    let output = scheduler().translate(&input, "en", "fr", &backend, None).await;

    assert_eq!(output, vec!["FR:Hello", "Middle", "FR:World"]);
}

#[tokio::test]
async fn test_translate_withOnlyBlankItems_shouldNotCallBackend() {
    let backend = MockBackend::working();
    let input = vec!["".to_string(), "  ".to_string()];

    let output = scheduler().translate(&input, "en", "fr", &backend, None).await;

    assert_eq!(output, input);
    assert_eq!(backend.request_count(), 0);
}

#[tokio::test]
async fn test_translate_withUnmarkedResponse_shouldUsePlainLines() {
    let backend = MockBackend::chatty();
    let input = texts(3);

    let output = scheduler().translate(&input, "en", "ja", &backend, None).await;

    assert_eq!(output, vec!["TR: line 0", "TR: line 1", "TR: line 2"]);
}

#[tokio::test]
async fn test_translate_withIntermittentFailures_shouldKeepFailedBatchOriginal() {
    let backend = MockBackend::intermittent(2);
    let input = texts(12);

    let output = scheduler().translate(&input, "en", "de", &backend, None).await;

    assert_eq!(output.len(), 12);
    assert_eq!(output[0], "TR: line 0");
    assert_eq!(output[5], "line 5");
    assert_eq!(output[9], "line 9");
    assert_eq!(output[10], "TR: line 10");
}

#[tokio::test]
async fn test_translate_withEmptyInput_shouldNotCallBackend() {
    let backend = MockBackend::working();

    let output = scheduler().translate(&[], "en", "fr", &backend, None).await;

    assert!(output.is_empty());
    assert_eq!(backend.request_count(), 0);
}

#[tokio::test]
async fn test_translate_shouldReportProgressPerBatch() {
    let backend = MockBackend::working();
    let seen = Mutex::new(Vec::new());
    let record = |percent: f64| seen.lock().push(percent);
    let sink: &dyn ProgressSink = &record;

    scheduler().translate(&texts(10), "en", "fr", &backend, Some(sink)).await;

    assert_eq!(*seen.lock(), vec![50.0, 100.0]);
}

#[tokio::test]
async fn test_batch_translate_shouldTranslateEachItemAndKeepBlanks() {
    let translator = MockTextTranslator::new().shared();
    let cache = TranslationCache::new(true);
    let input = vec!["hello".to_string(), "  ".to_string(), "world".to_string()];

    let output = batch_translate(
        Arc::clone(&translator) as Arc<dyn TextTranslator>,
        &input,
        "en",
        "fr",
        2,
        &cache,
        None,
    )
    .await;

    assert_eq!(output, vec!["[tl] hello", "  ", "[tl] world"]);
    assert_eq!(translator.calls(), 2);
}

#[tokio::test]
async fn test_batch_translate_withFailure_shouldKeepOriginalForThatItem() {
    let translator = MockTextTranslator::failing_on("broken").shared();
    let cache = TranslationCache::new(true);
    let input = vec!["fine".to_string(), "broken".to_string(), "also fine".to_string()];
    let seen = Mutex::new(Vec::new());
    let record = |percent: f64| seen.lock().push(percent);
    let sink: &dyn ProgressSink = &record;

    let output = batch_translate(translator, &input, "en", "fr", 4, &cache, Some(sink)).await;

    assert_eq!(output, vec!["[tl] fine", "broken", "[tl] also fine"]);
    assert_eq!(seen.lock().len(), 3);
    assert!(seen.lock().iter().any(|p| (*p - 100.0).abs() < f64::EPSILON));
}

#[tokio::test]
async fn test_batch_translate_withRepeatedText_shouldServeFromCache() {
    let translator = MockTextTranslator::new().shared();
    let cache = TranslationCache::new(true);
    let input = vec!["Thank you.".to_string()];

    let first = batch_translate(translator.clone(), &input, "en", "fr", 1, &cache, None).await;
    let second = batch_translate(translator.clone(), &input, "en", "fr", 1, &cache, None).await;

    assert_eq!(first, second);
    assert_eq!(translator.calls(), 1);
    assert_eq!(cache.stats().hits, 1);
}
