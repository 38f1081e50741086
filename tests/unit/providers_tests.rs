/*!
 * Tests for provider selection and the scripted mock backend
 */

use vidslides::app_config::{AiProvider, TranslationConfig};
use vidslides::errors::{AppError, ProviderError, TranslationError};
use vidslides::providers::mock::MockBackend;
use vidslides::providers::{CompletionBackend, backend_for, check_provider, endpoint_url};

#[test]
fn test_backend_for_withRemoteProviderAndNoKey_shouldFail() {
    let config = TranslationConfig::default();

    for provider in [AiProvider::OpenAI, AiProvider::Claude, AiProvider::Gemini] {
        match backend_for(provider, None, None, &config) {
            Err(TranslationError::MissingApiKey(name)) => assert_eq!(name, provider.display_name()),
            Err(other) => panic!("unexpected error for {}: {}", provider, other),
            Ok(_) => panic!("{} should require an API key", provider),
        }
    }
}

#[test]
fn test_backend_for_withBlankRequestKey_shouldStillRequireKey() {
    let config = TranslationConfig::default();

    assert!(backend_for(AiProvider::OpenAI, None, Some("   "), &config).is_err());
}

#[test]
fn test_backend_for_withRequestKeyAndModel_shouldUseThem() {
    let config = TranslationConfig::default();
    let backend = backend_for(AiProvider::OpenAI, Some("gpt-test"), Some("sk-test"), &config)
        .expect("key supplied");

    assert_eq!(backend.provider(), AiProvider::OpenAI);
    assert_eq!(backend.model(), "gpt-test");
}

#[test]
fn test_backend_for_withOllama_shouldNotNeedKey() {
    let config = TranslationConfig::default();
    let backend = backend_for(AiProvider::Ollama, None, None, &config).expect("local provider");

    assert_eq!(backend.provider(), AiProvider::Ollama);
    assert_eq!(backend.model(), "llama3.2");
}

#[test]
fn test_endpoint_url_shouldJoinBaseAndPath() {
    let url = endpoint_url("http://localhost:11434/", "/api/generate").expect("valid url");
    assert_eq!(url.as_str(), "http://localhost:11434/api/generate");

    assert!(endpoint_url("not a url", "/api").is_err());
}

#[test]
fn test_provider_error_fromStatus_shouldClassifyRetryable() {
    assert!(ProviderError::from_status(429, "slow down").is_retryable());
    assert!(ProviderError::from_status(503, "unavailable").is_retryable());
    assert!(!ProviderError::from_status(401, "bad key").is_retryable());
    assert!(!ProviderError::from_status(400, "bad request").is_retryable());
}

#[tokio::test]
async fn test_mock_backend_withChattyBehavior_shouldOmitMarkers() {
    let backend = MockBackend::chatty();
    let response = backend
        .complete(None, "[0] Hello\n[1] World")
        .await
        .expect("chatty backend answers");

    assert!(response.starts_with("Sure"));
    assert!(!response.contains("[0]"));
    assert!(response.contains("TR: World"));
}

#[tokio::test]
async fn test_mock_backend_withEmptyBehavior_shouldReturnNothing() {
    let backend = MockBackend::empty().with_provider(AiProvider::Gemini);
    let response = backend.complete(None, "[0] Hello").await.expect("empty backend answers");

    assert!(response.is_empty());
    assert_eq!(backend.provider(), AiProvider::Gemini);
    assert_eq!(backend.request_count(), 1);
}

#[test]
fn test_mock_backend_withFailingBehavior_shouldReturnApiError() {
    let backend = MockBackend::failing();
    let result = tokio_test::block_on(backend.complete(None, "[0] Hello"));

    assert!(matches!(result, Err(ProviderError::ApiError { status_code: 500, .. })));
}

#[test]
fn test_prompt_items_shouldReadNumberedLines() {
    let items = MockBackend::prompt_items("Input:\n[0] one\n[1] two\nOutput:");

    assert_eq!(items, vec![(0, "one".to_string()), (1, "two".to_string())]);
}

#[tokio::test]
async fn test_check_provider_withMissingKey_shouldFailBeforeAnyRequest() {
    let config = TranslationConfig::default();

    match check_provider(AiProvider::Gemini, None, None, &config).await {
        Err(AppError::Translation(TranslationError::MissingApiKey(name))) => assert_eq!(name, "Gemini"),
        Err(other) => panic!("unexpected error: {}", other),
        Ok(_) => panic!("Gemini should require an API key"),
    }
}

#[tokio::test]
async fn test_check_connection_withMockBackend_shouldFollowBehavior() {
    assert!(MockBackend::working().check_connection().await.is_ok());

    let result = MockBackend::failing().check_connection().await;
    assert!(matches!(result, Err(ProviderError::ConnectionError(_))));
}
