/*!
 * Tests for language utility functions
 */

use vidslides::language_utils::{base_language, get_language_name, prompt_language_name, validate_language_code};

#[test]
fn test_base_language_shouldReturnLowercasePrimarySubtag() {
    assert_eq!(base_language("zh-TW"), "zh");
    assert_eq!(base_language("pt_BR"), "pt");
    assert_eq!(base_language(" EN "), "en");
    assert_eq!(base_language(""), "");
}

#[test]
fn test_validate_language_code_withValidTags_shouldSucceed() {
    for tag in ["en", "ja", "zh-TW", "fra", "auto"] {
        assert!(validate_language_code(tag).is_ok(), "{} should be valid", tag);
    }
}

#[test]
fn test_validate_language_code_withInvalidTags_shouldFail() {
    for tag in ["", "x", "qq", "english"] {
        assert!(validate_language_code(tag).is_err(), "{} should be invalid", tag);
    }
}

#[test]
fn test_get_language_name_shouldUsePrimarySubtag() {
    assert_eq!(get_language_name("en").unwrap(), "English");
    assert_eq!(get_language_name("fr-CA").unwrap(), "French");
    assert!(get_language_name("zz").is_err());
}

#[test]
fn test_prompt_language_name_withChineseScripts_shouldIncludeNativeName() {
    assert_eq!(prompt_language_name("zh-TW"), "Traditional Chinese (繁體中文)");
    assert_eq!(prompt_language_name("zh-Hans"), "Simplified Chinese (简体中文)");
    assert_eq!(prompt_language_name("ko"), "Korean (한국어)");
    assert_eq!(prompt_language_name("de"), "German");
    assert_eq!(prompt_language_name("klingon-x"), "klingon-x");
}
