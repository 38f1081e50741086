use anyhow::{Result, anyhow};
use isolang::Language;

/// Language utilities for caption language tags
///
/// Caption sources hand out BCP 47 style tags (`en`, `zh-TW`, `pt-BR`), while
/// the segmentation heuristics only care about the primary subtag. This module
/// splits tags, validates them against ISO 639, and produces the display names
/// used in translation prompts.

/// Return the lowercase primary subtag of a language tag (`zh-TW` -> `zh`)
pub fn base_language(tag: &str) -> String {
    tag.trim()
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_lowercase()
}

/// Validate a language tag
///
/// The primary subtag must be a known ISO 639-1 or ISO 639-3 code. The
/// pseudo-tag `auto` is accepted for auto-detection.
pub fn validate_language_code(tag: &str) -> Result<()> {
    let base = base_language(tag);
    if base == "auto" {
        return Ok(());
    }

    let known = match base.len() {
        2 => Language::from_639_1(&base).is_some(),
        3 => Language::from_639_3(&base).is_some(),
        _ => false,
    };

    if known {
        Ok(())
    } else {
        Err(anyhow!("Invalid language code: {}", tag))
    }
}

/// Get the English language name for a tag's primary subtag
pub fn get_language_name(tag: &str) -> Result<String> {
    let base = base_language(tag);
    let lang = match base.len() {
        2 => Language::from_639_1(&base),
        3 => Language::from_639_3(&base),
        _ => None,
    }
    .ok_or_else(|| anyhow!("Failed to get language from code: {}", tag))?;

    Ok(lang.to_name().to_string())
}

/// Name used for a language inside translation prompts
///
/// Chinese scripts and the CJK languages carry their native name so the model
/// picks the right script. Unknown tags are passed through unchanged.
pub fn prompt_language_name(tag: &str) -> String {
    match tag {
        "zh-TW" | "zh-Hant" => "Traditional Chinese (繁體中文)".to_string(),
        "zh-CN" | "zh-Hans" => "Simplified Chinese (简体中文)".to_string(),
        "ja" => "Japanese (日本語)".to_string(),
        "ko" => "Korean (한국어)".to_string(),
        _ => get_language_name(tag).unwrap_or_else(|_| tag.to_string()),
    }
}

