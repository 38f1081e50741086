/*!
 * Sentence boundary classification.
 *
 * Auto-generated captions are often chopped mid-sentence. These helpers decide
 * whether a caption fragment closes a sentence, either through terminal
 * punctuation anywhere in the text or, for languages whose automatic captions
 * rarely carry punctuation, through a trailing verb ending or particle.
 */

use once_cell::sync::Lazy;
use regex::Regex;

use crate::language_utils::base_language;

// @const: Terminal punctuation, ellipsis runs ("...", "....", "……") first so each matches as one unit
static SENTENCE_BOUNDARY_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:\.{3,}|…)+|[.!?。！？]").unwrap()
});

/// Characters that end a sentence
pub const TERMINAL_MARKS: &[char] = &['.', '!', '?', '。', '！', '？', '…'];

/// Characters that mark a pause inside a sentence
pub const PAUSE_MARKS: &[char] = &[',', ';', ':', '、', '，', '；', '：'];

/// Sentence-final markers for one language
#[derive(Debug, Clone, Copy)]
pub struct LanguageMarkers {
    /// Verb inflections that close a sentence
    pub endings: &'static [&'static str],

    /// Sentence-final particles
    pub particles: &'static [&'static str],
}

const JAPANESE_MARKERS: LanguageMarkers = LanguageMarkers {
    endings: &["です", "ます", "でした", "ました", "だった", "である", "でしょう", "ません", "ない"],
    particles: &["か", "ね", "よ", "な", "わ", "ぞ", "ぜ", "さ", "の"],
};

const KOREAN_MARKERS: LanguageMarkers = LanguageMarkers {
    endings: &["니다", "습니다", "었습니다", "였습니다", "는데요", "어요", "아요"],
    particles: &["요", "네요", "까요", "세요", "죠", "군요"],
};

const CHINESE_MARKERS: LanguageMarkers = LanguageMarkers {
    endings: &["了", "過", "著"],
    particles: &["吧", "呢", "啊", "嗎", "嘛", "的", "喔", "哦", "耶"],
};

const THAI_MARKERS: LanguageMarkers = LanguageMarkers {
    endings: &["แล้ว", "อยู่", "ไป", "มา"],
    particles: &["ครับ", "ค่ะ", "นะ", "จ้ะ", "จ๊ะ", "ล่ะ"],
};

/// Marker table for a language tag, keyed on its primary subtag
pub fn markers_for(language: &str) -> Option<&'static LanguageMarkers> {
    match base_language(language).as_str() {
        "ja" => Some(&JAPANESE_MARKERS),
        "ko" => Some(&KOREAN_MARKERS),
        "zh" => Some(&CHINESE_MARKERS),
        "th" => Some(&THAI_MARKERS),
        _ => None,
    }
}

/// Whether the text contains terminal punctuation anywhere
pub fn contains_sentence_boundary(text: &str) -> bool {
    let trimmed = text.trim();
    !trimmed.is_empty() && SENTENCE_BOUNDARY_REGEX.is_match(trimmed)
}

/// Whether the trimmed text ends with a sentence-final marker of the language
pub fn ends_with_language_marker(text: &str, language: &str) -> bool {
    let Some(markers) = markers_for(language) else {
        return false;
    };

    let trimmed = text.trim();
    if trimmed.is_empty() {
        return false;
    }

    markers
        .endings
        .iter()
        .chain(markers.particles.iter())
        .any(|marker| trimmed.ends_with(marker))
}

/// Whether a caption fragment closes a sentence
///
/// Punctuation anywhere in the text wins. Without punctuation, a language hint
/// enables the trailing-marker check.
pub fn is_sentence_end(text: &str, language: Option<&str>) -> bool {
    if text.trim().is_empty() {
        return false;
    }

    if contains_sentence_boundary(text) {
        return true;
    }

    language.is_some_and(|lang| ends_with_language_marker(text, lang))
}

/// Whether the text carries any terminal or pause punctuation
pub fn has_punctuation(text: &str) -> bool {
    text.contains("...")
        || text
            .chars()
            .any(|c| TERMINAL_MARKS.contains(&c) || PAUSE_MARKS.contains(&c))
}

/// Split text right after its first sentence boundary
///
/// Both halves are trimmed. Text without a boundary comes back whole with an
/// empty remainder.
pub fn split_at_first_sentence(text: &str) -> (String, String) {
    match SENTENCE_BOUNDARY_REGEX.find(text) {
        Some(m) => (
            text[..m.end()].trim().to_string(),
            text[m.end()..].trim().to_string(),
        ),
        None => (text.to_string(), String::new()),
    }
}
