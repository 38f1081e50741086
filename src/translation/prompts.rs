/*!
 * Prompt construction for batch subtitle translation.
 *
 * Each batch is sent as a numbered list (`[0] text`, `[1] text`, ...) so the
 * response can be realigned with its inputs even when the model adds chatter
 * or drops lines.
 */

use crate::language_utils::prompt_language_name;

/// System prompt for subtitle translation requests
pub const SUBTITLE_TRANSLATOR_SYSTEM: &str =
    "You are a professional translator specializing in subtitle translation.";

/// Display name of a language for use inside a prompt
///
/// `auto` has no name of its own, so the model is told to detect it.
pub fn display_language(tag: &str) -> String {
    if tag.eq_ignore_ascii_case("auto") {
        "the original language (detect it)".to_string()
    } else {
        prompt_language_name(tag)
    }
}

/// Build the user prompt for one batch
pub fn batch_prompt<S: AsRef<str>>(texts: &[S], source_language: &str, target_language: &str) -> String {
    let count = texts.len();
    let source_name = display_language(source_language);
    let target_name = display_language(target_language);

    let text_block: String = texts
        .iter()
        .enumerate()
        .map(|(i, text)| format!("[{}] {}\n", i, flatten(text.as_ref())))
        .collect();

    format!(
        "Translate ALL {count} subtitles from {source_name} to {target_name}.

IMPORTANT: You MUST translate ALL {count} items below.

Rules:
1. Keep the [0], [1], [2] numbering format
2. Translate naturally - do not add notes or explanations
3. Output ONLY translations, nothing else
4. Make sure to translate ALL items

Input ({count} items):
{text_block}
Output ({count} translations):"
    )
}

/// Keep each item on one line so markers stay at line starts
fn flatten(text: &str) -> String {
    text.lines().map(str::trim).filter(|l| !l.is_empty()).collect::<Vec<_>>().join(" ")
}
