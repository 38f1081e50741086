/*!
 * Subtitle translation.
 *
 * Two paths translate a list of subtitle texts:
 *
 * - `batch`: adaptive batches sent to an AI completion backend, with
 *   response realignment (`parser`) and numbered prompts (`prompts`)
 * - `generic`: one request per text through a `TextTranslator`, backed by
 *   an in-memory `cache`
 *
 * Both return exactly one output per input, in input order.
 */

pub use self::batch::{BatchLimits, BatchScheduler};
pub use self::cache::{CacheStats, TranslationCache};
pub use self::generic::{batch_translate, GoogleWebTranslator, TextTranslator};
pub use self::parser::parse_numbered_response;

pub mod batch;
pub mod cache;
pub mod generic;
pub mod parser;
pub mod prompts;
