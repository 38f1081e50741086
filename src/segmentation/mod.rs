/*!
 * Caption segmentation.
 *
 * - `boundary`: sentence boundary classification
 * - `merge`: fragment-to-sentence merge engine
 */

pub use self::boundary::{is_sentence_end, split_at_first_sentence};
pub use self::merge::{MergeConfig, MergeOutcome, MergeStrategy, SubtitleOptimizer, optimize_srt_file};

pub mod boundary;
pub mod merge;
