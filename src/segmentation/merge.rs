/*!
 * Subtitle merge engine.
 *
 * Rebuilds sentence-level captions from the short fragments produced by
 * automatic captioning. Two strategies are available:
 *
 * - punctuation-driven: fragments are concatenated until a sentence boundary
 *   appears, then the buffer is cut right after the first boundary and the
 *   remainder is carried into the next sentence;
 * - heuristic: for captions without usable punctuation, fragments are merged
 *   greedily by length, time gap and language-specific sentence markers.
 *
 * The strategy is chosen from the punctuation density of the first fragments.
 */

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Result;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::subtitle_processor::{SubtitleCollection, SubtitleSegment, write_srt};

use super::boundary::{
    contains_sentence_boundary, ends_with_language_marker, has_punctuation, split_at_first_sentence,
};

/// Merge tunables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Keep absorbing fragments while the buffer is shorter than this
    pub min_chars: usize,

    /// Length the time-gap rule aims for
    pub target_chars: usize,

    /// Hard ceiling for a heuristic segment
    pub max_chars: usize,

    /// Largest gap in seconds still considered the same utterance
    pub max_time_gap: f64,

    /// Fragments inspected by the punctuation detector
    pub sample_size: usize,

    /// Share of punctuated fragments above which punctuation drives the merge
    pub punctuation_ratio: f64,

    /// Segment-count reduction a merge must exceed to be applied
    pub min_reduction_percent: f64,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            min_chars: 40,
            target_chars: 80,
            max_chars: 150,
            max_time_gap: 1.5,
            sample_size: 20,
            punctuation_ratio: 0.3,
            min_reduction_percent: 30.0,
        }
    }
}

/// Which algorithm produced a merge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeStrategy {
    Punctuation,
    Heuristic,
}

impl fmt::Display for MergeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Punctuation => write!(f, "punctuation"),
            Self::Heuristic => write!(f, "heuristic"),
        }
    }
}

/// Result of one optimization run
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub segments: Vec<SubtitleSegment>,
    pub strategy: MergeStrategy,
    pub original_count: usize,
    pub optimized_count: usize,
}

impl MergeOutcome {
    /// Segment-count reduction in percent, rounded to two decimals
    pub fn reduction_percent(&self) -> f64 {
        if self.original_count == 0 {
            return 0.0;
        }
        let ratio = self.optimized_count as f64 / self.original_count as f64;
        ((1.0 - ratio) * 100.0 * 100.0).round() / 100.0
    }

    /// Whether the reduction clears the given threshold (exclusive)
    pub fn exceeds_reduction(&self, min_percent: f64) -> bool {
        self.reduction_percent() > min_percent
    }
}

/// Sentence-aligning subtitle optimizer
#[derive(Debug, Clone, Default)]
pub struct SubtitleOptimizer {
    config: MergeConfig,
}

impl SubtitleOptimizer {
    pub fn new(config: MergeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MergeConfig {
        &self.config
    }

    /// Merge fragments into sentence-aligned segments
    pub fn optimize(&self, fragments: &[SubtitleSegment], language: Option<&str>) -> MergeOutcome {
        let strategy = if self.detect_punctuation(fragments) {
            MergeStrategy::Punctuation
        } else {
            MergeStrategy::Heuristic
        };

        let mut segments = match strategy {
            MergeStrategy::Punctuation => self.merge_by_punctuation(fragments),
            MergeStrategy::Heuristic => self.merge_by_heuristics(fragments, language),
        };

        for (i, segment) in segments.iter_mut().enumerate() {
            segment.index = i + 1;
        }

        debug!(
            "Merged {} fragments into {} segments using {} strategy",
            fragments.len(),
            segments.len(),
            strategy
        );

        MergeOutcome {
            original_count: fragments.len(),
            optimized_count: segments.len(),
            strategy,
            segments,
        }
    }

    /// Whether enough of the leading fragments carry punctuation
    pub fn detect_punctuation(&self, fragments: &[SubtitleSegment]) -> bool {
        let sampled = fragments.len().min(self.config.sample_size);
        if sampled == 0 {
            return false;
        }

        let punctuated = fragments[..sampled]
            .iter()
            .filter(|f| has_punctuation(&f.text))
            .count();

        punctuated as f64 / sampled as f64 > self.config.punctuation_ratio
    }

    fn merge_by_punctuation(&self, fragments: &[SubtitleSegment]) -> Vec<SubtitleSegment> {
        let mut merged: Vec<SubtitleSegment> = Vec::new();
        let mut overflow = String::new();
        let mut i = 0;

        while i < fragments.len() {
            let fragment = &fragments[i];
            let mut text;
            let start;
            let mut end = fragment.end_time;

            if overflow.is_empty() {
                text = normalize_text(&fragment.text);
                start = fragment.start_time;
            } else {
                // The carried text has no fragment of its own to take a start from
                start = merged.last().map_or(fragment.start_time, |s| s.end_time);
                text = std::mem::take(&mut overflow);
                append_text(&mut text, &fragment.text);
            }

            while i + 1 < fragments.len() && !contains_sentence_boundary(&text) {
                i += 1;
                append_text(&mut text, &fragments[i].text);
                end = fragments[i].end_time;
            }

            let (first, remainder) = split_at_first_sentence(&text);
            let first = first.trim();
            if !first.is_empty() {
                merged.push(SubtitleSegment::new(0, start, end.max(start), first));
            }

            overflow = remainder;
            i += 1;
        }

        if !overflow.is_empty() {
            let at = merged
                .last()
                .map(|s| s.end_time)
                .or_else(|| fragments.last().map(|f| f.end_time))
                .unwrap_or_default();
            merged.push(SubtitleSegment::new(0, at, at, overflow));
        }

        merged
    }

    fn merge_by_heuristics(&self, fragments: &[SubtitleSegment], language: Option<&str>) -> Vec<SubtitleSegment> {
        let max_chars = self.config.max_chars.max(1);
        let pieces: Vec<SubtitleSegment> = fragments
            .iter()
            .flat_map(|f| wrap_fragment(f, max_chars))
            .collect();

        let mut merged = Vec::new();
        let mut i = 0;

        while i < pieces.len() {
            let mut current = pieces[i].clone();

            while i + 1 < pieces.len() {
                let next = &pieces[i + 1];
                let len = char_len(&current.text);
                if len >= max_chars {
                    break;
                }

                let gap = next.start_time - current.end_time;
                let should_merge = len < self.config.min_chars
                    || (gap < self.config.max_time_gap && len < self.config.target_chars)
                    || language.is_some_and(|lang| {
                        !ends_with_language_marker(&current.text, lang) && len < max_chars
                    });

                if !should_merge || len + 1 + char_len(&next.text) > max_chars {
                    break;
                }

                i += 1;
                append_text(&mut current.text, &next.text);
                current.end_time = next.end_time.max(current.start_time);
            }

            merged.push(current);
            i += 1;
        }

        merged
    }
}

/// Read an SRT file, optimize it and write the result
///
/// Without an explicit output the result lands next to the input as
/// `<stem>.optimized.srt`. The merge is always written; callers decide
/// whether to use it from the returned outcome.
pub fn optimize_srt_file(
    optimizer: &SubtitleOptimizer,
    input: &Path,
    output: Option<&Path>,
    language: Option<&str>,
) -> Result<(PathBuf, MergeOutcome)> {
    let output = output.map_or_else(|| optimized_path_for(input), Path::to_path_buf);

    let collection = SubtitleCollection::from_srt_file(input, language.map(str::to_string))?;
    let outcome = optimizer.optimize(&collection.entries, language);
    write_srt(&output, &outcome.segments)?;

    info!(
        "Optimized {}: {} -> {} segments ({:.2}% reduction)",
        input.display(),
        outcome.original_count,
        outcome.optimized_count,
        outcome.reduction_percent()
    );

    Ok((output, outcome))
}

/// Sibling path `<stem>.optimized.<ext>` for an SRT file
pub fn optimized_path_for(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "subtitles".to_string());
    let ext = input
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "srt".to_string());
    input.with_file_name(format!("{}.optimized.{}", stem, ext))
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Collapse a multi-line caption into one line
fn normalize_text(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn append_text(buffer: &mut String, text: &str) {
    let text = normalize_text(text);
    if text.is_empty() {
        return;
    }
    if !buffer.is_empty() && !buffer.ends_with(' ') {
        buffer.push(' ');
    }
    buffer.push_str(&text);
}

/// Split a fragment longer than `max_chars` into pieces that fit
///
/// Cuts happen at whitespace; a run without whitespace is cut at `max_chars`
/// characters. Time is shared out in proportion to piece length.
fn wrap_fragment(fragment: &SubtitleSegment, max_chars: usize) -> Vec<SubtitleSegment> {
    let text = normalize_text(&fragment.text);
    if char_len(&text) <= max_chars {
        return vec![SubtitleSegment { text, ..fragment.clone() }];
    }

    let mut pieces: Vec<String> = Vec::new();
    let mut line = String::new();

    for word in text.split_whitespace() {
        let chars: Vec<char> = word.chars().collect();
        for chunk in chars.chunks(max_chars) {
            let chunk: String = chunk.iter().collect();
            let needed = if line.is_empty() { char_len(&chunk) } else { char_len(&line) + 1 + char_len(&chunk) };
            if needed > max_chars && !line.is_empty() {
                pieces.push(std::mem::take(&mut line));
            }
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(&chunk);
        }
    }
    if !line.is_empty() {
        pieces.push(line);
    }

    let total: usize = pieces.iter().map(|p| char_len(p)).sum::<usize>().max(1);
    let span = fragment.duration();
    let mut cursor = fragment.start_time;

    let count = pieces.len();
    pieces
        .into_iter()
        .enumerate()
        .map(|(i, piece)| {
            let end = if i + 1 == count {
                fragment.start_time + span
            } else {
                cursor + span * char_len(&piece) as f64 / total as f64
            };
            let segment = SubtitleSegment::new(fragment.index, cursor, end, piece);
            cursor = end;
            segment
        })
        .collect()
}
