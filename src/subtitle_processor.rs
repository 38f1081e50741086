use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use regex::Regex;
use once_cell::sync::Lazy;
use anyhow::{Result, Context};
use serde::{Deserialize, Serialize};
use log::{warn, debug};

use crate::errors::SubtitleError;
use crate::file_utils::FileManager;

// @module: SRT parsing, formatting and caption segment types

// @const: SRT timing line, comma or dot before the fraction
static TIMING_LINE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+:\d{2}:\d{2}[,.]\d{1,3})\s*-->\s*(\d+:\d{2}:\d{2}[,.]\d{1,3})").unwrap()
});

// @const: Blank-line block separator
static BLOCK_SEPARATOR_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\n\s*\n").unwrap()
});

/// A timed caption unit
///
/// Raw caption fragments and the sentence-aligned segments produced by the
/// merge engine share this shape. Times are in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtitleSegment {
    // @field: 1-based position in its list
    pub index: usize,

    // @field: Start time in seconds
    pub start_time: f64,

    // @field: End time in seconds
    pub end_time: f64,

    // @field: Caption text
    pub text: String,
}

impl SubtitleSegment {
    /// Create a new segment
    pub fn new(index: usize, start_time: f64, end_time: f64, text: impl Into<String>) -> Self {
        SubtitleSegment {
            index,
            start_time,
            end_time,
            text: text.into(),
        }
    }

    /// Segment duration, never negative
    pub fn duration(&self) -> f64 {
        (self.end_time - self.start_time).max(0.0)
    }

    /// Parse an SRT timestamp (`HH:MM:SS,mmm` or `HH:MM:SS.mmm`) to seconds
    pub fn parse_timestamp(timestamp: &str) -> Result<f64, SubtitleError> {
        let invalid = || SubtitleError::InvalidTimestamp(timestamp.to_string());
        let normalized = timestamp.trim().replace(',', ".");
        let parts: Vec<&str> = normalized.split(':').collect();

        if parts.len() != 3 {
            return Err(invalid());
        }

        let hours: u64 = parts[0].parse().map_err(|_| invalid())?;
        let minutes: u64 = parts[1].parse().map_err(|_| invalid())?;
        let seconds: f64 = parts[2].parse().map_err(|_| invalid())?;

        if minutes >= 60 || !(0.0..60.0).contains(&seconds) {
            return Err(invalid());
        }

        Ok((hours * 3600 + minutes * 60) as f64 + seconds)
    }

    /// Format seconds as an SRT timestamp (HH:MM:SS,mmm)
    pub fn format_timestamp(seconds: f64) -> String {
        let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
        let hours = total_ms / 3_600_000;
        let minutes = (total_ms % 3_600_000) / 60_000;
        let secs = (total_ms % 60_000) / 1_000;
        let millis = total_ms % 1_000;

        format!("{:02}:{:02}:{:02},{:03}", hours, minutes, secs, millis)
    }

    /// Formatted start time
    pub fn format_start_time(&self) -> String {
        Self::format_timestamp(self.start_time)
    }

    /// Formatted end time
    pub fn format_end_time(&self) -> String {
        Self::format_timestamp(self.end_time)
    }
}

impl fmt::Display for SubtitleSegment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}", self.index)?;
        writeln!(f, "{} --> {}", self.format_start_time(), self.format_end_time())?;
        writeln!(f, "{}", self.text)?;
        writeln!(f)
    }
}

/// Collection of subtitle segments with metadata
#[derive(Debug, Clone)]
pub struct SubtitleCollection {
    /// Source filename
    pub source_file: PathBuf,

    /// Segments in time order
    pub entries: Vec<SubtitleSegment>,

    /// Caption language tag, when known
    pub language: Option<String>,
}

impl SubtitleCollection {
    /// Create an empty collection
    pub fn new(source_file: PathBuf, language: Option<String>) -> Self {
        SubtitleCollection {
            source_file,
            entries: Vec::new(),
            language,
        }
    }

    /// Build a collection from already parsed segments
    pub fn from_entries(source_file: PathBuf, entries: Vec<SubtitleSegment>, language: Option<String>) -> Self {
        SubtitleCollection {
            source_file,
            entries,
            language,
        }
    }

    /// Read and parse an SRT file
    pub fn from_srt_file<P: AsRef<Path>>(path: P, language: Option<String>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read subtitle file: {}", path.display()))?;

        let entries = Self::parse_srt_string(&content);
        debug!("Parsed {} subtitle segments from {}", entries.len(), path.display());

        Ok(Self::from_entries(path.to_path_buf(), entries, language))
    }

    /// Caption texts in order
    pub fn texts(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.text.clone()).collect()
    }

    /// Write the collection to an SRT file, renumbering from 1
    pub fn write_to_srt<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        write_srt(path, &self.entries)
    }

    /// Parse SRT content into segments
    ///
    /// Blocks that cannot be parsed (missing index, bad timing line, reversed
    /// times, no text) are skipped with a warning. The result is sorted by
    /// start time and renumbered from 1.
    pub fn parse_srt_string(content: &str) -> Vec<SubtitleSegment> {
        let normalized = content.replace("\r\n", "\n").replace('\u{feff}', "");
        let mut entries = Vec::new();

        for block in BLOCK_SEPARATOR_REGEX.split(normalized.trim()) {
            match Self::parse_block(block) {
                Ok(entry) => entries.push(entry),
                Err(reason) => {
                    let preview: String = block.chars().take(50).collect();
                    warn!("Skipping subtitle block '{}': {}", preview.replace('\n', " | "), reason);
                }
            }
        }

        entries.sort_by(|a, b| a.start_time.total_cmp(&b.start_time));

        let overlap_count = entries
            .windows(2)
            .filter(|pair| pair[0].end_time > pair[1].start_time)
            .count();
        if overlap_count > 0 {
            warn!("Found {} overlapping subtitle entries", overlap_count);
        }

        for (i, entry) in entries.iter_mut().enumerate() {
            entry.index = i + 1;
        }

        entries
    }

    fn parse_block(block: &str) -> Result<SubtitleSegment, String> {
        let lines: Vec<&str> = block.lines().map(str::trim).collect();
        if lines.len() < 3 {
            return Err("block has fewer than three lines".to_string());
        }

        let index: usize = lines[0]
            .parse()
            .map_err(|_| format!("invalid sequence number '{}'", lines[0]))?;

        let caps = TIMING_LINE_REGEX
            .captures(lines[1])
            .ok_or_else(|| format!("invalid timing line '{}'", lines[1]))?;
        let start_time = SubtitleSegment::parse_timestamp(&caps[1]).map_err(|e| e.to_string())?;
        let end_time = SubtitleSegment::parse_timestamp(&caps[2]).map_err(|e| e.to_string())?;

        if end_time < start_time {
            return Err(format!("end time {:.3} precedes start time {:.3}", end_time, start_time));
        }

        let text = lines[2..]
            .iter()
            .filter(|l| !l.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join("\n");
        if text.is_empty() {
            return Err("empty text".to_string());
        }

        Ok(SubtitleSegment::new(index, start_time, end_time, text))
    }
}

impl fmt::Display for SubtitleCollection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Subtitle Collection")?;
        writeln!(f, "Source: {:?}", self.source_file)?;
        writeln!(f, "Language: {}", self.language.as_deref().unwrap_or("unknown"))?;
        writeln!(f, "Entries: {}", self.entries.len())?;
        Ok(())
    }
}

/// Render segments as SRT text, renumbering from 1
pub fn to_srt_string(segments: &[SubtitleSegment]) -> String {
    segments
        .iter()
        .enumerate()
        .map(|(i, segment)| {
            SubtitleSegment {
                index: i + 1,
                ..segment.clone()
            }
            .to_string()
        })
        .collect()
}

/// Write segments to an SRT file, creating parent directories as needed
pub fn write_srt<P: AsRef<Path>>(path: P, segments: &[SubtitleSegment]) -> Result<()> {
    FileManager::write_to_file(path, &to_srt_string(segments))
}
