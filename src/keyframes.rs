use std::fmt;
use std::str::FromStr;

use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::subtitle_processor::SubtitleSegment;

// @module: Keyframe timestamp selection

/// Where inside a segment the screenshot is taken
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScreenshotPosition {
    Start,
    #[default]
    Middle,
    End,
}

impl fmt::Display for ScreenshotPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => write!(f, "start"),
            Self::Middle => write!(f, "middle"),
            Self::End => write!(f, "end"),
        }
    }
}

impl FromStr for ScreenshotPosition {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "start" => Ok(Self::Start),
            "middle" => Ok(Self::Middle),
            "end" => Ok(Self::End),
            _ => Err(anyhow!("Invalid screenshot position: {}", s)),
        }
    }
}

/// One screenshot timestamp per segment, in segment order
///
/// The offset may be negative; results are clamped at zero.
pub fn select_timestamps(segments: &[SubtitleSegment], position: ScreenshotPosition, offset: f64) -> Vec<f64> {
    segments
        .iter()
        .map(|segment| {
            let base = match position {
                ScreenshotPosition::Start => segment.start_time,
                ScreenshotPosition::End => segment.end_time,
                ScreenshotPosition::Middle => (segment.start_time + segment.end_time) / 2.0,
            };
            (base + offset).max(0.0)
        })
        .collect()
}

/// Text of the segment covering `timestamp`
///
/// Intervals are half-open, except that the final segment's end time still
/// resolves to that segment. Uncovered timestamps give an empty string.
pub fn text_at(timestamp: f64, segments: &[SubtitleSegment]) -> String {
    if let Some(segment) = segments
        .iter()
        .find(|s| s.start_time <= timestamp && timestamp < s.end_time)
    {
        return segment.text.clone();
    }

    match segments.last() {
        Some(last) if timestamp == last.end_time => last.text.clone(),
        _ => String::new(),
    }
}
