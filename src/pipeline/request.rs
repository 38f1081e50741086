use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use crate::app_config::AiProvider;
use crate::keyframes::ScreenshotPosition;

/// Download resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VideoQuality {
    #[serde(rename = "360")]
    Q360,
    #[serde(rename = "480")]
    Q480,
    #[default]
    #[serde(rename = "720")]
    Q720,
}

impl VideoQuality {
    /// Frame height in pixels
    pub fn height(&self) -> u32 {
        match self {
            Self::Q360 => 360,
            Self::Q480 => 480,
            Self::Q720 => 720,
        }
    }
}

impl fmt::Display for VideoQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.height())
    }
}

impl FromStr for VideoQuality {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().trim_end_matches('p') {
            "360" => Ok(Self::Q360),
            "480" => Ok(Self::Q480),
            "720" => Ok(Self::Q720),
            _ => Err(anyhow!("Invalid video quality: {}", s)),
        }
    }
}

/// One video processing request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessRequest {
    /// Video page URL
    pub url: String,

    pub quality: VideoQuality,

    /// Preferred caption languages, in order; `None` takes whatever is available
    pub subtitle_languages: Option<Vec<String>>,

    /// Translate captions to this language
    pub translate_to: Option<String>,

    pub screenshot_position: ScreenshotPosition,

    /// Seconds added to every screenshot timestamp
    pub screenshot_offset: f64,

    /// Generate an AI outline (also switches translation to the AI path)
    pub generate_outline: bool,

    pub ai_provider: Option<AiProvider>,

    pub ai_model: Option<String>,

    /// Key for `ai_provider`, overriding the configured one
    pub api_key: Option<String>,

    /// Transcribe the audio instead of using platform captions
    pub use_ai_transcription: bool,

    pub whisper_api_key: Option<String>,
}

impl ProcessRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Whether both conditions for AI transcription hold
    pub fn wants_transcription(&self) -> bool {
        self.use_ai_transcription && self.whisper_api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }

    /// Provider to use for AI translation and outline, if enabled
    pub fn outline_provider(&self) -> Option<AiProvider> {
        if self.generate_outline { self.ai_provider } else { None }
    }
}
