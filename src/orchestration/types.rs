// Core types for the content generation pipeline

use super::error::{GenerationError, UnknownContentType};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Free-form tuning knobs and remote input parameters
pub type Params = Map<String, Value>;

/// Generation modality of a request
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Text,
    Image,
    Video,
    Audio,
}

impl ContentType {
    pub const ALL: [ContentType; 4] = [
        ContentType::Text,
        ContentType::Image,
        ContentType::Video,
        ContentType::Audio,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Text => "text",
            ContentType::Image => "image",
            ContentType::Video => "video",
            ContentType::Audio => "audio",
        }
    }

    /// File extension used for artifacts of this type
    pub fn extension(&self) -> &'static str {
        match self {
            ContentType::Text => "txt",
            ContentType::Image => "png",
            ContentType::Video => "mp4",
            ContentType::Audio => "wav",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ContentType::Text => "Stories, copy and other prose from language models",
            ContentType::Image => "Still images from diffusion models",
            ContentType::Video => "Short clips from video diffusion models",
            ContentType::Audio => "Music, speech and sound effects",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = UnknownContentType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" => Ok(ContentType::Text),
            "image" => Ok(ContentType::Image),
            "video" => Ok(ContentType::Video),
            "audio" => Ok(ContentType::Audio),
            other => Err(UnknownContentType(other.to_string())),
        }
    }
}

/// A single generation request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContentRequest {
    pub content_type: ContentType,
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    /// Seconds, for video and audio
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    /// `"<width>x<height>"`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<String>,
    /// Model key within the content type's registry entry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_params: Option<Params>,
}

impl ContentRequest {
    pub fn new(content_type: ContentType, prompt: impl Into<String>) -> Self {
        Self {
            content_type,
            prompt: prompt.into(),
            style: None,
            duration: None,
            dimensions: None,
            model_version: None,
            additional_params: None,
        }
    }

    pub fn text(prompt: impl Into<String>) -> Self {
        Self::new(ContentType::Text, prompt)
    }

    pub fn image(prompt: impl Into<String>) -> Self {
        Self::new(ContentType::Image, prompt)
    }

    pub fn video(prompt: impl Into<String>) -> Self {
        Self::new(ContentType::Video, prompt)
    }

    pub fn audio(prompt: impl Into<String>) -> Self {
        Self::new(ContentType::Audio, prompt)
    }

    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = Some(style.into());
        self
    }

    pub fn with_duration(mut self, seconds: u32) -> Self {
        self.duration = Some(seconds);
        self
    }

    pub fn with_dimensions(mut self, dimensions: impl Into<String>) -> Self {
        self.dimensions = Some(dimensions.into());
        self
    }

    pub fn with_model(mut self, key: impl Into<String>) -> Self {
        self.model_version = Some(key.into());
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.additional_params
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }

    /// Parsed `dimensions`, or `None` when the request leaves them unset
    pub fn parsed_dimensions(&self) -> Result<Option<Dimensions>, GenerationError> {
        self.dimensions.as_deref().map(Dimensions::parse).transpose()
    }
}

/// Width and height in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn parse(s: &str) -> Result<Self, GenerationError> {
        let invalid = || GenerationError::InvalidDimensions(s.to_string());

        let (width, height) = s.trim().split_once('x').ok_or_else(invalid)?;
        let width: u32 = width.trim().parse().map_err(|_| invalid())?;
        let height: u32 = height.trim().parse().map_err(|_| invalid())?;

        if width == 0 || height == 0 {
            return Err(invalid());
        }

        Ok(Self { width, height })
    }
}

impl FromStr for Dimensions {
    type Err = GenerationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Outcome of a request
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ResultStatus {
    Completed,
    Failed,
}

/// Result of one generation request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContentResult {
    pub content_type: ContentType,
    pub prompt: String,
    /// Local artifact paths, empty on failure
    pub urls: Vec<String>,
    pub metadata: Params,
    /// Wall-clock seconds
    pub generation_time: f64,
    pub status: ResultStatus,
}

impl ContentResult {
    pub fn completed(
        content_type: ContentType,
        prompt: impl Into<String>,
        urls: Vec<String>,
        metadata: Params,
        generation_time: f64,
    ) -> Self {
        Self {
            content_type,
            prompt: prompt.into(),
            urls,
            metadata,
            generation_time: generation_time.max(0.0),
            status: ResultStatus::Completed,
        }
    }

    pub fn failed(
        content_type: ContentType,
        prompt: impl Into<String>,
        error: impl fmt::Display,
        generation_time: f64,
    ) -> Self {
        let mut metadata = Map::new();
        metadata.insert("error".to_string(), Value::String(error.to_string()));

        Self {
            content_type,
            prompt: prompt.into(),
            urls: Vec::new(),
            metadata,
            generation_time: generation_time.max(0.0),
            status: ResultStatus::Failed,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == ResultStatus::Completed
    }

    /// Error message recorded for a failed result
    pub fn error(&self) -> Option<&str> {
        self.metadata.get("error").and_then(Value::as_str)
    }

    /// Model key recorded for a completed result
    pub fn model(&self) -> Option<&str> {
        self.metadata.get("model").and_then(Value::as_str)
    }
}

/// Summary record persisted for every story
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StorySummary {
    pub prompt: String,
    /// Epoch seconds
    pub created_at: f64,
    pub content_types: Vec<ContentType>,
    pub total_generation_time: f64,
    pub results: BTreeMap<ContentType, ContentResult>,
}

impl StorySummary {
    /// Group batch results by content type. Later results replace earlier
    /// ones of the same type; the total covers every result.
    pub fn new(prompt: impl Into<String>, results: &[ContentResult]) -> Self {
        let mut grouped = BTreeMap::new();
        for result in results {
            grouped.insert(result.content_type, result.clone());
        }

        let created_at = chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0;

        Self {
            prompt: prompt.into(),
            created_at,
            content_types: grouped.keys().copied().collect(),
            total_generation_time: results.iter().fold(0.0, |acc, r| acc + r.generation_time),
            results: grouped,
        }
    }
}

/// A generated multimedia story
#[derive(Debug, Clone)]
pub struct Story {
    pub results: BTreeMap<ContentType, ContentResult>,
    pub summary: StorySummary,
    pub summary_path: PathBuf,
}

/// Snapshot of the model registry and output location
#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub available_models: BTreeMap<ContentType, BTreeMap<String, String>>,
    pub default_models: BTreeMap<ContentType, String>,
    pub supported_content_types: Vec<ContentType>,
    pub output_directory: PathBuf,
}
