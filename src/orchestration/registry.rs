// Model registry - maps content types and short model keys to remote model references

use super::error::GenerationError;
use super::types::{ContentType, ModelInfo};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Remote model reference in `owner/name[:version]` form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelRef {
    pub owner: String,
    pub name: String,
    pub version: Option<String>,
}

impl FromStr for ModelRef {
    type Err = GenerationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || GenerationError::InvalidModelRef(s.to_string());

        let (path, version) = match s.split_once(':') {
            Some((path, version)) if !version.is_empty() => (path, Some(version.to_string())),
            Some(_) => return Err(invalid()),
            None => (s, None),
        };

        let (owner, name) = path.split_once('/').ok_or_else(invalid)?;
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return Err(invalid());
        }

        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
            version,
        })
    }
}

impl fmt::Display for ModelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)?;
        if let Some(version) = &self.version {
            write!(f, ":{}", version)?;
        }
        Ok(())
    }
}

/// Models available for one content type
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelSet {
    /// Key used when a request names no model
    pub default: String,
    #[serde(default)]
    pub models: BTreeMap<String, String>,
}

impl ModelSet {
    pub fn new(default: impl Into<String>) -> Self {
        Self {
            default: default.into(),
            models: BTreeMap::new(),
        }
    }

    pub fn with_model(mut self, key: impl Into<String>, reference: impl Into<String>) -> Self {
        self.models.insert(key.into(), reference.into());
        self
    }

    fn default_text() -> Self {
        Self::new("gpt")
            .with_model(
                "gpt",
                "meta/llama-2-70b-chat:02e509c789964a7ea8736978a43525956ef40397be9033abf9fd2badfe68c9e3",
            )
            .with_model(
                "claude",
                "anthropic/claude-3-sonnet:cd2fd0478b0a4bb8b1e11d4b95c1e1a6e6b5d0b4c1a0a97cf49e36e82d6e3d8c",
            )
    }

    fn default_image() -> Self {
        Self::new("sdxl")
            .with_model(
                "sdxl",
                "stability-ai/sdxl:39ed52f2a78e934b3ba6e2a89f5b1c712de7dfea535525255b1aa35c5565e08b",
            )
            .with_model(
                "dall-e",
                "openai/dall-e-3:7495cf2d4bc0ee0a6e9ad5c6ef3b49b9f4b6e0d4c85e6f9a9c8b0a5d3e7f2c1d",
            )
            .with_model(
                "midjourney",
                "tstramer/midjourney-diffusion:436b051ebd8f68d23e83d22de5e198e0995357afef113768c20f0b6fcef23c8b",
            )
    }

    fn default_video() -> Self {
        Self::new("stable-video")
            .with_model(
                "stable-video",
                "stability-ai/stable-video-diffusion:3f0457e4619daac51203dedb1a4a8b1b68faca5c8a21df5e5e3b2e2c4b5a6d7e",
            )
            .with_model("runway", "runwayml/stable-video-diffusion")
            .with_model("animate-diff", "lucataco/animate-diff")
    }

    fn default_audio() -> Self {
        Self::new("music")
            .with_model(
                "music",
                "riffusion/riffusion:8cf61ea6c56afd61d8f5b9ffd14d7c216c0a93844ce2d82ac1c9ecc9c7f24e05",
            )
            .with_model("speech", "cjwbw/seamless-text-to-speech")
            .with_model("sound-effects", "afiaka87/riffusion-model")
    }
}

/// A resolved model key and its parsed reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedModel {
    pub key: String,
    pub reference: ModelRef,
}

/// Immutable content type -> model key -> model reference table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelRegistry {
    #[serde(default = "ModelSet::default_text")]
    pub text: ModelSet,

    #[serde(default = "ModelSet::default_image")]
    pub image: ModelSet,

    #[serde(default = "ModelSet::default_video")]
    pub video: ModelSet,

    #[serde(default = "ModelSet::default_audio")]
    pub audio: ModelSet,
}

impl ModelRegistry {
    pub fn new(text: ModelSet, image: ModelSet, video: ModelSet, audio: ModelSet) -> Self {
        Self {
            text,
            image,
            video,
            audio,
        }
    }

    pub fn models(&self, content_type: ContentType) -> &ModelSet {
        match content_type {
            ContentType::Text => &self.text,
            ContentType::Image => &self.image,
            ContentType::Video => &self.video,
            ContentType::Audio => &self.audio,
        }
    }

    pub fn default_key(&self, content_type: ContentType) -> &str {
        &self.models(content_type).default
    }

    /// Look up `key` (or the content type's default) and parse its reference
    pub fn resolve(
        &self,
        content_type: ContentType,
        key: Option<&str>,
    ) -> Result<ResolvedModel, GenerationError> {
        let set = self.models(content_type);
        let key = key.unwrap_or(&set.default);

        let reference = set
            .models
            .get(key)
            .ok_or_else(|| GenerationError::Resolution {
                content_type,
                key: key.to_string(),
            })?;

        Ok(ResolvedModel {
            key: key.to_string(),
            reference: reference.parse()?,
        })
    }

    /// Full table keyed by content type
    pub fn table(&self) -> BTreeMap<ContentType, BTreeMap<String, String>> {
        ContentType::ALL
            .iter()
            .map(|ct| (*ct, self.models(*ct).models.clone()))
            .collect()
    }

    /// Snapshot of the registry alongside the output directory
    pub fn info(&self, output_directory: &Path) -> ModelInfo {
        ModelInfo {
            available_models: self.table(),
            default_models: ContentType::ALL
                .iter()
                .map(|ct| (*ct, self.default_key(*ct).to_string()))
                .collect(),
            supported_content_types: ContentType::ALL.to_vec(),
            output_directory: output_directory.to_path_buf(),
        }
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self {
            text: ModelSet::default_text(),
            image: ModelSet::default_image(),
            video: ModelSet::default_video(),
            audio: ModelSet::default_audio(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_ref_parsing() {
        let versioned: ModelRef = "stability-ai/sdxl:abc123".parse().unwrap();
        assert_eq!(versioned.owner, "stability-ai");
        assert_eq!(versioned.name, "sdxl");
        assert_eq!(versioned.version.as_deref(), Some("abc123"));
        assert_eq!(versioned.to_string(), "stability-ai/sdxl:abc123");

        let latest: ModelRef = "lucataco/animate-diff".parse().unwrap();
        assert_eq!(latest.version, None);
    }

    #[test]
    fn test_model_ref_rejects_malformed() {
        for bad in ["sdxl", "/sdxl", "owner/", "a/b/c", "owner/name:"] {
            assert!(bad.parse::<ModelRef>().is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn test_default_keys() {
        let registry = ModelRegistry::default();
        assert_eq!(registry.default_key(ContentType::Text), "gpt");
        assert_eq!(registry.default_key(ContentType::Image), "sdxl");
        assert_eq!(registry.default_key(ContentType::Video), "stable-video");
        assert_eq!(registry.default_key(ContentType::Audio), "music");
    }

    #[test]
    fn test_every_default_resolves() {
        let registry = ModelRegistry::default();
        for ct in ContentType::ALL {
            let resolved = registry.resolve(ct, None).unwrap();
            assert_eq!(resolved.key, registry.default_key(ct));
            for key in registry.models(ct).models.keys() {
                assert!(registry.resolve(ct, Some(key)).is_ok(), "{ct}/{key}");
            }
        }
    }

    #[test]
    fn test_unknown_key_is_resolution_error() {
        let registry = ModelRegistry::default();
        let err = registry
            .resolve(ContentType::Audio, Some("musicgen"))
            .unwrap_err();

        assert!(matches!(err, GenerationError::Resolution { .. }));
        assert!(err.to_string().contains("musicgen"));
        assert!(err.to_string().contains("audio"));
    }

    #[test]
    fn test_partial_registry_from_toml() {
        let registry: ModelRegistry = toml::from_str(
            r#"
            [image]
            default = "flux"

            [image.models]
            flux = "black-forest-labs/flux-schnell"
            "#,
        )
        .unwrap();

        assert_eq!(registry.resolve(ContentType::Image, None).unwrap().key, "flux");
        assert_eq!(registry.text, ModelRegistry::default().text);
    }
}
