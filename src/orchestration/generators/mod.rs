// Generator implementations, one per content type

mod audio;
mod image;
mod text;
mod video;

pub use audio::AudioGenerator;
pub use image::ImageGenerator;
pub use text::TextGenerator;
pub use video::VideoGenerator;

use super::error::GenerationError;
use super::storage::ArtifactStore;
use super::types::{ContentRequest, ContentType, Params};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// What a generator produced for one request
#[derive(Debug, Clone, Default)]
pub struct Produced {
    /// Local artifact paths
    pub urls: Vec<String>,
    pub metadata: Params,
}

/// Base trait for all generators
#[async_trait]
pub trait Generator: Send + Sync {
    /// Content type this generator handles
    fn content_type(&self) -> ContentType;

    /// Build the remote input parameters for `request` against model `model_key`
    fn build_input(&self, request: &ContentRequest, model_key: &str)
    -> Result<Params, GenerationError>;

    /// Store the prediction output and describe what was produced
    async fn collect(
        &self,
        store: &ArtifactStore,
        request: &ContentRequest,
        model_key: &str,
        input: &Params,
        output: Value,
    ) -> Result<Produced, GenerationError>;
}

/// One generator per content type
#[derive(Clone)]
pub struct GeneratorSet {
    text: Arc<dyn Generator>,
    image: Arc<dyn Generator>,
    video: Arc<dyn Generator>,
    audio: Arc<dyn Generator>,
}

impl GeneratorSet {
    pub fn new() -> Self {
        Self {
            text: Arc::new(TextGenerator),
            image: Arc::new(ImageGenerator),
            video: Arc::new(VideoGenerator),
            audio: Arc::new(AudioGenerator),
        }
    }

    /// Replace the generator for the content type it reports
    pub fn register(&mut self, generator: Arc<dyn Generator>) {
        match generator.content_type() {
            ContentType::Text => self.text = generator,
            ContentType::Image => self.image = generator,
            ContentType::Video => self.video = generator,
            ContentType::Audio => self.audio = generator,
        }
    }

    pub fn get(&self, content_type: ContentType) -> &Arc<dyn Generator> {
        match content_type {
            ContentType::Text => &self.text,
            ContentType::Image => &self.image,
            ContentType::Video => &self.video,
            ContentType::Audio => &self.audio,
        }
    }
}

impl Default for GeneratorSet {
    fn default() -> Self {
        Self::new()
    }
}

/// Typed access to `additional_params` with per-key defaults
pub(crate) struct Tuning<'a>(Option<&'a Params>);

impl<'a> Tuning<'a> {
    pub(crate) fn of(request: &'a ContentRequest) -> Self {
        Self(request.additional_params.as_ref())
    }

    fn get(&self, key: &str) -> Option<&'a Value> {
        self.0.and_then(|params| params.get(key)).filter(|v| !v.is_null())
    }

    pub(crate) fn integer(&self, key: &str, default: u64) -> Result<u64, GenerationError> {
        match self.get(key) {
            None => Ok(default),
            Some(value) => value
                .as_u64()
                .or_else(|| {
                    value
                        .as_f64()
                        .filter(|f| *f >= 0.0 && f.fract() == 0.0)
                        .map(|f| f as u64)
                })
                .ok_or_else(|| invalid_param(key, "a non-negative integer")),
        }
    }

    pub(crate) fn float(&self, key: &str, default: f64) -> Result<f64, GenerationError> {
        match self.get(key) {
            None => Ok(default),
            Some(value) => value.as_f64().ok_or_else(|| invalid_param(key, "a number")),
        }
    }

    pub(crate) fn string(&self, key: &str, default: &str) -> Result<String, GenerationError> {
        match self.get(key) {
            None => Ok(default.to_string()),
            Some(value) => value
                .as_str()
                .map(str::to_string)
                .ok_or_else(|| invalid_param(key, "a string")),
        }
    }
}

fn invalid_param(key: &str, expected: &'static str) -> GenerationError {
    GenerationError::InvalidParam {
        key: key.to_string(),
        expected,
    }
}

/// `"{prompt}, {style} style"` when a style is set
pub(crate) fn styled_prompt(request: &ContentRequest) -> String {
    match &request.style {
        Some(style) => format!("{}, {} style", request.prompt, style),
        None => request.prompt.clone(),
    }
}

/// Object fields that commonly carry the artifact URL
const ARTIFACT_KEYS: [&str; 5] = ["audio", "video", "image", "output", "url"];

/// Artifact references in a prediction output
pub(crate) fn artifact_urls(output: &Value) -> Result<Vec<String>, GenerationError> {
    let urls = match output {
        Value::String(url) => vec![url.clone()],
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_str().map(str::to_string).ok_or_else(|| {
                    GenerationError::UnexpectedOutput(format!("non-string artifact {}", item))
                })
            })
            .collect::<Result<Vec<_>, _>>()?,
        Value::Object(fields) => ARTIFACT_KEYS
            .iter()
            .find_map(|key| fields.get(*key).and_then(Value::as_str))
            .map(|url| vec![url.to_string()])
            .ok_or_else(|| GenerationError::UnexpectedOutput(output.to_string()))?,
        other => return Err(GenerationError::UnexpectedOutput(other.to_string())),
    };

    if urls.is_empty() {
        return Err(GenerationError::UnexpectedOutput(
            "prediction returned no artifacts".to_string(),
        ));
    }

    Ok(urls)
}

/// Download every artifact in `output`, returning local paths in output order
pub(crate) async fn download_artifacts(
    store: &ArtifactStore,
    content_type: ContentType,
    output: &Value,
) -> Result<Vec<String>, GenerationError> {
    let urls = artifact_urls(output)?;
    let indexed = output.is_array();

    let mut saved = Vec::with_capacity(urls.len());
    for (i, url) in urls.iter().enumerate() {
        let filename = store.artifact_filename(content_type, indexed.then_some(i));
        let path = store.download(url, &filename).await?;
        saved.push(path.display().to_string());
    }

    Ok(saved)
}

/// Convert a `json!` object literal into params
pub(crate) fn into_params(value: Value) -> Params {
    match value {
        Value::Object(map) => map,
        _ => Params::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tuning_defaults_without_params() {
        let request = ContentRequest::image("cat");
        let tuning = Tuning::of(&request);
        assert_eq!(tuning.integer("steps", 50).unwrap(), 50);
        assert_eq!(tuning.float("guidance_scale", 7.5).unwrap(), 7.5);
        assert_eq!(tuning.string("negative_prompt", "").unwrap(), "");
    }

    #[test]
    fn test_tuning_reads_overrides() {
        let request = ContentRequest::image("cat")
            .with_param("steps", 30)
            .with_param("num_outputs", 2.0)
            .with_param("guidance_scale", 9)
            .with_param("negative_prompt", Value::Null);
        let tuning = Tuning::of(&request);

        assert_eq!(tuning.integer("steps", 50).unwrap(), 30);
        assert_eq!(tuning.integer("num_outputs", 1).unwrap(), 2);
        assert_eq!(tuning.float("guidance_scale", 7.5).unwrap(), 9.0);
        assert_eq!(tuning.string("negative_prompt", "blurry").unwrap(), "blurry");
    }

    #[test]
    fn test_tuning_rejects_wrong_types() {
        let request = ContentRequest::image("cat")
            .with_param("steps", "many")
            .with_param("guidance_scale", "high")
            .with_param("frames", 2.5);
        let tuning = Tuning::of(&request);

        assert!(matches!(
            tuning.integer("steps", 50),
            Err(GenerationError::InvalidParam { .. })
        ));
        assert!(tuning.float("guidance_scale", 7.5).is_err());
        assert!(tuning.integer("frames", 14).is_err());
    }

    #[test]
    fn test_styled_prompt() {
        assert_eq!(styled_prompt(&ContentRequest::image("a fox")), "a fox");
        assert_eq!(
            styled_prompt(&ContentRequest::image("a fox").with_style("watercolor")),
            "a fox, watercolor style"
        );
    }

    #[test]
    fn test_artifact_urls_shapes() {
        assert_eq!(artifact_urls(&json!("https://a/1.png")).unwrap(), vec!["https://a/1.png"]);
        assert_eq!(
            artifact_urls(&json!(["https://a/1.png", "https://a/2.png"])).unwrap().len(),
            2
        );
        assert_eq!(
            artifact_urls(&json!({"audio": "https://a/x.wav", "spectrogram": "https://a/x.png"}))
                .unwrap(),
            vec!["https://a/x.wav"]
        );
    }

    #[test]
    fn test_artifact_urls_rejects_unexpected() {
        for bad in [json!(null), json!([]), json!([1, 2]), json!({"tokens": 3}), json!(42)] {
            assert!(
                matches!(artifact_urls(&bad), Err(GenerationError::UnexpectedOutput(_))),
                "accepted {bad}"
            );
        }
    }

    #[test]
    fn test_generator_set_dispatch() {
        let set = GeneratorSet::new();
        for ct in ContentType::ALL {
            assert_eq!(set.get(ct).content_type(), ct);
        }
    }
}
