// Orchestrator - dispatches content requests to generators and gathers results

use super::config::ContentConfig;
use super::error::{GenerationError, OrchestratorError};
use super::generators::{Generator, GeneratorSet, Produced};
use super::registry::ModelRegistry;
use super::remote::{PredictionClient, ReplicateClient};
use super::storage::ArtifactStore;
use super::types::{
    ContentRequest, ContentResult, ContentType, ModelInfo, Story, StorySummary,
};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;

/// Turns batches of heterogeneous requests into per-request results
#[derive(Clone)]
pub struct ContentOrchestrator {
    client: Arc<dyn PredictionClient>,
    registry: Arc<ModelRegistry>,
    store: Arc<ArtifactStore>,
    generators: GeneratorSet,
}

impl ContentOrchestrator {
    /// Create an orchestrator talking to the configured predictions API
    pub fn new(config: ContentConfig) -> Result<Self, OrchestratorError> {
        let client = ReplicateClient::from_config(&config)?;
        std::fs::create_dir_all(&config.output_dir)?;

        Ok(Self::with_client(
            Arc::new(client),
            config.models,
            ArtifactStore::new(config.output_dir),
        ))
    }

    /// Create an orchestrator over an arbitrary prediction backend
    pub fn with_client(
        client: Arc<dyn PredictionClient>,
        registry: ModelRegistry,
        store: ArtifactStore,
    ) -> Self {
        Self {
            client,
            registry: Arc::new(registry),
            store: Arc::new(store),
            generators: GeneratorSet::new(),
        }
    }

    /// Replace the generator for one content type
    pub fn with_generator(mut self, generator: Arc<dyn Generator>) -> Self {
        self.generators.register(generator);
        self
    }

    pub async fn generate_text(&self, request: &ContentRequest) -> ContentResult {
        self.generate_as(ContentType::Text, request).await
    }

    pub async fn generate_image(&self, request: &ContentRequest) -> ContentResult {
        self.generate_as(ContentType::Image, request).await
    }

    pub async fn generate_video(&self, request: &ContentRequest) -> ContentResult {
        self.generate_as(ContentType::Video, request).await
    }

    pub async fn generate_audio(&self, request: &ContentRequest) -> ContentResult {
        self.generate_as(ContentType::Audio, request).await
    }

    /// Generate with the generator matching the request's content type
    pub async fn generate(&self, request: &ContentRequest) -> ContentResult {
        self.generate_as(request.content_type, request).await
    }

    /// Failure boundary: every error becomes a failed result
    async fn generate_as(&self, content_type: ContentType, request: &ContentRequest) -> ContentResult {
        let start = Instant::now();

        match self.produce(content_type, request).await {
            Ok(produced) => {
                let elapsed = start.elapsed().as_secs_f64();
                tracing::info!(
                    "Generated {} ({} artifact(s)) in {:.2}s",
                    content_type,
                    produced.urls.len(),
                    elapsed
                );
                ContentResult::completed(
                    content_type,
                    request.prompt.clone(),
                    produced.urls,
                    produced.metadata,
                    elapsed,
                )
            }
            Err(e) => {
                tracing::error!("{} generation failed: {}", content_type, e);
                ContentResult::failed(
                    content_type,
                    request.prompt.clone(),
                    e,
                    start.elapsed().as_secs_f64(),
                )
            }
        }
    }

    async fn produce(
        &self,
        content_type: ContentType,
        request: &ContentRequest,
    ) -> Result<Produced, GenerationError> {
        let generator = self.generators.get(content_type);
        let model = self
            .registry
            .resolve(content_type, request.model_version.as_deref())?;
        let input = generator.build_input(request, &model.key)?;

        tracing::info!("Generating {} with model: {}", content_type, model.key);
        let output = self.client.run(&model.reference, &input).await?;

        let mut produced = generator
            .collect(&self.store, request, &model.key, &input, output)
            .await?;
        produced
            .metadata
            .insert("model_id".to_string(), Value::String(model.reference.to_string()));

        Ok(produced)
    }

    /// Run every request concurrently; results keep input order and length
    pub async fn generate_content_batch(&self, requests: &[ContentRequest]) -> Vec<ContentResult> {
        let handles: Vec<_> = requests
            .iter()
            .cloned()
            .map(|request| {
                let orchestrator = self.clone();
                tokio::spawn(async move { orchestrator.generate(&request).await })
            })
            .collect();

        let mut results = Vec::with_capacity(requests.len());
        for (index, (request, handle)) in requests.iter().zip(handles).enumerate() {
            match handle.await {
                Ok(result) => results.push(result),
                Err(e) => {
                    tracing::error!("Batch generation failed for request {}: {}", index, e);
                    results.push(ContentResult::failed(
                        request.content_type,
                        request.prompt.clone(),
                        format!("Task join error: {}", e),
                        0.0,
                    ));
                }
            }
        }

        results
    }

    /// Text, image, video and optionally audio from one prompt, summarized on disk
    pub async fn create_multimedia_story(
        &self,
        prompt: &str,
        include_audio: bool,
    ) -> Result<Story, OrchestratorError> {
        tracing::info!("Creating multimedia story: {}", prompt);

        let requests = story_requests(prompt, include_audio);
        let results = self.generate_content_batch(&requests).await;

        let summary = StorySummary::new(prompt, &results);
        let summary_path = self.store.write_story_summary(&summary).await?;

        tracing::info!(
            "Multimedia story completed in {:.2} seconds",
            summary.total_generation_time
        );

        Ok(Story {
            results: summary.results.clone(),
            summary,
            summary_path,
        })
    }

    /// One request per style over the same base request, results in style order
    pub async fn generate_variations<S: AsRef<str>>(
        &self,
        base: &ContentRequest,
        styles: &[S],
    ) -> Vec<ContentResult> {
        let requests: Vec<_> = styles
            .iter()
            .map(|style| base.clone().with_style(style.as_ref()))
            .collect();

        self.generate_content_batch(&requests).await
    }

    /// Registry contents, supported types and output location
    pub fn get_model_info(&self) -> ModelInfo {
        self.registry.info(self.store.output_dir())
    }
}

/// Requests making up a multimedia story
pub fn story_requests(prompt: &str, include_audio: bool) -> Vec<ContentRequest> {
    let mut requests = vec![
        ContentRequest::text(format!(
            "Write a creative short story based on this concept: {}",
            prompt
        ))
        .with_style("narrative"),
        ContentRequest::image(format!("A beautiful illustration of: {}", prompt))
            .with_style("cinematic, high quality")
            .with_dimensions("1024x1024"),
        ContentRequest::video(format!("A short video scene showing: {}", prompt))
            .with_style("cinematic")
            .with_dimensions("1024x576")
            .with_param("num_frames", 25)
            .with_param("fps", 8),
    ];

    if include_audio {
        requests.push(
            ContentRequest::audio(format!("Ambient background music for: {}", prompt))
                .with_model("music")
                .with_duration(10),
        );
    }

    requests
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestration::error::RemoteError;
    use crate::orchestration::registry::ModelRef;
    use crate::orchestration::types::Params;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// Records inputs and answers every prediction with fixed text
    #[derive(Default)]
    struct RecordingClient {
        calls: Mutex<Vec<(String, Params)>>,
    }

    #[async_trait]
    impl PredictionClient for RecordingClient {
        async fn run(&self, model: &ModelRef, input: &Params) -> Result<Value, RemoteError> {
            self.calls
                .lock()
                .unwrap()
                .push((model.to_string(), input.clone()));
            Ok(json!(["generated"]))
        }
    }

    fn orchestrator(client: Arc<RecordingClient>) -> (ContentOrchestrator, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = ContentOrchestrator::with_client(
            client,
            ModelRegistry::default(),
            ArtifactStore::new(dir.path()),
        );
        (orchestrator, dir)
    }

    #[test]
    fn test_new_requires_credential() {
        let result = ContentOrchestrator::new(ContentConfig::default());
        assert!(matches!(result, Err(OrchestratorError::MissingCredential)));
    }

    #[test]
    fn test_story_template() {
        let requests = story_requests("a robot learns to paint", true);
        let types: Vec<_> = requests.iter().map(|r| r.content_type).collect();
        assert_eq!(
            types,
            vec![ContentType::Text, ContentType::Image, ContentType::Video, ContentType::Audio]
        );
        assert!(requests[0].prompt.ends_with("a robot learns to paint"));
        assert_eq!(requests[2].additional_params.as_ref().unwrap()["num_frames"], 25);
        assert_eq!(requests[3].duration, Some(10));

        assert_eq!(story_requests("x", false).len(), 3);
    }

    #[tokio::test]
    async fn test_text_generation_resolves_default_model() {
        let client = Arc::new(RecordingClient::default());
        let (orchestrator, _dir) = orchestrator(client.clone());

        let result = orchestrator
            .generate_text(&ContentRequest::text("a limerick"))
            .await;

        assert!(result.is_completed(), "{:?}", result.error());
        assert_eq!(result.model(), Some("gpt"));
        assert!(
            result.metadata["model_id"]
                .as_str()
                .unwrap()
                .starts_with("meta/llama-2-70b-chat:")
        );

        let calls = client.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1["max_new_tokens"], 1000);
    }

    #[tokio::test]
    async fn test_unknown_model_key_fails_without_remote_call() {
        let client = Arc::new(RecordingClient::default());
        let (orchestrator, _dir) = orchestrator(client.clone());

        let result = orchestrator
            .generate_audio(&ContentRequest::audio("a jingle").with_model("musicgen"))
            .await;

        assert_eq!(result.status, crate::orchestration::types::ResultStatus::Failed);
        assert_eq!(result.content_type, ContentType::Audio);
        assert!(result.urls.is_empty());
        assert!(result.error().unwrap().contains("musicgen"));
        assert!(client.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_dimensions_fail_the_request() {
        let client = Arc::new(RecordingClient::default());
        let (orchestrator, _dir) = orchestrator(client);

        let result = orchestrator
            .generate_image(&ContentRequest::image("x").with_dimensions("1024by1024"))
            .await;

        assert!(!result.is_completed());
        assert!(result.error().unwrap().contains("1024by1024"));
        assert!(result.generation_time >= 0.0);
    }

    /// Echoes the prompt back without touching storage
    struct EchoGenerator;

    #[async_trait]
    impl Generator for EchoGenerator {
        fn content_type(&self) -> ContentType {
            ContentType::Text
        }

        fn build_input(&self, request: &ContentRequest, _model_key: &str) -> Result<Params, GenerationError> {
            let mut input = Params::new();
            input.insert("echo".to_string(), Value::String(request.prompt.clone()));
            Ok(input)
        }

        async fn collect(
            &self,
            _store: &ArtifactStore,
            _request: &ContentRequest,
            model_key: &str,
            input: &Params,
            _output: Value,
        ) -> Result<Produced, GenerationError> {
            let mut metadata = Params::new();
            metadata.insert("model".to_string(), Value::String(model_key.to_string()));
            metadata.insert("echo".to_string(), input["echo"].clone());
            Ok(Produced {
                urls: vec!["memory://echo".to_string()],
                metadata,
            })
        }
    }

    #[tokio::test]
    async fn test_registered_generator_replaces_default() {
        let client = Arc::new(RecordingClient::default());
        let (orchestrator, _dir) = orchestrator(client.clone());
        let orchestrator = orchestrator.with_generator(Arc::new(EchoGenerator));

        let result = orchestrator
            .generate(&ContentRequest::text("ping").with_model("claude"))
            .await;

        assert!(result.is_completed());
        assert_eq!(result.urls, vec!["memory://echo"]);
        assert_eq!(result.metadata["echo"], "ping");
        assert_eq!(result.model(), Some("claude"));
        assert_eq!(client.calls.lock().unwrap()[0].1["echo"], "ping");
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let (orchestrator, _dir) = orchestrator(Arc::new(RecordingClient::default()));
        assert!(orchestrator.generate_content_batch(&[]).await.is_empty());
    }

    #[tokio::test]
    async fn test_model_info() {
        let (orchestrator, dir) = orchestrator(Arc::new(RecordingClient::default()));
        let info = orchestrator.get_model_info();

        assert_eq!(info.supported_content_types, ContentType::ALL.to_vec());
        assert_eq!(info.default_models[&ContentType::Video], "stable-video");
        assert!(info.available_models[&ContentType::Image].contains_key("midjourney"));
        assert_eq!(info.output_directory, dir.path());

        let json = serde_json::to_value(&info).unwrap();
        assert!(json["available_models"]["audio"]["speech"].is_string());
    }
}
