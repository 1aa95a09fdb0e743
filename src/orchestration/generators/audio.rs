// Audio generator - music, speech and sound effects
//
// Input shape depends on the model key: music models take a pair of prompts to
// interpolate between, speech models take text plus a voice, everything else
// takes a prompt and a duration.

use super::{Generator, Produced, Tuning, download_artifacts, into_params, styled_prompt};
use crate::orchestration::error::GenerationError;
use crate::orchestration::storage::ArtifactStore;
use crate::orchestration::types::{ContentRequest, ContentType, Params};
use async_trait::async_trait;
use serde_json::{Value, json};

pub const DEFAULT_DENOISING: f64 = 0.75;
pub const DEFAULT_STEPS: u64 = 50;
pub const DEFAULT_LANGUAGE: &str = "eng";
pub const DEFAULT_SPEAKER: &str = "default";
pub const DEFAULT_DURATION_SECS: u32 = 5;

pub struct AudioGenerator;

#[async_trait]
impl Generator for AudioGenerator {
    fn content_type(&self) -> ContentType {
        ContentType::Audio
    }

    fn build_input(&self, request: &ContentRequest, model_key: &str) -> Result<Params, GenerationError> {
        let tuning = Tuning::of(request);

        let input = match model_key {
            "music" => {
                let prompt = styled_prompt(request);
                json!({
                    "prompt_a": prompt,
                    "prompt_b": tuning.string("prompt_b", &prompt)?,
                    "denoising": tuning.float("denoising", DEFAULT_DENOISING)?,
                    "num_inference_steps": tuning.integer("steps", DEFAULT_STEPS)?,
                })
            }
            "speech" => json!({
                "text": request.prompt,
                "language": tuning.string("language", DEFAULT_LANGUAGE)?,
                "speaker": tuning.string("speaker", DEFAULT_SPEAKER)?,
            }),
            _ => json!({
                "prompt": styled_prompt(request),
                "duration": request.duration.unwrap_or(DEFAULT_DURATION_SECS),
            }),
        };

        Ok(into_params(input))
    }

    async fn collect(
        &self,
        store: &ArtifactStore,
        request: &ContentRequest,
        model_key: &str,
        _input: &Params,
        output: Value,
    ) -> Result<Produced, GenerationError> {
        let urls = download_artifacts(store, ContentType::Audio, &output).await?;

        Ok(Produced {
            urls,
            metadata: into_params(json!({
                "model": model_key,
                "duration": request.duration,
                "style": request.style,
            })),
        })
    }
}
