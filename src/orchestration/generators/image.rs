// Image generator - stills from diffusion models

use super::{Generator, Produced, Tuning, download_artifacts, into_params, styled_prompt};
use crate::orchestration::error::GenerationError;
use crate::orchestration::storage::ArtifactStore;
use crate::orchestration::types::{ContentRequest, ContentType, Dimensions, Params};
use async_trait::async_trait;
use serde_json::{Value, json};

pub const DEFAULT_DIMENSIONS: Dimensions = Dimensions::new(1024, 1024);
pub const DEFAULT_STEPS: u64 = 50;
pub const DEFAULT_GUIDANCE_SCALE: f64 = 7.5;
pub const DEFAULT_NUM_OUTPUTS: u64 = 1;

pub struct ImageGenerator;

#[async_trait]
impl Generator for ImageGenerator {
    fn content_type(&self) -> ContentType {
        ContentType::Image
    }

    fn build_input(&self, request: &ContentRequest, _model_key: &str) -> Result<Params, GenerationError> {
        let tuning = Tuning::of(request);
        let dimensions = request.parsed_dimensions()?.unwrap_or(DEFAULT_DIMENSIONS);

        Ok(into_params(json!({
            "prompt": styled_prompt(request),
            "negative_prompt": tuning.string("negative_prompt", "")?,
            "width": dimensions.width,
            "height": dimensions.height,
            "num_inference_steps": tuning.integer("steps", DEFAULT_STEPS)?,
            "guidance_scale": tuning.float("guidance_scale", DEFAULT_GUIDANCE_SCALE)?,
            "num_outputs": tuning.integer("num_outputs", DEFAULT_NUM_OUTPUTS)?,
        })))
    }

    async fn collect(
        &self,
        store: &ArtifactStore,
        request: &ContentRequest,
        model_key: &str,
        _input: &Params,
        output: Value,
    ) -> Result<Produced, GenerationError> {
        let urls = download_artifacts(store, ContentType::Image, &output).await?;
        let dimensions = request.parsed_dimensions()?.unwrap_or(DEFAULT_DIMENSIONS);

        Ok(Produced {
            metadata: into_params(json!({
                "model": model_key,
                "dimensions": dimensions.to_string(),
                "style": request.style,
                "num_images": urls.len(),
            })),
            urls,
        })
    }
}
