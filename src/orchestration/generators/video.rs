// Video generator - short clips from video diffusion models

use super::{Generator, Produced, Tuning, download_artifacts, into_params, styled_prompt};
use crate::orchestration::error::GenerationError;
use crate::orchestration::storage::ArtifactStore;
use crate::orchestration::types::{ContentRequest, ContentType, Dimensions, Params};
use async_trait::async_trait;
use serde_json::{Value, json};

pub const DEFAULT_DIMENSIONS: Dimensions = Dimensions::new(1024, 576);
pub const DEFAULT_NUM_FRAMES: u64 = 14;
pub const DEFAULT_FPS: u64 = 6;
pub const DEFAULT_MOTION_BUCKET_ID: u64 = 127;
pub const DEFAULT_NOISE_AUG_STRENGTH: f64 = 0.1;

pub struct VideoGenerator;

#[async_trait]
impl Generator for VideoGenerator {
    fn content_type(&self) -> ContentType {
        ContentType::Video
    }

    fn build_input(&self, request: &ContentRequest, _model_key: &str) -> Result<Params, GenerationError> {
        let tuning = Tuning::of(request);
        let dimensions = request.parsed_dimensions()?.unwrap_or(DEFAULT_DIMENSIONS);

        Ok(into_params(json!({
            "prompt": styled_prompt(request),
            "num_frames": tuning.integer("num_frames", DEFAULT_NUM_FRAMES)?,
            "width": dimensions.width,
            "height": dimensions.height,
            "fps": tuning.integer("fps", DEFAULT_FPS)?,
            "motion_bucket_id": tuning.integer("motion_bucket_id", DEFAULT_MOTION_BUCKET_ID)?,
            "noise_aug_strength": tuning.float("noise_aug_strength", DEFAULT_NOISE_AUG_STRENGTH)?,
        })))
    }

    async fn collect(
        &self,
        store: &ArtifactStore,
        request: &ContentRequest,
        model_key: &str,
        input: &Params,
        output: Value,
    ) -> Result<Produced, GenerationError> {
        let urls = download_artifacts(store, ContentType::Video, &output).await?;
        let dimensions = request.parsed_dimensions()?.unwrap_or(DEFAULT_DIMENSIONS);

        Ok(Produced {
            urls,
            metadata: into_params(json!({
                "model": model_key,
                "dimensions": dimensions.to_string(),
                "style": request.style,
                "duration": request.duration,
                "fps": input.get("fps").cloned().unwrap_or(Value::Null),
            })),
        })
    }
}
