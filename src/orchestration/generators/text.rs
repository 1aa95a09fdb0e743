// Text generator - prose from hosted language models

use super::{Generator, Produced, Tuning, into_params};
use crate::orchestration::error::GenerationError;
use crate::orchestration::storage::ArtifactStore;
use crate::orchestration::types::{ContentRequest, ContentType, Params};
use async_trait::async_trait;
use serde_json::{Value, json};

pub const DEFAULT_MAX_TOKENS: u64 = 1000;
pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_TOP_P: f64 = 0.95;

pub struct TextGenerator;

impl TextGenerator {
    /// Language models stream tokens back as a list of fragments
    fn join_output(output: Value) -> Result<String, GenerationError> {
        match output {
            Value::String(text) => Ok(text),
            Value::Array(parts) => parts
                .into_iter()
                .map(|part| match part {
                    Value::String(s) => Ok(s),
                    other => Err(GenerationError::UnexpectedOutput(format!(
                        "non-text fragment {}",
                        other
                    ))),
                })
                .collect(),
            other => Err(GenerationError::UnexpectedOutput(other.to_string())),
        }
    }
}

#[async_trait]
impl Generator for TextGenerator {
    fn content_type(&self) -> ContentType {
        ContentType::Text
    }

    fn build_input(&self, request: &ContentRequest, _model_key: &str) -> Result<Params, GenerationError> {
        let tuning = Tuning::of(request);

        let mut input = into_params(json!({
            "prompt": request.prompt,
            "max_new_tokens": tuning.integer("max_tokens", DEFAULT_MAX_TOKENS)?,
            "temperature": tuning.float("temperature", DEFAULT_TEMPERATURE)?,
            "top_p": tuning.float("top_p", DEFAULT_TOP_P)?,
        }));

        if let Some(style) = &request.style {
            input.insert(
                "system_prompt".to_string(),
                Value::String(format!("You are a {} writer. Write in that style.", style)),
            );
        }

        Ok(input)
    }

    async fn collect(
        &self,
        store: &ArtifactStore,
        request: &ContentRequest,
        model_key: &str,
        _input: &Params,
        output: Value,
    ) -> Result<Produced, GenerationError> {
        let text = Self::join_output(output)?;
        let path = store.write_text(&text).await?;

        Ok(Produced {
            urls: vec![path.display().to_string()],
            metadata: into_params(json!({
                "model": model_key,
                "length": text.chars().count(),
                "style": request.style,
            })),
        })
    }
}
