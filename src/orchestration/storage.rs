// Artifact storage - downloads and writes generated content into the output directory

use super::error::{OrchestratorError, TransportError};
use super::types::{ContentType, StorySummary};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use futures_util::StreamExt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::io::AsyncWriteExt;

/// Append-only store for generated artifacts
pub struct ArtifactStore {
    output_dir: PathBuf,
    client: reqwest::Client,
    sequence: AtomicU64,
}

impl ArtifactStore {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self::with_client(output_dir, reqwest::Client::new())
    }

    pub fn with_client(output_dir: impl Into<PathBuf>, client: reqwest::Client) -> Self {
        Self {
            output_dir: output_dir.into(),
            client,
            sequence: AtomicU64::new(0),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Unique `<epoch-millis>_<seq>` stamp for filenames from this store
    fn stamp(&self) -> String {
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        format!("{}_{}", chrono::Utc::now().timestamp_millis(), seq)
    }

    /// Filename for an artifact, e.g. `image_1718000000000_3_0.png`
    pub fn artifact_filename(&self, content_type: ContentType, index: Option<usize>) -> String {
        let suffix = index.map(|i| format!("_{}", i)).unwrap_or_default();
        format!(
            "{}_{}{}.{}",
            content_type.as_str(),
            self.stamp(),
            suffix,
            content_type.extension()
        )
    }

    /// Write a generated text artifact
    pub async fn write_text(&self, text: &str) -> Result<PathBuf, TransportError> {
        tokio::fs::create_dir_all(&self.output_dir).await?;

        let path = self
            .output_dir
            .join(self.artifact_filename(ContentType::Text, None));
        tokio::fs::write(&path, text).await?;

        Ok(path)
    }

    /// Fetch `url` into `filename`; `data:` URIs are decoded in place
    pub async fn download(&self, url: &str, filename: &str) -> Result<PathBuf, TransportError> {
        tokio::fs::create_dir_all(&self.output_dir).await?;
        let path = self.output_dir.join(filename);

        let written = if url.starts_with("data:") {
            let bytes = decode_data_uri(url)?;
            tokio::fs::write(&path, bytes).await.map_err(TransportError::from)
        } else {
            self.stream_to(url, &path).await
        };

        if let Err(e) = written {
            tracing::error!("File download failed: {}", e);
            let _ = tokio::fs::remove_file(&path).await;
            return Err(e);
        }

        tracing::info!("Downloaded file: {}", path.display());
        Ok(path)
    }

    async fn stream_to(&self, url: &str, path: &Path) -> Result<(), TransportError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let mut file = tokio::fs::File::create(path).await?;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            file.write_all(&chunk?).await?;
        }
        file.flush().await?;

        Ok(())
    }

    /// Persist a story summary as pretty JSON
    pub async fn write_story_summary(
        &self,
        summary: &StorySummary,
    ) -> Result<PathBuf, OrchestratorError> {
        tokio::fs::create_dir_all(&self.output_dir).await?;

        let path = self
            .output_dir
            .join(format!("story_{}_metadata.json", self.stamp()));
        let json = serde_json::to_string_pretty(summary)?;
        tokio::fs::write(&path, json).await?;

        Ok(path)
    }
}

/// Decode `data:[<mime>][;base64],<payload>`
fn decode_data_uri(uri: &str) -> Result<Vec<u8>, TransportError> {
    let invalid = |reason: &str| {
        let head: String = uri.chars().take(48).collect();
        TransportError::InvalidDataUri(format!("{} ({})", reason, head))
    };

    let rest = uri.strip_prefix("data:").ok_or_else(|| invalid("missing scheme"))?;
    let (header, payload) = rest.split_once(',').ok_or_else(|| invalid("missing payload"))?;

    if header.ends_with(";base64") {
        STANDARD
            .decode(payload.trim())
            .map_err(|e| invalid(&e.to_string()))
    } else {
        Ok(payload.as_bytes().to_vec())
    }
}
