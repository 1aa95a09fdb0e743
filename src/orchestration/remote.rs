// Remote predictions client - submits a job and polls it to a terminal state

use super::config::ContentConfig;
use super::error::{OrchestratorError, RemoteError};
use super::registry::ModelRef;
use super::types::Params;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Runs a model to completion and returns its output
#[async_trait]
pub trait PredictionClient: Send + Sync {
    async fn run(&self, model: &ModelRef, input: &Params) -> Result<Value, RemoteError>;
}

/// Client for Replicate-compatible prediction APIs
pub struct ReplicateClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
    poll_interval: Duration,
}

impl ReplicateClient {
    pub fn new(token: impl Into<String>) -> Self {
        let config = ContentConfig::default();
        let poll_interval = config.poll_interval();
        Self {
            client: reqwest::Client::new(),
            base_url: config.api_base,
            token: token.into(),
            poll_interval,
        }
    }

    /// Build a client from configuration; fails without a token
    pub fn from_config(config: &ContentConfig) -> Result<Self, OrchestratorError> {
        let token = config.api_token()?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: config.api_base.trim_end_matches('/').to_string(),
            token: token.to_string(),
            poll_interval: config.poll_interval(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Create a prediction
    async fn submit(&self, model: &ModelRef, input: &Params) -> Result<Prediction, RemoteError> {
        let request = match &model.version {
            Some(version) => self
                .client
                .post(format!("{}/v1/predictions", self.base_url))
                .json(&CreatePrediction {
                    version: Some(version.as_str()),
                    input,
                }),
            None => self
                .client
                .post(format!(
                    "{}/v1/models/{}/{}/predictions",
                    self.base_url, model.owner, model.name
                ))
                .json(&CreatePrediction {
                    version: None,
                    input,
                }),
        };

        let response = request.bearer_auth(&self.token).send().await?;
        Self::decode(response).await
    }

    /// Fetch the current state of a prediction
    async fn fetch(&self, id: &str) -> Result<Prediction, RemoteError> {
        let response = self
            .client
            .get(format!("{}/v1/predictions/{}", self.base_url, id))
            .bearer_auth(&self.token)
            .send()
            .await?;

        Self::decode(response).await
    }

    /// Poll until the prediction reaches a terminal state
    async fn wait(&self, mut prediction: Prediction) -> Result<Prediction, RemoteError> {
        while !prediction.status.is_terminal() {
            tracing::debug!("Prediction {} is {:?}", prediction.id, prediction.status);
            tokio::time::sleep(self.poll_interval).await;
            prediction = self.fetch(&prediction.id).await?;
        }
        Ok(prediction)
    }

    async fn decode(response: reqwest::Response) -> Result<Prediction, RemoteError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| RemoteError::Decode(e.to_string()))
    }
}

#[async_trait]
impl PredictionClient for ReplicateClient {
    async fn run(&self, model: &ModelRef, input: &Params) -> Result<Value, RemoteError> {
        let prediction = self.submit(model, input).await?;
        tracing::debug!("Submitted prediction {} for {}", prediction.id, model);

        let prediction = self.wait(prediction).await?;

        match prediction.status {
            PredictionStatus::Succeeded => Ok(prediction.output),
            status => Err(RemoteError::PredictionFailed {
                status: status.as_str().to_string(),
                message: prediction
                    .error
                    .map(|e| match e {
                        Value::String(s) => s,
                        other => other.to_string(),
                    })
                    .unwrap_or_else(|| "no error reported".to_string()),
            }),
        }
    }
}

#[derive(Serialize)]
struct CreatePrediction<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<&'a str>,
    input: &'a Params,
}

#[derive(Debug, Deserialize)]
struct Prediction {
    id: String,
    status: PredictionStatus,
    #[serde(default)]
    output: Value,
    #[serde(default)]
    error: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum PredictionStatus {
    Starting,
    Processing,
    Succeeded,
    Failed,
    Canceled,
    Aborted,
    #[serde(other)]
    Unknown,
}

impl PredictionStatus {
    fn is_terminal(&self) -> bool {
        matches!(
            self,
            PredictionStatus::Succeeded
                | PredictionStatus::Failed
                | PredictionStatus::Canceled
                | PredictionStatus::Aborted
        )
    }

    fn as_str(&self) -> &'static str {
        match self {
            PredictionStatus::Starting => "starting",
            PredictionStatus::Processing => "processing",
            PredictionStatus::Succeeded => "succeeded",
            PredictionStatus::Failed => "failed",
            PredictionStatus::Canceled => "canceled",
            PredictionStatus::Aborted => "aborted",
            PredictionStatus::Unknown => "unknown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> ReplicateClient {
        ReplicateClient::new("r8_test")
            .with_base_url(server.uri())
            .with_poll_interval(Duration::from_millis(5))
    }

    fn input() -> Params {
        json!({"prompt": "a lighthouse"}).as_object().cloned().unwrap()
    }

    #[test]
    fn test_new_uses_default_endpoint() {
        let client = ReplicateClient::new("r8_test");
        assert_eq!(client.base_url, "https://api.replicate.com");
        assert_eq!(client.token, "r8_test");
        assert_eq!(client.poll_interval, Duration::from_millis(1000));
    }

    #[test]
    fn test_from_config_requires_token() {
        let result = ReplicateClient::from_config(&ContentConfig::default());
        assert!(matches!(result, Err(OrchestratorError::MissingCredential)));
    }

    #[test]
    fn test_unknown_status_is_not_terminal() {
        let status: PredictionStatus = serde_json::from_str("\"queued\"").unwrap();
        assert_eq!(status, PredictionStatus::Unknown);
        assert!(!status.is_terminal());
    }

    #[tokio::test]
    async fn test_versioned_model_polls_until_success() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/predictions"))
            .and(header("authorization", "Bearer r8_test"))
            .and(body_partial_json(json!({"version": "abc", "input": {"prompt": "a lighthouse"}})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": "p1", "status": "starting"
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/v1/predictions/p1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "p1", "status": "processing"
            })))
            .up_to_n_times(2)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/v1/predictions/p1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "p1", "status": "succeeded", "output": ["https://cdn.example/out.png"]
            })))
            .mount(&server)
            .await;

        let model: ModelRef = "stability-ai/sdxl:abc".parse().unwrap();
        let output = client(&server).run(&model, &input()).await.unwrap();

        assert_eq!(output, json!(["https://cdn.example/out.png"]));
    }

    #[tokio::test]
    async fn test_unversioned_model_uses_model_endpoint() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/models/lucataco/animate-diff/predictions"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": "p2", "status": "succeeded", "output": "https://cdn.example/clip.mp4"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let model: ModelRef = "lucataco/animate-diff".parse().unwrap();
        let output = client(&server).run(&model, &input()).await.unwrap();

        assert_eq!(output, json!("https://cdn.example/clip.mp4"));
    }

    #[tokio::test]
    async fn test_failed_prediction_carries_status_and_message() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/predictions"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": "p3", "status": "starting"
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/v1/predictions/p3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "p3", "status": "failed", "error": "CUDA out of memory"
            })))
            .mount(&server)
            .await;

        let model: ModelRef = "owner/model:v1".parse().unwrap();
        let err = client(&server).run(&model, &input()).await.unwrap_err();

        match &err {
            RemoteError::PredictionFailed { status, message } => {
                assert_eq!(status, "failed");
                assert_eq!(message, "CUDA out of memory");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().contains("failed"));
    }

    #[tokio::test]
    async fn test_api_error_status() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/predictions"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Unauthenticated"))
            .mount(&server)
            .await;

        let model: ModelRef = "owner/model:v1".parse().unwrap();
        let err = client(&server).run(&model, &input()).await.unwrap_err();

        assert!(matches!(err, RemoteError::Api { status: 401, .. }));
        assert!(err.to_string().contains("Unauthenticated"));
    }

    #[tokio::test]
    async fn test_undecodable_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/predictions"))
            .respond_with(ResponseTemplate::new(201).set_body_string("<html>"))
            .mount(&server)
            .await;

        let model: ModelRef = "owner/model:v1".parse().unwrap();
        let err = client(&server).run(&model, &input()).await.unwrap_err();

        assert!(matches!(err, RemoteError::Decode(_)));
    }
}
