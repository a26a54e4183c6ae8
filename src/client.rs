//! Background removal: the remove.bg client and its local fallback
//!
//! [`RemoveBgClient`] posts the image to the remote service. Without a usable
//! API key it quietly uses [`MockRemover`], which returns the input unchanged
//! after a short delay. When a live call fails, the user is asked once whether
//! to continue in mock mode; declining returns the original failure.

use crate::{
    config::CutoutConfig,
    error::{CutoutError, RemovalError, Result},
    prompt::Prompter,
    tracing_config::spans,
    types::ImageRepresentation,
};
use async_trait::async_trait;
use reqwest::{
    header::CONTENT_TYPE,
    multipart::{Form, Part},
    Client,
};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn, Instrument};

/// MIME type assumed for a successful response without `Content-Type`
const DEFAULT_RESULT_MIME: &str = "image/png";

/// Anything that can turn an image into its background-free version
#[async_trait]
pub trait BackgroundRemover: Send + Sync {
    /// Remove the background from `image`
    ///
    /// # Errors
    /// - `RemovalError` if no result could be produced
    async fn remove_background(
        &self,
        image: &ImageRepresentation,
    ) -> std::result::Result<ImageRepresentation, RemovalError>;

    /// Short name for logs
    fn name(&self) -> &'static str;
}

/// Stand-in remover: waits, then hands back the input unchanged
#[derive(Debug, Clone, Copy)]
pub struct MockRemover {
    delay: Duration,
}

impl MockRemover {
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }
}

#[async_trait]
impl BackgroundRemover for MockRemover {
    async fn remove_background(
        &self,
        image: &ImageRepresentation,
    ) -> std::result::Result<ImageRepresentation, RemovalError> {
        info!(delay_ms = self.delay.as_millis() as u64, "Using mock background removal");
        tokio::time::sleep(self.delay).await;
        Ok(image.clone())
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

/// Error body returned by remove.bg on failure
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    errors: Vec<ApiErrorEntry>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEntry {
    title: Option<String>,
}

impl ApiErrorBody {
    fn first_title(self) -> Option<String> {
        self.errors
            .into_iter()
            .next()
            .and_then(|entry| entry.title)
            .filter(|title| !title.is_empty())
    }
}

/// Client for the remove.bg HTTP API with a user-mediated fallback
pub struct RemoveBgClient {
    http: Client,
    config: CutoutConfig,
    mock: MockRemover,
    prompter: Arc<dyn Prompter>,
}

impl std::fmt::Debug for RemoveBgClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoveBgClient")
            .field("config", &self.config)
            .field("mock", &self.mock)
            .finish_non_exhaustive()
    }
}

impl RemoveBgClient {
    /// Create a client
    ///
    /// # Errors
    /// - Invalid configuration
    /// - Failed to create HTTP client
    pub fn new(config: CutoutConfig, prompter: Arc<dyn Prompter>) -> Result<Self> {
        config.validate()?;

        let http = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| CutoutError::invalid_config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            http,
            mock: MockRemover::new(config.mock_delay()),
            config,
            prompter,
        })
    }

    #[must_use]
    pub fn config(&self) -> &CutoutConfig {
        &self.config
    }

    /// Whether calls will go to the remote service
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.config.credential().is_some()
    }

    /// One POST to the removal endpoint, no fallback
    async fn call_api(
        &self,
        api_key: &str,
        image: &ImageRepresentation,
    ) -> std::result::Result<ImageRepresentation, RemovalError> {
        let part = Part::bytes(image.bytes().to_vec())
            .file_name(format!("image.{}", image.extension()))
            .mime_str(image.mime())?;
        let form = Form::new()
            .part("image_file", part)
            .text("size", self.config.size_hint.clone());

        let response = self
            .http
            .post(&self.config.endpoint)
            .header("X-Api-Key", api_key)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ApiErrorBody>()
                .await
                .ok()
                .and_then(ApiErrorBody::first_title)
                .unwrap_or_else(|| format!("API Error: {}", status.as_u16()));
            return Err(RemovalError::service(status.as_u16(), message));
        }

        let mime = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.split(';').next().unwrap_or(value).trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_RESULT_MIME.to_string());
        let data = response.bytes().await?;

        info!(bytes = data.len(), %mime, "Background removed by remote service");
        Ok(ImageRepresentation::new(mime, data))
    }
}

#[async_trait]
impl BackgroundRemover for RemoveBgClient {
    async fn remove_background(
        &self,
        image: &ImageRepresentation,
    ) -> std::result::Result<ImageRepresentation, RemovalError> {
        let Some(api_key) = self.config.credential() else {
            warn!("No API key configured, using mock mode");
            return self.mock.remove_background(image).await;
        };

        let span = spans::removal(&self.config.endpoint, image.len());
        let err = match self.call_api(api_key, image).instrument(span).await {
            Ok(processed) => return Ok(processed),
            Err(e) => e,
        };

        error!(error = %err, status = ?err.status(), "Background removal failed");

        if self.prompter.confirm_fallback(&err.to_string()).await {
            info!("User accepted mock fallback");
            self.mock.remove_background(image).await
        } else {
            info!("User declined mock fallback");
            Err(err)
        }
    }

    fn name(&self) -> &'static str {
        "remove.bg"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::ScriptedPrompter;

    fn sample() -> ImageRepresentation {
        ImageRepresentation::new("image/jpeg", b"jpeg-bytes".to_vec())
    }

    #[tokio::test(start_paused = true)]
    async fn test_mock_returns_input_after_delay() {
        let mock = MockRemover::new(Duration::from_millis(1500));
        let start = tokio::time::Instant::now();

        let result = mock.remove_background(&sample()).await.unwrap();

        assert_eq!(result, sample());
        assert!(start.elapsed() >= Duration::from_millis(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_key_uses_mock_without_prompting() {
        let prompter = Arc::new(ScriptedPrompter::answering(false));
        let client = RemoveBgClient::new(CutoutConfig::default(), prompter.clone()).unwrap();
        assert!(!client.is_live());

        let result = client.remove_background(&sample()).await.unwrap();

        assert_eq!(result, sample());
        assert!(prompter.questions().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unusable_keys_use_mock() {
        for key in [crate::config::API_KEY_PLACEHOLDER, "", "   "] {
            let config = CutoutConfig::builder()
                .api_key(key)
                .endpoint("http://127.0.0.1:9/never-called")
                .build()
                .unwrap();
            let prompter = Arc::new(ScriptedPrompter::answering(false));
            let client = RemoveBgClient::new(config, prompter.clone()).unwrap();
            assert!(!client.is_live());

            assert_eq!(client.remove_background(&sample()).await.unwrap(), sample());
            assert!(prompter.questions().is_empty());
        }
    }

    #[test]
    fn test_error_body_title_extraction() {
        let body: ApiErrorBody =
            serde_json::from_str(r#"{"errors":[{"title":"Invalid image"},{"title":"second"}]}"#)
                .unwrap();
        assert_eq!(body.first_title().as_deref(), Some("Invalid image"));

        let body: ApiErrorBody = serde_json::from_str(r#"{"errors":[]}"#).unwrap();
        assert!(body.first_title().is_none());

        let body: ApiErrorBody = serde_json::from_str(r#"{"errors":[{"title":""}]}"#).unwrap();
        assert!(body.first_title().is_none());

        let body: ApiErrorBody = serde_json::from_str("{}").unwrap();
        assert!(body.first_title().is_none());
    }
}
