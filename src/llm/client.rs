use crate::advisory::{classify_status, AdvisoryError, AdvisoryService, ChatMessage};
use crate::llm::config::AdvisorConfig;
use crate::llm::types::*;
use log::{debug, info, warn};
use reqwest::Client;
use tokio::time::sleep;

impl From<reqwest::Error> for AdvisoryError {
    fn from(e: reqwest::Error) -> Self {
        // Request URLs never leave the client; error text is shown to users.
        let e = e.without_url();
        if e.is_timeout() || e.is_connect() || e.is_request() {
            AdvisoryError::Transport(e.to_string())
        } else {
            AdvisoryError::Unknown(e.to_string())
        }
    }
}

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    config: AdvisorConfig,
}

impl GeminiClient {
    pub fn new(config: AdvisorConfig) -> Result<Self, AdvisoryError> {
        let api_key = config.api_key()?.to_string();
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| AdvisoryError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            api_key,
            config,
        })
    }

    pub fn from_env() -> Result<Self, AdvisoryError> {
        Self::new(AdvisorConfig::from_env())
    }

    pub fn config(&self) -> &AdvisorConfig {
        &self.config
    }

    /// One-shot request with the payload as the only user turn.
    pub async fn analyze(&self, payload: &str) -> Result<String, AdvisoryError> {
        info!("Requesting narrative assessment from {}", self.config.model);
        self.generate(vec![Content::user(payload)]).await
    }

    /// Sends the whole transcript, in order, and returns the next assistant turn.
    pub async fn chat(&self, transcript: &[ChatMessage]) -> Result<String, AdvisoryError> {
        debug!("Sending chat transcript with {} messages", transcript.len());
        self.generate(transcript.iter().map(Content::from).collect())
            .await
    }

    async fn generate(&self, contents: Vec<Content>) -> Result<String, AdvisoryError> {
        let payload = GenerateContentRequest {
            contents,
            generation_config: self.config.temperature.map(|temperature| GenerationConfig {
                temperature: Some(temperature),
            }),
        };

        let mut attempt = 0;
        loop {
            match self.send(&payload).await {
                Ok(text) => return Ok(text),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    let backoff = self.config.retry_backoff(attempt);
                    warn!(
                        "Gemini request failed (attempt {}), retrying in {:?}: {}",
                        attempt + 1,
                        backoff,
                        e
                    );
                    sleep(backoff).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn send(&self, payload: &GenerateContentRequest) -> Result<String, AdvisoryError> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.config.base_url, self.config.model
        );

        let res = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(payload)
            .send()
            .await?;
        let status = res.status();

        if !status.is_success() {
            let err_text = res.text().await.unwrap_or_default();
            return Err(classify_status(status.as_u16(), &err_text));
        }

        let body: GenerateContentResponse = res.json().await.map_err(|e| {
            AdvisoryError::Unknown(format!("Could not decode Gemini response: {}", e))
        })?;

        body.into_text()
    }
}

impl AdvisoryService for GeminiClient {
    async fn assess(&self, payload: &str) -> Result<String, AdvisoryError> {
        self.analyze(payload).await
    }

    async fn chat(&self, transcript: &[ChatMessage]) -> Result<String, AdvisoryError> {
        GeminiClient::chat(self, transcript).await
    }
}
