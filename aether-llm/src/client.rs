//! LLM Client — unified interface for Ollama and OpenAI-compatible backends.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use rand::Rng;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::error::GenerationError;
use crate::types::{GenerationRequest, GenerationResponse};

/// Anything that can turn a prompt into NPC text.
///
/// The orchestrator holds one of these behind an `Arc<dyn Generator>`; tests
/// plug in scripted implementations.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generate raw response text for `request`.
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError>;
}

/// Provider backend for LLM inference.
#[derive(Debug, Clone)]
pub enum LlmProvider {
    /// Ollama running locally (recommended).
    Ollama { base_url: String },
    /// OpenAI-compatible API.
    OpenAiCompatible { base_url: String, api_key: String },
    /// No LLM available — all calls fail, triggering fallback responses.
    None,
}

impl LlmProvider {
    /// Resolve a provider from its config name.
    ///
    /// # Errors
    /// `Auth` if `openai` is chosen without a key, `Transport` for an unknown name.
    pub fn from_name(
        name: &str,
        base_url: &str,
        api_key: Option<String>,
    ) -> Result<Self, GenerationError> {
        let base_url = base_url.trim_end_matches('/').to_string();
        match name {
            "ollama" => Ok(Self::Ollama { base_url }),
            "openai" => match api_key {
                Some(api_key) if !api_key.is_empty() => Ok(Self::OpenAiCompatible { base_url, api_key }),
                _ => Err(GenerationError::Auth("no API key configured for openai provider".into())),
            },
            "none" => Ok(Self::None),
            other => Err(GenerationError::Transport(format!("unknown provider '{other}'"))),
        }
    }
}

/// The main LLM client that routes requests to the configured backend.
pub struct LlmClient {
    provider: LlmProvider,
    http: Client,
    model: String,
    max_retries: u32,
    retry_backoff: Duration,
}

impl LlmClient {
    /// Create a new LLM client.
    #[must_use]
    pub fn new(provider: LlmProvider, model: impl Into<String>, max_retries: u32) -> Self {
        Self {
            provider,
            http: Client::new(),
            model: model.into(),
            max_retries,
            retry_backoff: Duration::from_millis(500),
        }
    }

    /// Create a client with no LLM backend (all calls fail → fallback lines).
    #[must_use]
    pub fn none() -> Self {
        Self::new(LlmProvider::None, String::new(), 0)
    }

    /// Set the base delay between retries. Doubled on every further attempt.
    #[must_use]
    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    /// Check if the client has a backend configured.
    #[must_use]
    pub fn is_available(&self) -> bool {
        !matches!(self.provider, LlmProvider::None)
    }

    /// Generate a response, retrying transient failures.
    ///
    /// # Errors
    /// The classified error of the last attempt.
    pub async fn complete(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResponse, GenerationError> {
        match &self.provider {
            LlmProvider::None => Err(GenerationError::Transport(
                "no LLM provider configured".into(),
            )),
            LlmProvider::Ollama { base_url } => {
                let url = format!("{base_url}/api/generate");
                let body = json!({
                    "model": self.model,
                    "prompt": request.prompt(),
                    "stream": false,
                    "options": {
                        "temperature": request.temperature,
                        "num_predict": request.max_tokens,
                    }
                });
                self.send_with_retry(&url, &body, None, request, |json| {
                    let text = json["response"].as_str()?.to_string();
                    let tokens = json["eval_count"].as_u64().unwrap_or(0);
                    Some((text, tokens))
                })
                .await
            }
            LlmProvider::OpenAiCompatible { base_url, api_key } => {
                let url = format!("{base_url}/v1/chat/completions");
                let body = json!({
                    "model": self.model,
                    "messages": [
                        { "role": "system", "content": request.system },
                        { "role": "user", "content": request.user },
                    ],
                    "max_tokens": request.max_tokens,
                    "temperature": request.temperature,
                });
                self.send_with_retry(&url, &body, Some(api_key), request, |json| {
                    let text = json["choices"][0]["message"]["content"].as_str()?.to_string();
                    let tokens = json["usage"]["completion_tokens"].as_u64().unwrap_or(0);
                    Some((text, tokens))
                })
                .await
            }
        }
    }

    async fn send_with_retry(
        &self,
        url: &str,
        body: &Value,
        api_key: Option<&str>,
        request: &GenerationRequest,
        extract: fn(&Value) -> Option<(String, u64)>,
    ) -> Result<GenerationResponse, GenerationError> {
        let mut attempt = 0;
        loop {
            match self.send_once(url, body, api_key, request, extract).await {
                Ok(response) => return Ok(response),
                Err(err) if err.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    let delay = match &err {
                        GenerationError::RateLimit { retry_after_ms: Some(ms), .. } => {
                            Duration::from_millis(*ms)
                        }
                        _ => backoff_delay(self.retry_backoff, attempt),
                    };
                    debug!(
                        attempt = attempt + 1,
                        max_attempts = self.max_retries + 1,
                        delay_ms = delay.as_millis() as u64,
                        %err,
                        "retrying LLM call"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn send_once(
        &self,
        url: &str,
        body: &Value,
        api_key: Option<&str>,
        request: &GenerationRequest,
        extract: fn(&Value) -> Option<(String, u64)>,
    ) -> Result<GenerationResponse, GenerationError> {
        let start = Instant::now();
        let mut builder = self
            .http
            .post(url)
            .json(body)
            .timeout(Duration::from_millis(request.timeout_ms));
        if let Some(key) = api_key {
            builder = builder.bearer_auth(key);
        }

        let resp = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                warn!(url, timeout_ms = request.timeout_ms, "LLM request timed out");
                GenerationError::Timeout(request.timeout_ms)
            } else {
                warn!(url, error = %e, "LLM request failed");
                GenerationError::from(e)
            }
        })?;

        let status = resp.status();
        if !status.is_success() {
            let retry_after = parse_retry_after(resp.headers());
            let body = resp.text().await.unwrap_or_default();
            let err = classify_status(status, retry_after, &body);
            warn!(url, %status, %err, "LLM provider returned error");
            return Err(err);
        }

        let json: Value = resp
            .json()
            .await
            .map_err(|e| GenerationError::Transport(format!("invalid JSON body: {e}")))?;
        let (text, tokens) = extract(&json).ok_or_else(|| {
            GenerationError::Transport("response body has no generated text".into())
        })?;

        Ok(GenerationResponse {
            text,
            tokens_generated: u32::try_from(tokens).unwrap_or(u32::MAX),
            latency_ms: u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            model: self.model.clone(),
        })
    }
}

#[async_trait]
impl Generator for LlmClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        self.complete(request).await.map(|response| response.text)
    }
}

/// Map a non-success HTTP status to a generation error.
#[must_use]
pub fn classify_status(
    status: StatusCode,
    retry_after_ms: Option<u64>,
    body: &str,
) -> GenerationError {
    let message = if body.trim().is_empty() {
        format!("HTTP {status}")
    } else {
        format!("HTTP {status}: {}", body.trim())
    };
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => GenerationError::Auth(message),
        StatusCode::TOO_MANY_REQUESTS => GenerationError::RateLimit {
            retry_after_ms,
            message,
        },
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => GenerationError::Timeout(0),
        _ => GenerationError::Transport(message),
    }
}

/// Longest wait between two attempts.
const MAX_BACKOFF: Duration = Duration::from_secs(10);

/// Exponential backoff for the given retry (1-based), capped at
/// [`MAX_BACKOFF`], with ±20% jitter so parallel players do not retry in step.
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let exponential = base.saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)));
    let capped = exponential.min(MAX_BACKOFF);
    capped.mul_f64(rand::thread_rng().gen_range(0.8..=1.2))
}

/// Read a `Retry-After` header given in seconds.
fn parse_retry_after(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
        .map(|secs| (secs * 1000.0) as u64)
}
