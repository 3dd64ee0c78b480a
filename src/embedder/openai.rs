// openai.rs
use crate::embedder::{EmbedError, Embedder};
use rand::Rng;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

const MAX_BACKOFF_SECS: u64 = 16;
const JITTER_MAX_MILLIS: u64 = 500;

/// Blocking client for OpenAI-compatible `/embeddings` endpoints.
pub struct OpenAiEmbedder {
    client: Client,
    endpoint: String,
    model: String,
    dimensions: Option<usize>,
    max_attempts: usize,
    batch_size: usize,
}

impl OpenAiEmbedder {
    pub fn new(
        api_key: &str,
        base_url: &str,
        model: String,
        dimensions: Option<usize>,
        timeout: Duration,
        max_attempts: usize,
        batch_size: usize,
    ) -> Result<Self, EmbedError> {
        if api_key.trim().is_empty() {
            return Err(EmbedError::Config("missing API key".into()));
        }
        if model.trim().is_empty() {
            return Err(EmbedError::Config("missing model name".into()));
        }

        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Bearer {}", api_key.trim()))
            .map_err(|e| EmbedError::Config(format!("invalid API key: {e}")))?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| EmbedError::Network(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: format!("{}/embeddings", base_url.trim_end_matches('/')),
            model,
            dimensions,
            max_attempts: max_attempts.max(1),
            batch_size: batch_size.max(1),
        })
    }

    fn try_embed(&self, inputs: &[&str]) -> Result<Vec<Vec<f32>>, Attempt> {
        let request = EmbeddingRequest {
            model: &self.model,
            input: inputs,
            dimensions: self.dimensions,
        };

        let resp = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .map_err(|e| {
                let retry = e.is_timeout() || e.is_connect() || e.is_request() || e.is_body();
                Attempt::fail(EmbedError::Network(e.to_string()), retry)
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp
                .text()
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            let retry = status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error();
            return Err(Attempt::fail(
                EmbedError::Status {
                    status: status.as_u16(),
                    body,
                },
                retry,
            ));
        }

        let mut parsed: EmbeddingResponse = resp
            .json()
            .map_err(|e| Attempt::fail(EmbedError::Decode(e.to_string()), false))?;
        parsed.data.sort_by_key(|entry| entry.index);

        if parsed.data.len() != inputs.len() {
            return Err(Attempt::fail(
                EmbedError::UnexpectedShape(format!(
                    "{} embeddings for {} inputs",
                    parsed.data.len(),
                    inputs.len()
                )),
                false,
            ));
        }

        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }

    fn backoff(attempt: usize) -> Duration {
        let base = (1u64 << attempt.min(4)).min(MAX_BACKOFF_SECS);
        let jitter = rand::thread_rng().gen_range(0..=JITTER_MAX_MILLIS);
        Duration::from_secs(base) + Duration::from_millis(jitter)
    }
}

impl Embedder for OpenAiEmbedder {
    fn model_id(&self) -> &str {
        &self.model
    }

    fn batch_size(&self) -> usize {
        self.batch_size
    }

    fn embed_batch(&self, inputs: &[&str]) -> Result<Vec<Vec<f32>>, EmbedError> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }
        if inputs.len() > self.batch_size {
            return Err(EmbedError::Config(format!(
                "batch of {} exceeds configured max {}",
                inputs.len(),
                self.batch_size
            )));
        }

        let mut attempt = 1;
        loop {
            match self.try_embed(inputs) {
                Ok(vectors) => return Ok(vectors),
                Err(Attempt { error, retryable }) => {
                    if !retryable || attempt >= self.max_attempts {
                        return Err(error);
                    }
                    warn!(attempt, max = self.max_attempts, %error, "embedding request failed, retrying");
                    std::thread::sleep(Self::backoff(attempt));
                    attempt += 1;
                }
            }
        }
    }
}

struct Attempt {
    error: EmbedError,
    retryable: bool,
}

impl Attempt {
    fn fail(error: EmbedError, retryable: bool) -> Self {
        Self { error, retryable }
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}
