//! HTTP generation client
//!
//! Talks to a model server exposing `POST /generate`, which runs beam search
//! over a batch of token windows and returns the decoded candidates with
//! special tokens kept.

use std::time::Duration;

use async_trait::async_trait;
use relkg_core::{
    GenerationBatch, GenerationParams, Generator, GeneratorConfig, RelkgError, Result,
};
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Generator backed by a remote model server
pub struct HttpGenerator {
    client: Client,
    endpoint: String,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    input_ids: &'a [Vec<u32>],
    attention_mask: &'a [Vec<u32>],
    max_length: usize,
    length_penalty: f32,
    num_beams: usize,
    num_return_sequences: usize,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    sequences: Vec<String>,
}

impl HttpGenerator {
    /// Create a client for the server at `endpoint`
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RelkgError::Generation(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        })
    }

    /// Create from config
    pub fn from_config(config: &GeneratorConfig) -> Result<Self> {
        Self::new(
            config.endpoint.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn generate_url(&self) -> String {
        format!("{}/generate", self.endpoint)
    }
}

#[async_trait]
impl Generator for HttpGenerator {
    async fn generate(
        &self,
        batch: &GenerationBatch,
        params: &GenerationParams,
    ) -> Result<Vec<String>> {
        let request = GenerateRequest {
            input_ids: &batch.input_ids,
            attention_mask: &batch.attention_mask,
            max_length: params.max_length,
            length_penalty: params.length_penalty,
            num_beams: params.num_beams,
            num_return_sequences: params.num_return_sequences,
        };

        tracing::debug!(
            url = %self.generate_url(),
            rows = batch.len(),
            num_beams = params.num_beams,
            "Sending generation request"
        );

        let response = self
            .client
            .post(self.generate_url())
            .json(&request)
            .send()
            .await
            .map_err(|e| RelkgError::Generation(format!("Request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(RelkgError::Generation(format!(
                "Generator returned {status}: {error_text}"
            )));
        }

        let result: GenerateResponse = response
            .json()
            .await
            .map_err(|e| RelkgError::Generation(format!("Failed to parse response: {e}")))?;

        Ok(result.sequences)
    }

    fn name(&self) -> &str {
        "http"
    }
}
