// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Gemini REST client for artwork critique

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::{Certificate, Client};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use super::prompts::{analysis_prompt, critique_schema, SYSTEM_PROMPT};
use super::{CritiqueGenerator, GenerationError};
use crate::analysis::StructuredCritique;
use crate::config::GeminiConfig;

// --- generateContent serde structs ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    system_instruction: Content,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
    response_mime_type: String,
    response_schema: serde_json::Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
    #[serde(default)]
    total_token_count: u32,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

const BLOCKING_FINISH_REASONS: &[&str] = &[
    "SAFETY",
    "RECITATION",
    "BLOCKLIST",
    "PROHIBITED_CONTENT",
    "SPII",
    "IMAGE_SAFETY",
];

/// Client for the Gemini `generateContent` endpoint
pub struct GeminiClient {
    client: Client,
    base_url: String,
    api_key: String,
    model_name: String,
    max_tokens: u32,
    temperature: f32,
    timeout: Duration,
}

impl GeminiClient {
    pub fn new(config: &GeminiConfig) -> anyhow::Result<Self> {
        Self::with_root_certificates(config, Vec::new())
    }

    /// Client trusting additional CA certificates on top of the built-in roots
    pub fn with_root_certificates(
        config: &GeminiConfig,
        roots: Vec<Certificate>,
    ) -> anyhow::Result<Self> {
        let mut builder = Client::builder().timeout(config.timeout());
        for cert in roots {
            builder = builder.add_root_certificate(cert);
        }
        let client = builder.build()?;

        let base_url = config.base_url.trim_end_matches('/').to_string();
        info!(
            "Gemini client configured: endpoint={}, model={}",
            base_url, config.model_name
        );

        Ok(Self {
            client,
            base_url,
            api_key: config.api_key.clone(),
            model_name: config.model_name.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            timeout: config.timeout(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model_name)
    }

    fn build_request(
        &self,
        image: &[u8],
        mime_type: &str,
        user_comment: Option<&str>,
    ) -> GenerateContentRequest {
        GenerateContentRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part {
                    text: Some(SYSTEM_PROMPT.to_string()),
                    ..Part::default()
                }],
            },
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![
                    Part {
                        inline_data: Some(InlineData {
                            mime_type: mime_type.to_string(),
                            data: STANDARD.encode(image),
                        }),
                        ..Part::default()
                    },
                    Part {
                        text: Some(analysis_prompt(user_comment)),
                        ..Part::default()
                    },
                ],
            }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
                max_output_tokens: self.max_tokens,
                response_mime_type: "application/json".to_string(),
                response_schema: critique_schema(),
            },
        }
    }

    async fn send(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, GenerationError> {
        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Api {
                status: status.as_u16(),
                message: api_error_message(&body),
            });
        }

        Ok(response.json::<GenerateContentResponse>().await?)
    }
}

#[async_trait]
impl CritiqueGenerator for GeminiClient {
    async fn analyze(
        &self,
        image: &[u8],
        mime_type: &str,
        user_comment: Option<&str>,
    ) -> Result<StructuredCritique, GenerationError> {
        let start = Instant::now();
        info!(
            "Starting artwork analysis with {} ({} bytes, {})",
            self.model_name,
            image.len(),
            mime_type
        );

        let request = self.build_request(image, mime_type, user_comment);
        let response = tokio::time::timeout(self.timeout, self.send(&request))
            .await
            .map_err(|_| GenerationError::Timeout {
                seconds: self.timeout.as_secs(),
            })?
            .map_err(|e| {
                error!("Error analyzing image: {}", e);
                e
            })?;

        if let Some(usage) = &response.usage_metadata {
            debug!(
                "Gemini usage: prompt={} output={} total={}",
                usage.prompt_token_count, usage.candidates_token_count, usage.total_token_count
            );
        }

        let text = extract_text(response)?;
        let critique = StructuredCritique::from_model_output(strip_code_fence(&text))
            .map_err(|e| {
                warn!("Model output rejected: {}", e);
                GenerationError::from(e)
            })?;

        info!(
            "Analysis completed in {}ms. Score: {}/10",
            start.elapsed().as_millis(),
            critique.score()
        );
        Ok(critique)
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

/// Concatenated text parts of the first candidate
fn extract_text(response: GenerateContentResponse) -> Result<String, GenerationError> {
    let Some(candidate) = response.candidates.into_iter().next() else {
        return Err(match response.prompt_feedback.and_then(|f| f.block_reason) {
            Some(reason) => GenerationError::Blocked { reason },
            None => GenerationError::EmptyResponse,
        });
    };

    let text: String = candidate
        .content
        .unwrap_or_default()
        .parts
        .into_iter()
        .filter_map(|part| part.text)
        .collect();

    if text.trim().is_empty() {
        return Err(match candidate.finish_reason {
            Some(reason) if BLOCKING_FINISH_REASONS.contains(&reason.as_str()) => {
                GenerationError::Blocked { reason }
            }
            _ => GenerationError::EmptyResponse,
        });
    }
    Ok(text)
}

/// Remove a surrounding markdown code fence, if any
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

fn api_error_message(body: &str) -> String {
    match serde_json::from_str::<ApiErrorEnvelope>(body) {
        Ok(envelope) => envelope.error.message,
        Err(_) if body.is_empty() => "no response body".to_string(),
        Err(_) => body.chars().take(512).collect(),
    }
}
