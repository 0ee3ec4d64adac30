//! OpenAI-compatible chat completions client
//!
//! Works against any provider exposing `POST {api_base}/chat/completions`
//! with bearer authentication. Groq is the default.

use super::{parse_recommendations, recommendations_prompt, summary_prompt};
use super::{InsightError, InsightGenerator, Insights};
use crate::config::InsightsConfig;
use crate::crawler::{AuditResult, PageData};
use crate::scoring::ScoreResult;
use reqwest::Client;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

/// Insight generator backed by a chat completions API
#[derive(Debug, Clone)]
pub struct ChatInsightGenerator {
    client: Client,
    api_base: String,
    api_key: String,
    model: String,
    temperature: f32,
}

impl ChatInsightGenerator {
    pub fn new(
        client: Client,
        api_base: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        temperature: f32,
    ) -> Self {
        Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            temperature,
        }
    }

    /// Creates a generator from configuration
    ///
    /// # Returns
    ///
    /// * `Ok(ChatInsightGenerator)` - The API key was found
    /// * `Err(InsightError::MissingApiKey)` - The configured variable is unset or blank
    pub fn from_config(config: &InsightsConfig) -> Result<Self, InsightError> {
        let api_key = config
            .api_key()
            .ok_or_else(|| InsightError::MissingApiKey(config.api_key_env.clone()))?;
        let client = Client::builder().build()?;

        Ok(Self::new(
            client,
            config.api_base.clone(),
            api_key,
            config.model.clone(),
            config.temperature,
        ))
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Sends one user prompt and returns the assistant's reply
    async fn complete(&self, prompt: &str) -> Result<String, InsightError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
        };

        let url = format!("{}/chat/completions", self.api_base);
        tracing::debug!("Requesting completion from {}", url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(InsightError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| InsightError::Parse(e.to_string()))?;

        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| InsightError::Parse("response contained no message content".to_string()))
    }
}

impl InsightGenerator for ChatInsightGenerator {
    async fn generate(
        &self,
        page: &PageData,
        audit: &AuditResult,
        score: &ScoreResult,
    ) -> Result<Insights, InsightError> {
        let summary = self.complete(&summary_prompt(page, audit, score)).await?;
        let answer = self.complete(&recommendations_prompt(score)).await?;

        Ok(Insights {
            summary,
            recommendations: parse_recommendations(&answer),
            model_used: Some(self.model.clone()),
        })
    }
}
