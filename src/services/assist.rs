use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

use crate::config::AssistConfig;

pub const UNAVAILABLE_COPY: &str =
    "The AI assistant is currently unavailable. The API key is not configured.";
pub const EMPTY_COPY: &str = "Sorry, I couldn't generate a response.";
pub const ERROR_COPY: &str = "Sorry, I encountered an error. Please try again.";
pub const SUMMARY_FALLBACK_COPY: &str =
    "An AI summary is unavailable right now. Please try again later.";

/// Inputs for the structured profile summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileFacts {
    pub name: String,
    pub service: String,
    pub bio: String,
    #[serde(default)]
    pub reviews: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileSummary {
    pub summary: String,
    pub highlights: Vec<String>,
    pub notes: Vec<String>,
}

impl ProfileSummary {
    fn fallback() -> Self {
        Self {
            summary: SUMMARY_FALLBACK_COPY.to_string(),
            highlights: Vec::new(),
            notes: Vec::new(),
        }
    }
}

/// Thin client for the Gemini `generateContent` REST endpoint.
///
/// Upstream failures never escape this type: every public method degrades to
/// fixed user-visible copy instead of an error, so a broken or unconfigured
/// text service cannot take a request down with it.
#[derive(Clone)]
pub struct AssistClient {
    http: reqwest::Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl AssistClient {
    pub fn from_config(cfg: &AssistConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.request_timeout_secs))
            .build()
            .unwrap_or_default();

        Self {
            http,
            api_key: cfg.api_key.clone(),
            model: cfg.model.clone(),
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Free-text completion. Always returns something user-visible.
    pub async fn generate(&self, prompt: &str) -> String {
        let Some(key) = self.api_key.as_deref() else {
            return UNAVAILABLE_COPY.to_string();
        };

        match self.generate_content(key, prompt, None).await {
            Ok(text) if text.trim().is_empty() => EMPTY_COPY.to_string(),
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                tracing::error!("assist generate failed: {:#}", e);
                ERROR_COPY.to_string()
            }
        }
    }

    /// Structured summary of a provider profile. Degrades to a static summary
    /// on any upstream failure.
    pub async fn profile_summary(&self, facts: &ProfileFacts) -> ProfileSummary {
        let Some(key) = self.api_key.as_deref() else {
            return ProfileSummary::fallback();
        };

        let prompt = summary_prompt(facts);
        let result = self
            .generate_content(key, &prompt, Some(summary_response_schema()))
            .await
            .and_then(|text| {
                serde_json::from_str::<ProfileSummary>(text.trim())
                    .context("summary response was not the expected JSON shape")
            });

        match result {
            Ok(summary) => summary,
            Err(e) => {
                tracing::error!("assist profile summary failed: {:#}", e);
                ProfileSummary::fallback()
            }
        }
    }

    async fn generate_content(
        &self,
        key: &str,
        prompt: &str,
        response_schema: Option<Value>,
    ) -> Result<String> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, self.model, key
        );

        let mut body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
        });
        if let Some(schema) = response_schema {
            body["generationConfig"] = json!({
                "responseMimeType": "application/json",
                "responseSchema": schema,
            });
        }

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .context("request to text service failed")?;

        if !response.status().is_success() {
            bail!("text service returned {}", response.status());
        }

        let payload: Value = response
            .json()
            .await
            .context("text service returned invalid JSON")?;

        Ok(extract_text(&payload))
    }
}

/// Concatenated text parts of the first candidate; empty string if the
/// response carries none.
fn extract_text(payload: &Value) -> String {
    let parts = payload
        .get("candidates")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.as_array());

    match parts {
        Some(parts) => parts
            .iter()
            .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
            .collect::<Vec<_>>()
            .join(""),
        None => String::new(),
    }
}

fn summary_prompt(facts: &ProfileFacts) -> String {
    let reviews = facts
        .reviews
        .iter()
        .map(|r| format!("- \"{}\"", r))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Based on the following profile and reviews for a service provider, generate a concise summary.\n\n\
         Provider Name: {}\n\
         Service: {}\n\
         Bio: {}\n\n\
         Reviews:\n{}\n\n\
         Please provide:\n\
         1. A short, engaging summary of the provider (2-3 sentences).\n\
         2. 2-3 positive highlights from their reviews.\n\
         3. 1-2 constructive points or common themes from reviews, framed as \"Things to Note\". \
         If all reviews are positive, mention their consistent high praise.\n\n\
         Return the response ONLY in this JSON format.",
        facts.name, facts.service, facts.bio, reviews
    )
}

fn summary_response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "summary": {
                "type": "STRING",
                "description": "A short, engaging summary of the provider."
            },
            "highlights": {
                "type": "ARRAY",
                "items": { "type": "STRING" },
                "description": "Positive highlights from reviews."
            },
            "notes": {
                "type": "ARRAY",
                "items": { "type": "STRING" },
                "description": "Constructive points or things to note."
            }
        },
        "required": ["summary", "highlights", "notes"]
    })
}
