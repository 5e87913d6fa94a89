//! Client for the external reflection service.
//!
//! Configuration is via environment variables:
//! - `RESERVOIR_GEMINI_API_KEY` - API key; without it every call yields `None`
//! - `RESERVOIR_GEMINI_MODEL` - model name (default: `gemini-3-flash-preview`)
//! - `RESERVOIR_GEMINI_URL` - base URL, overridable for tests
//!
//! The collaborator contract is deliberately loose: given the feed's
//! contents, ask for a structured reflection; any transport failure, non-2xx
//! status or malformed body degrades to "no reflection available". Nothing
//! here can take the feed down.

use reqwest::Client;
use serde_json::json;

use crate::models::{Reflection, Thought};

const DEFAULT_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-3-flash-preview";

const SYSTEM_INSTRUCTION: &str = "You are a poetic, philosophical observer. Your goal is to \
     synthesize random thoughts into a meaningful reflection. Be concise, empathetic, and \
     slightly mysterious.";

/// HTTP client for the reflection service.
#[derive(Debug, Clone)]
pub struct ReflectClient {
    base_url: String,
    model: String,
    api_key: Option<String>,
    client: Client,
}

impl ReflectClient {
    /// Create client from environment variables.
    pub fn from_env() -> Self {
        let base_url =
            std::env::var("RESERVOIR_GEMINI_URL").unwrap_or_else(|_| DEFAULT_URL.to_string());
        let model =
            std::env::var("RESERVOIR_GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let api_key = std::env::var("RESERVOIR_GEMINI_API_KEY").ok();
        Self::new(base_url, model, api_key)
    }

    /// Create with explicit configuration.
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            model: model.into(),
            api_key,
            client: Client::new(),
        }
    }

    /// Ask the service to reflect over the given thoughts.
    ///
    /// Returns `None` for an empty feed, a missing key, or any failure along
    /// the way; failures are logged and never propagated.
    pub async fn reflect(&self, thoughts: &[Thought]) -> Option<Reflection> {
        if thoughts.is_empty() {
            return None;
        }
        let Some(ref api_key) = self.api_key else {
            tracing::debug!("No reflection API key configured");
            return None;
        };

        let listing = thoughts
            .iter()
            .map(|t| format!("- {}", t.content))
            .collect::<Vec<_>>()
            .join("\n");
        let prompt = format!(
            "Analyze the following collection of random thoughts and provide a reflection.\n\
             Thoughts:\n{listing}"
        );

        let body = json!({
            "system_instruction": { "parts": [{ "text": SYSTEM_INSTRUCTION }] },
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": {
                    "type": "OBJECT",
                    "properties": {
                        "summary": { "type": "STRING" },
                        "themes": { "type": "ARRAY", "items": { "type": "STRING" } },
                        "sentiment": { "type": "STRING" },
                        "zenQuote": { "type": "STRING" }
                    },
                    "required": ["summary", "themes", "sentiment", "zenQuote"]
                }
            }
        });

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, api_key
        );

        let response = match self.client.post(&url).json(&body).send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!("Reflection request failed: {}", e);
                return None;
            }
        };

        if !response.status().is_success() {
            tracing::warn!("Reflection service returned {}", response.status());
            return None;
        }

        let payload: serde_json::Value = match response.json().await {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!("Reflection response was not JSON: {}", e);
                return None;
            }
        };

        parse_reflection(&payload)
    }
}

/// Dig the structured reflection out of a generateContent response.
fn parse_reflection(payload: &serde_json::Value) -> Option<Reflection> {
    let text = payload
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .get(0)?
        .get("text")?
        .as_str()?
        .trim();

    match serde_json::from_str(text) {
        Ok(reflection) => Some(reflection),
        Err(e) => {
            tracing::warn!("Malformed reflection body: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_wrapped_reflection() {
        let payload = serde_json::json!({
            "candidates": [{
                "content": {
                    "parts": [{
                        "text": "{\"summary\":\"s\",\"themes\":[\"t\"],\"sentiment\":\"Restless\",\"zenQuote\":\"q\"}"
                    }]
                }
            }]
        });
        let reflection = parse_reflection(&payload).expect("parses");
        assert_eq!(reflection.sentiment, "Restless");
        assert_eq!(reflection.zen_quote, "q");
    }

    #[test]
    fn malformed_payload_yields_none() {
        assert!(parse_reflection(&serde_json::json!({})).is_none());
        let bad_inner = serde_json::json!({
            "candidates": [{ "content": { "parts": [{ "text": "not json" }] } }]
        });
        assert!(parse_reflection(&bad_inner).is_none());
    }

    #[tokio::test]
    async fn missing_api_key_short_circuits() {
        let client = ReflectClient::new("http://unreachable.invalid", "model", None);
        let thought = Thought {
            id: uuid::Uuid::new_v4(),
            content: "x".to_string(),
            timestamp: chrono::Utc::now(),
            category: crate::models::Category::Humour,
            resonates: 0,
            images: Vec::new(),
            tags: Vec::new(),
        };
        assert!(client.reflect(&[thought]).await.is_none());
    }

    #[tokio::test]
    async fn empty_feed_yields_none() {
        let client =
            ReflectClient::new("http://unreachable.invalid", "model", Some("k".to_string()));
        assert!(client.reflect(&[]).await.is_none());
    }
}
