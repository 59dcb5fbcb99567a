//! Classification service client
//!
//! Sends batches of raw terms to an LLM prompt-completion API and parses
//! the strict term -> canonical JSON object out of the reply. The prompt
//! seeds the model with the already-established canonical vocabulary so
//! new runs reuse existing canon instead of minting synonyms.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

use crate::config::ClassifierConfig;

const USER_AGENT: &str = concat!("ama-ce/", env!("CARGO_PKG_VERSION"));

/// Classification errors. Every variant fails the affected batch only.
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

/// The opaque term-classification function.
///
/// `preferred` is the canonical vocabulary the classifier should reuse
/// when a suitable match exists. The returned map covers the input terms
/// (or a subset of them); no ordering is guaranteed across calls.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(
        &self,
        terms: &[String],
        preferred: &[String],
    ) -> Result<HashMap<String, String>, ClassifyError>;
}

/// Prompt-completion response envelope
#[derive(Debug, Deserialize)]
struct CompletionResponse {
    data: CompletionData,
}

#[derive(Debug, Deserialize)]
struct CompletionData {
    completion: Completion,
}

#[derive(Debug, Deserialize)]
struct Completion {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: String,
}

/// LLM-backed classifier
pub struct LlmClassifier {
    http_client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl LlmClassifier {
    pub fn new(config: &ClassifierConfig) -> Result<Self, ClassifyError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ClassifyError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl Classifier for LlmClassifier {
    async fn classify(
        &self,
        terms: &[String],
        preferred: &[String],
    ) -> Result<HashMap<String, String>, ClassifyError> {
        let url = format!("{}/v0/prompt/completion", self.base_url);
        let prompt = build_prompt(terms, preferred);

        tracing::debug!(terms = terms.len(), preferred = preferred.len(), "Querying classifier");

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({
                "model": self.model,
                "message": prompt,
            }))
            .send()
            .await
            .map_err(|e| ClassifyError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ClassifyError::Api(status.as_u16(), error_text));
        }

        let reply: CompletionResponse = response
            .json()
            .await
            .map_err(|e| ClassifyError::MalformedResponse(e.to_string()))?;

        let content = reply
            .data
            .completion
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or_else(|| ClassifyError::MalformedResponse("empty choices".to_string()))?;

        let mappings = parse_mapping_object(content)?;

        tracing::info!(
            terms = terms.len(),
            mapped = mappings.len(),
            "Classifier batch mapped"
        );

        Ok(mappings)
    }
}

/// Build the classification instructions for one batch.
fn build_prompt(terms: &[String], preferred: &[String]) -> String {
    // serde_json::to_string on &[String] cannot fail
    let terms_json = serde_json::to_string_pretty(terms).unwrap_or_default();
    let preferred_json = serde_json::to_string_pretty(preferred).unwrap_or_default();

    format!(
        "Analyze the following list of category terms. Some are duplicates or variations \
         of each other (e.g., 'Bibelauslegung', 'Biblische Exegese').\n\
         Your task is to create a JSON object that maps each of these terms to a single, \
         consistent, canonical form.\n\
         Prefer a canonical form from this list of already established terms whenever one \
         is a suitable match:\n{preferred_json}\n\
         Only when none fits, use the most common or descriptive term as a new canonical form.\n\
         \n\
         The list of terms is:\n{terms_json}\n\
         \n\
         Respond with ONLY the JSON object, like this: \
         {{\"original_term_1\": \"canonical_term_1\", \"original_term_2\": \"canonical_term_1\", ...}}."
    )
}

/// Parse the strict term -> canonical object out of the model reply.
///
/// Code fences around the object are tolerated; anything that is not a
/// JSON object of strings is a hard failure for the batch.
fn parse_mapping_object(content: &str) -> Result<HashMap<String, String>, ClassifyError> {
    let body = strip_code_fence(content);

    serde_json::from_str::<HashMap<String, String>>(body)
        .map_err(|e| ClassifyError::MalformedResponse(format!("expected JSON object of strings: {}", e)))
}

fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop an optional language tag after the opening fence
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.trim_end_matches('`').trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_carries_terms_and_preferred_canon() {
        let terms = vec!["Glauben".to_string(), "Bibelauslegung".to_string()];
        let preferred = vec!["Glaube".to_string()];

        let prompt = build_prompt(&terms, &preferred);
        assert!(prompt.contains("\"Glauben\""));
        assert!(prompt.contains("\"Bibelauslegung\""));
        assert!(prompt.contains("\"Glaube\""));
        assert!(prompt.contains("ONLY the JSON object"));
    }

    #[test]
    fn parses_plain_object() {
        let mappings = parse_mapping_object(r#"{"Glauben": "Glaube"}"#).unwrap();
        assert_eq!(mappings.get("Glauben").map(String::as_str), Some("Glaube"));
    }

    #[test]
    fn parses_fenced_object() {
        let content = "```json\n{\"Glauben\": \"Glaube\"}\n```";
        let mappings = parse_mapping_object(content).unwrap();
        assert_eq!(mappings.len(), 1);
    }

    #[test]
    fn rejects_non_object_replies() {
        assert!(parse_mapping_object("Sorry, I cannot do that.").is_err());
        assert!(parse_mapping_object(r#"["Glaube"]"#).is_err());
        assert!(parse_mapping_object(r#"{"Glauben": 3}"#).is_err());
    }
}
