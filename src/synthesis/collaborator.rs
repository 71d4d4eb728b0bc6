//! Synthesis collaborator client (external LLM capability).
//!
//! The collaborator is specified only at its boundary: two knowledge-item
//! payloads in, one structured synthesis object out. Any deviation from the
//! response schema — missing fields, non-JSON text, timeout — surfaces as an
//! `Err`, which the caller converts into the heuristic fallback.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

use crate::error::{Error, Result};
use crate::knowledge::{ConceptEvolution, ContradictionAnalysis, IntegrationMethod, KnowledgeItem};

use super::{SynthesisOutput, SynthesisStrategy};

/// Configuration for the collaborator client.
#[derive(Debug, Clone)]
pub struct CollaboratorConfig {
    /// API key
    pub api_key: String,
    /// Base URL override
    pub base_url: Option<String>,
    /// Model identifier
    pub model: String,
    /// Request timeout in seconds — the collaborator call is the only
    /// operation in the pipeline that may block on an external dependency
    pub timeout_secs: u64,
    /// Max response tokens
    pub max_tokens: u32,
}

impl CollaboratorConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: None,
            model: "claude-3-5-sonnet-20241022".to_string(),
            timeout_secs: 60,
            max_tokens: 2048,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// HTTP client for an Anthropic-style messages endpoint.
pub struct CollaboratorClient {
    config: CollaboratorConfig,
    http: Client,
}

// Wire types for the messages endpoint
#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    messages: Vec<WireMessage>,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<WireContent>,
}

#[derive(Debug, Deserialize)]
struct WireContent {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireError {
    error: WireErrorDetail,
}

#[derive(Debug, Deserialize)]
struct WireErrorDetail {
    message: String,
    #[serde(rename = "type")]
    error_type: String,
}

impl CollaboratorClient {
    const DEFAULT_BASE_URL: &'static str = "https://api.anthropic.com";
    const API_VERSION: &'static str = "2023-06-01";

    pub fn new(config: CollaboratorConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { config, http })
    }

    fn base_url(&self) -> &str {
        self.config
            .base_url
            .as_deref()
            .unwrap_or(Self::DEFAULT_BASE_URL)
    }

    /// Send one prompt and return the raw response text.
    pub async fn complete(&self, prompt: &str) -> Result<String> {
        let request = MessagesRequest {
            model: self.config.model.clone(),
            messages: vec![WireMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            max_tokens: self.config.max_tokens,
        };

        let url = format!("{}/v1/messages", self.base_url());

        let response = self
            .http
            .post(&url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", Self::API_VERSION)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::timeout(self.config.timeout_secs * 1000)
                } else {
                    Error::collaborator_with_source("HTTP request failed", e)
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::collaborator_with_source("failed to read response", e))?;

        if !status.is_success() {
            if let Ok(error) = serde_json::from_str::<WireError>(&body) {
                return Err(Error::collaborator(format!(
                    "API error ({}): {}",
                    error.error.error_type, error.error.message
                )));
            }
            return Err(Error::collaborator(format!("API error ({status}): {body}")));
        }

        let parsed: MessagesResponse = serde_json::from_str(&body)
            .map_err(|e| Error::collaborator(format!("unparseable response envelope: {e}")))?;

        Ok(parsed
            .content
            .iter()
            .filter_map(|c| c.text.as_deref())
            .collect::<Vec<_>>()
            .join(""))
    }
}

/// Response schema the collaborator must produce.
///
/// Every field is required; a missing field fails deserialization, which
/// triggers the heuristic fallback upstream.
#[derive(Debug, Deserialize)]
struct CollaboratorResponse {
    synthesized_content: String,
    key_insights: Vec<String>,
    novelty_score: f64,
    related_concepts: Vec<String>,
    contradiction_analysis: WireContradictions,
    evolution_trends: Vec<ConceptEvolution>,
    quality_metrics: HashMap<String, f64>,
    application_domains: Vec<String>,
    actionable_insights: Vec<String>,
    future_research_directions: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct WireContradictions {
    conflicts: Vec<String>,
    resolutions: Vec<String>,
}

/// Collaborator-backed synthesis strategy.
pub struct CollaboratorSynthesis {
    client: CollaboratorClient,
}

impl CollaboratorSynthesis {
    pub fn new(client: CollaboratorClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SynthesisStrategy for CollaboratorSynthesis {
    async fn synthesize(&self, a: &KnowledgeItem, b: &KnowledgeItem) -> Result<SynthesisOutput> {
        let prompt = build_prompt(a, b);
        debug!("requesting collaborator synthesis ({} bytes)", prompt.len());

        let text = self.client.complete(&prompt).await?;
        parse_response(&text)
    }
}

fn build_prompt(a: &KnowledgeItem, b: &KnowledgeItem) -> String {
    let payload = serde_json::json!({
        "item_a": {
            "content": a.content,
            "categories": a.categories,
            "keywords": a.keywords,
        },
        "item_b": {
            "content": b.content,
            "categories": b.categories,
            "keywords": b.keywords,
        },
    });

    format!(
        "Two knowledge items were extracted from independent learning sessions:\n\
         {payload}\n\n\
         Synthesize them into a single higher-order insight. Respond with only \
         a JSON object containing exactly these fields: synthesized_content \
         (string), key_insights (string array), novelty_score (number in \
         [0,1]), related_concepts (string array), contradiction_analysis \
         (object with conflicts and resolutions string arrays), \
         evolution_trends (array, normally empty), quality_metrics (object \
         mapping metric names to numbers), application_domains (string \
         array), \
         actionable_insights (string array), future_research_directions \
         (string array)."
    )
}

/// Parse collaborator output into a synthesis result.
///
/// Tolerates prose around the JSON object (first `{` to last `}`), but the
/// object itself must match the schema exactly.
fn parse_response(text: &str) -> Result<SynthesisOutput> {
    let json = extract_json_object(text)
        .ok_or_else(|| Error::collaborator("no JSON object in response"))?;

    let response: CollaboratorResponse = serde_json::from_str(json)
        .map_err(|e| Error::collaborator(format!("response does not match schema: {e}")))?;

    if response.synthesized_content.trim().is_empty() {
        return Err(Error::collaborator("empty synthesized_content"));
    }
    if response.key_insights.is_empty() {
        return Err(Error::collaborator("empty key_insights"));
    }

    Ok(SynthesisOutput {
        content: response.synthesized_content,
        key_insights: response.key_insights,
        novelty_score: response.novelty_score.clamp(0.0, 1.0),
        related_concepts: response.related_concepts,
        contradiction_analysis: ContradictionAnalysis {
            conflicts: response.contradiction_analysis.conflicts,
            resolutions: response.contradiction_analysis.resolutions,
        },
        evolution_trends: response.evolution_trends,
        quality_metrics: response.quality_metrics,
        application_domains: response.application_domains,
        actionable_insights: response.actionable_insights,
        future_research_directions: response.future_research_directions,
        method: IntegrationMethod::LlmSynthesis,
    })
}

fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn valid_response() -> String {
        serde_json::json!({
            "synthesized_content": "Attention mechanisms generalize across modalities.",
            "key_insights": ["Shared architecture across text and music models"],
            "novelty_score": 0.8,
            "related_concepts": ["attention", "transformer"],
            "contradiction_analysis": {"conflicts": [], "resolutions": []},
            "evolution_trends": [],
            "quality_metrics": {"coherence": 0.9},
            "application_domains": ["ai"],
            "actionable_insights": ["Evaluate music transformers"],
            "future_research_directions": ["Cross-modal attention studies"]
        })
        .to_string()
    }

    #[test]
    fn test_parse_valid_response() {
        let output = parse_response(&valid_response()).unwrap();
        assert_eq!(output.method, IntegrationMethod::LlmSynthesis);
        assert_eq!(output.novelty_score, 0.8);
        assert_eq!(output.related_concepts.len(), 2);
        assert!(output.contradiction_analysis.is_empty());
    }

    #[test]
    fn test_parse_tolerates_surrounding_prose() {
        let text = format!("Here is the synthesis:\n{}\nHope this helps.", valid_response());
        let output = parse_response(&text).unwrap();
        assert!(!output.content.is_empty());
    }

    #[test]
    fn test_parse_rejects_missing_fields() {
        let text = r#"{"synthesized_content": "x", "key_insights": ["y"]}"#;
        assert!(parse_response(text).is_err());
    }

    #[test]
    fn test_parse_rejects_non_json() {
        assert!(parse_response("I could not produce a synthesis.").is_err());
    }

    #[test]
    fn test_parse_rejects_empty_content() {
        let mut value: serde_json::Value = serde_json::from_str(&valid_response()).unwrap();
        value["synthesized_content"] = serde_json::json!("   ");
        assert!(parse_response(&value.to_string()).is_err());
    }

    #[test]
    fn test_parse_carries_evolution_trends() {
        let mut value: serde_json::Value = serde_json::from_str(&valid_response()).unwrap();
        value["evolution_trends"] = serde_json::json!([{
            "concept": "attention",
            "timeline": [],
            "trend": "increasing",
            "turning_points": []
        }]);
        let output = parse_response(&value.to_string()).unwrap();
        assert_eq!(output.evolution_trends.len(), 1);
        assert_eq!(output.evolution_trends[0].concept, "attention");
    }

    #[test]
    fn test_parse_rejects_malformed_evolution_trends() {
        let mut value: serde_json::Value = serde_json::from_str(&valid_response()).unwrap();
        value["evolution_trends"] = serde_json::json!(["just a string"]);
        assert!(parse_response(&value.to_string()).is_err());
    }

    #[test]
    fn test_parse_clamps_novelty() {
        let mut value: serde_json::Value = serde_json::from_str(&valid_response()).unwrap();
        value["novelty_score"] = serde_json::json!(3.2);
        let output = parse_response(&value.to_string()).unwrap();
        assert_eq!(output.novelty_score, 1.0);
    }

    #[test]
    fn test_prompt_carries_both_payloads() {
        let a = KnowledgeItem::new("AIVA composes scores").with_keywords(["music"]);
        let b = KnowledgeItem::new("Transformers compose text").with_keywords(["text"]);
        let prompt = build_prompt(&a, &b);
        assert!(prompt.contains("AIVA composes scores"));
        assert!(prompt.contains("Transformers compose text"));
        assert!(prompt.contains("future_research_directions"));
    }
}
