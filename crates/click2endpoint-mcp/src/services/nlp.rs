//! Map a free-text use case onto wizard answers with an LLM, and keep an
//! audit trail of how those suggestions were used.

use std::collections::{BTreeMap, VecDeque};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value as JsonValue, json};

use crate::endpoints;
use crate::error::ServiceError;
use crate::wizard::questions::all_questions;

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
const TEMPERATURE: f32 = 0.3;
const MAX_TOKENS: u32 = 500;

/// Entries kept by [`AuditLog`] before the oldest is dropped.
pub const AUDIT_CAPACITY: usize = 100;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub suggested_answers: BTreeMap<String, String>,
    #[serde(default)]
    pub parameters: JsonMap<String, JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ParseOutcome {
    pub fn failure(err: &ServiceError) -> Self {
        Self {
            success: false,
            error: Some(err.to_string()),
            ..Default::default()
        }
    }
}

#[async_trait]
pub trait UseCaseParser: Send + Sync {
    async fn parse(&self, input: &str) -> Result<ParseOutcome, ServiceError>;
}

/// Chat-completions backed parser.
pub struct OpenAiParser {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
}

impl OpenAiParser {
    pub fn new(api_key: Option<String>, model: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: OPENAI_BASE_URL.to_string(),
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn request_body(&self, input: &str) -> JsonValue {
        json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": build_system_prompt()},
                {"role": "user", "content": input}
            ],
            "temperature": TEMPERATURE,
            "max_tokens": MAX_TOKENS,
        })
    }
}

#[async_trait]
impl UseCaseParser for OpenAiParser {
    async fn parse(&self, input: &str) -> Result<ParseOutcome, ServiceError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ServiceError::NotConfigured("OpenAI API key"))?;
        if input.trim().is_empty() {
            return Err(ServiceError::EmptyInput);
        }
        tracing::info!("parsing use case with {} ({} chars)", self.model, input.len());

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&self.request_body(input))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(upstream_error(status.as_u16(), &body));
        }
        let data: JsonValue = response.json().await?;
        let content = data
            .pointer("/choices/0/message/content")
            .and_then(JsonValue::as_str)
            .ok_or_else(|| ServiceError::Decode("No response from OpenAI".to_string()))?;
        let outcome = parse_model_reply(content)?;
        tracing::debug!(
            "suggested endpoint={:?}, confidence={}",
            outcome.endpoint,
            outcome.confidence
        );
        Ok(outcome)
    }
}

/// Prefer the API's own `error.message`, falling back to the bare status.
fn upstream_error(status: u16, body: &str) -> ServiceError {
    let message = serde_json::from_str::<JsonValue>(body).ok().and_then(|v| {
        v.pointer("/error/message")
            .and_then(JsonValue::as_str)
            .map(str::to_string)
    });
    ServiceError::Upstream(message.unwrap_or_else(|| format!("OpenAI API error: {status}")))
}

/// System prompt listing the endpoint catalog and the decision-tree answers.
pub fn build_system_prompt() -> String {
    let endpoint_lines = endpoints::all()
        .iter()
        .map(|e| format!("{}: {}", e.path, e.description))
        .collect::<Vec<_>>()
        .join("\n");
    let question_lines = all_questions()
        .iter()
        .map(|q| {
            let options = q
                .options
                .iter()
                .map(|o| format!("\"{}\" ({})", o.value, o.label))
                .collect::<Vec<_>>()
                .join(", ");
            format!("- {}: {}", q.id, options)
        })
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        r#"You are an AI assistant that maps natural language use cases to API endpoints.

Available endpoints:
{endpoint_lines}

Analyze the user's use case and determine:
1. Which endpoint best matches their needs
2. How confident you are (0-100)
3. The answers to the decision tree questions below

Decision tree questions:
{question_lines}

Respond with JSON only, in this format:
{{
  "endpoint": "/jobs/single-doc-job-template",
  "confidence": 85,
  "suggestedAnswers": {{"docType": "single", "templateUsage": "true", "recipientStyle": "explicit"}},
  "reasoning": "Brief explanation of why this endpoint was chosen"
}}"#
    )
}

/// Decode the model's JSON reply, tolerating a fenced code block around it.
pub fn parse_model_reply(content: &str) -> Result<ParseOutcome, ServiceError> {
    let trimmed = content.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|s| s.trim_end().strip_suffix("```"))
        .unwrap_or(trimmed);
    let v: JsonValue = serde_json::from_str(body.trim())?;
    let obj = v
        .as_object()
        .ok_or_else(|| ServiceError::Decode("model reply is not a JSON object".to_string()))?;

    let confidence = match obj.get("confidence") {
        Some(JsonValue::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(JsonValue::String(s)) => s.trim().trim_end_matches('%').parse().unwrap_or(0.0),
        _ => 0.0,
    };
    let suggested_answers = obj
        .get("suggestedAnswers")
        .and_then(JsonValue::as_object)
        .map(|m| {
            m.iter()
                .filter_map(|(k, v)| {
                    let s = match v {
                        JsonValue::String(s) => s.clone(),
                        JsonValue::Bool(b) => b.to_string(),
                        JsonValue::Number(n) => n.to_string(),
                        _ => return None,
                    };
                    Some((k.clone(), s))
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(ParseOutcome {
        success: true,
        endpoint: obj
            .get("endpoint")
            .and_then(JsonValue::as_str)
            .map(str::to_string),
        confidence,
        suggested_answers,
        parameters: obj
            .get("parameters")
            .and_then(JsonValue::as_object)
            .cloned()
            .unwrap_or_default(),
        reasoning: obj
            .get("reasoning")
            .and_then(JsonValue::as_str)
            .map(str::to_string),
        error: None,
    })
}

fn now_ms() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or_default()
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSelection {
    pub endpoint: String,
    pub answers: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub helpful: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub timestamp_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub timestamp_ms: u64,
    pub user_input: String,
    pub ai_suggestion: ParseOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_selection: Option<UserSelection>,
    /// The user ended on the suggested endpoint.
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<Feedback>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccuracyStats {
    pub total_suggestions: usize,
    pub accepted: usize,
    pub helpful: usize,
    /// Percentage of suggestions accepted.
    pub accuracy: f64,
}

/// Bounded in-memory log of suggestions and what became of them.
#[derive(Debug, Default)]
pub struct AuditLog {
    entries: VecDeque<AuditEntry>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_suggestion(&mut self, user_input: &str, suggestion: ParseOutcome) {
        if self.entries.len() == AUDIT_CAPACITY {
            self.entries.pop_front();
        }
        self.entries.push_back(AuditEntry {
            timestamp_ms: now_ms(),
            user_input: user_input.to_string(),
            ai_suggestion: suggestion,
            user_selection: None,
            accepted: false,
            feedback: None,
        });
    }

    /// Attach the endpoint the user finally reached to the latest suggestion.
    pub fn record_selection(&mut self, endpoint: &str, answers: BTreeMap<String, String>) {
        let Some(latest) = self.entries.back_mut() else {
            return;
        };
        latest.accepted = latest.ai_suggestion.endpoint.as_deref() == Some(endpoint);
        latest.user_selection = Some(UserSelection {
            endpoint: endpoint.to_string(),
            answers,
        });
    }

    /// Returns false when there is nothing to attach feedback to.
    pub fn update_latest_feedback(&mut self, helpful: bool, comment: Option<String>) -> bool {
        match self.entries.back_mut() {
            Some(latest) => {
                latest.feedback = Some(Feedback {
                    helpful,
                    comment,
                    timestamp_ms: now_ms(),
                });
                true
            }
            None => false,
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = &AuditEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn accuracy(&self) -> AccuracyStats {
        let total = self.entries.len();
        let accepted = self.entries.iter().filter(|e| e.accepted).count();
        let helpful = self
            .entries
            .iter()
            .filter(|e| e.feedback.as_ref().is_some_and(|f| f.helpful))
            .count();
        AccuracyStats {
            total_suggestions: total,
            accepted,
            helpful,
            accuracy: if total > 0 {
                accepted as f64 / total as f64 * 100.0
            } else {
                0.0
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn suggestion(endpoint: &str) -> ParseOutcome {
        ParseOutcome {
            success: true,
            endpoint: Some(endpoint.to_string()),
            confidence: 80.0,
            ..Default::default()
        }
    }

    #[test]
    fn prompt_lists_endpoints_and_questions() {
        let p = build_system_prompt();
        assert!(p.contains("/jobs/single-pdf-split-addressCapture: "));
        assert!(p.contains("- docType: \"single\""));
        assert!(p.contains("\"pdfSplit\""));
        assert!(p.contains("\"suggestedAnswers\""));
    }

    #[test]
    fn parses_fenced_reply_with_loose_types() {
        let reply = "```json\n{\"endpoint\": \"/jobs/multi-doc\", \"confidence\": \"72%\",\n\"suggestedAnswers\": {\"docType\": \"multi\", \"templateUsage\": false},\n\"reasoning\": \"many letters\"}\n```";
        let out = parse_model_reply(reply).unwrap();
        assert!(out.success);
        assert_eq!(out.endpoint.as_deref(), Some("/jobs/multi-doc"));
        assert_eq!(out.confidence, 72.0);
        assert_eq!(out.suggested_answers["templateUsage"], "false");
        assert_eq!(out.reasoning.as_deref(), Some("many letters"));
        assert!(parse_model_reply("not json").is_err());
        assert!(parse_model_reply("[1]").is_err());
    }

    #[tokio::test]
    async fn missing_key_and_blank_input_are_reported() {
        let p = OpenAiParser::new(None, None);
        let err = p.parse("send a letter").await.unwrap_err();
        assert_eq!(err.to_string(), "OpenAI API key not configured");
        assert_eq!(
            ParseOutcome::failure(&err).error.as_deref(),
            Some("OpenAI API key not configured")
        );

        let p = OpenAiParser::new(Some("sk-test".into()), None);
        let err = p.parse("   ").await.unwrap_err();
        assert_eq!(err.to_string(), "No input provided");
    }

    #[test]
    fn upstream_errors_prefer_api_message() {
        let e = upstream_error(401, r#"{"error": {"message": "Incorrect API key provided"}}"#);
        assert_eq!(e.to_string(), "Incorrect API key provided");
        assert_eq!(upstream_error(502, "<html>").to_string(), "OpenAI API error: 502");
    }

    #[test]
    fn request_body_uses_fixed_sampling() {
        let p = OpenAiParser::new(Some("k".into()), None);
        let body = p.request_body("hi");
        assert_eq!(body["model"], DEFAULT_MODEL);
        assert_eq!(body["max_tokens"], 500);
        assert_eq!(body["messages"][1]["content"], "hi");
    }

    #[test]
    fn audit_log_is_bounded_and_scores_acceptance() {
        let mut log = AuditLog::new();
        for i in 0..(AUDIT_CAPACITY + 5) {
            log.record_suggestion(&format!("case {i}"), suggestion("/jobs/single-doc"));
        }
        assert_eq!(log.len(), AUDIT_CAPACITY);
        assert_eq!(log.entries().next().unwrap().user_input, "case 5");

        log.record_selection("/jobs/single-doc", BTreeMap::new());
        assert!(log.update_latest_feedback(true, Some("spot on".into())));
        let stats = log.accuracy();
        assert_eq!(stats.total_suggestions, AUDIT_CAPACITY);
        assert_eq!(stats.accepted, 1);
        assert_eq!(stats.helpful, 1);
        assert!((stats.accuracy - 1.0).abs() < 1e-9);

        log.record_selection("/jobs/multi-doc", BTreeMap::new());
        assert_eq!(log.accuracy().accepted, 0);
    }

    #[test]
    fn feedback_without_entries_is_rejected() {
        let mut log = AuditLog::new();
        assert!(!log.update_latest_feedback(false, None));
        assert_eq!(log.accuracy().accuracy, 0.0);
        assert!(log.is_empty());
    }
}
