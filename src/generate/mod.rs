//! Parsing and filtering of model-generated tips and polls.

mod filter;
mod topics;

pub use filter::{
    FilterOutcome, NewPoll, NewPost, PollOption, SkipReason, Skipped, filter_polls, filter_tips,
};
pub use topics::{NewTopic, TOPIC_PALETTE, TopicColors, assign_topic_colors};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Result type for generation response handling.
pub type Result<T> = std::result::Result<T, GenerationError>;

/// Errors raised while reading a model response.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("no content received from model response")]
    EmptyResponse,
    #[error("failed to parse model response as JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("no {0} found in model response")]
    NothingGenerated(&'static str),
}

const FENCE: &str = "```";
const SUMMARY_CONTEXT_CHARS: usize = 150;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeSnippet {
    pub label: String,
    pub language: String,
    pub content: String,
}

/// One tip as emitted by the model. Only `title` is required downstream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratedTip {
    pub title: Option<String>,
    pub summary: Option<String>,
    pub problem_solved: Option<String>,
    pub upside: Option<String>,
    pub downside: Option<String>,
    pub risk_level: Option<RiskLevel>,
    pub performance_impact: Option<String>,
    pub doc_url: Option<String>,
    pub primary_topic: Option<String>,
    pub syntax: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub code_snippets: Vec<CodeSnippet>,
    #[serde(deserialize_with = "null_as_default")]
    pub dependencies: Vec<String>,
    pub compatibility_min_version: Option<String>,
    pub compatibility_deprecated_in: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    pub difficulty: Option<String>,
}

/// One poll as emitted by the model. Options are normalized during filtering.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct GeneratedPoll {
    pub question: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub options: Vec<Value>,
    pub answer: Option<String>,
    pub topic: Option<String>,
    pub technology: Option<String>,
    pub difficulty: Option<String>,
}

/// A recently published post used to steer the model away from repeats.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RecentPost {
    pub title: String,
    #[serde(default)]
    pub summary: Option<String>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Pulls the JSON text out of a model response.
///
/// A fenced block wins over surrounding prose. The result is then narrowed to
/// the outermost object or array: from the first `{` or `[` to the last
/// matching closer.
pub fn extract_json_payload(response: &str) -> Result<&str> {
    let mut text = response.trim();
    if text.is_empty() {
        return Err(GenerationError::EmptyResponse);
    }

    if let Some(fenced) = fenced_block(text) {
        tracing::debug!("found fenced code block in model response");
        text = fenced;
    }

    if let Some(first) = text.find(['{', '[']) {
        let close = if text[first..].starts_with('{') { '}' } else { ']' };
        if let Some(last) = text.rfind(close).filter(|last| *last > first) {
            text = &text[first..=last];
        }
    }

    Ok(text)
}

fn fenced_block(text: &str) -> Option<&str> {
    let start = text.find(FENCE)? + FENCE.len();
    let rest = &text[start..];
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let end = rest.find(FENCE)?;
    Some(rest[..end].trim())
}

/// Returns the raw tip entries of a `{"tips": [...]}` response.
pub fn parse_tips(response: &str) -> Result<Vec<Value>> {
    let payload = extract_json_payload(response)?;
    let parsed: Value = serde_json::from_str(payload)?;

    let tips = match parsed.get("tips") {
        Some(Value::Array(tips)) => tips.clone(),
        _ => Vec::new(),
    };

    if tips.is_empty() {
        return Err(GenerationError::NothingGenerated("tips"));
    }

    tracing::debug!(count = tips.len(), "parsed generated tips");
    Ok(tips)
}

/// Returns the raw poll entries of a response.
///
/// Accepts `{"polls": [...]}`, a single poll object, or a bare array.
pub fn parse_polls(response: &str) -> Result<Vec<Value>> {
    let payload = extract_json_payload(response)?;
    let parsed: Value = serde_json::from_str(payload)?;

    let polls = if let Some(Value::Array(polls)) = parsed.get("polls") {
        polls.clone()
    } else if is_single_poll(&parsed) {
        tracing::debug!("model returned a single poll object");
        vec![parsed.clone()]
    } else if let Value::Array(polls) = &parsed {
        polls.clone()
    } else {
        Vec::new()
    };

    if polls.is_empty() {
        return Err(GenerationError::NothingGenerated("polls"));
    }

    tracing::debug!(count = polls.len(), "parsed generated polls");
    Ok(polls)
}

fn is_single_poll(value: &Value) -> bool {
    if value.get("type").and_then(Value::as_str) == Some("question") {
        return true;
    }

    is_truthy(value.get("question")) && is_truthy(value.get("options"))
}

fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(flag)) => *flag,
        Some(Value::String(text)) => !text.is_empty(),
        Some(Value::Number(number)) => number.as_f64().is_some_and(|n| n != 0.0),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

/// Renders the "do not repeat" list embedded in generation prompts.
pub fn ignore_context(recent: &[RecentPost]) -> String {
    recent
        .iter()
        .map(|post| {
            let summary = post
                .summary
                .as_deref()
                .filter(|summary| !summary.is_empty())
                .map(|summary| summary.chars().take(SUMMARY_CONTEXT_CHARS).collect::<String>())
                .unwrap_or_else(|| "(no summary)".to_owned());
            format!("- {}: {}", post.title, summary)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
