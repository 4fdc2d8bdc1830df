use super::{CodeSnippet, GeneratedPoll, GeneratedTip, RiskLevel};
use crate::dedup::DuplicateFilter;
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// A tip that passed validation and duplicate checks, ready for insertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewPost {
    pub title: String,
    pub summary: Option<String>,
    pub problem_solved: Option<String>,
    pub upside: Option<String>,
    pub downside: Option<String>,
    pub risk_level: Option<RiskLevel>,
    pub performance_impact: Option<String>,
    pub doc_url: Option<String>,
    pub primary_topic: Option<String>,
    pub syntax: Option<String>,
    pub code_snippets: Vec<CodeSnippet>,
    pub dependencies: Vec<String>,
    pub compatibility_min_version: Option<String>,
    pub compatibility_deprecated_in: Option<String>,
    pub tags: Vec<String>,
    pub last_verified: NaiveDate,
    pub difficulty: Option<String>,
}

impl NewPost {
    fn from_tip(title: String, tip: GeneratedTip, last_verified: NaiveDate) -> Self {
        Self {
            title,
            summary: tip.summary,
            problem_solved: tip.problem_solved,
            upside: tip.upside,
            downside: tip.downside,
            risk_level: tip.risk_level,
            performance_impact: tip.performance_impact,
            doc_url: tip.doc_url,
            primary_topic: tip.primary_topic,
            syntax: tip.syntax,
            code_snippets: tip.code_snippets,
            dependencies: tip.dependencies,
            compatibility_min_version: tip.compatibility_min_version,
            compatibility_deprecated_in: tip.compatibility_deprecated_in,
            tags: tip.tags,
            last_verified,
            difficulty: tip.difficulty,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PollOption {
    pub text: String,
    pub order: u64,
}

/// A poll that passed validation and duplicate checks, ready for insertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewPoll {
    pub question: String,
    pub options: Vec<PollOption>,
    pub answer: Option<String>,
    pub topic: Option<String>,
    pub technology: Option<String>,
    pub difficulty: Option<String>,
}

/// Why a generated entry was not accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    Malformed(String),
    MissingTitle,
    MissingQuestion,
    TooFewOptions,
    Duplicate,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed(detail) => write!(f, "malformed entry: {detail}"),
            Self::MissingTitle => write!(f, "missing title"),
            Self::MissingQuestion => write!(f, "missing question"),
            Self::TooFewOptions => write!(f, "fewer than two options"),
            Self::Duplicate => write!(f, "near-duplicate"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skipped {
    /// Position in the generated batch.
    pub index: usize,
    pub label: Option<String>,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOutcome<T> {
    pub accepted: Vec<T>,
    pub skipped: Vec<Skipped>,
}

impl<T> Default for FilterOutcome<T> {
    fn default() -> Self {
        Self {
            accepted: Vec::new(),
            skipped: Vec::new(),
        }
    }
}

impl<T> FilterOutcome<T> {
    fn skip(&mut self, index: usize, label: Option<String>, reason: SkipReason) {
        tracing::info!(index, label = label.as_deref().unwrap_or(""), %reason, "skipping generated entry");
        self.skipped.push(Skipped {
            index,
            label,
            reason,
        });
    }
}

/// Validates generated tips and drops titles too close to `existing_titles`
/// or to tips accepted earlier in the same batch.
pub fn filter_tips<S: AsRef<str>>(
    tips: Vec<Value>,
    existing_titles: &[S],
    threshold: f64,
    today: NaiveDate,
) -> FilterOutcome<NewPost> {
    let mut filter = DuplicateFilter::new(existing_titles, threshold);
    let mut outcome = FilterOutcome::default();

    for (index, raw) in tips.into_iter().enumerate() {
        let tip: GeneratedTip = match serde_json::from_value(raw) {
            Ok(tip) => tip,
            Err(err) => {
                outcome.skip(index, None, SkipReason::Malformed(err.to_string()));
                continue;
            }
        };

        let Some(title) = tip.title.clone().filter(|title| !title.is_empty()) else {
            outcome.skip(index, None, SkipReason::MissingTitle);
            continue;
        };

        if !filter.admit(&title) {
            outcome.skip(index, Some(title), SkipReason::Duplicate);
            continue;
        }

        outcome.accepted.push(NewPost::from_tip(title, tip, today));
    }

    tracing::info!(
        accepted = outcome.accepted.len(),
        skipped = outcome.skipped.len(),
        "filtered generated tips"
    );
    outcome
}

/// Validates generated polls, normalizes their options and drops questions
/// too close to `existing_questions` or to polls accepted earlier in the batch.
pub fn filter_polls<S: AsRef<str>>(
    polls: Vec<Value>,
    existing_questions: &[S],
    threshold: f64,
) -> FilterOutcome<NewPoll> {
    let mut filter = DuplicateFilter::new(existing_questions, threshold);
    let mut outcome = FilterOutcome::default();

    for (index, raw) in polls.into_iter().enumerate() {
        let poll: GeneratedPoll = match serde_json::from_value(raw) {
            Ok(poll) => poll,
            Err(err) => {
                outcome.skip(index, None, SkipReason::Malformed(err.to_string()));
                continue;
            }
        };

        let Some(question) = poll.question.clone().filter(|question| !question.is_empty()) else {
            outcome.skip(index, None, SkipReason::MissingQuestion);
            continue;
        };

        if poll.options.len() < 2 {
            outcome.skip(index, Some(question), SkipReason::TooFewOptions);
            continue;
        }

        if filter.is_duplicate(&question) {
            outcome.skip(index, Some(question), SkipReason::Duplicate);
            continue;
        }

        let options = normalize_options(&poll.options);
        if options.len() < 2 {
            outcome.skip(index, Some(question), SkipReason::TooFewOptions);
            continue;
        }

        filter.admit(&question);
        outcome.accepted.push(NewPoll {
            question,
            options,
            answer: poll.answer,
            topic: poll.topic,
            technology: poll.technology,
            difficulty: poll.difficulty,
        });
    }

    tracing::info!(
        accepted = outcome.accepted.len(),
        skipped = outcome.skipped.len(),
        "filtered generated polls"
    );
    outcome
}

/// Accepts plain strings or `{text, order}` objects; anything else is dropped.
fn normalize_options(raw: &[Value]) -> Vec<PollOption> {
    raw.iter()
        .enumerate()
        .filter_map(|(index, option)| match option {
            Value::String(text) => Some(PollOption {
                text: text.clone(),
                order: index as u64,
            }),
            Value::Object(fields) => {
                let text = fields
                    .get("text")
                    .and_then(Value::as_str)
                    .filter(|text| !text.is_empty())?;
                let order = fields
                    .get("order")
                    .and_then(Value::as_u64)
                    .unwrap_or(index as u64);
                Some(PollOption {
                    text: text.to_owned(),
                    order,
                })
            }
            _ => None,
        })
        .collect()
}
