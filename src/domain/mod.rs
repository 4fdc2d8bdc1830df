//! Domain models shared across the thread, dedup, generation and render layers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The post or poll a comment is attached to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ItemRef {
    Post(String),
    Poll(String),
}

impl ItemRef {
    pub fn id(&self) -> &str {
        match self {
            Self::Post(id) | Self::Poll(id) => id.as_str(),
        }
    }
}

impl fmt::Display for ItemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Post(id) => write!(f, "post:{id}"),
            Self::Poll(id) => write!(f, "poll:{id}"),
        }
    }
}

/// A user-authored comment as stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    pub item: ItemRef,
    pub author_id: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub is_edited: bool,
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
    /// Number of distinct users who powered up this comment. Supplied by the caller.
    #[serde(default)]
    pub popularity: u32,
}

impl Comment {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Returns the parent id, treating a self-reference as no parent.
    pub fn effective_parent(&self) -> Option<&str> {
        self.parent_id
            .as_deref()
            .filter(|parent| *parent != self.id.as_str())
    }
}

/// A comment with its ranked replies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentNode {
    pub comment: Comment,
    pub replies: Vec<CommentNode>,
}

impl CommentNode {
    pub fn total_comments(&self) -> usize {
        let mut total = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            total += 1;
            stack.extend(node.replies.iter());
        }
        total
    }
}

// Reply chains can be arbitrarily deep; unlink them before dropping.
impl Drop for CommentNode {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.replies);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.replies);
        }
    }
}

/// One row of the power-up relation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PowerUp {
    pub comment_id: String,
    pub user_id: String,
}

/// A flattened thread row for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadRow {
    pub depth: usize,
    pub can_reply: bool,
    pub comment: Comment,
}
