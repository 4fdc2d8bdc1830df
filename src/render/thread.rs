//! Plain-text rendering of ranked comment threads.

use crate::domain::{CommentNode, ThreadRow};
use crate::thread::flatten_thread;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Renders ranked threads as indented text lines.
///
/// Replies past `max_depth` are still shown; only the `[reply]` marker is
/// withheld.
pub fn render_thread(roots: &[CommentNode], max_depth: usize, now: DateTime<Utc>) -> Vec<String> {
    let mut out = Vec::new();
    for row in flatten_thread(roots, max_depth) {
        render_row(&mut out, &row, now);
    }
    out
}

fn render_row(out: &mut Vec<String>, row: &ThreadRow, now: DateTime<Utc>) {
    let indent = "  ".repeat(row.depth);
    let comment = &row.comment;

    let mut header = format!(
        "{indent}@{}  +{}  {}",
        comment.author_id,
        comment.popularity,
        short_age(comment.created_at, now)
    );
    if comment.is_edited {
        header.push_str("  (edited)");
    }
    out.push(header);

    for line in comment.body.lines() {
        out.push(format!("{indent}  {line}"));
    }

    if row.can_reply {
        out.push(format!("{indent}  [reply]"));
    }
}

/// Formats the age of a timestamp as its most significant unit, e.g. "3h ago".
pub fn short_age(created_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let age_secs = (now - created_at).num_seconds().max(0) as u64;
    let minutes = age_secs / 60;
    if minutes == 0 {
        return "just now".to_owned();
    }

    let formatted = humantime::format_duration(Duration::from_secs(minutes * 60)).to_string();
    let unit = formatted.split_whitespace().next().unwrap_or("?");
    format!("{unit} ago")
}
