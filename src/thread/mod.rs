//! Comment thread construction and popularity ranking.

mod body;
mod rows;

pub use body::{CommentBodyError, DEFAULT_MAX_COMMENT_LENGTH, validate_comment_body};
pub use rows::{DEFAULT_MAX_COMMENT_DEPTH, flatten_thread};

use crate::domain::{Comment, CommentNode, PowerUp};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

#[derive(Debug)]
struct BuildNode {
    comment: Comment,
    replies: Vec<String>,
}

/// Builds ranked reply trees from a flat list of comments for one item.
///
/// Replies whose parent is missing from `comments` are dropped together with
/// their subtree. A comment naming itself as parent is treated as a root.
/// Siblings are ordered by [`popularity_order`] at every depth.
pub fn build_comment_tree(comments: Vec<Comment>) -> Vec<CommentNode> {
    let mut nodes: HashMap<String, BuildNode> = HashMap::with_capacity(comments.len());
    let mut parent_links: Vec<(String, Option<String>)> = Vec::with_capacity(comments.len());

    for comment in comments {
        if nodes.contains_key(&comment.id) {
            tracing::debug!(comment = %comment.id, "ignoring repeated comment id");
            continue;
        }

        let id = comment.id.clone();
        let parent_id = comment.effective_parent().map(str::to_owned);
        nodes.insert(
            id.clone(),
            BuildNode {
                comment,
                replies: Vec::new(),
            },
        );
        parent_links.push((id, parent_id));
    }

    let mut root_ids = Vec::new();
    for (id, parent_id) in parent_links {
        match parent_id {
            Some(parent_id) => match nodes.get_mut(&parent_id) {
                Some(parent) => parent.replies.push(id),
                None => {
                    tracing::debug!(comment = %id, parent = %parent_id, "dropping reply without parent");
                }
            },
            None => root_ids.push(id),
        }
    }

    let mut roots: Vec<CommentNode> = root_ids
        .into_iter()
        .filter_map(|id| materialize_thread(id, &mut nodes))
        .collect();
    roots.sort_by(|a, b| popularity_order(&a.comment, &b.comment));

    if !nodes.is_empty() {
        tracing::debug!(unreachable = nodes.len(), "dropped comments outside any root thread");
    }

    roots
}

#[derive(Debug)]
struct PendingNode {
    comment: Comment,
    reply_ids: std::vec::IntoIter<String>,
    replies: Vec<CommentNode>,
}

impl PendingNode {
    fn new(node: BuildNode) -> Self {
        Self {
            comment: node.comment,
            reply_ids: node.replies.into_iter(),
            replies: Vec::new(),
        }
    }

    fn finish(mut self) -> CommentNode {
        self.replies.sort_by(|a, b| popularity_order(&a.comment, &b.comment));
        CommentNode {
            comment: self.comment,
            replies: self.replies,
        }
    }
}

/// Assembles one thread bottom-up with an explicit stack. Each node is removed
/// from `nodes` when first reached.
fn materialize_thread(
    root_id: String,
    nodes: &mut HashMap<String, BuildNode>,
) -> Option<CommentNode> {
    let root = nodes.remove(&root_id)?;
    let mut stack = vec![PendingNode::new(root)];

    loop {
        let current = stack.last_mut()?;
        if let Some(reply_id) = current.reply_ids.next() {
            if let Some(reply) = nodes.remove(&reply_id) {
                stack.push(PendingNode::new(reply));
            }
            continue;
        }

        let finished = stack.pop()?.finish();
        match stack.last_mut() {
            Some(parent) => parent.replies.push(finished),
            None => return Some(finished),
        }
    }
}

/// Sibling ordering: most popular first, then newest first, then by id.
pub fn popularity_order(a: &Comment, b: &Comment) -> Ordering {
    b.popularity
        .cmp(&a.popularity)
        .then_with(|| b.created_at.cmp(&a.created_at))
        .then_with(|| a.id.cmp(&b.id))
}

/// Sets each comment's popularity from the power-up relation.
///
/// Repeated `{comment, user}` rows count once.
pub fn attach_popularity(comments: &mut [Comment], power_ups: &[PowerUp]) {
    let mut voters: HashMap<&str, HashSet<&str>> = HashMap::new();
    for power_up in power_ups {
        voters
            .entry(power_up.comment_id.as_str())
            .or_default()
            .insert(power_up.user_id.as_str());
    }

    for comment in comments {
        comment.popularity = voters
            .get(comment.id.as_str())
            .map(|users| u32::try_from(users.len()).unwrap_or(u32::MAX))
            .unwrap_or(0);
    }
}

/// Drops soft-deleted comments.
pub fn without_deleted(comments: Vec<Comment>) -> Vec<Comment> {
    comments
        .into_iter()
        .filter(|comment| !comment.is_deleted())
        .collect()
}

pub fn visible_comment_count(comments: &[Comment]) -> usize {
    comments
        .iter()
        .filter(|comment| !comment.is_deleted())
        .count()
}

/// Returns `id` followed by every transitive reply, in pre-order.
///
/// Empty when `id` is not present in `comments`.
pub fn cascade_delete_targets(comments: &[Comment], id: &str) -> Vec<String> {
    if !comments.iter().any(|comment| comment.id == id) {
        return Vec::new();
    }

    let mut children: HashMap<&str, Vec<&str>> = HashMap::new();
    for comment in comments {
        if let Some(parent) = comment.effective_parent() {
            children.entry(parent).or_default().push(comment.id.as_str());
        }
    }

    let mut targets = Vec::new();
    let mut visited = HashSet::new();
    let mut stack = vec![id];

    while let Some(current) = stack.pop() {
        if !visited.insert(current) {
            continue;
        }
        targets.push(current.to_owned());

        if let Some(replies) = children.get(current) {
            stack.extend(replies.iter().rev().copied());
        }
    }

    targets
}

#[cfg(test)]
pub(crate) mod tests {
    use super::{
        DEFAULT_MAX_COMMENT_DEPTH, attach_popularity, build_comment_tree, cascade_delete_targets,
        flatten_thread, visible_comment_count, without_deleted,
    };
    use crate::domain::{Comment, CommentNode, ItemRef, PowerUp};
    use chrono::{DateTime, Duration, TimeZone, Utc};

    pub(crate) fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 1, 12, 0, 0).unwrap()
    }

    pub(crate) fn comment(id: &str, parent: Option<&str>, popularity: u32, minute: i64) -> Comment {
        Comment {
            id: id.to_owned(),
            parent_id: parent.map(str::to_owned),
            item: ItemRef::Post("post-1".to_owned()),
            author_id: format!("user-{id}"),
            body: format!("comment {id}"),
            created_at: base_time() + Duration::minutes(minute),
            is_edited: false,
            deleted_at: None,
            popularity,
        }
    }

    fn ids(nodes: &[CommentNode]) -> Vec<&str> {
        nodes.iter().map(|node| node.comment.id.as_str()).collect()
    }

    #[test]
    fn builds_reply_under_parent() {
        let comments = vec![comment("1", None, 0, 0), comment("2", Some("1"), 0, 1)];
        let roots = build_comment_tree(comments);

        assert_eq!(ids(&roots), vec!["1"]);
        assert_eq!(ids(&roots[0].replies), vec!["2"]);
    }

    #[test]
    fn orphan_reply_is_dropped() {
        let comments = vec![
            comment("1", None, 0, 0),
            comment("5", Some("999"), 0, 1),
            comment("6", Some("5"), 0, 2),
        ];
        let roots = build_comment_tree(comments);

        assert_eq!(ids(&roots), vec!["1"]);
        assert!(roots[0].replies.is_empty());
    }

    #[test]
    fn self_parent_becomes_root() {
        let comments = vec![comment("7", Some("7"), 0, 0), comment("8", Some("7"), 0, 1)];
        let roots = build_comment_tree(comments);

        assert_eq!(ids(&roots), vec!["7"]);
        assert_eq!(ids(&roots[0].replies), vec!["8"]);
    }

    #[test]
    fn parent_cycle_is_dropped_without_recursing_forever() {
        let comments = vec![
            comment("a", Some("b"), 0, 0),
            comment("b", Some("a"), 0, 1),
            comment("root", None, 0, 2),
        ];
        let roots = build_comment_tree(comments);

        assert_eq!(ids(&roots), vec!["root"]);
    }

    #[test]
    fn siblings_rank_by_popularity_then_recency_at_every_depth() {
        let comments = vec![
            comment("old-root", None, 1, 0),
            comment("popular-root", None, 5, 1),
            comment("new-root", None, 1, 2),
            comment("reply-quiet", Some("popular-root"), 0, 3),
            comment("reply-loud", Some("popular-root"), 3, 4),
            comment("reply-newer", Some("popular-root"), 0, 5),
            comment("deep-old", Some("reply-loud"), 2, 6),
            comment("deep-new", Some("reply-loud"), 2, 7),
        ];
        let roots = build_comment_tree(comments);

        assert_eq!(ids(&roots), vec!["popular-root", "new-root", "old-root"]);
        assert_eq!(
            ids(&roots[0].replies),
            vec!["reply-loud", "reply-newer", "reply-quiet"]
        );
        assert_eq!(ids(&roots[0].replies[0].replies), vec!["deep-new", "deep-old"]);
    }

    #[test]
    fn input_order_does_not_change_output() {
        let comments = vec![
            comment("1", None, 2, 0),
            comment("2", Some("1"), 0, 1),
            comment("3", Some("1"), 0, 1),
            comment("4", None, 2, 0),
        ];
        let mut reversed = comments.clone();
        reversed.reverse();

        assert_eq!(build_comment_tree(comments.clone()), build_comment_tree(reversed));
        assert_eq!(build_comment_tree(comments.clone()), build_comment_tree(comments));
    }

    #[test]
    fn every_reachable_comment_appears_once() {
        let comments = vec![
            comment("1", None, 0, 0),
            comment("2", Some("1"), 0, 1),
            comment("3", Some("2"), 0, 2),
            comment("4", Some("missing"), 0, 3),
            comment("1", None, 9, 4),
        ];
        let roots = build_comment_tree(comments);
        let total: usize = roots.iter().map(CommentNode::total_comments).sum();

        assert_eq!(total, 3);
        assert_eq!(roots[0].comment.popularity, 0);
    }

    #[test]
    fn long_reply_chain_builds_without_overflow() {
        const DEPTH: usize = 100_000;
        let mut comments = vec![comment("0", None, 0, 0)];
        for index in 1..DEPTH {
            let parent = (index - 1).to_string();
            comments.push(comment(&index.to_string(), Some(parent.as_str()), 0, 0));
        }
        comments.reverse();

        let roots = build_comment_tree(comments);

        assert_eq!(ids(&roots), vec!["0"]);
        assert_eq!(roots[0].total_comments(), DEPTH);

        let rows = flatten_thread(&roots, DEFAULT_MAX_COMMENT_DEPTH);
        assert_eq!(rows.len(), DEPTH);
        assert_eq!(rows[DEPTH - 1].comment.id, (DEPTH - 1).to_string());
        assert_eq!(rows[DEPTH - 1].depth, DEPTH - 1);
        assert!(!rows[DEPTH - 1].can_reply);
    }

    #[test]
    fn attach_popularity_counts_distinct_users() {
        let mut comments = vec![comment("1", None, 42, 0), comment("2", None, 0, 1)];
        let power_ups = vec![
            PowerUp {
                comment_id: "1".to_owned(),
                user_id: "alice".to_owned(),
            },
            PowerUp {
                comment_id: "1".to_owned(),
                user_id: "alice".to_owned(),
            },
            PowerUp {
                comment_id: "1".to_owned(),
                user_id: "bob".to_owned(),
            },
            PowerUp {
                comment_id: "unknown".to_owned(),
                user_id: "carol".to_owned(),
            },
        ];

        attach_popularity(&mut comments, &power_ups);

        assert_eq!(comments[0].popularity, 2);
        assert_eq!(comments[1].popularity, 0);
    }

    #[test]
    fn deleted_comments_are_not_counted() {
        let mut deleted = comment("2", Some("1"), 0, 1);
        deleted.deleted_at = Some(base_time());
        let comments = vec![comment("1", None, 0, 0), deleted, comment("3", Some("2"), 0, 2)];

        assert_eq!(visible_comment_count(&comments), 2);
        let remaining = without_deleted(comments);
        assert_eq!(remaining.len(), 2);
        assert!(remaining.iter().all(|comment| comment.id != "2"));
    }

    #[test]
    fn cascade_collects_whole_subtree_in_pre_order() {
        let comments = vec![
            comment("1", None, 0, 0),
            comment("2", Some("1"), 0, 1),
            comment("3", Some("2"), 0, 2),
            comment("4", Some("1"), 0, 3),
            comment("5", None, 0, 4),
        ];

        assert_eq!(cascade_delete_targets(&comments, "1"), vec!["1", "2", "3", "4"]);
        assert_eq!(cascade_delete_targets(&comments, "5"), vec!["5"]);
        assert!(cascade_delete_targets(&comments, "missing").is_empty());
    }
}
