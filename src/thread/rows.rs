use crate::domain::{CommentNode, ThreadRow};

/// Depth at which the reply affordance is hidden.
pub const DEFAULT_MAX_COMMENT_DEPTH: usize = 5;

/// Flattens ranked threads into pre-order display rows.
pub fn flatten_thread(roots: &[CommentNode], max_depth: usize) -> Vec<ThreadRow> {
    let mut rows = Vec::new();
    let mut stack: Vec<(&CommentNode, usize)> = roots.iter().rev().map(|root| (root, 0)).collect();

    while let Some((node, depth)) = stack.pop() {
        rows.push(ThreadRow {
            depth,
            can_reply: depth < max_depth,
            comment: node.comment.clone(),
        });
        stack.extend(node.replies.iter().rev().map(|reply| (reply, depth + 1)));
    }

    rows
}
