use thiserror::Error;

pub const DEFAULT_MAX_COMMENT_LENGTH: usize = 2000;

/// Reasons a comment body is rejected before submission.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommentBodyError {
    #[error("comment cannot be empty")]
    Empty,
    #[error("comment cannot exceed {max} characters (got {len})")]
    TooLong { len: usize, max: usize },
}

/// Trims a comment body and checks it against the length limit.
pub fn validate_comment_body(body: &str, max_length: usize) -> Result<String, CommentBodyError> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Err(CommentBodyError::Empty);
    }

    let len = trimmed.chars().count();
    if len > max_length {
        return Err(CommentBodyError::TooLong {
            len,
            max: max_length,
        });
    }

    Ok(trimmed.to_owned())
}
