//! Comment module - replies attached to an article

use crate::article::ArticleId;
use crate::principal::UserId;
use std::fmt;

/// Unique identifier for a comment
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CommentId(i64);

impl CommentId {
    /// Create a CommentId from a raw value
    pub fn from_value(value: i64) -> Self {
        Self(value)
    }

    /// Get the raw value
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for CommentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A comment on an article
///
/// Comments are immutable. They disappear only when their article is
/// deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    /// Unique identifier
    pub id: CommentId,

    /// Article this comment belongs to
    pub article: ArticleId,

    /// Principal that wrote the comment
    pub author: UserId,

    /// Comment text
    pub body: String,

    /// Creation time (Unix epoch milliseconds)
    pub created_at: u64,
}
