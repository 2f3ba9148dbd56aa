//! Article module - the unit of published content

use crate::principal::UserId;
use std::fmt;

/// Unique identifier for an article
///
/// Ids are positive integers assigned by the store on creation and are
/// never reused, so ordering by id matches creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArticleId(i64);

impl ArticleId {
    /// Create an ArticleId from a raw value
    ///
    /// This is primarily for storage layer deserialization.
    pub fn from_value(value: i64) -> Self {
        Self(value)
    }

    /// Parse an ArticleId from a path segment
    ///
    /// Only positive decimal integers are accepted; anything else cannot
    /// name an article.
    ///
    /// # Examples
    ///
    /// ```
    /// use quill_domain::ArticleId;
    ///
    /// assert_eq!(ArticleId::parse("42").unwrap().value(), 42);
    /// assert!(ArticleId::parse("0").is_none());
    /// assert!(ArticleId::parse("hello-world").is_none());
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        s.parse::<i64>().ok().filter(|v| *v > 0).map(Self)
    }

    /// Get the raw value
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for ArticleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An article - a titled post owned by its author
///
/// `author` and `created_at` are fixed at creation. Only `title`, `body`
/// and `updated_at` change over the article's life.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    /// Unique identifier
    pub id: ArticleId,

    /// Short headline
    pub title: String,

    /// Full text
    pub body: String,

    /// Principal that created the article
    pub author: UserId,

    /// Creation time (Unix epoch milliseconds)
    pub created_at: u64,

    /// Last edit time (Unix epoch milliseconds)
    pub updated_at: u64,
}

impl Article {
    /// Whether the article has been edited since creation
    pub fn is_edited(&self) -> bool {
        self.updated_at > self.created_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_article_id_ordering() {
        let id1 = ArticleId::from_value(1);
        let id2 = ArticleId::from_value(2);

        assert!(id1 < id2);
    }

    #[test]
    fn test_article_id_parse_rejects_non_numeric() {
        assert!(ArticleId::parse("").is_none());
        assert!(ArticleId::parse("-1").is_none());
        assert!(ArticleId::parse("+1").is_none());
        assert!(ArticleId::parse("1.5").is_none());
        assert!(ArticleId::parse("99999999999999999999").is_none());
    }

    #[test]
    fn test_article_id_display() {
        assert_eq!(ArticleId::from_value(7).to_string(), "7");
    }

    #[test]
    fn test_is_edited() {
        let mut article = Article {
            id: ArticleId::from_value(1),
            title: "Hello".to_string(),
            body: "World".to_string(),
            author: UserId::new("alice").unwrap(),
            created_at: 1000,
            updated_at: 1000,
        };
        assert!(!article.is_edited());

        article.updated_at = 2000;
        assert!(article.is_edited());
    }
}
