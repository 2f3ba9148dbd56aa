//! Trait definitions for storage interactions
//!
//! These traits define the boundary between domain logic and persistence.
//! Implementations live in other crates.

use crate::{Article, ArticleId, Comment, UserId};

/// Trait for storing and retrieving articles
///
/// Implemented by the infrastructure layer (quill-store)
pub trait ArticleStore {
    /// Error type for store operations
    type Error;

    /// All articles, newest first
    fn list_articles(&self) -> Result<Vec<Article>, Self::Error>;

    /// Get an article by ID, failing if it does not exist
    fn get_article(&self, id: ArticleId) -> Result<Article, Self::Error>;

    /// Create an article owned by `author`
    fn create_article(
        &mut self,
        author: &UserId,
        title: &str,
        body: &str,
    ) -> Result<Article, Self::Error>;

    /// Replace an article's title and body
    ///
    /// Callers must have checked ownership already.
    fn update_article(&mut self, id: ArticleId, title: &str, body: &str)
        -> Result<Article, Self::Error>;

    /// Delete an article together with all of its comments
    fn delete_article(&mut self, id: ArticleId) -> Result<(), Self::Error>;

    /// Number of stored articles
    fn count_articles(&self) -> Result<usize, Self::Error>;
}

/// Trait for storing and retrieving comments
///
/// Implemented by the infrastructure layer (quill-store)
pub trait CommentStore {
    /// Error type for store operations
    type Error;

    /// Comments for one article, in the order they were written
    fn list_comments(&self, article: ArticleId) -> Result<Vec<Comment>, Self::Error>;

    /// Add a comment to an existing article
    fn create_comment(
        &mut self,
        article: ArticleId,
        author: &UserId,
        body: &str,
    ) -> Result<Comment, Self::Error>;

    /// Number of comments on one article
    fn count_comments(&self, article: ArticleId) -> Result<usize, Self::Error>;
}
