//! Quill Storage Layer
//!
//! Implements the `ArticleStore` and `CommentStore` traits on SQLite.
//!
//! # Architecture
//!
//! - One `articles` table and one `comments` table (see `schema.sql`)
//! - Ids come from `AUTOINCREMENT`, so they are never reused
//! - Deleting an article removes its comments in the same transaction
//!
//! # Examples
//!
//! ```no_run
//! use quill_store::SqliteStore;
//!
//! let store = SqliteStore::new(":memory:").unwrap();
//! // Store is now ready for article operations
//! ```

#![warn(missing_docs)]

use quill_domain::traits::{ArticleStore, CommentStore};
use quill_domain::{
    Article, ArticleForm, ArticleId, Comment, CommentForm, CommentId, FieldErrors, UserId,
};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::{debug, info};

const ARTICLE_COLUMNS: &str = "id, title, body, author, created_at, updated_at";
const COMMENT_COLUMNS: &str = "id, article_id, author, body, created_at";

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Article not found
    #[error("Article not found: {0}")]
    ArticleNotFound(ArticleId),

    /// Submitted fields failed validation
    #[error("Validation failed: {0}")]
    Validation(#[from] FieldErrors),

    /// Invalid data format
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl StoreError {
    /// Whether this error means the requested record does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::ArticleNotFound(_))
    }
}

/// SQLite-based implementation of the article and comment stores
///
/// # Thread Safety
///
/// SQLite connections are not `Sync`. Share one store between tasks behind
/// a `Mutex`, or give each thread its own `SqliteStore`.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Create a new SqliteStore with the given database path
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use quill_store::SqliteStore;
    ///
    /// let store = SqliteStore::new("quill.db").unwrap();
    /// ```
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let mut store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Initialize connection settings and the database schema
    fn initialize_schema(&mut self) -> Result<(), StoreError> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        self.conn.busy_timeout(Duration::from_secs(5))?;
        self.conn.execute_batch(include_str!("schema.sql"))?;
        debug!("Schema initialized");
        Ok(())
    }

    fn now_millis() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }

    fn user_id_from_column(idx: usize, value: String) -> rusqlite::Result<UserId> {
        UserId::new(value).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                idx,
                rusqlite::types::Type::Text,
                Box::new(StoreError::InvalidData("empty author".to_string())),
            )
        })
    }

    fn article_from_row(row: &Row<'_>) -> rusqlite::Result<Article> {
        Ok(Article {
            id: ArticleId::from_value(row.get(0)?),
            title: row.get(1)?,
            body: row.get(2)?,
            author: Self::user_id_from_column(3, row.get(3)?)?,
            created_at: row.get::<_, i64>(4)? as u64,
            updated_at: row.get::<_, i64>(5)? as u64,
        })
    }

    fn comment_from_row(row: &Row<'_>) -> rusqlite::Result<Comment> {
        Ok(Comment {
            id: CommentId::from_value(row.get(0)?),
            article: ArticleId::from_value(row.get(1)?),
            author: Self::user_id_from_column(2, row.get(2)?)?,
            body: row.get(3)?,
            created_at: row.get::<_, i64>(4)? as u64,
        })
    }

    fn article_exists(conn: &Connection, id: ArticleId) -> Result<bool, StoreError> {
        let exists = conn
            .query_row(
                "SELECT 1 FROM articles WHERE id = ?1",
                params![id.value()],
                |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false);
        Ok(exists)
    }
}

impl ArticleStore for SqliteStore {
    type Error = StoreError;

    fn list_articles(&self) -> Result<Vec<Article>, Self::Error> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ARTICLE_COLUMNS} FROM articles ORDER BY created_at DESC, id DESC"
        ))?;
        let articles = stmt
            .query_map([], Self::article_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(articles)
    }

    fn get_article(&self, id: ArticleId) -> Result<Article, Self::Error> {
        self.conn
            .query_row(
                &format!("SELECT {ARTICLE_COLUMNS} FROM articles WHERE id = ?1"),
                params![id.value()],
                Self::article_from_row,
            )
            .optional()?
            .ok_or(StoreError::ArticleNotFound(id))
    }

    fn create_article(
        &mut self,
        author: &UserId,
        title: &str,
        body: &str,
    ) -> Result<Article, Self::Error> {
        let fields = ArticleForm::new(title, body).validate()?;
        let now = Self::now_millis();

        self.conn.execute(
            "INSERT INTO articles (title, body, author, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)",
            params![&fields.title, &fields.body, author.as_str(), now as i64],
        )?;
        let id = ArticleId::from_value(self.conn.last_insert_rowid());

        info!(article_id = %id, author = %author, "Article created");
        self.get_article(id)
    }

    fn update_article(
        &mut self,
        id: ArticleId,
        title: &str,
        body: &str,
    ) -> Result<Article, Self::Error> {
        let fields = ArticleForm::new(title, body).validate()?;
        let now = Self::now_millis();

        // author and created_at are never written after insert
        let changed = self.conn.execute(
            "UPDATE articles
             SET title = ?2, body = ?3, updated_at = MAX(created_at, ?4)
             WHERE id = ?1",
            params![id.value(), &fields.title, &fields.body, now as i64],
        )?;
        if changed == 0 {
            return Err(StoreError::ArticleNotFound(id));
        }

        info!(article_id = %id, "Article updated");
        self.get_article(id)
    }

    fn delete_article(&mut self, id: ArticleId) -> Result<(), Self::Error> {
        let tx = self.conn.transaction()?;

        let comments = tx.execute(
            "DELETE FROM comments WHERE article_id = ?1",
            params![id.value()],
        )?;
        let articles = tx.execute("DELETE FROM articles WHERE id = ?1", params![id.value()])?;
        if articles == 0 {
            // dropping the transaction rolls it back
            return Err(StoreError::ArticleNotFound(id));
        }
        tx.commit()?;

        info!(article_id = %id, comments, "Article deleted");
        Ok(())
    }

    fn count_articles(&self) -> Result<usize, Self::Error> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM articles", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

impl CommentStore for SqliteStore {
    type Error = StoreError;

    fn list_comments(&self, article: ArticleId) -> Result<Vec<Comment>, Self::Error> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE article_id = ?1 ORDER BY id ASC"
        ))?;
        let comments = stmt
            .query_map(params![article.value()], Self::comment_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(comments)
    }

    fn create_comment(
        &mut self,
        article: ArticleId,
        author: &UserId,
        body: &str,
    ) -> Result<Comment, Self::Error> {
        let body = CommentForm::new(body).validate()?;
        let now = Self::now_millis();

        let tx = self.conn.transaction()?;
        if !Self::article_exists(&tx, article)? {
            return Err(StoreError::ArticleNotFound(article));
        }
        tx.execute(
            "INSERT INTO comments (article_id, author, body, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![article.value(), author.as_str(), &body, now as i64],
        )?;
        let id = CommentId::from_value(tx.last_insert_rowid());
        tx.commit()?;

        info!(article_id = %article, comment_id = %id, author = %author, "Comment created");
        Ok(Comment {
            id,
            article,
            author: author.clone(),
            body,
            created_at: now,
        })
    }

    fn count_comments(&self, article: ArticleId) -> Result<usize, Self::Error> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM comments WHERE article_id = ?1",
            params![article.value()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}
