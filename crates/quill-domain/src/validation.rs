//! Submission validation for articles and comments
//!
//! Raw input is kept as submitted so a rejected form can be shown back to
//! the user unchanged. Validation trims surrounding whitespace and reports
//! every failing field at once.

use crate::article::Article;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;

/// Maximum title length in characters
pub const TITLE_MAX_CHARS: usize = 255;

const REQUIRED: &str = "This field is required.";

/// Field-level validation messages, keyed by field name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    fields: BTreeMap<String, Vec<String>>,
}

impl FieldErrors {
    /// Create an empty error set
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message against a field
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.fields
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    /// True when no field has failed
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Messages for one field
    pub fn get(&self, field: &str) -> &[String] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Iterate over failing fields in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    fn into_result<T>(self, value: T) -> Result<T, FieldErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.fields {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{}: {}", field, message)?;
                first = false;
            }
        }
        Ok(())
    }
}

impl Error for FieldErrors {}

/// Raw article submission (create or edit)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleForm {
    /// Submitted title
    pub title: String,

    /// Submitted body
    pub body: String,
}

/// Validated article fields, trimmed and within limits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleFields {
    /// Non-empty title of at most [`TITLE_MAX_CHARS`] characters
    pub title: String,

    /// Non-empty body
    pub body: String,
}

impl ArticleForm {
    /// Create a form from raw input
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }

    /// Validate the submission
    ///
    /// # Examples
    ///
    /// ```
    /// use quill_domain::ArticleForm;
    ///
    /// let fields = ArticleForm::new(" Hello ", "World").validate().unwrap();
    /// assert_eq!(fields.title, "Hello");
    ///
    /// let errors = ArticleForm::new("", "").validate().unwrap_err();
    /// assert_eq!(errors.get("title").len(), 1);
    /// assert_eq!(errors.get("body").len(), 1);
    /// ```
    pub fn validate(&self) -> Result<ArticleFields, FieldErrors> {
        let mut errors = FieldErrors::new();

        let title = self.title.trim();
        if title.is_empty() {
            errors.add("title", REQUIRED);
        } else {
            let len = title.chars().count();
            if len > TITLE_MAX_CHARS {
                errors.add(
                    "title",
                    format!(
                        "Ensure this value has at most {} characters (it has {}).",
                        TITLE_MAX_CHARS, len
                    ),
                );
            }
        }

        let body = self.body.trim();
        if body.is_empty() {
            errors.add("body", REQUIRED);
        }

        errors.into_result(ArticleFields {
            title: title.to_string(),
            body: body.to_string(),
        })
    }
}

impl From<&Article> for ArticleForm {
    fn from(article: &Article) -> Self {
        Self::new(article.title.clone(), article.body.clone())
    }
}

/// Raw comment submission
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentForm {
    /// Submitted comment text
    pub body: String,
}

impl CommentForm {
    /// Create a form from raw input
    pub fn new(body: impl Into<String>) -> Self {
        Self { body: body.into() }
    }

    /// Validate the submission, returning the trimmed body
    pub fn validate(&self) -> Result<String, FieldErrors> {
        let mut errors = FieldErrors::new();
        let body = self.body.trim();
        if body.is_empty() {
            errors.add("body", REQUIRED);
        }
        errors.into_result(body.to_string())
    }
}
