//! Page rendering and redirects.
//!
//! A rendered page is a JSON envelope naming the template and carrying the
//! context a template would receive. The context types below are the
//! contract between handlers and whatever draws the pages.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use quill_domain::{Article, ArticleForm, Comment, CommentForm, FieldErrors};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Rendered page envelope
#[derive(Debug, Serialize)]
pub struct Page<T> {
    /// Template name
    pub template: &'static str,
    /// Template context
    pub context: T,
}

/// Render `context` with `template` as a 200 response
pub fn render<T: Serialize>(template: &'static str, context: T) -> Response {
    Json(Page { template, context }).into_response()
}

/// 302 redirect to `location`
pub fn found(location: impl Into<String>) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.into())]).into_response()
}

/// Canonical path of an article's detail page
pub fn article_url(article: &Article) -> String {
    format!("/articles/{}", article.id)
}

/// Article as shown on pages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleView {
    /// Article id
    pub id: i64,
    /// Title
    pub title: String,
    /// Body
    pub body: String,
    /// Author's user id
    pub author: String,
    /// Creation time (epoch ms)
    pub created_at: u64,
    /// Last edit time (epoch ms)
    pub updated_at: u64,
    /// Changed since creation
    pub edited: bool,
    /// Detail page path
    pub url: String,
}

impl From<&Article> for ArticleView {
    fn from(article: &Article) -> Self {
        Self {
            id: article.id.value(),
            title: article.title.clone(),
            body: article.body.clone(),
            author: article.author.to_string(),
            created_at: article.created_at,
            updated_at: article.updated_at,
            edited: article.is_edited(),
            url: article_url(article),
        }
    }
}

/// Comment as shown on pages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentView {
    /// Comment id
    pub id: i64,
    /// Author's user id
    pub author: String,
    /// Text
    pub body: String,
    /// Creation time (epoch ms)
    pub created_at: u64,
}

impl From<Comment> for CommentView {
    fn from(comment: Comment) -> Self {
        Self {
            id: comment.id.value(),
            author: comment.author.to_string(),
            body: comment.body,
            created_at: comment.created_at,
        }
    }
}

/// Form state: submitted values plus per-field errors
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FormView {
    /// Field values as submitted (or prefilled)
    pub values: BTreeMap<String, String>,
    /// Messages per failing field
    pub errors: BTreeMap<String, Vec<String>>,
}

impl FormView {
    fn with_errors(mut self, errors: Option<&FieldErrors>) -> Self {
        if let Some(errors) = errors {
            for (field, messages) in errors.iter() {
                self.errors.insert(field.to_string(), messages.to_vec());
            }
        }
        self
    }

    /// Article form state
    pub fn article(form: &ArticleForm, errors: Option<&FieldErrors>) -> Self {
        let mut values = BTreeMap::new();
        values.insert("title".to_string(), form.title.clone());
        values.insert("body".to_string(), form.body.clone());
        Self {
            values,
            errors: BTreeMap::new(),
        }
        .with_errors(errors)
    }

    /// Comment form state
    pub fn comment(form: &CommentForm, errors: Option<&FieldErrors>) -> Self {
        let mut values = BTreeMap::new();
        values.insert("body".to_string(), form.body.clone());
        Self {
            values,
            errors: BTreeMap::new(),
        }
        .with_errors(errors)
    }
}

/// Context for `article_list.html`
#[derive(Debug, Serialize, Deserialize)]
pub struct ArticleListContext {
    /// Display name of the viewer
    pub username: String,
    /// All articles, newest first
    pub articles: Vec<ArticleView>,
}

/// Context for `article_detail.html`
#[derive(Debug, Serialize, Deserialize)]
pub struct ArticleDetailContext {
    /// The article
    pub article: ArticleView,
    /// Its comments, oldest first
    pub comments: Vec<CommentView>,
    /// Comment form state
    pub comment_form: FormView,
    /// Display name of the viewer
    pub user: String,
    /// Whether the viewer may edit or delete
    pub can_edit: bool,
}

/// Context for `article_new.html` and `article_edit.html`
#[derive(Debug, Serialize, Deserialize)]
pub struct ArticleFormContext {
    /// Article being edited, absent when creating
    pub article: Option<ArticleView>,
    /// Form state
    pub form: FormView,
}

/// Context for `article_delete.html`
#[derive(Debug, Serialize, Deserialize)]
pub struct ArticleDeleteContext {
    /// Article awaiting confirmation
    pub article: ArticleView,
}

/// Context for `login.html`
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginContext {
    /// Page to return to after login
    pub next: Option<String>,
    /// Endpoint that issues session tokens
    pub establish_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_domain::{ArticleId, UserId};

    #[test]
    fn test_found_sets_location() {
        let response = found("/articles/3");
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/articles/3");
    }

    #[test]
    fn test_form_view_keeps_raw_input() {
        let form = ArticleForm::new("  ", "draft body");
        let errors = form.validate().unwrap_err();
        let view = FormView::article(&form, Some(&errors));

        assert_eq!(view.values["title"], "  ");
        assert_eq!(view.values["body"], "draft body");
        assert_eq!(view.errors["title"], vec!["This field is required."]);
        assert!(!view.errors.contains_key("body"));
    }

    #[test]
    fn test_article_view_url() {
        let article = Article {
            id: ArticleId::from_value(12),
            title: "t".to_string(),
            body: "b".to_string(),
            author: UserId::new("alice").unwrap(),
            created_at: 1,
            updated_at: 1,
        };
        let view = ArticleView::from(&article);
        assert_eq!(view.url, "/articles/12");
        assert_eq!(view.author, "alice");
        assert!(!view.edited);
    }

    #[test]
    fn test_article_view_marks_edits() {
        let article = Article {
            id: ArticleId::from_value(3),
            title: "t".to_string(),
            body: "b".to_string(),
            author: UserId::new("alice").unwrap(),
            created_at: 1_000,
            updated_at: 5_000,
        };
        assert!(ArticleView::from(&article).edited);
    }
}
