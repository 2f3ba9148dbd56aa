//! Quill Domain Layer
//!
//! This crate contains the data model and business rules for Quill.
//! It has ZERO external dependencies and defines the records, store
//! interfaces, and the two rules every other layer relies on: who may
//! mutate an article, and what a valid submission looks like.
//!
//! ## Key Concepts
//!
//! - **Article**: a titled post owned by the principal that wrote it
//! - **Comment**: a reply bound to exactly one article and one author
//! - **Principal**: an authenticated user identity
//! - **Owner**: the principal recorded as an article's author
//!
//! ## Architecture
//!
//! - No external crate dependencies
//! - Pure business logic only
//! - Persistence lives in `quill-store`, HTTP in `quill-server`
//! - Trait definitions for all storage interactions

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod article;
pub mod authorization;
pub mod comment;
pub mod principal;
pub mod traits;
pub mod validation;

// Re-exports for convenience
pub use article::{Article, ArticleId};
pub use authorization::can_mutate;
pub use comment::{Comment, CommentId};
pub use principal::{Principal, UserId};
pub use validation::{ArticleFields, ArticleForm, CommentForm, FieldErrors};
