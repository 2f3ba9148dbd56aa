//! Per-route preconditions: login required, and ownership for mutations.

use crate::error::AppError;
use crate::handlers::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use quill_domain::traits::ArticleStore;
use quill_domain::{can_mutate, Article, ArticleId, Principal};
use quill_store::SqliteStore;
use tracing::{debug, warn};

/// Middleware: attach the authenticated [`Principal`] or redirect to login
///
/// Handlers behind this layer extract the principal with
/// `Extension<Principal>`.
pub async fn require_login(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    match state.identity.authenticate(request.headers()) {
        Ok(principal) => {
            debug!(user = %principal.id, path = %request.uri().path(), "Authenticated");
            request.extensions_mut().insert(principal);
            next.run(request).await
        }
        Err(e) => {
            let target = request
                .uri()
                .path_and_query()
                .map(|pq| pq.as_str())
                .unwrap_or("/");
            debug!(reason = %e, path = target, "Redirecting to login");
            AppError::Unauthenticated {
                location: login_location(&state.login_url, target),
            }
            .into_response()
        }
    }
}

/// Login URL carrying the page to return to
pub fn login_location(login_url: &str, next: &str) -> String {
    let next: String = form_urlencoded::byte_serialize(next.as_bytes()).collect();
    format!("{}?next={}", login_url, next)
}

/// Parse an article id from a path segment; unparseable ids are missing ids
pub fn parse_article_id(raw: &str) -> Result<ArticleId, AppError> {
    ArticleId::parse(raw).ok_or(AppError::NotFound)
}

/// Fetch an article the principal is allowed to mutate
///
/// Lookup happens before the ownership check, so a missing article is
/// `NotFound` for everyone.
pub fn owned_article(
    store: &SqliteStore,
    id: ArticleId,
    principal: &Principal,
) -> Result<Article, AppError> {
    let article = store.get_article(id)?;
    if !can_mutate(principal, &article) {
        warn!(
            article_id = %id,
            user = %principal.id,
            owner = %article.author,
            "Mutation denied: not the author"
        );
        return Err(AppError::Forbidden);
    }
    Ok(article)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_domain::UserId;

    #[test]
    fn test_login_location_encodes_next() {
        assert_eq!(
            login_location("/login", "/articles/1/edit"),
            "/login?next=%2Farticles%2F1%2Fedit"
        );
        assert_eq!(
            login_location("/login", "/articles?x=a b"),
            "/login?next=%2Farticles%3Fx%3Da+b"
        );
    }

    #[test]
    fn test_parse_article_id() {
        assert!(parse_article_id("1").is_ok());
        assert!(matches!(parse_article_id("new-post"), Err(AppError::NotFound)));
    }

    #[test]
    fn test_owned_article_checks_author() {
        let mut store = SqliteStore::new(":memory:").unwrap();
        let alice = Principal::new(UserId::new("alice").unwrap());
        let bob = Principal::new(UserId::new("bob").unwrap());
        let article = store.create_article(&alice.id, "Hello", "World").unwrap();

        assert!(owned_article(&store, article.id, &alice).is_ok());
        assert!(matches!(
            owned_article(&store, article.id, &bob),
            Err(AppError::Forbidden)
        ));
        assert!(matches!(
            owned_article(&store, ArticleId::from_value(99), &bob),
            Err(AppError::NotFound)
        ));
    }
}
