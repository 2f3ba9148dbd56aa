//! Ownership rule for article mutation

use crate::article::Article;
use crate::principal::Principal;

/// Whether `principal` may edit or delete `article`
///
/// Only the author may mutate an article. The check is pure; callers
/// fetch the article first so a missing article is reported as such
/// rather than as a denial.
///
/// # Examples
///
/// ```
/// use quill_domain::{can_mutate, Article, ArticleId, Principal, UserId};
///
/// let alice = Principal::new(UserId::new("alice").unwrap());
/// let bob = Principal::new(UserId::new("bob").unwrap());
/// let article = Article {
///     id: ArticleId::from_value(1),
///     title: "Hello".into(),
///     body: "World".into(),
///     author: alice.id.clone(),
///     created_at: 0,
///     updated_at: 0,
/// };
///
/// assert!(can_mutate(&alice, &article));
/// assert!(!can_mutate(&bob, &article));
/// ```
pub fn can_mutate(principal: &Principal, article: &Article) -> bool {
    principal.id == article.author
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ArticleId, UserId};
    use proptest::prelude::*;

    fn article_by(author: &str) -> Article {
        Article {
            id: ArticleId::from_value(1),
            title: "t".to_string(),
            body: "b".to_string(),
            author: UserId::new(author).unwrap(),
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn test_display_name_does_not_grant_ownership() {
        let article = article_by("alice");
        let impostor = Principal::with_display_name(UserId::new("mallory").unwrap(), "alice");
        assert!(!can_mutate(&impostor, &article));
    }

    #[test]
    fn test_comparison_is_case_sensitive() {
        let article = article_by("alice");
        let other = Principal::new(UserId::new("Alice").unwrap());
        assert!(!can_mutate(&other, &article));
    }

    proptest! {
        /// Property: the gate passes exactly when the ids are equal
        #[test]
        fn test_gate_matches_id_equality(author in "[a-z]{1,8}", caller in "[a-z]{1,8}") {
            let article = article_by(&author);
            let principal = Principal::new(UserId::new(caller.clone()).unwrap());
            prop_assert_eq!(can_mutate(&principal, &article), author == caller);
        }
    }
}
