//! HTTP request handlers for the Quill service.
//!
//! Every article route sits behind [`require_login`]. Edit and delete also
//! pass the ownership guard before touching the store. Successful form
//! posts answer with a redirect so a client refresh repeats a harmless GET.

use crate::error::AppError;
use crate::guard::{owned_article, parse_article_id, require_login};
use crate::render::{
    article_url, found, render, ArticleDeleteContext, ArticleDetailContext, ArticleFormContext,
    ArticleListContext, ArticleView, CommentView, FormView, LoginContext,
};
use crate::session::{IdentityProvider, SessionManager};
use axum::{
    extract::{OriginalUri, Path, Query, State},
    http::{header, StatusCode},
    middleware,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Extension, Form, Router as AxumRouter,
};
use quill_domain::traits::{ArticleStore, CommentStore};
use quill_domain::{can_mutate, Article, ArticleForm, Comment, CommentForm, FieldErrors, Principal};
use quill_store::{SqliteStore, StoreError};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Article and comment persistence
    pub store: Arc<Mutex<SqliteStore>>,
    /// Resolves requests to principals
    pub identity: Arc<dyn IdentityProvider>,
    /// Issues session tokens
    pub sessions: Arc<SessionManager>,
    /// Where unauthenticated requests are redirected
    pub login_url: String,
}

impl AppState {
    /// Build state where the session manager is also the identity provider
    pub fn new(store: SqliteStore, sessions: SessionManager, login_url: impl Into<String>) -> Self {
        let sessions = Arc::new(sessions);
        Self {
            store: Arc::new(Mutex::new(store)),
            identity: sessions.clone(),
            sessions,
            login_url: login_url.into(),
        }
    }

    fn store(&self) -> Result<MutexGuard<'_, SqliteStore>, AppError> {
        self.store
            .lock()
            .map_err(|_| AppError::Internal("store lock poisoned".to_string()))
    }
}

/// Submitted article fields
#[derive(Debug, Default, Deserialize)]
pub struct ArticleInput {
    /// Title as typed
    #[serde(default)]
    pub title: String,
    /// Body as typed
    #[serde(default)]
    pub body: String,
}

/// Submitted comment
#[derive(Debug, Default, Deserialize)]
pub struct CommentInput {
    /// Comment text as typed
    #[serde(default)]
    pub body: String,
}

/// Query string of the login page
#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    /// Page to return to after login
    pub next: Option<String>,
}

/// Session establishment request
#[derive(Debug, Deserialize)]
pub struct EstablishSessionRequest {
    /// Configured username
    pub username: String,
}

/// Session establishment response
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    /// JWT session token
    pub token: String,
    /// Username the token was issued to
    pub username: String,
    /// Token lifetime in seconds
    pub expires_in: u64,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthCheckResponse {
    /// "healthy" or "degraded"
    pub status: String,
    /// Number of stored articles, when the store answered
    pub articles: Option<usize>,
}

fn render_detail(
    principal: &Principal,
    article: &Article,
    comments: Vec<Comment>,
    comment_form: FormView,
) -> Response {
    render(
        "article_detail.html",
        ArticleDetailContext {
            article: ArticleView::from(article),
            comments: comments.into_iter().map(CommentView::from).collect(),
            comment_form,
            user: principal.display_name.clone(),
            can_edit: can_mutate(principal, article),
        },
    )
}

fn render_article_form(
    template: &'static str,
    article: Option<&Article>,
    form: &ArticleForm,
    errors: Option<&FieldErrors>,
) -> Response {
    render(
        template,
        ArticleFormContext {
            article: article.map(ArticleView::from),
            form: FormView::article(form, errors),
        },
    )
}

/// GET / - Redirect to the article list
async fn index() -> Response {
    found("/articles")
}

/// GET /articles - List all articles
async fn list_articles(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Response, AppError> {
    let articles = state.store()?.list_articles()?;

    Ok(render(
        "article_list.html",
        ArticleListContext {
            username: principal.display_name,
            articles: articles.iter().map(ArticleView::from).collect(),
        },
    ))
}

/// GET /articles/:id - Show an article, its comments, and an empty comment form
async fn view_article(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(raw_id): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_article_id(&raw_id)?;
    let store = state.store()?;
    let article = store.get_article(id)?;
    let comments = store.list_comments(id)?;

    Ok(render_detail(
        &principal,
        &article,
        comments,
        FormView::comment(&CommentForm::default(), None),
    ))
}

/// POST /articles/:id - Add a comment, then redirect back to the article
async fn post_comment(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(raw_id): Path<String>,
    OriginalUri(uri): OriginalUri,
    Form(input): Form<CommentInput>,
) -> Result<Response, AppError> {
    let id = parse_article_id(&raw_id)?;
    let mut store = state.store()?;
    let article = store.get_article(id)?;

    match store.create_comment(article.id, &principal.id, &input.body) {
        Ok(_) => Ok(found(uri.path())),
        Err(StoreError::Validation(errors)) => {
            let comments = store.list_comments(id)?;
            let form = CommentForm::new(input.body);
            Ok(render_detail(
                &principal,
                &article,
                comments,
                FormView::comment(&form, Some(&errors)),
            ))
        }
        Err(e) => Err(e.into()),
    }
}

/// GET /articles/new - Empty article form
async fn new_article_form(Extension(_principal): Extension<Principal>) -> Response {
    render_article_form("article_new.html", None, &ArticleForm::default(), None)
}

/// POST /articles/new - Create an article owned by the caller
async fn create_article(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Form(input): Form<ArticleInput>,
) -> Result<Response, AppError> {
    let mut store = state.store()?;

    match store.create_article(&principal.id, &input.title, &input.body) {
        Ok(article) => Ok(found(article_url(&article))),
        Err(StoreError::Validation(errors)) => {
            let form = ArticleForm::new(input.title, input.body);
            Ok(render_article_form(
                "article_new.html",
                None,
                &form,
                Some(&errors),
            ))
        }
        Err(e) => Err(e.into()),
    }
}

/// GET /articles/:id/edit - Form prefilled with the current article
async fn edit_article_form(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(raw_id): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_article_id(&raw_id)?;
    let store = state.store()?;
    let article = owned_article(&store, id, &principal)?;

    Ok(render_article_form(
        "article_edit.html",
        Some(&article),
        &ArticleForm::from(&article),
        None,
    ))
}

/// POST /articles/:id/edit - Replace title and body
async fn update_article(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(raw_id): Path<String>,
    Form(input): Form<ArticleInput>,
) -> Result<Response, AppError> {
    let id = parse_article_id(&raw_id)?;
    let mut store = state.store()?;
    let article = owned_article(&store, id, &principal)?;

    match store.update_article(article.id, &input.title, &input.body) {
        Ok(updated) => Ok(found(article_url(&updated))),
        Err(StoreError::Validation(errors)) => {
            let form = ArticleForm::new(input.title, input.body);
            Ok(render_article_form(
                "article_edit.html",
                Some(&article),
                &form,
                Some(&errors),
            ))
        }
        Err(e) => Err(e.into()),
    }
}

/// GET /articles/:id/delete - Confirmation page
async fn delete_article_confirm(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(raw_id): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_article_id(&raw_id)?;
    let store = state.store()?;
    let article = owned_article(&store, id, &principal)?;

    Ok(render(
        "article_delete.html",
        ArticleDeleteContext {
            article: ArticleView::from(&article),
        },
    ))
}

/// POST /articles/:id/delete - Delete the article and its comments
async fn delete_article(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(raw_id): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_article_id(&raw_id)?;
    let mut store = state.store()?;
    let article = owned_article(&store, id, &principal)?;

    store.delete_article(article.id)?;

    Ok(found("/articles"))
}

/// GET /login - Explain how to obtain a session
async fn login_page(Query(query): Query<LoginQuery>) -> Response {
    render(
        "login.html",
        LoginContext {
            next: query.next,
            establish_url: "/session/establish".to_string(),
        },
    )
}

/// POST /session/establish - Issue a session token and cookie
async fn establish_session(
    State(state): State<AppState>,
    Json(request): Json<EstablishSessionRequest>,
) -> Result<Response, AppError> {
    let username = request.username.trim();
    let token = state.sessions.generate_token(username)?;
    let cookie = state.sessions.session_cookie(&token);

    info!(user = %username, "Session established");

    let body = Json(SessionResponse {
        token,
        username: username.to_string(),
        expires_in: state.sessions.token_expiry_secs(),
    });
    Ok(([(header::SET_COOKIE, cookie)], body).into_response())
}

/// POST /session/logout - Drop the session cookie
async fn logout(State(state): State<AppState>) -> Response {
    (
        StatusCode::FOUND,
        [
            (header::LOCATION, state.login_url.clone()),
            (header::SET_COOKIE, SessionManager::clear_cookie()),
        ],
    )
        .into_response()
}

/// GET /health - Store reachability
async fn health_check(State(state): State<AppState>) -> Json<HealthCheckResponse> {
    let articles = state
        .store()
        .ok()
        .and_then(|store| store.count_articles().ok());

    let status = if articles.is_some() {
        "healthy"
    } else {
        "degraded"
    };

    Json(HealthCheckResponse {
        status: status.to_string(),
        articles,
    })
}

/// Create the axum router with all routes
pub fn create_router(state: AppState) -> AxumRouter {
    let articles = AxumRouter::new()
        .route("/articles", get(list_articles))
        .route("/articles/new", get(new_article_form).post(create_article))
        .route("/articles/:id", get(view_article).post(post_comment))
        .route(
            "/articles/:id/edit",
            get(edit_article_form).post(update_article),
        )
        .route(
            "/articles/:id/delete",
            get(delete_article_confirm).post(delete_article),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_login));

    AxumRouter::new()
        .route("/", get(index))
        .route("/login", get(login_page))
        .route("/session/establish", post(establish_session))
        .route("/session/logout", post(logout))
        .route("/health", get(health_check))
        .merge(articles)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt; // for oneshot

    fn create_test_state() -> AppState {
        let config = ServerConfig::default_test_config();
        let sessions =
            SessionManager::new(&config.jwt_secret, config.token_expiry_secs).with_users(&config.users);
        AppState::new(SqliteStore::new(":memory:").unwrap(), sessions, "/login")
    }

    #[tokio::test]
    async fn test_health_check() {
        let app = create_router(create_test_state());

        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_index_redirects_to_list() {
        let app = create_router(create_test_state());

        let request = Request::builder().uri("/").body(Body::empty()).unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/articles");
    }

    #[tokio::test]
    async fn test_establish_session() {
        let app = create_router(create_test_state());

        let request = Request::builder()
            .method("POST")
            .uri("/session/establish")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"username": "alice"}"#))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(header::SET_COOKIE).is_some());
    }

    #[tokio::test]
    async fn test_establish_session_trims_username() {
        let app = create_router(create_test_state());

        let request = Request::builder()
            .method("POST")
            .uri("/session/establish")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"username": "  alice "}"#))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let session: SessionResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(session.username, "alice");
    }

    #[tokio::test]
    async fn test_establish_session_unknown_user() {
        let app = create_router(create_test_state());

        let request = Request::builder()
            .method("POST")
            .uri("/session/establish")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"username": "mallory"}"#))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_list_requires_login() {
        let app = create_router(create_test_state());

        let request = Request::builder()
            .uri("/articles")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/login?next=%2Farticles"
        );
    }
}
