//! Shared fixtures for HTTP-level tests
//!
//! Every test gets its own in-memory repository and page cache, so no PostgreSQL or
//! Redis is needed. `init_app!` builds the same App the binary serves, minus logging.
#![allow(dead_code)]

use actix_web::web;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use blog_service::cache::{IndexPageCache, InMemoryPageCache};
use blog_service::db::{BlogRepository, InMemoryBlogRepository};
use blog_service::middleware::JwtKeys;
use blog_service::models::{Group, NewGroup, NewPost, Post, User};
use blog_service::render::JsonRenderer;
use blog_service::AppState;

pub const TEST_SECRET: &str = "blog-service-test-secret";
pub const LOGIN_URL: &str = "/auth/login/";

pub struct TestApp {
    pub repo: Arc<InMemoryBlogRepository>,
    pub cache: Arc<InMemoryPageCache>,
    pub pages: Arc<IndexPageCache>,
    pub state: web::Data<AppState>,
    pub keys: Arc<JwtKeys>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_ttl(Duration::from_secs(20))
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        let repo = Arc::new(InMemoryBlogRepository::new());
        let cache = Arc::new(InMemoryPageCache::new());
        let pages = Arc::new(IndexPageCache::new(cache.clone(), ttl));
        let state = web::Data::new(AppState::new(
            repo.clone(),
            pages.clone(),
            Arc::new(JsonRenderer),
            LOGIN_URL,
        ));

        Self {
            repo,
            cache,
            pages,
            state,
            keys: Arc::new(JwtKeys::from_secret(TEST_SECRET)),
        }
    }

    pub async fn user(&self, username: &str) -> User {
        self.repo.create_user(username).await.unwrap()
    }

    pub async fn group(&self, slug: &str, title: &str) -> Group {
        self.repo
            .create_group(NewGroup {
                title: title.to_string(),
                slug: slug.to_string(),
                description: format!("About {}", title),
            })
            .await
            .unwrap()
    }

    pub async fn post(&self, author: &User, text: &str, group: Option<&Group>) -> Post {
        self.repo
            .create_post(NewPost {
                author_id: author.id,
                text: text.to_string(),
                group_id: group.map(|g| g.id),
                image: None,
            })
            .await
            .unwrap()
    }

    /// `Authorization` header value for `user`
    pub fn bearer(&self, user: &User) -> (&'static str, String) {
        let token = self.keys.issue_token(user.id, &user.username).unwrap();
        ("Authorization", format!("Bearer {}", token))
    }

    pub fn session_cookie(&self, user: &User) -> actix_web::cookie::Cookie<'static> {
        let token = self.keys.issue_token(user.id, &user.username).unwrap();
        actix_web::cookie::Cookie::new(blog_service::config::DEFAULT_SESSION_COOKIE, token)
    }
}

/// Build the routed service for a [`TestApp`].
#[macro_export]
macro_rules! init_app {
    ($fixture:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data($fixture.state.clone())
                .wrap(blog_service::middleware::SessionAuth::new(
                    $fixture.keys.clone(),
                    blog_service::config::DEFAULT_SESSION_COOKIE,
                ))
                .configure(blog_service::handlers::configure_routes)
                .default_service(actix_web::web::to(blog_service::handlers::not_found)),
        )
        .await
    };
}

/// Parse a rendered page (`{"template": ..., "context": ...}`)
pub fn rendered(body: &[u8]) -> Value {
    serde_json::from_slice(body).unwrap()
}

/// Texts of the posts on a rendered page, in display order
pub fn page_texts(page: &Value) -> Vec<String> {
    page["context"]["page_obj"]["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|post| post["text"].as_str().unwrap().to_string())
        .collect()
}

pub fn location<B>(resp: &actix_web::dev::ServiceResponse<B>) -> String {
    resp.headers()
        .get(actix_web::http::header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string()
}
