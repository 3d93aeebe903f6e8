/// Blog Service Library
///
/// Serves the Yatube blog: posts optionally filed under groups, comments on posts and
/// follow edges between users that drive a personalized feed. The rendered global index
/// is cached for a short, fixed window.
///
/// # Modules
///
/// - `handlers`: HTTP views and route table
/// - `models`: Users, groups, posts, comments, follows and submitted forms
/// - `services`: Feed assembly and mutations
/// - `db`: Repository trait with PostgreSQL and in-memory backends
/// - `cache`: Rendered page cache (Redis or in-memory)
/// - `middleware`: Session authentication, permission checks, request metrics
/// - `render`: Template rendering seam
/// - `pagination`: Page-number pagination shared by every feed
/// - `error`: Error types and their HTTP mapping
/// - `config`: Configuration management
/// - `metrics`: Prometheus collectors
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod pagination;
pub mod render;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};

use actix_web::HttpResponse;
use bytes::Bytes;
use serde_json::Value;
use std::sync::Arc;

use cache::IndexPageCache;
use db::BlogRepository;
use render::Renderer;
use services::{CommentService, FeedService, FollowService, PostService};

/// Shared state handed to every handler through `web::Data`.
pub struct AppState {
    pub repo: Arc<dyn BlogRepository>,
    pub pages: Arc<IndexPageCache>,
    pub renderer: Arc<dyn Renderer>,
    /// Where anonymous callers of protected views are sent
    pub login_url: String,
}

impl AppState {
    pub fn new(
        repo: Arc<dyn BlogRepository>,
        pages: Arc<IndexPageCache>,
        renderer: Arc<dyn Renderer>,
        login_url: impl Into<String>,
    ) -> Self {
        Self {
            repo,
            pages,
            renderer,
            login_url: login_url.into(),
        }
    }

    pub fn feeds(&self) -> FeedService {
        FeedService::new(self.repo.clone())
    }

    pub fn posts(&self) -> PostService {
        PostService::new(self.repo.clone())
    }

    pub fn comments(&self) -> CommentService {
        CommentService::new(self.repo.clone())
    }

    pub fn follows(&self) -> FollowService {
        FollowService::new(self.repo.clone(), self.login_url.clone())
    }

    /// 200 response carrying an already rendered body.
    pub fn page_response(&self, body: Bytes) -> HttpResponse {
        HttpResponse::Ok()
            .content_type(self.renderer.content_type())
            .body(body)
    }

    pub fn render(&self, template: &str, context: &Value) -> Result<HttpResponse> {
        let body = self.renderer.render(template, context)?;
        Ok(self.page_response(body))
    }
}
