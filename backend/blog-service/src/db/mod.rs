/// Database access layer for blog-service
///
/// [`BlogRepository`] is the persistence seam the services depend on. Two backends exist:
/// - [`PgBlogRepository`]: PostgreSQL via sqlx, built from the `*_repo` query modules
/// - [`InMemoryBlogRepository`]: process-local tables for development and tests
pub mod comment_repo;
pub mod follow_repo;
pub mod group_repo;
pub mod memory;
pub mod post_repo;
pub mod postgres;
pub mod user_repo;

pub use memory::InMemoryBlogRepository;
pub use postgres::PgBlogRepository;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::error::Result;
use crate::models::{Comment, Group, NewComment, NewGroup, NewPost, Post, PostChanges, PostFilter, User};

/// Persistence operations needed by the feed assembler and the mutation services.
///
/// Every method is a single atomic statement against the store.
#[async_trait]
pub trait BlogRepository: Send + Sync {
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>>;

    async fn create_user(&self, username: &str) -> Result<User>;

    async fn find_group_by_slug(&self, slug: &str) -> Result<Option<Group>>;

    async fn find_group_by_id(&self, group_id: i64) -> Result<Option<Group>>;

    /// All groups ordered by title
    async fn list_groups(&self) -> Result<Vec<Group>>;

    async fn create_group(&self, group: NewGroup) -> Result<Group>;

    async fn create_post(&self, post: NewPost) -> Result<Post>;

    async fn find_post(&self, post_id: i64) -> Result<Option<Post>>;

    /// Overwrite text, group and image in place. Returns `None` if the post is gone.
    async fn update_post(&self, post_id: i64, changes: PostChanges) -> Result<Option<Post>>;

    async fn count_posts(&self, filter: PostFilter) -> Result<i64>;

    /// Posts matching `filter`, newest first (`created_at DESC, id DESC`)
    async fn list_posts(&self, filter: PostFilter, limit: i64, offset: i64) -> Result<Vec<Post>>;

    async fn create_comment(&self, comment: NewComment) -> Result<Comment>;

    /// Comments of one post in creation order
    async fn list_comments(&self, post_id: i64) -> Result<Vec<Comment>>;

    async fn is_following(&self, user_id: Uuid, author_id: Uuid) -> Result<bool>;

    /// Returns true if a new edge was inserted
    async fn create_follow(&self, user_id: Uuid, author_id: Uuid) -> Result<bool>;

    /// Returns true if an edge was removed
    async fn delete_follow(&self, user_id: Uuid, author_id: Uuid) -> Result<bool>;

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}

/// Create the PostgreSQL pool from service configuration
pub async fn create_pool(config: &DatabaseConfig) -> std::result::Result<PgPool, sqlx::Error> {
    info!(
        "Database Pool Configuration: max_connections={}, min_connections={}, acquire_timeout={}s",
        config.max_connections, config.min_connections, config.acquire_timeout_secs
    );

    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(&config.url)
        .await
}

/// Apply the embedded schema migrations
pub async fn run_migrations(pool: &PgPool) -> std::result::Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
