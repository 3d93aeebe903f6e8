//! PostgreSQL-backed repository.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{comment_repo, follow_repo, group_repo, post_repo, user_repo, BlogRepository};
use crate::error::Result;
use crate::models::{Comment, Group, NewComment, NewGroup, NewPost, Post, PostChanges, PostFilter, User};

#[derive(Clone)]
pub struct PgBlogRepository {
    pool: PgPool,
}

impl PgBlogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BlogRepository for PgBlogRepository {
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(user_repo::find_user_by_username(&self.pool, username).await?)
    }

    async fn create_user(&self, username: &str) -> Result<User> {
        Ok(user_repo::create_user(&self.pool, username).await?)
    }

    async fn find_group_by_slug(&self, slug: &str) -> Result<Option<Group>> {
        Ok(group_repo::find_group_by_slug(&self.pool, slug).await?)
    }

    async fn find_group_by_id(&self, group_id: i64) -> Result<Option<Group>> {
        Ok(group_repo::find_group_by_id(&self.pool, group_id).await?)
    }

    async fn list_groups(&self) -> Result<Vec<Group>> {
        Ok(group_repo::list_groups(&self.pool).await?)
    }

    async fn create_group(&self, group: NewGroup) -> Result<Group> {
        Ok(group_repo::create_group(&self.pool, &group).await?)
    }

    async fn create_post(&self, post: NewPost) -> Result<Post> {
        Ok(post_repo::create_post(&self.pool, &post).await?)
    }

    async fn find_post(&self, post_id: i64) -> Result<Option<Post>> {
        Ok(post_repo::find_post_by_id(&self.pool, post_id).await?)
    }

    async fn update_post(&self, post_id: i64, changes: PostChanges) -> Result<Option<Post>> {
        Ok(post_repo::update_post(&self.pool, post_id, &changes).await?)
    }

    async fn count_posts(&self, filter: PostFilter) -> Result<i64> {
        Ok(post_repo::count_posts(&self.pool, filter).await?)
    }

    async fn list_posts(&self, filter: PostFilter, limit: i64, offset: i64) -> Result<Vec<Post>> {
        Ok(post_repo::list_posts(&self.pool, filter, limit, offset).await?)
    }

    async fn create_comment(&self, comment: NewComment) -> Result<Comment> {
        Ok(comment_repo::create_comment(&self.pool, &comment).await?)
    }

    async fn list_comments(&self, post_id: i64) -> Result<Vec<Comment>> {
        Ok(comment_repo::find_comments_by_post(&self.pool, post_id).await?)
    }

    async fn is_following(&self, user_id: Uuid, author_id: Uuid) -> Result<bool> {
        Ok(follow_repo::is_following(&self.pool, user_id, author_id).await?)
    }

    async fn create_follow(&self, user_id: Uuid, author_id: Uuid) -> Result<bool> {
        Ok(follow_repo::create_follow(&self.pool, user_id, author_id).await?)
    }

    async fn delete_follow(&self, user_id: Uuid, author_id: Uuid) -> Result<bool> {
        Ok(follow_repo::delete_follow(&self.pool, user_id, author_id).await?)
    }

    async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }
}
