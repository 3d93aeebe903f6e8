//! In-memory repository used for local development (`BLOG_STORAGE=memory`) and tests.
//!
//! Mirrors the Postgres schema constraints that matter to the services: unique usernames
//! and slugs, foreign keys on author/group/post, `no_self_user` and `unique_follow`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::BlogRepository;
use crate::error::{AppError, Result};
use crate::models::{
    Comment, Follow, Group, NewComment, NewGroup, NewPost, Post, PostChanges, PostFilter, User,
};

#[derive(Debug, Clone)]
struct PostRow {
    id: i64,
    text: String,
    created_at: DateTime<Utc>,
    image: Option<String>,
    author_id: Uuid,
    group_id: Option<i64>,
}

#[derive(Debug, Clone)]
struct CommentRow {
    id: i64,
    post_id: i64,
    author_id: Uuid,
    text: String,
    created_at: DateTime<Utc>,
}

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    groups: Vec<Group>,
    posts: Vec<PostRow>,
    comments: Vec<CommentRow>,
    follows: Vec<Follow>,
    next_group_id: i64,
    next_post_id: i64,
    next_comment_id: i64,
    next_follow_id: i64,
}

fn next_id(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

impl Tables {
    fn user(&self, user_id: Uuid) -> Option<&User> {
        self.users.iter().find(|u| u.id == user_id)
    }

    fn group(&self, group_id: i64) -> Option<&Group> {
        self.groups.iter().find(|g| g.id == group_id)
    }

    fn check_group_reference(&self, group_id: Option<i64>) -> Result<()> {
        match group_id {
            Some(id) if self.group(id).is_none() => Err(AppError::Database(format!(
                "foreign key violation: group {} does not exist",
                id
            ))),
            _ => Ok(()),
        }
    }

    fn hydrate_post(&self, row: &PostRow) -> Result<Post> {
        let author = self.user(row.author_id).ok_or_else(|| {
            AppError::Database(format!("post {} references a missing author", row.id))
        })?;
        let group = row.group_id.and_then(|id| self.group(id));

        Ok(Post {
            id: row.id,
            text: row.text.clone(),
            created_at: row.created_at,
            image: row.image.clone(),
            author_id: row.author_id,
            author_username: author.username.clone(),
            group_id: row.group_id,
            group_slug: group.map(|g| g.slug.clone()),
            group_title: group.map(|g| g.title.clone()),
        })
    }

    fn hydrate_comment(&self, row: &CommentRow) -> Result<Comment> {
        let author = self.user(row.author_id).ok_or_else(|| {
            AppError::Database(format!("comment {} references a missing author", row.id))
        })?;

        Ok(Comment {
            id: row.id,
            post_id: row.post_id,
            author_id: row.author_id,
            author_username: author.username.clone(),
            text: row.text.clone(),
            created_at: row.created_at,
        })
    }

    fn matches(&self, row: &PostRow, filter: PostFilter) -> bool {
        match filter {
            PostFilter::All => true,
            PostFilter::Group(group_id) => row.group_id == Some(group_id),
            PostFilter::Author(author_id) => row.author_id == author_id,
            PostFilter::FollowedBy(user_id) => self
                .follows
                .iter()
                .any(|f| f.user_id == user_id && f.author_id == row.author_id),
        }
    }
}

#[derive(Default)]
pub struct InMemoryBlogRepository {
    tables: RwLock<Tables>,
}

impl InMemoryBlogRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BlogRepository for InMemoryBlogRepository {
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.username == username).cloned())
    }

    async fn create_user(&self, username: &str) -> Result<User> {
        let mut tables = self.tables.write().await;
        if tables.users.iter().any(|u| u.username == username) {
            return Err(AppError::Database(format!(
                "unique violation: username '{}' already exists",
                username
            )));
        }

        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            created_at: Utc::now(),
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn find_group_by_slug(&self, slug: &str) -> Result<Option<Group>> {
        let tables = self.tables.read().await;
        Ok(tables.groups.iter().find(|g| g.slug == slug).cloned())
    }

    async fn find_group_by_id(&self, group_id: i64) -> Result<Option<Group>> {
        let tables = self.tables.read().await;
        Ok(tables.group(group_id).cloned())
    }

    async fn list_groups(&self) -> Result<Vec<Group>> {
        let tables = self.tables.read().await;
        let mut groups = tables.groups.clone();
        groups.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
        Ok(groups)
    }

    async fn create_group(&self, group: NewGroup) -> Result<Group> {
        let mut tables = self.tables.write().await;
        if tables.groups.iter().any(|g| g.slug == group.slug) {
            return Err(AppError::Database(format!(
                "unique violation: group slug '{}' already exists",
                group.slug
            )));
        }

        let group = Group {
            id: next_id(&mut tables.next_group_id),
            title: group.title,
            slug: group.slug,
            description: group.description,
        };
        tables.groups.push(group.clone());
        Ok(group)
    }

    async fn create_post(&self, post: NewPost) -> Result<Post> {
        let mut tables = self.tables.write().await;
        if tables.user(post.author_id).is_none() {
            return Err(AppError::Database(format!(
                "foreign key violation: author {} does not exist",
                post.author_id
            )));
        }
        tables.check_group_reference(post.group_id)?;

        let row = PostRow {
            id: next_id(&mut tables.next_post_id),
            text: post.text,
            created_at: Utc::now(),
            image: post.image,
            author_id: post.author_id,
            group_id: post.group_id,
        };
        tables.posts.push(row.clone());
        tables.hydrate_post(&row)
    }

    async fn find_post(&self, post_id: i64) -> Result<Option<Post>> {
        let tables = self.tables.read().await;
        tables
            .posts
            .iter()
            .find(|p| p.id == post_id)
            .map(|row| tables.hydrate_post(row))
            .transpose()
    }

    async fn update_post(&self, post_id: i64, changes: PostChanges) -> Result<Option<Post>> {
        let mut tables = self.tables.write().await;
        tables.check_group_reference(changes.group_id)?;

        let Some(row) = tables.posts.iter_mut().find(|p| p.id == post_id) else {
            return Ok(None);
        };
        row.text = changes.text;
        row.group_id = changes.group_id;
        row.image = changes.image;
        let row = row.clone();

        tables.hydrate_post(&row).map(Some)
    }

    async fn count_posts(&self, filter: PostFilter) -> Result<i64> {
        let tables = self.tables.read().await;
        let count = tables
            .posts
            .iter()
            .filter(|row| tables.matches(row, filter))
            .count();
        Ok(count as i64)
    }

    async fn list_posts(&self, filter: PostFilter, limit: i64, offset: i64) -> Result<Vec<Post>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<&PostRow> = tables
            .posts
            .iter()
            .filter(|row| tables.matches(row, filter))
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        rows.into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .map(|row| tables.hydrate_post(row))
            .collect()
    }

    async fn create_comment(&self, comment: NewComment) -> Result<Comment> {
        let mut tables = self.tables.write().await;
        if !tables.posts.iter().any(|p| p.id == comment.post_id) {
            return Err(AppError::Database(format!(
                "foreign key violation: post {} does not exist",
                comment.post_id
            )));
        }
        if tables.user(comment.author_id).is_none() {
            return Err(AppError::Database(format!(
                "foreign key violation: author {} does not exist",
                comment.author_id
            )));
        }

        let row = CommentRow {
            id: next_id(&mut tables.next_comment_id),
            post_id: comment.post_id,
            author_id: comment.author_id,
            text: comment.text,
            created_at: Utc::now(),
        };
        tables.comments.push(row.clone());
        tables.hydrate_comment(&row)
    }

    async fn list_comments(&self, post_id: i64) -> Result<Vec<Comment>> {
        let tables = self.tables.read().await;
        tables
            .comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .map(|row| tables.hydrate_comment(row))
            .collect()
    }

    async fn is_following(&self, user_id: Uuid, author_id: Uuid) -> Result<bool> {
        let tables = self.tables.read().await;
        Ok(tables
            .follows
            .iter()
            .any(|f| f.user_id == user_id && f.author_id == author_id))
    }

    async fn create_follow(&self, user_id: Uuid, author_id: Uuid) -> Result<bool> {
        if user_id == author_id {
            return Err(AppError::Database(
                "check violation: no_self_user".to_string(),
            ));
        }

        let mut tables = self.tables.write().await;
        if tables
            .follows
            .iter()
            .any(|f| f.user_id == user_id && f.author_id == author_id)
        {
            return Ok(false);
        }

        let follow = Follow {
            id: next_id(&mut tables.next_follow_id),
            user_id,
            author_id,
            created_at: Utc::now(),
        };
        tables.follows.push(follow);
        Ok(true)
    }

    async fn delete_follow(&self, user_id: Uuid, author_id: Uuid) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.follows.len();
        tables
            .follows
            .retain(|f| !(f.user_id == user_id && f.author_id == author_id));
        Ok(tables.follows.len() < before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_post(author_id: Uuid, text: &str, group_id: Option<i64>) -> NewPost {
        NewPost {
            author_id,
            text: text.to_string(),
            group_id,
            image: None,
        }
    }

    #[tokio::test]
    async fn posts_are_listed_newest_first_with_id_tiebreak() {
        let repo = InMemoryBlogRepository::new();
        let author = repo.create_user("author").await.unwrap();
        for i in 0..3 {
            repo.create_post(new_post(author.id, &format!("post {}", i), None))
                .await
                .unwrap();
        }

        let posts = repo.list_posts(PostFilter::All, 10, 0).await.unwrap();
        let texts: Vec<&str> = posts.iter().map(|p| p.text.as_str()).collect();
        assert_eq!(texts, vec!["post 2", "post 1", "post 0"]);
        assert!(posts.iter().all(|p| p.author_username == "author"));
    }

    #[tokio::test]
    async fn follow_constraints_match_the_schema() {
        let repo = InMemoryBlogRepository::new();
        let a = repo.create_user("a").await.unwrap();
        let b = repo.create_user("b").await.unwrap();

        assert!(repo.create_follow(a.id, a.id).await.is_err());
        assert!(repo.create_follow(a.id, b.id).await.unwrap());
        assert!(!repo.create_follow(a.id, b.id).await.unwrap());
        assert!(repo.delete_follow(a.id, b.id).await.unwrap());
        assert!(!repo.delete_follow(a.id, b.id).await.unwrap());
    }

    #[tokio::test]
    async fn followed_by_filter_only_returns_followed_authors() {
        let repo = InMemoryBlogRepository::new();
        let reader = repo.create_user("reader").await.unwrap();
        let followed = repo.create_user("followed").await.unwrap();
        let other = repo.create_user("other").await.unwrap();
        repo.create_post(new_post(followed.id, "visible", None)).await.unwrap();
        repo.create_post(new_post(other.id, "hidden", None)).await.unwrap();
        repo.create_follow(reader.id, followed.id).await.unwrap();

        let filter = PostFilter::FollowedBy(reader.id);
        assert_eq!(repo.count_posts(filter).await.unwrap(), 1);
        let posts = repo.list_posts(filter, 10, 0).await.unwrap();
        assert_eq!(posts[0].text, "visible");
    }

    #[tokio::test]
    async fn unknown_group_reference_is_rejected() {
        let repo = InMemoryBlogRepository::new();
        let author = repo.create_user("author").await.unwrap();
        let err = repo
            .create_post(new_post(author.id, "text", Some(42)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
    }
}
