/// Feed service - assembles paginated post listings and the post detail view
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

use crate::db::BlogRepository;
use crate::error::{AppError, Result};
use crate::middleware::AuthUser;
use crate::models::{Comment, Group, Post, PostFilter, User};
use crate::pagination::{Page, Paginator};

#[derive(Debug, Clone, Serialize)]
pub struct GroupFeed {
    pub group: Group,
    pub page: Page<Post>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileFeed {
    pub author: User,
    pub page: Page<Post>,
    pub post_count: i64,
    /// `None` for anonymous viewers
    pub following: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostDetail {
    pub post: Post,
    pub comments: Vec<Comment>,
    pub author_post_count: i64,
}

pub struct FeedService {
    repo: Arc<dyn BlogRepository>,
}

impl FeedService {
    pub fn new(repo: Arc<dyn BlogRepository>) -> Self {
        Self { repo }
    }

    /// Count, clamp the requested page number, then fetch that slice.
    async fn paginate(&self, filter: PostFilter, requested_page: i64) -> Result<Page<Post>> {
        let total = self.repo.count_posts(filter).await?;
        let paginator = Paginator::new(total);
        let number = paginator.clamp(requested_page);

        let posts = self
            .repo
            .list_posts(filter, paginator.per_page(), paginator.offset(number))
            .await?;

        debug!(?filter, requested_page, number, total, "Assembled feed page");
        Ok(paginator.page(number, posts))
    }

    pub async fn global_feed(&self, page_number: i64) -> Result<Page<Post>> {
        self.paginate(PostFilter::All, page_number).await
    }

    pub async fn group_feed(&self, slug: &str, page_number: i64) -> Result<GroupFeed> {
        let group = self
            .repo
            .find_group_by_slug(slug)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("group '{}'", slug)))?;

        let page = self.paginate(PostFilter::Group(group.id), page_number).await?;
        Ok(GroupFeed { group, page })
    }

    pub async fn profile_feed(
        &self,
        username: &str,
        viewer: Option<&AuthUser>,
        page_number: i64,
    ) -> Result<ProfileFeed> {
        let author = self
            .repo
            .find_user_by_username(username)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user '{}'", username)))?;

        let page = self.paginate(PostFilter::Author(author.id), page_number).await?;

        let following = match viewer {
            Some(viewer) => Some(self.repo.is_following(viewer.id, author.id).await?),
            None => None,
        };

        Ok(ProfileFeed {
            post_count: page.total_count,
            author,
            page,
            following,
        })
    }

    pub async fn following_feed(
        &self,
        acting_user: &AuthUser,
        page_number: i64,
    ) -> Result<Page<Post>> {
        self.paginate(PostFilter::FollowedBy(acting_user.id), page_number)
            .await
    }

    pub async fn post_detail(&self, post_id: i64) -> Result<PostDetail> {
        let post = self
            .repo
            .find_post(post_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("post {}", post_id)))?;

        let comments = self.repo.list_comments(post.id).await?;
        let author_post_count = self
            .repo
            .count_posts(PostFilter::Author(post.author_id))
            .await?;

        Ok(PostDetail {
            post,
            comments,
            author_post_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemoryBlogRepository;
    use crate::models::{NewComment, NewGroup, NewPost};

    async fn seed_posts(
        repo: &InMemoryBlogRepository,
        author: &User,
        count: usize,
        group_id: Option<i64>,
    ) {
        for i in 0..count {
            repo.create_post(NewPost {
                author_id: author.id,
                text: format!("post {}", i),
                group_id,
                image: None,
            })
            .await
            .unwrap();
        }
    }

    fn auth(user: &User) -> AuthUser {
        AuthUser {
            id: user.id,
            username: user.username.clone(),
        }
    }

    #[tokio::test]
    async fn global_feed_pages_hold_ten_then_three() {
        let repo = Arc::new(InMemoryBlogRepository::new());
        let author = repo.create_user("author").await.unwrap();
        seed_posts(&repo, &author, 13, None).await;
        let feed = FeedService::new(repo);

        let first = feed.global_feed(1).await.unwrap();
        assert_eq!(first.len(), 10);
        assert_eq!(first.items[0].text, "post 12");

        let second = feed.global_feed(2).await.unwrap();
        assert_eq!(second.len(), 3);

        let clamped = feed.global_feed(99).await.unwrap();
        assert_eq!(clamped.number, 2);
        assert_eq!(feed.global_feed(0).await.unwrap().number, 1);
    }

    #[tokio::test]
    async fn group_feed_is_filtered_and_unknown_slug_is_not_found() {
        let repo = Arc::new(InMemoryBlogRepository::new());
        let author = repo.create_user("author").await.unwrap();
        let group = repo
            .create_group(NewGroup {
                title: "Cats".into(),
                slug: "cats".into(),
                description: String::new(),
            })
            .await
            .unwrap();
        seed_posts(&repo, &author, 2, Some(group.id)).await;
        seed_posts(&repo, &author, 3, None).await;
        let feed = FeedService::new(repo);

        let group_feed = feed.group_feed("cats", 1).await.unwrap();
        assert_eq!(group_feed.page.total_count, 2);
        assert!(group_feed.page.items.iter().all(|p| p.group_id == Some(group.id)));

        assert!(matches!(
            feed.group_feed("dogs", 1).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn profile_feed_reports_count_and_following() {
        let repo = Arc::new(InMemoryBlogRepository::new());
        let author = repo.create_user("author").await.unwrap();
        let fan = repo.create_user("fan").await.unwrap();
        seed_posts(&repo, &author, 4, None).await;
        repo.create_follow(fan.id, author.id).await.unwrap();
        let feed = FeedService::new(repo);

        let anonymous = feed.profile_feed("author", None, 1).await.unwrap();
        assert_eq!(anonymous.post_count, 4);
        assert_eq!(anonymous.following, None);

        let as_fan = feed.profile_feed("author", Some(&auth(&fan)), 1).await.unwrap();
        assert_eq!(as_fan.following, Some(true));

        assert!(feed.profile_feed("ghost", None, 1).await.is_err());
    }

    #[tokio::test]
    async fn post_detail_lists_comments_in_creation_order() {
        let repo = Arc::new(InMemoryBlogRepository::new());
        let author = repo.create_user("author").await.unwrap();
        seed_posts(&repo, &author, 2, None).await;
        let post = repo.list_posts(PostFilter::All, 1, 0).await.unwrap().remove(0);
        for text in ["first", "second"] {
            repo.create_comment(NewComment {
                post_id: post.id,
                author_id: author.id,
                text: text.into(),
            })
            .await
            .unwrap();
        }
        let feed = FeedService::new(repo);

        let detail = feed.post_detail(post.id).await.unwrap();
        let texts: Vec<&str> = detail.comments.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second"]);
        assert_eq!(detail.author_post_count, 2);

        assert!(matches!(feed.post_detail(999).await, Err(AppError::NotFound(_))));
    }
}
