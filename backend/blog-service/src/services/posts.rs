/// Post service - handles post creation and author-only edits
use std::sync::Arc;
use tracing::info;
use validator::Validate;

use super::{Mutation, RedirectTarget};
use crate::db::BlogRepository;
use crate::error::{AppError, FieldErrors, Result};
use crate::metrics::blog::record_mutation;
use crate::middleware::{can_edit_post, AuthUser};
use crate::models::forms::INVALID_CHOICE_MESSAGE;
use crate::models::{NewPost, Post, PostChanges, PostDraft};

pub struct PostService {
    repo: Arc<dyn BlogRepository>,
}

impl PostService {
    pub fn new(repo: Arc<dyn BlogRepository>) -> Self {
        Self { repo }
    }

    /// Field validation plus the group existence check. Nothing is written on failure.
    async fn validate_draft(&self, draft: &PostDraft) -> Result<()> {
        let mut errors = match draft.validate() {
            Ok(()) => FieldErrors::new(),
            Err(e) => e.into(),
        };

        if let Some(group_id) = draft.group_id {
            if self.repo.find_group_by_id(group_id).await?.is_none() {
                errors.add("group", INVALID_CHOICE_MESSAGE);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(errors))
        }
    }

    /// Create a post owned by `author`; redirects to the author's profile.
    pub async fn create_post(
        &self,
        author: &AuthUser,
        draft: PostDraft,
    ) -> Result<Mutation<Post>> {
        if let Err(e) = self.validate_draft(&draft).await {
            record_mutation("post_create", "invalid");
            return Err(e);
        }

        let post = self
            .repo
            .create_post(NewPost {
                author_id: author.id,
                text: draft.text,
                group_id: draft.group_id,
                image: draft.image,
            })
            .await?;

        record_mutation("post_create", "success");
        info!(post_id = post.id, author = %author.username, "Post created");

        Ok(Mutation {
            redirect: RedirectTarget::Profile(post.author_username.clone()),
            value: post,
        })
    }

    /// Load a post for editing. Non-authors get redirected to its detail page.
    pub async fn load_editable(&self, acting_user: &AuthUser, post_id: i64) -> Result<Post> {
        let post = self
            .repo
            .find_post(post_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("post {}", post_id)))?;

        if !can_edit_post(acting_user, &post) {
            return Err(AppError::Forbidden {
                location: RedirectTarget::PostDetail(post.id).location(),
            });
        }

        Ok(post)
    }

    /// Overwrite text, group and image of an existing post. Author, id and creation time
    /// are preserved.
    pub async fn edit_post(
        &self,
        acting_user: &AuthUser,
        post_id: i64,
        draft: PostDraft,
    ) -> Result<Mutation<Post>> {
        let post = match self.load_editable(acting_user, post_id).await {
            Ok(post) => post,
            Err(e) => {
                if matches!(e, AppError::Forbidden { .. }) {
                    record_mutation("post_edit", "forbidden");
                }
                return Err(e);
            }
        };

        if let Err(e) = self.validate_draft(&draft).await {
            record_mutation("post_edit", "invalid");
            return Err(e);
        }

        let updated = self
            .repo
            .update_post(
                post.id,
                PostChanges {
                    text: draft.text,
                    group_id: draft.group_id,
                    image: draft.image,
                },
            )
            .await?
            .ok_or_else(|| AppError::NotFound(format!("post {}", post_id)))?;

        record_mutation("post_edit", "success");
        info!(post_id = updated.id, editor = %acting_user.username, "Post updated");

        Ok(Mutation {
            redirect: RedirectTarget::PostDetail(updated.id),
            value: updated,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemoryBlogRepository;
    use crate::models::{NewGroup, PostFilter, User};

    fn auth(user: &User) -> AuthUser {
        AuthUser {
            id: user.id,
            username: user.username.clone(),
        }
    }

    fn draft(text: &str, group_id: Option<i64>) -> PostDraft {
        PostDraft {
            text: text.to_string(),
            group_id,
            image: None,
        }
    }

    #[tokio::test]
    async fn create_sets_author_from_identity_and_redirects_to_profile() {
        let repo = Arc::new(InMemoryBlogRepository::new());
        let author = repo.create_user("author").await.unwrap();
        let service = PostService::new(repo.clone());

        let created = service
            .create_post(&auth(&author), draft("Hello", None))
            .await
            .unwrap();

        assert_eq!(created.value.author_id, author.id);
        assert_eq!(created.redirect, RedirectTarget::Profile("author".into()));
        assert_eq!(repo.count_posts(PostFilter::All).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn create_redirect_uses_stored_username_not_token_claim() {
        let repo = Arc::new(InMemoryBlogRepository::new());
        let author = repo.create_user("author").await.unwrap();
        let service = PostService::new(repo.clone());
        let stale = AuthUser {
            id: author.id,
            username: "renamed-away".into(),
        };

        let created = service
            .create_post(&stale, draft("Hello", None))
            .await
            .unwrap();

        assert_eq!(created.redirect, RedirectTarget::Profile("author".into()));
    }

    #[tokio::test]
    async fn empty_text_and_unknown_group_are_rejected() {
        let repo = Arc::new(InMemoryBlogRepository::new());
        let author = repo.create_user("author").await.unwrap();
        let service = PostService::new(repo.clone());

        let err = service
            .create_post(&auth(&author), draft("", Some(77)))
            .await
            .unwrap_err();
        match err {
            AppError::Validation(errors) => {
                assert!(errors.get("text").is_some());
                assert!(errors.get("group").is_some());
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(repo.count_posts(PostFilter::All).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn edit_by_author_preserves_identity_fields() {
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
        let service = PostService::new(repo.clone());
        let original = service
            .create_post(&auth(&author), draft("Hello", None))
            .await
            .unwrap()
            .value;

        let edited = service
            .edit_post(&auth(&author), original.id, draft("Edited", Some(group.id)))
            .await
            .unwrap();

        assert_eq!(edited.redirect, RedirectTarget::PostDetail(original.id));
        assert_eq!(edited.value.text, "Edited");
        assert_eq!(edited.value.group_id, Some(group.id));
        assert_eq!(edited.value.author_id, original.author_id);
        assert_eq!(edited.value.created_at, original.created_at);
    }

    #[tokio::test]
    async fn non_author_edit_redirects_to_detail_without_change() {
        let repo = Arc::new(InMemoryBlogRepository::new());
        let author = repo.create_user("author").await.unwrap();
        let intruder = repo.create_user("intruder").await.unwrap();
        let service = PostService::new(repo.clone());
        let post = service
            .create_post(&auth(&author), draft("Hello", None))
            .await
            .unwrap()
            .value;

        let err = service
            .edit_post(&auth(&intruder), post.id, draft("Hijacked", None))
            .await
            .unwrap_err();
        match err {
            AppError::Forbidden { location } => {
                assert_eq!(location, format!("/posts/{}/", post.id))
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let stored = repo.find_post(post.id).await.unwrap().unwrap();
        assert_eq!(stored.text, "Hello");
    }

    #[tokio::test]
    async fn editing_missing_post_is_not_found() {
        let repo = Arc::new(InMemoryBlogRepository::new());
        let author = repo.create_user("author").await.unwrap();
        let service = PostService::new(repo);

        let err = service
            .edit_post(&auth(&author), 404, draft("text", None))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
