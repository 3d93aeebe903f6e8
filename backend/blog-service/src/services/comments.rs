/// Comment service - adds comments to existing posts
use std::sync::Arc;
use tracing::info;
use validator::Validate;

use super::{Mutation, RedirectTarget};
use crate::db::BlogRepository;
use crate::error::{AppError, Result};
use crate::metrics::blog::record_mutation;
use crate::middleware::AuthUser;
use crate::models::{Comment, CommentForm, NewComment};

pub struct CommentService {
    repo: Arc<dyn BlogRepository>,
}

impl CommentService {
    pub fn new(repo: Arc<dyn BlogRepository>) -> Self {
        Self { repo }
    }

    /// Attach a comment by `acting_user` to `post_id`. Blank text creates nothing and
    /// returns a validation error.
    pub async fn add_comment(
        &self,
        acting_user: &AuthUser,
        post_id: i64,
        form: CommentForm,
    ) -> Result<Mutation<Comment>> {
        let post = self
            .repo
            .find_post(post_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("post {}", post_id)))?;

        let form = form.cleaned();
        if let Err(e) = form.validate() {
            record_mutation("comment_create", "invalid");
            return Err(e.into());
        }

        let comment = self
            .repo
            .create_comment(NewComment {
                post_id: post.id,
                author_id: acting_user.id,
                text: form.text,
            })
            .await?;

        record_mutation("comment_create", "success");
        info!(
            comment_id = comment.id,
            post_id = post.id,
            author = %acting_user.username,
            "Comment created"
        );

        Ok(Mutation {
            value: comment,
            redirect: RedirectTarget::PostDetail(post.id),
        })
    }
}
