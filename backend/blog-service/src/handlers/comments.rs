use actix_web::{web, HttpResponse};

use super::redirect;
use crate::error::{AppError, Result};
use crate::middleware::{require_auth, Viewer};
use crate::models::CommentForm;
use crate::services::RedirectTarget;
use crate::AppState;

/// Add a comment and return to the post. Blank comments are dropped without an error page.
pub async fn add_comment(
    state: web::Data<AppState>,
    viewer: Viewer,
    post_id: web::Path<i64>,
    form: web::Form<CommentForm>,
) -> Result<HttpResponse> {
    let post_id = post_id.into_inner();
    let acting_user = require_auth(
        viewer.user(),
        &state.login_url,
        &format!("/posts/{}/comment/", post_id),
    )?;

    match state
        .comments()
        .add_comment(acting_user, post_id, form.into_inner())
        .await
    {
        Ok(created) => Ok(redirect(&created.redirect.location())),
        Err(AppError::Validation(errors)) => {
            tracing::debug!(post_id, %errors, "Rejected empty comment");
            Ok(redirect(&RedirectTarget::PostDetail(post_id).location()))
        }
        Err(e) => Err(e),
    }
}
