/// Post handlers - create and edit forms
///
/// GET renders the form, POST validates and either redirects or re-renders the form with
/// field errors (200). Both views require a session; edit additionally requires authorship.
use actix_web::{web, HttpResponse};
use serde_json::{json, Value};

use super::redirect;
use crate::error::{AppError, FieldErrors, Result};
use crate::middleware::{require_auth, Viewer};
use crate::models::{Post, PostForm};
use crate::render::POST_FORM_TEMPLATE;
use crate::AppState;

const CREATE_PATH: &str = "/create/";

fn edit_path(post_id: i64) -> String {
    format!("/posts/{}/edit/", post_id)
}

fn form_from_post(post: &Post) -> PostForm {
    PostForm {
        text: post.text.clone(),
        group: post.group_id.map(|id| id.to_string()).unwrap_or_default(),
        image: post.image.clone().unwrap_or_default(),
    }
}

/// Context for `posts/create_post.html`: submitted values, errors and the group choices.
async fn form_context(
    state: &AppState,
    form: &PostForm,
    errors: &FieldErrors,
    editing: Option<i64>,
) -> Result<Value> {
    let groups = state.repo.list_groups().await?;

    let mut context = json!({
        "form": {
            "fields": form,
            "errors": errors,
            "labels": {
                "text": "Post text",
                "group": "Group",
                "image": "Image",
            },
            "help_texts": {
                "text": "Enter the post text",
                "group": "Group the post will belong to",
            },
        },
        "groups": groups,
        "is_edit": editing.is_some(),
    });
    if let Some(post_id) = editing {
        context["post_id"] = json!(post_id);
    }
    Ok(context)
}

async fn render_form(
    state: &AppState,
    form: &PostForm,
    errors: &FieldErrors,
    editing: Option<i64>,
) -> Result<HttpResponse> {
    let context = form_context(state, form, errors, editing).await?;
    state.render(POST_FORM_TEMPLATE, &context)
}

pub async fn post_create_form(
    state: web::Data<AppState>,
    viewer: Viewer,
) -> Result<HttpResponse> {
    require_auth(viewer.user(), &state.login_url, CREATE_PATH)?;
    render_form(&state, &PostForm::default(), &FieldErrors::new(), None).await
}

pub async fn post_create(
    state: web::Data<AppState>,
    viewer: Viewer,
    form: web::Form<PostForm>,
) -> Result<HttpResponse> {
    let author = require_auth(viewer.user(), &state.login_url, CREATE_PATH)?;
    let form = form.into_inner();

    let draft = match form.clone().into_draft() {
        Ok(draft) => draft,
        Err(errors) => return render_form(&state, &form, &errors, None).await,
    };

    match state.posts().create_post(author, draft).await {
        Ok(created) => Ok(redirect(&created.redirect.location())),
        Err(AppError::Validation(errors)) => render_form(&state, &form, &errors, None).await,
        Err(e) => Err(e),
    }
}

pub async fn post_edit_form(
    state: web::Data<AppState>,
    viewer: Viewer,
    post_id: web::Path<i64>,
) -> Result<HttpResponse> {
    let post_id = post_id.into_inner();
    let acting_user = require_auth(viewer.user(), &state.login_url, &edit_path(post_id))?;

    let post = state.posts().load_editable(acting_user, post_id).await?;
    render_form(&state, &form_from_post(&post), &FieldErrors::new(), Some(post.id)).await
}

pub async fn post_edit(
    state: web::Data<AppState>,
    viewer: Viewer,
    post_id: web::Path<i64>,
    form: web::Form<PostForm>,
) -> Result<HttpResponse> {
    let post_id = post_id.into_inner();
    let acting_user = require_auth(viewer.user(), &state.login_url, &edit_path(post_id))?;
    let form = form.into_inner();
    let service = state.posts();

    let draft = match form.clone().into_draft() {
        Ok(draft) => draft,
        Err(errors) => {
            // Authorship is checked before any errors are shown
            service.load_editable(acting_user, post_id).await?;
            return render_form(&state, &form, &errors, Some(post_id)).await;
        }
    };

    match service.edit_post(acting_user, post_id, draft).await {
        Ok(edited) => Ok(redirect(&edited.redirect.location())),
        Err(AppError::Validation(errors)) => {
            render_form(&state, &form, &errors, Some(post_id)).await
        }
        Err(e) => Err(e),
    }
}
