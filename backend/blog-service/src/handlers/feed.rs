/// Feed handlers - read-only listings and the post detail page
use actix_web::{web, HttpResponse};
use serde_json::json;

use super::PageQuery;
use crate::error::Result;
use crate::middleware::{require_auth, Viewer};
use crate::render::{
    FOLLOW_TEMPLATE, GROUP_LIST_TEMPLATE, INDEX_TEMPLATE, POST_DETAIL_TEMPLATE, PROFILE_TEMPLATE,
};
use crate::AppState;

pub const INDEX_TITLE: &str = "Latest updates on the site";
pub const FOLLOW_TITLE: &str = "Followed authors";

/// Global feed. The rendered body is served from the page cache for its TTL, so posts
/// created meanwhile are not visible until it expires or the cache is cleared.
pub async fn index(
    state: web::Data<AppState>,
    query: PageQuery,
) -> Result<HttpResponse> {
    let page_number = query.number();

    let body = state
        .pages
        .get_or_render(page_number, || async {
            let page = state.feeds().global_feed(page_number).await?;
            state.renderer.render(
                INDEX_TEMPLATE,
                &json!({
                    "title": INDEX_TITLE,
                    "page_obj": page,
                }),
            )
        })
        .await?;

    Ok(state.page_response(body))
}

pub async fn group_posts(
    state: web::Data<AppState>,
    slug: web::Path<String>,
    query: PageQuery,
) -> Result<HttpResponse> {
    let feed = state.feeds().group_feed(&slug, query.number()).await?;

    state.render(
        GROUP_LIST_TEMPLATE,
        &json!({
            "title": format!("Posts of group {}", feed.group),
            "group": feed.group,
            "page_obj": feed.page,
        }),
    )
}

pub async fn profile(
    state: web::Data<AppState>,
    viewer: Viewer,
    username: web::Path<String>,
    query: PageQuery,
) -> Result<HttpResponse> {
    let feed = state
        .feeds()
        .profile_feed(&username, viewer.user(), query.number())
        .await?;

    let mut context = json!({
        "title": format!("Profile of {}", feed.author),
        "author": feed.author,
        "count_post": feed.post_count,
        "page_obj": feed.page,
    });
    if let Some(following) = feed.following {
        context["following"] = json!(following);
    }

    state.render(PROFILE_TEMPLATE, &context)
}

pub async fn post_detail(
    state: web::Data<AppState>,
    post_id: web::Path<i64>,
) -> Result<HttpResponse> {
    let detail = state.feeds().post_detail(post_id.into_inner()).await?;

    state.render(
        POST_DETAIL_TEMPLATE,
        &json!({
            "title": detail.post.to_string(),
            "post": detail.post,
            "comments": detail.comments,
            "count_post": detail.author_post_count,
            "form": { "text": "" },
        }),
    )
}

/// Posts by authors the viewer follows.
pub async fn follow_index(
    state: web::Data<AppState>,
    viewer: Viewer,
    query: PageQuery,
) -> Result<HttpResponse> {
    let acting_user = require_auth(viewer.user(), &state.login_url, "/follow/")?;
    let page = state
        .feeds()
        .following_feed(acting_user, query.number())
        .await?;

    state.render(
        FOLLOW_TEMPLATE,
        &json!({
            "title": FOLLOW_TITLE,
            "page_obj": page,
        }),
    )
}
