use actix_web::{web, HttpResponse};

use super::redirect;
use crate::error::Result;
use crate::middleware::Viewer;
use crate::AppState;

pub async fn profile_follow(
    state: web::Data<AppState>,
    viewer: Viewer,
    username: web::Path<String>,
) -> Result<HttpResponse> {
    let result = state.follows().follow(viewer.user(), &username).await?;
    Ok(redirect(&result.redirect.location()))
}

pub async fn profile_unfollow(
    state: web::Data<AppState>,
    viewer: Viewer,
    username: web::Path<String>,
) -> Result<HttpResponse> {
    let result = state.follows().unfollow(viewer.user(), &username).await?;
    Ok(redirect(&result.redirect.location()))
}
