/// HTTP handlers for blog endpoints
///
/// This module contains handlers for:
/// - Feeds: global index (cached), group, profile and followed-authors listings
/// - Posts: detail view, create and author-only edit forms
/// - Comments: adding a comment to a post
/// - Follow: follow / unfollow an author
///
/// Views respond with rendered templates (200), redirects (302) or the not-found page (404).
pub mod comments;
pub mod feed;
pub mod follow;
pub mod posts;

// Re-export handler functions at module level
pub use comments::add_comment;
pub use feed::{follow_index, group_posts, index, post_detail, profile};
pub use follow::{profile_follow, profile_unfollow};
pub use posts::{post_create, post_create_form, post_edit, post_edit_form};

use actix_web::{error::PathError, http::header, web, FromRequest, HttpRequest, HttpResponse};
use std::future::{ready, Ready};

use crate::error::{AppError, Result};
use crate::pagination::parse_page_number;

/// Requested page number from `?page=`.
///
/// Extraction never fails: a repeated `page` takes the last value, and a missing or
/// malformed one is page 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageQuery(i64);

impl PageQuery {
    pub fn from_query_string(query: &str) -> Self {
        let raw = web::Query::<Vec<(String, String)>>::from_query(query)
            .ok()
            .and_then(|pairs| {
                pairs
                    .into_inner()
                    .into_iter()
                    .rev()
                    .find(|(key, _)| key == "page")
                    .map(|(_, value)| value)
            });
        PageQuery(parse_page_number(raw.as_deref()))
    }

    pub fn number(&self) -> i64 {
        self.0
    }
}

impl FromRequest for PageQuery {
    type Error = actix_web::Error;
    type Future = Ready<std::result::Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        ready(Ok(Self::from_query_string(req.query_string())))
    }
}

/// Unparseable path segments (`/posts/abc/`) get the regular not-found page.
fn path_error(err: PathError, req: &HttpRequest) -> actix_web::Error {
    AppError::NotFound(format!("page '{}' ({})", req.path(), err)).into()
}

pub(crate) fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .finish()
}

/// Route table. Paths keep their trailing slashes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::PathConfig::default().error_handler(path_error))
        .route("/", web::get().to(index))
        .route("/group/{slug}/", web::get().to(group_posts))
        .route("/follow/", web::get().to(follow_index))
        .service(
            web::resource("/create/")
                .route(web::get().to(post_create_form))
                .route(web::post().to(post_create)),
        )
        .route("/profile/{username}/", web::get().to(profile))
        .route("/profile/{username}/follow/", web::get().to(profile_follow))
        .route(
            "/profile/{username}/unfollow/",
            web::get().to(profile_unfollow),
        )
        .route("/posts/{post_id}/", web::get().to(post_detail))
        .service(
            web::resource("/posts/{post_id}/edit/")
                .route(web::get().to(post_edit_form))
                .route(web::post().to(post_edit)),
        )
        .route("/posts/{post_id}/comment/", web::post().to(add_comment));
}

/// Fallback for unknown routes.
pub async fn not_found(req: HttpRequest) -> Result<HttpResponse> {
    Err(AppError::NotFound(format!("page '{}'", req.path())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_query_is_lenient() {
        assert_eq!(PageQuery::from_query_string("").number(), 1);
        assert_eq!(PageQuery::from_query_string("page=3").number(), 3);
        assert_eq!(PageQuery::from_query_string("page=abc").number(), 1);
        assert_eq!(PageQuery::from_query_string("page=1&page=2").number(), 2);
        assert_eq!(PageQuery::from_query_string("sort=new&page=4").number(), 4);
    }
}
