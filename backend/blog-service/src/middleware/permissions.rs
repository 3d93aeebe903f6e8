/// Authorization rules for blog-service
///
/// Pure decision functions over already loaded records. Callers turn the decisions into
/// redirects; nothing here touches storage.
use crate::error::{AppError, Result};
use crate::middleware::AuthUser;
use crate::models::{Post, User};

/// Only the author may change a post.
pub fn can_edit_post(acting_user: &AuthUser, post: &Post) -> bool {
    acting_user.id == post.author_id
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowDecision {
    Allow,
    RejectSelf,
    RequireAuth,
}

pub fn can_follow(acting_user: Option<&AuthUser>, target_author: &User) -> FollowDecision {
    match acting_user {
        None => FollowDecision::RequireAuth,
        Some(user) if user.id == target_author.id => FollowDecision::RejectSelf,
        Some(_) => FollowDecision::Allow,
    }
}

/// `<login_url>?next=<path>` with the continuation percent-encoded except for `/`.
pub fn login_redirect_url(login_url: &str, next: &str) -> String {
    let next = urlencoding::encode(next).replace("%2F", "/");
    format!("{}?next={}", login_url, next)
}

/// Return the acting user, or a login redirect that resumes at `next`.
pub fn require_auth<'a>(
    viewer: Option<&'a AuthUser>,
    login_url: &str,
    next: &str,
) -> Result<&'a AuthUser> {
    viewer.ok_or_else(|| AppError::RequireAuth {
        location: login_redirect_url(login_url, next),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn auth_user(id: Uuid, username: &str) -> AuthUser {
        AuthUser {
            id,
            username: username.to_string(),
        }
    }

    fn user(id: Uuid, username: &str) -> User {
        User {
            id,
            username: username.to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn only_author_can_edit() {
        let author = Uuid::new_v4();
        let post = Post {
            id: 1,
            text: "Hello".into(),
            created_at: Utc::now(),
            image: None,
            author_id: author,
            author_username: "author".into(),
            group_id: None,
            group_slug: None,
            group_title: None,
        };

        assert!(can_edit_post(&auth_user(author, "author"), &post));
        assert!(!can_edit_post(&auth_user(Uuid::new_v4(), "other"), &post));
    }

    #[test]
    fn follow_decisions() {
        let id = Uuid::new_v4();
        let target = user(id, "target");

        assert_eq!(can_follow(None, &target), FollowDecision::RequireAuth);
        assert_eq!(
            can_follow(Some(&auth_user(id, "target")), &target),
            FollowDecision::RejectSelf
        );
        assert_eq!(
            can_follow(Some(&auth_user(Uuid::new_v4(), "fan")), &target),
            FollowDecision::Allow
        );
    }

    #[test]
    fn login_redirect_keeps_slashes() {
        assert_eq!(
            login_redirect_url("/auth/login/", "/posts/5/comment/"),
            "/auth/login/?next=/posts/5/comment/"
        );
        assert_eq!(
            login_redirect_url("/auth/login/", "/profile/john doe/follow/"),
            "/auth/login/?next=/profile/john%20doe/follow/"
        );
    }

    #[test]
    fn anonymous_viewer_gets_login_redirect() {
        let err = require_auth(None, "/auth/login/", "/create/").unwrap_err();
        match err {
            AppError::RequireAuth { location } => {
                assert_eq!(location, "/auth/login/?next=/create/")
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let me = auth_user(Uuid::new_v4(), "me");
        assert_eq!(require_auth(Some(&me), "/auth/login/", "/create/").unwrap(), &me);
    }
}
