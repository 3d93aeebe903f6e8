/// Business logic layer for blog-service
///
/// This module provides high-level operations:
/// - Feed service: global, group, profile and following feeds plus post detail
/// - Post service: post creation and author-only edits
/// - Comment service: comments on existing posts
/// - Follow service: follow / unfollow edges
///
/// Services are cheap to construct and hold only an `Arc` to the repository, so handlers
/// build them per request.
pub mod comments;
pub mod feed;
pub mod follow;
pub mod posts;

pub use comments::CommentService;
pub use feed::{FeedService, GroupFeed, PostDetail, ProfileFeed};
pub use follow::{FollowOutcome, FollowResult, FollowService};
pub use posts::PostService;

/// Where a successful mutation sends the browser next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectTarget {
    Profile(String),
    PostDetail(i64),
}

impl RedirectTarget {
    pub fn location(&self) -> String {
        match self {
            RedirectTarget::Profile(username) => format!("/profile/{}/", username),
            RedirectTarget::PostDetail(post_id) => format!("/posts/{}/", post_id),
        }
    }
}

/// A persisted record plus the redirect that follows its creation.
#[derive(Debug, Clone)]
pub struct Mutation<T> {
    pub value: T,
    pub redirect: RedirectTarget,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redirect_locations() {
        assert_eq!(RedirectTarget::Profile("leo".into()).location(), "/profile/leo/");
        assert_eq!(RedirectTarget::PostDetail(7).location(), "/posts/7/");
    }
}
