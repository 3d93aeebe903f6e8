use std::sync::Arc;
use tracing::{debug, info};

use super::RedirectTarget;
use crate::db::BlogRepository;
use crate::error::{AppError, Result};
use crate::metrics::blog::record_mutation;
use crate::middleware::{can_follow, login_redirect_url, require_auth, AuthUser, FollowDecision};
use crate::models::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowOutcome {
    Created,
    AlreadyFollowing,
    /// Self-follow attempts are refused quietly; no edge is written.
    SelfFollowRejected,
    Removed,
    NotFollowing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowResult {
    pub outcome: FollowOutcome,
    pub redirect: RedirectTarget,
}

/// Follow / unfollow edges between users. Both operations are idempotent.
#[derive(Clone)]
pub struct FollowService {
    repo: Arc<dyn BlogRepository>,
    login_url: String,
}

impl FollowService {
    pub fn new(repo: Arc<dyn BlogRepository>, login_url: impl Into<String>) -> Self {
        Self {
            repo,
            login_url: login_url.into(),
        }
    }

    async fn find_author(&self, username: &str) -> Result<User> {
        self.repo
            .find_user_by_username(username)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user '{}'", username)))
    }

    pub async fn follow(&self, viewer: Option<&AuthUser>, username: &str) -> Result<FollowResult> {
        let author = self.find_author(username).await?;

        let acting_user = match (can_follow(viewer, &author), viewer) {
            (FollowDecision::Allow, Some(user)) => user,
            (FollowDecision::RejectSelf, _) => {
                record_mutation("follow", "self_rejected");
                debug!(user = %author.username, "Self-follow refused");
                return Ok(FollowResult {
                    outcome: FollowOutcome::SelfFollowRejected,
                    redirect: RedirectTarget::Profile(author.username),
                });
            }
            _ => {
                return Err(AppError::RequireAuth {
                    location: login_redirect_url(
                        &self.login_url,
                        &format!("/profile/{}/follow/", username),
                    ),
                })
            }
        };

        // The unique constraint backs this check; a racing duplicate insert is a no-op
        let created = !self.repo.is_following(acting_user.id, author.id).await?
            && self.repo.create_follow(acting_user.id, author.id).await?;

        let outcome = if created {
            record_mutation("follow", "created");
            info!(
                follower = %acting_user.username,
                author = %author.username,
                "Follow created"
            );
            FollowOutcome::Created
        } else {
            record_mutation("follow", "already_following");
            FollowOutcome::AlreadyFollowing
        };

        Ok(FollowResult {
            outcome,
            redirect: RedirectTarget::Profile(author.username),
        })
    }

    pub async fn unfollow(
        &self,
        viewer: Option<&AuthUser>,
        username: &str,
    ) -> Result<FollowResult> {
        let author = self.find_author(username).await?;
        let acting_user = require_auth(
            viewer,
            &self.login_url,
            &format!("/profile/{}/unfollow/", username),
        )?;

        let outcome = if self.repo.delete_follow(acting_user.id, author.id).await? {
            record_mutation("unfollow", "removed");
            info!(
                follower = %acting_user.username,
                author = %author.username,
                "Follow removed"
            );
            FollowOutcome::Removed
        } else {
            record_mutation("unfollow", "not_following");
            FollowOutcome::NotFollowing
        };

        Ok(FollowResult {
            outcome,
            redirect: RedirectTarget::Profile(author.username),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemoryBlogRepository;

    async fn setup() -> (Arc<InMemoryBlogRepository>, FollowService, AuthUser, User) {
        let repo = Arc::new(InMemoryBlogRepository::new());
        let fan = repo.create_user("fan").await.unwrap();
        let author = repo.create_user("author").await.unwrap();
        let service = FollowService::new(repo.clone(), "/auth/login/");
        let fan = AuthUser {
            id: fan.id,
            username: fan.username,
        };
        (repo, service, fan, author)
    }

    #[tokio::test]
    async fn self_follow_is_refused_and_redirects_home() {
        let (repo, service, fan, _) = setup().await;

        let result = service.follow(Some(&fan), "fan").await.unwrap();

        assert_eq!(result.outcome, FollowOutcome::SelfFollowRejected);
        assert_eq!(result.redirect, RedirectTarget::Profile("fan".into()));
        assert!(!repo.is_following(fan.id, fan.id).await.unwrap());
    }

    #[tokio::test]
    async fn repeated_follow_creates_a_single_edge() {
        let (repo, service, fan, author) = setup().await;

        let first = service.follow(Some(&fan), "author").await.unwrap();
        let second = service.follow(Some(&fan), "author").await.unwrap();

        assert_eq!(first.outcome, FollowOutcome::Created);
        assert_eq!(second.outcome, FollowOutcome::AlreadyFollowing);
        assert_eq!(second.redirect, RedirectTarget::Profile("author".into()));
        assert!(repo.is_following(fan.id, author.id).await.unwrap());
        assert!(repo.delete_follow(fan.id, author.id).await.unwrap());
        assert!(!repo.is_following(fan.id, author.id).await.unwrap());
    }

    #[tokio::test]
    async fn unfollow_without_edge_is_a_no_op() {
        let (_, service, fan, _) = setup().await;

        let result = service.unfollow(Some(&fan), "author").await.unwrap();
        assert_eq!(result.outcome, FollowOutcome::NotFollowing);
        assert_eq!(result.redirect, RedirectTarget::Profile("author".into()));
    }

    #[tokio::test]
    async fn anonymous_follow_requires_login() {
        let (_, service, _, _) = setup().await;

        match service.follow(None, "author").await.unwrap_err() {
            AppError::RequireAuth { location } => {
                assert_eq!(location, "/auth/login/?next=/profile/author/follow/")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unknown_target_is_not_found() {
        let (_, service, fan, _) = setup().await;
        assert!(matches!(
            service.follow(Some(&fan), "ghost").await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            service.unfollow(Some(&fan), "ghost").await,
            Err(AppError::NotFound(_))
        ));
    }
}
