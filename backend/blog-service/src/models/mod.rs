/// Data models for blog-service
///
/// This module defines structures for:
/// - User: identity records owned by the external login flow, referenced here
/// - Group: administratively created topics posts may belong to
/// - Post: authored content, ordered by creation time
/// - Comment: immutable replies attached to a post
/// - Follow: directed follower -> author edges driving the personalized feed
pub mod forms;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

pub use forms::{CommentForm, PostDraft, PostForm};

/// Number of characters of a post shown wherever a post is named.
pub const POST_PREVIEW_CHARS: usize = 15;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.username)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Group {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}

#[derive(Debug, Clone)]
pub struct NewGroup {
    pub title: String,
    pub slug: String,
    pub description: String,
}

/// A post joined with the author username and group slug/title needed for rendering.
///
/// `author_id` and `created_at` are set by the insert and never written again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Post {
    pub id: i64,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub image: Option<String>,
    pub author_id: Uuid,
    pub author_username: String,
    pub group_id: Option<i64>,
    pub group_slug: Option<String>,
    pub group_title: Option<String>,
}

impl fmt::Display for Post {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let preview: String = self.text.chars().take(POST_PREVIEW_CHARS).collect();
        f.write_str(&preview)
    }
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub author_id: Uuid,
    pub text: String,
    pub group_id: Option<i64>,
    pub image: Option<String>,
}

/// Mutable part of a post. Author and creation time are deliberately absent.
#[derive(Debug, Clone)]
pub struct PostChanges {
    pub text: String,
    pub group_id: Option<i64>,
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub author_id: Uuid,
    pub author_username: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub post_id: i64,
    pub author_id: Uuid,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Follow {
    pub id: i64,
    pub user_id: Uuid,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Which posts a feed contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostFilter {
    All,
    Group(i64),
    Author(Uuid),
    /// Posts whose author is followed by the given user
    FollowedBy(Uuid),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post_with_text(text: &str) -> Post {
        Post {
            id: 1,
            text: text.to_string(),
            created_at: Utc::now(),
            image: None,
            author_id: Uuid::new_v4(),
            author_username: "auth".to_string(),
            group_id: None,
            group_slug: None,
            group_title: None,
        }
    }

    #[test]
    fn post_display_truncates_to_fifteen_chars() {
        let long = post_with_text("No more than 15 characters fit into a preview");
        assert_eq!(long.to_string(), "No more than 15");

        let short = post_with_text("Short post");
        assert_eq!(short.to_string(), "Short post");
    }

    #[test]
    fn post_display_counts_characters_not_bytes() {
        let post = post_with_text("Не более 15 символов может поместиться в превью поста");
        assert_eq!(post.to_string(), "Не более 15 сим");
    }

    #[test]
    fn group_display_is_title() {
        let group = Group {
            id: 1,
            title: "Group".into(),
            slug: "slug".into(),
            description: "About".into(),
        };
        assert_eq!(group.to_string(), "Group");
    }
}
