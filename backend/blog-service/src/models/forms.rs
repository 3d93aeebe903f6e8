//! Submitted form payloads and their validation.
//!
//! Forms arrive urlencoded, so optional fields come in as empty strings and are
//! normalized here before anything reaches a service.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::FieldErrors;

pub const REQUIRED_MESSAGE: &str = "This field is required.";
pub const INVALID_CHOICE_MESSAGE: &str =
    "Select a valid choice. That choice is not one of the available choices.";

/// Raw post form as posted by the browser.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PostForm {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub image: String,
}

/// Normalized post input handed to the mutation service.
#[derive(Debug, Clone, PartialEq, Eq, Validate)]
pub struct PostDraft {
    #[validate(length(min = 1, message = "This field is required."))]
    pub text: String,
    pub group_id: Option<i64>,
    pub image: Option<String>,
}

impl PostForm {
    /// Trim fields and parse the group choice. Only the group can fail here; text
    /// emptiness is checked by [`PostDraft`]'s validation.
    pub fn into_draft(self) -> Result<PostDraft, FieldErrors> {
        let group_id = match self.group.trim() {
            "" => None,
            raw => match raw.parse::<i64>() {
                Ok(id) => Some(id),
                Err(_) => return Err(FieldErrors::single("group", INVALID_CHOICE_MESSAGE)),
            },
        };
        let image = match self.image.trim() {
            "" => None,
            reference => Some(reference.to_string()),
        };

        Ok(PostDraft {
            text: self.text.trim().to_string(),
            group_id,
            image,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct CommentForm {
    #[serde(default)]
    #[validate(length(min = 1, message = "This field is required."))]
    pub text: String,
}

impl CommentForm {
    pub fn cleaned(self) -> Self {
        Self {
            text: self.text.trim().to_string(),
        }
    }
}
