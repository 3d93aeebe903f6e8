//! Template rendering seam.
//!
//! HTML templates are owned by the presentation layer; the service only needs something
//! that turns a template name plus a context into response bytes. [`JsonRenderer`] is the
//! default and emits `{"template": ..., "context": ...}` documents, which is also what the
//! global-feed page cache stores.

use bytes::Bytes;
use serde_json::Value;

use crate::error::Result;

pub const INDEX_TEMPLATE: &str = "posts/index.html";
pub const GROUP_LIST_TEMPLATE: &str = "posts/group_list.html";
pub const PROFILE_TEMPLATE: &str = "posts/profile.html";
pub const POST_DETAIL_TEMPLATE: &str = "posts/post_detail.html";
pub const POST_FORM_TEMPLATE: &str = "posts/create_post.html";
pub const FOLLOW_TEMPLATE: &str = "posts/follow.html";
pub const NOT_FOUND_TEMPLATE: &str = "core/404.html";

/// Template collaborator.
pub trait Renderer: Send + Sync {
    fn render(&self, template: &str, context: &Value) -> Result<Bytes>;

    fn content_type(&self) -> &'static str;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRenderer;

impl JsonRenderer {
    pub const CONTENT_TYPE: &'static str = "application/json";
}

impl Renderer for JsonRenderer {
    fn render(&self, template: &str, context: &Value) -> Result<Bytes> {
        let document = serde_json::json!({
            "template": template,
            "context": context,
        });
        Ok(Bytes::from(serde_json::to_vec(&document)?))
    }

    fn content_type(&self) -> &'static str {
        Self::CONTENT_TYPE
    }
}
