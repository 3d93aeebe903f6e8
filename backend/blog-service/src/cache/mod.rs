//! Rendered page caching
//!
//! The global index is served from a short-lived cache keyed by the raw `?page=` value.
//! Backends implement [`PageCache`]; [`IndexPageCache`] applies the key scheme and TTL and
//! falls back to fresh rendering whenever the backend misbehaves.
pub mod page_cache;

pub use page_cache::{IndexPageCache, InMemoryPageCache, PageCache, RedisPageCache};
