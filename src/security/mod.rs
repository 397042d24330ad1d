//! Content sanitization

pub mod content_filter;

pub use content_filter::{ContentFilter, PassthroughFilter, WordListFilter};
