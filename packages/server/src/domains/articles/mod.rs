//! Article records produced by the generation pipeline.
//!
//! The job store owns job lifecycle; this domain owns article lifecycle.
//! The two are correlated by a shared id, but lifecycled independently - a
//! failed generation still leaves an article record, marked with its error,
//! for auditability.

pub mod model;
pub mod store;

pub use model::{Article, ArticleStatus};
pub use store::{ArticleStore, ArticleStoreError, InMemoryArticleStore, RedisArticleStore};
