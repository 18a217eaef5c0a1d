//! Data models on top of the persistence collaborator.

pub mod post;
pub mod user;

pub use post::{Post, PostRecord, PostSummary};
pub use user::{User, UserRecord};
