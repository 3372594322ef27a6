//! GitHub integration: run context detection and comment posting

pub mod client;
pub mod context;

pub use client::{CommentClient, ReqwestClient};
pub use context::GitHubContext;

#[cfg(test)]
pub use client::MockCommentClient;
#[cfg(test)]
pub use context::Repository;
