//! Markdown report generation for pull request comments
//!
//! This module turns classified plan changes into a GitHub-flavoured markdown
//! report and splits oversized reports into comment-sized fragments.
//!
//! # Features
//!
//! - **Sections**: one fenced `diff` block per kind of change
//! - **Composition**: header, collapsible summary, footer and workflow link per plan file
//! - **Chunking**: size-bounded fragments that never leave a code block or
//!   `<details>` section open
//!
//! # Example
//!
//! ```ignore
//! use plan_comment::report::{CommentSplitter, ReportComposer, ReportOptions};
//!
//! let options = ReportOptions::default();
//! let report = ReportComposer::new(&fs, &output, &options).compose(&files);
//!
//! for fragment in CommentSplitter::default().split(&report.body) {
//!     println!("{}", fragment);
//! }
//! ```

mod chunker;
mod composer;
mod renderer;

pub use chunker::{CommentSplitter, DEFAULT_MAX_COMMENT_SIZE};
pub use composer::{PlanReport, ReportComposer, ReportOptions, WorkflowLink};

#[cfg(test)]
pub use chunker::MIN_COMMENT_SIZE;
