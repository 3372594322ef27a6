//! Terraform/OpenTofu JSON plan model
//!
//! Parses the `resource_changes` section of `terraform show -json` output and
//! groups resources by the kind of change the plan applies to them.
//!
//! # Example
//!
//! ```ignore
//! use plan_comment::plan::{PlanDocument, classify};
//!
//! let doc = PlanDocument::from_json(&contents)?;
//! if let Some(changes) = doc.changes()? {
//!     let bucket = classify(&changes);
//!     println!("{} changes", bucket.total_changes());
//! }
//! ```

mod classifier;
mod types;

pub use classifier::classify;
pub use types::{ChangeBucket, PlanDocument};

#[cfg(test)]
pub use types::ResourceChange;
