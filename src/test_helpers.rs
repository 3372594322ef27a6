//! Test helpers for building plan documents
//!
//! `PlanFixture` produces the JSON shape of `terraform show -json` with just
//! enough fields for the report.

#![cfg(test)]

use crate::plan::ResourceChange;
use serde_json::json;

/// Builder for a plan document
#[derive(Default)]
pub struct PlanFixture {
    resources: Vec<ResourceChange>,
}

impl PlanFixture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resource change with the given action tokens
    pub fn resource(mut self, address: &str, actions: &[&str]) -> Self {
        self.resources.push(ResourceChange::new(address, actions));
        self
    }

    /// Add `count` created resources named `{prefix}_{i}`
    pub fn created(mut self, prefix: &str, count: usize) -> Self {
        for i in 0..count {
            self.resources
                .push(ResourceChange::new(&format!("{}_{:04}", prefix, i), &["create"]));
        }
        self
    }

    /// The resource changes added so far
    pub fn changes(&self) -> Vec<ResourceChange> {
        self.resources.clone()
    }

    /// Serialize as a plan JSON document
    pub fn to_json(&self) -> String {
        json!({
            "format_version": "1.2",
            "terraform_version": "1.6.0",
            "resource_changes": self.resources,
        })
        .to_string()
    }
}
