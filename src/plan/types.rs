//! Data types for Terraform/OpenTofu JSON plans
//!
//! Only the slice of `terraform show -json` that the report needs is modelled
//! here: each resource change's address and its ordered action tokens.

use serde::{Deserialize, Serialize};

/// The change block of a resource change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    /// Ordered action tokens, e.g. `["create"]` or `["delete", "create"]`
    pub actions: Vec<String>,
}

/// A single entry of a plan's `resource_changes` array
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceChange {
    /// Full resource address (e.g., "aws_instance.example", "module.vpc.aws_subnet.main")
    pub address: String,

    /// Planned change for this resource
    pub change: Change,
}

impl ResourceChange {
    /// Create a new resource change
    #[cfg(test)]
    pub fn new(address: &str, actions: &[&str]) -> Self {
        Self {
            address: address.to_string(),
            change: Change {
                actions: actions.iter().map(|a| a.to_string()).collect(),
            },
        }
    }

    /// Classify the action list of this change
    pub fn kind(&self) -> ActionKind {
        ActionKind::from_actions(&self.change.actions)
    }
}

/// Kind of change applied to a resource, derived from its action tokens
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionKind {
    /// Resource is unchanged
    NoOp,
    /// Resource will be created
    Create,
    /// Resource will be updated in-place
    Update,
    /// Resource will be destroyed
    Delete,
    /// Resource will be destroyed and recreated
    Replace,
    /// Any leading token this tool does not report on (e.g. "read")
    Other(String),
}

impl ActionKind {
    /// Classify an action list by its first token.
    ///
    /// Later tokens only matter for `delete`: a delete followed by anything
    /// else is a replacement.
    pub fn from_actions(actions: &[String]) -> Self {
        match actions.first().map(String::as_str) {
            Some("no-op") => ActionKind::NoOp,
            Some("create") => ActionKind::Create,
            Some("update") => ActionKind::Update,
            Some("delete") if actions.len() > 1 => ActionKind::Replace,
            Some("delete") => ActionKind::Delete,
            Some(other) => ActionKind::Other(other.to_string()),
            None => ActionKind::Other(String::new()),
        }
    }
}

/// A parsed plan file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlanDocument {
    /// Raw change list; may be absent or not an array at all
    #[serde(default)]
    pub resource_changes: Option<serde_json::Value>,
}

impl PlanDocument {
    /// Parse a plan document from JSON text
    pub fn from_json(contents: &str) -> serde_json::Result<Self> {
        serde_json::from_str(contents)
    }

    /// Return the change list if it is a non-empty array.
    ///
    /// `Ok(None)` means the plan has no changes to report (missing, not an
    /// array, or empty). An error means the entries have an unexpected shape.
    pub fn changes(&self) -> serde_json::Result<Option<Vec<ResourceChange>>> {
        match &self.resource_changes {
            Some(serde_json::Value::Array(entries)) if !entries.is_empty() => {
                let changes = entries
                    .iter()
                    .map(|entry| ResourceChange::deserialize(entry))
                    .collect::<serde_json::Result<Vec<_>>>()?;
                Ok(Some(changes))
            }
            _ => Ok(None),
        }
    }
}

/// Resource addresses grouped by the kind of change applied to them
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeBucket {
    pub created: Vec<String>,
    pub updated: Vec<String>,
    pub deleted: Vec<String>,
    pub replaced: Vec<String>,
    pub unchanged: Vec<String>,

    /// Addresses with an unrecognized leading action, paired with that action
    pub other: Vec<(String, String)>,
}

impl ChangeBucket {
    /// Get total number of changes
    pub fn total_changes(&self) -> usize {
        self.created.len() + self.updated.len() + self.deleted.len() + self.replaced.len()
    }
}
