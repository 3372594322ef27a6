//! GitHub Actions run context
//!
//! Everything the tool needs to know about the workflow run comes from the
//! runner environment (`GITHUB_*` variables) and the event payload file.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use std::path::PathBuf;

use crate::report::WorkflowLink;
use crate::traits::FileSystem;

/// Events that run in the context of a pull request
pub const PULL_REQUEST_EVENTS: &[&str] = &["pull_request", "pull_request_target"];

const DEFAULT_SERVER_URL: &str = "https://github.com";
const DEFAULT_API_URL: &str = "https://api.github.com";

lazy_static! {
    static ref PULL_REF: Regex = Regex::new(r"^refs/pull/(\d+)/").expect("Invalid pull ref regex");
}

/// Repository the workflow runs in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    pub owner: String,
    pub name: String,
}

impl Repository {
    /// Parse an `owner/name` slug
    pub fn parse(slug: &str) -> Option<Self> {
        let (owner, name) = slug.trim().split_once('/')?;

        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return None;
        }

        Some(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }
}

impl std::fmt::Display for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Context of the current workflow run
#[derive(Debug, Clone, Default)]
pub struct GitHubContext {
    pub event_name: String,
    pub pr_number: Option<u64>,
    pub repository: Option<Repository>,
    pub workflow: String,
    pub run_id: String,
    pub server_url: String,
    pub api_url: String,

    /// File backing the job summary, when the runner provides one
    pub step_summary: Option<PathBuf>,
}

impl GitHubContext {
    /// Build the context from the process environment
    pub fn from_env(fs: &dyn FileSystem) -> Self {
        Self::from_lookup(fs, |key| std::env::var(key).ok())
    }

    /// Build the context from an arbitrary variable lookup
    pub fn from_lookup<F>(fs: &dyn FileSystem, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let pr_number = var("GITHUB_EVENT_PATH")
            .and_then(|path| fs.read_to_string(&PathBuf::from(path)).ok())
            .and_then(|payload| serde_json::from_str::<Value>(&payload).ok())
            .and_then(|payload| pr_number_from_event(&payload))
            .or_else(|| var("GITHUB_REF").and_then(|r| pr_number_from_ref(&r)));

        Self {
            event_name: var("GITHUB_EVENT_NAME").unwrap_or_default(),
            pr_number,
            repository: var("GITHUB_REPOSITORY").and_then(|slug| Repository::parse(&slug)),
            workflow: var("GITHUB_WORKFLOW").unwrap_or_default(),
            run_id: var("GITHUB_RUN_ID").unwrap_or_default(),
            server_url: var("GITHUB_SERVER_URL").unwrap_or_else(|| DEFAULT_SERVER_URL.to_string()),
            api_url: var("GITHUB_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            step_summary: var("GITHUB_STEP_SUMMARY").map(PathBuf::from),
        }
    }

    /// Whether the run was triggered by a pull request event
    pub fn is_pull_request_event(&self) -> bool {
        PULL_REQUEST_EVENTS.contains(&self.event_name.as_str())
    }

    /// Link to this workflow run, if the repository is known
    pub fn workflow_link(&self) -> Option<WorkflowLink> {
        let repository = self.repository.as_ref()?;

        Some(WorkflowLink {
            workflow: self.workflow.clone(),
            server_url: self.server_url.clone(),
            owner: repository.owner.clone(),
            repo: repository.name.clone(),
            run_id: self.run_id.clone(),
        })
    }
}

/// PR number from an event payload
fn pr_number_from_event(payload: &Value) -> Option<u64> {
    payload
        .pointer("/pull_request/number")
        .or_else(|| payload.pointer("/issue/number"))
        .or_else(|| payload.get("number"))
        .and_then(Value::as_u64)
}

/// PR number from a `refs/pull/<n>/merge` style ref
fn pr_number_from_ref(git_ref: &str) -> Option<u64> {
    PULL_REF
        .captures(git_ref)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}
