use anyhow::{Context, Result, anyhow, bail};
use serde::{Deserialize, Serialize};
use url::Url;

use super::context::Repository;

const USER_AGENT: &str = concat!("plan-comment/", env!("CARGO_PKG_VERSION"));
const GITHUB_API_VERSION: &str = "2022-11-28";

/// A comment created on an issue or pull request
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PostedComment {
    pub html_url: String,
}

#[derive(Serialize)]
struct CreateComment<'a> {
    body: &'a str,
}

/// Client for posting issue comments, as a trait for testing
pub trait CommentClient: Send + Sync {
    fn create_comment(
        &self,
        repository: &Repository,
        issue_number: u64,
        body: &str,
    ) -> Result<PostedComment>;
}

/// Build the REST endpoint for an issue's comments
pub fn comments_url(api_url: &str, repository: &Repository, issue_number: u64) -> Result<Url> {
    let mut url =
        Url::parse(api_url).with_context(|| format!("Invalid GitHub API URL: {}", api_url))?;
    let number = issue_number.to_string();

    url.path_segments_mut()
        .map_err(|_| anyhow!("Invalid GitHub API URL: {}", api_url))?
        .pop_if_empty()
        .extend([
            "repos",
            repository.owner.as_str(),
            repository.name.as_str(),
            "issues",
            number.as_str(),
            "comments",
        ]);

    Ok(url)
}

/// Real GitHub client using reqwest
pub struct ReqwestClient {
    client: reqwest::blocking::Client,
    api_url: String,
    token: String,
}

impl ReqwestClient {
    /// Create a client for the given API base URL and token
    pub fn new(api_url: &str, token: &str) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            api_url: api_url.to_string(),
            token: token.to_string(),
        })
    }
}

impl CommentClient for ReqwestClient {
    fn create_comment(
        &self,
        repository: &Repository,
        issue_number: u64,
        body: &str,
    ) -> Result<PostedComment> {
        let url = comments_url(&self.api_url, repository, issue_number)?;

        let response = self
            .client
            .post(url.clone())
            .bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", GITHUB_API_VERSION)
            .json(&CreateComment { body })
            .send()
            .with_context(|| format!("Failed to send request to: {}", url))?;

        let status = response.status();
        if !status.is_success() {
            let details = response.text().unwrap_or_default();
            bail!(
                "HTTP request failed with status {}: {} {}",
                status,
                url,
                details.trim()
            );
        }

        response
            .json::<PostedComment>()
            .with_context(|| format!("Failed to read response body from: {}", url))
    }
}

/// Mock client recording posted bodies (for testing)
#[cfg(test)]
pub struct MockCommentClient {
    posted: std::sync::Mutex<Vec<(String, u64, String)>>,
    fail_on: Option<usize>,
}

#[cfg(test)]
impl MockCommentClient {
    pub fn new() -> Self {
        Self {
            posted: std::sync::Mutex::new(Vec::new()),
            fail_on: None,
        }
    }

    /// Fail the nth post (1-based) and every post after it
    pub fn failing_on(nth: usize) -> Self {
        Self {
            posted: std::sync::Mutex::new(Vec::new()),
            fail_on: Some(nth),
        }
    }

    /// Bodies posted so far, in order
    pub fn bodies(&self) -> Vec<String> {
        self.posted
            .lock()
            .unwrap()
            .iter()
            .map(|(_, _, body)| body.clone())
            .collect()
    }

    /// (repository, issue number) of every post
    pub fn targets(&self) -> Vec<(String, u64)> {
        self.posted
            .lock()
            .unwrap()
            .iter()
            .map(|(repo, number, _)| (repo.clone(), *number))
            .collect()
    }
}

#[cfg(test)]
impl CommentClient for MockCommentClient {
    fn create_comment(
        &self,
        repository: &Repository,
        issue_number: u64,
        body: &str,
    ) -> Result<PostedComment> {
        let mut posted = self.posted.lock().unwrap();
        let attempt = posted.len() + 1;

        if self.fail_on.is_some_and(|nth| attempt >= nth) {
            bail!("HTTP request failed with status 502 Bad Gateway");
        }

        posted.push((repository.to_string(), issue_number, body.to_string()));
        Ok(PostedComment {
            html_url: format!(
                "https://github.com/{}/pull/{}#issuecomment-{}",
                repository, issue_number, attempt
            ),
        })
    }
}
