//! Command-line and GitHub Action input configuration
//!
//! Every flag can also be set through the `INPUT_*` variable GitHub Actions
//! derives from the action's `with:` inputs, so the same binary works as a
//! local CLI and as an action entrypoint.

use clap::Args;
use clap::builder::FalseyValueParser;
use std::path::{Path, PathBuf};

use crate::github::GitHubContext;
use crate::report::{DEFAULT_MAX_COMMENT_SIZE, ReportOptions};
use crate::traits::{FileSystem, Output};

/// Options shared by every command that builds a report
#[derive(Args, Debug, Clone, Default)]
pub struct ReportArgs {
    /// Plan JSON file(s) from `terraform show -json` (newline-separated in the env var)
    #[arg(long = "json-file", env = "INPUT_JSON-FILE", value_delimiter = '\n', required = true)]
    pub json_file: Vec<String>,

    /// Text placed above each plan summary
    #[arg(long, env = "INPUT_COMMENT-HEADER", default_value = "")]
    pub comment_header: String,

    /// Text placed below each plan summary
    #[arg(long, env = "INPUT_COMMENT-FOOTER", default_value = "")]
    pub comment_footer: String,

    /// File whose contents replace --comment-header
    #[arg(long, env = "INPUT_HEADER-FILE")]
    pub header_file: Option<String>,

    /// File whose contents replace --comment-footer
    #[arg(long, env = "INPUT_FOOTER-FILE")]
    pub footer_file: Option<String>,

    /// Render the plan details expanded
    #[arg(long, env = "INPUT_EXPAND-COMMENT", value_parser = FalseyValueParser::new())]
    pub expand_comment: bool,

    /// Append a link to the workflow run
    #[arg(long, env = "INPUT_INCLUDE-WORKFLOW-LINK", value_parser = FalseyValueParser::new())]
    pub include_workflow_link: bool,

    /// Maximum size of a single comment before it is split into parts
    #[arg(long, env = "INPUT_MAX-COMMENT-SIZE", default_value_t = DEFAULT_MAX_COMMENT_SIZE)]
    pub max_comment_size: usize,
}

/// Options for the `comment` command
#[derive(Args, Debug, Clone, Default)]
pub struct CommentArgs {
    #[command(flatten)]
    pub report: ReportArgs,

    /// Do not comment when a plan has no changes
    #[arg(long, env = "INPUT_QUIET", value_parser = FalseyValueParser::new())]
    pub quiet: bool,

    /// Also write the report to the job summary
    #[arg(long, env = "INPUT_INCLUDE-PLAN-JOB-SUMMARY", value_parser = FalseyValueParser::new())]
    pub include_plan_job_summary: bool,

    /// Token used to post comments
    #[arg(long, env = "INPUT_GITHUB-TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,
}

impl ReportArgs {
    /// Plan files to read, blank entries dropped
    pub fn plan_files(&self) -> Vec<PathBuf> {
        self.json_file
            .iter()
            .map(|f| f.trim())
            .filter(|f| !f.is_empty())
            .map(PathBuf::from)
            .collect()
    }

    /// Resolve header/footer sources and the workflow link into report options
    pub fn report_options(
        &self,
        fs: &dyn FileSystem,
        output: &dyn Output,
        github: &GitHubContext,
    ) -> ReportOptions {
        let workflow_link = if self.include_workflow_link {
            let link = github.workflow_link();
            if link.is_none() {
                output.warning("GITHUB_REPOSITORY is not set; omitting the workflow link");
            }
            link
        } else {
            None
        };

        ReportOptions {
            header: resolve_text(fs, output, "Header", self.header_file.as_deref(), &self.comment_header),
            footer: resolve_text(fs, output, "Footer", self.footer_file.as_deref(), &self.comment_footer),
            expand: self.expand_comment,
            workflow_link,
        }
    }
}

/// Read `file` if it exists, otherwise fall back to the inline text
fn resolve_text(
    fs: &dyn FileSystem,
    output: &dyn Output,
    label: &str,
    file: Option<&str>,
    inline: &str,
) -> String {
    let Some(file) = file.map(str::trim).filter(|f| !f.is_empty()) else {
        return multiline(inline);
    };

    output.info(&format!("{} file input: {}", label, file));

    let path = Path::new(file);
    if !fs.exists(path) {
        output.warning(&format!("{} file not found: {}", label, file));
        return multiline(inline);
    }

    match fs.read_to_string(path) {
        Ok(contents) => {
            let text = contents.trim().to_string();
            output.info(&format!("Read {} from file ({} chars)", label.to_lowercase(), text.len()));
            text
        }
        Err(e) => {
            output.warning(&format!("{:#}", e));
            multiline(inline)
        }
    }
}

/// Normalize multiline input: trim every line and drop blank ones
fn multiline(input: &str) -> String {
    input
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
