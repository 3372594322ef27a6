use crate::config::CommentArgs;
use crate::context::Context;
use crate::github::{CommentClient, GitHubContext, ReqwestClient};
use crate::report::{CommentSplitter, PlanReport, ReportComposer};
use anyhow::{Context as AnyhowContext, Result, bail};

/// Heading of the job summary entry
const JOB_SUMMARY_HEADING: &str = "## Terraform Plan Results";

/// Handles the 'comment' command - posts the plan report on the pull request
pub struct CommentCommand;

impl CommentCommand {
    /// Execute the comment command against the real GitHub API
    pub fn execute(ctx: &Context, args: &CommentArgs) -> Result<()> {
        let github = GitHubContext::from_env(&*ctx.fs);
        let token = args.github_token.as_deref().unwrap_or_default();
        let client = ReqwestClient::new(&github.api_url, token)?;

        Self::run(ctx, args, &github, &client)
    }

    /// Build the report and post it, one comment per fragment, in order
    pub fn run(
        ctx: &Context,
        args: &CommentArgs,
        github: &GitHubContext,
        client: &dyn CommentClient,
    ) -> Result<()> {
        ctx.output.section("Terraform Plan Comment");

        let splitter = CommentSplitter::new(args.report.max_comment_size)?;
        let files = args.report.plan_files();
        if files.is_empty() {
            bail!("No plan files given. Set json-file to one or more plan JSON files.");
        }

        let options = args.report.report_options(&*ctx.fs, &*ctx.output, github);
        let report = ReportComposer::new(&*ctx.fs, &*ctx.output, &options).compose(&files);

        if !report.skipped_files.is_empty() {
            ctx.output.warning(&format!(
                "{} of {} plan file(s) left out of the report",
                report.skipped_files.len(),
                files.len()
            ));
        }

        if args.include_plan_job_summary {
            Self::write_job_summary(ctx, github, &report)?;
        }

        let pr_number = match github.pr_number {
            Some(number) if github.is_pull_request_event() => number,
            _ => {
                ctx.output
                    .warning("Action doesn't seem to be running in a PR workflow context.");
                ctx.output.warning("Skipping comment creation.");
                return Ok(());
            }
        };

        ctx.output.info(&format!(
            "Found PR # {} from workflow context - proceeding to comment.",
            pr_number
        ));

        if report.should_skip_comment(args.quiet) {
            ctx.output
                .info("Quiet mode is enabled and there are no changes to the infrastructure.");
            ctx.output.info("Skipping comment creation.");
            return Ok(());
        }

        let repository = github
            .repository
            .as_ref()
            .context("GITHUB_REPOSITORY is not set; cannot post comments")?;

        if args.github_token.as_deref().is_none_or(|t| t.trim().is_empty()) {
            bail!("A GitHub token is required to post comments. Set github-token.");
        }

        let fragments = splitter.split(&report.body);
        let total = fragments.len();

        ctx.output.info(&format!("Adding {} comment(s) to PR", total));
        ctx.output.key_value("Repository", &repository.to_string());
        ctx.output.key_value("Report size", &format!("{} bytes", report.body.len()));

        for (i, fragment) in fragments.iter().enumerate() {
            ctx.output
                .dimmed(&format!("Posting comment {} of {}...", i + 1, total));

            match client.create_comment(repository, pr_number, fragment) {
                Ok(posted) => ctx.output.success(&format!(
                    "Comment {} posted successfully. URL: {}",
                    i + 1,
                    posted.html_url
                )),
                Err(e) => {
                    ctx.output
                        .error(&format!("Failed to post comment {}: {:#}", i + 1, e));
                    return Err(e.context(format!("Failed to post comment {} of {}", i + 1, total)));
                }
            }
        }

        Ok(())
    }

    /// Append the undivided report to the job summary
    fn write_job_summary(ctx: &Context, github: &GitHubContext, report: &PlanReport) -> Result<()> {
        let Some(path) = &github.step_summary else {
            ctx.output
                .warning("GITHUB_STEP_SUMMARY is not set; skipping the job summary");
            return Ok(());
        };

        ctx.output.info("Adding plan output to job summary");
        ctx.fs
            .append(path, &format!("{}\n{}\n", JOB_SUMMARY_HEADING, report.body))
            .context("Failed to write job summary")
    }
}
