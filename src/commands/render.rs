use crate::config::ReportArgs;
use crate::context::Context;
use crate::github::GitHubContext;
use crate::report::{CommentSplitter, ReportComposer};
use anyhow::{Context as AnyhowContext, Result, bail};
use std::io::Write;

/// Handles the 'render' command - prints the report without posting it
pub struct RenderCommand;

impl RenderCommand {
    /// Execute the render command, writing to stdout
    pub fn execute(ctx: &Context, args: &ReportArgs, split: bool) -> Result<()> {
        let github = GitHubContext::from_env(&*ctx.fs);
        let stdout = std::io::stdout();
        let mut out = stdout.lock();

        Self::run(ctx, args, split, &github, &mut out)
    }

    /// Render the report, or its comment fragments when `split` is set
    pub fn run(
        ctx: &Context,
        args: &ReportArgs,
        split: bool,
        github: &GitHubContext,
        out: &mut dyn Write,
    ) -> Result<()> {
        let splitter = CommentSplitter::new(args.max_comment_size)?;
        let files = args.plan_files();
        if files.is_empty() {
            bail!("No plan files given. Set --json-file to one or more plan JSON files.");
        }

        let options = args.report_options(&*ctx.fs, &*ctx.output, github);
        let report = ReportComposer::new(&*ctx.fs, &*ctx.output, &options).compose(&files);

        if !split {
            writeln!(out, "{}", report.body).context("Failed to write report")?;
            return Ok(());
        }

        let fragments = splitter.split(&report.body);
        let total = fragments.len();

        for (i, fragment) in fragments.iter().enumerate() {
            writeln!(out, "<!-- fragment {}/{} -->", i + 1, total)
                .and_then(|_| writeln!(out, "{}", fragment))
                .context("Failed to write report")?;
        }

        Ok(())
    }
}
