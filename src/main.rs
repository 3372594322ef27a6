mod commands;
mod config;
mod context;
mod github;
mod output;
mod plan;
mod report;
mod test_helpers;
mod traits;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{CommentCommand, RenderCommand};
use config::{CommentArgs, ReportArgs};
use context::Context;

#[derive(Parser)]
#[command(name = "plan-comment")]
#[command(about = "Summarize Terraform/OpenTofu plans as pull request comments", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Post the plan summary as one or more pull request comments
    Comment(CommentArgs),

    /// Print the plan summary to stdout without posting it
    Render {
        #[command(flatten)]
        report: ReportArgs,

        /// Print the comment fragments instead of the whole report
        #[arg(long)]
        split: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Comment(args) => {
            CommentCommand::execute(&Context::new(), &args)?;
        }
        Commands::Render { report, split } => {
            // stdout carries the report itself
            RenderCommand::execute(&Context::with_stderr_logging(), &report, split)?;
        }
    }

    Ok(())
}
