//! Builds the markdown report for one run from its plan files

use std::path::{Path, PathBuf};

use crate::plan::{ChangeBucket, PlanDocument, classify};
use crate::traits::{FileSystem, Output};

use super::renderer::Section;

/// Paragraph appended for a plan file with nothing in `resource_changes`
pub const NO_CHANGES_NOTICE: &str = "\n<p>There were no changes done to the infrastructure.</p>\n";

/// Link back to the workflow run that produced the report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowLink {
    pub workflow: String,
    pub server_url: String,
    pub owner: String,
    pub repo: String,
    pub run_id: String,
}

impl WorkflowLink {
    /// URL of the workflow run
    pub fn url(&self) -> String {
        format!(
            "{}/{}/{}/actions/runs/{}",
            self.server_url.trim_end_matches('/'),
            self.owner,
            self.repo,
            self.run_id
        )
    }

    /// Markdown trailer pointing at the run
    pub fn render(&self) -> String {
        format!("\n[Workflow: {}]({})\n", self.workflow, self.url())
    }
}

/// Options controlling how the report is assembled
#[derive(Debug, Clone, Default)]
pub struct ReportOptions {
    /// Text placed before each plan's summary
    pub header: String,

    /// Text placed after each plan's summary
    pub footer: String,

    /// Render the collapsible section expanded
    pub expand: bool,

    /// Optional trailer linking to the workflow run
    pub workflow_link: Option<WorkflowLink>,
}

/// The composed report for a run
#[derive(Debug, Clone, Default)]
pub struct PlanReport {
    /// Markdown body, concatenated across plan files
    pub body: String,

    /// Whether at least one plan file had no changes
    pub has_no_changes: bool,

    /// Files skipped because they could not be read or parsed
    pub skipped_files: Vec<PathBuf>,
}

impl PlanReport {
    /// Whether commenting should be skipped entirely in quiet mode
    pub fn should_skip_comment(&self, quiet: bool) -> bool {
        quiet && self.has_no_changes
    }
}

/// One-line summary with the count of every bucket
pub fn summary_line(bucket: &ChangeBucket) -> String {
    let mut line = format!(
        "Terraform Plan: {} to be created, {} to be deleted, {} to be updated, {} to be replaced, {} unchanged.",
        bucket.created.len(),
        bucket.deleted.len(),
        bucket.updated.len(),
        bucket.replaced.len(),
        bucket.unchanged.len()
    );

    if !bucket.other.is_empty() {
        line.push_str(&format!(" {} with other actions.", bucket.other.len()));
    }

    line
}

/// Assembles plan files into a single markdown report
pub struct ReportComposer<'a> {
    fs: &'a dyn FileSystem,
    output: &'a dyn Output,
    options: &'a ReportOptions,
}

impl<'a> ReportComposer<'a> {
    pub fn new(fs: &'a dyn FileSystem, output: &'a dyn Output, options: &'a ReportOptions) -> Self {
        Self { fs, output, options }
    }

    /// Compose the report for all files, in order.
    ///
    /// Files that cannot be read or parsed are logged and left out.
    pub fn compose(&self, files: &[PathBuf]) -> PlanReport {
        let mut report = PlanReport::default();

        for file in files {
            if let Err(reason) = self.compose_file(file, &mut report) {
                self.output.error(&format!(
                    "{} is not a valid JSON plan file. error: {}",
                    file.display(),
                    reason
                ));
                report.skipped_files.push(file.clone());
            }
        }

        report
    }

    fn compose_file(&self, file: &Path, report: &mut PlanReport) -> Result<(), String> {
        let contents = self.fs.read_to_string(file).map_err(|e| format!("{:#}", e))?;
        let document = PlanDocument::from_json(&contents).map_err(|e| e.to_string())?;

        match document.changes().map_err(|e| e.to_string())? {
            Some(changes) => {
                let bucket = classify(&changes);
                self.output.info(&format!(
                    "{}: {} resource(s) to change, {} unchanged",
                    file.display(),
                    bucket.total_changes(),
                    bucket.unchanged.len()
                ));

                for (address, action) in &bucket.other {
                    self.output.info(&format!(
                        "{}: {} has unsupported action \"{}\"",
                        file.display(),
                        address,
                        action
                    ));
                }

                report.body.push_str(&self.render_plan(&bucket));
            }
            None => {
                report.has_no_changes = true;
                report.body.push_str(NO_CHANGES_NOTICE);
                self.output.info(&format!(
                    "The content of {} did not result in a valid array or the array is empty... Skipping.",
                    file.display()
                ));
            }
        }

        Ok(())
    }

    /// Render one classified plan, wrapped in header, summary and footer
    pub fn render_plan(&self, bucket: &ChangeBucket) -> String {
        let details_tag = if self.options.expand {
            "<details open>"
        } else {
            "<details>"
        };

        let workflow_link = self
            .options
            .workflow_link
            .as_ref()
            .map(WorkflowLink::render)
            .unwrap_or_default();

        // Blank-line framing keeps GitHub from gluing the HTML to the header
        format!(
            "\n{}\n{}\n<summary>\n<b>{}</b>\n</summary>\n{}\n{}\n{}\n{}\n</details>\n{}\n{}\n",
            self.options.header,
            details_tag,
            summary_line(bucket),
            Section::Create.render(&bucket.created),
            Section::Delete.render(&bucket.deleted),
            Section::Update.render(&bucket.updated),
            Section::Replace.render(&bucket.replaced),
            self.options.footer,
            workflow_link
        )
    }
}
