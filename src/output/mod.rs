//! Styled terminal output for plan-comment
//!
//! Messages are colored for local runs. Inside GitHub Actions, warnings and
//! errors are emitted as workflow commands so they show up as run annotations.
//! Errors always go to stderr; everything else goes to the chosen [`Stream`],
//! so a command that prints its result on stdout can keep its logs apart.

use lazy_static::lazy_static;
use owo_colors::OwoColorize;

lazy_static! {
    static ref IN_GITHUB_ACTIONS: bool = std::env::var("GITHUB_ACTIONS")
        .map(|v| v == "true")
        .unwrap_or(false);
}

/// Where diagnostic messages are written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

impl Stream {
    fn emit(self, line: &str) {
        match self {
            Stream::Stdout => println!("{}", line),
            Stream::Stderr => eprintln!("{}", line),
        }
    }
}

/// Escape a message for use in a `::command::` line
fn escape_workflow_command(message: &str) -> String {
    message
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// Print a success message with a green checkmark
pub fn success(stream: Stream, message: &str) {
    // Pastel mint green: RGB(152, 225, 152)
    stream.emit(&format!(
        "{} {}",
        "✓".truecolor(152, 225, 152).bold(),
        message.bright_white()
    ));
}

/// Print an error message with a red X
pub fn error(message: &str) {
    if *IN_GITHUB_ACTIONS {
        Stream::Stderr.emit(&format!("::error::{}", escape_workflow_command(message)));
        return;
    }

    // Pastel coral/salmon: RGB(255, 160, 160)
    Stream::Stderr.emit(&format!(
        "{} {}",
        "✗".truecolor(255, 160, 160).bold(),
        message.bright_white()
    ));
}

/// Print a warning message with a yellow warning symbol
pub fn warning(stream: Stream, message: &str) {
    if *IN_GITHUB_ACTIONS {
        stream.emit(&format!("::warning::{}", escape_workflow_command(message)));
        return;
    }

    // Pastel cream/yellow: RGB(255, 230, 160)
    stream.emit(&format!(
        "{} {}",
        "⚠".truecolor(255, 230, 160).bold(),
        message.bright_white()
    ));
}

/// Print an info message with a blue info symbol
pub fn info(stream: Stream, message: &str) {
    // Pastel sky blue: RGB(160, 200, 255)
    stream.emit(&format!(
        "{} {}",
        "ℹ".truecolor(160, 200, 255).bold(),
        message.bright_white()
    ));
}

/// Print a section header with a separator line
pub fn section(stream: Stream, title: &str) {
    // Pastel lavender: RGB(181, 174, 254)
    stream.emit(&format!("\n{}", title.truecolor(181, 174, 254).bold()));
    stream.emit(&format!("{}", "─".repeat(50).truecolor(160, 160, 160)));
}

/// Print a key-value pair with styled key and value
pub fn key_value(stream: Stream, key: &str, value: &str) {
    stream.emit(&format!(
        "  {} {}",
        format!("{}:", key).truecolor(160, 160, 160),
        value.bright_white()
    ));
}

/// Print a dimmed/muted message
pub fn dimmed(stream: Stream, message: &str) {
    stream.emit(&format!("{}", message.truecolor(160, 160, 160)));
}
