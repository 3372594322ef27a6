//! Markdown rendering for a single change category

/// Categories rendered as sections, in report order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Create,
    Delete,
    Update,
    Replace,
}

impl Section {
    /// Action name used in the section heading
    pub fn action(&self) -> &'static str {
        match self {
            Section::Create => "create",
            Section::Delete => "delete",
            Section::Update => "update",
            Section::Replace => "replace",
        }
    }

    /// Diff operator prefixed to each address
    pub fn operator(&self) -> char {
        match self {
            Section::Create => '+',
            Section::Delete => '-',
            Section::Update => '!',
            Section::Replace => '+',
        }
    }

    /// Render this section for the given addresses
    pub fn render(&self, addresses: &[String]) -> String {
        render_section(self.action(), addresses, self.operator())
    }
}

/// Render a titled `diff` block listing `addresses`.
///
/// Returns an empty string when there is nothing to list. Replaced resources
/// get a removal line followed by the `operator` line.
pub fn render_section(action: &str, addresses: &[String], operator: char) -> String {
    if addresses.is_empty() {
        return String::new();
    }

    let mut output = String::new();
    output.push_str(&format!("\n#### Resources to {}\n\n```diff\n", action));

    for address in addresses {
        if action == "replace" {
            output.push_str(&format!("- {}\n", address));
        }
        output.push_str(&format!("{} {}\n", operator, address));
    }

    output.push_str("```\n");
    output
}
