//! Console output formatter

use colored::Colorize;
use mediator_domain::{ToolCatalog, util::preview};

/// Longest tool description shown in a tool listing.
const DESCRIPTION_PREVIEW: usize = 100;

/// Formats mediator output for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Banner shown after a successful connect.
    pub fn format_connected(server: &str, catalog: &ToolCatalog) -> String {
        let names = if catalog.is_empty() {
            "(none)".dimmed().to_string()
        } else {
            catalog.names().join(", ")
        };
        format!(
            "{} {} {} {}",
            "Connected to".green(),
            server.bold(),
            "with tools:".green(),
            names
        )
    }

    /// Tool listing for `/tools`.
    pub fn format_tools(catalog: &ToolCatalog) -> String {
        if catalog.is_empty() {
            return "No tools available.".dimmed().to_string();
        }

        let mut output = format!("{} ({})\n", "Tools".cyan().bold(), catalog.len());
        for tool in catalog {
            output.push_str(&format!("  {}", tool.name.yellow().bold()));
            if !tool.description.is_empty() {
                output.push_str(&format!(
                    " - {}",
                    preview(&tool.description, DESCRIPTION_PREVIEW)
                ));
            }
            output.push('\n');
        }
        output
    }

    /// The answer to a query, printed as-is.
    pub fn format_answer(answer: &str) -> String {
        if answer.trim().is_empty() {
            "(the model returned no text)".dimmed().to_string()
        } else {
            answer.to_string()
        }
    }

    /// A single red line.
    pub fn format_error(error: &dyn std::fmt::Display) -> String {
        let text = error.to_string().replace('\n', " ");
        format!("{} {}", "Error:".red().bold(), text.red())
    }

    pub fn header(title: &str) -> String {
        let line = "─".repeat(title.chars().count() + 4);
        format!("╭{}╮\n│  {}  │\n╰{}╯", line, title.bold(), line)
    }
}
