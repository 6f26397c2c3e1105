//! Progress reporting for query processing

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use mediator_application::QueryProgress;
use mediator_domain::{ToolRequest, ToolResultEntry, util::preview};
use std::sync::Mutex;
use std::time::Duration;

const ARGS_PREVIEW: usize = 60;

fn tool_label(request: &ToolRequest) -> String {
    format!(
        "{} {}",
        request.tool_name,
        preview(&request.arguments.to_string(), ARGS_PREVIEW)
    )
}

fn model_label(round: usize) -> String {
    if round == 0 {
        "Thinking...".to_string()
    } else {
        let plural = if round == 1 { "" } else { "s" };
        format!("Thinking (after {} tool round{})...", round, plural)
    }
}

/// Spinner on stderr showing the current model call or tool invocations.
///
/// Completed tool calls are printed above the spinner so they stay visible
/// after the answer arrives.
pub struct ProgressReporter {
    spinner: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            spinner: Mutex::new(None),
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    fn set_message(&self, message: String) {
        let Ok(mut guard) = self.spinner.lock() else {
            return;
        };
        let spinner = guard.get_or_insert_with(|| {
            let pb = ProgressBar::new_spinner();
            pb.set_style(Self::spinner_style());
            pb.enable_steady_tick(Duration::from_millis(100));
            pb
        });
        spinner.set_message(message);
    }

    fn println(&self, line: String) {
        match self.spinner.lock().ok().and_then(|g| g.clone()) {
            Some(pb) => pb.println(line),
            None => eprintln!("{}", line),
        }
    }

    /// Remove the spinner. Called once the query has finished.
    pub fn finish(&self) {
        if let Ok(mut guard) = self.spinner.lock()
            && let Some(pb) = guard.take()
        {
            pb.finish_and_clear();
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        self.finish();
    }
}

impl QueryProgress for ProgressReporter {
    fn on_model_call_start(&self, round: usize) {
        self.set_message(model_label(round));
    }

    fn on_tool_start(&self, request: &ToolRequest) {
        self.set_message(format!("Calling {}", tool_label(request)));
    }

    fn on_tool_end(&self, request: &ToolRequest, result: &ToolResultEntry) {
        let mark = if result.is_error {
            "x".red()
        } else {
            "v".green()
        };
        self.println(format!("  {} {}", mark, tool_label(request)));
    }
}

/// Simple text-based progress (no spinner), for non-terminal stderr.
pub struct SimpleProgress;

impl QueryProgress for SimpleProgress {
    fn on_model_call_start(&self, round: usize) {
        eprintln!("{} {}", "->".cyan(), model_label(round));
    }

    fn on_tool_start(&self, request: &ToolRequest) {
        eprintln!("  {} {}", "tool".cyan(), tool_label(request));
    }

    fn on_tool_end(&self, request: &ToolRequest, result: &ToolResultEntry) {
        if result.is_error {
            eprintln!(
                "  {} {} failed: {}",
                "x".red(),
                request.tool_name,
                preview(&result.content, ARGS_PREVIEW)
            );
        }
    }
}
