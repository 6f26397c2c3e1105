//! REPL (Read-Eval-Print Loop) for interactive queries

use super::command::ReplCommand;
use super::prompt::QueryPrompt;
use crate::{ConsoleFormatter, ProgressReporter, SimpleProgress};
use colored::Colorize;
use mediator_application::{ClientError, MediatorClient, NoQueryProgress};
use reedline::{FileBackedHistory, Reedline, Signal};
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing::{debug, warn};

const HISTORY_CAPACITY: usize = 1000;

/// How progress is shown while a query runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressMode {
    /// Spinner when stderr is a terminal, plain lines otherwise.
    Auto,
    Off,
}

/// Run one query with the requested progress display.
pub async fn answer_query(
    client: &mut MediatorClient,
    query: &str,
    mode: ProgressMode,
) -> Result<String, ClientError> {
    match mode {
        ProgressMode::Off => client.process_query_with_progress(query, &NoQueryProgress).await,
        ProgressMode::Auto if std::io::stderr().is_terminal() => {
            let reporter = ProgressReporter::new();
            let result = client.process_query_with_progress(query, &reporter).await;
            reporter.finish();
            result
        }
        ProgressMode::Auto => client.process_query_with_progress(query, &SimpleProgress).await,
    }
}

/// Interactive query REPL
pub struct ChatRepl<'a> {
    client: &'a mut MediatorClient,
    progress: ProgressMode,
}

impl<'a> ChatRepl<'a> {
    pub fn new(client: &'a mut MediatorClient) -> Self {
        Self {
            client,
            progress: ProgressMode::Auto,
        }
    }

    pub fn with_progress(mut self, progress: ProgressMode) -> Self {
        self.progress = progress;
        self
    }

    fn history_path() -> Option<PathBuf> {
        dirs::data_dir().map(|p| p.join("mcp-mediator").join("history.txt"))
    }

    fn line_editor() -> Reedline {
        let editor = Reedline::create();
        let Some(path) = Self::history_path() else {
            return editor;
        };
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        match FileBackedHistory::with_file(HISTORY_CAPACITY, path.clone()) {
            Ok(history) => editor.with_history(Box::new(history)),
            Err(e) => {
                warn!("History disabled ({}): {}", path.display(), e);
                editor
            }
        }
    }

    /// Run until the user quits or closes input.
    pub async fn run(&mut self) -> std::io::Result<()> {
        let mut editor = Self::line_editor();
        let prompt = QueryPrompt;

        self.print_welcome();

        loop {
            let signal = match editor.read_line(&prompt) {
                Ok(signal) => signal,
                Err(e) => {
                    eprintln!("{}", ConsoleFormatter::format_error(&e));
                    return Err(e);
                }
            };

            let line = match signal {
                Signal::Success(line) => line,
                Signal::CtrlC => continue,
                Signal::CtrlD => {
                    println!("Bye!");
                    break;
                }
                #[allow(unreachable_patterns)]
                _ => continue,
            };

            match ReplCommand::parse(&line) {
                ReplCommand::Empty => {}
                ReplCommand::Quit => {
                    println!("Bye!");
                    break;
                }
                ReplCommand::Help => Self::print_help(),
                ReplCommand::Tools => {
                    println!("{}", ConsoleFormatter::format_tools(&self.client.tools()));
                }
                ReplCommand::Unknown(cmd) => {
                    println!("Unknown command: {}", cmd);
                    println!("Type /help for available commands");
                }
                ReplCommand::Query(query) => self.process_query(&query).await,
            }
        }

        Ok(())
    }

    fn print_welcome(&self) {
        println!();
        println!("{}", ConsoleFormatter::header("MCP Mediator"));
        println!();
        if self.client.is_connected() {
            println!("Tools: {}", self.client.tools().names().join(", "));
        } else {
            println!("{}", "Not connected to a tool server.".yellow());
        }
        println!("Model: {}", self.client.model());
        println!();
        println!("Type a question, /help for commands, or quit to exit.");
        println!();
    }

    fn print_help() {
        println!();
        println!("Commands:");
        println!("  /tools            - List the server's tools");
        println!("  /help, /h, /?     - Show this help");
        println!("  quit, exit, /quit - Exit");
        println!();
    }

    async fn process_query(&mut self, query: &str) {
        debug!("REPL query: {}", query);
        match answer_query(self.client, query, self.progress).await {
            Ok(answer) => println!("\n{}\n", ConsoleFormatter::format_answer(&answer)),
            Err(e) => eprintln!("{}", ConsoleFormatter::format_error(&e)),
        }
    }
}
