//! REPL input classification

/// What a line typed at the REPL prompt asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Quit,
    Tools,
    Help,
    Empty,
    Unknown(String),
    Query(String),
}

impl ReplCommand {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return ReplCommand::Empty;
        }
        if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
            return ReplCommand::Quit;
        }
        if !line.starts_with('/') {
            return ReplCommand::Query(line.to_string());
        }
        match line {
            "/quit" | "/exit" | "/q" => ReplCommand::Quit,
            "/tools" => ReplCommand::Tools,
            "/help" | "/h" | "/?" => ReplCommand::Help,
            other => ReplCommand::Unknown(other.to_string()),
        }
    }
}
