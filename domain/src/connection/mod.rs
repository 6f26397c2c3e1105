//! Connection domain module
//!
//! [`ServerLocator`] turns the user-supplied server argument into a concrete
//! way of reaching a tool provider, resolved once at connect time.
//! [`ConnectionState`] is what the transport connector reports back.

use crate::tool::entities::ToolCatalog;
use std::path::Path;
use thiserror::Error;

/// The server argument does not name a recognised kind of tool provider.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unsupported server type '{locator}': expected a .py or .js script or an http(s) URL")]
pub struct UnsupportedServerType {
    pub locator: String,
}

/// How to reach a tool provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerKind {
    /// Spawn a local process and speak to it over stdin/stdout.
    Process { program: String, args: Vec<String> },
    /// Streamable HTTP endpoint.
    Http { url: String },
}

/// A parsed server argument.
///
/// # Examples
///
/// ```
/// use mediator_domain::{ServerKind, ServerLocator};
///
/// let loc = ServerLocator::parse("servers/weather.js").unwrap();
/// assert_eq!(
///     loc.kind(),
///     &ServerKind::Process {
///         program: "node".to_string(),
///         args: vec!["servers/weather.js".to_string()],
///     }
/// );
///
/// assert!(ServerLocator::parse("weather.exe").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerLocator {
    raw: String,
    kind: ServerKind,
}

impl ServerLocator {
    pub fn parse(locator: &str) -> Result<Self, UnsupportedServerType> {
        let trimmed = locator.trim();
        let unsupported = || UnsupportedServerType {
            locator: locator.to_string(),
        };

        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            return Ok(Self {
                raw: trimmed.to_string(),
                kind: ServerKind::Http {
                    url: trimmed.to_string(),
                },
            });
        }

        let ext = Path::new(trimmed)
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(unsupported)?;

        let program = match ext {
            "py" => python_interpreter(),
            "js" => "node",
            _ => return Err(unsupported()),
        };

        Ok(Self {
            raw: trimmed.to_string(),
            kind: ServerKind::Process {
                program: program.to_string(),
                args: vec![trimmed.to_string()],
            },
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn kind(&self) -> &ServerKind {
        &self.kind
    }

    pub fn is_http(&self) -> bool {
        matches!(self.kind, ServerKind::Http { .. })
    }
}

impl std::fmt::Display for ServerLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.raw)
    }
}

fn python_interpreter() -> &'static str {
    if cfg!(windows) { "python" } else { "python3" }
}

/// Whether a tool provider session is live, and the catalog it exposed.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connected {
        server: String,
        catalog: ToolCatalog,
    },
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected { .. })
    }

    pub fn catalog(&self) -> Option<&ToolCatalog> {
        match self {
            ConnectionState::Connected { catalog, .. } => Some(catalog),
            ConnectionState::Disconnected => None,
        }
    }

    pub fn server(&self) -> Option<&str> {
        match self {
            ConnectionState::Connected { server, .. } => Some(server),
            ConnectionState::Disconnected => None,
        }
    }
}
