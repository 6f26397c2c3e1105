//! Child-process channel: an MCP server spoken to over its stdin/stdout.

use crate::mcp::error::{McpError, Result};
use crate::mcp::rpc::RpcPeer;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

/// How long a server gets to exit on its own after its input is closed.
const EXIT_GRACE: Duration = Duration::from_secs(2);

/// An MCP server running as a child process.
///
/// The child is killed when the channel is dropped (`kill_on_drop`), and on
/// Linux also when the mediator itself dies (`PR_SET_PDEATHSIG`).
pub struct StdioChannel {
    peer: RpcPeer,
    child: Option<Child>,
}

impl StdioChannel {
    /// Spawn `program args...` with piped stdin/stdout and inherited stderr.
    pub fn spawn(program: &str, args: &[String], env: &HashMap<String, String>) -> Result<Self> {
        which::which(program).map_err(|_| McpError::InterpreterNotFound(program.to_string()))?;
        if let Some(script) = args.first()
            && !Path::new(script).exists()
        {
            return Err(McpError::ScriptNotFound(script.clone()));
        }

        let command_line = format!("{} {}", program, args.join(" "));
        debug!("Spawning MCP server: {}", command_line);

        let mut cmd = Command::new(program);
        cmd.args(args)
            .envs(env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        // Linux: request kernel to send SIGTERM to child when parent dies.
        #[cfg(target_os = "linux")]
        unsafe {
            cmd.pre_exec(|| {
                libc::prctl(libc::PR_SET_PDEATHSIG, libc::SIGTERM);
                Ok(())
            });
        }

        let mut child = cmd.spawn().map_err(|source| McpError::Spawn {
            command: command_line.clone(),
            source,
        })?;

        let stdin = child.stdin.take().ok_or_else(|| {
            McpError::Io(std::io::Error::other("Failed to capture server stdin"))
        })?;
        let stdout = child.stdout.take().ok_or_else(|| {
            McpError::Io(std::io::Error::other("Failed to capture server stdout"))
        })?;

        info!(
            "MCP server started: {} (pid {})",
            command_line,
            child.id().unwrap_or_default()
        );

        Ok(Self {
            peer: RpcPeer::start(program, stdout, stdin),
            child: Some(child),
        })
    }

    /// Channel over arbitrary streams, with no process attached.
    pub fn from_streams<R, W>(label: &str, reader: R, writer: W) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        Self {
            peer: RpcPeer::start(label, reader, writer),
            child: None,
        }
    }

    pub async fn request(&self, method: &str, params: Option<Value>) -> Result<Value> {
        self.peer.request(method, params).await
    }

    pub async fn notify(&self, method: &str, params: Option<Value>) -> Result<()> {
        self.peer.notify(method, params).await
    }

    pub fn is_alive(&self) -> bool {
        !self.peer.is_closed()
    }

    /// Close stdin, give the server a moment to exit, then kill it.
    pub async fn close(&mut self) {
        self.peer.close_input().await;
        self.peer.shutdown();

        let Some(mut child) = self.child.take() else {
            return;
        };
        match tokio::time::timeout(EXIT_GRACE, child.wait()).await {
            Ok(Ok(status)) => debug!("MCP server exited: {}", status),
            Ok(Err(e)) => warn!("Waiting for MCP server failed: {}", e),
            Err(_) => {
                debug!("MCP server did not exit in {:?}, killing", EXIT_GRACE);
                if let Err(e) = child.kill().await {
                    warn!("Failed to kill MCP server: {}", e);
                }
            }
        }
    }
}

impl Drop for StdioChannel {
    fn drop(&mut self) {
        if let Some(child) = self.child.as_mut() {
            debug!("StdioChannel dropping, killing MCP server process");
            let _ = child.start_kill();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_interpreter_is_reported() {
        let err = StdioChannel::spawn(
            "definitely-not-an-interpreter-xyz",
            &["server.py".to_string()],
            &HashMap::new(),
        )
        .err()
        .unwrap();
        assert!(matches!(err, McpError::InterpreterNotFound(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn missing_script_is_reported() {
        let err = StdioChannel::spawn("sh", &["/nonexistent/server.js".to_string()], &HashMap::new())
            .err()
            .unwrap();
        assert!(matches!(err, McpError::ScriptNotFound(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn spawned_process_speaks_over_stdio() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("echo_server.sh");
        // Answers every request line with an empty result for id 1
        std::fs::write(
            &script,
            "while read line; do echo '{\"jsonrpc\":\"2.0\",\"id\":1,\"result\":{\"ok\":true}}'; done\n",
        )
        .unwrap();

        let mut channel = StdioChannel::spawn(
            "sh",
            &[script.to_string_lossy().to_string()],
            &HashMap::new(),
        )
        .unwrap();

        let result = channel.request("initialize", None).await.unwrap();
        assert_eq!(result["ok"], true);
        assert!(channel.is_alive());

        channel.close().await;
    }
}
