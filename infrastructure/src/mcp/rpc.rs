//! Line-delimited JSON-RPC peer.
//!
//! [`RpcPeer`] owns one byte stream pair (a child's stdout/stdin, or any
//! `AsyncRead`/`AsyncWrite` in tests) and multiplexes concurrent requests
//! over it. A single background reader task owns the read half and routes
//! each incoming line:
//!
//! - **Response** → the waiting request's `oneshot` (matched on `id`)
//! - **Server request** → answered directly (`ping` → `{}`, anything else →
//!   method-not-found)
//! - **Notification** → logged
//!
//! When the reader ends (EOF, read error, shutdown) every waiting request
//! fails with [`McpError::TransportClosed`] and [`RpcPeer::is_closed`] turns
//! true.

use crate::mcp::error::{McpError, Result};
use crate::mcp::protocol::{
    JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, JsonRpcResponseOut, METHOD_NOT_FOUND,
    MessageKind, classify_message,
};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, MutexGuard};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};
use tokio::sync::{Mutex, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

type BoxedWriter = BufWriter<Box<dyn AsyncWrite + Send + Unpin>>;
type PendingSenders = HashMap<u64, oneshot::Sender<JsonRpcResponse>>;
type PendingMap = Arc<std::sync::Mutex<PendingSenders>>;

fn lock_pending(pending: &PendingMap) -> MutexGuard<'_, PendingSenders> {
    pending.lock().unwrap_or_else(|e| e.into_inner())
}

/// Drops a request's pending entry when its caller stops waiting, whether it
/// got an answer, failed, or was cancelled by a timeout.
struct PendingGuard<'a> {
    pending: &'a PendingMap,
    id: u64,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        lock_pending(self.pending).remove(&self.id);
    }
}

/// JSON-RPC endpoint over a newline-delimited stream.
pub struct RpcPeer {
    label: String,
    writer: Arc<Mutex<BoxedWriter>>,
    pending: PendingMap,
    next_id: AtomicU64,
    /// Cancelled by the reader task when it exits.
    closed: CancellationToken,
    /// Cancelled by us to stop the reader task.
    shutdown: CancellationToken,
    _reader_handle: JoinHandle<()>,
}

impl RpcPeer {
    /// Start the background reader and return the peer.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start<R, W>(label: impl Into<String>, reader: R, writer: W) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let label = label.into();
        let boxed: Box<dyn AsyncWrite + Send + Unpin> = Box::new(writer);
        let writer = Arc::new(Mutex::new(BufWriter::new(boxed)));
        let pending: PendingMap = Arc::new(std::sync::Mutex::new(HashMap::new()));
        let closed = CancellationToken::new();
        let shutdown = CancellationToken::new();

        let reader_handle = tokio::spawn(Self::reader_loop(
            label.clone(),
            BufReader::new(reader),
            Arc::clone(&pending),
            Arc::clone(&writer),
            closed.clone(),
            shutdown.clone(),
        ));

        Self {
            label,
            writer,
            pending,
            next_id: AtomicU64::new(1),
            closed,
            shutdown,
            _reader_handle: reader_handle,
        }
    }

    async fn reader_loop<R>(
        label: String,
        reader: BufReader<R>,
        pending: PendingMap,
        writer: Arc<Mutex<BoxedWriter>>,
        closed: CancellationToken,
        shutdown: CancellationToken,
    ) where
        R: AsyncRead + Send + Unpin,
    {
        let mut lines = reader.lines();
        loop {
            let line = tokio::select! {
                _ = shutdown.cancelled() => {
                    debug!("RpcPeer[{}]: shutdown requested", label);
                    break;
                }
                line = lines.next_line() => line,
            };

            match line {
                Ok(Some(line)) => Self::handle_line(&label, &line, &pending, &writer).await,
                Ok(None) => {
                    info!("RpcPeer[{}]: server closed its output", label);
                    break;
                }
                Err(e) => {
                    warn!("RpcPeer[{}]: read error: {}", label, e);
                    break;
                }
            }
        }

        // Drop all senders so waiting requests observe the closure
        closed.cancel();
        lock_pending(&pending).clear();
    }

    async fn handle_line(
        label: &str,
        line: &str,
        pending: &PendingMap,
        writer: &Arc<Mutex<BoxedWriter>>,
    ) {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return;
        }
        trace!("RpcPeer[{}] received: {}", label, trimmed);

        let json: Value = match serde_json::from_str(trimmed) {
            Ok(v) => v,
            Err(_) => {
                warn!("RpcPeer[{}]: skipping non-JSON output: {}", label, trimmed);
                return;
            }
        };

        match classify_message(&json) {
            MessageKind::Response => {
                let Some(id) = json.get("id").and_then(|v| v.as_u64()) else {
                    debug!("RpcPeer[{}]: response with foreign id: {}", label, json["id"]);
                    return;
                };
                let response: JsonRpcResponse = match serde_json::from_value(json) {
                    Ok(r) => r,
                    Err(e) => {
                        warn!("RpcPeer[{}]: malformed response: {}", label, e);
                        return;
                    }
                };
                let sender = lock_pending(pending).remove(&id);
                match sender {
                    Some(tx) => {
                        let _ = tx.send(response);
                    }
                    None => debug!("RpcPeer[{}]: no pending receiver for id={}", label, id),
                }
            }
            MessageKind::IncomingRequest => {
                let id = json["id"].clone();
                let method = json["method"].as_str().unwrap_or_default();
                let reply = if method == "ping" {
                    JsonRpcResponseOut::success(id, serde_json::json!({}))
                } else {
                    debug!("RpcPeer[{}]: rejecting server request '{}'", label, method);
                    JsonRpcResponseOut::error(
                        id,
                        METHOD_NOT_FOUND,
                        format!("Method not found: {}", method),
                    )
                };
                if let Err(e) = write_message(writer, &reply).await {
                    warn!("RpcPeer[{}]: failed to answer server request: {}", label, e);
                }
            }
            MessageKind::Notification => {
                let method = json["method"].as_str().unwrap_or_default();
                match method {
                    "notifications/tools/list_changed" => info!(
                        "RpcPeer[{}]: server tool list changed; catalog is refreshed on reconnect",
                        label
                    ),
                    "notifications/message" => {
                        debug!("RpcPeer[{}] server log: {}", label, json["params"])
                    }
                    other => trace!("RpcPeer[{}]: ignoring notification {}", label, other),
                }
            }
            MessageKind::Invalid => {
                warn!("RpcPeer[{}]: message without id or method: {}", label, trimmed);
            }
        }
    }

    /// Send a request and wait for the correlated response.
    pub async fn request(&self, method: &str, params: Option<Value>) -> Result<Value> {
        if self.closed.is_cancelled() {
            return Err(McpError::TransportClosed);
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = JsonRpcRequest::new(id, method, params);
        let (tx, rx) = oneshot::channel();
        lock_pending(&self.pending).insert(id, tx);
        let _guard = PendingGuard {
            pending: &self.pending,
            id,
        };

        write_message(&self.writer, &request).await?;
        debug!("RpcPeer[{}]: sent {} (id={})", self.label, method, id);

        let response = tokio::select! {
            biased;
            response = rx => response.map_err(|_| McpError::TransportClosed)?,
            _ = self.closed.cancelled() => return Err(McpError::TransportClosed),
        };

        response.into_result().map_err(|e| McpError::Rpc {
            code: e.code,
            message: e.message,
        })
    }

    /// Send a notification (no response expected).
    pub async fn notify(&self, method: &str, params: Option<Value>) -> Result<()> {
        if self.closed.is_cancelled() {
            return Err(McpError::TransportClosed);
        }
        write_message(&self.writer, &JsonRpcNotification::new(method, params)).await
    }

    /// Close our write half so the server sees EOF on its input.
    pub async fn close_input(&self) {
        let mut writer = self.writer.lock().await;
        if let Err(e) = writer.shutdown().await {
            debug!("RpcPeer[{}]: closing input: {}", self.label, e);
        }
    }

    /// True once the reader task has stopped.
    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    #[cfg(test)]
    fn pending_len(&self) -> usize {
        lock_pending(&self.pending).len()
    }

    /// Stop the reader task.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}

impl Drop for RpcPeer {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Write one JSON message followed by a newline and flush.
async fn write_message(writer: &Arc<Mutex<BoxedWriter>>, message: &impl Serialize) -> Result<()> {
    let json = serde_json::to_string(message)?;
    trace!("RpcPeer sending: {}", json);
    let mut w = writer.lock().await;
    w.write_all(json.as_bytes()).await?;
    w.write_all(b"\n").await?;
    w.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::{DuplexStream, ReadHalf, WriteHalf, duplex, split};

    /// Server side of an in-memory pipe: read what the peer wrote, write
    /// what the peer should read.
    struct FakeServer {
        lines: tokio::io::Lines<BufReader<ReadHalf<DuplexStream>>>,
        out: WriteHalf<DuplexStream>,
    }

    impl FakeServer {
        async fn recv(&mut self) -> Value {
            let line = self.lines.next_line().await.unwrap().unwrap();
            serde_json::from_str(&line).unwrap()
        }

        async fn send(&mut self, raw: &str) {
            self.out.write_all(raw.as_bytes()).await.unwrap();
            self.out.write_all(b"\n").await.unwrap();
            self.out.flush().await.unwrap();
        }
    }

    fn pair() -> (RpcPeer, FakeServer) {
        let (client_io, server_io) = duplex(64 * 1024);
        let (client_read, client_write) = split(client_io);
        let (server_read, server_write) = split(server_io);
        let peer = RpcPeer::start("test", client_read, client_write);
        let server = FakeServer {
            lines: BufReader::new(server_read).lines(),
            out: server_write,
        };
        (peer, server)
    }

    #[tokio::test]
    async fn request_gets_correlated_response() {
        let (peer, mut server) = pair();

        let server_task = tokio::spawn(async move {
            let req = server.recv().await;
            assert_eq!(req["method"], "tools/list");
            let id = req["id"].as_u64().unwrap();
            server
                .send(&json!({"jsonrpc": "2.0", "id": id, "result": {"tools": []}}).to_string())
                .await;
            server
        });

        let result = peer.request("tools/list", None).await.unwrap();
        assert_eq!(result, json!({"tools": []}));
        server_task.await.unwrap();
    }

    #[tokio::test]
    async fn out_of_order_responses_reach_their_callers() {
        let (peer, mut server) = pair();

        let server_task = tokio::spawn(async move {
            let first = server.recv().await;
            let second = server.recv().await;
            // answer in reverse order
            for req in [&second, &first] {
                let reply = json!({
                    "jsonrpc": "2.0",
                    "id": req["id"],
                    "result": {"echo": req["params"]["n"]}
                });
                server.send(&reply.to_string()).await;
            }
            server
        });

        let (a, b) = tokio::join!(
            peer.request("echo", Some(json!({"n": 1}))),
            peer.request("echo", Some(json!({"n": 2})))
        );
        assert_eq!(a.unwrap()["echo"], 1);
        assert_eq!(b.unwrap()["echo"], 2);
        server_task.await.unwrap();
    }

    #[tokio::test]
    async fn abandoned_request_releases_its_slot() {
        let (peer, mut server) = pair();

        let waited = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            peer.request("tools/call", Some(json!({"name": "slow"}))),
        )
        .await;
        assert!(waited.is_err());
        assert_eq!(peer.pending_len(), 0);

        // A late answer for the abandoned id is dropped quietly.
        let req = server.recv().await;
        server
            .send(&json!({"jsonrpc": "2.0", "id": req["id"], "result": {}}).to_string())
            .await;
        assert!(!peer.is_closed());
    }

    #[tokio::test]
    async fn answered_request_leaves_no_pending_entry() {
        let (peer, mut server) = pair();

        tokio::spawn(async move {
            let req = server.recv().await;
            server
                .send(&json!({"jsonrpc": "2.0", "id": req["id"], "result": {}}).to_string())
                .await;
            server
        });

        peer.request("ping", None).await.unwrap();
        assert_eq!(peer.pending_len(), 0);
    }

    #[tokio::test]
    async fn rpc_error_is_surfaced() {
        let (peer, mut server) = pair();

        tokio::spawn(async move {
            let req = server.recv().await;
            let reply = json!({
                "jsonrpc": "2.0",
                "id": req["id"],
                "error": {"code": -32602, "message": "Unknown tool"}
            });
            server.send(&reply.to_string()).await;
            server
        });

        match peer.request("tools/call", None).await {
            Err(McpError::Rpc { code, message }) => {
                assert_eq!(code, -32602);
                assert_eq!(message, "Unknown tool");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[tokio::test]
    async fn ping_from_server_is_answered() {
        let (_peer, mut server) = pair();

        server
            .send(r#"{"jsonrpc":"2.0","id":"srv-1","method":"ping"}"#)
            .await;
        let reply = server.recv().await;

        assert_eq!(reply["id"], "srv-1");
        assert_eq!(reply["result"], json!({}));
    }

    #[tokio::test]
    async fn unknown_server_request_gets_method_not_found() {
        let (_peer, mut server) = pair();

        server
            .send(r#"{"jsonrpc":"2.0","id":5,"method":"sampling/createMessage","params":{}}"#)
            .await;
        let reply = server.recv().await;

        assert_eq!(reply["id"], 5);
        assert_eq!(reply["error"]["code"], METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn non_json_lines_are_skipped() {
        let (peer, mut server) = pair();

        tokio::spawn(async move {
            let req = server.recv().await;
            server.send("Starting weather server...").await;
            server.send("\x1b[32mready\x1b[0m").await;
            let reply = json!({"jsonrpc": "2.0", "id": req["id"], "result": "ok"});
            server.send(&reply.to_string()).await;
            server
        });

        assert_eq!(peer.request("x", None).await.unwrap(), json!("ok"));
    }

    #[tokio::test]
    async fn eof_fails_pending_and_marks_closed() {
        let (peer, mut server) = pair();

        tokio::spawn(async move {
            let _ = server.recv().await;
            // drop the server: the peer's reader sees EOF
            drop(server);
        });

        let result = peer.request("tools/call", None).await;
        assert!(matches!(result, Err(McpError::TransportClosed)));
        assert!(peer.is_closed());
        assert!(matches!(
            peer.request("tools/list", None).await,
            Err(McpError::TransportClosed)
        ));
    }

    #[tokio::test]
    async fn notify_writes_message_without_id() {
        let (peer, mut server) = pair();

        peer.notify("notifications/initialized", None).await.unwrap();
        let msg = server.recv().await;

        assert_eq!(msg["method"], "notifications/initialized");
        assert!(msg.get("id").is_none());
    }
}
