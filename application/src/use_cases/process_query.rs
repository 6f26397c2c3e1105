//! Process Query use case.
//!
//! [`ConversationController`] drives one user query to a final answer:
//!
//! ```text
//! UserText ─▶ ModelCall ──(tool requests?)──▶ ToolDispatch ─┐
//!                 ▲   │                                      │
//!                 │   └──(none)──▶ Done                      │
//!                 └──────────── one re-query per batch ◀─────┘
//! ```
//!
//! Every text segment the model produces goes into the answer (newline
//! joined) and into the transcript. Failed tool calls add a
//! `[Tool <name> failed: <diagnostic>]` marker to the answer; the conversation
//! carries on so the model can react to the failure.

use crate::client::ClientError;
use crate::config::{CompletionSettings, ExecutionParams};
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::model_gateway::ModelGateway;
use crate::ports::progress::QueryProgress;
use crate::ports::tool_transport::ToolTransport;
use crate::use_cases::dispatch_tools::ToolDispatcher;
use mediator_domain::util::truncate_str;
use mediator_domain::{ToolCatalog, ToolResultEntry, Transcript};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Runs the model/tool loop for one query at a time.
pub struct ConversationController {
    gateway: Arc<dyn ModelGateway>,
    dispatcher: ToolDispatcher,
    conversation_logger: Arc<dyn ConversationLogger>,
}

impl ConversationController {
    pub fn new(gateway: Arc<dyn ModelGateway>) -> Self {
        Self {
            gateway,
            dispatcher: ToolDispatcher::new(),
            conversation_logger: Arc::new(NoConversationLogger),
        }
    }

    /// Create with a conversation logger.
    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.conversation_logger = logger;
        self
    }

    pub fn dispatcher(&self) -> &ToolDispatcher {
        &self.dispatcher
    }

    /// Process `query` against `transcript`, returning the assembled answer.
    ///
    /// The caller owns the transcript for the duration of the call. On
    /// success and on every error path the transcript holds no request
    /// without a result.
    pub async fn process(
        &self,
        query: &str,
        transcript: &mut Transcript,
        transport: &dyn ToolTransport,
        settings: &CompletionSettings,
        params: &ExecutionParams,
        progress: &dyn QueryProgress,
    ) -> Result<String, ClientError> {
        info!("Processing query: {}", truncate_str(query, 100));
        self.conversation_logger.log(ConversationEvent::new(
            "user_query",
            serde_json::json!({ "query": query, "model": settings.model }),
        ));

        transcript.push_user_text(query);
        let result = self
            .run_loop(transcript, transport, settings, params, progress)
            .await;

        match &result {
            Ok(answer) => self.conversation_logger.log(ConversationEvent::new(
                "query_completed",
                serde_json::json!({ "bytes": answer.len(), "entries": transcript.len() }),
            )),
            Err(e) => self.conversation_logger.log(ConversationEvent::new(
                "query_failed",
                serde_json::json!({ "error": e.to_string() }),
            )),
        }
        result
    }

    async fn run_loop(
        &self,
        transcript: &mut Transcript,
        transport: &dyn ToolTransport,
        settings: &CompletionSettings,
        params: &ExecutionParams,
        progress: &dyn QueryProgress,
    ) -> Result<String, ClientError> {
        // Snapshot once per query; the catalog only changes on connect
        let catalog: Option<ToolCatalog> = transport
            .state()
            .catalog()
            .filter(|c| !c.is_empty())
            .cloned();
        debug!(
            "Query: {} tools available",
            catalog.as_ref().map_or(0, |c| c.len())
        );

        let mut segments: Vec<String> = Vec::new();
        let mut rounds = 0usize;

        loop {
            progress.on_model_call_start(rounds);
            let response = self
                .gateway
                .complete(settings, transcript, catalog.as_ref())
                .await?;
            let (texts, requests) = response.into_parts();
            progress.on_model_call_end(rounds, requests.len());

            self.conversation_logger.log(ConversationEvent::new(
                "model_response",
                serde_json::json!({
                    "round": rounds,
                    "text": texts,
                    "tool_requests": requests.len(),
                }),
            ));

            for text in texts {
                // The Messages API rejects blank text blocks on the way back in
                if text.trim().is_empty() {
                    continue;
                }
                transcript.push_assistant_text(text.as_str());
                segments.push(text);
            }

            if requests.is_empty() {
                break;
            }

            if rounds >= params.max_tool_rounds {
                warn!(
                    "Tool loop exceeded max_tool_rounds ({}); {} requests left unserviced",
                    params.max_tool_rounds,
                    requests.len()
                );
                return Err(ClientError::ToolLoopExceeded { rounds });
            }
            rounds += 1;

            for req in &requests {
                if params.annotate_tool_calls {
                    segments.push(format!(
                        "[Calling tool {} with args {}]",
                        req.tool_name, req.arguments
                    ));
                }
                self.conversation_logger.log(ConversationEvent::new(
                    "tool_call",
                    serde_json::json!({
                        "round": rounds,
                        "request_id": req.id,
                        "tool": req.tool_name,
                        "arguments": req.arguments,
                    }),
                ));
            }

            transcript.push_tool_requests(requests.iter().cloned())?;
            let results = self
                .dispatcher
                .dispatch_all(transport, &requests, params, progress)
                .await;

            for result in results {
                self.conversation_logger.log(ConversationEvent::new(
                    "tool_result",
                    serde_json::json!({
                        "round": rounds,
                        "request_id": result.request_id,
                        "result_id": result.result_id,
                        "tool": result.tool_name,
                        "is_error": result.is_error,
                        "bytes": result.content.len(),
                    }),
                ));
                if result.is_error {
                    segments.push(format!(
                        "[Tool {} failed: {}]",
                        result.tool_name, result.content
                    ));
                }
                transcript.push_tool_result(result)?;
            }

            debug!(round = rounds, "Tool round complete; re-querying model");
        }

        info!("Query completed after {} tool rounds", rounds);
        Ok(segments.join("\n"))
    }

    /// Answer every open tool request in `transcript` with an error result.
    ///
    /// Used when a query is abandoned mid-dispatch (deadline expiry) so the
    /// transcript handed back to the caller is still balanced.
    pub fn close_unpaired(&self, transcript: &mut Transcript, reason: &str) {
        let open: Vec<_> = transcript
            .unpaired_requests()
            .into_iter()
            .map(|r| (r.id.clone(), r.tool_name.clone()))
            .collect();
        for (request_id, tool_name) in open {
            let entry = ToolResultEntry {
                request_id,
                result_id: self.dispatcher.next_result_id(),
                tool_name,
                content: reason.to_string(),
                is_error: true,
            };
            if let Err(e) = transcript.push_tool_result(entry) {
                warn!("Could not close open tool request: {}", e);
            }
        }
    }
}
