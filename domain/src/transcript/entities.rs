//! Transcript entities

use super::error::TranscriptError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A tool invocation requested by the model.
///
/// `id` is assigned by the model provider and is what the matching
/// [`ToolResultEntry::request_id`] refers back to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolRequest {
    pub id: String,
    pub tool_name: String,
    pub arguments: Value,
}

impl ToolRequest {
    pub fn new(id: impl Into<String>, tool_name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: id.into(),
            tool_name: tool_name.into(),
            arguments,
        }
    }
}

/// The answer to one [`ToolRequest`].
///
/// `result_id` is generated by the dispatcher and is unique within a session;
/// `request_id` correlates the result with the request it answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResultEntry {
    pub request_id: String,
    pub result_id: String,
    pub tool_name: String,
    pub content: String,
    pub is_error: bool,
}

/// One entry of the conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum TranscriptEntry {
    UserText { content: String },
    AssistantText { content: String },
    AssistantToolRequest(ToolRequest),
    ToolResult(ToolResultEntry),
}

impl TranscriptEntry {
    /// Whether this entry was produced by the model (as opposed to the user
    /// or the tool side).
    pub fn is_assistant(&self) -> bool {
        matches!(
            self,
            TranscriptEntry::AssistantText { .. } | TranscriptEntry::AssistantToolRequest(_)
        )
    }
}

/// Ordered, append-only conversation state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a transcript with the user's query.
    pub fn with_user_text(content: impl Into<String>) -> Self {
        let mut t = Self::new();
        t.push_user_text(content);
        t
    }

    pub fn push_user_text(&mut self, content: impl Into<String>) {
        self.entries.push(TranscriptEntry::UserText {
            content: content.into(),
        });
    }

    pub fn push_assistant_text(&mut self, content: impl Into<String>) {
        self.entries.push(TranscriptEntry::AssistantText {
            content: content.into(),
        });
    }

    /// Append a model tool request. Request ids must be unique in the
    /// transcript since results are matched on them.
    pub fn push_tool_request(&mut self, request: ToolRequest) -> Result<(), TranscriptError> {
        if self.find_request(&request.id).is_some() {
            return Err(TranscriptError::DuplicateRequest(request.id));
        }
        self.entries.push(TranscriptEntry::AssistantToolRequest(request));
        Ok(())
    }

    /// Append a batch of tool requests from one model response.
    ///
    /// The batch is checked as a whole first, so on error nothing is
    /// appended and no request is left without a result.
    pub fn push_tool_requests(
        &mut self,
        requests: impl IntoIterator<Item = ToolRequest>,
    ) -> Result<(), TranscriptError> {
        let requests: Vec<ToolRequest> = requests.into_iter().collect();
        for (i, req) in requests.iter().enumerate() {
            let repeated_in_batch = requests[..i].iter().any(|r| r.id == req.id);
            if repeated_in_batch || self.find_request(&req.id).is_some() {
                return Err(TranscriptError::DuplicateRequest(req.id.clone()));
            }
        }
        self.entries
            .extend(requests.into_iter().map(TranscriptEntry::AssistantToolRequest));
        Ok(())
    }

    /// Append the result for an open tool request.
    pub fn push_tool_result(&mut self, result: ToolResultEntry) -> Result<(), TranscriptError> {
        if self.find_request(&result.request_id).is_none() {
            return Err(TranscriptError::UnknownRequest(result.request_id));
        }
        if self.find_result(&result.request_id).is_some() {
            return Err(TranscriptError::AlreadyAnswered(result.request_id));
        }
        self.entries.push(TranscriptEntry::ToolResult(result));
        Ok(())
    }

    /// Requests that have no result yet, in transcript order.
    pub fn unpaired_requests(&self) -> Vec<&ToolRequest> {
        self.requests()
            .filter(|r| self.find_result(&r.id).is_none())
            .collect()
    }

    /// True when every tool request has exactly one result.
    pub fn is_balanced(&self) -> bool {
        self.unpaired_requests().is_empty()
    }

    /// Request/result pairs in request order.
    pub fn tool_pairs(&self) -> Vec<(&ToolRequest, &ToolResultEntry)> {
        self.requests()
            .filter_map(|r| self.find_result(&r.id).map(|res| (r, res)))
            .collect()
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &TranscriptEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn requests(&self) -> impl Iterator<Item = &ToolRequest> {
        self.entries.iter().filter_map(|e| match e {
            TranscriptEntry::AssistantToolRequest(r) => Some(r),
            _ => None,
        })
    }

    fn find_request(&self, id: &str) -> Option<&ToolRequest> {
        self.requests().find(|r| r.id == id)
    }

    fn find_result(&self, request_id: &str) -> Option<&ToolResultEntry> {
        self.entries.iter().find_map(|e| match e {
            TranscriptEntry::ToolResult(r) if r.request_id == request_id => Some(r),
            _ => None,
        })
    }
}
