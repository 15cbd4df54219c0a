//! Core type definitions for the assistant conversation
//!
//! This module defines the message and tool-call records that flow between the
//! orchestrator, the model endpoint and the presentation layer. Tool calls are
//! a closed set: a `ToolInvocation` can only be built through its validating
//! constructor, so nothing downstream of the extractor sees loosely-typed
//! argument maps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::errors::ToolParseError;

pub const WEB_SEARCH: &str = "web_search";
pub const FETCH_URL: &str = "fetch_url";

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MessageId(pub u64);

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    User,
    Assistant,
    SystemSummary,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::SystemSummary => "system-summary",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    Image,
    Text,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Attachment {
    pub kind: AttachmentKind,
    pub name: String,
    /// Text content for `Text`, a data URL or base64 blob for `Image`.
    pub payload: String,
}

impl Attachment {
    pub fn text(name: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            kind: AttachmentKind::Text,
            name: name.into(),
            payload: payload.into(),
        }
    }

    pub fn image(name: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            kind: AttachmentKind::Image,
            name: name.into(),
            payload: payload.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Message {
    pub id: MessageId,
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn new(id: MessageId, role: Role, content: impl Into<String>) -> Self {
        Self {
            id,
            role,
            content: content.into(),
            attachments: Vec::new(),
            tool_calls: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn with_attachments(mut self, attachments: Vec<Attachment>) -> Self {
        self.attachments = attachments;
        self
    }
}

/// A validated action request. Serialized in the same `{name, arguments}`
/// shape the model uses on the wire.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "name", content = "arguments", rename_all = "snake_case")]
pub enum ToolInvocation {
    WebSearch { query: String },
    FetchUrl { url: String },
}

impl ToolInvocation {
    pub fn name(&self) -> &'static str {
        match self {
            ToolInvocation::WebSearch { .. } => WEB_SEARCH,
            ToolInvocation::FetchUrl { .. } => FETCH_URL,
        }
    }

    pub fn arguments(&self) -> Value {
        match self {
            ToolInvocation::WebSearch { query } => json!({ "query": query }),
            ToolInvocation::FetchUrl { url } => json!({ "url": url }),
        }
    }

    /// Builds an invocation from a tool name and its raw arguments object,
    /// rejecting unknown tools and missing or ill-typed parameters.
    pub fn from_parts(name: &str, arguments: &Value) -> Result<Self, ToolParseError> {
        let args = arguments
            .as_object()
            .ok_or_else(|| ToolParseError::MissingArguments(name.to_string()))?;

        match name {
            WEB_SEARCH => {
                let query = args
                    .get("query")
                    .and_then(Value::as_str)
                    .map(str::trim)
                    .filter(|q| !q.is_empty())
                    .ok_or_else(|| ToolParseError::InvalidArgument {
                        tool: WEB_SEARCH.to_string(),
                        reason: "missing or empty 'query'".to_string(),
                    })?;
                Ok(ToolInvocation::WebSearch {
                    query: query.to_string(),
                })
            }
            FETCH_URL => {
                let raw = args
                    .get("url")
                    .and_then(Value::as_str)
                    .map(str::trim)
                    .ok_or_else(|| ToolParseError::InvalidArgument {
                        tool: FETCH_URL.to_string(),
                        reason: "missing 'url'".to_string(),
                    })?;
                let parsed = reqwest::Url::parse(raw).map_err(|e| ToolParseError::InvalidArgument {
                    tool: FETCH_URL.to_string(),
                    reason: format!("invalid url '{}': {}", raw, e),
                })?;
                if parsed.scheme() != "http" && parsed.scheme() != "https" {
                    return Err(ToolParseError::InvalidArgument {
                        tool: FETCH_URL.to_string(),
                        reason: format!("unsupported scheme '{}'", parsed.scheme()),
                    });
                }
                Ok(ToolInvocation::FetchUrl {
                    url: raw.to_string(),
                })
            }
            other => Err(ToolParseError::UnknownTool(other.to_string())),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ToolStatus {
    Pending,
    Running,
    Done,
    Error,
}

impl ToolStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ToolStatus::Done | ToolStatus::Error)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ToolCall {
    pub id: String,
    pub invocation: ToolInvocation,
    pub status: ToolStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
}

impl ToolCall {
    pub fn new(invocation: ToolInvocation) -> Self {
        Self {
            id: format!("call_{}", uuid::Uuid::new_v4().simple()),
            invocation,
            status: ToolStatus::Pending,
            result: None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.invocation.name()
    }

    /// `pending -> running`. Returns false if the call already left `pending`.
    pub fn mark_running(&mut self) -> bool {
        if self.status != ToolStatus::Pending {
            log::warn!(
                "Refusing to start tool call {} in status {:?}",
                self.id,
                self.status
            );
            return false;
        }
        self.status = ToolStatus::Running;
        true
    }

    pub fn complete(&mut self, result: String) -> bool {
        self.finish(ToolStatus::Done, result)
    }

    pub fn fail(&mut self, message: String) -> bool {
        self.finish(ToolStatus::Error, message)
    }

    fn finish(&mut self, status: ToolStatus, result: String) -> bool {
        if self.status.is_terminal() {
            log::warn!(
                "Tool call {} is already {:?}; ignoring transition to {:?}",
                self.id,
                self.status,
                status
            );
            return false;
        }
        self.status = status;
        self.result = Some(result);
        true
    }
}

/// One user turn as submitted by the front-end.
#[derive(Debug, Clone, Default)]
pub struct UserInput {
    pub text: String,
    pub attachments: Vec<Attachment>,
}

impl UserInput {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            attachments: Vec::new(),
        }
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }
}

/// Returns at most `max_chars` leading characters of `text`.
pub fn char_prefix(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Cuts `text` to `max_chars` characters, marking the cut with an ellipsis.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    let prefix = char_prefix(text, max_chars);
    if prefix.len() < text.len() {
        format!("{}…", prefix)
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_parts_web_search() {
        let call = ToolInvocation::from_parts(WEB_SEARCH, &json!({"query": " rust async "})).unwrap();
        assert_eq!(
            call,
            ToolInvocation::WebSearch {
                query: "rust async".to_string()
            }
        );
    }

    #[test]
    fn test_from_parts_rejects_bad_payloads() {
        assert_eq!(
            ToolInvocation::from_parts("calculator", &json!({})),
            Err(ToolParseError::UnknownTool("calculator".to_string()))
        );
        assert!(matches!(
            ToolInvocation::from_parts(WEB_SEARCH, &json!({"query": ""})),
            Err(ToolParseError::InvalidArgument { .. })
        ));
        assert!(matches!(
            ToolInvocation::from_parts(FETCH_URL, &json!({"url": "ftp://example.com"})),
            Err(ToolParseError::InvalidArgument { .. })
        ));
        assert!(matches!(
            ToolInvocation::from_parts(FETCH_URL, &json!("https://example.com")),
            Err(ToolParseError::MissingArguments(_))
        ));
    }

    #[test]
    fn test_invocation_wire_shape() {
        let call = ToolInvocation::FetchUrl {
            url: "https://example.com".to_string(),
        };
        let value = serde_json::to_value(&call).unwrap();
        assert_eq!(
            value,
            json!({"name": "fetch_url", "arguments": {"url": "https://example.com"}})
        );
    }

    #[test]
    fn test_terminal_status_is_final() {
        let mut call = ToolCall::new(ToolInvocation::WebSearch {
            query: "x".to_string(),
        });
        assert!(call.mark_running());
        assert!(!call.mark_running());
        assert!(call.complete("ok".to_string()));
        assert!(!call.fail("late".to_string()));
        assert_eq!(call.status, ToolStatus::Done);
        assert_eq!(call.result.as_deref(), Some("ok"));
    }

    #[test]
    fn test_truncate_chars_counts_characters() {
        assert_eq!(truncate_chars("東京の天気", 2), "東京…");
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(char_prefix("abc", 0), "");
    }
}
