//! Tool-call extraction from raw model replies.
//!
//! Models embed action requests in their reply text, either fenced:
//!
//! ````text
//! ```tool
//! {"name": "web_search", "arguments": {"query": "..."}}
//! ```
//! ````
//!
//! or as a bare `{"name": ..., "arguments": {...}}` object (double or single
//! quoted). One scanner recognizes both forms, validates each candidate into a
//! [`ToolInvocation`], and returns what is left as the visible text.

use std::ops::Range;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use crate::core_types::ToolInvocation;
use crate::errors::ToolParseError;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedReply {
    pub visible_text: String,
    pub tool_calls: Vec<ToolInvocation>,
    /// Candidates that looked like tool calls but did not validate.
    pub rejected: Vec<ToolParseError>,
}

impl ExtractedReply {
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    /// Nothing to show and nothing to do: the reply was most likely cut off.
    pub fn is_degenerate(&self) -> bool {
        self.visible_text.is_empty() && self.tool_calls.is_empty()
    }
}

struct Candidate {
    span: Range<usize>,
    parsed: Result<ToolInvocation, ToolParseError>,
}

pub struct ToolCallExtractor;

impl ToolCallExtractor {
    /// Extraction repeats until the remaining text holds no candidate, since
    /// cutting a span out can join its neighbours into a new one.
    pub fn extract(text: &str) -> ExtractedReply {
        let mut reply = ExtractedReply::default();
        let mut remaining = Self::tidy(text);

        loop {
            let candidates = Self::candidates(&remaining);
            if candidates.is_empty() {
                break;
            }

            let mut removed = Vec::with_capacity(candidates.len());
            for candidate in candidates {
                removed.push(candidate.span);
                match candidate.parsed {
                    Ok(invocation) => {
                        if reply.tool_calls.iter().any(|c| c.name() == invocation.name()) {
                            log::debug!("Dropping duplicate '{}' tool call", invocation.name());
                            continue;
                        }
                        reply.tool_calls.push(invocation);
                    }
                    Err(e) => {
                        log::debug!("Rejected tool call candidate: {}", e);
                        reply.rejected.push(e);
                    }
                }
            }
            remaining = Self::tidy(&Self::remove_spans(&remaining, &removed));
        }

        reply.visible_text = remaining;
        reply
    }

    fn candidates(text: &str) -> Vec<Candidate> {
        let mut candidates = Self::fenced_candidates(text);
        let fenced: Vec<Range<usize>> = candidates.iter().map(|c| c.span.clone()).collect();
        candidates.extend(Self::inline_candidates(text, &fenced));
        candidates.sort_by_key(|c| c.span.start);
        candidates
    }

    /// Parses one `{name, arguments}` object. Strict JSON first, then with
    /// single quotes normalized to double quotes.
    pub fn parse_candidate(raw: &str) -> Result<ToolInvocation, ToolParseError> {
        let value = match serde_json::from_str::<Value>(raw) {
            Ok(value) => value,
            Err(strict_err) => serde_json::from_str::<Value>(&raw.replace('\'', "\""))
                .map_err(|_| ToolParseError::InvalidJson(strict_err.to_string()))?,
        };

        let object = value.as_object().ok_or(ToolParseError::NotAnObject)?;
        let name = object
            .get("name")
            .and_then(Value::as_str)
            .map(str::trim)
            .ok_or(ToolParseError::MissingName)?;

        let arguments = match object.get("arguments") {
            // Some models stringify the arguments object.
            Some(Value::String(encoded)) => serde_json::from_str::<Value>(encoded)
                .map_err(|_| ToolParseError::MissingArguments(name.to_string()))?,
            Some(value) => value.clone(),
            None => return Err(ToolParseError::MissingArguments(name.to_string())),
        };

        ToolInvocation::from_parts(name, &arguments)
    }

    fn fence_pattern() -> &'static Regex {
        static FENCE: OnceLock<Regex> = OnceLock::new();
        FENCE.get_or_init(|| {
            Regex::new(r"(?s)```[ \t]*(?:tool_call|tool)\b[ \t]*\r?\n?(.*?)(?:```|\z)")
                .expect("fence pattern is valid")
        })
    }

    /// Fenced blocks are always removed, even when their body is malformed.
    fn fenced_candidates(text: &str) -> Vec<Candidate> {
        Self::fence_pattern()
            .captures_iter(text)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let body = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
                let parsed = match body.find('{') {
                    Some(open) => match Self::balanced_object_end(body, open) {
                        Some(end) => Self::parse_candidate(&body[open..end]),
                        None => Self::parse_candidate(body[open..].trim()),
                    },
                    None => Err(ToolParseError::NotAnObject),
                };
                Some(Candidate {
                    span: whole.range(),
                    parsed,
                })
            })
            .collect()
    }

    /// Bare objects whose first key is `name`. Only objects that are
    /// structurally tool calls are removed from the text; anything that
    /// fails to parse stays visible.
    fn inline_candidates(text: &str, excluded: &[Range<usize>]) -> Vec<Candidate> {
        let mut candidates = Vec::new();
        let mut cursor = 0;

        while let Some(found) = text[cursor..].find('{') {
            let start = cursor + found;
            if let Some(range) = excluded.iter().find(|r| r.contains(&start)) {
                cursor = range.end;
                continue;
            }
            if !Self::starts_with_name_key(&text[start + 1..]) {
                cursor = start + 1;
                continue;
            }
            let Some(end) = Self::balanced_object_end(text, start) else {
                cursor = start + 1;
                continue;
            };
            if excluded.iter().any(|r| r.start < end && start < r.end) {
                cursor = start + 1;
                continue;
            }

            let parsed = Self::parse_candidate(&text[start..end]);
            let is_tool_syntax = matches!(
                parsed,
                Ok(_) | Err(ToolParseError::UnknownTool(_)) | Err(ToolParseError::InvalidArgument { .. })
            );
            if is_tool_syntax {
                candidates.push(Candidate {
                    span: start..end,
                    parsed,
                });
                cursor = end;
            } else {
                cursor = start + 1;
            }
        }

        candidates
    }

    fn starts_with_name_key(rest: &str) -> bool {
        let rest = rest.trim_start();
        rest.starts_with("\"name\"") || rest.starts_with("'name'")
    }

    /// Exclusive end of the object opened at `start`, skipping braces inside
    /// single- or double-quoted strings.
    fn balanced_object_end(text: &str, start: usize) -> Option<usize> {
        let mut depth = 0usize;
        let mut in_string: Option<char> = None;
        let mut escaped = false;

        for (offset, ch) in text[start..].char_indices() {
            if let Some(quote) = in_string {
                if escaped {
                    escaped = false;
                } else if ch == '\\' {
                    escaped = true;
                } else if ch == quote {
                    in_string = None;
                }
                continue;
            }
            match ch {
                '"' | '\'' => in_string = Some(ch),
                '{' => depth += 1,
                '}' => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return Some(start + offset + ch.len_utf8());
                    }
                }
                _ => {}
            }
        }
        None
    }

    fn remove_spans(text: &str, spans: &[Range<usize>]) -> String {
        let mut visible = String::with_capacity(text.len());
        let mut cursor = 0;
        for span in spans {
            if span.start < cursor {
                continue;
            }
            visible.push_str(&text[cursor..span.start]);
            cursor = span.end;
        }
        visible.push_str(&text[cursor..]);
        visible
    }

    /// Collapses runs of blank lines and trims the ends.
    fn tidy(text: &str) -> String {
        static BLANK_RUNS: OnceLock<Regex> = OnceLock::new();
        let blank_runs = BLANK_RUNS
            .get_or_init(|| Regex::new(r"\n[ \t]*(?:\n[ \t]*)+\n").expect("blank-line pattern is valid"));
        blank_runs.replace_all(text, "\n\n").trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn search(query: &str) -> ToolInvocation {
        ToolInvocation::WebSearch {
            query: query.to_string(),
        }
    }

    #[test]
    fn test_fenced_tool_block() {
        let reply = "Let me check.\n```tool\n{\"name\":\"web_search\",\"arguments\":{\"query\":\"weather Tokyo\"}}\n```";
        let extracted = ToolCallExtractor::extract(reply);
        assert_eq!(extracted.visible_text, "Let me check.");
        assert_eq!(extracted.tool_calls, vec![search("weather Tokyo")]);
        assert!(extracted.rejected.is_empty());
    }

    #[test]
    fn test_duplicate_fenced_blocks_are_deduplicated() {
        let reply = "```tool\n{\"name\":\"web_search\",\"arguments\":{\"query\":\"first\"}}\n```\n```tool\n{\"name\":\"web_search\",\"arguments\":{\"query\":\"second\"}}\n```";
        let extracted = ToolCallExtractor::extract(reply);
        assert_eq!(extracted.tool_calls, vec![search("first")]);
        assert_eq!(extracted.visible_text, "");
    }

    #[test]
    fn test_distinct_tools_keep_textual_order() {
        let reply = r#"Searching and reading.
```tool
{"name": "fetch_url", "arguments": {"url": "https://example.com/a"}}
```
{"name": "web_search", "arguments": {"query": "example"}}"#;
        let extracted = ToolCallExtractor::extract(reply);
        assert_eq!(extracted.tool_calls.len(), 2);
        assert_eq!(extracted.tool_calls[0].name(), "fetch_url");
        assert_eq!(extracted.tool_calls[1].name(), "web_search");
        assert_eq!(extracted.visible_text, "Searching and reading.");
    }

    #[test]
    fn test_inline_double_quoted_object() {
        let reply = r#"I'll look that up {"name": "web_search", "arguments": {"query": "rust 2024 edition"}} now."#;
        let extracted = ToolCallExtractor::extract(reply);
        assert_eq!(extracted.tool_calls, vec![search("rust 2024 edition")]);
        assert_eq!(extracted.visible_text, "I'll look that up  now.");
    }

    #[test]
    fn test_inline_single_quoted_object_is_normalized() {
        let reply = "Checking {'name': 'fetch_url', 'arguments': {'url': 'https://example.org'}}";
        let extracted = ToolCallExtractor::extract(reply);
        assert_eq!(
            extracted.tool_calls,
            vec![ToolInvocation::FetchUrl {
                url: "https://example.org".to_string()
            }]
        );
        assert_eq!(extracted.visible_text, "Checking");
    }

    #[test]
    fn test_stringified_arguments_are_accepted() {
        let reply = r#"{"name": "web_search", "arguments": "{\"query\": \"tokio\"}"}"#;
        let extracted = ToolCallExtractor::extract(reply);
        assert_eq!(extracted.tool_calls, vec![search("tokio")]);
    }

    #[test]
    fn test_malformed_fenced_block_is_dropped_silently() {
        let reply = "Here you go.\n```tool\n{\"name\": \"web_search\", \"arguments\": {\"query\": }\n```";
        let extracted = ToolCallExtractor::extract(reply);
        assert!(extracted.tool_calls.is_empty());
        assert_eq!(extracted.visible_text, "Here you go.");
        assert_eq!(extracted.rejected.len(), 1);
    }

    #[test]
    fn test_unclosed_fence_is_consumed() {
        let reply = "Searching\n```tool\n{\"name\": \"web_search\", \"arguments\": {\"query\": \"cut off\"}}";
        let extracted = ToolCallExtractor::extract(reply);
        assert_eq!(extracted.tool_calls, vec![search("cut off")]);
        assert_eq!(extracted.visible_text, "Searching");
    }

    #[test]
    fn test_unknown_tool_is_rejected_and_removed() {
        let reply = r#"Sure. {"name": "delete_everything", "arguments": {}}"#;
        let extracted = ToolCallExtractor::extract(reply);
        assert!(extracted.tool_calls.is_empty());
        assert_eq!(
            extracted.rejected,
            vec![ToolParseError::UnknownTool("delete_everything".to_string())]
        );
        assert_eq!(extracted.visible_text, "Sure.");
    }

    #[test]
    fn test_ordinary_braces_are_left_alone() {
        let reply = "Use `{name}` placeholders, or a map like {\"a\": 1}. Also {\"name\": \"x\"} alone.";
        let extracted = ToolCallExtractor::extract(reply);
        assert!(extracted.tool_calls.is_empty());
        assert_eq!(extracted.visible_text, reply);
    }

    #[test]
    fn test_degenerate_reply() {
        assert!(ToolCallExtractor::extract("").is_degenerate());
        assert!(ToolCallExtractor::extract("  \n ").is_degenerate());
        assert!(ToolCallExtractor::extract("```tool\nnot json\n```").is_degenerate());
        assert!(!ToolCallExtractor::extract("ok").is_degenerate());
    }

    #[test]
    fn test_blank_line_runs_are_collapsed() {
        let reply = "First.\n\n```tool\n{\"name\":\"web_search\",\"arguments\":{\"query\":\"q\"}}\n```\n\n\nSecond.";
        let extracted = ToolCallExtractor::extract(reply);
        assert_eq!(extracted.visible_text, "First.\n\nSecond.");
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let replies = [
            "Let me check.\n```tool\n{\"name\":\"web_search\",\"arguments\":{\"query\":\"weather Tokyo\"}}\n```",
            "a {\"name\": \"web_search\", \"arguments\": {\"query\": \"x\"}} b {'name': 'fetch_url', 'arguments': {'url': 'https://x.io'}}",
            "```tool\n{broken\n```\ntrailing {\"name\": \"web_search\", \"arguments\": {\"query\": ",
            "nested {\"name\": \"web_search\", \"arguments\": {\"query\": \"{\\\"name\\\": 1}\"}} end",
            "plain text with {braces} and ``` fences ```",
            "{\"name\":\"web_search\",\"arguments\":{\"name\":\"fetch_url\",\"arguments\":{\"url\":\"https://x.io\"}}{\"query\":\"b\"}}",
            "{\"name\":\"web_search\",\"arguments\":```tool\nnot json\n```{\"query\":\"b\"}}",
        ];
        for reply in replies {
            let first = ToolCallExtractor::extract(reply);
            let second = ToolCallExtractor::extract(&first.visible_text);
            assert!(second.tool_calls.is_empty(), "re-extraction found calls in: {:?}", first.visible_text);
            assert_eq!(second.visible_text, first.visible_text);
        }
    }

    #[test]
    fn test_call_joined_by_removing_inner_call_is_extracted() {
        let reply = "{\"name\":\"web_search\",\"arguments\":{\"name\":\"fetch_url\",\"arguments\":{\"url\":\"https://x.io\"}}{\"query\":\"b\"}}";
        let extracted = ToolCallExtractor::extract(reply);
        assert_eq!(
            extracted.tool_calls,
            vec![
                ToolInvocation::FetchUrl {
                    url: "https://x.io".to_string()
                },
                search("b"),
            ]
        );
        assert_eq!(extracted.visible_text, "");
    }

    #[test]
    fn test_call_joined_by_removing_fence_is_extracted() {
        let reply = "Note {\"name\":\"web_search\",\"arguments\":```tool\nnot json\n```{\"query\":\"b\"}}";
        let extracted = ToolCallExtractor::extract(reply);
        assert_eq!(extracted.tool_calls, vec![search("b")]);
        assert_eq!(extracted.rejected, vec![ToolParseError::NotAnObject]);
        assert_eq!(extracted.visible_text, "Note");
    }
}
