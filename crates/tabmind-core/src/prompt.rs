//! Instruction payload and follow-up questions sent to the model.

use chrono::{DateTime, Local};

use crate::config::AssistantConfig;
use crate::core_types::{truncate_chars, Attachment, AttachmentKind, Message, ToolCall};
use crate::memory::ContextBudget;
use crate::tools::ToolMetadata;

pub const TRUNCATION_NOTICE: &str =
    "The response was cut off before it said anything. Please try again or rephrase the question.";

pub const LAST_CHANCE_NOTICE: &str = "This is your last chance to use a tool. Any tool call in your next reply will not be executed, so answer with the information you already have unless one more lookup is essential.";

pub const ITERATION_LIMIT_NOTICE: &str =
    "I reached the limit of tool steps for one question without a final answer. Try asking something narrower.";

/// Everything that goes into the system context for one model call.
pub struct PromptContext<'a> {
    pub settings: &'a AssistantConfig,
    pub budget: ContextBudget,
    /// `None` when tools are disabled.
    pub catalogue: Option<&'a [ToolMetadata]>,
    pub attachments: &'a [Attachment],
    /// Messages preceding the current user message, oldest first.
    pub history: &'a [Message],
    pub now: DateTime<Local>,
}

impl PromptContext<'_> {
    pub fn compose(&self) -> String {
        let mut sections = Vec::new();

        if !self.settings.system_prompt.trim().is_empty() {
            sections.push(self.settings.system_prompt.trim().to_string());
        }

        sections.push(format!(
            "Current date and time: {}\nContext usage: {}",
            self.now.format("%Y-%m-%d %H:%M (%A)"),
            self.budget.describe()
        ));

        if let Some(tools) = self.catalogue.filter(|tools| !tools.is_empty()) {
            sections.push(render_catalogue(tools));
        }

        if !self.attachments.is_empty() {
            sections.push(render_attachments(self.attachments));
        }

        let excerpt = render_history(self.history, self.settings.excerpt_chars);
        if !excerpt.is_empty() {
            sections.push(format!("## Recent conversation\n{}", excerpt));
        }

        sections.join("\n\n")
    }
}

fn render_catalogue(tools: &[ToolMetadata]) -> String {
    let mut out = String::from(
        "## Tools\n\
         You can call tools. To call one, reply with a fenced block like:\n\
         ```tool\n\
         {\"name\": \"<tool name>\", \"arguments\": {...}}\n\
         ```\n\
         Call each tool at most once per reply. Results arrive in the next message.\n",
    );

    for tool in tools {
        let params = tool.input_schema["properties"]
            .as_object()
            .map(|props| {
                props
                    .iter()
                    .map(|(name, schema)| {
                        format!("{}: {}", name, schema["type"].as_str().unwrap_or("any"))
                    })
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .unwrap_or_default();
        out.push_str(&format!("\n- {}({}): {}", tool.name, params, tool.description));
    }
    out
}

fn render_attachments(attachments: &[Attachment]) -> String {
    let mut out = String::from("## Attachments");
    for attachment in attachments {
        match attachment.kind {
            AttachmentKind::Text => {
                out.push_str(&format!("\n[file: {}]\n{}", attachment.name, attachment.payload));
            }
            AttachmentKind::Image => {
                out.push_str(&format!("\n[image: {}]", attachment.name));
            }
        }
    }
    out
}

fn render_history(history: &[Message], excerpt_chars: usize) -> String {
    history
        .iter()
        .filter(|m| !m.content.trim().is_empty())
        .map(|m| {
            format!(
                "{}: {}",
                m.role.as_str(),
                truncate_chars(&m.content.replace('\n', " "), excerpt_chars)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Question for the follow-up model call: this iteration's tool results and
/// a reminder of what the user asked.
pub fn tool_results_question(original_question: &str, calls: &[ToolCall]) -> String {
    let mut out = String::from("Tool results:\n");
    for call in calls {
        out.push_str(&format!(
            "\n[{} {}] ({:?})\n{}\n",
            call.name(),
            call.invocation.arguments(),
            call.status,
            call.result.as_deref().unwrap_or("(no result)")
        ));
    }
    out.push_str(&format!(
        "\nOriginal question: {}\nAnswer it using these results, or call another tool if something is still missing.",
        original_question
    ));
    out
}

pub fn with_last_chance_notice(question: &str) -> String {
    format!("{}\n\n{}", question, LAST_CHANCE_NOTICE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::{MessageId, Role, ToolInvocation};
    use chrono::TimeZone;
    use serde_json::json;

    fn settings() -> AssistantConfig {
        AssistantConfig {
            system_prompt: "You are a helpful new-tab assistant.".to_string(),
            excerpt_chars: 10,
            ..Default::default()
        }
    }

    fn catalogue() -> Vec<ToolMetadata> {
        vec![ToolMetadata {
            name: "web_search".to_string(),
            description: "Search the web.".to_string(),
            input_schema: json!({"type": "object", "properties": {"query": {"type": "string"}}}),
        }]
    }

    fn now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 3, 14, 9, 30, 0).unwrap()
    }

    #[test]
    fn test_compose_includes_all_sections() {
        let settings = settings();
        let tools = catalogue();
        let history = vec![
            Message::new(MessageId(1), Role::Assistant, "Hi! How can I help?"),
            Message::new(MessageId(2), Role::User, "short"),
        ];
        let attachments = vec![
            Attachment::text("notes.txt", "buy milk"),
            Attachment::image("cat.png", "data:image/png;base64,AAAA"),
        ];
        let ctx = PromptContext {
            settings: &settings,
            budget: ContextBudget::measure(&history, 1000, 0.7),
            catalogue: Some(&tools),
            attachments: &attachments,
            history: &history,
            now: now(),
        };

        let text = ctx.compose();
        assert!(text.starts_with("You are a helpful new-tab assistant."));
        assert!(text.contains("Current date and time: 2026-03-14 09:30 (Saturday)"));
        assert!(text.contains("Context usage: ~"));
        assert!(text.contains("- web_search(query: string): Search the web."));
        assert!(text.contains("```tool"));
        assert!(text.contains("[file: notes.txt]\nbuy milk"));
        assert!(text.contains("[image: cat.png]"));
        assert!(!text.contains("base64"));
        assert!(text.contains("assistant: Hi! How ca…"));
        assert!(text.contains("user: short"));
    }

    #[test]
    fn test_catalogue_omitted_when_tools_disabled() {
        let settings = settings();
        let ctx = PromptContext {
            settings: &settings,
            budget: ContextBudget::measure(&[], 1000, 0.7),
            catalogue: None,
            attachments: &[],
            history: &[],
            now: now(),
        };
        let text = ctx.compose();
        assert!(!text.contains("## Tools"));
        assert!(!text.contains("## Recent conversation"));
    }

    #[test]
    fn test_tool_results_question() {
        let mut call = ToolCall::new(ToolInvocation::WebSearch {
            query: "weather Tokyo".to_string(),
        });
        call.mark_running();
        call.complete("Sunny, 21°C".to_string());

        let question = tool_results_question("What's the weather in Tokyo?", &[call]);
        assert!(question.contains("[web_search {\"query\":\"weather Tokyo\"}] (Done)"));
        assert!(question.contains("Sunny, 21°C"));
        assert!(question.contains("Original question: What's the weather in Tokyo?"));
    }

    #[test]
    fn test_last_chance_notice_is_appended() {
        let question = with_last_chance_notice("q");
        assert!(question.starts_with("q\n\n"));
        assert!(question.ends_with(LAST_CHANCE_NOTICE));
    }
}
