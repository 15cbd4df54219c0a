//! The per-turn orchestration loop.
//!
//! A turn appends the user's message and an empty assistant placeholder, then
//! alternates between asking the model and running the tools it requests until
//! the model answers without tools, the iteration cap is hit, or the model
//! endpoint fails. Every outcome ends with the placeholder holding final text;
//! nothing escapes `run_turn` as an error.

use chrono::Local;
use std::sync::Arc;

use crate::config::{AssistantConfig, ContextConfig, ModelParameters, TabmindConfig};
use crate::core_types::{Attachment, Message, MessageId, Role, ToolCall, UserInput};
use crate::errors::AssistantError;
use crate::llm::{ExtractedReply, LLMFactory, ModelRequest, ToolCallExtractor, LLM};
use crate::memory::{ContextBudget, ContextCompressor, Conversation};
use crate::prompt::{
    tool_results_question, with_last_chance_notice, PromptContext, ITERATION_LIMIT_NOTICE, TRUNCATION_NOTICE,
};
use crate::sink::{PresentationSink, TurnState};
use crate::tools::{ToolExecutor, ToolFactory};

#[derive(Debug, Clone, Default)]
pub struct OrchestratorSettings {
    pub assistant: AssistantConfig,
    pub context: ContextConfig,
    pub model: ModelParameters,
}

impl From<&TabmindConfig> for OrchestratorSettings {
    fn from(config: &TabmindConfig) -> Self {
        Self {
            assistant: config.assistant.clone(),
            context: config.context.clone(),
            model: config.llm.parameters.clone(),
        }
    }
}

/// Mutable state a turn runs against. Borrowed mutably for the whole turn.
#[derive(Debug, Clone)]
pub struct OrchestratorContext {
    pub conversation: Conversation,
    pub settings: OrchestratorSettings,
}

impl OrchestratorContext {
    pub fn new(settings: OrchestratorSettings) -> Self {
        Self {
            conversation: Conversation::new(settings.assistant.greeting.clone()),
            settings,
        }
    }

    pub fn budget(&self) -> ContextBudget {
        ContextBudget::measure(
            self.conversation.messages(),
            self.settings.context.max_tokens,
            self.settings.context.compression_threshold,
        )
    }

    fn compressor(&self) -> ContextCompressor {
        ContextCompressor::new(
            self.settings.context.keep_recent,
            self.settings.context.summary_excerpt_chars,
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    pub state: TurnState,
    pub message_id: MessageId,
    /// Final content of the assistant message.
    pub content: String,
    /// Model calls made during the turn.
    pub iterations: usize,
}

pub struct Orchestrator {
    llm: Arc<dyn LLM>,
    executor: ToolExecutor,
}

impl Orchestrator {
    pub fn new(llm: Arc<dyn LLM>, executor: ToolExecutor) -> Self {
        Self { llm, executor }
    }

    pub fn from_config(config: &TabmindConfig) -> Result<Self, AssistantError> {
        let llm = LLMFactory::create_from_config(&config.llm)?;
        let registry = ToolFactory::create_registry(&config.tools)?;
        log::info!("Registered {} tools", registry.tool_count());
        Ok(Self::new(
            llm,
            ToolExecutor::new(registry, config.tools.result_max_chars),
        ))
    }

    pub async fn run_turn(
        &self,
        ctx: &mut OrchestratorContext,
        input: UserInput,
        sink: &mut dyn PresentationSink,
    ) -> TurnOutcome {
        log::info!("Turn started: {}", input.text);

        let user_id = ctx
            .conversation
            .push(Role::User, input.text.clone(), input.attachments.clone());
        let placeholder_id = ctx.conversation.push(Role::Assistant, "", Vec::new());
        if let Some(placeholder) = ctx.conversation.get(placeholder_id) {
            sink.on_turn_started(placeholder);
        }

        let max_iterations = ctx.settings.assistant.max_iterations.max(1);
        let mut remaining = max_iterations;
        let mut iterations = 0;
        let mut question = input.text.clone();

        loop {
            Self::transition(&TurnState::AwaitingModel, sink);
            remaining -= 1;
            iterations += 1;
            log::info!("Model call {}/{}", iterations, max_iterations);

            Self::compress_if_needed(ctx);

            let outgoing = if remaining == 1 {
                with_last_chance_notice(&question)
            } else {
                question.clone()
            };
            let request = ModelRequest {
                question: outgoing,
                system_context: self.system_context(ctx, user_id, &input.attachments),
                params: ctx.settings.model.clone(),
            };

            let reply = match self.llm.generate(&request).await {
                Ok(reply) => reply,
                Err(e) => {
                    let reason = match e {
                        AssistantError::LLMError(message) => message,
                        other => other.to_string(),
                    };
                    log::error!("Model request failed: {}", reason);
                    return Self::abort(ctx, placeholder_id, reason, iterations, sink);
                }
            };

            Self::transition(&TurnState::Parsing, sink);
            let extracted = ToolCallExtractor::extract(&reply);
            if !extracted.rejected.is_empty() {
                log::debug!("Ignored {} malformed tool call(s)", extracted.rejected.len());
            }

            if extracted.is_degenerate() {
                log::warn!("Model reply was empty after extraction; treating it as truncated");
                return Self::finalize(ctx, placeholder_id, TRUNCATION_NOTICE.to_string(), iterations, sink);
            }

            if !extracted.has_tool_calls() {
                return Self::finalize(ctx, placeholder_id, extracted.visible_text, iterations, sink);
            }

            let ExtractedReply {
                visible_text, tool_calls, ..
            } = extracted;

            if remaining == 0 {
                log::warn!(
                    "Iteration limit of {} reached; dropping {} requested tool call(s)",
                    max_iterations,
                    tool_calls.len()
                );
                let content = if visible_text.is_empty() {
                    ITERATION_LIMIT_NOTICE.to_string()
                } else {
                    visible_text
                };
                return Self::finalize(ctx, placeholder_id, content, iterations, sink);
            }

            Self::transition(&TurnState::ExecutingTools, sink);
            let mut executed = Vec::with_capacity(tool_calls.len());
            for invocation in tool_calls {
                let mut call = ToolCall::new(invocation);
                call.mark_running();
                Self::record_call(ctx, placeholder_id, call.clone(), sink);

                let finished = self.executor.execute(call).await;
                log::info!("Tool '{}' finished with status {:?}", finished.name(), finished.status);
                Self::record_call(ctx, placeholder_id, finished.clone(), sink);
                executed.push(finished);
            }

            question = tool_results_question(&input.text, &executed);
        }
    }

    fn transition(state: &TurnState, sink: &mut dyn PresentationSink) {
        if state.is_terminal() {
            log::info!("Turn state -> {}", state);
        } else {
            log::debug!("Turn state -> {}", state);
        }
        sink.on_state_changed(state);
    }

    fn compress_if_needed(ctx: &mut OrchestratorContext) {
        let budget = ctx.budget();
        log::debug!("Context budget: {}", budget.describe());
        if budget.should_compress(ctx.conversation.len(), ctx.settings.context.min_messages) {
            log::info!("Context usage {} is over the threshold; compressing", budget.describe());
            let compressor = ctx.compressor();
            compressor.compress(&mut ctx.conversation);
        }
    }

    fn system_context(&self, ctx: &OrchestratorContext, user_id: MessageId, attachments: &[Attachment]) -> String {
        let settings = &ctx.settings.assistant;
        let catalogue = self.executor.catalogue();
        let history = ctx
            .conversation
            .preceding(user_id, settings.history_excerpt_messages);

        PromptContext {
            settings,
            budget: ctx.budget(),
            catalogue: settings.tools_enabled.then_some(catalogue.as_slice()),
            attachments,
            history,
            now: Local::now(),
        }
        .compose()
    }

    /// Inserts `call` into the placeholder's tool calls, or replaces the entry
    /// with the same id.
    fn record_call(
        ctx: &mut OrchestratorContext,
        placeholder_id: MessageId,
        call: ToolCall,
        sink: &mut dyn PresentationSink,
    ) {
        let Some(placeholder) = ctx.conversation.get_mut(placeholder_id) else {
            log::error!("Assistant message {:?} disappeared mid-turn", placeholder_id);
            return;
        };
        match placeholder.tool_calls.iter_mut().find(|c| c.id == call.id) {
            Some(existing) => *existing = call,
            None => placeholder.tool_calls.push(call),
        }
        sink.on_tool_calls_updated(placeholder_id, &placeholder.tool_calls);
    }

    fn finalize(
        ctx: &mut OrchestratorContext,
        placeholder_id: MessageId,
        content: String,
        iterations: usize,
        sink: &mut dyn PresentationSink,
    ) -> TurnOutcome {
        Self::set_content(ctx, placeholder_id, content.clone(), sink);
        Self::transition(&TurnState::Finalized, sink);
        log::info!("Turn finalized after {} model call(s)", iterations);
        TurnOutcome {
            state: TurnState::Finalized,
            message_id: placeholder_id,
            content,
            iterations,
        }
    }

    fn abort(
        ctx: &mut OrchestratorContext,
        placeholder_id: MessageId,
        reason: String,
        iterations: usize,
        sink: &mut dyn PresentationSink,
    ) -> TurnOutcome {
        let current = ctx
            .conversation
            .get(placeholder_id)
            .map(|m| m.content.clone())
            .unwrap_or_default();
        let content = if current.is_empty() {
            format!("request failed: {}", reason)
        } else {
            current
        };
        Self::set_content(ctx, placeholder_id, content.clone(), sink);

        let state = TurnState::Aborted(reason);
        Self::transition(&state, sink);
        TurnOutcome {
            state,
            message_id: placeholder_id,
            content,
            iterations,
        }
    }

    fn set_content(
        ctx: &mut OrchestratorContext,
        placeholder_id: MessageId,
        content: String,
        sink: &mut dyn PresentationSink,
    ) {
        match ctx.conversation.get_mut(placeholder_id) {
            Some(message) => {
                message.content = content;
                sink.on_finalized(message);
            }
            None => log::error!("Assistant message {:?} disappeared mid-turn", placeholder_id),
        }
    }
}

/// Last assistant message of the conversation, if any.
pub fn last_reply(conversation: &Conversation) -> Option<&Message> {
    conversation
        .messages()
        .iter()
        .rev()
        .find(|m| m.role == Role::Assistant)
}
