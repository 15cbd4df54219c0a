//! Runs one tool call to a terminal status.

use crate::core_types::{truncate_chars, ToolCall, ToolStatus};
use crate::tools::{ToolMetadata, ToolRegistry};

pub struct ToolExecutor {
    registry: ToolRegistry,
    result_max_chars: usize,
}

impl ToolExecutor {
    pub fn new(registry: ToolRegistry, result_max_chars: usize) -> Self {
        Self {
            registry,
            result_max_chars,
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn catalogue(&self) -> Vec<ToolMetadata> {
        self.registry.list_tools()
    }

    /// Moves `call` to `done` or `error`. Registry misses, tool errors and
    /// panicking tools all end in `error`; nothing propagates to the caller.
    pub async fn execute(&self, mut call: ToolCall) -> ToolCall {
        if call.status.is_terminal() {
            log::warn!("Tool call {} is already {:?}; not executing", call.id, call.status);
            return call;
        }
        if call.status == ToolStatus::Pending {
            call.mark_running();
        }

        let Some(tool) = self.registry.get_tool(call.name()) else {
            log::error!("No tool registered under '{}'", call.name());
            call.fail(format!("Unknown tool '{}'", call.name()));
            return call;
        };

        log::info!("Executing tool '{}' ({})", call.name(), call.id);
        let invocation = call.invocation.clone();
        let handle = tokio::spawn(async move { tool.execute(&invocation).await });

        match handle.await {
            Ok(Ok(output)) => {
                log::debug!("Tool '{}' produced {} chars", call.name(), output.chars().count());
                call.complete(truncate_chars(&output, self.result_max_chars));
            }
            Ok(Err(e)) => {
                log::warn!("Tool '{}' failed: {}", call.name(), e);
                call.fail(e.to_string());
            }
            Err(join_error) => {
                log::error!("Tool '{}' panicked: {}", call.name(), join_error);
                call.fail(format!("Tool '{}' crashed", call.name()));
            }
        }
        call
    }
}
