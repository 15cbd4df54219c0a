//! One assistant session: an orchestrator plus the context it runs against.
//!
//! Only one turn may run at a time. A turn submitted while another is still
//! running is rejected with [`AssistantError::TurnInProgress`] instead of
//! being queued, and so is a session reset.

use std::sync::Arc;
use tokio::sync::Mutex;

use crate::agent::{Orchestrator, OrchestratorContext, OrchestratorSettings, TurnOutcome};
use crate::config::TabmindConfig;
use crate::core_types::{Message, UserInput};
use crate::errors::AssistantError;
use crate::sink::PresentationSink;

pub struct Session {
    orchestrator: Arc<Orchestrator>,
    context: Mutex<OrchestratorContext>,
}

impl Session {
    pub fn new(orchestrator: Arc<Orchestrator>, settings: OrchestratorSettings) -> Self {
        Self {
            orchestrator,
            context: Mutex::new(OrchestratorContext::new(settings)),
        }
    }

    pub fn from_config(config: &TabmindConfig) -> Result<Self, AssistantError> {
        let orchestrator = Orchestrator::from_config(config)?;
        Ok(Self::new(Arc::new(orchestrator), OrchestratorSettings::from(config)))
    }

    pub async fn submit(
        &self,
        input: UserInput,
        sink: &mut dyn PresentationSink,
    ) -> Result<TurnOutcome, AssistantError> {
        let mut ctx = self.context.try_lock().map_err(|_| {
            log::warn!("Rejecting new turn: another turn is still running");
            AssistantError::TurnInProgress
        })?;
        Ok(self.orchestrator.run_turn(&mut ctx, input, sink).await)
    }

    /// Starts over with a single greeting.
    pub fn new_session(&self) -> Result<(), AssistantError> {
        let mut ctx = self.context.try_lock().map_err(|_| {
            log::warn!("Rejecting session reset while a turn is running");
            AssistantError::TurnInProgress
        })?;
        ctx.conversation.reset();
        Ok(())
    }

    pub fn is_busy(&self) -> bool {
        self.context.try_lock().is_err()
    }

    /// Copy of the transcript, waiting for a running turn to finish.
    pub async fn transcript(&self) -> Vec<Message> {
        self.context.lock().await.conversation.messages().to_vec()
    }
}
