//! The reasoning-service seam.
//!
//! The engine only knows [`ReasoningService`]: given a request describing the
//! agent, the task, the upstream context and a toolbox, produce the final
//! text. [`RigReasoner`] implements it against an OpenAI-compatible
//! chat-completions endpoint, registering the toolbox capabilities as rig
//! tools so the model's tool calls land in the toolbox.

use std::time::Duration;

use async_trait::async_trait;
use rig::client::CompletionClient;
use rig::completion::Prompt;
use rig::providers::openai;
use tracing::{debug, warn};

use crate::config::CrewConfig;
use crate::errors::ServiceError;
use crate::prompts;
use crate::tools::rig_bridge::CapabilityTool;
use crate::tools::Toolbox;

/// Everything the service needs to work on one task.
#[derive(Clone)]
pub struct ReasoningRequest {
    pub crew: String,
    pub task_id: String,
    pub agent_id: String,
    pub role: String,
    pub goal: String,
    pub backstory: String,
    pub description: String,
    pub expected_output: String,
    /// Results of the task's dependencies, in dependency order.
    pub context: Vec<String>,
    /// Capabilities the service may invoke for this task.
    pub toolbox: Toolbox,
}

/// An external reasoning collaborator.
///
/// Implementations may call capabilities through `request.toolbox` any
/// number of times before answering. Capability failures arrive as values;
/// an `Err` from `complete` means the service itself failed and is fatal.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReasoningService: Send + Sync {
    async fn complete(&self, request: ReasoningRequest) -> Result<String, ServiceError>;
}

// ---------------------------------------------------------------------------
// RigReasoner
// ---------------------------------------------------------------------------

/// Reasoning service backed by a rig agent on an OpenAI-compatible endpoint.
pub struct RigReasoner {
    client: openai::CompletionsClient,
    model: String,
    temperature: f64,
    max_turns: usize,
}

impl RigReasoner {
    pub fn new(config: &CrewConfig) -> anyhow::Result<Self> {
        Ok(Self {
            client: config.client()?,
            model: config.model.clone(),
            temperature: config.temperature,
            max_turns: config.max_turns,
        })
    }
}

#[async_trait]
impl ReasoningService for RigReasoner {
    async fn complete(&self, request: ReasoningRequest) -> Result<String, ServiceError> {
        let preamble = prompts::system_preamble(&request);
        let prompt = prompts::task_prompt(&request);
        debug!(
            task = %request.task_id,
            agent = %request.agent_id,
            tools = ?request.toolbox.names(),
            prompt_version = prompts::PROMPT_VERSION,
            prompt_chars = prompt.len(),
            "prompting agent"
        );

        let agent = self
            .client
            .agent(&self.model)
            .name(request.agent_id.as_str())
            .preamble(&preamble)
            .temperature(self.temperature)
            .tools(CapabilityTool::all(&request.toolbox))
            .default_max_turns(self.max_turns)
            .build();

        agent
            .prompt(prompt.as_str())
            .await
            .map_err(|e| ServiceError::classify(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Retry
// ---------------------------------------------------------------------------

/// Longest wait between two attempts.
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// 2s, 4s, 8s, ... capped at [`MAX_BACKOFF`].
fn backoff_for(attempt: u32) -> Duration {
    let secs = 2u64.saturating_pow(attempt.saturating_add(1));
    Duration::from_secs(secs).min(MAX_BACKOFF)
}

/// Retries transient failures of an inner service with exponential backoff.
///
/// Backoff is 2s, 4s, 8s, ... up to one minute. Non-transient errors and the
/// last transient error are returned unchanged.
pub struct Retrying<S> {
    inner: S,
    max_retries: u32,
}

impl<S> Retrying<S> {
    pub fn new(inner: S, max_retries: u32) -> Self {
        Self { inner, max_retries }
    }
}

#[async_trait]
impl<S: ReasoningService> ReasoningService for Retrying<S> {
    async fn complete(&self, request: ReasoningRequest) -> Result<String, ServiceError> {
        let mut attempt = 0;
        loop {
            match self.inner.complete(request.clone()).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    let backoff = backoff_for(attempt);
                    warn!(
                        task = %request.task_id,
                        attempt = attempt + 1,
                        max_retries = self.max_retries,
                        backoff_secs = backoff.as_secs(),
                        error = %e,
                        "Transient error, retrying"
                    );
                    attempt += 1;
                    tokio::time::sleep(backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
