//! Per-task capability dispatch with call recording.
//!
//! A [`Toolbox`] holds the capabilities an agent may use for one task and
//! records every invocation as a [`ToolCall`]. The records feed structured
//! traces and the task summary; they are never stored on the task itself.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::{Capability, CapabilityOutcome, ResultKind, ERROR_MARKER};

/// Maximum characters kept in argument previews.
const PREVIEW_LEN: usize = 200;

/// One capability invocation made during a task.
#[derive(Debug, Clone, Serialize)]
pub struct ToolCall {
    pub capability: String,
    pub arguments: Value,
    pub outcome: CapabilityOutcome,
    pub duration: Duration,
}

/// Capabilities available to one task, plus the log of calls made through them.
#[derive(Clone)]
pub struct Toolbox {
    agent_id: Arc<str>,
    capabilities: Arc<[Arc<dyn Capability>]>,
    calls: Arc<Mutex<Vec<ToolCall>>>,
}

impl Toolbox {
    pub fn new(agent_id: impl Into<Arc<str>>, capabilities: Vec<Arc<dyn Capability>>) -> Self {
        Self {
            agent_id: agent_id.into(),
            capabilities: capabilities.into(),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A toolbox with no capabilities, for pure-reasoning agents.
    pub fn empty(agent_id: impl Into<Arc<str>>) -> Self {
        Self::new(agent_id, Vec::new())
    }

    pub fn capabilities(&self) -> &[Arc<dyn Capability>] {
        &self.capabilities
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.capabilities.iter().map(|c| c.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }

    /// Invoke a capability by name and record the call.
    ///
    /// Names outside this toolbox yield an error-tagged text outcome rather
    /// than a fault, so the model can correct itself.
    pub fn invoke(&self, name: &str, args: Value) -> CapabilityOutcome {
        let started = Instant::now();
        let outcome = match self.capabilities.iter().find(|c| c.name() == name) {
            Some(capability) => capability.invoke(&args),
            None => CapabilityOutcome::failed(
                ResultKind::Text,
                format!(
                    "{ERROR_MARKER} capability '{name}' is not available to agent '{}'",
                    self.agent_id
                ),
            ),
        };
        let duration = started.elapsed();

        if outcome.is_error() {
            warn!(
                agent = %self.agent_id,
                capability = name,
                args = %preview(&args),
                error = %outcome.summary(),
                "capability call failed"
            );
        } else {
            debug!(
                agent = %self.agent_id,
                capability = name,
                args = %preview(&args),
                result = %outcome.summary(),
                duration_ms = duration.as_millis() as u64,
                "capability call"
            );
        }

        match self.calls.lock() {
            Ok(mut calls) => calls.push(ToolCall {
                capability: name.to_string(),
                arguments: args,
                outcome: outcome.clone(),
                duration,
            }),
            Err(e) => warn!(agent = %self.agent_id, error = %e, "call log poisoned"),
        }
        outcome
    }

    /// Snapshot of the calls recorded so far.
    pub fn calls(&self) -> Vec<ToolCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

fn preview(args: &Value) -> String {
    let text = args.to_string();
    if text.chars().count() <= PREVIEW_LEN {
        text
    } else {
        let cut: String = text.chars().take(PREVIEW_LEN).collect();
        format!("{cut}...")
    }
}
