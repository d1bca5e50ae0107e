//! Orchestration error taxonomy.
//!
//! Capability failures never appear here: they are values returned to the
//! model. Everything in this module is fatal for the run and carries enough
//! context to name the phase that failed.
//!
//! | Error              | Phase                 | Retried                 |
//! |--------------------|-----------------------|-------------------------|
//! | `ServiceError`     | a specific task       | transport / rate limit  |
//! | `ConfigError`      | configuration         | no                      |
//! | `BlueprintError`   | crew construction     | no                      |
//! | `WorkspaceError`   | workspace preparation | no                      |

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

pub use crate::blueprint::BlueprintError;
pub use crate::config::ConfigError;
pub use crate::workspace::WorkspaceError;

/// Failure of one reasoning-service round trip.
#[derive(Debug, Clone, Error)]
pub enum ServiceError {
    /// Network-level failure (connection refused, reset, timeout, 5xx).
    #[error("transport failure: {0}")]
    Transport(String),

    /// Provider rate limit (HTTP 429).
    #[error("rate limited: {0}")]
    RateLimit(String),

    /// Credential rejected (HTTP 401/403).
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The service answered but the answer was unusable.
    #[error("invalid response: {0}")]
    Response(String),
}

impl ServiceError {
    /// Classify a provider error message.
    pub fn classify(message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_ascii_lowercase();
        if message.contains("429") || lower.contains("rate limit") {
            Self::RateLimit(message)
        } else if message.contains("401")
            || message.contains("403")
            || lower.contains("unauthorized")
            || lower.contains("invalid api key")
        {
            Self::Auth(message)
        } else if message.contains("502")
            || message.contains("503")
            || lower.contains("connection")
            || lower.contains("timed out")
            || lower.contains("timeout")
            || lower.contains("error sending request")
            || lower.contains("broken pipe")
            || lower.contains("reset by peer")
        {
            Self::Transport(message)
        } else {
            Self::Response(message)
        }
    }

    /// Transport hiccups and rate limits may succeed on a later attempt.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::RateLimit(_))
    }
}

/// The stage of a run a fatal error belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Configuration,
    CrewConstruction,
    WorkspacePreparation,
    Routing,
    Task(String),
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration => write!(f, "configuration"),
            Self::CrewConstruction => write!(f, "crew construction"),
            Self::WorkspacePreparation => write!(f, "workspace preparation"),
            Self::Routing => write!(f, "intent routing"),
            Self::Task(id) => write!(f, "task `{id}`"),
        }
    }
}

/// Fatal orchestration error.
#[derive(Debug, Error)]
pub enum CrewError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Blueprint(#[from] BlueprintError),

    #[error(transparent)]
    Workspace(#[from] WorkspaceError),

    /// A `{placeholder}` in a task or agent has no kickoff input.
    #[error("task `{task_id}` references input `{{{key}}}` but no value was provided")]
    MissingInput { task_id: String, key: String },

    /// The reasoning service failed while executing a task.
    #[error("crew `{crew}` task `{task_id}` (agent `{agent_id}`) failed: {source}")]
    Task {
        crew: String,
        task_id: String,
        agent_id: String,
        #[source]
        source: ServiceError,
    },

    #[error("crew `{crew}` task `{task_id}` timed out after {seconds}s")]
    TaskTimeout {
        crew: String,
        task_id: String,
        seconds: u64,
    },

    /// The router crew failed; the request was never classified.
    #[error("intent routing failed: {0}")]
    Routing(#[source] Box<CrewError>),

    /// Edit mode needs an existing output directory.
    #[error("cannot edit: output directory {} does not exist", .0.display())]
    EditTargetMissing(PathBuf),
}

impl CrewError {
    /// Which phase of the run failed, for the user-facing diagnostic.
    pub fn phase(&self) -> Phase {
        match self {
            Self::Config(_) => Phase::Configuration,
            Self::Blueprint(_) | Self::MissingInput { .. } => Phase::CrewConstruction,
            Self::Workspace(_) | Self::EditTargetMissing(_) => Phase::WorkspacePreparation,
            Self::Routing(_) => Phase::Routing,
            Self::Task { task_id, .. } | Self::TaskTimeout { task_id, .. } => {
                Phase::Task(task_id.clone())
            }
        }
    }
}
