//! site-crew: a sequential crew of reasoning agents that builds or edits a
//! static website through a small set of filesystem capabilities.

pub mod agents;
pub mod blueprint;
pub mod config;
pub mod crew;
pub mod errors;
pub mod input;
pub mod orchestrator;
pub mod prompts;
pub mod reasoning;
pub mod router;
pub mod task;
pub mod tools;
pub mod workspace;

pub use blueprint::{Blueprint, Blueprints};
pub use config::{CrewConfig, Settings};
pub use crew::{Crew, CrewOutput, TaskOutput};
pub use errors::{CrewError, Phase, ServiceError};
pub use orchestrator::{Mode, Orchestrator, RunReport};
pub use reasoning::{ReasoningRequest, ReasoningService, Retrying, RigReasoner};
pub use router::Intent;
