//! Declarative crew descriptions.
//!
//! A blueprint names the agents of a crew and the ordered tasks they perform.
//! Blueprints are parsed from YAML, validated, and turned into a [`Crew`]
//! bound to a capability registry. The three crews the binary runs are
//! embedded at compile time and can be replaced from a directory.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::agents::Agent;
use crate::crew::Crew;
use crate::task::Task;
use crate::tools::{CapabilityRegistry, RegistryError};

pub const BUILD_CREW: &str = "build";
pub const EDIT_CREW: &str = "edit";
pub const ROUTER_CREW: &str = "router";

const BUILD_YAML: &str = include_str!("../blueprints/build.yaml");
const EDIT_YAML: &str = include_str!("../blueprints/edit.yaml");
const ROUTER_YAML: &str = include_str!("../blueprints/router.yaml");

#[derive(Debug, Error)]
pub enum BlueprintError {
    #[error("failed to read blueprint {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse blueprint `{origin}`: {source}")]
    Parse {
        origin: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("crew `{crew}` has no tasks")]
    Empty { crew: String },

    #[error("crew `{crew}` defines agent `{id}` more than once")]
    DuplicateAgent { crew: String, id: String },

    #[error("crew `{crew}` defines task `{id}` more than once")]
    DuplicateTask { crew: String, id: String },

    #[error("crew `{crew}` task `{task}` is assigned to unknown agent `{agent}`")]
    UnknownAgent {
        crew: String,
        task: String,
        agent: String,
    },

    #[error("crew `{crew}` task `{task}` depends on unknown task `{dependency}`")]
    UnknownDependency {
        crew: String,
        task: String,
        dependency: String,
    },

    /// The dependency exists but is declared at or after the dependent task.
    #[error("crew `{crew}` task `{task}` depends on `{dependency}`, which is not declared before it")]
    ForwardDependency {
        crew: String,
        task: String,
        dependency: String,
    },

    #[error("crew `{crew}` agent `{agent}`: {source}")]
    Capability {
        crew: String,
        agent: String,
        #[source]
        source: RegistryError,
    },
}

/// One agent entry of a blueprint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    pub id: String,
    pub role: String,
    pub goal: String,
    pub backstory: String,
    /// Capability names the agent may call. Empty for pure-reasoning agents.
    #[serde(default)]
    pub tools: Vec<String>,
}

/// One task entry of a blueprint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaskConfig {
    pub id: String,
    pub description: String,
    pub expected_output: String,
    pub agent: String,
    /// Upstream tasks whose results feed this one, in order.
    ///
    /// Omitted means every earlier task; `[]` means none.
    #[serde(default)]
    pub context: Option<Vec<String>>,
}

/// A validated-on-instantiate crew description.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Blueprint {
    pub name: String,
    pub agents: Vec<AgentConfig>,
    pub tasks: Vec<TaskConfig>,
}

impl Blueprint {
    pub fn from_yaml(origin: &str, raw: &str) -> Result<Self, BlueprintError> {
        serde_yaml::from_str(raw).map_err(|source| BlueprintError::Parse {
            origin: origin.to_string(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, BlueprintError> {
        let raw = std::fs::read_to_string(path).map_err(|source| BlueprintError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&path.display().to_string(), &raw)
    }

    pub fn build() -> Result<Self, BlueprintError> {
        Self::from_yaml("builtin:build", BUILD_YAML)
    }

    pub fn edit() -> Result<Self, BlueprintError> {
        Self::from_yaml("builtin:edit", EDIT_YAML)
    }

    pub fn router() -> Result<Self, BlueprintError> {
        Self::from_yaml("builtin:router", ROUTER_YAML)
    }

    /// Resolve tools and contexts against `registry` and build the crew.
    pub fn instantiate(&self, registry: &CapabilityRegistry) -> Result<Crew, BlueprintError> {
        let agents = self
            .agents
            .iter()
            .map(|config| {
                let capabilities =
                    registry
                        .select(&config.tools)
                        .map_err(|source| BlueprintError::Capability {
                            crew: self.name.clone(),
                            agent: config.id.clone(),
                            source,
                        })?;
                Ok(Agent::new(
                    config.id.clone(),
                    config.role.trim(),
                    config.goal.trim(),
                    config.backstory.trim(),
                    capabilities,
                ))
            })
            .collect::<Result<Vec<_>, BlueprintError>>()?;

        let tasks = self
            .tasks
            .iter()
            .enumerate()
            .map(|(index, config)| {
                let dependencies = match &config.context {
                    Some(explicit) => explicit.clone(),
                    None => self.tasks[..index].iter().map(|t| t.id.clone()).collect(),
                };
                Task::new(
                    config.id.clone(),
                    config.description.trim(),
                    config.expected_output.trim(),
                    config.agent.clone(),
                    dependencies,
                )
            })
            .collect();

        Crew::new(self.name.clone(), agents, tasks)
    }
}

/// The set of crews the orchestrator can run.
#[derive(Debug, Clone)]
pub struct Blueprints {
    pub build: Blueprint,
    pub edit: Blueprint,
    pub router: Blueprint,
}

impl Blueprints {
    pub fn builtin() -> Result<Self, BlueprintError> {
        Ok(Self {
            build: Blueprint::build()?,
            edit: Blueprint::edit()?,
            router: Blueprint::router()?,
        })
    }

    /// Built-in blueprints, with `build.yaml`, `edit.yaml` and `router.yaml`
    /// from `dir` taking their place when present.
    pub fn with_overrides(dir: &Path) -> Result<Self, BlueprintError> {
        let mut blueprints = Self::builtin()?;
        for (file, slot) in [
            ("build.yaml", &mut blueprints.build),
            ("edit.yaml", &mut blueprints.edit),
            ("router.yaml", &mut blueprints.router),
        ] {
            let path = dir.join(file);
            if path.is_file() {
                info!(path = %path.display(), "using blueprint override");
                *slot = Blueprint::load(&path)?;
            }
        }
        Ok(blueprints)
    }
}
