//! Top-level workflow: classify, prepare the workspace, run the matching crew.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::blueprint::Blueprints;
use crate::config::CrewConfig;
use crate::crew::CrewOutput;
use crate::errors::CrewError;
use crate::reasoning::ReasoningService;
use crate::router::{Intent, IntentRouter};
use crate::task::Inputs;
use crate::tools::CapabilityRegistry;
use crate::workspace::{Preparation, WorkspaceManager};

/// Kickoff input carrying the customer's request.
pub const INPUT_REQUEST: &str = "customer_request";
/// Kickoff input carrying the output directory as configured.
pub const INPUT_OUTPUT_DIR: &str = "output_dir";

/// How the workflow is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Ask the router crew whether this is a new site or an edit.
    #[default]
    Auto,
    /// Always build a new site.
    Build,
    /// Always edit the existing site.
    Edit,
}

/// Everything a finished run produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub mode: Mode,
    pub intent: Intent,
    pub output_dir: PathBuf,
    /// Set for build runs only.
    pub workspace: Option<Preparation>,
    pub output: CrewOutput,
}

pub struct Orchestrator {
    config: CrewConfig,
    registry: CapabilityRegistry,
    blueprints: Blueprints,
    service: Arc<dyn ReasoningService>,
}

impl Orchestrator {
    /// Capabilities resolve relative paths against `config.base_dir`.
    pub fn new(
        config: CrewConfig,
        blueprints: Blueprints,
        service: Arc<dyn ReasoningService>,
    ) -> Self {
        let registry = CapabilityRegistry::standard(&config.base_dir);
        Self {
            config,
            registry,
            blueprints,
            service,
        }
    }

    pub fn config(&self) -> &CrewConfig {
        &self.config
    }

    fn inputs(&self, request: &str) -> Inputs {
        Inputs::from([
            (INPUT_REQUEST.to_string(), request.to_string()),
            (
                INPUT_OUTPUT_DIR.to_string(),
                self.config.output_dir.display().to_string(),
            ),
        ])
    }

    pub async fn run(&self, request: &str, mode: Mode) -> Result<RunReport, CrewError> {
        let inputs = self.inputs(request);
        let intent = match mode {
            Mode::Build => Intent::New,
            Mode::Edit => Intent::Edit,
            Mode::Auto => {
                IntentRouter::new(&self.blueprints.router, &self.registry)
                    .with_task_timeout(self.config.task_timeout)
                    .classify(self.service.as_ref(), &inputs)
                    .await?
            }
        };

        let output_dir = self.config.output_path();
        let workspace = WorkspaceManager::new(&output_dir);
        let (blueprint, preparation) = match intent {
            Intent::New => {
                let preparation = workspace.prepare()?;
                (&self.blueprints.build, Some(preparation))
            }
            Intent::Edit => {
                if !workspace.require_existing() {
                    return Err(CrewError::EditTargetMissing(output_dir));
                }
                (&self.blueprints.edit, None)
            }
        };

        let crew = blueprint
            .instantiate(&self.registry)?
            .with_task_timeout(self.config.task_timeout);
        info!(%intent, crew = %crew.name(), output_dir = %output_dir.display(), "running crew");
        let output = crew.kickoff(self.service.as_ref(), &inputs).await?;

        Ok(RunReport {
            mode,
            intent,
            output_dir,
            workspace: preparation,
            output,
        })
    }
}
