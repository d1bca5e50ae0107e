//! Request intent classification.

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use tracing::info;

use crate::blueprint::Blueprint;
use crate::errors::CrewError;
use crate::reasoning::ReasoningService;
use crate::task::Inputs;
use crate::tools::CapabilityRegistry;

/// What the customer wants done with the output directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Intent {
    New,
    Edit,
}

impl Intent {
    /// `EDIT` anywhere in the response (any case) means edit; anything else is new.
    pub fn from_response(response: &str) -> Self {
        if response.to_ascii_uppercase().contains("EDIT") {
            Self::Edit
        } else {
            Self::New
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::New => write!(f, "NEW"),
            Self::Edit => write!(f, "EDIT"),
        }
    }
}

/// Runs the router crew over a request.
pub struct IntentRouter<'a> {
    blueprint: &'a Blueprint,
    registry: &'a CapabilityRegistry,
    task_timeout: Option<Duration>,
}

impl<'a> IntentRouter<'a> {
    pub fn new(blueprint: &'a Blueprint, registry: &'a CapabilityRegistry) -> Self {
        Self {
            blueprint,
            registry,
            task_timeout: None,
        }
    }

    pub fn with_task_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.task_timeout = timeout;
        self
    }

    pub async fn classify(
        &self,
        service: &dyn ReasoningService,
        inputs: &Inputs,
    ) -> Result<Intent, CrewError> {
        let crew = self
            .blueprint
            .instantiate(self.registry)?
            .with_task_timeout(self.task_timeout);
        let output = crew
            .kickoff(service, inputs)
            .await
            .map_err(|e| CrewError::Routing(Box::new(e)))?;
        let intent = Intent::from_response(&output.raw);
        info!(%intent, response = %output.raw.trim(), "request classified");
        Ok(intent)
    }
}
