//! Agent descriptors.
//!
//! An agent binds a role, a goal and a persona to a subset of the capability
//! registry. Agents have no behavior of their own: the task engine hands the
//! descriptor to the reasoning service, which may call the agent's
//! capabilities while working on a task.

use std::fmt;
use std::sync::Arc;

use crate::tools::{Capability, Toolbox};

/// Immutable role descriptor owned by a crew.
#[derive(Clone)]
pub struct Agent {
    id: String,
    role: String,
    goal: String,
    backstory: String,
    capabilities: Vec<Arc<dyn Capability>>,
}

impl Agent {
    pub fn new(
        id: impl Into<String>,
        role: impl Into<String>,
        goal: impl Into<String>,
        backstory: impl Into<String>,
        capabilities: Vec<Arc<dyn Capability>>,
    ) -> Self {
        Self {
            id: id.into(),
            role: role.into(),
            goal: goal.into(),
            backstory: backstory.into(),
            capabilities,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    pub fn goal(&self) -> &str {
        &self.goal
    }

    pub fn backstory(&self) -> &str {
        &self.backstory
    }

    pub fn capabilities(&self) -> &[Arc<dyn Capability>] {
        &self.capabilities
    }

    pub fn capability_names(&self) -> Vec<&'static str> {
        self.capabilities.iter().map(|c| c.name()).collect()
    }

    /// A fresh toolbox over this agent's capabilities, for one task.
    pub fn toolbox(&self) -> Toolbox {
        Toolbox::new(self.id.as_str(), self.capabilities.clone())
    }
}

impl fmt::Debug for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Agent")
            .field("id", &self.id)
            .field("role", &self.role)
            .field("capabilities", &self.capability_names())
            .finish()
    }
}
