//! Exposes toolbox capabilities to rig agents.
//!
//! Rig keys tools by `Tool::name()`, so one adapter type serves every
//! capability: it reports the wrapped capability's name and definition and
//! routes calls back through the [`Toolbox`] so they are recorded.

use std::convert::Infallible;

use rig::completion::ToolDefinition;
use rig::tool::{Tool, ToolDyn};
use serde_json::Value;

use super::Toolbox;

/// A rig tool bound to one named capability of a toolbox.
pub struct CapabilityTool {
    toolbox: Toolbox,
    name: &'static str,
    description: &'static str,
    parameters: Value,
}

impl CapabilityTool {
    /// Build one rig tool per capability in the toolbox.
    pub fn all(toolbox: &Toolbox) -> Vec<Box<dyn ToolDyn>> {
        toolbox
            .capabilities()
            .iter()
            .map(|capability| {
                Box::new(Self {
                    toolbox: toolbox.clone(),
                    name: capability.name(),
                    description: capability.description(),
                    parameters: capability.parameters(),
                }) as Box<dyn ToolDyn>
            })
            .collect()
    }
}

impl Tool for CapabilityTool {
    const NAME: &'static str = "capability";
    // Capabilities are total; failures travel in the output value.
    type Error = Infallible;
    type Args = Value;
    type Output = Value;

    fn name(&self) -> String {
        self.name.to_string()
    }

    async fn definition(&self, _prompt: String) -> ToolDefinition {
        ToolDefinition {
            name: self.name.to_string(),
            description: self.description.to_string(),
            parameters: self.parameters.clone(),
        }
    }

    async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
        Ok(self.toolbox.invoke(self.name, args).to_wire())
    }
}
