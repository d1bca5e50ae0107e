//! Tasks: one delegated unit of work each.

use std::collections::HashMap;
use std::sync::{LazyLock, OnceLock};
use std::time::Instant;

use regex::Regex;
use tracing::info;

use crate::agents::Agent;
use crate::errors::ServiceError;
use crate::reasoning::{ReasoningRequest, ReasoningService};

/// Kickoff inputs substituted into `{placeholder}`s.
pub type Inputs = HashMap<String, String>;

/// A unit of work bound to one agent, with ordered upstream dependencies.
///
/// The result is set once by the crew after the task succeeds.
#[derive(Debug)]
pub struct Task {
    id: String,
    description: String,
    expected_output: String,
    agent_id: String,
    dependencies: Vec<String>,
    result: OnceLock<String>,
}

impl Task {
    pub fn new(
        id: impl Into<String>,
        description: impl Into<String>,
        expected_output: impl Into<String>,
        agent_id: impl Into<String>,
        dependencies: Vec<String>,
    ) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            expected_output: expected_output.into(),
            agent_id: agent_id.into(),
            dependencies,
            result: OnceLock::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn expected_output(&self) -> &str {
        &self.expected_output
    }

    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    pub fn result(&self) -> Option<&str> {
        self.result.get().map(String::as_str)
    }

    /// Record the task's result. Returns `false` if it was already set.
    pub(crate) fn set_result(&self, output: String) -> bool {
        self.result.set(output).is_ok()
    }

    /// Placeholders used by this task and its agent that `inputs` does not cover.
    pub fn missing_inputs(&self, agent: &Agent, inputs: &Inputs) -> Vec<String> {
        let mut missing = Vec::new();
        for text in [
            self.description.as_str(),
            self.expected_output.as_str(),
            agent.role(),
            agent.goal(),
            agent.backstory(),
        ] {
            for key in placeholders(text) {
                if !inputs.contains_key(&key) && !missing.contains(&key) {
                    missing.push(key);
                }
            }
        }
        missing
    }

    /// Run the task on the reasoning service.
    ///
    /// `upstream` holds the dependency results in dependency order. The
    /// service may call the agent's capabilities through the request's
    /// toolbox; those calls are logged here and then dropped.
    pub async fn execute(
        &self,
        crew: &str,
        agent: &Agent,
        upstream: Vec<String>,
        inputs: &Inputs,
        service: &dyn ReasoningService,
    ) -> Result<String, ServiceError> {
        let toolbox = agent.toolbox();
        let request = ReasoningRequest {
            crew: crew.to_string(),
            task_id: self.id.clone(),
            agent_id: agent.id().to_string(),
            role: interpolate(agent.role(), inputs),
            goal: interpolate(agent.goal(), inputs),
            backstory: interpolate(agent.backstory(), inputs),
            description: interpolate(&self.description, inputs),
            expected_output: interpolate(&self.expected_output, inputs),
            context: upstream,
            toolbox: toolbox.clone(),
        };

        let started = Instant::now();
        let output = service.complete(request).await?;

        let calls = toolbox.calls();
        let failed_calls = calls.iter().filter(|c| c.outcome.is_error()).count();
        info!(
            crew,
            task = %self.id,
            agent = %agent.id(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            tool_calls = calls.len(),
            failed_tool_calls = failed_calls,
            output_chars = output.len(),
            "task completed"
        );
        Ok(output)
    }
}

static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("PLACEHOLDER_RE regex should compile")
});

/// Names of the `{placeholder}`s in `text`.
pub fn placeholders(text: &str) -> Vec<String> {
    PLACEHOLDER_RE
        .captures_iter(text)
        .map(|c| c[1].to_string())
        .collect()
}

/// Replace `{name}` with `inputs["name"]`; unknown names are left untouched.
pub fn interpolate(text: &str, inputs: &Inputs) -> String {
    PLACEHOLDER_RE
        .replace_all(text, |caps: &regex::Captures<'_>| {
            inputs
                .get(&caps[1])
                .cloned()
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(pairs: &[(&str, &str)]) -> Inputs {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn interpolate_replaces_known_placeholders() {
        let text = "Build {customer_request} into {output_dir}/";
        let out = interpolate(
            text,
            &inputs(&[("customer_request", "a bakery site"), ("output_dir", "website")]),
        );
        assert_eq!(out, "Build a bakery site into website/");
    }

    #[test]
    fn interpolate_leaves_json_braces_alone() {
        let text = r#"Return {"files": []} for {who}"#;
        assert_eq!(
            interpolate(text, &inputs(&[("who", "me")])),
            r#"Return {"files": []} for me"#
        );
    }

    #[test]
    fn missing_inputs_cover_agent_text_too() {
        let agent = Agent::new("a", "Writer for {brand}", "goal", "story", vec![]);
        let task = Task::new("t", "Write {customer_request}", "out", "a", vec![]);
        let missing = task.missing_inputs(&agent, &inputs(&[("customer_request", "x")]));
        assert_eq!(missing, vec!["brand".to_string()]);
    }

    #[test]
    fn result_is_set_once() {
        let task = Task::new("t", "d", "o", "a", vec![]);
        assert_eq!(task.result(), None);
        assert!(task.set_result("first".into()));
        assert!(!task.set_result("second".into()));
        assert_eq!(task.result(), Some("first"));
    }
}
