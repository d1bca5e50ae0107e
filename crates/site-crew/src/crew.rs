//! The task engine.
//!
//! A [`Crew`] owns its agents and an ordered task list. `kickoff` runs the
//! tasks one at a time in declaration order, feeding each one the results
//! of its dependencies, and stops at the first failure. Graph problems are
//! rejected by [`Crew::new`] so a running crew never reads an absent result.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{error, info};

use crate::agents::Agent;
use crate::blueprint::BlueprintError;
use crate::errors::CrewError;
use crate::reasoning::ReasoningService;
use crate::task::{Inputs, Task};

/// One completed task in a crew run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskOutput {
    pub task_id: String,
    pub agent_id: String,
    pub raw: String,
}

/// Result of a successful crew run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrewOutput {
    pub crew: String,
    /// The final task's result.
    pub raw: String,
    /// Every task's result in execution order.
    pub tasks_output: Vec<TaskOutput>,
}

#[derive(Debug)]
pub struct Crew {
    name: String,
    agents: Vec<Agent>,
    tasks: Vec<Task>,
    task_timeout: Option<Duration>,
}

impl Crew {
    /// Validate the task graph and build the crew.
    pub fn new(
        name: impl Into<String>,
        agents: Vec<Agent>,
        tasks: Vec<Task>,
    ) -> Result<Self, BlueprintError> {
        let name = name.into();
        if tasks.is_empty() {
            return Err(BlueprintError::Empty { crew: name });
        }

        let mut agent_ids = HashSet::new();
        for agent in &agents {
            if !agent_ids.insert(agent.id()) {
                return Err(BlueprintError::DuplicateAgent {
                    crew: name,
                    id: agent.id().to_string(),
                });
            }
        }

        let all_task_ids: HashSet<&str> = tasks.iter().map(Task::id).collect();
        let mut declared: HashSet<&str> = HashSet::new();
        for task in &tasks {
            if declared.contains(task.id()) {
                return Err(BlueprintError::DuplicateTask {
                    crew: name,
                    id: task.id().to_string(),
                });
            }
            if !agent_ids.contains(task.agent_id()) {
                return Err(BlueprintError::UnknownAgent {
                    crew: name,
                    task: task.id().to_string(),
                    agent: task.agent_id().to_string(),
                });
            }
            for dependency in task.dependencies() {
                if declared.contains(dependency.as_str()) {
                    continue;
                }
                let (task, dependency) = (task.id().to_string(), dependency.clone());
                return Err(if all_task_ids.contains(dependency.as_str()) {
                    BlueprintError::ForwardDependency {
                        crew: name,
                        task,
                        dependency,
                    }
                } else {
                    BlueprintError::UnknownDependency {
                        crew: name,
                        task,
                        dependency,
                    }
                });
            }
            declared.insert(task.id());
        }

        Ok(Self {
            name,
            agents,
            tasks,
            task_timeout: None,
        })
    }

    /// Bound every task execution. `None` waits indefinitely.
    pub fn with_task_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.task_timeout = timeout;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn agent(&self, id: &str) -> Option<&Agent> {
        self.agents.iter().find(|a| a.id() == id)
    }

    fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id() == id)
    }

    /// Check every placeholder has an input before anything runs.
    fn check_inputs(&self, inputs: &Inputs) -> Result<(), CrewError> {
        for task in &self.tasks {
            let Some(agent) = self.agent(task.agent_id()) else {
                continue;
            };
            if let Some(key) = task.missing_inputs(agent, inputs).into_iter().next() {
                return Err(CrewError::MissingInput {
                    task_id: task.id().to_string(),
                    key,
                });
            }
        }
        Ok(())
    }

    /// Run every task in order and return the final result.
    ///
    /// Fails fast: the first service failure or timeout aborts the run and
    /// later tasks never start. Side effects of finished tasks are kept.
    pub async fn kickoff(
        self,
        service: &dyn ReasoningService,
        inputs: &Inputs,
    ) -> Result<CrewOutput, CrewError> {
        self.check_inputs(inputs)?;
        info!(crew = %self.name, tasks = self.tasks.len(), "crew started");
        let started = Instant::now();

        let mut tasks_output = Vec::with_capacity(self.tasks.len());
        for (index, task) in self.tasks.iter().enumerate() {
            // Validated in `new`: the agent exists and every dependency ran before.
            let Some(agent) = self.agent(task.agent_id()) else {
                continue;
            };
            let upstream: Vec<String> = task
                .dependencies()
                .iter()
                .filter_map(|id| self.task(id).and_then(Task::result))
                .map(str::to_string)
                .collect();

            info!(
                step = index + 1,
                of = self.tasks.len(),
                task = %task.id(),
                agent = %agent.id(),
                context = upstream.len(),
                "task started"
            );

            let run = task.execute(&self.name, agent, upstream, inputs, service);
            let outcome = match self.task_timeout {
                Some(limit) => match tokio::time::timeout(limit, run).await {
                    Ok(outcome) => outcome,
                    Err(_) => {
                        error!(task = %task.id(), seconds = limit.as_secs(), "task timed out");
                        return Err(CrewError::TaskTimeout {
                            crew: self.name.clone(),
                            task_id: task.id().to_string(),
                            seconds: limit.as_secs(),
                        });
                    }
                },
                None => run.await,
            };

            let output = outcome.map_err(|source| {
                error!(task = %task.id(), error = %source, "task failed");
                CrewError::Task {
                    crew: self.name.clone(),
                    task_id: task.id().to_string(),
                    agent_id: agent.id().to_string(),
                    source,
                }
            })?;

            task.set_result(output.clone());
            tasks_output.push(TaskOutput {
                task_id: task.id().to_string(),
                agent_id: agent.id().to_string(),
                raw: output,
            });
        }

        let raw = tasks_output
            .last()
            .map(|t| t.raw.clone())
            .unwrap_or_default();
        info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            crew = %self.name,
            "crew finished"
        );
        Ok(CrewOutput {
            crew: self.name,
            raw,
            tasks_output,
        })
    }
}
