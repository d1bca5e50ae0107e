//! Task engine behavior with a scripted reasoning service.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use site_crew::agents::Agent;
use site_crew::crew::Crew;
use site_crew::task::{Inputs, Task};
use site_crew::{CrewError, ReasoningRequest, ReasoningService, ServiceError};

// ── Scripted service ─────────────────────────────────────────────────────────

/// Answers per task id and records every request it sees.
#[derive(Default)]
struct Scripted {
    answers: HashMap<String, Result<String, ServiceError>>,
    seen: Mutex<Vec<(String, Vec<String>)>>,
}

impl Scripted {
    fn answer(mut self, task: &str, text: &str) -> Self {
        self.answers.insert(task.to_string(), Ok(text.to_string()));
        self
    }

    fn fail(mut self, task: &str, error: ServiceError) -> Self {
        self.answers.insert(task.to_string(), Err(error));
        self
    }

    fn seen(&self) -> Vec<(String, Vec<String>)> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReasoningService for Scripted {
    async fn complete(&self, request: ReasoningRequest) -> Result<String, ServiceError> {
        self.seen
            .lock()
            .unwrap()
            .push((request.task_id.clone(), request.context.clone()));
        self.answers
            .get(&request.task_id)
            .cloned()
            .unwrap_or_else(|| Ok(format!("{} output", request.task_id)))
    }
}

fn agent(id: &str) -> Agent {
    Agent::new(id, "Worker", "Finish the task", "Reliable.", vec![])
}

fn task(id: &str, deps: &[&str]) -> Task {
    Task::new(
        id,
        format!("Do {id}"),
        "Plain text",
        "worker",
        deps.iter().map(|d| d.to_string()).collect(),
    )
}

// ── Context propagation ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_linear_chain_passes_upstream_results_in_order() {
    let crew = Crew::new(
        "chain",
        vec![agent("worker")],
        vec![task("a", &[]), task("b", &["a"]), task("c", &["a", "b"])],
    )
    .unwrap();
    let service = Scripted::default()
        .answer("a", "alpha")
        .answer("b", "beta")
        .answer("c", "gamma");

    let output = crew.kickoff(&service, &Inputs::new()).await.unwrap();

    assert_eq!(output.raw, "gamma");
    let ids: Vec<_> = output.tasks_output.iter().map(|t| t.task_id.as_str()).collect();
    assert_eq!(ids, ["a", "b", "c"]);
    assert_eq!(
        service.seen(),
        vec![
            ("a".to_string(), vec![]),
            ("b".to_string(), vec!["alpha".to_string()]),
            ("c".to_string(), vec!["alpha".to_string(), "beta".to_string()]),
        ]
    );
}

#[tokio::test]
async fn test_tasks_without_dependencies_see_no_context() {
    let crew = Crew::new(
        "independent",
        vec![agent("worker")],
        vec![task("a", &[]), task("b", &[])],
    )
    .unwrap();
    let service = Scripted::default();

    crew.kickoff(&service, &Inputs::new()).await.unwrap();
    assert!(service.seen().iter().all(|(_, context)| context.is_empty()));
}

// ── Fail-fast ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_failure_stops_later_tasks() {
    let crew = Crew::new(
        "chain",
        vec![agent("worker")],
        vec![task("a", &[]), task("b", &["a"]), task("c", &["b"])],
    )
    .unwrap();
    let service = Scripted::default().fail("b", ServiceError::Auth("401 Unauthorized".into()));

    let err = crew.kickoff(&service, &Inputs::new()).await.unwrap_err();

    match &err {
        CrewError::Task {
            crew,
            task_id,
            agent_id,
            source,
        } => {
            assert_eq!(crew, "chain");
            assert_eq!(task_id, "b");
            assert_eq!(agent_id, "worker");
            assert!(matches!(source, ServiceError::Auth(_)));
        }
        other => panic!("unexpected error: {other}"),
    }
    let ran: Vec<_> = service.seen().into_iter().map(|(id, _)| id).collect();
    assert_eq!(ran, ["a", "b"]);
}

// ── Inputs ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_inputs_are_interpolated_everywhere() {
    let worker = Agent::new(
        "worker",
        "Designer for {brand}",
        "Please {brand} customers",
        "Knows {brand} well.",
        vec![],
    );
    let crew = Crew::new(
        "inputs",
        vec![worker],
        vec![Task::new("t", "Design for {brand}", "A {brand} mockup", "worker", vec![])],
    )
    .unwrap();

    struct Echo;

    #[async_trait]
    impl ReasoningService for Echo {
        async fn complete(&self, r: ReasoningRequest) -> Result<String, ServiceError> {
            Ok([r.role, r.goal, r.backstory, r.description, r.expected_output].join("|"))
        }
    }

    let inputs = Inputs::from([("brand".to_string(), "Acme".to_string())]);
    let output = crew.kickoff(&Echo, &inputs).await.unwrap();
    assert_eq!(
        output.raw,
        "Designer for Acme|Please Acme customers|Knows Acme well.|Design for Acme|A Acme mockup"
    );
}
