//! End-to-end runs of the orchestrator against a scripted reasoning service
//! that drives the real filesystem capabilities.
//!
//! No network access: the service below plays every agent, calling tools
//! through the toolbox it is handed exactly as the rig binding would.

use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;
use site_crew::tools::CapabilityOutcome;
use site_crew::workspace::Preparation;
use site_crew::{
    Blueprints, CrewConfig, CrewError, Intent, Mode, Orchestrator, Phase, ReasoningRequest,
    ReasoningService, ServiceError, Settings,
};

const PORTFOLIO_HTML: &str = "<!doctype html>\n<title>Jane Doe | Portfolio</title>\n";

// ── Scripted crew ────────────────────────────────────────────────────────────

#[derive(Default)]
struct PortfolioCrew {
    /// Task ids in the order they were executed.
    order: Mutex<Vec<String>>,
    /// Make the router answer EDIT.
    route_edit: bool,
}

impl PortfolioCrew {
    fn order(&self) -> Vec<String> {
        self.order.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReasoningService for PortfolioCrew {
    async fn complete(&self, request: ReasoningRequest) -> Result<String, ServiceError> {
        self.order.lock().unwrap().push(request.task_id.clone());
        let tools = &request.toolbox;
        let answer = match request.task_id.as_str() {
            "classify_intent" => (if self.route_edit { "EDIT" } else { "NEW" }).to_string(),
            "plan" => "Pages: index.html. Structure: website/index.html.".to_string(),
            "develop_frontend" => format!("```html\n{PORTFOLIO_HTML}```"),
            "develop_backend" => "No backend needed.".to_string(),
            "integrate_code" => {
                tools.invoke("create_directory", json!({"path": "website"}));
                let written = tools.invoke(
                    "write_text",
                    json!({"path": "website/index.html", "content": PORTFOLIO_HTML}),
                );
                format!("{}", written.to_wire())
            }
            "test_run" => {
                let exists = tools.invoke("path_exists", json!({"path": "website/index.html"}));
                let titled = tools.invoke(
                    "contains_substring",
                    json!({"path": "website/index.html", "text": "Portfolio"}),
                );
                if exists == CapabilityOutcome::Flag(true) && titled == CapabilityOutcome::Flag(true) {
                    "PASS: index.html present with portfolio title".to_string()
                } else {
                    "FAIL: index.html missing".to_string()
                }
            }
            other => format!("{other} done"),
        };
        Ok(answer)
    }
}

fn config(base: &Path) -> CrewConfig {
    CrewConfig::from_lookup(
        |key| (key == "DEEPSEEK_API_KEY").then(|| "sk-test".to_string()),
        Settings::default(),
        base.to_path_buf(),
    )
    .unwrap()
}

fn orchestrator(base: &Path, service: Arc<PortfolioCrew>) -> Orchestrator {
    Orchestrator::new(config(base), Blueprints::builtin().unwrap(), service)
}

// ── Scenarios ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_portfolio_site_is_built() {
    let root = tempfile::tempdir().unwrap();
    let service = Arc::new(PortfolioCrew::default());

    let report = orchestrator(root.path(), service.clone())
        .run("A one-page portfolio for Jane Doe, a photographer.", Mode::Auto)
        .await
        .unwrap();

    assert_eq!(report.intent, Intent::New);
    assert_eq!(report.workspace, Some(Preparation::Fresh));
    assert_eq!(report.output.raw, "PASS: index.html present with portfolio title");
    assert_eq!(
        fs::read_to_string(root.path().join("website/index.html")).unwrap(),
        PORTFOLIO_HTML
    );
    assert_eq!(
        service.order(),
        [
            "classify_intent",
            "plan",
            "develop_frontend",
            "develop_backend",
            "integrate_code",
            "test_run",
        ]
    );

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["intent"], "NEW");
    assert_eq!(json["mode"], "auto");
    assert_eq!(json["output"]["tasks_output"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn test_rebuild_backs_up_previous_site() {
    let root = tempfile::tempdir().unwrap();
    let website = root.path().join("website");
    fs::create_dir(&website).unwrap();
    fs::write(website.join("index.html"), "old site").unwrap();
    fs::create_dir(root.path().join("website_backup")).unwrap();

    let report = orchestrator(root.path(), Arc::new(PortfolioCrew::default()))
        .run("A portfolio site", Mode::Build)
        .await
        .unwrap();

    let Some(Preparation::BackedUp { backup }) = report.workspace else {
        panic!("expected a backup, got {:?}", report.workspace);
    };
    let name = backup.file_name().unwrap().to_str().unwrap();
    assert!(name.starts_with("website_2"), "timestamped backup, got {name}");
    assert_eq!(fs::read_to_string(backup.join("index.html")).unwrap(), "old site");
    assert!(root.path().join("website_backup").is_dir());
    assert_eq!(fs::read_to_string(website.join("index.html")).unwrap(), PORTFOLIO_HTML);
}

/// `target` spelled relative to the working directory, through `..` components.
fn relative_from_cwd(target: &Path) -> std::path::PathBuf {
    let cwd = std::env::current_dir().unwrap();
    let mut relative = std::path::PathBuf::new();
    for _ in cwd.components().skip(1) {
        relative.push("..");
    }
    relative.join(target.strip_prefix("/").unwrap())
}

#[tokio::test]
async fn test_relative_base_dir_writes_where_the_workspace_was_prepared() {
    let root = tempfile::tempdir().unwrap();
    let mut config = config(root.path());
    config.set_base_dir(relative_from_cwd(root.path()));

    let report = Orchestrator::new(
        config,
        Blueprints::builtin().unwrap(),
        Arc::new(PortfolioCrew::default()),
    )
    .run("A portfolio site", Mode::Build)
    .await
    .unwrap();

    assert!(report.output_dir.is_absolute());
    assert_eq!(
        fs::read_to_string(report.output_dir.join("index.html")).unwrap(),
        PORTFOLIO_HTML
    );
    assert!(root.path().join("website/index.html").is_file());
}

#[tokio::test]
async fn test_edit_request_runs_edit_crew_in_place() {
    let root = tempfile::tempdir().unwrap();
    let website = root.path().join("website");
    fs::create_dir(&website).unwrap();
    fs::write(website.join("style.css"), "h1 { color: red; }").unwrap();

    let service = Arc::new(PortfolioCrew {
        route_edit: true,
        ..Default::default()
    });
    let report = orchestrator(root.path(), service.clone())
        .run("Make the heading blue", Mode::Auto)
        .await
        .unwrap();

    assert_eq!(report.intent, Intent::Edit);
    assert_eq!(report.output.crew, "edit");
    assert!(report.workspace.is_none());
    // The existing tree is edited, not moved aside.
    assert!(website.join("style.css").is_file());
    assert!(!root.path().join("website_backup").exists());
    assert_eq!(
        service.order(),
        [
            "classify_intent",
            "analyze_existing",
            "plan_modifications",
            "integrate_code",
            "test_run",
        ]
    );
}

#[tokio::test]
async fn test_router_failure_is_reported_as_routing() {
    struct Down;

    #[async_trait]
    impl ReasoningService for Down {
        async fn complete(&self, _r: ReasoningRequest) -> Result<String, ServiceError> {
            Err(ServiceError::Auth("401 Unauthorized".into()))
        }
    }

    let root = tempfile::tempdir().unwrap();
    let orchestrator = Orchestrator::new(
        config(root.path()),
        Blueprints::builtin().unwrap(),
        Arc::new(Down),
    );
    let err = orchestrator.run("anything", Mode::Auto).await.unwrap_err();
    assert!(matches!(err, CrewError::Routing(_)));
    assert_eq!(err.phase(), Phase::Routing);
    assert!(!root.path().join("website").exists());
}
