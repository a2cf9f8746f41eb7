use std::fs;
use std::sync::Arc;
use chrono::Utc;
use serde_json::json;
use tempfile::TempDir;
use command_center::agents::AgentStatus;
use command_center::config::{parse_config, parse_config_str, CenterConfig};
use command_center::coordination::{BlockerKind, NewTask, Severity, TaskStatus, TaskUpdate};
use command_center::pipeline::{DeploymentConfig, DeploymentStatus, StageName, StageStatus};
use command_center::simulation::ScriptedPolicy;
use command_center::tools::{ExecutionPath, ExecutionStatus, Priority};
use command_center::{CommandCenter, CoreError, CoreEvent};

fn offline_config() -> CenterConfig {
    let mut config = CenterConfig::default();
    config.executor.enabled = false;
    config.simulation.time_scale = 0.0;
    config
}

async fn center_with(config: CenterConfig, policy: ScriptedPolicy) -> CommandCenter {
    CommandCenter::builder(config)
        .policy(Arc::new(policy))
        .build()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_build_failure_stops_pipeline() {
    let policy = ScriptedPolicy::passing().with_failing_stage(StageName::Build);
    let center = center_with(offline_config(), policy).await;
    let mut rx = center.subscribe();

    let result = center.deploy(DeploymentConfig::for_environment("production")).await;
    assert!(matches!(result, Err(CoreError::StageFailed { .. })));

    let deployments = center.deployments();
    assert_eq!(deployments.len(), 1);
    let deployment = &deployments[0];
    assert_eq!(deployment.status, DeploymentStatus::Failed);
    assert_eq!(deployment.stages.len(), 2);
    assert_eq!(deployment.stages[0].status, StageStatus::Completed);
    assert_eq!(deployment.stages[1].name, StageName::Build);
    assert_eq!(deployment.stages[1].status, StageStatus::Failed);
    assert!(deployment.current_stage.is_none());

    let mut stage_events = 0;
    let mut finished = None;
    while let Ok(event) = rx.try_recv() {
        match event {
            CoreEvent::StageCompleted { .. } => stage_events += 1,
            CoreEvent::DeploymentFinished { status, .. } => finished = Some(status),
            _ => {}
        }
    }
    assert_eq!(stage_events, 2);
    assert_eq!(finished, Some(DeploymentStatus::Failed));
    assert_eq!(center.pipeline_summary().failed, 1);
}

#[tokio::test]
async fn test_local_tool_run_reports_five_progress_steps() {
    let center = center_with(offline_config(), ScriptedPolicy::passing()).await;
    let mut rx = center.subscribe();

    let execution = center
        .execute_tool("tool-001", json!({"agent_id": "elena-backend-api"}), Priority::High)
        .await
        .unwrap();
    assert_eq!(execution.status, ExecutionStatus::Completed);
    assert_eq!(execution.path, Some(ExecutionPath::Local));
    assert_eq!(execution.progress, 100);

    let mut progress = Vec::new();
    let mut executed = 0;
    while let Ok(event) = rx.try_recv() {
        match event {
            CoreEvent::ToolProgress { progress: p, .. } => progress.push(p),
            CoreEvent::ToolExecuted { remote, .. } => {
                assert!(!remote);
                executed += 1;
            }
            _ => {}
        }
    }
    assert_eq!(progress, vec![20, 40, 60, 80, 100]);
    assert_eq!(executed, 1);

    let agent = center.agent("elena-backend-api").await.unwrap();
    assert_eq!(agent.metrics.requests, 1);
    assert!(center.active_executions().is_empty());
}

#[tokio::test]
async fn test_validation_violations_from_yaml_rules() {
    let yaml = r#"
rules:
  - id: parallel-resource-limit
    description: Cap concurrent workers
simulation:
  time_scale: 0.0
executor:
  enabled: false
"#;
    let config = parse_config_str(yaml).unwrap();
    let policy = ScriptedPolicy::passing().with_rule_failure_every(10);
    let center = center_with(config, policy).await;

    let mut failures = 0;
    for _ in 0..120 {
        match center.execute_command("parallel-build", json!({"workers": 8})).await {
            Ok(outcome) => assert_eq!(outcome.result["workers"], 8),
            Err(CoreError::ValidationFailed { .. }) => failures += 1,
            Err(e) => panic!("unexpected error: {}", e),
        }
    }
    assert_eq!(failures, 12);

    let rules = center.rules().await;
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].violations, 12);

    let command = center
        .commands()
        .await
        .into_iter()
        .find(|c| c.id == "parallel-build")
        .unwrap();
    assert_eq!(command.stats.successes, 108);
    assert_eq!(command.stats.failures, 12);
}

#[tokio::test]
async fn test_blockers_follow_agent_state() {
    let center = center_with(offline_config(), ScriptedPolicy::passing()).await;
    let today = Utc::now().date_naive();

    center.set_agent_status("kelly-enrollment", AgentStatus::Active).await.unwrap();
    center.set_agent_progress("kelly-enrollment", 30.0).await.unwrap();
    center.recompute_metrics(today).await;

    let blockers = center.blockers().await;
    assert_eq!(blockers.len(), 1);
    assert_eq!(blockers[0].agent_id, "kelly-enrollment");
    assert_eq!(blockers[0].kind, BlockerKind::LowProgress);
    assert_eq!(blockers[0].severity, Severity::Medium);

    center.set_agent_progress("kelly-enrollment", 80.0).await.unwrap();
    center.recompute_metrics(today).await;
    assert!(center.blockers().await.is_empty());
    assert_eq!(center.metric("active_blockers").await.unwrap().value, 0.0);
}

#[tokio::test]
async fn test_task_completion_drives_agent_progress() {
    let center = center_with(offline_config(), ScriptedPolicy::passing()).await;

    let mut ids = Vec::new();
    for title in ["Schema draft", "Index review"] {
        let task = center
            .create_task(NewTask {
                assignee: Some("david-database".into()),
                ..NewTask::titled(title)
            })
            .await
            .unwrap();
        ids.push(task.id);
    }

    center
        .update_task(&ids[0], TaskUpdate { status: Some(TaskStatus::Completed), ..Default::default() })
        .await
        .unwrap();
    assert_eq!(center.agent("david-database").await.unwrap().progress, 50.0);

    let metrics = center.recompute_metrics(Utc::now().date_naive()).await;
    let rate = metrics.iter().find(|m| m.name == "task_completion_rate").unwrap();
    assert_eq!(rate.value, 50.0);
}

#[tokio::test]
async fn test_config_file_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("center.yaml");
    fs::write(
        &path,
        r#"
project:
  name: Atlas
  launch_date: "2027-01-15"
agents:
  - id: ada-core
    name: Ada
    role: Core Runtime
    capabilities: [rust, tokio]
    progress: 40.0
pipeline:
  reporting_agent: ada-core
tools:
  disabled: [tool-003]
executor:
  enabled: false
simulation:
  time_scale: 0.0
"#,
    )
    .unwrap();

    let config = parse_config(&path).await.unwrap();
    assert_eq!(config.project.name, "Atlas");
    let center = center_with(config, ScriptedPolicy::passing()).await;

    let agents = center.agents().await;
    assert_eq!(agents.len(), 1);
    assert_eq!(agents[0].progress, 40.0);

    let result = center.execute_tool("tool-003", json!({}), Priority::Normal).await;
    assert!(matches!(result, Err(CoreError::ToolDisabled(_))));

    let status = center.project_status().await;
    assert_eq!(status.project, "Atlas");
    assert_eq!(status.overall_progress, 40.0);
}

#[tokio::test]
async fn test_missing_config_file_is_config_error() {
    let dir = TempDir::new().unwrap();
    let result = parse_config(&dir.path().join("absent.yaml")).await;
    assert!(matches!(result, Err(CoreError::Config(_))));
}
