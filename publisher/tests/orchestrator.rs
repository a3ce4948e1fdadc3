//! Pipeline tests against mock providers

mod common;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tokio_test::{assert_err, assert_ok};

use publisher::authn::credential::{Credential, CredentialSelection};
use publisher::deploy::orchestrator::Orchestrator;
use publisher::errors::PublishError;
use publisher::models::deployment::{Step, StepStatus};
use publisher::models::provider::{DeploymentState, Framework};
use publisher::storage::{MemoryStore, ProjectStore};

use common::*;

fn selection() -> CredentialSelection {
    CredentialSelection {
        token: Credential::new("hosting-token"),
        is_system_credential: false,
        remaining_system_deployments: 3,
    }
}

async fn setup() -> (Arc<MockCloud>, Arc<MemoryStore>, Orchestrator) {
    let cloud = MockCloud::new();
    let store = Arc::new(MemoryStore::new());
    store.insert_project(project("u1")).await.unwrap();
    let orchestrator = Orchestrator::new(MockConnector::new(cloud.clone()), store.clone());
    (cloud, store, orchestrator)
}

#[tokio::test]
async fn test_successful_run_records_seven_completed_steps() {
    let (cloud, _store, orchestrator) = setup().await;

    let result = orchestrator.deploy(&request("My App!"), &selection()).await;

    assert!(result.success, "{:?}", result.error);
    assert!(result.persisted);
    assert!(result.error.is_none());
    assert!(result.failed_step().is_none());
    assert_eq!(result.steps.len(), 7);
    for (record, step) in result.steps.iter().zip(Step::ALL) {
        assert_eq!(record.step, step);
        assert_eq!(record.status, StepStatus::Completed);
    }
    for method in PIPELINE_CALLS {
        assert_eq!(cloud.calls(method), 1, "{}", method);
    }
    assert_eq!(result.deployment_state, Some(DeploymentState::Building));
}

#[tokio::test]
async fn test_end_to_end_outputs_use_sanitized_name() {
    let (cloud, store, orchestrator) = setup().await;

    let result = orchestrator.deploy(&request("My App!"), &selection()).await;

    assert!(result.success);
    assert_eq!(result.repository_full_name.as_deref(), Some("octo/my-app-"));
    assert_eq!(
        result.repository_url.as_deref(),
        Some("https://github.com/octo/my-app-")
    );
    assert_eq!(result.hosting_project_id.as_deref(), Some("prj_1"));
    assert_eq!(result.deployment_id.as_deref(), Some("dpl_1"));
    assert_eq!(
        result.deployment_url.as_deref(),
        Some("https://my-app-.vercel.app")
    );

    let repo_spec = cloud.repository_specs.lock().unwrap()[0].clone();
    assert_eq!(repo_spec.name, "my-app-");
    assert!(repo_spec.auto_init);
    assert!(!repo_spec.private);

    let (owner, name, files) = cloud.commits.lock().unwrap()[0].clone();
    assert_eq!((owner.as_str(), name.as_str()), ("octo", "my-app-"));
    assert_eq!(files.len(), 2);

    let project_spec = cloud.project_specs.lock().unwrap()[0].clone();
    assert_eq!(project_spec.framework, Framework::NextJs);
    assert_eq!(project_spec.repository_full_name, "octo/my-app-");

    let deployment_spec = cloud.deployment_specs.lock().unwrap()[0].clone();
    assert_eq!(deployment_spec.reference, "main");

    let stored = store.get_project("p1").await.unwrap().unwrap();
    assert!(stored.repository_created);
    assert!(stored.hosting_connected);
    assert_eq!(stored.hosting_project_id.as_deref(), Some("prj_1"));
    assert_eq!(
        stored.deployment_url.as_deref(),
        Some("https://my-app-.vercel.app")
    );
}

#[tokio::test]
async fn test_failure_stops_the_pipeline_at_the_failing_step() {
    for (position, method) in PIPELINE_CALLS.into_iter().enumerate() {
        let (cloud, store, orchestrator) = setup().await;
        cloud.fail_on(method);

        let result = orchestrator.deploy(&request("My App!"), &selection()).await;

        // Validate is step 1, so provider call i belongs to step i + 2
        let failed_step = position + 2;
        assert!(!result.success);
        assert!(!result.persisted);
        assert_eq!(result.steps.len(), failed_step, "{}", method);
        assert_eq!(result.failed_step(), Some(Step::ALL[failed_step - 1]));
        assert_eq!(result.steps.last().unwrap().status, StepStatus::Failed);
        assert!(result.steps[..failed_step - 1]
            .iter()
            .all(|r| r.status == StepStatus::Completed));
        assert!(result.error.as_deref().unwrap().contains("exploded"));
        assert_eq!(
            result.steps.last().unwrap().error.as_deref(),
            result.error.as_deref()
        );

        for later in &PIPELINE_CALLS[position + 1..] {
            assert_eq!(cloud.calls(later), 0, "{} ran after {}", later, method);
        }

        let stored = store.get_project("p1").await.unwrap().unwrap();
        assert!(!stored.repository_created);
        assert!(stored.deployment_url.is_none());
    }
}

#[tokio::test]
async fn test_validation_failure_makes_no_provider_call() {
    let (cloud, _store, orchestrator) = setup().await;

    let result = orchestrator.deploy(&request("ab"), &selection()).await;

    assert!(!result.success);
    assert_eq!(result.steps.len(), 1);
    assert_eq!(result.steps[0].step, Step::Validate);
    assert_eq!(result.steps[0].status, StepStatus::Failed);
    assert!(result.error.unwrap().contains("at least 3 characters"));
    assert_eq!(cloud.total_calls(), 0);
}

#[tokio::test]
async fn test_empty_files_fail_validation() {
    let (cloud, _store, orchestrator) = setup().await;
    let mut req = request("My App!");
    req.files.clear();

    let result = orchestrator.deploy(&req, &selection()).await;

    assert!(!result.success);
    assert_eq!(result.steps.len(), 1);
    assert_eq!(cloud.total_calls(), 0);
}

#[tokio::test]
async fn test_inaccessible_organization_fails_validation() {
    let (cloud, _store, orchestrator) = setup().await;
    cloud.set_org_accessible(false);
    let mut req = request("My App!");
    req.organization_name = Some("acme".to_string());

    let result = orchestrator.deploy(&req, &selection()).await;

    assert!(!result.success);
    assert_eq!(result.steps.len(), 1);
    assert!(result.error.unwrap().contains("acme"));
    assert_eq!(cloud.calls(ORGANIZATION_ACCESSIBLE), 1);
    assert_eq!(cloud.calls(CREATE_REPOSITORY_IN_ORGANIZATION), 0);
}

#[tokio::test]
async fn test_organization_repository() {
    let (cloud, _store, orchestrator) = setup().await;
    let mut req = request("My App!");
    req.organization_name = Some("acme".to_string());
    req.is_private = true;

    let result = orchestrator.deploy(&req, &selection()).await;

    assert!(result.success);
    assert_eq!(result.repository_full_name.as_deref(), Some("acme/my-app-"));
    assert_eq!(cloud.calls(CREATE_REPOSITORY_IN_ORGANIZATION), 1);
    assert_eq!(cloud.calls(CREATE_REPOSITORY), 0);
    assert!(cloud.repository_specs.lock().unwrap()[0].private);
}

#[tokio::test]
async fn test_default_organization_applies_when_request_names_none() {
    let cloud = MockCloud::new();
    let store = Arc::new(MemoryStore::new());
    store.insert_project(project("u1")).await.unwrap();
    let orchestrator = Orchestrator::new(MockConnector::new(cloud.clone()), store)
        .with_default_organization(Some("platform-apps".to_string()));

    let result = orchestrator.deploy(&request("My App!"), &selection()).await;
    assert!(result.success, "{:?}", result.error);
    assert_eq!(
        result.repository_full_name.as_deref(),
        Some("platform-apps/my-app-")
    );
    assert_eq!(cloud.calls(ORGANIZATION_ACCESSIBLE), 1);
    assert_eq!(cloud.calls(CREATE_REPOSITORY), 0);

    // An organization on the request wins
    let mut req = request("My App!");
    req.organization_name = Some("acme".to_string());
    let result = orchestrator.deploy(&req, &selection()).await;
    assert_eq!(result.repository_full_name.as_deref(), Some("acme/my-app-"));
    assert_eq!(cloud.calls(CREATE_REPOSITORY_IN_ORGANIZATION), 2);
}

#[tokio::test]
async fn test_blank_hosting_token_fails_validation() {
    let (cloud, _store, orchestrator) = setup().await;
    let mut blank = selection();
    blank.token = Credential::new("  ");

    let result = orchestrator.deploy(&request("My App!"), &blank).await;

    assert!(!result.success);
    assert_eq!(result.steps.len(), 1);
    assert_eq!(cloud.total_calls(), 0);
}

#[tokio::test]
async fn test_persistence_failure_keeps_the_run_successful() {
    let cloud = MockCloud::new();
    let store = Arc::new(ReadOnlyProjectStore::default());
    store.insert_project(project("u1")).await.unwrap();
    let orchestrator = Orchestrator::new(MockConnector::new(cloud.clone()), store);

    let result = orchestrator.deploy(&request("My App!"), &selection()).await;

    assert!(result.success);
    assert!(!result.persisted);
    assert_eq!(result.steps.len(), 7);
}

#[tokio::test]
async fn test_status_without_hosting_project_skips_provider() {
    let (cloud, _store, orchestrator) = setup().await;

    let status = assert_ok!(orchestrator.get_deployment_status("p1", None).await);

    assert_eq!(status.project_id, "p1");
    assert!(!status.repository.created);
    assert!(!status.hosting.connected);
    assert!(status.latest_deployment.is_none());
    assert_eq!(cloud.total_calls(), 0);
}

#[tokio::test]
async fn test_status_after_deployment_reads_latest() {
    let (cloud, _store, orchestrator) = setup().await;
    let token = Credential::new("hosting-token");
    assert!(orchestrator.deploy(&request("My App!"), &selection()).await.success);

    let status = assert_ok!(orchestrator.get_deployment_status("p1", Some(&token)).await);

    assert!(status.repository.created);
    assert!(status.hosting.connected);
    assert_eq!(status.hosting.project_id.as_deref(), Some("prj_1"));
    let latest = status.latest_deployment.unwrap();
    assert_eq!(latest.state, DeploymentState::Ready);
    assert_eq!(cloud.calls(LIST_PROJECT_DEPLOYMENTS), 1);

    let missing = orchestrator.get_deployment_status("p1", None).await;
    assert!(matches!(missing, Err(PublishError::CredentialError(_))));
}

#[tokio::test]
async fn test_status_of_unknown_project() {
    let (_cloud, _store, orchestrator) = setup().await;
    let err = assert_err!(orchestrator.get_deployment_status("nope", None).await);
    assert!(matches!(err, PublishError::NotFound(_)));
}

#[tokio::test]
async fn test_cancel_deployment() {
    let (cloud, _store, orchestrator) = setup().await;
    let cancelled = assert_ok!(
        orchestrator
            .cancel_deployment("dpl_1", &Credential::new("hosting-token"))
            .await
    );
    assert!(cancelled);
    assert_eq!(cloud.calls(CANCEL_DEPLOYMENT), 1);
}

#[tokio::test]
async fn test_each_run_has_its_own_id() {
    let (_cloud, _store, orchestrator) = setup().await;
    let first = orchestrator.deploy(&request("My App!"), &selection()).await;
    let second = orchestrator.deploy(&request("ab"), &selection()).await;
    assert_ne!(first.run_id, second.run_id);
}

#[tokio::test]
async fn test_concurrent_runs_keep_separate_trails() {
    let (cloud, _store, orchestrator) = setup().await;
    cloud.fail_project_named("broken-app");
    cloud.delay_on(CREATE_PROJECT, Duration::from_millis(20));

    let token = selection();
    let broken = request("Broken App");
    let healthy = request("My App!");
    let (failed, succeeded) = tokio::join!(
        orchestrator.deploy(&broken, &token),
        orchestrator.deploy(&healthy, &token)
    );

    assert!(!failed.success);
    assert_eq!(failed.steps.len(), 4);
    assert_eq!(failed.steps[3].step, Step::CreateHostingProject);
    assert_eq!(failed.steps[3].status, StepStatus::Failed);
    assert!(failed.error.unwrap().contains("broken-app"));
    assert!(failed.deployment_id.is_none());

    assert!(succeeded.success, "{:?}", succeeded.error);
    assert_eq!(succeeded.steps.len(), 7);
    assert!(succeeded
        .steps
        .iter()
        .all(|r| r.status == StepStatus::Completed));
    assert_eq!(succeeded.repository_full_name.as_deref(), Some("octo/my-app-"));

    assert_ne!(failed.run_id, succeeded.run_id);
    assert_eq!(cloud.calls(CREATE_PROJECT), 2);
    assert_eq!(cloud.calls(CREATE_DEPLOYMENT), 1);
}

#[tokio::test]
async fn test_single_static_file() {
    let (cloud, _store, orchestrator) = setup().await;
    let mut req = request("Landing");
    req.template_key = "static".to_string();
    req.files = BTreeMap::from([("index.html".to_string(), "<h1>Hi</h1>".to_string())]);

    let result = orchestrator.deploy(&req, &selection()).await;

    assert!(result.success, "{:?}", result.error);
    let (_, _, files) = cloud.commits.lock().unwrap()[0].clone();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].path, "index.html");
    assert_eq!(files[0].content, "<h1>Hi</h1>");
    assert_eq!(
        cloud.project_specs.lock().unwrap()[0].framework,
        Framework::Other
    );
}
