use async_trait::async_trait;
use platform::{
    AccessMode, CommandResult, CommandStatus, CreateDeploymentService, CreateVolume,
    DeploymentState, DeploymentStatus, ExecOutput, ExecRequest, PlatformError, PlatformResult,
    SandboxPlatform, ScaleService, ServiceDetails,
};
use sandbox::{RunnerConfig, SandboxError, SandboxRunner, SandboxSpec};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
enum Call {
    CreateService(String, CreateDeploymentService),
    CreateVolume(String, CreateVolume),
    Scale(String, String, u32),
    Get(String, String),
    Exec(String, String, Vec<String>),
    Delete(String, String),
}

/// Records every call and replays scripted deployment statuses.
#[derive(Clone, Default)]
struct RecordingPlatform {
    calls: Arc<Mutex<Vec<Call>>>,
    statuses: Arc<Mutex<VecDeque<ServiceDetails>>>,
    fail_volume: bool,
}

impl RecordingPlatform {
    fn with_statuses(statuses: Vec<ServiceDetails>) -> Self {
        Self {
            statuses: Arc::new(Mutex::new(statuses.into())),
            ..Default::default()
        }
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl SandboxPlatform for RecordingPlatform {
    async fn create_deployment_service(
        &self,
        project_id: &str,
        request: &CreateDeploymentService,
    ) -> PlatformResult<()> {
        self.record(Call::CreateService(project_id.to_string(), request.clone()));
        Ok(())
    }

    async fn create_volume(&self, project_id: &str, request: &CreateVolume) -> PlatformResult<()> {
        self.record(Call::CreateVolume(project_id.to_string(), request.clone()));
        if self.fail_volume {
            return Err(PlatformError::Api {
                status: 422,
                message: "storage class unavailable".to_string(),
            });
        }
        Ok(())
    }

    async fn scale_service(
        &self,
        project_id: &str,
        service_id: &str,
        request: &ScaleService,
    ) -> PlatformResult<()> {
        self.record(Call::Scale(
            project_id.to_string(),
            service_id.to_string(),
            request.instances,
        ));
        Ok(())
    }

    async fn get_service(
        &self,
        project_id: &str,
        service_id: &str,
    ) -> PlatformResult<ServiceDetails> {
        self.record(Call::Get(project_id.to_string(), service_id.to_string()));
        Ok(self
            .statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| ServiceDetails::with_status(DeploymentStatus::Completed)))
    }

    async fn exec_command(
        &self,
        project_id: &str,
        service_id: &str,
        request: &ExecRequest,
    ) -> PlatformResult<ExecOutput> {
        self.record(Call::Exec(
            project_id.to_string(),
            service_id.to_string(),
            request.argv(),
        ));
        Ok(ExecOutput {
            stdout: "Hello from the sandbox!\n".to_string(),
            stderr: String::new(),
            result: CommandResult {
                exit_code: 0,
                status: CommandStatus::Success,
                message: None,
            },
        })
    }

    async fn delete_service(&self, project_id: &str, service_id: &str) -> PlatformResult<()> {
        self.record(Call::Delete(project_id.to_string(), service_id.to_string()));
        Ok(())
    }

    fn platform_name(&self) -> &'static str {
        "recording"
    }
}

fn runner_for(platform: &RecordingPlatform) -> SandboxRunner {
    SandboxRunner::new(
        Box::new(platform.clone()),
        RunnerConfig::new("proj", SandboxSpec::default()).with_poll_interval(Duration::ZERO),
    )
}

fn get(id: &str) -> Call {
    Call::Get("proj".to_string(), id.to_string())
}

#[tokio::test]
async fn test_run_calls_platform_in_order() {
    let platform = RecordingPlatform::with_statuses(vec![
        ServiceDetails::default(),
        ServiceDetails::with_status(DeploymentStatus::Pending),
        ServiceDetails::with_status(DeploymentStatus::InProgress),
        ServiceDetails::with_status(DeploymentStatus::Completed),
    ]);
    let runner = runner_for(&platform);

    let report = runner.run_with_id("sandbox-0123456789ab").await.unwrap();

    assert_eq!(report.sandbox_id, "sandbox-0123456789ab");
    assert_eq!(report.volume_name, "data-sandbox-0123456789ab");
    assert_eq!(report.output.stdout, "Hello from the sandbox!\n");
    assert_eq!(report.output.result.exit_code, 0);

    let calls = platform.calls();
    let id = "sandbox-0123456789ab";
    let spec = SandboxSpec::default();
    assert_eq!(
        calls,
        vec![
            Call::CreateService("proj".to_string(), spec.service_request(id)),
            Call::CreateVolume(
                "proj".to_string(),
                spec.volume_request("data-sandbox-0123456789ab", id)
            ),
            Call::Scale("proj".to_string(), id.to_string(), 1),
            get(id),
            get(id),
            get(id),
            get(id),
            Call::Exec(
                "proj".to_string(),
                id.to_string(),
                vec![
                    "bash".to_string(),
                    "-c".to_string(),
                    "echo 'Hello from the sandbox!'".to_string()
                ]
            ),
            Call::Delete("proj".to_string(), id.to_string()),
        ]
    );
}

#[tokio::test]
async fn test_service_and_volume_parameters() {
    let platform = RecordingPlatform::default();
    let runner = runner_for(&platform);

    let report = runner.run().await.unwrap();
    let calls = platform.calls();

    match &calls[0] {
        Call::CreateService(project, request) => {
            assert_eq!(project, "proj");
            assert_eq!(request.name, report.sandbox_id);
            assert_eq!(request.deployment.instances, 0);
            assert_eq!(request.deployment.external.image_path, "ubuntu:22.04");
            assert_eq!(
                request
                    .deployment
                    .storage
                    .as_ref()
                    .map(|s| s.ephemeral_storage.storage_size),
                Some(2048)
            );
        }
        other => panic!("expected service creation first, got {:?}", other),
    }

    match &calls[1] {
        Call::CreateVolume(_, request) => {
            assert_eq!(request.name, format!("data-{}", report.sandbox_id));
            assert_eq!(request.mounts[0].container_mount_path, "/workspace");
            assert_eq!(request.spec.access_mode, AccessMode::ReadWriteMany);
            assert_eq!(request.spec.storage_class_name, "ssd");
            assert_eq!(request.spec.storage_size, 10240);
            assert_eq!(request.attached_objects.len(), 1);
            assert_eq!(request.attached_objects[0].id, report.sandbox_id);
        }
        other => panic!("expected volume creation second, got {:?}", other),
    }
}

#[tokio::test]
async fn test_failed_deployment_stops_without_cleanup() {
    let failed = ServiceDetails {
        data: Some(platform::types::ServiceData {
            status: Some(platform::types::ServiceStatus {
                deployment: Some(DeploymentState {
                    status: Some(DeploymentStatus::Failed),
                    reason: Some("CrashLoopBackOff".to_string()),
                    last_transition_time: None,
                }),
            }),
            ..Default::default()
        }),
    };
    let platform = RecordingPlatform::with_statuses(vec![
        ServiceDetails::with_status(DeploymentStatus::Pending),
        failed,
    ]);
    let runner = runner_for(&platform);

    let err = runner.run_with_id("sandbox-failing").await.unwrap_err();
    match err {
        SandboxError::StartFailed { sandbox_id, reason } => {
            assert_eq!(sandbox_id, "sandbox-failing");
            assert_eq!(reason.as_deref(), Some("CrashLoopBackOff"));
        }
        other => panic!("unexpected error: {:?}", other),
    }

    let calls = platform.calls();
    assert!(matches!(calls.last(), Some(Call::Get(_, _))));
    assert!(!calls
        .iter()
        .any(|c| matches!(c, Call::Exec(..) | Call::Delete(..))));
}

#[tokio::test]
async fn test_platform_error_aborts_run() {
    let platform = RecordingPlatform {
        fail_volume: true,
        ..Default::default()
    };
    let runner = runner_for(&platform);

    let err = runner.run_with_id("sandbox-novolume").await.unwrap_err();
    assert!(matches!(
        err,
        SandboxError::Platform(PlatformError::Api { status: 422, .. })
    ));

    let calls = platform.calls();
    assert_eq!(calls.len(), 2);
    assert!(matches!(calls[1], Call::CreateVolume(..)));
}

#[tokio::test]
async fn test_invalid_spec_makes_no_calls() {
    let platform = RecordingPlatform::default();
    let spec = SandboxSpec {
        command: String::new(),
        ..Default::default()
    };
    let runner = SandboxRunner::new(Box::new(platform.clone()), RunnerConfig::new("proj", spec));

    let err = runner.run().await.unwrap_err();
    assert!(matches!(err, SandboxError::Config(_)));
    assert!(platform.calls().is_empty());
}

#[tokio::test]
async fn test_unrecognised_status_keeps_polling() {
    let platform = RecordingPlatform::with_statuses(vec![
        ServiceDetails::with_status(DeploymentStatus::Other("SCALING".to_string())),
        ServiceDetails::with_status(DeploymentStatus::Completed),
    ]);
    let runner = runner_for(&platform);

    let report = runner.run_with_id("sandbox-scaling").await.unwrap();
    assert_eq!(report.output.result.exit_code, 0);

    let calls = platform.calls();
    let gets = calls
        .iter()
        .filter(|c| matches!(c, Call::Get(..)))
        .count();
    assert_eq!(gets, 2);
    assert!(matches!(calls.last(), Some(Call::Delete(..))));
}
