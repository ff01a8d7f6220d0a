use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateDeploymentService {
    pub name: String,
    pub billing: Billing,
    pub deployment: DeploymentSpec,
}

impl CreateDeploymentService {
    /// A service running `image_path` with no instances started yet.
    pub fn new(name: impl Into<String>, image_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            billing: Billing {
                deployment_plan: "nf-compute-200".to_string(),
            },
            deployment: DeploymentSpec {
                instances: 0,
                external: ExternalImage {
                    image_path: image_path.into(),
                },
                storage: None,
            },
        }
    }

    pub fn with_plan(mut self, plan: impl Into<String>) -> Self {
        self.billing.deployment_plan = plan.into();
        self
    }

    pub fn with_ephemeral_storage(mut self, storage_size_mb: u32) -> Self {
        self.deployment.storage = Some(DeploymentStorage {
            ephemeral_storage: EphemeralStorage {
                storage_size: storage_size_mb,
            },
        });
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Billing {
    pub deployment_plan: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentSpec {
    pub instances: u32,
    pub external: ExternalImage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage: Option<DeploymentStorage>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExternalImage {
    pub image_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentStorage {
    pub ephemeral_storage: EphemeralStorage,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EphemeralStorage {
    pub storage_size: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateVolume {
    pub name: String,
    pub mounts: Vec<VolumeMount>,
    pub spec: VolumeSpec,
    pub attached_objects: Vec<AttachedObject>,
}

impl CreateVolume {
    /// A single-mount volume attached to `service_id`.
    pub fn for_service(
        name: impl Into<String>,
        service_id: impl Into<String>,
        mount_path: impl Into<String>,
        spec: VolumeSpec,
    ) -> Self {
        Self {
            name: name.into(),
            mounts: vec![VolumeMount {
                container_mount_path: mount_path.into(),
            }],
            spec,
            attached_objects: vec![AttachedObject {
                id: service_id.into(),
                object_type: AttachedObjectType::Service,
            }],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VolumeMount {
    pub container_mount_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VolumeSpec {
    pub access_mode: AccessMode,
    pub storage_class_name: String,
    pub storage_size: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AccessMode {
    ReadWriteOnce,
    ReadWriteMany,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AttachedObject {
    pub id: String,
    #[serde(rename = "type")]
    pub object_type: AttachedObjectType,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AttachedObjectType {
    Service,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScaleService {
    pub instances: u32,
}

/// Body of a service lookup. The platform omits status sections while a
/// service is still being scheduled, so every level is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceDetails {
    #[serde(default)]
    pub data: Option<ServiceData>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceData {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: Option<ServiceStatus>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceStatus {
    #[serde(default)]
    pub deployment: Option<DeploymentState>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentState {
    #[serde(default)]
    pub status: Option<DeploymentStatus>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub last_transition_time: Option<String>,
}

impl ServiceDetails {
    pub fn with_status(status: DeploymentStatus) -> Self {
        Self {
            data: Some(ServiceData {
                status: Some(ServiceStatus {
                    deployment: Some(DeploymentState {
                        status: Some(status),
                        ..Default::default()
                    }),
                }),
                ..Default::default()
            }),
        }
    }

    pub fn deployment_state(&self) -> Option<&DeploymentState> {
        self.data.as_ref()?.status.as_ref()?.deployment.as_ref()
    }

    pub fn deployment_status(&self) -> Option<&DeploymentStatus> {
        self.deployment_state()?.status.as_ref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DeploymentStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
    Other(String),
}

impl DeploymentStatus {
    pub fn as_str(&self) -> &str {
        match self {
            DeploymentStatus::Pending => "PENDING",
            DeploymentStatus::InProgress => "IN_PROGRESS",
            DeploymentStatus::Completed => "COMPLETED",
            DeploymentStatus::Failed => "FAILED",
            DeploymentStatus::Other(s) => s,
        }
    }
}

impl From<String> for DeploymentStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "PENDING" => DeploymentStatus::Pending,
            "IN_PROGRESS" => DeploymentStatus::InProgress,
            "COMPLETED" => DeploymentStatus::Completed,
            "FAILED" => DeploymentStatus::Failed,
            _ => DeploymentStatus::Other(value),
        }
    }
}

impl From<DeploymentStatus> for String {
    fn from(value: DeploymentStatus) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for DeploymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A one-shot command for an exec session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecRequest {
    pub command: String,
    pub shell: Option<String>,
}

impl ExecRequest {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            shell: Some("bash -c".to_string()),
        }
    }

    pub fn with_shell(mut self, shell: impl Into<String>) -> Self {
        self.shell = Some(shell.into());
        self
    }

    pub fn without_shell(mut self) -> Self {
        self.shell = None;
        self
    }

    /// The shell's words followed by the command as a single argument.
    /// Without a shell the command is split on whitespace.
    pub fn argv(&self) -> Vec<String> {
        match &self.shell {
            Some(shell) => shell
                .split_whitespace()
                .map(str::to_string)
                .chain(std::iter::once(self.command.clone()))
                .collect(),
            None => self
                .command
                .split_whitespace()
                .map(str::to_string)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandStatus {
    Success,
    Failure,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResult {
    pub exit_code: i32,
    pub status: CommandStatus,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecOutput {
    pub stdout: String,
    pub stderr: String,
    pub result: CommandResult,
}
