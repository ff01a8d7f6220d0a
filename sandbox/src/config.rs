use platform::{AccessMode, CreateDeploymentService, CreateVolume, ExecRequest, VolumeSpec};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

pub const TOKEN_ENV: &str = "NORTHFLANK_TOKEN";
pub const PROJECT_ID_ENV: &str = "NORTHFLANK_PROJECT_ID";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing {name} environment variable")]
    MissingEnv { name: &'static str },

    #[error("Invalid sandbox spec: {message}")]
    InvalidSpec { message: String },
}

/// API token and target project, read from the environment.
#[derive(Clone)]
pub struct Credentials {
    pub token: String,
    pub project_id: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"<redacted>")
            .field("project_id", &self.project_id)
            .finish()
    }
}

impl Credentials {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// The token is checked before the project id; empty values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &'static str| {
            lookup(name)
                .filter(|value| !value.is_empty())
                .ok_or(ConfigError::MissingEnv { name })
        };

        let token = read(TOKEN_ENV)?;
        let project_id = read(PROJECT_ID_ENV)?;

        Ok(Self { token, project_id })
    }
}

/// What to provision and what to run inside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SandboxSpec {
    pub image: String,
    pub deployment_plan: String,
    pub ephemeral_storage_mb: u32,
    pub volume_size_mb: u32,
    pub mount_path: String,
    pub storage_class: String,
    pub access_mode: AccessMode,
    pub command: String,
    pub shell: Option<String>,
}

impl Default for SandboxSpec {
    fn default() -> Self {
        Self {
            image: "ubuntu:22.04".to_string(),
            deployment_plan: "nf-compute-200".to_string(),
            ephemeral_storage_mb: 2048,
            volume_size_mb: 10240,
            mount_path: "/workspace".to_string(),
            storage_class: "ssd".to_string(),
            access_mode: AccessMode::ReadWriteMany,
            command: "echo 'Hello from the sandbox!'".to_string(),
            shell: Some("bash -c".to_string()),
        }
    }
}

impl SandboxSpec {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |message: &str| {
            Err(ConfigError::InvalidSpec {
                message: message.to_string(),
            })
        };

        if self.image.trim().is_empty() {
            return invalid("image cannot be empty");
        }
        if self.deployment_plan.trim().is_empty() {
            return invalid("deployment plan cannot be empty");
        }
        if self.command.trim().is_empty() {
            return invalid("command cannot be empty");
        }
        if !self.mount_path.starts_with('/') {
            return invalid("mount path must be absolute");
        }
        if self.ephemeral_storage_mb == 0 || self.volume_size_mb == 0 {
            return invalid("storage sizes must be greater than 0");
        }

        Ok(())
    }

    pub fn service_request(&self, sandbox_id: &str) -> CreateDeploymentService {
        CreateDeploymentService::new(sandbox_id, &self.image)
            .with_plan(&self.deployment_plan)
            .with_ephemeral_storage(self.ephemeral_storage_mb)
    }

    pub fn volume_request(&self, volume_name: &str, sandbox_id: &str) -> CreateVolume {
        CreateVolume::for_service(
            volume_name,
            sandbox_id,
            &self.mount_path,
            VolumeSpec {
                access_mode: self.access_mode,
                storage_class_name: self.storage_class.clone(),
                storage_size: self.volume_size_mb,
            },
        )
    }

    pub fn exec_request(&self) -> ExecRequest {
        let request = ExecRequest::new(&self.command);
        match &self.shell {
            Some(shell) => request.with_shell(shell),
            None => request.without_shell(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub project_id: String,
    pub spec: SandboxSpec,
    /// Delay between readiness checks.
    pub poll_interval: Duration,
}

impl RunnerConfig {
    pub fn new(project_id: impl Into<String>, spec: SandboxSpec) -> Self {
        Self {
            project_id: project_id.into(),
            spec,
            poll_interval: Duration::from_secs(1),
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}
