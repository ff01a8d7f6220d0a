//! Provision, use and tear down one sandbox.
//!
//! The run is strictly sequential:
//!
//! 1. create a deployment service with no instances
//! 2. create a volume attached to it
//! 3. scale the service to one instance
//! 4. poll until the deployment reports `COMPLETED`
//! 5. run the command through an exec session
//! 6. delete the service
//!
//! A failure at any step ends the run immediately. Nothing created before
//! the failure is removed.

use crate::config::{ConfigError, RunnerConfig};
use platform::{DeploymentStatus, ExecOutput, PlatformError, SandboxPlatform, ScaleService};
use serde::Serialize;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum SandboxError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Platform call failed: {0}")]
    Platform(#[from] PlatformError),

    /// The deployment reported `FAILED` while waiting for it to come up.
    #[error("Sandbox {sandbox_id} failed to start: {}", .reason.as_deref().unwrap_or("deployment reported FAILED"))]
    StartFailed {
        sandbox_id: String,
        reason: Option<String>,
    },
}

pub type SandboxResult<T> = Result<T, SandboxError>;

/// Outcome of a completed run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub sandbox_id: String,
    pub volume_name: String,
    pub output: ExecOutput,
}

/// `sandbox-` followed by the last group of a random v4 UUID.
pub fn generate_sandbox_id() -> String {
    let simple = Uuid::new_v4().simple().to_string();
    format!("sandbox-{}", &simple[20..])
}

pub fn volume_name_for(sandbox_id: &str) -> String {
    format!("data-{}", sandbox_id)
}

pub struct SandboxRunner {
    platform: Box<dyn SandboxPlatform>,
    config: RunnerConfig,
}

impl SandboxRunner {
    pub fn new(platform: Box<dyn SandboxPlatform>, config: RunnerConfig) -> Self {
        Self { platform, config }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    pub async fn run(&self) -> SandboxResult<RunReport> {
        self.run_with_id(&generate_sandbox_id()).await
    }

    pub async fn run_with_id(&self, sandbox_id: &str) -> SandboxResult<RunReport> {
        self.config.spec.validate()?;
        info!(
            "Starting sandbox run {} on {}",
            sandbox_id,
            self.platform.platform_name()
        );

        self.create_service(sandbox_id).await?;
        let volume_name = self.attach_volume(sandbox_id).await?;
        self.boot(sandbox_id).await?;
        self.wait_until_ready(sandbox_id).await?;
        let output = self.execute(sandbox_id).await?;
        self.teardown(sandbox_id).await?;

        Ok(RunReport {
            sandbox_id: sandbox_id.to_string(),
            volume_name,
            output,
        })
    }

    async fn create_service(&self, sandbox_id: &str) -> SandboxResult<()> {
        println!("Creating sandbox service: {}", sandbox_id);
        let request = self.config.spec.service_request(sandbox_id);
        self.platform
            .create_deployment_service(&self.config.project_id, &request)
            .await?;
        println!("Sandbox service created");
        Ok(())
    }

    async fn attach_volume(&self, sandbox_id: &str) -> SandboxResult<String> {
        let volume_name = volume_name_for(sandbox_id);
        println!(
            "Attaching volume {} at {}...",
            volume_name, self.config.spec.mount_path
        );
        let request = self.config.spec.volume_request(&volume_name, sandbox_id);
        self.platform
            .create_volume(&self.config.project_id, &request)
            .await?;
        println!("Volume attached");
        Ok(volume_name)
    }

    async fn boot(&self, sandbox_id: &str) -> SandboxResult<()> {
        println!("Scaling sandbox to 1 instance...");
        self.platform
            .scale_service(
                &self.config.project_id,
                sandbox_id,
                &ScaleService { instances: 1 },
            )
            .await?;
        Ok(())
    }

    /// Polls without a deadline until the deployment completes or fails.
    async fn wait_until_ready(&self, sandbox_id: &str) -> SandboxResult<()> {
        println!("Waiting for sandbox to be ready...");
        let mut polls: u64 = 0;

        loop {
            let details = self
                .platform
                .get_service(&self.config.project_id, sandbox_id)
                .await?;
            polls += 1;

            match details.deployment_status() {
                Some(DeploymentStatus::Completed) => break,
                Some(DeploymentStatus::Failed) => {
                    let reason = details.deployment_state().and_then(|s| s.reason.clone());
                    warn!("Sandbox {} reported FAILED after {} polls", sandbox_id, polls);
                    return Err(SandboxError::StartFailed {
                        sandbox_id: sandbox_id.to_string(),
                        reason,
                    });
                }
                status => {
                    println!(
                        "  Status: {}",
                        status.map(DeploymentStatus::as_str).unwrap_or("PENDING")
                    );
                }
            }

            sleep(self.config.poll_interval).await;
        }

        debug!("Sandbox {} ready after {} polls", sandbox_id, polls);
        println!("Sandbox is ready");
        Ok(())
    }

    async fn execute(&self, sandbox_id: &str) -> SandboxResult<ExecOutput> {
        let request = self.config.spec.exec_request();
        println!("Executing command: {}", request.command);

        let output = self
            .platform
            .exec_command(&self.config.project_id, sandbox_id, &request)
            .await?;

        println!(
            "Command finished with exit code {}",
            output.result.exit_code
        );
        println!("Output: {}", output.stdout);
        if !output.stderr.is_empty() {
            println!("Stderr: {}", output.stderr);
        }
        Ok(output)
    }

    async fn teardown(&self, sandbox_id: &str) -> SandboxResult<()> {
        println!("Deleting sandbox service {}...", sandbox_id);
        self.platform
            .delete_service(&self.config.project_id, sandbox_id)
            .await?;
        println!("Sandbox deleted. Done.");
        Ok(())
    }
}
