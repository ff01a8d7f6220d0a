use crate::types::{
    CreateDeploymentService, CreateVolume, ExecOutput, ExecRequest, ScaleService, ServiceDetails,
};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlatformError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Platform API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("Exec session failed: {message}")]
    ExecProtocol { message: String },
}

impl PlatformError {
    pub fn is_auth_error(&self) -> bool {
        matches!(self, PlatformError::Authentication { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, PlatformError::NotFound { .. })
    }
}

pub type PlatformResult<T> = Result<T, PlatformError>;

/// The remote operations a sandbox run needs from the platform.
#[async_trait]
pub trait SandboxPlatform: Send + Sync {
    async fn create_deployment_service(
        &self,
        project_id: &str,
        request: &CreateDeploymentService,
    ) -> PlatformResult<()>;

    async fn create_volume(&self, project_id: &str, request: &CreateVolume) -> PlatformResult<()>;

    async fn scale_service(
        &self,
        project_id: &str,
        service_id: &str,
        request: &ScaleService,
    ) -> PlatformResult<()>;

    async fn get_service(&self, project_id: &str, service_id: &str)
        -> PlatformResult<ServiceDetails>;

    /// Runs one command in a running instance and waits for it to exit.
    async fn exec_command(
        &self,
        project_id: &str,
        service_id: &str,
        request: &ExecRequest,
    ) -> PlatformResult<ExecOutput>;

    async fn delete_service(&self, project_id: &str, service_id: &str) -> PlatformResult<()>;

    fn platform_name(&self) -> &'static str;
}
