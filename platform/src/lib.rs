pub mod api;
pub mod config;
pub mod exec;
pub mod northflank;
pub mod types;

pub use api::{PlatformError, PlatformResult, SandboxPlatform};
pub use config::{PlatformConfig, DEFAULT_BASE_URL};
pub use northflank::NorthflankClient;
pub use types::{
    AccessMode, AttachedObject, AttachedObjectType, Billing, CommandResult, CommandStatus,
    CreateDeploymentService, CreateVolume, DeploymentSpec, DeploymentState, DeploymentStatus,
    ExecOutput, ExecRequest, ScaleService, ServiceDetails, VolumeMount, VolumeSpec,
};

pub mod prelude {
    pub use crate::api::*;
    pub use crate::config::*;
    pub use crate::northflank::*;
    pub use crate::types::*;
}
