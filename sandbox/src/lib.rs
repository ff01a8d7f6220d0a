pub mod config;
pub mod runner;

pub use config::{
    ConfigError, Credentials, RunnerConfig, SandboxSpec, PROJECT_ID_ENV, TOKEN_ENV,
};
pub use runner::{
    generate_sandbox_id, volume_name_for, RunReport, SandboxError, SandboxResult, SandboxRunner,
};
