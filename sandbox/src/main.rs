use clap::Parser;
use platform::{AccessMode, NorthflankClient, PlatformConfig, DEFAULT_BASE_URL};
use sandbox::{
    Credentials, RunnerConfig, SandboxError, SandboxRunner, SandboxSpec, PROJECT_ID_ENV, TOKEN_ENV,
};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "nf-sandbox")]
#[command(about = "Run one shell command in a disposable Northflank sandbox")]
struct Cli {
    /// Command to run inside the sandbox
    #[arg(short, long, default_value = "echo 'Hello from the sandbox!'")]
    command: String,
    /// Shell the command is passed to; empty runs the command's words directly
    #[arg(long, default_value = "bash -c")]
    shell: String,
    /// Container image for the sandbox
    #[arg(long, default_value = "ubuntu:22.04")]
    image: String,
    /// Billing plan of the deployment
    #[arg(long, default_value = "nf-compute-200")]
    plan: String,
    /// Ephemeral storage in MB
    #[arg(long, default_value = "2048")]
    ephemeral_storage: u32,
    /// Persistent volume size in MB
    #[arg(long, default_value = "10240")]
    volume_size: u32,
    /// Where the volume is mounted in the container
    #[arg(long, default_value = "/workspace")]
    mount_path: String,
    /// Storage class of the volume
    #[arg(long, default_value = "ssd")]
    storage_class: String,
    /// Mount the volume read-write for a single instance only
    #[arg(long)]
    single_writer: bool,
    /// Platform API base URL
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    api_url: String,
    /// Print the run report as JSON when done
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn spec(&self) -> SandboxSpec {
        let shell = self.shell.trim();
        SandboxSpec {
            image: self.image.clone(),
            deployment_plan: self.plan.clone(),
            ephemeral_storage_mb: self.ephemeral_storage,
            volume_size_mb: self.volume_size,
            mount_path: self.mount_path.clone(),
            storage_class: self.storage_class.clone(),
            access_mode: if self.single_writer {
                AccessMode::ReadWriteOnce
            } else {
                AccessMode::ReadWriteMany
            },
            command: self.command.clone(),
            shell: (!shell.is_empty()).then(|| shell.to_string()),
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Points at the environment variable most likely behind a failed run.
fn error_hint(error: &SandboxError) -> Option<String> {
    match error {
        SandboxError::Platform(e) if e.is_auth_error() => {
            Some(format!("Check that {} is a valid API token", TOKEN_ENV))
        }
        SandboxError::Platform(e) if e.is_not_found() => Some(format!(
            "Check that {} names an existing project",
            PROJECT_ID_ENV
        )),
        _ => None,
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let credentials = match Credentials::from_env() {
        Ok(credentials) => credentials,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    println!("Initializing API client...");
    let client = NorthflankClient::new(
        PlatformConfig::new(credentials.token.clone()).with_base_url(&cli.api_url),
    )?;
    println!("API client initialized");

    let runner = SandboxRunner::new(
        Box::new(client),
        RunnerConfig::new(credentials.project_id.clone(), cli.spec()),
    );
    info!("Using project {}", runner.config().project_id);

    match runner.run().await {
        Ok(report) => {
            info!(
                "Sandbox {} finished with exit code {}",
                report.sandbox_id, report.output.result.exit_code
            );
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
            Ok(())
        }
        Err(e) => {
            error!("Sandbox run failed: {}", e);
            if let Some(hint) = error_hint(&e) {
                eprintln!("{}", hint);
            }
            Err(e.into())
        }
    }
}
