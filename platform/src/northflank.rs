use crate::api::{PlatformError, PlatformResult, SandboxPlatform};
use crate::config::PlatformConfig;
use crate::exec::run_exec_session;
use crate::types::{
    CreateDeploymentService, CreateVolume, ExecOutput, ExecRequest, ScaleService, ServiceDetails,
};
use async_trait::async_trait;
use reqwest::{header, Method, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error, info};

pub struct NorthflankClient {
    http_client: reqwest::Client,
    config: PlatformConfig,
}

impl NorthflankClient {
    pub fn new(config: PlatformConfig) -> PlatformResult<Self> {
        config
            .validate()
            .map_err(|msg| PlatformError::InvalidConfig { message: msg })?;

        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| PlatformError::InvalidConfig {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            http_client,
            config,
        })
    }

    pub fn config(&self) -> &PlatformConfig {
        &self.config
    }

    fn service_path(project_id: &str, service_id: &str) -> String {
        format!("/v1/projects/{}/services/{}", project_id, service_id)
    }

    async fn send<B>(&self, method: Method, path: &str, body: Option<&B>) -> PlatformResult<Response>
    where
        B: Serialize + ?Sized,
    {
        let url = self.config.api_url(path);
        debug!("{} {}", method, url);

        let mut request = self
            .http_client
            .request(method, &url)
            .header(
                header::AUTHORIZATION,
                format!("Bearer {}", self.config.token),
            );

        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            error!("Request to {} failed: {}", url, e);
            PlatformError::Network(e)
        })?;

        Self::check_status(response).await
    }

    async fn check_status(response: Response) -> PlatformResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        error!("Platform API returned {}: {}", status, message);

        Err(match status.as_u16() {
            401 | 403 => PlatformError::Authentication { message },
            404 => PlatformError::NotFound { message },
            code => PlatformError::Api {
                status: code,
                message,
            },
        })
    }

    async fn post<B>(&self, path: &str, body: &B) -> PlatformResult<()>
    where
        B: Serialize + ?Sized,
    {
        self.send(Method::POST, path, Some(body)).await?;
        Ok(())
    }

    async fn get<T>(&self, path: &str) -> PlatformResult<T>
    where
        T: DeserializeOwned,
    {
        let response = self.send::<()>(Method::GET, path, None).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl SandboxPlatform for NorthflankClient {
    async fn create_deployment_service(
        &self,
        project_id: &str,
        request: &CreateDeploymentService,
    ) -> PlatformResult<()> {
        let path = format!("/v1/projects/{}/services/deployment", project_id);
        self.post(&path, request).await?;
        info!("Created deployment service {}", request.name);
        Ok(())
    }

    async fn create_volume(&self, project_id: &str, request: &CreateVolume) -> PlatformResult<()> {
        let path = format!("/v1/projects/{}/volumes", project_id);
        self.post(&path, request).await?;
        info!("Created volume {}", request.name);
        Ok(())
    }

    async fn scale_service(
        &self,
        project_id: &str,
        service_id: &str,
        request: &ScaleService,
    ) -> PlatformResult<()> {
        let path = format!("{}/scale", Self::service_path(project_id, service_id));
        self.post(&path, request).await?;
        info!(
            "Scaled service {} to {} instance(s)",
            service_id, request.instances
        );
        Ok(())
    }

    async fn get_service(
        &self,
        project_id: &str,
        service_id: &str,
    ) -> PlatformResult<ServiceDetails> {
        self.get(&Self::service_path(project_id, service_id)).await
    }

    async fn exec_command(
        &self,
        project_id: &str,
        service_id: &str,
        request: &ExecRequest,
    ) -> PlatformResult<ExecOutput> {
        let url = self.config.exec_url(project_id, service_id);
        run_exec_session(&url, &self.config.token, request).await
    }

    async fn delete_service(&self, project_id: &str, service_id: &str) -> PlatformResult<()> {
        self.send::<()>(
            Method::DELETE,
            &Self::service_path(project_id, service_id),
            None,
        )
        .await?;
        info!("Deleted service {}", service_id);
        Ok(())
    }

    fn platform_name(&self) -> &'static str {
        "northflank"
    }
}
