//! Application-status and project-list pipelines.
//!
//! Each call runs fetch → validate → transform strictly in order. Any stage
//! can end the call with a [`GatewayError`]; nothing from a failed call is
//! returned. Retries only happen inside the fetch stage.

use crate::auth::AuthToken;
use crate::config::ArgoCdConfig;
use crate::endpoint::{Resource, UpstreamEndpoint};
use crate::errors::GatewayError;
use crate::metrics_defs::REQUEST_DURATION;
use crate::models::{ApplicationResponse, ProjectResponse};
use crate::retry::{RetryPolicy, fetch_with_retry};
use crate::transform::{Transformed, transform_applications, transform_projects};
use crate::transport::Transport;
use crate::validator::validate_status;
use shared::histogram;
use std::sync::Arc;
use std::time::Instant;

type TransformFn<T> = fn(&[u8]) -> Result<Transformed<T>, GatewayError>;

/// Queries ArgoCD on behalf of callers. Cheap to clone; clones share the transport.
#[derive(Clone)]
pub struct ArgoCdQuerier {
    transport: Arc<dyn Transport>,
    policy: RetryPolicy,
    applications: UpstreamEndpoint,
    projects: UpstreamEndpoint,
}

impl ArgoCdQuerier {
    pub fn new(
        config: &ArgoCdConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, url::ParseError> {
        let base_url = config.base_url()?;

        Ok(ArgoCdQuerier {
            transport,
            policy: RetryPolicy::from_config(config),
            applications: UpstreamEndpoint::new(&base_url, Resource::Applications),
            projects: UpstreamEndpoint::new(&base_url, Resource::Projects),
        })
    }

    /// Sync status of every application visible to the caller's token
    pub async fn application_status(
        &self,
        token: Option<&str>,
    ) -> Result<Transformed<ApplicationResponse>, GatewayError> {
        self.run(&self.applications, token, transform_applications)
            .await
    }

    /// Name and namespace of every project visible to the caller's token
    pub async fn list_projects(
        &self,
        token: Option<&str>,
    ) -> Result<Transformed<ProjectResponse>, GatewayError> {
        self.run(&self.projects, token, transform_projects).await
    }

    async fn run<T>(
        &self,
        endpoint: &UpstreamEndpoint,
        token: Option<&str>,
        transform: TransformFn<T>,
    ) -> Result<Transformed<T>, GatewayError> {
        let start = Instant::now();
        let resource = endpoint.resource().as_str();

        let result = self.run_stages(endpoint, token, transform).await;

        let outcome = match &result {
            Ok(_) => "ok",
            Err(e) => e.kind(),
        };
        histogram!(REQUEST_DURATION, "resource" => resource, "outcome" => outcome)
            .record(start.elapsed().as_secs_f64());

        match &result {
            Ok(transformed) => tracing::debug!(
                resource,
                skipped = transformed.warnings.len(),
                "Pipeline done"
            ),
            Err(e) => tracing::error!(resource, kind = e.kind(), error = %e, "Pipeline failed"),
        }

        result
    }

    async fn run_stages<T>(
        &self,
        endpoint: &UpstreamEndpoint,
        token: Option<&str>,
        transform: TransformFn<T>,
    ) -> Result<Transformed<T>, GatewayError> {
        let resource = endpoint.resource().as_str();
        let token = AuthToken::new(token.unwrap_or_default())?;

        tracing::debug!(resource, stage = "fetching", "Pipeline stage");
        let raw = fetch_with_retry(self.transport.as_ref(), endpoint, &token, &self.policy).await?;

        tracing::debug!(resource, stage = "validating", status = raw.status, "Pipeline stage");
        let body = validate_status(raw).inspect_err(|e| {
            if let GatewayError::UpstreamStatus { code, snippet } = e {
                tracing::debug!(resource, code, snippet = %snippet, "Upstream rejected request");
            }
        })?;

        tracing::debug!(resource, stage = "transforming", bytes = body.len(), "Pipeline stage");
        transform(&body)
    }
}
