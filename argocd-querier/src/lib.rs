//! Read-only gateway in front of the ArgoCD REST API.
//!
//! Exposes `GET /argocd/application_status` and `GET /argocd/list_projects`,
//! forwarding the caller's bearer token and reshaping ArgoCD's list payloads
//! into a small, stable schema.

pub mod auth;
pub mod config;
pub mod endpoint;
pub mod errors;
pub mod metrics_defs;
pub mod models;
pub mod pipeline;
pub mod retry;
pub mod transform;
pub mod transport;
pub mod validator;

mod service;
#[cfg(test)]
mod testutils;

use pipeline::ArgoCdQuerier;
use service::QuerierService;
use shared::admin_service::AdminService;
use shared::http::run_http_service;
use std::sync::Arc;
use transport::{ClientBuildError, ReqwestTransport};

#[derive(thiserror::Error, Debug)]
pub enum QuerierError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Client(#[from] ClientBuildError),
    #[error("invalid ArgoCD URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

pub async fn run(config: config::Config) -> Result<(), QuerierError> {
    let transport = Arc::new(ReqwestTransport::new(&config.argocd)?);
    let querier = ArgoCdQuerier::new(&config.argocd, transport)?;
    let upstream = config.argocd.base_url()?;
    tracing::info!(
        %upstream,
        max_attempts = config.argocd.max_attempts,
        timeout_secs = config.argocd.timeout_secs,
        "Starting ArgoCD querier"
    );

    let querier_service = QuerierService::new(querier, config.cors);
    let admin_service = AdminService::new(|| true);

    let querier_task = run_http_service(
        &config.listener.host,
        config.listener.port,
        querier_service,
    );
    let admin_task = run_http_service::<_, QuerierError>(
        &config.admin_listener.host,
        config.admin_listener.port,
        admin_service,
    );

    tokio::try_join!(querier_task, admin_task)?;
    Ok(())
}
