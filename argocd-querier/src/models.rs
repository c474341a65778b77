//! Response schema served to downstream consumers.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationStatus {
    pub application_name: String,
    /// Sync status as reported by ArgoCD, e.g. `Synced`, `OutOfSync`, `Unknown`
    pub status: String,
}

/// Applications in upstream order. May be empty.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationResponse {
    pub applications: Vec<ApplicationStatus>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectStatus {
    pub project_name: String,
    pub namespace: String,
}

/// Projects in upstream order. May be empty.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectResponse {
    pub projects: Vec<ProjectStatus>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthCheckResponse {
    pub status_code: u16,
    pub message: String,
}
