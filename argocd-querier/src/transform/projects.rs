use super::{Transformed, extract_items, parse_items, string_at};
use crate::errors::GatewayError;
use crate::models::{ProjectResponse, ProjectStatus};

/// Maps an ArgoCD `AppProjectList` body to a [`ProjectResponse`].
pub fn transform_projects(body: &[u8]) -> Result<Transformed<ProjectResponse>, GatewayError> {
    let items = parse_items(body)?;

    let transformed = extract_items("projects", items, |item| {
        Ok(ProjectStatus {
            project_name: string_at(item, "/metadata/name")?,
            namespace: string_at(item, "/metadata/namespace")?,
        })
    })?;

    Ok(Transformed {
        value: ProjectResponse {
            projects: transformed.value,
        },
        warnings: transformed.warnings,
    })
}
