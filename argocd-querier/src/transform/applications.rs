use super::{Transformed, extract_items, parse_items, string_at};
use crate::errors::GatewayError;
use crate::models::{ApplicationResponse, ApplicationStatus};

/// Maps an ArgoCD `ApplicationList` body to an [`ApplicationResponse`].
///
/// Reads `metadata.name` and `status.sync.status` of each item.
pub fn transform_applications(
    body: &[u8],
) -> Result<Transformed<ApplicationResponse>, GatewayError> {
    let items = parse_items(body)?;

    let transformed = extract_items("applications", items, |item| {
        Ok(ApplicationStatus {
            application_name: string_at(item, "/metadata/name")?,
            status: string_at(item, "/status/sync/status")?,
        })
    })?;

    Ok(Transformed {
        value: ApplicationResponse {
            applications: transformed.value,
        },
        warnings: transformed.warnings,
    })
}
