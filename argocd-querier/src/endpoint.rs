use url::Url;

/// Resource kinds the gateway reads from the ArgoCD API
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resource {
    Applications,
    Projects,
}

impl Resource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Applications => "applications",
            Resource::Projects => "projects",
        }
    }
}

/// One ArgoCD list endpoint, e.g. `https://argocd.internal/api/v1/applications`
#[derive(Clone, Debug, PartialEq)]
pub struct UpstreamEndpoint {
    url: Url,
    resource: Resource,
}

impl UpstreamEndpoint {
    pub fn new(base_url: &Url, resource: Resource) -> Self {
        let mut url = base_url.clone();
        url.set_path(&format!("/api/v1/{}", resource.as_str()));
        url.set_query(None);
        UpstreamEndpoint { url, resource }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn resource(&self) -> Resource {
        self.resource
    }
}
