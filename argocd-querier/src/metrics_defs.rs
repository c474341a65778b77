use shared::metrics_defs::{MetricDef, MetricType};

pub const REQUEST_DURATION: MetricDef = MetricDef {
    name: "argocd.request.duration",
    metric_type: MetricType::Histogram,
    description: "Pipeline duration in seconds. Tagged with resource, outcome.",
};

pub const REQUESTS_INFLIGHT: MetricDef = MetricDef {
    name: "argocd.requests.inflight",
    metric_type: MetricType::Gauge,
    description: "Number of requests currently being processed",
};

pub const UPSTREAM_ATTEMPTS: MetricDef = MetricDef {
    name: "argocd.upstream.attempts",
    metric_type: MetricType::Counter,
    description: "Outbound attempts against ArgoCD. Tagged with resource.",
};

pub const UPSTREAM_RETRIES: MetricDef = MetricDef {
    name: "argocd.upstream.retries",
    metric_type: MetricType::Counter,
    description: "Attempts retried after a transport failure. Tagged with resource.",
};

pub const TRANSFORM_SKIPPED_ITEMS: MetricDef = MetricDef {
    name: "argocd.transform.skipped_items",
    metric_type: MetricType::Counter,
    description: "Upstream items skipped because of missing fields. Tagged with resource.",
};

pub const ALL_METRICS: &[MetricDef] = &[
    REQUEST_DURATION,
    REQUESTS_INFLIGHT,
    UPSTREAM_ATTEMPTS,
    UPSTREAM_RETRIES,
    TRANSFORM_SKIPPED_ITEMS,
];
