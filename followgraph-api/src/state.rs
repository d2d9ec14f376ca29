//! Shared server state

use std::sync::Arc;

use followgraph_core::config::Config;
use followgraph_core::core_graph::EdgeStore;
use followgraph_core::{
    AccessGate, CallerContext, CredentialRegistry, Credentials, FollowCollectionService,
    GraphResult, PaginationEngine,
};
use metrics_exporter_prometheus::PrometheusHandle;

/// Server state shared across requests
#[derive(Clone)]
pub struct AppState {
    pub service: FollowCollectionService,
    pub gate: AccessGate,
    pub registry: Arc<CredentialRegistry>,
    /// Present when a Prometheus recorder is installed
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Wire the registry, gate, and collection service over `store`
    pub fn new(config: &Config, store: Arc<dyn EdgeStore>) -> GraphResult<Self> {
        let registry = Arc::new(CredentialRegistry::new(store.clone(), &config.auth)?);
        let service = FollowCollectionService::new(
            store,
            PaginationEngine::new(config.pagination.default_count),
            config.server.public_base_url(),
        );

        Ok(Self {
            service,
            gate: AccessGate::new(registry.clone()),
            registry,
            metrics: None,
        })
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    pub async fn authorize(&self, credentials: Option<&Credentials>) -> GraphResult<CallerContext> {
        self.gate.authorize(credentials).await
    }
}
