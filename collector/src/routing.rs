//! The routing table: which metric definitions are read from which server.

use crate::{
    accumulator::Accumulator,
    error::ConfigError,
    metric::MetricDefinition,
    server::ServerDescriptor,
};
use jolokia_gatherer_config::MetricConfig;
use std::sync::Arc;

/// A server and the ordered metric definitions routed to it.
#[derive(Debug, Clone)]
pub struct ServerRoute {
    pub server: ServerDescriptor,
    pub metrics: Vec<Arc<MetricDefinition>>,
}

/// Built once per configuration load and read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct RoutingTable {
    routes: Vec<ServerRoute>,
}

impl RoutingTable {
    /// Parses the connection strings and metric entries and routes every metric to the
    /// servers its scope resolves to.
    ///
    /// Malformed entries are reported to `acc` and left out; they never fail the build.
    pub fn build(servers: &[String], metrics: &[MetricConfig], acc: &dyn Accumulator) -> Self {
        let mut table = Self::default();

        for raw in servers {
            match raw.parse::<ServerDescriptor>() {
                Ok(server) if table.routes.iter().any(|route| route.server.same_identity(&server)) => {
                    acc.add_error(
                        ConfigError::DuplicateServer {
                            server: server.to_string(),
                        }
                        .into(),
                    );
                }
                Ok(server) => {
                    debug!(%server, "registered server");
                    table.routes.push(ServerRoute {
                        server,
                        metrics: Vec::new(),
                    });
                }
                Err(e) => acc.add_error(e.into()),
            }
        }

        for config in metrics {
            match MetricDefinition::from_config(config) {
                Ok((metric, scope_errors)) => {
                    for e in scope_errors {
                        acc.add_error(e.into());
                    }
                    table.add_metric(Arc::new(metric));
                }
                Err(e) => acc.add_error(e.into()),
            }
        }

        info!(
            servers = table.routes.len(),
            routes = table.routes.iter().map(|r| r.metrics.len()).sum::<usize>(),
            "routing table built"
        );
        table
    }

    /// Appends `metric` once per matching (scope entry, server) pair. Overlapping scope
    /// entries therefore route a metric to the same server more than once.
    pub fn add_metric(&mut self, metric: Arc<MetricDefinition>) {
        if metric.applies_to_all() {
            for route in &mut self.routes {
                route.metrics.push(Arc::clone(&metric));
            }
            return;
        }

        for filter in &metric.scope {
            let mut matched = false;
            for route in self.routes.iter_mut().filter(|route| filter.matches(&route.server)) {
                route.metrics.push(Arc::clone(&metric));
                matched = true;
            }
            if !matched {
                debug!(metric = %metric.name, ?filter, "scope entry matches no configured server");
            }
        }
    }

    pub fn routes(&self) -> &[ServerRoute] {
        &self.routes
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
