//! Validated metric definitions and their server scope.

use crate::{
    error::ConfigError,
    server::ServerDescriptor,
    Tags,
};
use jolokia_gatherer_config::MetricConfig;

/// One `HostName[@AppName]` scope entry. At least one side is set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScopeFilter {
    Host(String),
    App(String),
    HostApp { host: String, app: String },
}

impl ScopeFilter {
    /// Splits on the first `@`. An empty side means "any".
    fn parse(entry: &str) -> Option<Self> {
        let (host, app) = entry.split_once('@').unwrap_or((entry, ""));
        match (host.is_empty(), app.is_empty()) {
            (true, true) => None,
            (false, true) => Some(ScopeFilter::Host(host.to_string())),
            (true, false) => Some(ScopeFilter::App(app.to_string())),
            (false, false) => Some(ScopeFilter::HostApp {
                host: host.to_string(),
                app: app.to_string(),
            }),
        }
    }

    pub fn matches(&self, server: &ServerDescriptor) -> bool {
        match self {
            ScopeFilter::Host(host) => server.host_name() == host,
            ScopeFilter::App(app) => server.app_name() == app,
            ScopeFilter::HostApp { host, app } => server.host_name() == host && server.app_name() == app,
        }
    }
}

/// A metric to read from every server its scope resolves to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MetricDefinition {
    pub name: String,
    pub mbean: String,
    pub attribute: String,
    pub path: String,
    /// Empty means every server.
    pub scope: Vec<ScopeFilter>,
    pub tags: Tags,
}

impl MetricDefinition {
    /// Validates a configured metric.
    ///
    /// Malformed scope entries are dropped and returned next to the definition; a malformed
    /// definition itself is an error.
    pub fn from_config(config: &MetricConfig) -> Result<(Self, Vec<ConfigError>), ConfigError> {
        let invalid = |reason: &str| ConfigError::Metric {
            metric: config.name.clone(),
            reason: reason.to_string(),
        };
        if config.name.is_empty() {
            return Err(invalid("name is empty"));
        }
        if config.mbean.is_empty() {
            return Err(invalid("mbean is empty"));
        }
        if config.attribute.contains(',') {
            return Err(invalid("attribute must name a single attribute"));
        }

        let mut errors = Vec::new();
        let mut scope = Vec::with_capacity(config.servers.len());
        for entry in &config.servers {
            match ScopeFilter::parse(entry) {
                Some(filter) => scope.push(filter),
                None => errors.push(ConfigError::Scope {
                    metric: config.name.clone(),
                    entry: entry.clone(),
                }),
            }
        }

        // Every entry being malformed must not widen the metric to all servers.
        if scope.is_empty() && !config.servers.is_empty() {
            return Err(invalid("no usable scope entry"));
        }

        let definition = Self {
            name: config.name.clone(),
            mbean: config.mbean.clone(),
            attribute: config.attribute.clone(),
            path: config.path.clone(),
            scope,
            tags: config.tags.clone(),
        };
        Ok((definition, errors))
    }

    pub fn applies_to_all(&self) -> bool {
        self.scope.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn config(servers: &[&str]) -> MetricConfig {
        MetricConfig {
            name: "heap".to_string(),
            mbean: "java.lang:type=Memory".to_string(),
            attribute: "HeapMemoryUsage".to_string(),
            servers: servers.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn parses_scope_entries() {
        let (metric, errors) = MetricDefinition::from_config(&config(&["ECS7", "ECS8@ydh", "@ydh", "h@a@b"])).unwrap();
        assert!(errors.is_empty());
        assert_eq!(
            metric.scope,
            vec![
                ScopeFilter::Host("ECS7".to_string()),
                ScopeFilter::HostApp {
                    host: "ECS8".to_string(),
                    app: "ydh".to_string()
                },
                ScopeFilter::App("ydh".to_string()),
                ScopeFilter::HostApp {
                    host: "h".to_string(),
                    app: "a@b".to_string()
                },
            ]
        );
    }

    #[test]
    fn host_with_trailing_at_is_host_only() {
        let (metric, _) = MetricDefinition::from_config(&config(&["ECS7@"])).unwrap();
        assert_eq!(metric.scope, vec![ScopeFilter::Host("ECS7".to_string())]);
    }

    #[test]
    fn drops_empty_scope_entries() {
        let (metric, errors) = MetricDefinition::from_config(&config(&["ECS7", "@", ""])).unwrap();
        assert_eq!(metric.scope.len(), 1);
        assert_eq!(errors.len(), 2);
        assert!(matches!(&errors[0], ConfigError::Scope { entry, .. } if entry == "@"));
    }

    #[test]
    fn only_malformed_scope_drops_the_metric() {
        let err = MetricDefinition::from_config(&config(&["@"])).unwrap_err();
        assert!(matches!(err, ConfigError::Metric { .. }));
    }

    #[test]
    fn rejects_incomplete_definitions() {
        let mut bad = config(&[]);
        bad.mbean.clear();
        assert!(MetricDefinition::from_config(&bad).is_err());

        let mut bad = config(&[]);
        bad.name.clear();
        assert!(MetricDefinition::from_config(&bad).is_err());

        let mut bad = config(&[]);
        bad.attribute = "ThreadCount,DaemonThreadCount".to_string();
        let err = MetricDefinition::from_config(&bad).unwrap_err();
        assert!(err.to_string().contains("single attribute"));
    }

    #[test]
    fn empty_scope_applies_to_all() {
        let (metric, errors) = MetricDefinition::from_config(&config(&[])).unwrap();
        assert!(errors.is_empty());
        assert!(metric.applies_to_all());
    }
}
