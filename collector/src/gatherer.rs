//! One collection cycle: request, validate, flatten and emit per server.

use crate::{
    accumulator::{
        Accumulator,
        Record,
        Tags,
    },
    client::{
        HttpClient,
        JolokiaClient,
        RawResponse,
    },
    error::{
        GatherError,
        ProtocolError,
        RemoteStatusError,
    },
    flatten::flatten,
    metric::MetricDefinition,
    request::BatchRequest,
    routing::{
        RoutingTable,
        ServerRoute,
    },
    server::ServerDescriptor,
};
use chrono::{
    DateTime,
    Utc,
};
use eyre::Result;
use futures::future::join_all;
use jolokia_gatherer_config::{
    Config,
    MetricConfig,
};
use serde_json::{
    Map,
    Value,
};
use std::sync::{
    Arc,
    OnceLock,
};

type SubResponse = Map<String, Value>;

/// The parts of the configuration a cycle needs.
#[derive(Debug, Clone)]
pub struct GatherSettings {
    pub context: String,
    pub delimiter: String,
    pub servers: Vec<String>,
    pub metrics: Vec<MetricConfig>,
}

impl From<&Config> for GatherSettings {
    fn from(config: &Config) -> Self {
        Self {
            context: config.context.clone(),
            delimiter: config.delimiter.clone(),
            servers: config.servers.clone(),
            metrics: config.metrics.clone(),
        }
    }
}

/// Counts of one cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleSummary {
    pub servers: usize,
    pub records: usize,
    pub errors: usize,
}

/// Runs collection cycles against every configured server.
///
/// The HTTP client lives as long as the gatherer. The routing table is built by the first
/// cycle and reused until [`Gatherer::reload`].
pub struct Gatherer {
    settings: GatherSettings,
    client: Arc<dyn JolokiaClient>,
    routing: OnceLock<RoutingTable>,
}

impl Gatherer {
    pub fn new(config: &Config) -> Result<Self> {
        let client = HttpClient::new(config.response_header_timeout, config.client_timeout)?;
        Ok(Self::with_client(config.into(), Arc::new(client)))
    }

    pub fn with_client(settings: GatherSettings, client: Arc<dyn JolokiaClient>) -> Self {
        Self {
            settings,
            client,
            routing: OnceLock::new(),
        }
    }

    /// The routing table, built on first use. Configuration errors found while building it
    /// are reported to `acc` once.
    pub fn routing(&self, acc: &dyn Accumulator) -> &RoutingTable {
        self.routing
            .get_or_init(|| RoutingTable::build(&self.settings.servers, &self.settings.metrics, acc))
    }

    /// Swaps in new settings; the next cycle rebuilds the routing table.
    pub fn reload(&mut self, settings: GatherSettings) {
        info!("reloading server and metric configuration");
        self.settings = settings;
        self.routing = OnceLock::new();
    }

    /// Polls every routed server once and reports records and errors to `acc`.
    ///
    /// Servers are queried concurrently; their outcomes are reported in configuration order
    /// after all of them finished.
    #[instrument(level = "debug", skip_all)]
    pub async fn gather(&self, acc: &dyn Accumulator) -> CycleSummary {
        let routing = self.routing(acc);

        let cycles = routing
            .routes()
            .iter()
            .filter(|route| {
                if route.metrics.is_empty() {
                    debug!(server = %route.server, "no metrics routed, skipping");
                }
                !route.metrics.is_empty()
            })
            .map(|route| self.gather_server(route));
        let outcomes = join_all(cycles).await;

        let mut summary = CycleSummary {
            servers: outcomes.len(),
            ..Default::default()
        };
        for outcome in outcomes.into_iter().flatten() {
            match outcome {
                Ok(record) => {
                    summary.records += 1;
                    acc.add_fields(record);
                }
                Err(error) => {
                    summary.errors += 1;
                    acc.add_error(error);
                }
            }
        }

        debug!(?summary, "cycle complete");
        summary
    }

    async fn gather_server(&self, route: &ServerRoute) -> Vec<Result<Record, GatherError>> {
        let server = &route.server;

        let request = match BatchRequest::new(server, &self.settings.context, &route.metrics) {
            Ok(request) => request,
            Err(e) => {
                return vec![Err(GatherError::Request {
                    server: server.to_string(),
                    reason: format!("{e:#}"),
                })]
            }
        };

        debug!(%server, url = %request.display_url(), reads = request.len(), "sending batch");
        let response = match self.client.send(&request).await {
            Ok(response) => response,
            Err(error) => {
                return vec![Err(GatherError::Transport {
                    server: request.display_url(),
                    error,
                })]
            }
        };
        let received_at = Utc::now();

        let responses = match validate(&request, response) {
            Ok(responses) => responses,
            Err(e) => return vec![Err(e.into())],
        };

        let tags = server_tags(server);
        request
            .metrics()
            .iter()
            .zip(responses)
            .map(|(metric, response)| self.extract(server, metric, &response, &tags, received_at))
            .collect()
    }

    /// Turns one sub-response into a record for `metric`.
    fn extract(
        &self,
        server: &ServerDescriptor,
        metric: &MetricDefinition,
        response: &SubResponse,
        server_tags: &Tags,
        received_at: DateTime<Utc>,
    ) -> Result<Record, GatherError> {
        match response.get("status") {
            None => {
                return Err(RemoteStatusError::Missing {
                    server: server.address().to_string(),
                    mbean: metric.mbean.clone(),
                    attribute: metric.attribute.clone(),
                }
                .into())
            }
            Some(status) if status.as_f64() != Some(200.0) => {
                return Err(RemoteStatusError::Unexpected {
                    server: server.address().to_string(),
                    mbean: metric.mbean.clone(),
                    attribute: metric.attribute.clone(),
                    status: status.clone(),
                }
                .into())
            }
            Some(_) => {}
        }

        let value = response.get("value").ok_or_else(|| GatherError::MissingValue {
            server: server.address().to_string(),
            mbean: metric.mbean.clone(),
            attribute: metric.attribute.clone(),
        })?;

        let mut tags = server_tags.clone();
        tags.extend(metric.tags.iter().map(|(k, v)| (k.clone(), v.clone())));

        let timestamp = response
            .get("timestamp")
            .and_then(Value::as_i64)
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .unwrap_or(received_at);

        Ok(Record {
            measurement: metric.name.clone(),
            tags,
            fields: flatten(value, &self.settings.delimiter),
            timestamp,
        })
    }
}

/// Checks the HTTP status, decodes the body and matches its length against the batch.
fn validate(request: &BatchRequest, response: RawResponse) -> Result<Vec<SubResponse>, ProtocolError> {
    if response.status != 200 {
        return Err(ProtocolError::Status {
            url: request.display_url(),
            status: response.status,
            reason: response.reason,
        });
    }

    let responses: Vec<SubResponse> =
        serde_json::from_str(&response.body).map_err(|error| ProtocolError::Decode {
            server: request.display_url(),
            error,
            body: response.body.clone(),
        })?;

    if responses.len() != request.len() {
        return Err(ProtocolError::Count {
            server: request.display_url(),
            expected: request.len(),
            received: responses.len(),
        });
    }
    Ok(responses)
}

fn server_tags(server: &ServerDescriptor) -> Tags {
    Tags::from([
        ("HostName".to_string(), server.host_name().to_string()),
        ("AppName".to_string(), server.app_name().to_string()),
        ("URI".to_string(), server.address().to_string()),
    ])
}
