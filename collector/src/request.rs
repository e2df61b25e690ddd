//! Batched Jolokia read requests.

use crate::{
    metric::MetricDefinition,
    server::ServerDescriptor,
};
use eyre::{
    eyre,
    Context as _,
    Result,
};
use serde::Serialize;
use std::sync::Arc;
use url::Url;

/// One `read` operation inside a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReadRequest {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub mbean: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl ReadRequest {
    /// `path` is only sent together with a non-empty `attribute`.
    pub fn new(metric: &MetricDefinition) -> Self {
        let attribute = (!metric.attribute.is_empty()).then(|| metric.attribute.clone());
        let path = attribute
            .as_ref()
            .and((!metric.path.is_empty()).then(|| metric.path.clone()));
        Self {
            kind: "read",
            mbean: metric.mbean.clone(),
            attribute,
            path,
        }
    }
}

/// All reads for one server, in the order of its routed metrics. The response array is
/// matched back to the metrics by position.
#[derive(Debug, Clone)]
pub struct BatchRequest {
    url: Url,
    reads: Vec<ReadRequest>,
    metrics: Vec<Arc<MetricDefinition>>,
}

impl BatchRequest {
    /// Targets `http://<address><context>`, with the server's credentials as userinfo.
    pub fn new(server: &ServerDescriptor, context: &str, metrics: &[Arc<MetricDefinition>]) -> Result<Self> {
        let mut url = Url::parse(&format!("http://{}{}", server.address(), context))
            .wrap_err_with(|| format!("invalid url for address {:?} and context {context:?}", server.address()))?;
        if server.has_credentials() {
            url.set_username(server.user_name())
                .map_err(|_| eyre!("url cannot carry a username"))?;
            url.set_password(Some(server.password()))
                .map_err(|_| eyre!("url cannot carry a password"))?;
        }

        Ok(Self {
            url,
            reads: metrics.iter().map(|metric| ReadRequest::new(metric)).collect(),
            metrics: metrics.to_vec(),
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The url without credentials, safe to log and to put into errors.
    pub fn display_url(&self) -> String {
        let mut url = self.url.clone();
        let _ = url.set_username("");
        let _ = url.set_password(None);
        url.to_string()
    }

    pub fn reads(&self) -> &[ReadRequest] {
        &self.reads
    }

    pub fn metrics(&self) -> &[Arc<MetricDefinition>] {
        &self.metrics
    }

    pub fn len(&self) -> usize {
        self.reads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reads.is_empty()
    }

    /// The JSON array posted to the agent.
    pub fn body(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(&self.reads)
    }
}
