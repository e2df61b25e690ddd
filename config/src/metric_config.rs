use serde::{
    Deserialize,
    Serialize,
};
use std::collections::BTreeMap;

/// A metric entry as written in the configuration file.
///
/// Validation happens when the collector turns it into a metric definition, so a bad entry
/// only drops that entry instead of failing the whole load.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MetricConfig {
    /// Measurement name of the emitted record.
    pub name: String,
    pub mbean: String,
    #[serde(default)]
    pub attribute: String,
    #[serde(default)]
    pub path: String,
    /// `HostName[@AppName]` filters. Empty means every server.
    #[serde(default, alias = "server_scope", skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
}
