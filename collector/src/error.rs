//! Error taxonomy of a collection cycle.
//!
//! Nothing here is fatal: every error is handed to the [`Accumulator`](crate::Accumulator)
//! and the cycle continues with the next server or metric.

use serde_json::Value;

/// Any problem reported while building the routing table or running a cycle.
#[derive(Debug, thiserror::Error)]
pub enum GatherError {
    /// A server or metric entry is malformed and was dropped.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The batch request for a server could not be built; the server is skipped this cycle.
    #[error("unable to create request for {server}: {reason}")]
    Request { server: String, reason: String },

    /// Connection failure or timeout; the server is skipped this cycle.
    #[error("error performing request to {server}: {error}")]
    Transport { server: String, error: eyre::Report },

    /// The server answered with something that is not a usable batch response.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A sub-response reported a failure; only that metric is skipped.
    #[error(transparent)]
    RemoteStatus(#[from] RemoteStatusError),

    /// A successful sub-response without a `value` key.
    #[error("missing key 'value' in response from {server} (mbean=\"{mbean}\" attribute=\"{attribute}\")")]
    MissingValue {
        server: String,
        mbean: String,
        attribute: String,
    },
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("server [{server}] is not of the form HostName:AppName@Host:Port, skipping")]
    MissingAddress { server: String },

    #[error("server [{server}]: identity [{identity}] is not HostName:AppName, skipping")]
    Identity { server: String, identity: String },

    #[error("server [{server}]: address [{address}] is not Host:Port, skipping")]
    Address { server: String, address: String },

    #[error("server [{server}] is configured more than once, skipping")]
    DuplicateServer { server: String },

    #[error("metric [{metric}]: {reason}, skipping")]
    Metric { metric: String, reason: String },

    #[error("metric [{metric}]: scope entry [{entry}] names neither host nor app, skipping")]
    Scope { metric: String, entry: String },
}

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("response from \"{url}\" has status code {status} ({reason}), expected 200 (OK)")]
    Status { url: String, status: u16, reason: String },

    #[error("error decoding JSON response from {server}: {error}: {body}")]
    Decode {
        server: String,
        error: serde_json::Error,
        body: String,
    },

    #[error("did not receive the correct number of metrics in response from {server}. expected {expected}, received {received}")]
    Count {
        server: String,
        expected: usize,
        received: usize,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum RemoteStatusError {
    #[error("missing status in response body from {server} (mbean=\"{mbean}\" attribute=\"{attribute}\")")]
    Missing {
        server: String,
        mbean: String,
        attribute: String,
    },

    #[error("not expected status value in response body ({server} mbean=\"{mbean}\" attribute=\"{attribute}\"): {status}")]
    Unexpected {
        server: String,
        mbean: String,
        attribute: String,
        status: Value,
    },
}

impl GatherError {
    /// Short category name, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            GatherError::Config(_) => "config",
            GatherError::Request { .. } => "request",
            GatherError::Transport { .. } => "transport",
            GatherError::Protocol(_) => "protocol",
            GatherError::RemoteStatus(_) => "remote_status",
            GatherError::MissingValue { .. } => "data",
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn status_error_names_the_code() {
        let err = GatherError::from(ProtocolError::Status {
            url: "http://127.0.0.1:7016/jolokia/".to_string(),
            status: 404,
            reason: "Not Found".to_string(),
        });
        assert_eq!(err.kind(), "protocol");
        assert!(err.to_string().contains("has status code 404 (Not Found)"));
    }

    #[test]
    fn remote_status_renders_numeric_status() {
        let err = GatherError::from(RemoteStatusError::Unexpected {
            server: "127.0.0.1:7016".to_string(),
            mbean: "java.lang:type=Memory".to_string(),
            attribute: "HeapMemoryUsage".to_string(),
            status: serde_json::json!(500),
        });
        let message = err.to_string();
        assert!(message.contains("mbean=\"java.lang:type=Memory\""));
        assert!(message.contains("attribute=\"HeapMemoryUsage\""));
        assert!(message.ends_with(": 500"));
    }
}
