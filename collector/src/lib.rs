//! # Jolokia Gatherer Collector
//!
//! Polls Jolokia agents over HTTP and turns the JMX attribute values they return into flat,
//! tagged metric records.
//!
//! ## Architecture
//!
//! - **`server`**: parses `HostName:AppName@Host:Port[@User[:Password]]` connection strings
//! - **`metric`**: validated metric definitions and their `HostName[@AppName]` scope
//! - **`routing`**: the routing table mapping every server to the metrics read from it
//! - **`request`**: one batched read request per server
//! - **`client`**: the HTTP transport (`JolokiaClient` trait, reqwest implementation)
//! - **`flatten`**: nested attribute values to delimiter-joined field names
//! - **`gatherer`**: the collection cycle tying the above together
//! - **`accumulator`**: the sink records and errors are reported to
//!
//! ## Failure handling
//!
//! Nothing is fatal. A malformed server or metric entry is dropped when the routing table is
//! built. A transport or protocol failure skips that server for one cycle. A failed
//! sub-response skips that metric for one cycle. Every error is reported to the
//! [`Accumulator`].

#[macro_use]
extern crate tracing;

pub mod accumulator;
pub mod client;
pub mod error;
pub mod flatten;
pub mod gatherer;
pub mod metric;
pub mod request;
pub mod routing;
pub mod server;

pub use accumulator::{
    Accumulator,
    MemoryAccumulator,
    Record,
    Tags,
};
pub use client::{
    HttpClient,
    JolokiaClient,
    RawResponse,
};
pub use error::GatherError;
pub use flatten::{
    FieldValue,
    Fields,
};
pub use gatherer::{
    CycleSummary,
    GatherSettings,
    Gatherer,
};
pub use metric::MetricDefinition;
pub use request::BatchRequest;
pub use routing::RoutingTable;
pub use server::ServerDescriptor;
