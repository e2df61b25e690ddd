//! Where records and errors of a cycle go.

use crate::{
    error::GatherError,
    flatten::Fields,
};
use chrono::{
    DateTime,
    Utc,
};
use serde::Serialize;
use std::{
    collections::BTreeMap,
    sync::Mutex,
};

pub type Tags = BTreeMap<String, String>;

/// One emitted measurement: the flattened value of a metric definition on one server.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub measurement: String,
    pub tags: Tags,
    pub fields: Fields,
    pub timestamp: DateTime<Utc>,
}

/// Append-only sink for everything a cycle produces.
pub trait Accumulator: Send + Sync {
    fn add_fields(&self, record: Record);

    fn add_error(&self, error: GatherError);
}

/// Keeps everything in memory. Errors are kept as their kind and message.
#[derive(Debug, Default)]
pub struct MemoryAccumulator {
    records: Mutex<Vec<Record>>,
    errors: Mutex<Vec<(&'static str, String)>>,
}

impl MemoryAccumulator {
    pub fn records(&self) -> Vec<Record> {
        self.records.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().iter().map(|(_, message)| message.clone()).collect()
    }

    pub fn error_kinds(&self) -> Vec<&'static str> {
        self.errors.lock().unwrap().iter().map(|(kind, _)| *kind).collect()
    }

    /// Empties both lists, returning the records.
    pub fn drain(&self) -> Vec<Record> {
        self.errors.lock().unwrap().clear();
        std::mem::take(&mut *self.records.lock().unwrap())
    }
}

impl Accumulator for MemoryAccumulator {
    fn add_fields(&self, record: Record) {
        self.records.lock().unwrap().push(record);
    }

    fn add_error(&self, error: GatherError) {
        self.errors.lock().unwrap().push((error.kind(), error.to_string()));
    }
}
