use crate::OutputFormat;
use clap::Parser;
use std::path::PathBuf;

/// Poll Jolokia agents and emit JMX attributes as metric records.
#[derive(Parser, Debug, Clone, Default)]
#[command(author, version = version(), about, long_about = None)]
pub struct Args {
    /// Configuration file to load instead of `<config dir>/config.yaml`.
    #[clap(long, short, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Override the Jolokia context root (must start and end with `/`).
    #[clap(long, value_name = "PATH")]
    pub context: Option<String>,

    /// Override the delimiter used to join nested attribute keys.
    #[clap(long, value_name = "DELIMITER")]
    pub delimiter: Option<String>,

    /// Override the collection interval, e.g. `10s` or `1m`.
    #[clap(long, value_name = "DURATION")]
    pub interval: Option<String>,

    /// Override the record output format.
    #[clap(long, value_enum, value_name = "FORMAT")]
    pub output: Option<OutputFormat>,

    /// Run a single collection cycle and exit.
    #[clap(long, action)]
    pub once: bool,

    /// Print an annotated sample configuration and exit.
    #[clap(long = "sample-config", action)]
    pub sample_config: bool,

    /// Enables debug logging.
    #[clap(long, short, action)]
    pub verbose: bool,
}

mod config_ext {
    use super::*;
    use config::{
        Map,
        Source,
        Value,
    };
    use std::collections::HashMap;

    impl Source for Args {
        fn clone_into_box(&self) -> Box<dyn Source + Send + Sync> {
            Box::new((*self).clone())
        }

        fn collect(&self) -> Result<Map<String, Value>, config::ConfigError> {
            let mut cache = HashMap::<String, Value>::new();
            if let Some(context) = &self.context {
                cache.insert("context".to_string(), context.clone().into());
            }
            if let Some(delimiter) = &self.delimiter {
                cache.insert("delimiter".to_string(), delimiter.clone().into());
            }
            if let Some(interval) = &self.interval {
                cache.insert("interval".to_string(), interval.clone().into());
            }
            if let Some(output) = &self.output {
                cache.insert("output".to_string(), output.to_string().into());
            }
            Ok(cache)
        }
    }
}

pub fn version() -> String {
    let config_dir_path = crate::get_config_dir().display().to_string();

    format!(
        "{}

Config directory: {config_dir_path}",
        clap::crate_version!()
    )
}
