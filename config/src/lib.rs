//! Configuration for the Jolokia gatherer.
//!
//! Sources are layered, later ones winning:
//!
//! 1. the embedded `default-config.yaml`
//! 2. `<config dir>/config.yaml`, or the file given with `--config`
//! 3. `JOLOKIA_GATHERER_*` environment variables
//! 4. command line overrides

#[macro_use]
extern crate tracing;

mod app_config;
mod args;
pub mod duration;
mod metric_config;
mod output_format;

use app_config::AppConfig;
pub use app_config::get_config_dir;
pub use args::Args;
use eyre::{
    bail,
    Result,
};
pub use metric_config::MetricConfig;
pub use output_format::OutputFormat;
use serde::{
    Deserialize,
    Serialize,
};
use std::time::Duration;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(flatten, skip_serializing)]
    app_config: AppConfig,
    /// Context root appended to every server address. Starts and ends with `/`.
    pub context: String,
    /// `HostName:AppName@IP:PORT[@USER[:PASSWORD]]` connection strings.
    #[serde(default)]
    pub servers: Vec<String>,
    #[serde(default)]
    pub metrics: Vec<MetricConfig>,
    pub delimiter: String,
    #[serde(with = "duration")]
    pub response_header_timeout: Duration,
    #[serde(with = "duration")]
    pub client_timeout: Duration,
    #[serde(with = "duration")]
    pub interval: Duration,
    #[serde(default)]
    pub output: OutputFormat,
}

const DEFAULT_CONFIG: &str = include_str!("default-config.yaml");
const SAMPLE_CONFIG: &str = include_str!("sample-config.yaml");

impl Default for Config {
    fn default() -> Self {
        serde_yml::from_str(DEFAULT_CONFIG).expect("Failed to parse default config")
    }
}

impl Config {
    pub fn new(args: &Args) -> Result<Self, config::ConfigError> {
        let config_dir = get_config_dir();
        let mut builder = config::Config::builder()
            .set_default("config_dir", config_dir.to_string_lossy().to_string())?
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Yaml));

        builder = match &args.config {
            Some(path) => builder.add_source(
                config::File::from(path.as_path())
                    .format(config::FileFormat::Yaml)
                    .required(true),
            ),
            None => builder.add_source(
                config::File::from(config_dir.join("config.yaml"))
                    .format(config::FileFormat::Yaml)
                    .required(false),
            ),
        };

        builder = builder
            .add_source(
                config::Environment::with_prefix(&app_config::PROJECT_NAME)
                    .prefix_separator("_")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("servers"),
            )
            .add_source(args.clone());

        let cfg: Self = builder.build()?.try_deserialize()?;
        debug!(
            servers = cfg.servers.len(),
            metrics = cfg.metrics.len(),
            context = %cfg.context,
            "configuration loaded"
        );

        Ok(cfg)
    }

    /// Annotated example configuration.
    pub fn sample() -> &'static str {
        SAMPLE_CONFIG
    }

    pub fn validate(&self) -> Result<()> {
        if !self.context.starts_with('/') || !self.context.ends_with('/') {
            bail!(
                "context root must start and end with '/', got {:?}",
                self.context
            );
        }
        if self.interval.is_zero() {
            bail!("interval must be greater than zero");
        }
        if self.servers.is_empty() {
            warn!("no servers configured, nothing will be collected");
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write as _;

    fn config_file(content: &str) -> temp_dir::TempDir {
        let dir = temp_dir::TempDir::new().unwrap();
        let mut file = std::fs::File::create(dir.path().join("config.yaml")).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        dir
    }

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.context, "/jolokia/");
        assert_eq!(config.delimiter, "_");
        assert_eq!(config.response_header_timeout, Duration::from_secs(3));
        assert_eq!(config.client_timeout, Duration::from_secs(4));
        assert_eq!(config.interval, Duration::from_secs(10));
        assert_eq!(config.output, OutputFormat::Json);
        assert!(config.servers.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn file_and_args_are_layered() {
        let dir = config_file(
            r#"
context: /gm/jolokia/
servers:
  - "ECS7:ydh@127.0.0.1:7016"
client_timeout: 10s
metrics:
  - name: heap
    mbean: "java.lang:type=Memory"
    attribute: HeapMemoryUsage
    servers: [ECS7]
    tags:
      team: core
"#,
        );
        let args = Args {
            config: Some(dir.path().join("config.yaml")),
            delimiter: Some(".".to_string()),
            output: Some(OutputFormat::Line),
            ..Default::default()
        };

        let config = Config::new(&args).unwrap();
        assert_eq!(config.context, "/gm/jolokia/");
        assert_eq!(config.servers, vec!["ECS7:ydh@127.0.0.1:7016".to_string()]);
        assert_eq!(config.client_timeout, Duration::from_secs(10));
        assert_eq!(config.response_header_timeout, Duration::from_secs(3));
        assert_eq!(config.delimiter, ".");
        assert_eq!(config.output, OutputFormat::Line);
        assert_eq!(
            config.metrics,
            vec![MetricConfig {
                name: "heap".to_string(),
                mbean: "java.lang:type=Memory".to_string(),
                attribute: "HeapMemoryUsage".to_string(),
                path: String::new(),
                servers: vec!["ECS7".to_string()],
                tags: [("team".to_string(), "core".to_string())].into(),
            }]
        );
    }

    #[test]
    fn missing_explicit_file_fails() {
        let args = Args {
            config: Some("/does/not/exist/config.yaml".into()),
            ..Default::default()
        };
        assert!(Config::new(&args).is_err());
    }

    #[test]
    fn context_root_must_be_slash_delimited() {
        let mut config = Config::default();
        config.context = "/jolokia".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("context root"));

        config.context = "jolokia/".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_interval_is_rejected() {
        let mut config = Config::default();
        config.interval = Duration::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn sample_config_parses() {
        let dir = config_file(Config::sample());
        let config = Config::new(&Args {
            config: Some(dir.path().join("config.yaml")),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(config.servers.len(), 2);
        assert_eq!(config.metrics.len(), 4);
        assert_eq!(config.metrics[1].servers, vec!["web01".to_string()]);
        assert_eq!(config.metrics[3].path, "used");
        assert!(config.validate().is_ok());
    }
}
