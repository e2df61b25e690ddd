use crate::sink::WriterAccumulator;
use color_eyre::Result;
use jolokia_gatherer_collector::Gatherer;
use jolokia_gatherer_config::{
    Args,
    Config,
};
use std::time::Instant;
use tokio::time::{
    interval,
    MissedTickBehavior,
};

pub struct App {
    config: Config,
    once: bool,
    gatherer: Gatherer,
    sink: WriterAccumulator<std::io::Stdout>,
}

impl App {
    pub fn new(args: &Args) -> Result<Self> {
        let config = Config::new(args)?;
        config.validate()?;
        let gatherer = Gatherer::new(&config)?;
        let sink = WriterAccumulator::stdout(config.output);

        Ok(Self {
            config,
            once: args.once,
            gatherer,
            sink,
        })
    }

    pub async fn run(self) -> Result<()> {
        info!(
            servers = self.config.servers.len(),
            metrics = self.config.metrics.len(),
            interval = %humantime::format_duration(self.config.interval),
            output = %self.config.output,
            "starting jolokia gatherer"
        );

        if self.once {
            self.cycle().await;
            return Ok(());
        }

        let mut ticker = interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = ticker.tick() => self.cycle().await,
                signal = tokio::signal::ctrl_c() => {
                    signal?;
                    info!("received Ctrl-C, shutting down");
                    return Ok(());
                }
            }
        }
    }

    async fn cycle(&self) {
        let started = Instant::now();
        let summary = self.gatherer.gather(&self.sink).await;
        let errors = self.sink.take_error_count();
        info!(
            servers = summary.servers,
            records = summary.records,
            errors,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "collection cycle finished"
        );
    }
}
