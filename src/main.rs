use clap::Parser;
use color_eyre::Result;
use jolokia_gatherer::{
    init_errors,
    init_logging,
    App,
    Args,
};
use jolokia_gatherer_config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    if args.sample_config {
        print!("{}", Config::sample());
        return Ok(());
    }

    init_errors()?;
    init_logging(args.verbose)?;
    App::new(&args)?.run().await
}
