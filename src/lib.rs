#[macro_use]
extern crate tracing;

mod app;
pub mod logging;
pub mod sink;

pub use app::App;
use color_eyre::Result;
pub use jolokia_gatherer_config::Args;
pub use logging::init_logging;

pub fn init_errors() -> Result<()> {
    color_eyre::install()?;
    #[cfg(debug_assertions)]
    better_panic::Settings::auto()
        .most_recent_first(false)
        .lineno_suffix(true)
        .install();
    Ok(())
}
