//! CLI entry point for the greedy photomosaic builder

use clap::Parser;
use greedymosaic::io::cli::{Cli, MosaicCommand};
use greedymosaic::io::configuration::DEFAULT_LOG_FILTER;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> greedymosaic::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let cli = Cli::parse();
    let mut command = MosaicCommand::new(cli);
    command.process()?;
    Ok(())
}
