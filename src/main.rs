use clap::Parser;
use gekko_signals::cli::{self, Cli};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    // RUST_LOG, then [logging] filter, then the crate default
    let fallback =
        cli::config_log_filter(&cli.config).unwrap_or_else(|| cli::DEFAULT_LOG_FILTER.to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback.into());

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    cli::run(cli)
}
