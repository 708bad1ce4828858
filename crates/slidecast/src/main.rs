mod analytics;
mod animation;
mod app;
mod cli;
mod color;
mod commands;
mod config;
mod deck;
mod navigation;
mod prefs;
mod render;
mod schedule;
mod session;
mod speech;
mod theme;
mod view;

use clap::Parser;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    // RUST_LOG wins over -v/-q
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(cli.log_level())),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    cli.run()
}
