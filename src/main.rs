mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

fn main() -> miette::Result<()> {
    match Cli::parse().command {
        Commands::Generate {
            template,
            config,
            data,
            output_dir,
            verbose,
        } => commands::generate::run(template, config, data, output_dir, verbose),
        Commands::Validate {
            template,
            config,
            data,
            verbose,
        } => commands::validate::run(template, config, data, verbose),
        Commands::Params { template } => commands::params::run(template),
        Commands::List { root } => commands::list::run(root),
    }
}

/// `RUST_LOG` wins; then `--verbose`, then the config's `logging.level`, then `warn`.
pub(crate) fn init_tracing(verbose: bool, config_level: Option<&str>) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let directive = if verbose {
            "debug"
        } else {
            config_level.unwrap_or("warn")
        };
        EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new("warn"))
    });

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
