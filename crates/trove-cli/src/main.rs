//! Trove CLI - Command-line interface for browsing data directories and their provenance.

use clap::Parser;
use trove_cli::commands;
use trove_cli::{Cli, Command, Config, Formatter};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Log to stderr; `RUST_LOG` overrides the default level.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> trove_cli::Result<()> {
    // Load config from the given path or the default location
    let config_path = match cli.config {
        Some(path) => path,
        None => Config::default_path()?,
    };
    let mut config = Config::load(&config_path)?;

    // Determine output format
    let format = cli
        .format
        .map(Into::into)
        .unwrap_or(config.settings.format);

    // Determine color setting
    let color_enabled = !cli.no_color && config.settings.color;

    let formatter = Formatter::new(format, color_enabled);

    match cli.command {
        Command::Ls(args) => commands::execute_ls(args, &config, &formatter),
        Command::Select(args) => commands::execute_select(args, &config, &formatter),
        Command::Latest(args) => commands::execute_latest(args, &config, &formatter),
        Command::Describe(args) => commands::execute_describe(args, &config, &formatter),
        Command::Show(args) => commands::execute_show(args, &config, &formatter),
        Command::Project(args) => commands::execute_project(args, &mut config, &config_path, &formatter),
    }
}
