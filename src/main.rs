//! meshcore-sync CLI entry point

use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use meshcore_enum_sync::cli::{Cli, Commands};
use meshcore_enum_sync::commands::{run_extract, run_inspect, run_sync, CommandContext};
use meshcore_enum_sync::config::SyncConfig;

fn main() -> ExitCode {
    match run() {
        Ok(output) => {
            print!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            e.exit_code()
        }
    }
}

fn run() -> meshcore_enum_sync::Result<String> {
    let cli = Cli::parse_args();
    let config = SyncConfig::load(cli.config.as_deref())?;

    init_tracing(if cli.verbose {
        "debug"
    } else {
        config.logging.level.as_str()
    });

    let ctx = CommandContext::new(cli.format, cli.verbose, config);
    match &cli.command {
        Commands::Sync(args) => run_sync(args, &ctx),
        Commands::Extract(args) => run_extract(args, &ctx),
        Commands::Inspect(args) => run_inspect(args, &ctx),
    }
}

/// Logs go to stderr so stdout stays clean for JSON output
fn init_tracing(level: &str) {
    let mut filter = EnvFilter::from_default_env();
    if std::env::var_os("RUST_LOG").is_none() {
        if let Ok(directive) = format!("meshcore_enum_sync={}", level).parse() {
            filter = filter.add_directive(directive);
        }
    }

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
