//! CLI entry point - the composition root.
//!
//! Loads `.env`, initializes logging, bootstraps the router and dispatches
//! to a handler. Errors carrying a [`CliError`] set the exit code.

use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::Directive;

use gpurouter_cli::{Cli, CliConfig, CliError, Commands, bootstrap, handlers};

const VERBOSE_DIRECTIVES: [&str; 3] = [
    "gpurouter_core=debug",
    "gpurouter_runtime=debug",
    "gpurouter_cli=debug",
];

/// Raise this workspace's crates to `debug` on top of `base`.
fn verbose_filter(base: EnvFilter) -> EnvFilter {
    VERBOSE_DIRECTIVES
        .iter()
        .filter_map(|directive| directive.parse::<Directive>().ok())
        .fold(base, EnvFilter::add_directive)
}

fn init_tracing(verbose: bool) {
    let mut filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if verbose {
        filter = verbose_filter(filter);
    }
    // stdout carries results, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let config = CliConfig {
        home_url: cli.home_url,
        no_home: cli.no_home,
    };
    let ctx = bootstrap(&config)?;

    match command {
        Commands::Health => handlers::health::execute(&ctx).await?,
        Commands::Wake { wait } => handlers::wake::execute(&ctx, wait).await?,
        Commands::Stats => handlers::stats::execute(&ctx).await?,
        Commands::Watch { interval } => handlers::watch::execute(&ctx, interval).await?,
        Commands::Preprocess {
            image,
            num_nails,
            resolution,
        } => handlers::preprocess::execute(&ctx, &image, num_nails, resolution).await?,
        Commands::Generate {
            image,
            params,
            stream,
        } => handlers::generate::execute(&ctx, &image, &params, stream).await?,
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables before clap reads `env` defaults.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            let code = err.downcast_ref::<CliError>().map_or(1, CliError::exit_code);
            ExitCode::from(code)
        }
    }
}
