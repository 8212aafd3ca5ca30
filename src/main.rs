//! shopcmp - compare products across e-commerce stores

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use shopcmp::cli::{Cli, Commands, ConfigCommands};
use shopcmp::error::Result;

mod commands;
mod utils;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("{} {}", "Error:".red(), e);
        if let Some(hint) = e.hint() {
            eprintln!("\n{}", hint.dimmed());
        }
        std::process::exit(1);
    }
}

/// Log to stderr so JSON output on stdout stays clean
fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("shopcmp={}", default_level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Search {
            query,
            source,
            timeout,
            no_history,
            rank,
        } => commands::cmd_search(&query, source, timeout, no_history, &rank),

        Commands::Rank { query, input, rank } => commands::cmd_rank(&query, &input, &rank),

        Commands::History {
            limit,
            top,
            clear,
            yes,
            json,
        } => {
            if clear {
                commands::cmd_history_clear(yes)
            } else {
                commands::cmd_history(limit, top, json)
            }
        }

        Commands::Config(ConfigCommands::Show { json }) => commands::cmd_config_show(json),
        Commands::Config(ConfigCommands::Path) => commands::cmd_config_path(),
        Commands::Config(ConfigCommands::SetWeights {
            price,
            rating,
            reviews,
            relevance,
        }) => commands::cmd_config_set_weights(price, rating, reviews, relevance),
        Commands::Config(ConfigCommands::SetSources { sources }) => {
            commands::cmd_config_set_sources(sources)
        }
        Commands::Config(ConfigCommands::Reset { yes }) => commands::cmd_config_reset(yes),

        Commands::Completions { shell } => commands::cmd_completions(shell),
    }
}
