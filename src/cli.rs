use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::product::{Source, WeightVector};

/// Shell types for completion generation
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
    Powershell,
}

#[derive(Parser)]
#[command(name = "shopcmp")]
#[command(author, version, about = "Compare products across e-commerce stores", long_about = None)]
#[command(after_help = r#"Examples:
  shopcmp search "black cocktail dress"                    Search every store and rank
  shopcmp search "iphone 15" --source amazon --source flipkart
  shopcmp search "running shoes" --weights 0.6,0.2,0.1,0.1 Favour cheaper listings
  shopcmp rank "desk lamp" --input listings.json           Rank records you already have
  shopcmp history                                          Recent searches

Weights are price,rating,reviews,relevance and should add up to 1.0.
"#)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Ranking and filtering options shared by `search` and `rank`
#[derive(Args, Debug, Clone, Default)]
pub struct RankArgs {
    /// Ranking weights as price,rating,reviews,relevance (e.g. 0.4,0.3,0.2,0.1)
    #[arg(long, short = 'w', value_parser = parse_weights)]
    pub weights: Option<WeightVector>,

    /// Minimum price
    #[arg(long)]
    pub min_price: Option<f64>,

    /// Maximum price
    #[arg(long)]
    pub max_price: Option<f64>,

    /// Minimum rating (0-5)
    #[arg(long)]
    pub min_rating: Option<f64>,

    /// Only keep results from these stores (repeatable; filters without re-ranking)
    #[arg(long, value_enum)]
    pub only: Vec<Source>,

    /// Show every ranked product instead of the top results
    #[arg(long, short = 'a')]
    pub all: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

fn parse_weights(s: &str) -> Result<WeightVector, String> {
    s.parse::<WeightVector>().map_err(|e| e.to_string())
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search the configured stores and rank the combined results
    #[command(after_help = r#"Examples:
  shopcmp search "black cocktail dress"
  shopcmp search "laptop stand" --max-price 2000 --min-rating 4
  shopcmp search "kurta" --source myntra --timeout 30s
  shopcmp search "headphones" --json | jq '.top_results[0]'
"#)]
    Search {
        /// What to search for
        #[arg(value_name = "QUERY")]
        query: String,

        /// Stores to search, in join order (repeatable; default from config)
        #[arg(long, short = 's', value_enum)]
        source: Vec<Source>,

        /// Per-store timeout (e.g. 10s, 1m)
        #[arg(long)]
        timeout: Option<String>,

        /// Do not record this search in the history
        #[arg(long)]
        no_history: bool,

        #[command(flatten)]
        rank: RankArgs,
    },

    /// Rank product records from a JSON file without fetching anything
    #[command(after_help = r#"Examples:
  shopcmp rank "desk lamp" --input listings.json
  cat listings.json | shopcmp rank "desk lamp" --input -

The input is a JSON array of records:
  [{"title": "...", "price": 499.0, "rating": 4.2, "reviews": 120,
    "link": "https://...", "source": "amazon"}]
"#)]
    Rank {
        /// Query the records are ranked against
        #[arg(value_name = "QUERY")]
        query: String,

        /// JSON file with product records ("-" for stdin)
        #[arg(long, short = 'i')]
        input: PathBuf,

        #[command(flatten)]
        rank: RankArgs,
    },

    /// Show or clear the search history
    #[command(after_help = r#"Examples:
  shopcmp history               Recent searches
  shopcmp history --top         Most searched queries
  shopcmp history --clear -y    Delete the history
"#)]
    History {
        /// Number of entries to show
        #[arg(short, long, default_value = "20")]
        limit: usize,

        /// Order by how often a query was searched
        #[arg(long)]
        top: bool,

        /// Delete all history
        #[arg(long, conflicts_with = "top")]
        clear: bool,

        /// Skip the confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage configuration
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Generate shell completions
    #[command(after_help = r#"Examples:
  shopcmp completions bash > ~/.local/share/bash-completion/completions/shopcmp
  shopcmp completions zsh > ~/.zfunc/_shopcmp
  shopcmp completions fish > ~/.config/fish/completions/shopcmp.fish
"#)]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: CompletionShell,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the config file path
    Path,

    /// Set the default ranking weights
    SetWeights {
        price: f64,
        rating: f64,
        reviews: f64,
        relevance: f64,
    },

    /// Set the stores searched by default, in join order
    SetSources {
        #[arg(value_enum, required = true)]
        sources: Vec<Source>,
    },

    /// Restore the default configuration
    Reset {
        /// Skip the confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_search() {
        let cli = Cli::try_parse_from([
            "shopcmp", "-vv", "search", "black dress", "-s", "amazon", "--source", "myntra",
            "--weights", "0.5,0.2,0.2,0.1", "--max-price", "3000",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Search { query, source, rank, .. } => {
                assert_eq!(query, "black dress");
                assert_eq!(source, vec![Source::Amazon, Source::Myntra]);
                assert_eq!(rank.weights.unwrap().price, 0.5);
                assert_eq!(rank.max_price, Some(3000.0));
            }
            _ => panic!("expected search"),
        }
    }

    #[test]
    fn test_parse_rank_only_filter() {
        let cli = Cli::try_parse_from([
            "shopcmp", "rank", "lamp", "--input", "-", "--only", "myntra", "--only", "amazon",
        ])
        .unwrap();

        match cli.command {
            Commands::Rank { rank, .. } => {
                assert_eq!(rank.only, vec![Source::Myntra, Source::Amazon]);
            }
            _ => panic!("expected rank"),
        }
    }

    #[test]
    fn test_bad_weights_rejected() {
        let parsed = Cli::try_parse_from(["shopcmp", "search", "x", "--weights", "1,-1,0,0"]);
        assert!(parsed.is_err());
    }
}
