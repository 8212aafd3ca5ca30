use std::io::Read as _;
use std::path::Path;

use colored::Colorize;
use serde::Serialize;

use shopcmp::aggregate::{Aggregator, Outcome, SourceReport};
use shopcmp::cli::RankArgs;
use shopcmp::config::Config;
use shopcmp::error::Result;
use shopcmp::filter::ResultFilter;
use shopcmp::history::History;
use shopcmp::product::{
    retain_usable, ComparisonResult, RankedProduct, RawProduct, Source, WeightVector,
};
use shopcmp::sources::default_adapters;

use crate::utils::{format_price, parse_timeout, truncate_str};

/// JSON shape printed by `search --json` and `rank --json`
#[derive(Serialize)]
struct ComparisonOutput<'a> {
    query: &'a str,
    weights: WeightVector,
    #[serde(skip_serializing_if = "<[SourceReport]>::is_empty")]
    sources: &'a [SourceReport],
    #[serde(flatten)]
    result: &'a ComparisonResult,
}

/// Search stores and rank the combined results
pub fn cmd_search(
    query: &str,
    sources: Vec<Source>,
    timeout: Option<String>,
    no_history: bool,
    args: &RankArgs,
) -> Result<()> {
    let mut config = Config::load()?;

    if !sources.is_empty() {
        let mut selected = Vec::with_capacity(sources.len());
        for source in sources {
            if !selected.contains(&source) {
                selected.push(source);
            }
        }
        config.sources = selected;
    }

    let store_timeout = match timeout {
        Some(ref t) => parse_timeout(t)?,
        None => config.fetch.timeout(),
    };

    let weights = args.weights.unwrap_or(config.weights);
    let filter = merge_filter(&config.filters, args)?;
    if !args.json {
        warn_unnormalized(&weights);
    }

    let aggregator = Aggregator::new(default_adapters(&config, store_timeout), store_timeout);
    if !args.json {
        let names: Vec<&str> = aggregator
            .sources()
            .iter()
            .map(|s| s.display_name())
            .collect();
        eprintln!("Searching {} for '{}'...", names.join(", "), query);
    }

    let (result, gathered) = aggregator.search_and_compare(query, &weights)?;
    let result = filter.apply(result, query);

    if !no_history {
        // History is best effort; a broken database must not hide results
        match History::open().and_then(|h| h.record_result(query, &result)) {
            Ok(()) => {}
            Err(e) => tracing::warn!(error = %e, "could not record search history"),
        }
    }

    if args.json {
        let output = ComparisonOutput {
            query,
            weights,
            sources: &gathered.reports,
            result: &result,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    print_source_reports(&gathered.reports);
    print_result(&result, args.all);
    Ok(())
}

/// Rank records read from a JSON file or stdin
pub fn cmd_rank(query: &str, input: &Path, args: &RankArgs) -> Result<()> {
    let config = Config::load()?;
    let weights = args.weights.unwrap_or(config.weights);
    let filter = merge_filter(&config.filters, args)?;
    if !args.json {
        warn_unnormalized(&weights);
    }

    let content = if input == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(input)?
    };

    let mut records: Vec<RawProduct> = serde_json::from_str(&content)?;
    let dropped = retain_usable(&mut records);
    if dropped > 0 {
        tracing::warn!(dropped, "dropped malformed records");
    }

    let result = shopcmp::compare(query, &records, &weights)?;
    let result = filter.apply(result, query);

    if args.json {
        let output = ComparisonOutput {
            query,
            weights,
            sources: &[],
            result: &result,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    print_result(&result, args.all);
    Ok(())
}

/// Command-line filter options override the configured defaults
fn merge_filter(defaults: &ResultFilter, args: &RankArgs) -> Result<ResultFilter> {
    let filter = ResultFilter {
        min_price: args.min_price.or(defaults.min_price),
        max_price: args.max_price.or(defaults.max_price),
        min_rating: args.min_rating.unwrap_or(defaults.min_rating),
        sources: if args.only.is_empty() {
            defaults.sources.clone()
        } else {
            args.only.clone()
        },
    };
    filter.validate()?;
    Ok(filter)
}

fn warn_unnormalized(weights: &WeightVector) {
    if !weights.is_normalized() {
        eprintln!(
            "{}",
            format!(
                "Note: weights sum to {:.2}, scores will range up to {:.0}",
                weights.sum(),
                weights.sum() * 100.0
            )
            .yellow()
        );
    }
}

fn print_source_reports(reports: &[SourceReport]) {
    for report in reports {
        match &report.outcome {
            Outcome::Fetched(_) => {}
            Outcome::Failed(message) => eprintln!(
                "{} {} failed: {}",
                "!".yellow(),
                report.source.display_name(),
                truncate_str(message, 80).dimmed()
            ),
            Outcome::TimedOut => eprintln!(
                "{} {} timed out after {:.1}s",
                "!".yellow(),
                report.source.display_name(),
                report.elapsed.as_secs_f64()
            ),
        }
    }
}

fn print_result(result: &ComparisonResult, all: bool) {
    println!("\n{}\n", result.message.bold());
    if result.is_empty() || (result.top_results.is_empty() && !all) {
        return;
    }

    let shown = if all {
        &result.all_products
    } else {
        &result.top_results
    };

    for product in shown {
        print_product(product);
    }

    if !all && result.all_products.len() > result.top_results.len() {
        println!(
            "  {}",
            format!(
                "({} more, use --all to list everything)",
                result.all_products.len() - result.top_results.len()
            )
            .dimmed()
        );
    }

    if result.best_by_source.len() > 1 {
        println!("\n{}", "Best by store:".bold());
        for product in &result.best_by_source {
            println!(
                "  {:<9} #{:<3} {:>6.2}  {}",
                product.source.display_name(),
                product.rank,
                product.score,
                truncate_str(&product.title, 50)
            );
        }
    }
    println!();
}

fn print_product(product: &RankedProduct) {
    let price = if product.price_imputed {
        format!("~{}", format_price(product.price)).dimmed().to_string()
    } else {
        format_price(product.price)
    };

    println!(
        "{:>3}. {}  {}  {}  {}",
        product.rank,
        format!("{:>6.2}", product.score).green(),
        truncate_str(&product.title, 60).bold(),
        format!("[{}]", product.source.display_name()).cyan(),
        price
    );
    println!(
        "     {:.1}★ ({} reviews)  {}",
        product.rating,
        product.reviews,
        product.link.dimmed()
    );
}
