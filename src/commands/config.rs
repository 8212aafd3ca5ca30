use colored::Colorize;

use shopcmp::config::Config;
use shopcmp::error::{Result, ShopError};
use shopcmp::product::{Source, WeightVector};

/// Print the effective configuration
pub fn cmd_config_show(json: bool) -> Result<()> {
    let config = Config::load()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    let sources: Vec<&str> = config.sources.iter().map(|s| s.as_str()).collect();

    println!("\n{}", "Ranking".bold());
    println!("  weights:      {}", config.weights);
    if !config.weights.is_normalized() {
        println!(
            "  {}",
            format!("weights sum to {:.2}; scores scale with the sum", config.weights.sum())
                .yellow()
        );
    }

    println!("\n{}", "Fetching".bold());
    println!("  sources:      {}", sources.join(", "));
    println!("  timeout:      {}s per store", config.fetch.timeout_secs);
    println!("  max results:  {} per store", config.fetch.max_results);
    println!(
        "  retries:      {} (backoff {}ms, Flipkart only)",
        config.fetch.retries, config.fetch.backoff_ms
    );

    println!("\n{}", "Filters".bold());
    if config.filters.is_empty() {
        println!("  {}", "(none)".dimmed());
    } else {
        if let Some(min) = config.filters.min_price {
            println!("  min price:    {:.2}", min);
        }
        if let Some(max) = config.filters.max_price {
            println!("  max price:    {:.2}", max);
        }
        if config.filters.min_rating > 0.0 {
            println!("  min rating:   {:.1}", config.filters.min_rating);
        }
        if !config.filters.sources.is_empty() {
            let only: Vec<&str> = config.filters.sources.iter().map(|s| s.as_str()).collect();
            println!("  only:         {}", only.join(", "));
        }
    }
    println!();

    Ok(())
}

/// Print the config file path
pub fn cmd_config_path() -> Result<()> {
    println!("{}", Config::config_path()?.display());
    Ok(())
}

/// Persist new default weights
pub fn cmd_config_set_weights(price: f64, rating: f64, reviews: f64, relevance: f64) -> Result<()> {
    let weights = WeightVector::new(price, rating, reviews, relevance)?;

    let mut config = Config::load()?;
    config.weights = weights;
    config.save()?;

    println!("Default weights set to {}", weights);
    if !weights.is_normalized() {
        println!(
            "{}",
            format!(
                "Note: weights sum to {:.2}, scores will range up to {:.0}",
                weights.sum(),
                weights.sum() * 100.0
            )
            .yellow()
        );
    }
    Ok(())
}

/// Persist the default store list
pub fn cmd_config_set_sources(sources: Vec<Source>) -> Result<()> {
    let mut config = Config::load()?;
    config.sources = sources;
    config.validate()?;
    config.save()?;

    let names: Vec<&str> = config.sources.iter().map(|s| s.as_str()).collect();
    println!("Default sources set to {}", names.join(", "));
    Ok(())
}

/// Restore the default configuration
pub fn cmd_config_reset(yes: bool) -> Result<()> {
    if !yes {
        let confirm = inquire::Confirm::new("Reset configuration to defaults?")
            .with_default(false)
            .prompt()
            .map_err(|e| ShopError::ConfigError(e.to_string()))?;

        if !confirm {
            println!("Cancelled.");
            return Ok(());
        }
    }

    Config::default().save()?;
    println!("Configuration reset to defaults.");
    Ok(())
}
