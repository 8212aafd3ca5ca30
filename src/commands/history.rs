use colored::Colorize;

use shopcmp::error::{Result, ShopError};
use shopcmp::history::History;

use crate::utils::truncate_str;

/// Show recent or most frequent searches
pub fn cmd_history(limit: usize, top: bool, json: bool) -> Result<()> {
    let history = History::open()?;
    let entries = if top {
        history.top(limit)?
    } else {
        history.recent(limit)?
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("No searches recorded yet.");
        return Ok(());
    }

    let heading = if top { "Most searched:" } else { "Recent searches:" };
    println!("\n{}\n", heading.bold());
    for entry in entries {
        let times = if entry.search_count > 1 {
            format!("x{}", entry.search_count).cyan().to_string()
        } else {
            String::new()
        };
        println!(
            "  {} | {:<40} {:>4} results {}",
            entry.last_searched_at.format("%Y-%m-%d %H:%M"),
            truncate_str(&entry.query, 40),
            entry.results_count,
            times
        );
    }

    Ok(())
}

/// Delete the search history
pub fn cmd_history_clear(yes: bool) -> Result<()> {
    if !yes {
        let confirm = inquire::Confirm::new("Delete all search history?")
            .with_default(false)
            .prompt()
            .map_err(|e| ShopError::ConfigError(e.to_string()))?;

        if !confirm {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let history = History::open()?;
    let removed = history.clear()?;
    println!("Removed {} searches from history.", removed);
    Ok(())
}
