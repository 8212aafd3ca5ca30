//! Command implementations for the shopcmp CLI

mod config;
mod history;
mod misc;
mod search;

pub use config::*;
pub use history::*;
pub use misc::*;
pub use search::*;
