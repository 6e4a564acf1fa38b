use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "locality-score")]
#[command(about = "Lifestyle scores for city localities from OpenStreetMap infrastructure")]
pub struct Cli {
    #[arg(long, global = true, default_value = "locality.toml")]
    pub config: PathBuf,

    #[arg(long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Emit logs as JSON lines on stderr")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Subcommand)]
pub enum Command {
    /// List known areas
    Areas,

    /// Cached facility counts for an area
    Infrastructure {
        #[arg(long)]
        area: u64,

        #[arg(long, help = "Ignore the cache and query upstream")]
        refresh: bool,
    },

    /// Deduplicated facility positions for an area
    Locations {
        #[arg(long)]
        area: u64,
    },

    /// Score an area, optionally for a user profile
    Score {
        #[arg(long)]
        area: u64,

        #[arg(long)]
        user: Option<String>,
    },

    /// Score an arbitrary point without caching
    ScoreAt {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,

        #[arg(long, allow_negative_numbers = true)]
        lon: f64,

        #[arg(long, default_value_t = 2000, allow_negative_numbers = true)]
        radius: i64,

        #[arg(long)]
        user: Option<String>,
    },

    /// Score an area and add a short recommendation
    Recommend {
        #[arg(long)]
        area: u64,

        #[arg(long)]
        user: Option<String>,
    },

    /// Score every known area, best first
    ScoreAll {
        #[arg(long)]
        user: Option<String>,
    },
}
