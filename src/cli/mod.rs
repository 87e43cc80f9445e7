pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::runner::DEFAULT_WORKERS;

#[derive(Parser)]
#[command(name = "pagefeed")]
#[command(about = "Publish public social-network pages as RSS feeds", long_about = None)]
pub struct Cli {
    /// Config file (default: ~/.config/pagefeed/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Number of pages scraped at the same time
    #[arg(short, long, default_value_t = DEFAULT_WORKERS, global = true)]
    pub workers: usize,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scrape every page in the accounts file and write its feed
    Run {
        /// JSON array of {"name", "url", "filename"} entries
        #[arg(default_value = "accounts.json")]
        accounts: PathBuf,
    },
    /// Write feeds from cached posts without scraping
    Render {
        #[arg(default_value = "accounts.json")]
        accounts: PathBuf,
    },
    /// Scrape one page and print its posts as JSON
    Scrape {
        /// Page name, stripped from the start of post text
        #[arg(short, long)]
        name: String,

        /// Page URL
        url: String,
    },
}
