use std::time::Duration;

use clap::{Args, Parser};

use crate::collectors::Platform;
use crate::harvest::HarvestOptions;

#[derive(Parser, Debug, Clone)]
#[command(name = "jobharvest", about = "Multi-source job listing harvester")]
pub struct Config {
    /// Emit logs as JSON lines
    #[arg(long, env = "LOG_JSON", global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(clap::Subcommand, Debug, Clone)]
pub enum Command {
    /// Start the web server (default when no subcommand given)
    Serve {
        /// Listen address
        #[arg(long, env = "LISTEN_ADDR", default_value = "0.0.0.0:8080")]
        listen_addr: String,

        /// Bearer token required on /api/v1 routes
        #[arg(long, env = "API_TOKEN")]
        api_token: Option<String>,

        #[command(flatten)]
        harvest: HarvestArgs,
    },
    /// Run one harvest and print the result as JSON
    Harvest {
        /// Search term, expanded into a search URL per platform
        #[arg(long, short)]
        query: Option<String>,

        /// Location, e.g. "Sydney, Australia"
        #[arg(long, short, default_value = "")]
        location: String,

        /// Platforms to search (default: all)
        #[arg(long = "platform", short)]
        platforms: Vec<Platform>,

        /// Explicit starting URLs, harvested before any search
        #[arg(long = "url")]
        urls: Vec<String>,

        /// Maximum number of records
        #[arg(long, short, default_value = "30")]
        budget: usize,

        #[command(flatten)]
        harvest: HarvestArgs,
    },
    /// Generate a random API token
    Token,
}

/// Tunables shared by every command that harvests.
#[derive(Args, Debug, Clone)]
pub struct HarvestArgs {
    /// Seconds to wait for a page to load
    #[arg(long, env = "LOAD_TIMEOUT_SECS", default_value = "30")]
    pub load_timeout_secs: u64,

    /// Delay before following a next-page link, in milliseconds
    #[arg(long, env = "PAGE_DELAY_MS", default_value = "1000")]
    pub page_delay_ms: u64,

    /// HTTP request timeout in seconds
    #[arg(long, env = "FETCH_TIMEOUT_SECS", default_value = "20")]
    pub fetch_timeout_secs: u64,

    /// Stop each source after this many pages
    #[arg(long, env = "MAX_PAGES")]
    pub max_pages: Option<u32>,

    /// Skip detail-page enrichment
    #[arg(long)]
    pub no_enrich: bool,
}

impl Default for HarvestArgs {
    fn default() -> Self {
        Self {
            load_timeout_secs: 30,
            page_delay_ms: 1000,
            fetch_timeout_secs: 20,
            max_pages: None,
            no_enrich: false,
        }
    }
}

impl HarvestArgs {
    /// Tunables from the environment, for when clap never parsed a
    /// subcommand. Unset or unparsable variables keep their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let read = |key: &str, default: u64| {
            lookup(key)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(default)
        };
        Self {
            load_timeout_secs: read("LOAD_TIMEOUT_SECS", defaults.load_timeout_secs),
            page_delay_ms: read("PAGE_DELAY_MS", defaults.page_delay_ms),
            fetch_timeout_secs: read("FETCH_TIMEOUT_SECS", defaults.fetch_timeout_secs),
            max_pages: lookup("MAX_PAGES").and_then(|v| v.trim().parse().ok()),
            no_enrich: defaults.no_enrich,
        }
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn to_options(&self) -> HarvestOptions {
        HarvestOptions {
            load_timeout: Duration::from_secs(self.load_timeout_secs),
            page_delay: Duration::from_millis(self.page_delay_ms),
            enrich: !self.no_enrich,
            max_pages: self.max_pages,
            ..HarvestOptions::default()
        }
    }
}

impl Config {
    /// Resolve the command, defaulting to Serve if none specified.
    pub fn resolved_command(&self) -> Command {
        self.command.clone().unwrap_or_else(|| Command::Serve {
            listen_addr: std::env::var("LISTEN_ADDR")
                .unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            api_token: std::env::var("API_TOKEN").ok(),
            harvest: HarvestArgs::from_env(),
        })
    }
}
