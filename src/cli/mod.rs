pub mod browse;
pub mod config;
pub mod list;
pub mod show;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use comfy_table::Cell;

use crate::client::FilingsClient;
use crate::error::Result;
use crate::fmt::{self, DeltaClass};
use crate::models::{Metric, TaxFiling};
use crate::settings::Settings;

#[derive(Parser)]
#[command(
    name = "filings",
    version,
    about = "Browse company tax filings from the terminal."
)]
pub struct Cli {
    /// Base URL of the filings API (overrides the saved setting)
    #[arg(long = "api-url", env = "FILINGS_API_URL", global = true)]
    pub api_url: Option<String>,
    /// Write debug-level logs
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Open the interactive dashboard (default).
    Browse {
        /// Start at a location, e.g. "/?page=3&q=acme" or "/companies/12-3456789"
        #[arg(long)]
        location: Option<String>,
        /// Reopen where the last session ended
        #[arg(long, conflicts_with = "location")]
        resume: bool,
    },
    /// Print one page of companies.
    List {
        /// Page number (1-based)
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        page: u32,
        /// Business name search text
        #[arg(long = "q", default_value = "")]
        q: String,
    },
    /// Print a company's filing history.
    Show {
        /// Company identifier (EIN)
        id: String,
    },
    /// Inspect or change settings.
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Print a shell completion script.
    Completions {
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective settings.
    Show,
    /// Save the API base URL.
    SetUrl {
        url: String,
    },
}

pub fn completions(shell: Shell) -> Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "filings", &mut std::io::stdout());
    Ok(())
}

pub(crate) fn runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?)
}

pub(crate) fn client(settings: &Settings) -> Result<FilingsClient> {
    FilingsClient::new(&settings.client_config()?)
}

/// Delta as "amount (percent)", coloured by the amount's direction.
pub(crate) fn delta_cell(filing: &TaxFiling, metric: Metric) -> Cell {
    let shown = fmt::delta(filing.delta(metric), metric.unit());
    if shown.percent_sign.is_none() {
        return Cell::new(shown.amount);
    }
    let text = format!("{} ({})", shown.amount, shown.percent);
    match shown.class {
        DeltaClass::Positive => Cell::new(text.green()),
        DeltaClass::Negative => Cell::new(text.red()),
        DeltaClass::Neutral | DeltaClass::Unknown => Cell::new(text),
    }
}
