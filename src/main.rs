mod app;
mod browser;
mod cli;
mod client;
mod company;
mod error;
mod fmt;
mod location;
mod logging;
mod models;
mod pagination;
mod query;
mod settings;
mod tui;

use clap::Parser;

use cli::{Cli, Commands, ConfigCommands};

fn main() {
    let cli = Cli::parse();

    let mut settings = settings::load_settings();
    if let Some(url) = cli.api_url {
        settings.api_url = url;
    }
    if let Err(e) = logging::init(&settings.log_level, cli.verbose) {
        eprintln!("Warning: {e}");
    }

    let result = match cli.command {
        None => cli::browse::run(&settings, None, false),
        Some(Commands::Browse { location, resume }) => cli::browse::run(&settings, location, resume),
        Some(Commands::List { page, q }) => cli::list::run(&settings, page, q),
        Some(Commands::Show { id }) => cli::show::run(&settings, &id),
        Some(Commands::Config { command }) => match command {
            ConfigCommands::Show => cli::config::show(&settings),
            ConfigCommands::SetUrl { url } => cli::config::set_url(&url),
        },
        Some(Commands::Completions { shell }) => cli::completions(shell),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
