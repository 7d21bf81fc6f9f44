//! Main entry point for the erpdesk CLI.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use dotenv::dotenv;
use shared::config::Config;
use std::path::PathBuf;
use url::Url;

mod commands;
mod logging;

/// erpdesk CLI
#[derive(Parser)]
#[command(name = "erpdesk")]
#[command(about = "Command-line client for the USD ERP ordering API", long_about = None)]
struct Cli {
    /// Path to the configuration file (optional)
    #[arg(
        long,
        short,
        global = true,
        help = "Path to the configuration file (e.g., config.yaml or config.json). If not provided, defaults will be used."
    )]
    config: Option<PathBuf>,

    /// Override the API base URL
    #[arg(
        long,
        global = true,
        help = "API base URL, e.g. https://api.usderp.uz/crm/api/. Overrides the config file and environment."
    )]
    base_url: Option<Url>,

    #[command(subcommand)]
    command: Commands,
}

/// Subcommands for the erpdesk CLI
#[derive(Subcommand)]
enum Commands {
    /// Sign in and store the session
    Login(commands::session::LoginArgs),

    /// Sign out and forget the stored session
    Logout,

    /// Show the stored session
    Whoami,

    /// Search the product catalogue
    #[command(subcommand)]
    Stock(commands::stock::StockCommand),

    /// Work with orders
    #[command(subcommand)]
    Orders(commands::orders::OrdersCommand),

    /// Show locations and suppliers
    #[command(subcommand)]
    Locations(commands::locations::LocationsCommand),

    /// Show or edit the signed-in user's profile
    #[command(subcommand)]
    Profile(commands::profile::ProfileCommand),

    /// Generate shell completion scripts for the CLI
    Completion {
        /// The shell type for which to generate the completion script (e.g., bash, zsh, fish, powershell)
        #[arg(
            long,
            short,
            value_enum,
            help = "The shell type for which to generate the completion script (e.g., bash, zsh, fish, powershell)"
        )]
        shell: Shell,
    },

    /// Generate a configuration file
    Config {
        /// Format of the configuration file to generate (yaml or json). Defaults to yaml.
        #[arg(
            long,
            short,
            help = "Format of the configuration file to generate (yaml or json). Defaults to yaml."
        )]
        format: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Commands::Completion { shell } => {
            commands::completion::generate_completion(shell);
            Ok(())
        }
        Commands::Config { format } => {
            let format = format.unwrap_or_else(|| "yaml".to_string());
            commands::config::generate_config(&format)
        }
        command => {
            let config = Config::load_config(cli.config, cli.base_url)?;
            logging::initialize_tracing(&config.logging);
            run(&config, command).await
        }
    }
}

async fn run(config: &Config, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Login(args) => commands::session::login(config, args).await,
        Commands::Logout => commands::session::logout(config).await,
        Commands::Whoami => commands::session::whoami(config),
        Commands::Stock(command) => commands::stock::run(config, command).await,
        Commands::Orders(command) => commands::orders::run(config, command).await,
        Commands::Locations(command) => commands::locations::run(config, command).await,
        Commands::Profile(command) => commands::profile::run(config, command).await,
        Commands::Completion { .. } | Commands::Config { .. } => Ok(()),
    }
}
