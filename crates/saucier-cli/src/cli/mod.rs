//! CLI entry and dispatch.

use anyhow::{Context, Result};
use clap::Parser;
use saucier_core::Partition;

mod commands;
mod logging;

#[derive(Parser)]
#[command(name = "saucier")]
#[command(version)]
#[command(about = "Browse saucier recipes stored in CloudKit")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// List recipes of a partition
    Recipes {
        /// Partition to show (private or public)
        #[arg(long, value_name = "DATABASE")]
        database: Option<Partition>,

        /// Only show recipes whose name contains this text
        #[arg(long)]
        search: Option<String>,

        /// Page to show (20 recipes per page)
        #[arg(long, default_value_t = 1)]
        page: usize,
    },

    /// Boot the app at a location (deep links, sign-in redirects)
    Open {
        /// Full location URL
        #[arg(value_name = "URL")]
        url: String,
    },

    /// Show one recipe with its ingredients and steps
    Show {
        /// Record name of the recipe
        #[arg(value_name = "RECIPE_ID")]
        id: String,

        /// Partition the recipe lives in
        #[arg(long, value_name = "DATABASE", default_value = "public")]
        database: Partition,
    },

    /// Sign in with the external identity provider
    Login,

    /// Forget the session token
    Logout,

    /// Show whether a session is stored
    Status,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = logging::init();

    // The app core is single-threaded and event driven.
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("create tokio runtime")?;

    rt.block_on(dispatch(cli))
}

async fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Recipes {
            database,
            search,
            page,
        } => {
            commands::recipes::run(commands::recipes::RecipesOptions {
                database,
                search: search.as_deref(),
                page,
            })
            .await
        }
        Commands::Open { url } => commands::open::run(&url).await,
        Commands::Show { id, database } => commands::open::show(&id, database).await,
        Commands::Login => commands::auth::login().await,
        Commands::Logout => commands::auth::logout(),
        Commands::Status => commands::auth::status(),
        Commands::Config { command } => match command {
            ConfigCommands::Path => {
                commands::config::path();
                Ok(())
            }
            ConfigCommands::Init => commands::config::init(),
        },
    }
}
