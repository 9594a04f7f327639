mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use chefboard_core::ConsolidationMode;

#[derive(Parser)]
#[command(name = "chefboard")]
#[command(about = "Chefboard grocery list CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a grocery list for the recipes in a JSON file
    Grocery {
        /// JSON file holding an array of recipes
        #[arg(long)]
        recipes: PathBuf,
        /// What to produce
        #[arg(long, value_enum, default_value_t = Mode::Markdown)]
        mode: Mode,
        /// Print the full result as JSON instead of Markdown
        #[arg(long)]
        json: bool,
        /// Skip the consolidation service and build the list locally
        #[arg(long, env = "CHEFBOARD_OFFLINE")]
        offline: bool,
    },
    /// Normalize ingredient lines and print the result as JSON
    Normalize {
        /// Ingredient lines, e.g. "2 cups flour, sifted"
        #[arg(required = true)]
        lines: Vec<String>,
    },
    /// Print the prompt payload for the recipes in a JSON file
    Prompt {
        /// JSON file holding an array of recipes
        #[arg(long)]
        recipes: PathBuf,
        /// Include the system prompt for this mode
        #[arg(long, value_enum)]
        mode: Option<Mode>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    Markdown,
    PurchaseUnits,
}

impl From<Mode> for ConsolidationMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Markdown => ConsolidationMode::Markdown,
            Mode::PurchaseUnits => ConsolidationMode::PurchaseUnits,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Grocery {
            recipes,
            mode,
            json,
            offline,
        } => {
            commands::grocery(&recipes, mode.into(), json, offline).await?;
        }
        Commands::Normalize { lines } => {
            commands::normalize(&lines)?;
        }
        Commands::Prompt { recipes, mode } => {
            commands::prompt(&recipes, mode.map(Into::into))?;
        }
    }

    Ok(())
}
