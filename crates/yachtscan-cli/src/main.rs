mod extract;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "yachtscan")]
#[command(about = "Extract and score yacht listings from brokerage pages")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Extract listings from a saved HTML document
    Parse {
        /// Path to the saved page
        #[arg(long)]
        file: PathBuf,
        /// Address the page was saved from; relative links resolve against it
        #[arg(long)]
        url: String,
        /// YAML file overriding the extraction settings
        #[arg(long)]
        config: Option<PathBuf>,
        /// Include the debug report in the output
        #[arg(long)]
        report: bool,
    },
    /// Fetch a page (and optional follow-up pages) and extract listings
    Fetch {
        url: String,
        /// Additional inventory or pagination pages to pool
        #[arg(long = "also")]
        also: Vec<String>,
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        report: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = yachtscan_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Parse {
            file,
            url,
            config: extraction_file,
            report,
        }) => extract::run_parse(&config, &file, &url, extraction_file.as_deref(), report)?,
        Some(Commands::Fetch {
            url,
            also,
            config: extraction_file,
            report,
        }) => {
            extract::run_fetch(&config, &url, &also, extraction_file.as_deref(), report).await?;
        }
        None => println!("yachtscan: run `yachtscan --help` for commands"),
    }

    Ok(())
}
