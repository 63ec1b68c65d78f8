pub mod types;
pub mod error;
pub mod config;
pub mod data;
pub mod scale;
pub mod svg;
pub mod topology;
pub mod projection;
pub mod basemap;
pub mod markers;
pub mod force;
pub mod dotmap;
pub mod symbolmap;
pub mod graph;
pub mod matrix;
pub mod piechart;
pub mod scatterplot;
pub mod timeline;
pub mod treechart;
pub mod chrome;
pub mod carousel;
pub mod page;
pub mod render;
pub mod server;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render every visualization into a static site
    Generate {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
    /// Serve the site with live symbol map, redraw and hover endpoints
    Serve {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Generate { config } => {
            info!("Generating site with config: {:?}", config);
            let app_config = config::AppConfig::load_from_file(config)?;

            render::generate_site(&app_config).await?;

            info!("Generation complete!");
        }
        Commands::Serve { config } => {
            info!("Serving site with config: {:?}", config);
            let app_config = config::AppConfig::load_from_file(config)?;

            let portfolio = data::load_portfolio(&app_config)?;
            // A failed fetch leaves both maps on their fallback text.
            let base_map = render::load_base_map(&app_config).await;

            server::start_server(app_config, portfolio, base_map).await?;
        }
    }

    Ok(())
}
