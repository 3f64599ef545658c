mod commands;

use clap::{Parser, Subcommand};
use croft_core::{App, AppConfig};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "croft")]
#[command(about = "Declare and deploy the Croft item service", long_about = None)]
struct Cli {
    /// Shared naming prefix for every declared resource
    #[arg(long, env = "CROFT_PREFIX", default_value = "croft", global = true)]
    prefix: String,

    /// AWS region to deploy into (falls back to the SDK's default chain)
    #[arg(long, env = "CROFT_REGION", global = true)]
    region: Option<String>,

    /// Project root holding packaged handlers, the frontend bundle and state
    #[arg(long, env = "CROFT_PROJECT_ROOT", default_value = ".", global = true)]
    project_root: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy all stacks in dependency order, or a single stack
    Up {
        /// Stack to deploy (database, api, frontend)
        stack: Option<String>,
    },
    /// Destroy deployed stacks in reverse order
    Down {
        /// Stack to destroy (database, api, frontend)
        stack: Option<String>,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Show planned actions without applying them
    Plan {
        /// Stack to plan (database, api, frontend)
        stack: Option<String>,
    },
    /// Print the synthesized stack manifests as JSON
    Synth,
    /// Show the recorded deployment state
    Status,
}

fn compose(cli: &Cli) -> anyhow::Result<App> {
    let config = AppConfig::new(cli.prefix.clone())?
        .with_lambda_artifact_dir(cli.project_root.join("target/lambda"))
        .with_frontend_asset_dir(cli.project_root.join("frontend/build"));
    Ok(App::compose(&config)?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let app = compose(&cli)?;

    match &cli.command {
        Commands::Up { stack } => {
            commands::up::handle(&app, &cli.region, &cli.project_root, stack.as_deref()).await
        }
        Commands::Down { stack, yes } => {
            commands::down::handle(&app, &cli.region, &cli.project_root, stack.as_deref(), *yes)
                .await
        }
        Commands::Plan { stack } => {
            commands::plan::handle(&app, &cli.region, &cli.project_root, stack.as_deref()).await
        }
        Commands::Synth => commands::synth::handle(&app),
        Commands::Status => commands::status::handle(&cli.project_root).await,
    }
}
