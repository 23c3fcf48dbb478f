//! osc - OpenShift-style control-plane CLI
//!
//! Thin front end over `osc-core`: negotiates API versions with the server
//! and exposes resources, logs, exec and a few platform operations.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod cli;
mod commands;
mod config;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing; stdout is reserved for command output
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive("osc=info".parse()?))
        .init();

    let cli = Cli::parse();

    // Load configuration, then let flags win
    let mut config = config::Config::load()?;
    config.apply_args(&cli.global);
    let json = cli.global.json;

    // Execute command
    match cli.command {
        Commands::Versions => commands::versions::execute(&config, json).await,
        Commands::Get { kind, name } => commands::resource::get(&kind, &name, &config, json).await,
        Commands::List { kind } => commands::resource::list(&kind, &config, json).await,
        Commands::Exec(cmd) => commands::exec::execute(cmd, &config).await,
        Commands::Logs { pod, container } => {
            commands::logs::execute(&pod, container.as_deref(), &config).await
        }
        Commands::Scale {
            kind,
            name,
            replicas,
        } => commands::scale::execute(&kind, &name, replicas, &config, json).await,
        Commands::CancelBuild { name } => commands::build::cancel(&name, &config, json).await,
        Commands::NewProject {
            name,
            display_name,
            description,
        } => {
            commands::project::create(
                &name,
                display_name.as_deref(),
                description.as_deref(),
                &config,
                json,
            )
            .await
        }
        Commands::Config { save } => commands::settings::execute(save, &config, json),
    }
}
