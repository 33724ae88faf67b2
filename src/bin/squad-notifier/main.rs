use std::sync::Arc;

use anyhow::Result;
use squad_notifier::{
    Config, GitHub, Notifier, RunMode, Runner, SlackChannel, Trigger, parse_args, run_server,
    spawn_schedules,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Loads configuration; clap errors, including help and version output,
/// exit the process with clap's own status codes.
fn load_config() -> Result<(Config, RunMode)> {
    parse_args(std::env::args()).map_err(|err| match err.downcast::<clap::Error>() {
        Ok(clap_err) => clap_err.exit(),
        Err(err) => err,
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,octocrab=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let (config, mode) = load_config()?;

    let config = Arc::new(config);
    let forge = GitHub::from_config(&config)?;
    let channel = SlackChannel::from_config(&config);
    let runner = Arc::new(Notifier::new(Arc::clone(&config), forge, channel));

    match mode {
        RunMode::Once => {
            runner.execute(&Trigger::Once).await?;
        }
        RunMode::Serve => {
            let schedules = spawn_schedules(Arc::clone(&runner), &config.schedules);
            run_server(runner, config.listen_addr, shutdown_signal()).await?;
            for schedule in schedules {
                schedule.abort();
            }
        }
    }

    Ok(())
}
