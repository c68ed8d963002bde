use anyhow::Context;
use clap::{Parser, Subcommand};
use shelf_kernel::settings::Settings;

/// Operate the shelf book catalogue service
#[derive(Debug, Parser)]
#[command(name = "shelfctl", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP service until interrupted
    Serve,
    /// Check that the configured database answers within the connect timeout
    PingDb,
    /// Print the effective configuration as JSON (the password is omitted)
    ShowConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load().with_context(|| "failed to load shelf settings")?;

    match cli.command {
        Command::Serve => {
            shelf_telemetry::init(&settings.telemetry)?;
            tracing::info!(
                environment = ?settings.environment,
                bind_address = %settings.server.bind_address(),
                "starting shelf service"
            );
            shelf_app::run(settings).await
        }
        Command::PingDb => {
            shelf_telemetry::init(&settings.telemetry)?;
            shelf_app::check_database(&settings).await?;
            tracing::info!(
                host = %settings.database.host,
                port = settings.database.port,
                "database answered readiness probe"
            );
            println!("database is reachable");
            Ok(())
        }
        Command::ShowConfig => {
            let rendered = serde_json::to_string_pretty(&settings)
                .with_context(|| "failed to render settings")?;
            println!("{}", rendered);
            Ok(())
        }
    }
}
