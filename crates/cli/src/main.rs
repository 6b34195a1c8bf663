use anyhow::Context;
use clap::{Parser, Subcommand};

/// Operate the library book service
#[derive(Debug, Parser)]
#[command(name = "library-cli", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Apply migrations, then serve the HTTP API until interrupted
    Serve,
    /// Apply pending migrations and exit
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = library_kernel::settings::Settings::load()
        .with_context(|| "failed to load library settings")?;
    library_telemetry::init(&settings.telemetry)?;

    match cli.command {
        Command::Serve => library_app::app::serve(&settings).await,
        Command::Migrate => {
            let applied = library_app::app::migrate(&settings).await?;
            println!("applied {applied} migration(s)");
            Ok(())
        }
    }
}
