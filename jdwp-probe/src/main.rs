// JDWP probe - attach to or listen for a JVM and verify the JDWP handshake
//
// Prints a JSON report on stdout; logs go to stderr

use anyhow::Result;
use clap::Parser;
use tracing::info;

mod cli;
mod probe;

use cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    // Tracing to stderr only - stdout is reserved for the report
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("jdwp_probe=info".parse()?)
                .add_directive("jdwp_transport=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    info!("Starting JDWP probe...");

    let report = probe::run(cli).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
