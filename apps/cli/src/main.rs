//! `azure-secrets` binary

use std::process::ExitCode;

use azsecrets_resource::{ConnectionFactory, TdsConnector};
use clap::Parser;
use tracing::error;

/// Run the Users table demo against Azure SQL with Always Encrypted columns.
///
/// Reads AZURE_TENANT_ID, AZURE_CLIENT_ID, AZURE_CLIENT_SECRET and
/// DB_CONNECTION_STRING from the environment. Log output goes to stderr and
/// is controlled by AZSECRETS_LOG / RUST_LOG and AZSECRETS_LOG_FORMAT.
#[derive(Parser, Debug)]
#[command(name = "azure-secrets", version, about, long_about)]
struct Cli {}

#[tokio::main]
async fn main() -> ExitCode {
    let _cli = Cli::parse();

    let _guard = match azsecrets_log::auto_init() {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("azure-secrets: logging disabled: {e}");
            None
        }
    };

    let factory = ConnectionFactory::new(TdsConnector::new());
    let mut stdout = std::io::stdout();

    match azsecrets_cli::demo::run(&factory, &mut stdout).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
