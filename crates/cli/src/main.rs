mod serve;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Promo coupon distribution and settlement service.
#[derive(Parser)]
#[command(name = "promod", version, about = "Promo coupon service")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP JSON API server
    Serve {
        /// Port to listen on
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
}

#[tokio::main]
async fn main() {
    // RUST_LOG controls verbosity; default to info for the service crates.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Serve { port } => {
            if let Err(err) = serve::start_server(port).await {
                eprintln!("Error: {err}");
                std::process::exit(1);
            }
        }
    }
}
