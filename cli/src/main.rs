//! Nodemend CLI - Repair NotReady Kubernetes worker nodes

use clap::Parser;

use nodemend::cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = cli.run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
