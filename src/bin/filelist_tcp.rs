use clap::Parser;
use std::path::PathBuf;
use std::process;

use filelist::config::resolve_config;
use filelist::logging::init_tracing;
use filelist::tcp::TcpServer;

/// A TCP server to create file catalogs.
#[derive(Parser)]
#[command(name = "filelist-tcp", about = "A TCP server to create file catalogs")]
struct Cli {
    /// The host address to bind the server to (default: localhost)
    #[arg(long)]
    host: Option<String>,
    /// The port number for the server to listen on (default: 10000)
    #[arg(long)]
    port: Option<u16>,
    /// Path to a JSON config file (default: <config dir>/filelist/config.json)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Enable debug logging (ignored when RUST_LOG is set)
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run(cli: Cli) -> filelist::errors::Result<()> {
    let config = resolve_config(cli.config.as_deref())?;
    let addr = format!(
        "{}:{}",
        cli.host.unwrap_or(config.host),
        cli.port.unwrap_or(config.tcp_port)
    );

    let server = TcpServer::bind(&addr, config.max_request_bytes).await?;
    server.serve().await
}
