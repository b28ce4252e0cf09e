use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use filelist::config::resolve_config;
use filelist::logging::init_tracing;
use filelist::mcp::{self, default_method_table, HttpState, StdioExit, StdioServer};

/// File catalog server speaking JSON-RPC.
#[derive(Parser)]
#[command(name = "filelist", about = "File catalog server speaking JSON-RPC over stdio or HTTP")]
struct Cli {
    /// Path to a JSON config file (default: <config dir>/filelist/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Enable debug logging (ignored when RUST_LOG is set)
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve newline-delimited JSON-RPC on stdin/stdout
    Stdio,
    /// Serve JSON-RPC over HTTP POST at /mcp
    Http {
        /// Interface to bind (default: localhost)
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on (default: 8080)
        #[arg(long)]
        port: Option<u16>,
    },
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
    let table = Arc::new(default_method_table());

    match cli.command {
        Commands::Stdio => {
            let exit = StdioServer::new(table).run().await?;
            if exit == StdioExit::ExitRequested {
                // Exit right away: a pending stdin read would otherwise hold
                // up runtime shutdown.
                process::exit(0);
            }
        }
        Commands::Http { host, port } => {
            let addr = format!(
                "{}:{}",
                host.unwrap_or(config.host),
                port.unwrap_or(config.http_port)
            );
            mcp::http::run(&addr, HttpState::new(table)).await?;
        }
    }
    Ok(())
}
