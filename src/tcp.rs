//! Plain TCP front-end.
//!
//! One request per connection: the client writes `<target_dir>|<output_file>`,
//! the server does a single bounded read, runs the cataloger and answers
//! `SUCCESS` or `ERROR: <message>`, then closes. An empty request closes the
//! connection without a reply. This protocol has no envelope; it calls the
//! cataloger directly and reports its errors as text.

use std::net::SocketAddr;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, warn};

use crate::catalog::create_catalog_for;
use crate::errors::{CatalogError, Result};
use crate::types::CatalogRequest;

/// Reply for a catalog that was written.
pub const SUCCESS: &str = "SUCCESS";

/// Separates the two request fields.
pub const DELIMITER: char = '|';

/// Accepts connections and serves each on its own task.
pub struct TcpServer {
    listener: TcpListener,
    max_request_bytes: usize,
}

impl TcpServer {
    /// Binds `addr`. Fails if the address is unavailable.
    pub async fn bind(addr: &str, max_request_bytes: usize) -> Result<Self> {
        let listener = TcpListener::bind(addr).await.map_err(|e| CatalogError::Bind {
            addr: addr.to_string(),
            source: e,
        })?;
        Ok(Self {
            listener,
            max_request_bytes: max_request_bytes.max(1),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accepts connections forever. Slow clients never block the accept loop.
    pub async fn serve(self) -> Result<()> {
        info!("MCP server starting on {}", self.local_addr()?);

        loop {
            match self.listener.accept().await {
                Ok((stream, peer)) => {
                    let max = self.max_request_bytes;
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, peer, max).await {
                            error!(%peer, error = %e, "connection handler failed");
                        }
                    });
                }
                Err(e) => {
                    warn!(error = %e, "failed to accept TCP connection");
                }
            }
        }
    }
}

/// Serves one request on `stream` and closes it.
async fn handle_connection(
    mut stream: TcpStream,
    peer: SocketAddr,
    max_request_bytes: usize,
) -> Result<()> {
    let mut buf = vec![0u8; max_request_bytes];
    let n = stream.read(&mut buf).await?;

    let reply = match std::str::from_utf8(&buf[..n]) {
        Ok(text) => {
            let request = text.trim();
            if request.is_empty() {
                debug!(%peer, "empty request; closing connection");
                None
            } else {
                info!(%peer, request, "received request");
                Some(respond(request).await)
            }
        }
        Err(e) => {
            warn!(%peer, error = %e, "request is not valid UTF-8");
            Some(format!("ERROR: request is not valid UTF-8: {}", e))
        }
    };

    if let Some(reply) = reply {
        stream.write_all(reply.as_bytes()).await?;
    }
    stream.shutdown().await?;
    Ok(())
}

/// Produces the reply line for a non-empty request.
async fn respond(request: &str) -> String {
    let request = match parse_request(request) {
        Ok(r) => r,
        Err(e) => return error_line(&e),
    };

    match tokio::task::spawn_blocking(move || create_catalog_for(&request)).await {
        Ok(Ok(summary)) => {
            info!(
                target_dir = %summary.target_dir,
                output_file = %summary.output_file,
                "catalog created"
            );
            SUCCESS.to_string()
        }
        Ok(Err(e)) => {
            warn!(error = %e, "cataloging failed");
            error_line(&e)
        }
        Err(e) => format!("ERROR: An unexpected server error occurred: {}", e),
    }
}

/// Splits `<target_dir>|<output_file>`. Exactly one delimiter is accepted.
pub fn parse_request(text: &str) -> Result<CatalogRequest> {
    let mut parts = text.split(DELIMITER);
    match (parts.next(), parts.next(), parts.next()) {
        (Some(target_dir), Some(output_file), None) => {
            Ok(CatalogRequest::new(target_dir, output_file))
        }
        _ => Err(CatalogError::InvalidRequestFormat {
            message: "Expected 'target_dir|output_file'".to_string(),
        }),
    }
}

/// Renders an error as the `ERROR: ...` reply.
///
/// Failures caused by the request itself are reported plainly; anything
/// else is flagged as unexpected.
pub fn error_line(err: &CatalogError) -> String {
    if err.is_precondition() || matches!(err, CatalogError::InvalidRequestFormat { .. }) {
        format!("ERROR: {}", err)
    } else {
        format!("ERROR: An unexpected server error occurred: {}", err)
    }
}
