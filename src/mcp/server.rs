//! Stdio front-end: reads JSON-RPC frames from stdin, one per line, and
//! writes one response line per request to stdout.
//!
//! Strictly sequential. A request, including its filesystem work, is
//! finished before the next line is read.

use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info};

use crate::errors::{CatalogError, Result};

use super::dispatcher::{Dispatch, MethodTable};
use super::transport::{DecodeError, JsonRpcResponse};

/// Why the stdio loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StdioExit {
    /// Input reached end-of-stream.
    EndOfInput,
    /// An `exit` notification arrived.
    ExitRequested,
}

/// The stdio JSON-RPC server.
pub struct StdioServer {
    table: Arc<MethodTable>,
}

impl StdioServer {
    /// Creates a server dispatching through `table`.
    pub fn new(table: Arc<MethodTable>) -> Self {
        Self { table }
    }

    /// Runs on the process's stdin and stdout.
    pub async fn run(&self) -> Result<StdioExit> {
        let stdin = BufReader::new(tokio::io::stdin());
        let stdout = tokio::io::stdout();
        self.run_with(stdin, stdout).await
    }

    /// Runs on arbitrary streams until end of input or `exit`.
    ///
    /// Read and write failures end the loop with an error; malformed frames
    /// do not.
    pub async fn run_with<R, W>(&self, mut reader: R, mut writer: W) -> Result<StdioExit>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut buf = Vec::new();

        loop {
            buf.clear();
            let bytes_read = reader.read_until(b'\n', &mut buf).await?;
            if bytes_read == 0 {
                debug!("stdin closed");
                return Ok(StdioExit::EndOfInput);
            }

            let line = match std::str::from_utf8(&buf) {
                Ok(s) => s.trim().to_string(),
                Err(e) => {
                    let response =
                        DecodeError::Parse(format!("invalid UTF-8: {}", e)).into_response();
                    write_frame(&mut writer, &response).await?;
                    continue;
                }
            };
            if line.is_empty() {
                continue;
            }

            let table = Arc::clone(&self.table);
            let outcome = tokio::task::spawn_blocking(move || table.handle_line(&line))
                .await
                .map_err(|e| CatalogError::Unexpected {
                    message: format!("dispatch task failed: {}", e),
                })?;

            match outcome {
                Dispatch::Reply(response) => write_frame(&mut writer, &response).await?,
                Dispatch::Silent => {}
                Dispatch::Exit(reply) => {
                    if let Some(response) = reply {
                        write_frame(&mut writer, &response).await?;
                    }
                    info!("exit notification received");
                    return Ok(StdioExit::ExitRequested);
                }
            }
        }
    }
}

/// Writes one response as a single line and flushes it.
async fn write_frame<W>(writer: &mut W, response: &JsonRpcResponse) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut frame = serde_json::to_vec(response)?;
    frame.push(b'\n');
    writer.write_all(&frame).await?;
    writer.flush().await?;
    Ok(())
}
