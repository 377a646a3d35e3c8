//! Out-of-process tool servers speaking newline-delimited JSON.
//!
//! The backend spawns the configured command on first use and exchanges one
//! JSON object per line over its stdin/stdout:
//!
//! ```text
//! → {"id":7,"method":"tools/call","params":{"toolName":"scale","arguments":{..},"mode":"dry_run"}}
//! ← {"id":7,"result":{"content":[{"type":"text","value":".."}],"isError":false}}
//! ← {"id":8,"error":{"code":-32601,"message":"unknown tool"}}
//! ```
//!
//! `tools/list` answers `{"tools": [ToolDescriptor, ..]}`. Lines that are not
//! JSON, or that carry another id, are skipped. If the server exits, the
//! pending call fails with a transport error and the next call respawns it.

use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use steward_domain::{BackendError, ToolBackend, ToolDescriptor, ToolRequest, ToolResponse};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;
use tracing::{debug, info, trace, warn};

pub const METHOD_LIST: &str = "tools/list";
pub const METHOD_CALL: &str = "tools/call";

/// Error code a server uses for a tool it does not serve
pub const CODE_UNKNOWN_TOOL: i64 = -32601;

#[derive(Debug, Serialize)]
struct WireRequest<'a> {
    id: u64,
    method: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    params: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    id: Option<u64>,
    result: Option<serde_json::Value>,
    error: Option<WireError>,
}

#[derive(Debug, Deserialize)]
struct WireError {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct ToolList {
    #[serde(default)]
    tools: Vec<ToolDescriptor>,
}

struct Connection {
    child: Child,
    writer: BufWriter<ChildStdin>,
    reader: Lines<BufReader<ChildStdout>>,
}

/// A tool server running as a child process
pub struct ProcessBackend {
    id: String,
    program: String,
    args: Vec<String>,
    connection: Mutex<Option<Connection>>,
    next_id: AtomicU64,
}

impl ProcessBackend {
    pub fn new(name: &str, program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            id: format!("process:{}", name),
            program: program.into(),
            args,
            connection: Mutex::new(None),
            next_id: AtomicU64::new(1),
        }
    }

    fn spawn(&self) -> Result<Connection, BackendError> {
        info!(backend = %self.id, program = %self.program, "Starting tool server");
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                BackendError::NotAvailable(format!("failed to start '{}': {}", self.program, e))
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| BackendError::NotAvailable("tool server stdin unavailable".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| BackendError::NotAvailable("tool server stdout unavailable".into()))?;

        Ok(Connection {
            child,
            writer: BufWriter::new(stdin),
            reader: BufReader::new(stdout).lines(),
        })
    }

    /// Send one request and wait for the response with the same id
    async fn exchange(
        &self,
        method: &str,
        params: Option<serde_json::Value>,
    ) -> Result<serde_json::Value, BackendError> {
        let mut guard = self.connection.lock().await;
        if guard.is_none() {
            *guard = Some(self.spawn()?);
        }
        let Some(conn) = guard.as_mut() else {
            return Err(BackendError::NotAvailable(self.id.clone()));
        };

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let mut line = serde_json::to_string(&WireRequest { id, method, params })
            .map_err(|e| BackendError::Protocol(e.to_string()))?;
        line.push('\n');
        trace!(backend = %self.id, id, method, "Sending request");

        if let Err(e) = write_line(conn, &line).await {
            warn!(backend = %self.id, error = %e, "Tool server write failed");
            reset(&mut guard).await;
            return Err(BackendError::Transport(e.to_string()));
        }

        loop {
            let next = match conn.reader.next_line().await {
                Ok(Some(next)) => next,
                Ok(None) => {
                    warn!(backend = %self.id, "Tool server closed its output");
                    reset(&mut guard).await;
                    return Err(BackendError::Transport(format!(
                        "{} exited before answering {}",
                        self.id, method
                    )));
                }
                Err(e) => {
                    reset(&mut guard).await;
                    return Err(BackendError::Transport(e.to_string()));
                }
            };

            let response: WireResponse = match serde_json::from_str(&next) {
                Ok(response) => response,
                Err(_) => {
                    debug!(backend = %self.id, line = %next, "Skipping non-JSON line");
                    continue;
                }
            };
            if response.id != Some(id) {
                trace!(backend = %self.id, expected = id, got = ?response.id, "Skipping response");
                continue;
            }

            return match (response.result, response.error) {
                (_, Some(error)) if error.code == CODE_UNKNOWN_TOOL => {
                    Err(BackendError::UnknownTool(error.message))
                }
                (_, Some(error)) => Err(BackendError::Protocol(format!(
                    "{} (code {})",
                    error.message, error.code
                ))),
                (Some(result), None) => Ok(result),
                (None, None) => Err(BackendError::Protocol(format!(
                    "response {} has neither result nor error",
                    id
                ))),
            };
        }
    }
}

async fn write_line(conn: &mut Connection, line: &str) -> std::io::Result<()> {
    conn.writer.write_all(line.as_bytes()).await?;
    conn.writer.flush().await
}

async fn reset(slot: &mut Option<Connection>) {
    if let Some(mut conn) = slot.take() {
        let _ = conn.child.start_kill();
        let _ = conn.child.wait().await;
    }
}

#[async_trait]
impl ToolBackend for ProcessBackend {
    fn id(&self) -> &str {
        &self.id
    }

    async fn describe(&self) -> Result<Vec<ToolDescriptor>, BackendError> {
        let result = self
            .exchange(METHOD_LIST, None)
            .await
            .map_err(|e| BackendError::DiscoveryFailed(e.to_string()))?;
        let list: ToolList = serde_json::from_value(result)
            .map_err(|e| BackendError::DiscoveryFailed(format!("invalid tool list: {}", e)))?;
        debug!(backend = %self.id, tools = list.tools.len(), "Discovered tools");
        Ok(list.tools)
    }

    async fn invoke(&self, request: &ToolRequest) -> Result<ToolResponse, BackendError> {
        let params =
            serde_json::to_value(request).map_err(|e| BackendError::Protocol(e.to_string()))?;
        let result = self.exchange(METHOD_CALL, Some(params)).await?;
        serde_json::from_value(result)
            .map_err(|e| BackendError::Protocol(format!("invalid tool response: {}", e)))
    }
}
