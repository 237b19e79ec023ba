//! MCP client over a child process's stdio.
//!
//! [`McpClient`] owns the server process and runs a single background reader
//! task that is the only consumer of the server's stdout. Requests register a
//! oneshot sender under their numeric id before being written; the reader
//! resolves it when the matching response line arrives. When stdout closes
//! every outstanding request fails with [`McpError::TransportClosed`].

use std::collections::HashMap;
use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::{Mutex, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use super::error::{METHOD_NOT_FOUND, McpError, Result};
use super::protocol::{
    CallToolParams, CallToolResult, InitializeParams, JsonRpcNotification, JsonRpcRequest,
    JsonRpcResponse, JsonRpcResponseOut, ListToolsResult, McpTool,
};
use super::transport::{MessageKind, classify_message, is_candidate_frame};

/// Default per-request deadline for JSON-RPC calls
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

type PendingMap = Arc<std::sync::Mutex<HashMap<u64, oneshot::Sender<Result<Value>>>>>;
type SharedWriter = Arc<Mutex<Box<dyn AsyncWrite + Send + Unpin>>>;

/// How to launch an MCP server process
#[derive(Debug, Clone)]
pub struct McpServerConfig {
    /// Provider id, e.g. `mcp:coingecko`
    pub name: String,
    pub command: String,
    pub args: Vec<String>,
    /// Extra environment for the child
    pub env: Vec<(String, String)>,
    pub request_timeout: Duration,
}

impl McpServerConfig {
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            args: Vec::new(),
            env: Vec::new(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Arguments safe to log: header values are masked.
    pub fn redacted_args(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(self.args.len());
        let mut after_header = false;
        for arg in &self.args {
            if after_header {
                let name = arg.split(':').next().unwrap_or_default().trim();
                out.push(format!("{name}: ***"));
            } else {
                out.push(arg.clone());
            }
            after_header = arg == "--header";
        }
        out
    }
}

/// A connected, initialized MCP session
pub struct McpClient {
    id: String,
    writer: SharedWriter,
    pending: PendingMap,
    closed: Arc<AtomicBool>,
    next_id: AtomicU64,
    request_timeout: Duration,
    child: std::sync::Mutex<Option<Child>>,
    reader_handle: JoinHandle<()>,
}

impl McpClient {
    /// Spawn the server process and complete the `initialize` handshake.
    pub async fn spawn(config: &McpServerConfig) -> Result<Self> {
        info!(
            provider = %config.name,
            command = %config.command,
            args = ?config.redacted_args(),
            "Starting MCP server"
        );

        let mut cmd = Command::new(&config.command);
        cmd.args(&config.args)
            .envs(config.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn()?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| McpError::SpawnError(std::io::Error::other("Failed to capture stdin")))?;
        let stdout = child.stdout.take().ok_or_else(|| {
            McpError::SpawnError(std::io::Error::other("Failed to capture stdout"))
        })?;

        if let Some(stderr) = child.stderr.take() {
            let provider = config.name.clone();
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!(provider = %provider, "server stderr: {}", line.trim_end());
                }
            });
        }

        Self::connect(
            config.name.clone(),
            stdout,
            stdin,
            Some(child),
            config.request_timeout,
        )
        .await
    }

    /// Run the handshake over an already-open byte stream pair.
    ///
    /// `child`, when given, is killed on shutdown or drop.
    pub async fn connect<R, W>(
        id: impl Into<String>,
        reader: R,
        writer: W,
        child: Option<Child>,
        request_timeout: Duration,
    ) -> Result<Self>
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let writer: SharedWriter = Arc::new(Mutex::new(Box::new(writer)));
        let pending: PendingMap = Arc::new(std::sync::Mutex::new(HashMap::new()));
        let closed = Arc::new(AtomicBool::new(false));

        let reader_handle = tokio::spawn(reader_loop(
            reader,
            Arc::clone(&pending),
            Arc::clone(&closed),
            Arc::clone(&writer),
        ));

        let client = Self {
            id: id.into(),
            writer,
            pending,
            closed,
            next_id: AtomicU64::new(1),
            request_timeout,
            child: std::sync::Mutex::new(child),
            reader_handle,
        };

        // On failure `client` drops here and the child is killed.
        client.initialize().await?;
        Ok(client)
    }

    /// Provider id this client was created with.
    pub fn id(&self) -> &str {
        &self.id
    }

    async fn initialize(&self) -> Result<()> {
        let params = serde_json::to_value(InitializeParams::default())?;
        let result = self.request("initialize", Some(params)).await?;

        let server = result
            .pointer("/serverInfo/name")
            .and_then(Value::as_str)
            .unwrap_or("unknown");
        let protocol = result
            .get("protocolVersion")
            .and_then(Value::as_str)
            .unwrap_or("unknown");
        info!(provider = %self.id, server, protocol, "MCP session initialized");

        self.notify("notifications/initialized", None).await
    }

    /// Fetch every tool the server advertises, following pagination cursors.
    pub async fn list_tools(&self) -> Result<Vec<McpTool>> {
        let mut tools = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let params = cursor.as_ref().map(|c| json!({ "cursor": c }));
            let result = self.request("tools/list", params).await?;
            let page: ListToolsResult = serde_json::from_value(result)?;
            tools.extend(page.tools);

            match page.next_cursor {
                Some(next) if !next.is_empty() && cursor.as_deref() != Some(next.as_str()) => {
                    cursor = Some(next);
                }
                _ => break,
            }
        }

        debug!(provider = %self.id, count = tools.len(), "tools/list complete");
        Ok(tools)
    }

    /// Invoke one tool and return the raw MCP result.
    pub async fn invoke_tool(&self, name: &str, arguments: &Value) -> Result<CallToolResult> {
        let params = serde_json::to_value(CallToolParams { name, arguments })?;
        let result = self.request("tools/call", Some(params)).await?;
        Ok(serde_json::from_value(result)?)
    }

    /// Send a request and wait for its response.
    pub async fn request(&self, method: &str, params: Option<Value>) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let request = JsonRpcRequest::new(id, method, params);
        let (tx, rx) = oneshot::channel();

        lock_pending(&self.pending).insert(id, tx);
        // Removes the entry however this future ends, including when dropped.
        let _entry = PendingEntry {
            pending: &self.pending,
            id,
        };
        if self.closed.load(Ordering::SeqCst) {
            return Err(McpError::TransportClosed);
        }

        write_frame(&self.writer, &request).await?;

        match tokio::time::timeout(self.request_timeout, rx).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_)) => Err(McpError::TransportClosed),
            Err(_) => {
                warn!(provider = %self.id, method, id, "MCP request timed out");
                Err(McpError::Timeout(method.to_string()))
            }
        }
    }

    /// Send a notification (no response expected).
    pub async fn notify(&self, method: &str, params: Option<Value>) -> Result<()> {
        write_frame(&self.writer, &JsonRpcNotification::new(method, params)).await
    }

    /// Close stdin, kill the server and fail anything still pending.
    pub async fn shutdown(&self) {
        {
            let mut writer = self.writer.lock().await;
            if let Err(e) = writer.shutdown().await {
                trace!("MCP stdin close failed: {}", e);
            }
        }

        let child = self
            .child
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(mut child) = child {
            debug!(provider = %self.id, "Killing MCP server process");
            if let Err(e) = child.kill().await {
                warn!(provider = %self.id, "Failed to kill MCP server: {}", e);
            }
        }

        self.reader_handle.abort();
        self.closed.store(true, Ordering::SeqCst);
        fail_all_pending(&self.pending);
        info!(provider = %self.id, "MCP client shut down");
    }
}

impl Drop for McpClient {
    fn drop(&mut self) {
        self.reader_handle.abort();
        let child = self.child.get_mut().unwrap_or_else(|e| e.into_inner());
        if let Some(child) = child.as_mut() {
            debug!("McpClient dropping, killing server process");
            let _ = child.start_kill();
        }
    }
}

async fn write_frame<T: Serialize>(writer: &SharedWriter, message: &T) -> Result<()> {
    let mut line = serde_json::to_string(message)?;
    trace!("MCP send: {}", line);
    line.push('\n');

    let mut writer = writer.lock().await;
    writer.write_all(line.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

fn lock_pending(
    pending: &PendingMap,
) -> std::sync::MutexGuard<'_, HashMap<u64, oneshot::Sender<Result<Value>>>> {
    pending.lock().unwrap_or_else(|e| e.into_inner())
}

/// Pending-map slot owned by one in-flight request.
struct PendingEntry<'a> {
    pending: &'a PendingMap,
    id: u64,
}

impl Drop for PendingEntry<'_> {
    fn drop(&mut self) {
        lock_pending(self.pending).remove(&self.id);
    }
}

fn fail_all_pending(pending: &PendingMap) {
    let drained: Vec<_> = lock_pending(pending).drain().collect();
    if !drained.is_empty() {
        debug!(count = drained.len(), "Failing pending MCP requests");
    }
    for (_, tx) in drained {
        let _ = tx.send(Err(McpError::TransportClosed));
    }
}

/// Background reader: sole consumer of the server's stdout.
///
/// - **Response** → resolves the pending oneshot for its id
/// - **IncomingRequest** `ping` → answered with an empty result; any other
///   method gets `-32601`
/// - **Notification** → logged and dropped
async fn reader_loop<R>(reader: R, pending: PendingMap, closed: Arc<AtomicBool>, writer: SharedWriter)
where
    R: AsyncRead + Send + Unpin + 'static,
{
    let mut lines = BufReader::new(reader).lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                debug!("MCP server closed stdout");
                break;
            }
            Err(e) => {
                warn!("MCP reader: read error: {}", e);
                break;
            }
        };

        if !is_candidate_frame(&line) {
            trace!("MCP reader: skipping non-JSON line: {}", line.trim_end());
            continue;
        }

        let frame: Value = match serde_json::from_str(line.trim()) {
            Ok(v) => v,
            Err(e) => {
                debug!("MCP reader: invalid JSON ({}): {}", e, line.trim_end());
                continue;
            }
        };
        trace!("MCP recv: {}", frame);

        match classify_message(&frame) {
            MessageKind::Response { id: Some(id) } => {
                let outcome = serde_json::from_value::<JsonRpcResponse>(frame)
                    .map_err(McpError::from)
                    .and_then(JsonRpcResponse::into_result);
                let sender = lock_pending(&pending).remove(&id);
                match sender {
                    Some(tx) => {
                        let _ = tx.send(outcome);
                    }
                    None => debug!("MCP reader: no pending request for id={}", id),
                }
            }
            MessageKind::Response { id: None } => {
                debug!("MCP reader: response with unusable id: {}", frame);
            }
            MessageKind::IncomingRequest { id, method } => {
                let reply = if method == "ping" {
                    JsonRpcResponseOut::success(id, json!({}))
                } else {
                    debug!("MCP reader: rejecting server request '{}'", method);
                    JsonRpcResponseOut::error(
                        id,
                        METHOD_NOT_FOUND,
                        format!("Method not found: {method}"),
                    )
                };
                if let Err(e) = write_frame(&writer, &reply).await {
                    warn!("MCP reader: failed to answer '{}': {}", method, e);
                }
            }
            MessageKind::Notification => {
                let method = frame.get("method").and_then(Value::as_str).unwrap_or("?");
                trace!("MCP notification: {}", method);
            }
        }
    }

    closed.store(true, Ordering::SeqCst);
    fail_all_pending(&pending);
}
