//! Exec sessions: run one command inside a service instance over a WebSocket.
//!
//! The client opens the socket with its bearer token, sends a single start
//! frame carrying the argv, then reads tagged JSON frames until the `exit`
//! frame arrives. Binary frames are raw stdout.

use crate::api::{PlatformError, PlatformResult};
use crate::types::{CommandResult, CommandStatus, ExecOutput, ExecRequest};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{header::AUTHORIZATION, HeaderValue};
use tokio_tungstenite::tungstenite::error::ProtocolError;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tracing::debug;

#[derive(Debug, Serialize)]
struct ExecStart {
    command: Vec<String>,
    tty: bool,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
enum ExecFrame {
    Stdout {
        data: String,
    },
    Stderr {
        data: String,
    },
    Exit {
        #[serde(rename = "exitCode")]
        exit_code: i32,
        #[serde(default)]
        status: Option<CommandStatus>,
        #[serde(default)]
        message: Option<String>,
    },
    Error {
        message: String,
    },
    #[serde(other)]
    Unknown,
}

/// Accumulates output frames in arrival order.
#[derive(Debug, Default)]
struct OutputCollector {
    stdout: String,
    stderr: String,
}

impl OutputCollector {
    /// Returns the command result once the exit frame is seen.
    fn apply(&mut self, frame: ExecFrame) -> PlatformResult<Option<CommandResult>> {
        match frame {
            ExecFrame::Stdout { data } => self.stdout.push_str(&data),
            ExecFrame::Stderr { data } => self.stderr.push_str(&data),
            ExecFrame::Exit {
                exit_code,
                status,
                message,
            } => {
                let status = status.unwrap_or(if exit_code == 0 {
                    CommandStatus::Success
                } else {
                    CommandStatus::Failure
                });
                return Ok(Some(CommandResult {
                    exit_code,
                    status,
                    message,
                }));
            }
            ExecFrame::Error { message } => {
                return Err(PlatformError::ExecProtocol { message });
            }
            ExecFrame::Unknown => debug!("Ignoring unrecognised exec frame"),
        }
        Ok(None)
    }

    fn finish(self, result: CommandResult) -> ExecOutput {
        ExecOutput {
            stdout: self.stdout,
            stderr: self.stderr,
            result,
        }
    }
}

pub async fn run_exec_session(
    url: &str,
    token: &str,
    request: &ExecRequest,
) -> PlatformResult<ExecOutput> {
    debug!("Opening exec session at {}", url);

    let mut ws_request = url.into_client_request()?;
    let auth = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|e| {
        PlatformError::InvalidConfig {
            message: format!("API token is not a valid header value: {}", e),
        }
    })?;
    ws_request.headers_mut().insert(AUTHORIZATION, auth);

    let (mut stream, _response) = connect_async(ws_request).await?;

    let start = ExecStart {
        command: request.argv(),
        tty: false,
    };
    stream
        .send(Message::Text(serde_json::to_string(&start)?))
        .await?;

    let mut collector = OutputCollector::default();

    while let Some(message) = stream.next().await {
        let message = match message {
            Ok(message) => message,
            Err(
                WsError::ConnectionClosed
                | WsError::AlreadyClosed
                | WsError::Protocol(ProtocolError::ResetWithoutClosingHandshake),
            ) => break,
            Err(e) => return Err(e.into()),
        };
        match message {
            Message::Text(text) => {
                let frame: ExecFrame = serde_json::from_str(&text)?;
                if let Some(result) = collector.apply(frame)? {
                    debug!("Exec session finished with exit code {}", result.exit_code);
                    let _ = stream.close(None).await;
                    return Ok(collector.finish(result));
                }
            }
            Message::Binary(bytes) => collector.stdout.push_str(&String::from_utf8_lossy(&bytes)),
            Message::Close(_) => break,
            _ => {}
        }
    }

    Err(PlatformError::ExecProtocol {
        message: "connection closed before the command exited".to_string(),
    })
}
