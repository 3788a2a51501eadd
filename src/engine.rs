//! One live engine subprocess and the GTP exchange loop.
//!
//! A session is created for a single request and never shared: GTP is
//! strictly half-duplex, so a second command must not be written before
//! the previous response block (status line plus terminating blank line)
//! has been fully consumed. The child is spawned with `kill_on_drop`, so
//! the process is released on every exit path, including parse and
//! protocol failures mid-request.

use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::{debug, info};

use crate::board::{Board, Color};
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::gtp::{self, PositionAnalysis, Vertex};

pub struct EngineSession {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    command_timeout: Duration,
}

impl EngineSession {
    /// Validate the engine's files, spawn it, wait for it to settle, and
    /// confirm it answers the protocol. `playouts` caps the engine's
    /// search effort; resignation is disabled so `genmove` always answers
    /// with a vertex or a pass.
    pub async fn start(config: &EngineConfig, playouts: u32) -> EngineResult<Self> {
        config.validate()?;

        info!(
            "starting engine {} (maxPlayouts={playouts})",
            config.katago_path.display()
        );
        let mut child = Command::new(&config.katago_path)
            .arg("gtp")
            .arg("-config")
            .arg(&config.config_path)
            .arg("-model")
            .arg(&config.model_path)
            .arg("-override-config")
            .arg(format!("maxPlayouts={playouts},allowResignation=false"))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        tokio::time::sleep(config.startup_settle).await;
        if let Some(status) = child.try_wait()? {
            let mut diagnostics = String::new();
            if let Some(mut stderr) = child.stderr.take() {
                let _ = stderr.read_to_string(&mut diagnostics).await;
            }
            return Err(EngineError::Startup {
                message: format!(
                    "engine exited during startup ({status}): {}",
                    diagnostics.trim()
                ),
            });
        }

        // Keep the engine's stderr chatter out of the exchange path.
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!("engine stderr: {line}");
                }
            });
        }

        let stdin = child.stdin.take().ok_or_else(|| EngineError::Startup {
            message: "engine stdin was not captured".to_string(),
        })?;
        let stdout = child.stdout.take().ok_or_else(|| EngineError::Startup {
            message: "engine stdout was not captured".to_string(),
        })?;

        let mut session = Self {
            child,
            stdin,
            stdout: BufReader::new(stdout),
            command_timeout: config.command_timeout,
        };

        match session.send_command("version").await {
            Ok(version) => info!("engine ready, version {version}"),
            Err(err) => {
                return Err(EngineError::Startup {
                    message: format!("engine failed the version handshake: {err}"),
                })
            }
        }

        Ok(session)
    }

    /// Send one GTP command and return its response payload. The caller
    /// blocks until the engine terminates the response block, up to the
    /// configured deadline.
    pub async fn send_command(&mut self, command: &str) -> EngineResult<String> {
        debug!("engine <- {command}");
        self.stdin.write_all(command.as_bytes()).await?;
        self.stdin.write_all(b"\n").await?;
        self.stdin.flush().await?;

        let seconds = self.command_timeout.as_secs();
        let response = tokio::time::timeout(self.command_timeout, read_response(&mut self.stdout))
            .await
            .map_err(|_| EngineError::Timeout { seconds })??;
        debug!("engine -> {response}");
        Ok(response)
    }

    /// Re-issue every stone on the board as a `play` command, row-major.
    pub async fn replay_board(&mut self, board: &Board) -> EngineResult<()> {
        for (row, col, color) in board.stones() {
            let command = format!("play {} {}", color.gtp_name(), gtp::to_gtp(row, col));
            self.send_command(&command).await?;
        }
        Ok(())
    }

    /// Ask the engine for the next move for `color`.
    pub async fn generate_move(&mut self, color: Color) -> EngineResult<Vertex> {
        let raw = self
            .send_command(&format!("genmove {}", color.gtp_name()))
            .await?;
        gtp::parse_vertex(&raw)
    }

    /// Ask the engine's raw network to evaluate the current position.
    pub async fn evaluate_position(&mut self) -> EngineResult<PositionAnalysis> {
        let raw = self.send_command("kata-raw-nn all").await?;
        gtp::parse_raw_nn(&raw)
    }

    /// Ask the engine to exit and give it a moment to comply. Best-effort:
    /// dropping the session kills the process in any case.
    pub async fn shutdown(mut self) {
        let _ = self.stdin.write_all(b"quit\n").await;
        let _ = self.stdin.flush().await;
        let _ = tokio::time::timeout(Duration::from_millis(500), self.child.wait()).await;
    }
}

/// Read one GTP response block. Lines before the status marker are
/// skipped; a `?` line fails the exchange; the `=` line starts the
/// payload, which runs until the terminating blank line. The blank line
/// is consumed, the payload's line structure is preserved.
async fn read_response<R: AsyncBufRead + Unpin>(reader: &mut R) -> EngineResult<String> {
    let mut payload = String::new();
    loop {
        let line = next_line(reader).await?;
        let line = line.trim_end();
        if let Some(rest) = line.strip_prefix('=') {
            payload.push_str(rest.strip_prefix(' ').unwrap_or(rest));
            break;
        }
        if line.starts_with('?') {
            return Err(EngineError::Protocol {
                message: line.to_string(),
            });
        }
    }
    loop {
        let line = next_line(reader).await?;
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        payload.push('\n');
        payload.push_str(line);
    }
    Ok(payload.trim().to_string())
}

async fn next_line<R: AsyncBufRead + Unpin>(reader: &mut R) -> EngineResult<String> {
    let mut line = String::new();
    if reader.read_line(&mut line).await? == 0 {
        return Err(EngineError::Protocol {
            message: "engine closed its output stream".to_string(),
        });
    }
    Ok(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn read(input: &str) -> EngineResult<String> {
        let mut reader = BufReader::new(input.as_bytes());
        read_response(&mut reader).await
    }

    #[tokio::test]
    async fn test_success_payload_is_returned() {
        assert_eq!(read("= D4\n\n").await.unwrap(), "D4");
    }

    #[tokio::test]
    async fn test_bare_success_marker_is_empty_payload() {
        assert_eq!(read("=\n\n").await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_failure_line_is_a_protocol_error() {
        let err = read("? illegal move\n").await.unwrap_err();
        match err {
            EngineError::Protocol { message } => assert_eq!(message, "? illegal move"),
            other => panic!("expected protocol error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_multi_line_block_keeps_line_structure() {
        let block = "= \nwhiteWin 0.3\nscoreLead -2.5\n\n";
        assert_eq!(
            read(block).await.unwrap(),
            "whiteWin 0.3\nscoreLead -2.5"
        );
    }

    #[tokio::test]
    async fn test_chatter_before_the_marker_is_skipped() {
        assert_eq!(read("loading model\n= D4\n\n").await.unwrap(), "D4");
    }

    #[tokio::test]
    async fn test_eof_mid_block_is_a_protocol_error() {
        assert!(matches!(
            read("= D4\n").await.unwrap_err(),
            EngineError::Protocol { .. }
        ));
        assert!(matches!(
            read("").await.unwrap_err(),
            EngineError::Protocol { .. }
        ));
    }
}
