use std::env;
use std::io::{Read, Write};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::display::Display;

#[derive(Debug, Serialize, Deserialize)]
pub enum IpcCommand {
    /// Assign video files to displays, in display order.
    SelectAssets { paths: Vec<String> },
    Start,
    Stop,
    ToggleLoop,
    Displays,
    Status,
}

#[derive(Debug, Serialize, Deserialize)]
pub enum IpcResponse {
    Success { message: String },
    Error { message: String },
    Displays { displays: Vec<DisplaySummary> },
    Status {
        state: String,
        loop_enabled: bool,
        players: Vec<PlayerStatus>,
        last_pass: Option<PassSummary>,
    },
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DisplaySummary {
    pub index: usize,
    pub device_id: String,
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
}

impl From<&Display> for DisplaySummary {
    fn from(display: &Display) -> Self {
        Self {
            index: display.index,
            device_id: display.device_id.clone(),
            left: display.bounds.left,
            top: display.bounds.top,
            width: display.bounds.width(),
            height: display.bounds.height(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PlayerStatus {
    pub pid: u32,
    pub display_index: usize,
    pub asset: String,
    pub status: String,
    pub uptime_secs: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PassSummary {
    pub launched: usize,
    pub skipped: usize,
    pub failures: Vec<String>,
}

fn socket_path() -> PathBuf {
    let runtime_dir = env::var("XDG_RUNTIME_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let uid = rustix::process::getuid();
            PathBuf::from(format!("/run/user/{}", uid.as_raw()))
        });
    runtime_dir.join("vidspan.sock")
}

pub struct IpcClient {
    socket_path: PathBuf,
}

impl IpcClient {
    pub fn new() -> Self {
        Self {
            socket_path: socket_path(),
        }
    }

    pub fn send_command(&self, command: IpcCommand) -> Result<IpcResponse> {
        let mut stream = UnixStream::connect(&self.socket_path).with_context(|| {
            format!("Failed to connect to vidspan daemon at {:?}", self.socket_path)
        })?;

        let command_json =
            serde_json::to_string(&command).with_context(|| "Failed to serialize command")?;

        stream
            .write_all(command_json.as_bytes())
            .with_context(|| "Failed to send command to daemon")?;
        stream
            .shutdown(std::net::Shutdown::Write)
            .with_context(|| "Failed to shutdown write stream")?;

        let mut response = String::new();
        stream
            .read_to_string(&mut response)
            .with_context(|| "Failed to read response from daemon")?;

        let ipc_response: IpcResponse =
            serde_json::from_str(&response).with_context(|| "Failed to deserialize response")?;

        Ok(ipc_response)
    }
}

impl Default for IpcClient {
    fn default() -> Self {
        Self::new()
    }
}

pub struct IpcServer {
    socket_path: PathBuf,
}

impl IpcServer {
    pub fn new() -> Self {
        Self {
            socket_path: socket_path(),
        }
    }

    pub fn start<F>(&self, handler: F) -> Result<()>
    where
        F: Fn(IpcCommand) -> Result<IpcResponse> + Send + Clone + 'static,
    {
        // Remove a stale socket from a previous run
        if self.socket_path.exists() {
            std::fs::remove_file(&self.socket_path)
                .with_context(|| "Failed to remove existing socket")?;
        }

        if let Some(parent) = self.socket_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| "Failed to create socket directory")?;
        }

        let listener = UnixListener::bind(&self.socket_path)
            .with_context(|| format!("Failed to bind to socket {:?}", self.socket_path))?;

        log::info!("IPC server listening on {:?}", self.socket_path);

        for stream in listener.incoming() {
            match stream {
                Ok(stream) => {
                    let handler = handler.clone();
                    std::thread::spawn(move || {
                        if let Err(e) = Self::handle_connection(stream, &handler) {
                            log::error!("Error handling IPC connection: {}", e);
                        }
                    });
                }
                Err(e) => {
                    log::error!("Error accepting IPC connection: {}", e);
                }
            }
        }

        Ok(())
    }

    fn handle_connection<F>(mut stream: UnixStream, handler: &F) -> Result<()>
    where
        F: Fn(IpcCommand) -> Result<IpcResponse>,
    {
        let mut command_json = String::new();
        stream
            .read_to_string(&mut command_json)
            .with_context(|| "Failed to read command from client")?;

        let command: IpcCommand = serde_json::from_str(&command_json)
            .with_context(|| "Failed to deserialize command")?;

        let response = handler(command)
            .unwrap_or_else(|e| IpcResponse::Error { message: e.to_string() });

        let response_json =
            serde_json::to_string(&response).with_context(|| "Failed to serialize response")?;

        stream
            .write_all(response_json.as_bytes())
            .with_context(|| "Failed to send response to client")?;

        Ok(())
    }
}

impl Default for IpcServer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_round_trip() {
        let command = IpcCommand::SelectAssets {
            paths: vec!["/videos/a.mp4".to_string(), "".to_string()],
        };

        let json = serde_json::to_string(&command).unwrap();
        let decoded: IpcCommand = serde_json::from_str(&json).unwrap();

        match decoded {
            IpcCommand::SelectAssets { paths } => {
                assert_eq!(paths, vec!["/videos/a.mp4".to_string(), String::new()]);
            }
            other => panic!("Expected SelectAssets, got {:?}", other),
        }
    }

    #[test]
    fn test_status_response_round_trip() {
        let response = IpcResponse::Status {
            state: "staging".to_string(),
            loop_enabled: true,
            players: vec![PlayerStatus {
                pid: 4321,
                display_index: 1,
                asset: "/videos/b.mp4".to_string(),
                status: "running".to_string(),
                uptime_secs: 12,
            }],
            last_pass: Some(PassSummary {
                launched: 2,
                skipped: 1,
                failures: vec![],
            }),
        };

        let json = serde_json::to_string(&response).unwrap();
        let decoded: IpcResponse = serde_json::from_str(&json).unwrap();

        match decoded {
            IpcResponse::Status { state, loop_enabled, players, last_pass } => {
                assert_eq!(state, "staging");
                assert!(loop_enabled);
                assert_eq!(players.len(), 1);
                assert_eq!(players[0].pid, 4321);
                assert_eq!(last_pass.unwrap().skipped, 1);
            }
            other => panic!("Expected Status, got {:?}", other),
        }
    }
}
