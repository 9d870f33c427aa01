use std::path::{Path, PathBuf};
use std::time::Duration;

use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;
use tracing::debug;

use crate::config::{MPV_PROBE_TIMEOUT, MPV_RESPONSE_TIMEOUT};
use crate::error::ExecutorError;
use crate::gesture::ActionCommand;
use crate::player::PlayerExecutor;

/// 通过 MPV 的 JSON IPC 套接字控制播放
///
/// MPV 需要以 `mpv --input-ipc-server=/tmp/mpv-socket` 启动。
/// 每条命令单独建立一次连接，发送一行 JSON，读取一行响应后丢弃。
#[derive(Debug, Clone)]
pub struct MpvIpcExecutor {
    socket_path: PathBuf,
}

impl MpvIpcExecutor {
    pub fn new(socket_path: impl Into<PathBuf>) -> Self {
        Self {
            socket_path: socket_path.into(),
        }
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }
}

/// 生成 MPV IPC 的命令体 `{"command": [...]}`
pub fn command_payload(command: &ActionCommand) -> Value {
    let args = match command {
        ActionCommand::Play => json!(["set_property", "pause", false]),
        ActionCommand::Pause => json!(["set_property", "pause", true]),
        ActionCommand::Stop => json!(["stop"]),
        ActionCommand::Seek(seconds) => json!(["seek", seconds.to_string()]),
        ActionCommand::Volume(percent) => json!(["add", "volume", percent.to_string()]),
    };
    json!({ "command": args })
}

impl PlayerExecutor for MpvIpcExecutor {
    fn name(&self) -> &'static str {
        "mpv-ipc"
    }

    async fn execute(&mut self, command: &ActionCommand) -> Result<(), ExecutorError> {
        let stream = UnixStream::connect(&self.socket_path).await?;
        let mut line = serde_json::to_vec(&command_payload(command))?;
        line.push(b'\n');

        let mut reader = BufReader::new(stream);
        reader.get_mut().write_all(&line).await?;

        // 读掉响应，避免 MPV 端出现 broken pipe；内容不影响结果
        let mut response = String::new();
        match tokio::time::timeout(MPV_RESPONSE_TIMEOUT, reader.read_line(&mut response)).await {
            Ok(Ok(_)) => debug!(response = response.trim(), "mpv 响应"),
            Ok(Err(e)) => debug!("读取 mpv 响应失败: {}", e),
            Err(_) => debug!("mpv 未在 {:?} 内响应", MPV_RESPONSE_TIMEOUT),
        }
        Ok(())
    }

    async fn probe(&mut self) -> bool {
        probe_socket(&self.socket_path, MPV_PROBE_TIMEOUT).await
    }
}

async fn probe_socket(path: &Path, timeout: Duration) -> bool {
    matches!(
        tokio::time::timeout(timeout, UnixStream::connect(path)).await,
        Ok(Ok(_))
    )
}
