//! 命令行工具调用和系统混音器

use std::io;
use std::process::Stdio;

use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::debug;

use crate::error::ExecutorError;

/// 运行一个外部工具，丢弃输出，只看退出码
///
/// future 被丢弃（例如超时）时子进程会被杀掉。
pub async fn run_tool(program: &str, args: &[String]) -> Result<(), ExecutorError> {
    debug!(program, ?args, "运行外部工具");
    let status = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .status()
        .await
        .map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ExecutorError::ToolMissing(program.to_string()),
            _ => ExecutorError::Unreachable(e),
        })?;

    if status.success() {
        Ok(())
    } else {
        Err(ExecutorError::Rejected {
            program: program.to_string(),
            code: status.code(),
        })
    }
}

/// 系统混音器
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mixer {
    /// PulseAudio `pactl`
    #[default]
    Pactl,
    /// ALSA `amixer`（走 pulse 设备）
    Amixer,
}

impl Mixer {
    /// 生成调整音量的命令行
    ///
    /// # 参数
    /// * `percent` - 相对调整量，正数增大，负数减小
    ///
    /// # 返回值
    /// 返回 (程序名, 参数列表)
    pub fn volume_args(&self, percent: i32) -> (&'static str, Vec<String>) {
        let magnitude = percent.unsigned_abs();
        let sign = if percent < 0 { '-' } else { '+' };
        match self {
            Mixer::Pactl => (
                "pactl",
                vec![
                    "set-sink-volume".to_string(),
                    "@DEFAULT_SINK@".to_string(),
                    format!("{sign}{magnitude}%"),
                ],
            ),
            Mixer::Amixer => (
                "amixer",
                vec![
                    "-D".to_string(),
                    "pulse".to_string(),
                    "sset".to_string(),
                    "Master".to_string(),
                    format!("{magnitude}%{sign}"),
                ],
            ),
        }
    }

    pub async fn change_volume(&self, percent: i32) -> Result<(), ExecutorError> {
        let (program, args) = self.volume_args(percent);
        run_tool(program, &args).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pactl_volume_arguments() {
        let (program, args) = Mixer::Pactl.volume_args(-5);
        assert_eq!(program, "pactl");
        assert_eq!(args, ["set-sink-volume", "@DEFAULT_SINK@", "-5%"]);
    }

    #[test]
    fn amixer_volume_arguments() {
        let (program, args) = Mixer::Amixer.volume_args(10);
        assert_eq!(program, "amixer");
        assert_eq!(args, ["-D", "pulse", "sset", "Master", "10%+"]);
    }

    #[tokio::test]
    async fn missing_tool_is_reported() {
        let err = run_tool("gestctl-no-such-tool", &[]).await.unwrap_err();
        assert!(matches!(err, ExecutorError::ToolMissing(name) if name == "gestctl-no-such-tool"));
    }

    #[tokio::test]
    async fn failing_tool_is_rejected() {
        let args = ["-c".to_string(), "exit 3".to_string()];
        let err = run_tool("sh", &args).await.unwrap_err();
        assert!(matches!(err, ExecutorError::Rejected { ref program, code: Some(3) } if program == "sh"));

        assert!(run_tool("sh", &["-c".to_string(), "exit 0".to_string()]).await.is_ok());
    }
}
