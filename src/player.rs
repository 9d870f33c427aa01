//! Player模块 - 播放器控制
//!
//! 调度器只认识 [`PlayerExecutor`]：给它一个命令，它返回成功或失败。
//! 具体的传输方式各自实现：
//!
//! - MpvIpcExecutor：MPV 的 `--input-ipc-server` 本地套接字，逐行 JSON
//! - PlayerctlExecutor：`playerctl` 命令行工具（MPRIS2）
//! - DbusExecutor：`dbus-send` 直接调用 MPRIS2 方法（VLC）
//! - SimulatedExecutor：只打印日志，用于非 Jetson 平台调试
//!
//! 音量命令在 playerctl / dbus 两种后端下交给系统混音器（`pactl` 或 `amixer`）。
//!
//! # 示例
//!
//! ```no_run
//! use gestctl::player::{MpvIpcExecutor, PlayerExecutor};
//! use gestctl::gesture::ActionCommand;
//!
//! # async fn demo() -> Result<(), gestctl::ExecutorError> {
//! let mut mpv = MpvIpcExecutor::new("/tmp/mpv-socket");
//! mpv.execute(&ActionCommand::Seek(10)).await?;
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod cli;
pub mod dbus;
pub mod mpv;
pub mod playerctl;
pub mod simulate;

use crate::error::ExecutorError;
use crate::gesture::ActionCommand;

pub use backend::{BackendKind, PlayerBackend};
pub use cli::Mixer;
pub use dbus::DbusExecutor;
pub use mpv::MpvIpcExecutor;
pub use playerctl::PlayerctlExecutor;
pub use simulate::SimulatedExecutor;

/// 播放器执行器
///
/// 调用方负责超时，执行器本身不重试。
#[allow(async_fn_in_trait)]
pub trait PlayerExecutor {
    /// 用于日志的后端名称
    fn name(&self) -> &'static str;

    /// 执行一个播放命令
    async fn execute(&mut self, command: &ActionCommand) -> Result<(), ExecutorError>;

    /// 播放器是否可达，默认总是可达
    async fn probe(&mut self) -> bool {
        true
    }
}
