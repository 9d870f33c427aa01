use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::{PlayerSettings, is_jetson};
use crate::error::ExecutorError;
use crate::gesture::ActionCommand;
use crate::player::{
    DbusExecutor, MpvIpcExecutor, PlayerExecutor, PlayerctlExecutor, SimulatedExecutor,
};

/// 配置和命令行中选择的后端
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    /// Jetson 上使用 MPV IPC，其他平台使用模拟
    #[default]
    Auto,
    MpvIpc,
    Playerctl,
    VlcDbus,
    Simulated,
}

/// 运行时选定的执行器
pub enum PlayerBackend {
    Mpv(MpvIpcExecutor),
    Playerctl(PlayerctlExecutor),
    Dbus(DbusExecutor),
    Simulated(SimulatedExecutor),
}

impl PlayerBackend {
    pub fn from_settings(settings: &PlayerSettings) -> Self {
        let kind = match settings.backend {
            BackendKind::Auto if is_jetson() => BackendKind::MpvIpc,
            BackendKind::Auto => BackendKind::Simulated,
            kind => kind,
        };
        let backend = match kind {
            BackendKind::MpvIpc => PlayerBackend::Mpv(MpvIpcExecutor::new(&settings.mpv_socket)),
            BackendKind::Playerctl => {
                PlayerBackend::Playerctl(PlayerctlExecutor::new(&settings.player_name, settings.mixer))
            }
            BackendKind::VlcDbus => {
                PlayerBackend::Dbus(DbusExecutor::new(&settings.dbus_destination, settings.mixer))
            }
            BackendKind::Simulated | BackendKind::Auto => {
                PlayerBackend::Simulated(SimulatedExecutor::new())
            }
        };
        info!("播放器后端: {}", backend.name());
        backend
    }
}

impl PlayerExecutor for PlayerBackend {
    fn name(&self) -> &'static str {
        match self {
            PlayerBackend::Mpv(e) => e.name(),
            PlayerBackend::Playerctl(e) => e.name(),
            PlayerBackend::Dbus(e) => e.name(),
            PlayerBackend::Simulated(e) => e.name(),
        }
    }

    async fn execute(&mut self, command: &ActionCommand) -> Result<(), ExecutorError> {
        match self {
            PlayerBackend::Mpv(e) => e.execute(command).await,
            PlayerBackend::Playerctl(e) => e.execute(command).await,
            PlayerBackend::Dbus(e) => e.execute(command).await,
            PlayerBackend::Simulated(e) => e.execute(command).await,
        }
    }

    async fn probe(&mut self) -> bool {
        match self {
            PlayerBackend::Mpv(e) => e.probe().await,
            PlayerBackend::Playerctl(e) => e.probe().await,
            PlayerBackend::Dbus(e) => e.probe().await,
            PlayerBackend::Simulated(e) => e.probe().await,
        }
    }
}
