use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Error, Result};
use crate::gesture::{ActionDescriptor, DispatchConfig, Gesture, RepeatPolicy, StabilizerConfig};
use crate::player::{BackendKind, Mixer};
use crate::vision::{RoiPlacement, TensorLayout};

// 手势稳定超参数
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 90.0;
pub const DEFAULT_HOLD_TIME: Duration = Duration::from_millis(500);
pub const DEFAULT_MIN_STABLE_FRAMES: u32 = 0;

// 调度超参数
pub const DEFAULT_COMMAND_COOLDOWN: Duration = Duration::from_millis(500);
pub const DEFAULT_VOLUME_INTERVAL: Duration = Duration::from_millis(500);
pub const DEFAULT_EXECUTOR_TIMEOUT: Duration = Duration::from_secs(1);
pub const DEFAULT_INITIALLY_PLAYING: bool = true;
pub const DEFAULT_SEEK_SECONDS: i32 = 10;
pub const DEFAULT_VOLUME_STEP: i32 = 5;

// 播放器
pub const DEFAULT_MPV_SOCKET: &str = "/tmp/mpv-socket";
pub const DEFAULT_PLAYER_NAME: &str = "mpv";
pub const DEFAULT_DBUS_DESTINATION: &str = "org.mpris.MediaPlayer2.vlc";
pub const MPV_RESPONSE_TIMEOUT: Duration = Duration::from_millis(250);
pub const MPV_PROBE_TIMEOUT: Duration = Duration::from_millis(500);

// 模型
pub const DEFAULT_MODEL_PATH: &str = "gesture_model.onnx";
pub const DEFAULT_MODEL_INFO_PATH: &str = "model_info.json";
pub const DEFAULT_CLASS_NAMES_PATH: &str = "class_names.txt";
pub const DEFAULT_DATASET_DIR: &str = "dataset";
pub const DEFAULT_CLASS_NAMES: [&str; 5] = ["forward", "play", "reverse", "stop", "volume_up"];
pub const DEFAULT_INPUT_SIZE: u32 = 128;
pub const DEFAULT_INTRA_THREADS: usize = 4;

// 采集
pub const DEFAULT_FRAMES_DIR: &str = "frames";
pub const DEFAULT_ROI_SIZE: u32 = 300;
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(33);
pub const FPS_WINDOW: u32 = 10;  // 每多少帧重新计算一次FPS
pub const PLAYER_CHECK_INTERVAL: u64 = 30;  // 每多少帧检查一次播放器是否可达

pub const DEFAULT_LOG_FILTER: &str = "gestctl=info,ort=warn";

/// 检测是否运行在 Jetson 上
pub fn is_jetson() -> bool {
    Path::new("/etc/nv_tegra_release").exists()
        || fs::read_to_string("/proc/sys/kernel/osrelease")
            .map(|release| release.to_lowercase().contains("tegra"))
            .unwrap_or(false)
}

// 校验过的值不会走到饱和分支
fn secs(value: f64) -> Duration {
    match Duration::try_from_secs_f64(value) {
        Ok(duration) => duration,
        Err(_) if value > 0.0 => Duration::MAX,
        Err(_) => Duration::ZERO,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    pub path: PathBuf,
    pub info_path: PathBuf,
    pub class_names_path: PathBuf,
    /// 训练数据目录，子目录名即类别名
    pub dataset_dir: PathBuf,
    /// 模型信息里没有输入尺寸时使用
    pub input_size: u32,
    pub layout: TensorLayout,
    pub intra_threads: usize,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            path: DEFAULT_MODEL_PATH.into(),
            info_path: DEFAULT_MODEL_INFO_PATH.into(),
            class_names_path: DEFAULT_CLASS_NAMES_PATH.into(),
            dataset_dir: DEFAULT_DATASET_DIR.into(),
            input_size: DEFAULT_INPUT_SIZE,
            layout: TensorLayout::default(),
            intra_threads: DEFAULT_INTRA_THREADS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureSettings {
    pub frames_dir: PathBuf,
    pub loop_frames: bool,
    /// 水平镜像，和摄像头预览一致
    pub mirror: bool,
    pub roi: RoiPlacement,
    pub frame_interval_secs: f64,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            frames_dir: DEFAULT_FRAMES_DIR.into(),
            loop_frames: false,
            mirror: true,
            roi: RoiPlacement::default(),
            frame_interval_secs: DEFAULT_FRAME_INTERVAL.as_secs_f64(),
        }
    }
}

impl CaptureSettings {
    pub fn frame_interval(&self) -> Duration {
        secs(self.frame_interval_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureSettings {
    pub confidence_threshold: f32,
    pub hold_time_secs: f64,
    pub min_stable_frames: u32,
}

impl Default for GestureSettings {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            hold_time_secs: DEFAULT_HOLD_TIME.as_secs_f64(),
            min_stable_frames: DEFAULT_MIN_STABLE_FRAMES,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchSettings {
    pub cooldown_secs: f64,
    pub volume_interval_secs: f64,
    pub executor_timeout_secs: f64,
    pub repeat_policy: RepeatPolicy,
    pub initially_playing: bool,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            cooldown_secs: DEFAULT_COMMAND_COOLDOWN.as_secs_f64(),
            volume_interval_secs: DEFAULT_VOLUME_INTERVAL.as_secs_f64(),
            executor_timeout_secs: DEFAULT_EXECUTOR_TIMEOUT.as_secs_f64(),
            repeat_policy: RepeatPolicy::default(),
            initially_playing: DEFAULT_INITIALLY_PLAYING,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerSettings {
    pub backend: BackendKind,
    pub mpv_socket: PathBuf,
    pub player_name: String,
    pub dbus_destination: String,
    pub mixer: Mixer,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            mpv_socket: DEFAULT_MPV_SOCKET.into(),
            player_name: DEFAULT_PLAYER_NAME.to_string(),
            dbus_destination: DEFAULT_DBUS_DESTINATION.to_string(),
            mixer: Mixer::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlaySettings {
    /// 叠加帧的输出目录，未设置则不绘制
    pub output_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub filter: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

/// 运行时配置，对应 YAML 配置文件，所有字段都有默认值
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub model: ModelSettings,
    pub capture: CaptureSettings,
    pub gesture: GestureSettings,
    pub dispatch: DispatchSettings,
    pub player: PlayerSettings,
    pub overlay: OverlaySettings,
    pub logging: LoggingSettings,
    /// 覆盖默认的手势映射
    pub actions: HashMap<Gesture, ActionDescriptor>,
}

impl Settings {
    /// 从 YAML 文件加载并校验
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("无法读取 {}: {}", path.display(), e)))?;
        Self::from_yaml(&contents)
    }

    pub fn from_yaml(contents: &str) -> Result<Self> {
        let settings: Settings = serde_yaml::from_str(contents)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        let threshold = self.gesture.confidence_threshold;
        if !(0.0..=100.0).contains(&threshold) {
            return Err(Error::Config(format!(
                "置信度阈值必须在 0 到 100 之间: {threshold}"
            )));
        }

        let durations = [
            ("gesture.hold_time_secs", self.gesture.hold_time_secs),
            ("dispatch.cooldown_secs", self.dispatch.cooldown_secs),
            ("dispatch.volume_interval_secs", self.dispatch.volume_interval_secs),
            ("dispatch.executor_timeout_secs", self.dispatch.executor_timeout_secs),
            ("capture.frame_interval_secs", self.capture.frame_interval_secs),
        ];
        for (name, value) in durations {
            // 负数、NaN、无穷和超出 Duration 范围的值都会失败
            if Duration::try_from_secs_f64(value).is_err() {
                return Err(Error::Config(format!("{name} 必须是有效的非负秒数: {value}")));
            }
        }
        let timeout = self.dispatch.executor_timeout_secs;
        if timeout <= 0.0 {
            return Err(Error::Config(format!(
                "dispatch.executor_timeout_secs 必须大于 0: {timeout}"
            )));
        }

        if self.model.input_size == 0 {
            return Err(Error::Config("model.input_size 不能为 0".to_string()));
        }
        if self.capture.roi.size() == 0 {
            return Err(Error::Config("capture.roi.size 不能为 0".to_string()));
        }
        if timeout > 2.0 {
            warn!("执行器超时 {timeout}s 较长，卡住的播放器会拖慢控制循环");
        }
        Ok(())
    }

    pub fn stabilizer_config(&self) -> StabilizerConfig {
        StabilizerConfig {
            confidence_threshold: self.gesture.confidence_threshold,
            hold_time: secs(self.gesture.hold_time_secs),
            min_stable_frames: self.gesture.min_stable_frames,
        }
    }

    pub fn dispatch_config(&self) -> DispatchConfig {
        DispatchConfig {
            cooldown: secs(self.dispatch.cooldown_secs),
            volume_interval: secs(self.dispatch.volume_interval_secs),
            executor_timeout: secs(self.dispatch.executor_timeout_secs),
            repeat_policy: self.dispatch.repeat_policy,
            initially_playing: self.dispatch.initially_playing,
        }
    }
}

/// 预设参数组，对应几种部署方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Profile {
    /// Jetson + MPV IPC：高阈值、短保持、松开后才能重复快进
    MpvIpc,
    /// MPV + playerctl/pactl：低阈值、按帧数确认
    Playerctl,
    /// VLC + dbus-send/amixer：所有动作统一的长冷却
    VlcDbus,
}

impl Profile {
    pub fn apply(&self, settings: &mut Settings) {
        match self {
            Profile::MpvIpc => {
                settings.gesture.confidence_threshold = 90.0;
                settings.gesture.hold_time_secs = 0.5;
                settings.gesture.min_stable_frames = 0;
                settings.dispatch.cooldown_secs = 0.5;
                settings.dispatch.volume_interval_secs = 0.5;
                settings.dispatch.repeat_policy = RepeatPolicy::Release;
                settings.player.backend = BackendKind::MpvIpc;
            }
            Profile::Playerctl => {
                settings.gesture.confidence_threshold = 75.0;
                settings.gesture.hold_time_secs = 0.0;
                settings.gesture.min_stable_frames = 3;
                settings.dispatch.cooldown_secs = 1.5;
                settings.dispatch.volume_interval_secs = 0.3;
                settings.dispatch.repeat_policy = RepeatPolicy::Cooldown;
                settings.player.backend = BackendKind::Playerctl;
                settings.player.mixer = Mixer::Pactl;
            }
            Profile::VlcDbus => {
                settings.gesture.confidence_threshold = 75.0;
                settings.gesture.hold_time_secs = 0.0;
                settings.gesture.min_stable_frames = 0;
                settings.dispatch.cooldown_secs = 2.0;
                settings.dispatch.volume_interval_secs = 2.0;
                settings.dispatch.repeat_policy = RepeatPolicy::Cooldown;
                settings.player.backend = BackendKind::VlcDbus;
                settings.player.mixer = Mixer::Amixer;
            }
        }
    }
}
