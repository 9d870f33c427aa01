use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use gestctl::config::{Profile, Settings};
use gestctl::player::{BackendKind, PlayerBackend, PlayerExecutor};
use gestctl::utils::{ImageDirSource, LoopMode};
use gestctl::{GestureController, OnnxClassifier};

/// 手势控制媒体播放器
#[derive(Parser, Debug)]
#[command(name = "gestctl", version)]
struct Cli {
    /// YAML 配置文件
    #[arg(long)]
    config: Option<PathBuf>,

    /// 预设参数组，覆盖配置文件中的对应项
    #[arg(long, value_enum)]
    profile: Option<Profile>,

    #[arg(long, value_enum)]
    backend: Option<BackendKind>,

    /// ONNX 模型路径
    #[arg(long)]
    model: Option<PathBuf>,

    /// 输入帧目录
    #[arg(long)]
    frames: Option<PathBuf>,

    /// 帧读完后从头开始
    #[arg(long)]
    loop_frames: bool,

    #[arg(long)]
    max_frames: Option<usize>,

    #[arg(long)]
    duration_ms: Option<u64>,

    /// 叠加帧输出目录
    #[arg(long)]
    overlay_dir: Option<PathBuf>,

    /// 置信度阈值（百分比）
    #[arg(long)]
    threshold: Option<f32>,

    /// 保持时间（秒）
    #[arg(long)]
    hold: Option<f64>,

    /// 快进/快退冷却时间（秒）
    #[arg(long)]
    cooldown: Option<f64>,

    /// 音量调节间隔（秒）
    #[arg(long)]
    volume_interval: Option<f64>,

    /// 只检查播放器是否可达
    #[arg(long)]
    probe: bool,
}

impl Cli {
    fn settings(&self) -> Result<Settings> {
        let mut settings = match &self.config {
            Some(path) => Settings::load(path)
                .with_context(|| format!("加载配置 {} 失败", path.display()))?,
            None => Settings::default(),
        };
        if let Some(profile) = self.profile {
            profile.apply(&mut settings);
        }

        if let Some(backend) = self.backend {
            settings.player.backend = backend;
        }
        if let Some(model) = &self.model {
            settings.model.path = model.clone();
        }
        if let Some(frames) = &self.frames {
            settings.capture.frames_dir = frames.clone();
        }
        if self.loop_frames {
            settings.capture.loop_frames = true;
        }
        if let Some(dir) = &self.overlay_dir {
            settings.overlay.output_dir = Some(dir.clone());
        }
        if let Some(threshold) = self.threshold {
            settings.gesture.confidence_threshold = threshold;
        }
        if let Some(hold) = self.hold {
            settings.gesture.hold_time_secs = hold;
        }
        if let Some(cooldown) = self.cooldown {
            settings.dispatch.cooldown_secs = cooldown;
        }
        if let Some(interval) = self.volume_interval {
            settings.dispatch.volume_interval_secs = interval;
        }

        settings.validate().context("配置无效")?;
        Ok(settings)
    }

    fn loop_mode(&self) -> LoopMode {
        LoopMode::from_limits(self.max_frames, self.duration_ms.map(Duration::from_millis))
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("无法监听 Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("收到退出信号");
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = cli.settings()?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.logging.filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("手势控制启动");
    info!(
        "阈值: {:.0}%, 保持: {:.2}s, 冷却: {:.2}s, 音量间隔: {:.2}s",
        settings.gesture.confidence_threshold,
        settings.gesture.hold_time_secs,
        settings.dispatch.cooldown_secs,
        settings.dispatch.volume_interval_secs
    );

    let mut backend = PlayerBackend::from_settings(&settings.player);
    let timeout = settings.dispatch_config().executor_timeout;
    let reachable = tokio::time::timeout(timeout, backend.probe()).await.unwrap_or(false);
    if cli.probe {
        println!("{}: {}", backend.name(), if reachable { "可达" } else { "不可达" });
        return Ok(());
    }
    if !reachable {
        warn!("播放器 {} 当前不可达，命令会失败直到播放器启动", backend.name());
    }

    let classifier = OnnxClassifier::from_settings(&settings.model).context("无法加载手势分类器")?;
    info!("类别: {:?}", classifier.class_names());

    let mut source = ImageDirSource::open(&settings.capture.frames_dir, settings.capture.loop_frames)
        .context("无法打开帧源")?;

    if let Some(dir) = &settings.overlay.output_dir {
        fs::create_dir_all(dir).with_context(|| format!("无法创建 {}", dir.display()))?;
    }

    let mut controller = GestureController::from_settings(classifier, backend, &settings);
    let summary = controller
        .run(&mut source, cli.loop_mode(), shutdown_signal())
        .await
        .context("控制循环异常退出")?;

    info!(
        "共处理 {} 帧，执行 {} 个命令，平均 FPS {:.1}",
        summary.frames,
        summary.executed,
        controller.stats().fps()
    );
    Ok(())
}
