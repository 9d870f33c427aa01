//! 控制循环
//!
//! 单线程：取一帧、分类一次、稳定+调度一次、绘制一次叠加层，然后等下一帧。
//! 唯一会阻塞的是执行器调用，由调度器的超时约束。

use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use image::DynamicImage;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::{FPS_WINDOW, PLAYER_CHECK_INTERVAL, Settings};
use crate::error::Result;
use crate::gesture::{
    ActionMapping, ActionResult, Detection, Dispatcher, StableGesture, Stabilizer,
};
use crate::player::PlayerExecutor;
use crate::utils::{FrameSource, FrameStats, LoopMode};
use crate::vision::{
    GestureClassifier, OverlayState, OverlayStatus, RoiPlacement, draw_overlay, extract_roi,
    save_overlay,
};

/// 与帧处理相关的参数
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerOptions {
    pub roi: RoiPlacement,
    pub mirror: bool,
    pub frame_interval: Duration,
    /// 叠加帧输出目录，`None` 时不绘制
    pub overlay_dir: Option<PathBuf>,
}

impl ControllerOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            roi: settings.capture.roi,
            mirror: settings.capture.mirror,
            frame_interval: settings.capture.frame_interval(),
            overlay_dir: settings.overlay.output_dir.clone(),
        }
    }
}

/// 单帧的处理结果
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    /// 分类失败时为 `None`
    pub detection: Option<Detection>,
    pub stable: Option<StableGesture>,
    pub result: ActionResult,
    /// 分类耗时
    pub latency: Duration,
    /// 最近一次检查时播放器是否可达
    pub player_reachable: bool,
}

/// 控制循环结束的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// 达到帧数或时长限制
    LimitReached,
    /// 帧源已读完
    EndOfFrames,
    /// 收到退出信号
    Shutdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub frames: usize,
    pub executed: usize,
    pub stop: StopReason,
}

pub struct GestureController<C, E> {
    classifier: C,
    stabilizer: Stabilizer,
    dispatcher: Dispatcher<E>,
    options: ControllerOptions,
    stats: FrameStats,
    frame_index: u64,
    player_reachable: bool,
}

impl<C: GestureClassifier, E: PlayerExecutor> GestureController<C, E> {
    pub fn new(
        classifier: C,
        stabilizer: Stabilizer,
        dispatcher: Dispatcher<E>,
        options: ControllerOptions,
    ) -> Self {
        Self {
            classifier,
            stabilizer,
            dispatcher,
            stats: FrameStats::new(options.frame_interval),
            options,
            frame_index: 0,
            player_reachable: true,
        }
    }

    /// 按配置组装稳定器和调度器
    pub fn from_settings(classifier: C, executor: E, settings: &Settings) -> Self {
        let mapping = ActionMapping::default().with_overrides(&settings.actions);
        Self::new(
            classifier,
            Stabilizer::new(settings.stabilizer_config()),
            Dispatcher::new(executor, mapping, settings.dispatch_config()),
            ControllerOptions::from_settings(settings),
        )
    }

    pub fn stabilizer(&self) -> &Stabilizer {
        &self.stabilizer
    }

    pub fn dispatcher(&self) -> &Dispatcher<E> {
        &self.dispatcher
    }

    pub fn dispatcher_mut(&mut self) -> &mut Dispatcher<E> {
        &mut self.dispatcher
    }

    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }

    pub fn player_reachable(&self) -> bool {
        self.player_reachable
    }

    // 第一帧和之后每 PLAYER_CHECK_INTERVAL 帧检查一次
    async fn check_player(&mut self) {
        if self.frame_index % PLAYER_CHECK_INTERVAL != 0 {
            return;
        }
        let reachable = self.dispatcher.probe().await;
        if reachable != self.player_reachable {
            let player = self.dispatcher.executor().name();
            if reachable {
                info!(player, "播放器已恢复");
            } else {
                warn!(player, "播放器不可达");
            }
        }
        self.player_reachable = reachable;
    }

    /// 处理一帧：分类 → 稳定 → 调度 → 叠加
    ///
    /// 分类失败只记日志，本帧按"无手势"处理。
    ///
    /// # 参数
    /// * `frame` - 原始帧
    /// * `now` - 自循环开始起的时间
    ///
    /// # 错误处理
    /// 只有叠加帧写入失败会返回Err
    pub async fn process_frame(&mut self, frame: &DynamicImage, now: Duration) -> Result<FrameReport> {
        self.check_player().await;
        let (frame, roi, cropped) = extract_roi(frame, &self.options.roi, self.options.mirror);

        let start_time = Instant::now();
        let detection = match self.classifier.classify(&cropped) {
            Ok(detection) => Some(detection),
            Err(e) => {
                warn!("分类失败: {}", e);
                None
            }
        };
        let latency = start_time.elapsed();

        let stable = match &detection {
            Some(detection) => self.stabilizer.observe(detection, now),
            None => {
                self.stabilizer.reset();
                None
            }
        };
        if let Some(stable) = &stable {
            debug!(gesture = %stable.gesture, confidence = stable.confidence, "稳定手势");
        }

        let result = self.dispatcher.dispatch(stable.map(|s| s.gesture), now).await;
        self.stats.record(now, latency);

        if let Some(dir) = &self.options.overlay_dir {
            let status = OverlayStatus {
                roi,
                state: self.overlay_state(stable.is_some(), now),
                playing: self.dispatcher.state().is_playing,
                player_reachable: self.player_reachable,
            };
            let drawn = draw_overlay(&frame, &status)?;
            save_overlay(&drawn, &dir.join(format!("frame_{:06}.png", self.frame_index)))?;
        }
        self.frame_index += 1;

        Ok(FrameReport {
            detection,
            stable,
            result,
            latency,
            player_reachable: self.player_reachable,
        })
    }

    fn overlay_state(&self, stable: bool, now: Duration) -> OverlayState {
        if stable {
            return OverlayState::Stable;
        }
        match self.stabilizer.hold_remaining(now) {
            Some(remaining) => {
                let hold = self.stabilizer.config().hold_time;
                let progress = if hold.is_zero() {
                    1.0
                } else {
                    1.0 - remaining.as_secs_f32() / hold.as_secs_f32()
                };
                OverlayState::Holding { progress }
            }
            None => OverlayState::Idle,
        }
    }

    /// 运行控制循环
    ///
    /// 按 `frame_interval` 节拍取帧，直到达到 `mode` 的限制、帧源结束或 `shutdown` 完成。
    ///
    /// # 参数
    /// * `source` - 帧源
    /// * `mode` - 循环模式
    /// * `shutdown` - 退出信号，通常是 `tokio::signal::ctrl_c`
    pub async fn run<S, F>(&mut self, source: &mut S, mode: LoopMode, shutdown: F) -> Result<RunSummary>
    where
        S: FrameSource,
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        let started = Instant::now();
        // interval 不接受 0
        let period = self.options.frame_interval.max(Duration::from_millis(1));
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut frames = 0;
        let mut executed = 0;
        let stop = loop {
            if !mode.allows(frames, started.elapsed()) {
                break StopReason::LimitReached;
            }
            tokio::select! {
                biased;
                _ = &mut shutdown => break StopReason::Shutdown,
                _ = ticker.tick() => {}
            }

            let Some(frame) = source.next_frame()? else {
                break StopReason::EndOfFrames;
            };
            let report = self.process_frame(&frame, started.elapsed()).await?;
            frames += 1;
            if report.result.is_executed() {
                executed += 1;
            }

            if frames % FPS_WINDOW as usize == 0 {
                info!(
                    "FPS: {:.1}, 推理耗时: {:?}, 超时帧: {}",
                    self.stats.fps(),
                    self.stats.last_latency(),
                    self.stats.deadline_misses()
                );
            }
        };

        info!(
            ?stop,
            frames,
            executed,
            worst_case = ?self.stats.worst_case(),
            "控制循环结束"
        );
        Ok(RunSummary {
            frames,
            executed,
            stop,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, ExecutorError};
    use crate::gesture::{ActionCommand, DispatchConfig, Gesture, StabilizerConfig, SuppressReason};
    use image::RgbImage;

    struct FixedClassifier(Option<Detection>);

    impl GestureClassifier for FixedClassifier {
        fn classify(&mut self, _roi: &DynamicImage) -> Result<Detection> {
            self.0
                .clone()
                .ok_or_else(|| Error::ModelOutput("no output".to_string()))
        }
    }

    struct CountingExecutor {
        calls: usize,
        checks: usize,
        reachable: bool,
    }

    impl Default for CountingExecutor {
        fn default() -> Self {
            Self {
                calls: 0,
                checks: 0,
                reachable: true,
            }
        }
    }

    impl PlayerExecutor for CountingExecutor {
        fn name(&self) -> &'static str {
            "counting"
        }

        async fn execute(&mut self, _command: &ActionCommand) -> std::result::Result<(), ExecutorError> {
            self.calls += 1;
            Ok(())
        }

        async fn probe(&mut self) -> bool {
            self.checks += 1;
            self.reachable
        }
    }

    fn controller(detection: Option<Detection>, overlay_dir: Option<PathBuf>) -> GestureController<FixedClassifier, CountingExecutor> {
        GestureController::new(
            FixedClassifier(detection),
            Stabilizer::new(StabilizerConfig::default()),
            Dispatcher::new(
                CountingExecutor::default(),
                ActionMapping::default(),
                DispatchConfig {
                    initially_playing: false,
                    ..DispatchConfig::default()
                },
            ),
            ControllerOptions {
                roi: RoiPlacement::Centered { size: 32 },
                mirror: true,
                frame_interval: Duration::from_millis(100),
                overlay_dir,
            },
        )
    }

    fn frame() -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::new(64, 48))
    }

    #[tokio::test]
    async fn play_fires_after_hold() {
        let mut controller = controller(Some(Detection::new("play", 95.0)), None);

        for ms in [0, 200, 400] {
            let report = controller.process_frame(&frame(), Duration::from_millis(ms)).await.unwrap();
            assert_eq!(report.result, ActionResult::Skipped);
        }
        let report = controller.process_frame(&frame(), Duration::from_millis(600)).await.unwrap();
        assert!(report.result.is_executed());
        assert!(controller.dispatcher().state().is_playing);

        let report = controller.process_frame(&frame(), Duration::from_millis(1000)).await.unwrap();
        assert_eq!(
            report.result,
            ActionResult::Suppressed {
                gesture: Gesture::Play,
                reason: SuppressReason::NoStateChange
            }
        );
        assert_eq!(controller.dispatcher().executor().calls, 1);
        assert_eq!(controller.stats().total_frames(), 5);
    }

    #[tokio::test]
    async fn classifier_failure_counts_as_no_gesture() {
        let mut controller = controller(None, None);
        let report = controller.process_frame(&frame(), Duration::ZERO).await.unwrap();
        assert!(report.detection.is_none());
        assert_eq!(report.result, ActionResult::Skipped);
        assert!(controller.stabilizer().state().current_candidate.is_none());
    }

    #[tokio::test]
    async fn overlay_frames_are_written() {
        let dir = tempfile::tempdir().unwrap();
        let mut controller = controller(Some(Detection::new("stop", 40.0)), Some(dir.path().to_path_buf()));
        controller.process_frame(&frame(), Duration::ZERO).await.unwrap();
        controller.process_frame(&frame(), Duration::from_millis(33)).await.unwrap();

        assert!(dir.path().join("frame_000000.png").exists());
        assert!(dir.path().join("frame_000001.png").exists());
    }

    #[tokio::test]
    async fn player_reachability_is_rechecked_periodically() {
        let mut controller = controller(None, None);
        controller.dispatcher_mut().executor_mut().reachable = false;

        let report = controller.process_frame(&frame(), Duration::ZERO).await.unwrap();
        assert!(!report.player_reachable);
        assert!(!controller.player_reachable());

        // 恢复后要等到下一个检查周期才更新
        controller.dispatcher_mut().executor_mut().reachable = true;
        for i in 1..PLAYER_CHECK_INTERVAL {
            let now = Duration::from_millis(i * 33);
            assert!(!controller.process_frame(&frame(), now).await.unwrap().player_reachable);
        }
        let now = Duration::from_millis(PLAYER_CHECK_INTERVAL * 33);
        assert!(controller.process_frame(&frame(), now).await.unwrap().player_reachable);
        assert_eq!(controller.dispatcher().executor().checks, 2);
    }

    struct Frames(usize);

    impl FrameSource for Frames {
        fn next_frame(&mut self) -> Result<Option<DynamicImage>> {
            if self.0 == 0 {
                return Ok(None);
            }
            self.0 -= 1;
            Ok(Some(frame()))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn run_stops_at_end_of_frames() {
        let mut controller = controller(Some(Detection::new("play", 95.0)), None);
        let summary = controller
            .run(&mut Frames(10), LoopMode::Continuous, std::future::pending())
            .await
            .unwrap();

        // 帧间隔 100ms，第 6 帧（500ms）时保持时间足够
        assert_eq!(summary.stop, StopReason::EndOfFrames);
        assert_eq!(summary.frames, 10);
        assert_eq!(summary.executed, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn run_respects_frame_limit_and_shutdown() {
        let mut controller = controller(Some(Detection::new("play", 95.0)), None);
        let summary = controller
            .run(&mut Frames(10), LoopMode::Count(3), std::future::pending())
            .await
            .unwrap();
        assert_eq!(summary.stop, StopReason::LimitReached);
        assert_eq!(summary.frames, 3);

        let summary = controller
            .run(&mut Frames(10), LoopMode::Continuous, std::future::ready(()))
            .await
            .unwrap();
        assert_eq!(summary.stop, StopReason::Shutdown);
        assert_eq!(summary.frames, 0);
    }
}
