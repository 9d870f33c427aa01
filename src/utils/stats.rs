use std::time::Duration;

use crate::config::FPS_WINDOW;

/// 控制循环的帧统计
///
/// FPS 每 `FPS_WINDOW` 帧重新计算一次，延迟指单帧分类耗时。
#[derive(Debug, Clone)]
pub struct FrameStats {
    frame_budget: Duration,
    total_frames: u64,
    deadline_misses: u64,
    worst_case: Duration,
    last_latency: Duration,
    fps: f32,
    window_start: Option<Duration>,
    window_frames: u32,
}

impl FrameStats {
    pub fn new(frame_budget: Duration) -> Self {
        Self {
            frame_budget,
            total_frames: 0,
            deadline_misses: 0,
            worst_case: Duration::ZERO,
            last_latency: Duration::ZERO,
            fps: 0.0,
            window_start: None,
            window_frames: 0,
        }
    }

    /// 记录一帧
    ///
    /// # 参数
    /// * `now` - 帧开始处理的时间
    /// * `latency` - 本帧处理耗时
    pub fn record(&mut self, now: Duration, latency: Duration) {
        self.total_frames += 1;
        self.last_latency = latency;

        if latency > self.frame_budget {
            self.deadline_misses += 1;
        }
        if latency > self.worst_case {
            self.worst_case = latency;
        }

        let start = *self.window_start.get_or_insert(now);
        self.window_frames += 1;
        if self.window_frames >= FPS_WINDOW {
            let span = now.saturating_sub(start);
            if !span.is_zero() {
                // 窗口内 N 帧之间有 N-1 个间隔
                self.fps = (self.window_frames - 1) as f32 / span.as_secs_f32();
            }
            self.window_start = Some(now);
            self.window_frames = 1;
        }
    }

    pub fn fps(&self) -> f32 {
        self.fps
    }

    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    pub fn deadline_misses(&self) -> u64 {
        self.deadline_misses
    }

    pub fn worst_case(&self) -> Duration {
        self.worst_case
    }

    pub fn last_latency(&self) -> Duration {
        self.last_latency
    }
}
