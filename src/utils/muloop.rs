use std::time::Duration;

/// 循环模式枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopMode {
    /// 按帧数循环
    Count(usize),
    /// 按时间循环
    Duration(Duration),
    /// 持续循环直到帧源结束或手动停止
    #[default]
    Continuous,
}

impl LoopMode {
    /// 由命令行的帧数和时长限制得到循环模式，帧数优先
    pub fn from_limits(max_frames: Option<usize>, duration: Option<Duration>) -> Self {
        match (max_frames, duration) {
            (Some(count), _) => LoopMode::Count(count),
            (None, Some(duration)) => LoopMode::Duration(duration),
            (None, None) => LoopMode::Continuous,
        }
    }

    /// 是否还应处理下一帧
    ///
    /// # 参数
    /// * `frames` - 已处理的帧数
    /// * `elapsed` - 循环已运行的时间
    pub fn allows(&self, frames: usize, elapsed: Duration) -> bool {
        match *self {
            LoopMode::Count(count) => frames < count,
            LoopMode::Duration(duration) => elapsed < duration,
            LoopMode::Continuous => true,
        }
    }
}
