//! 手势稳定器
//!
//! 把逐帧的 (标签, 置信度) 噪声序列变成"稳定手势"：
//! 置信度不足或标签变化都会清空候选，同一手势持续保持够久才输出。

use std::time::Duration;

use crate::config::{DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_HOLD_TIME, DEFAULT_MIN_STABLE_FRAMES};
use crate::gesture::label::{Detection, Gesture};

/// 稳定器参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StabilizerConfig {
    /// 置信度阈值（百分比），等于阈值视为满足
    pub confidence_threshold: f32,
    /// 手势需要保持的时间
    pub hold_time: Duration,
    /// 额外要求的连续命中帧数，0 表示只看保持时间
    pub min_stable_frames: u32,
}

impl Default for StabilizerConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            hold_time: DEFAULT_HOLD_TIME,
            min_stable_frames: DEFAULT_MIN_STABLE_FRAMES,
        }
    }
}

/// 候选手势的跟踪状态
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StabilizerState {
    pub current_candidate: Option<Gesture>,
    pub candidate_since: Option<Duration>,
    pub consecutive_match_count: u32,
}

/// 已确认的稳定手势
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StableGesture {
    pub gesture: Gesture,
    pub confidence: f32,
    /// 从候选开始到当前帧的保持时间
    pub held_for: Duration,
}

/// 稳定器的纯状态转移
///
/// # 参数
/// * `state` - 当前状态
/// * `config` - 阈值与保持时间
/// * `detection` - 当前帧的分类结果
/// * `now` - 当前时间（自控制循环开始起）
///
/// # 返回值
/// 返回新的状态，以及本帧是否得到稳定手势
pub fn stabilize(
    state: &StabilizerState,
    config: &StabilizerConfig,
    detection: &Detection,
    now: Duration,
) -> (StabilizerState, Option<StableGesture>) {
    // 未知标签和低置信度一样处理
    let gesture = match detection.gesture() {
        Some(gesture) if detection.confidence >= config.confidence_threshold => gesture,
        _ => return (StabilizerState::default(), None),
    };

    match (state.current_candidate, state.candidate_since) {
        (Some(current), Some(since)) if current == gesture => {
            let count = state.consecutive_match_count.saturating_add(1);
            let held_for = now.saturating_sub(since);
            let next = StabilizerState {
                current_candidate: Some(gesture),
                candidate_since: Some(since),
                consecutive_match_count: count,
            };
            let stable = (held_for >= config.hold_time && count >= config.min_stable_frames)
                .then_some(StableGesture {
                    gesture,
                    confidence: detection.confidence,
                    held_for,
                });
            (next, stable)
        }
        _ => (
            StabilizerState {
                current_candidate: Some(gesture),
                candidate_since: Some(now),
                consecutive_match_count: 0,
            },
            None,
        ),
    }
}

pub struct Stabilizer {
    config: StabilizerConfig,
    state: StabilizerState,
}

impl Stabilizer {
    pub fn new(config: StabilizerConfig) -> Self {
        Self {
            config,
            state: StabilizerState::default(),
        }
    }

    pub fn config(&self) -> &StabilizerConfig {
        &self.config
    }

    pub fn state(&self) -> &StabilizerState {
        &self.state
    }

    /// 输入一帧分类结果，返回本帧的稳定手势（如果有）
    pub fn observe(&mut self, detection: &Detection, now: Duration) -> Option<StableGesture> {
        let (next, stable) = stabilize(&self.state, &self.config, detection, now);
        self.state = next;
        stable
    }

    /// 本帧没有可用的分类结果
    pub fn reset(&mut self) {
        self.state = StabilizerState::default();
    }

    /// 当前候选距离触发还需保持多久，没有候选时返回 `None`
    pub fn hold_remaining(&self, now: Duration) -> Option<Duration> {
        let since = self.state.candidate_since?;
        Some(self.config.hold_time.saturating_sub(now.saturating_sub(since)))
    }
}

impl Default for Stabilizer {
    fn default() -> Self {
        Self::new(StabilizerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn stabilizer(hold_ms: u64) -> Stabilizer {
        Stabilizer::new(StabilizerConfig {
            confidence_threshold: 90.0,
            hold_time: ms(hold_ms),
            min_stable_frames: 0,
        })
    }

    #[test]
    fn below_threshold_never_stabilizes() {
        let mut s = stabilizer(0);
        for t in 0..50 {
            assert!(s.observe(&Detection::new("play", 89.9), ms(t * 100)).is_none());
            assert_eq!(s.state(), &StabilizerState::default());
        }
    }

    #[test]
    fn threshold_is_inclusive() {
        let mut s = stabilizer(100);
        assert!(s.observe(&Detection::new("stop", 90.0), ms(0)).is_none());
        let stable = s.observe(&Detection::new("stop", 90.0), ms(100));
        assert_eq!(stable.map(|g| g.gesture), Some(Gesture::Stop));
    }

    #[test]
    fn fires_exactly_at_hold_time() {
        let mut s = stabilizer(500);
        assert!(s.observe(&Detection::new("play", 95.0), ms(0)).is_none());
        assert!(s.observe(&Detection::new("play", 95.0), ms(250)).is_none());
        assert!(s.observe(&Detection::new("play", 95.0), ms(499)).is_none());
        let stable = s.observe(&Detection::new("play", 95.0), ms(500)).unwrap();
        assert_eq!(stable.gesture, Gesture::Play);
        assert_eq!(stable.held_for, ms(500));
    }

    #[test]
    fn fires_on_first_sample_after_hold() {
        let mut s = stabilizer(500);
        let outputs: Vec<_> = [0, 200, 400, 600]
            .into_iter()
            .map(|t| s.observe(&Detection::new("play", 95.0), ms(t)))
            .collect();
        assert!(outputs[..3].iter().all(Option::is_none));
        assert_eq!(outputs[3].map(|g| g.gesture), Some(Gesture::Play));
    }

    #[test]
    fn label_switch_restarts_hold_timer() {
        let mut s = stabilizer(500);
        s.observe(&Detection::new("forward", 95.0), ms(0));
        s.observe(&Detection::new("forward", 95.0), ms(400));
        assert!(s.observe(&Detection::new("reverse", 95.0), ms(450)).is_none());
        assert_eq!(s.state().candidate_since, Some(ms(450)));
        assert_eq!(s.state().consecutive_match_count, 0);
        assert!(s.observe(&Detection::new("reverse", 95.0), ms(900)).is_none());
        let stable = s.observe(&Detection::new("reverse", 95.0), ms(950));
        assert_eq!(stable.map(|g| g.gesture), Some(Gesture::Reverse));
    }

    #[test]
    fn low_confidence_frame_resets_candidate() {
        let mut s = stabilizer(500);
        s.observe(&Detection::new("play", 95.0), ms(0));
        s.observe(&Detection::new("play", 95.0), ms(300));
        s.observe(&Detection::new("play", 40.0), ms(400));
        assert_eq!(s.state(), &StabilizerState::default());
        assert!(s.observe(&Detection::new("play", 95.0), ms(600)).is_none());
    }

    #[test]
    fn unknown_label_resets_candidate() {
        let mut s = stabilizer(0);
        s.observe(&Detection::new("play", 95.0), ms(0));
        assert!(s.observe(&Detection::new("background", 99.0), ms(10)).is_none());
        assert_eq!(s.state().current_candidate, None);
    }

    #[test]
    fn match_count_grows_while_label_holds() {
        let mut s = stabilizer(10_000);
        for (i, t) in [0u64, 30, 60, 90].into_iter().enumerate() {
            s.observe(&Detection::new("volume_up", 97.0), ms(t));
            assert_eq!(s.state().consecutive_match_count, i as u32);
        }
    }

    #[test]
    fn min_stable_frames_adds_frame_confirmation() {
        let mut s = Stabilizer::new(StabilizerConfig {
            confidence_threshold: 75.0,
            hold_time: Duration::ZERO,
            min_stable_frames: 3,
        });
        let frames: Vec<_> = (0..5)
            .map(|t| s.observe(&Detection::new("forward", 80.0), ms(t * 33)))
            .collect();
        assert!(frames[..3].iter().all(Option::is_none));
        assert!(frames[3].is_some());
        assert!(frames[4].is_some());
    }

    #[test]
    fn hold_remaining_counts_down() {
        let mut s = stabilizer(500);
        assert_eq!(s.hold_remaining(ms(0)), None);
        s.observe(&Detection::new("play", 95.0), ms(100));
        assert_eq!(s.hold_remaining(ms(300)), Some(ms(300)));
        assert_eq!(s.hold_remaining(ms(900)), Some(Duration::ZERO));
    }
}
