//! 命令调度器
//!
//! 把稳定手势变成最多一次的播放器调用。三类动作各有各的抑制规则：
//!
//! | 类别 | 跟踪的状态 | 触发条件 | 成功后的效果 |
//! |---|---|---|---|
//! | stateful | is_playing | 目标状态 ≠ 当前状态 | 切换状态 |
//! | rate-limited | last_action_time, last_action_label | 距上次 ≥ 冷却时间 | 重置计时、记录标签 |
//! | continuous | last_volume_change_time | 距上次 ≥ 音量间隔 | 重置计时 |
//!
//! 状态只在执行器确认成功后才更新，失败或超时时下一帧可以立即重试。

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::{
    DEFAULT_COMMAND_COOLDOWN, DEFAULT_EXECUTOR_TIMEOUT, DEFAULT_INITIALLY_PLAYING,
    DEFAULT_VOLUME_INTERVAL,
};
use crate::error::ExecutorError;
use crate::gesture::action::{ActionClass, ActionCommand, ActionDescriptor, ActionMapping};
use crate::gesture::label::Gesture;
use crate::player::PlayerExecutor;

/// 限频动作的重复触发规则
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepeatPolicy {
    /// 只看冷却时间，持续保持的手势每个冷却周期触发一次
    #[default]
    Cooldown,
    /// 与上次相同的手势必须先松开（出现一段没有稳定手势的时间）才能再次触发
    Release,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DispatchConfig {
    /// 限频动作的冷却时间
    pub cooldown: Duration,
    /// 连续动作的间隔
    pub volume_interval: Duration,
    /// 单次执行器调用的超时
    pub executor_timeout: Duration,
    pub repeat_policy: RepeatPolicy,
    /// 启动时假定的播放状态
    pub initially_playing: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            cooldown: DEFAULT_COMMAND_COOLDOWN,
            volume_interval: DEFAULT_VOLUME_INTERVAL,
            executor_timeout: DEFAULT_EXECUTOR_TIMEOUT,
            repeat_policy: RepeatPolicy::default(),
            initially_playing: DEFAULT_INITIALLY_PLAYING,
        }
    }
}

/// 冷却窗口和播放状态，只在动作真正执行后修改
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchState {
    pub is_playing: bool,
    pub last_action_label: Option<Gesture>,
    pub last_action_time: Option<Duration>,
    pub last_volume_change_time: Option<Duration>,
}

impl DispatchState {
    pub fn new(is_playing: bool) -> Self {
        Self {
            is_playing,
            ..Self::default()
        }
    }

    /// 记录一次成功执行的动作
    pub fn record(&mut self, gesture: Gesture, descriptor: &ActionDescriptor, now: Duration) {
        match descriptor.class {
            ActionClass::Stateful { playing } => {
                self.is_playing = playing;
                self.last_action_label = Some(gesture);
            }
            ActionClass::RateLimited => {
                self.last_action_time = Some(now);
                self.last_action_label = Some(gesture);
            }
            ActionClass::Continuous => {
                self.last_volume_change_time = Some(now);
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuppressReason {
    /// 播放器已处于目标状态
    NoStateChange,
    /// 仍在冷却窗口内
    Cooldown { remaining: Duration },
    /// 同一手势尚未松开
    AwaitingRelease,
    /// 执行器失败或超时
    ExecutorFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionResult {
    Executed {
        gesture: Gesture,
        action: ActionDescriptor,
    },
    Suppressed {
        gesture: Gesture,
        reason: SuppressReason,
    },
    Skipped,
}

impl ActionResult {
    pub fn is_executed(&self) -> bool {
        matches!(self, ActionResult::Executed { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Execute,
    Suppress(SuppressReason),
}

fn elapsed_since(last: Option<Duration>, now: Duration) -> Option<Duration> {
    last.map(|t| now.saturating_sub(t))
}

fn gate(last: Option<Duration>, interval: Duration, now: Duration) -> Option<SuppressReason> {
    match elapsed_since(last, now) {
        Some(elapsed) if elapsed < interval => Some(SuppressReason::Cooldown {
            remaining: interval - elapsed,
        }),
        _ => None,
    }
}

/// 调度决策的纯函数部分
///
/// # 参数
/// * `state` - 当前调度状态
/// * `descriptor` - 手势映射到的动作
/// * `gesture` - 稳定手势
/// * `now` - 当前时间
/// * `config` - 冷却参数
///
/// # 返回值
/// 返回是否应该调用执行器，不修改任何状态
pub fn decide(
    state: &DispatchState,
    descriptor: &ActionDescriptor,
    gesture: Gesture,
    now: Duration,
    config: &DispatchConfig,
) -> Decision {
    match descriptor.class {
        ActionClass::Stateful { playing } => {
            if state.is_playing == playing {
                Decision::Suppress(SuppressReason::NoStateChange)
            } else {
                Decision::Execute
            }
        }
        ActionClass::RateLimited => {
            if let Some(reason) = gate(state.last_action_time, config.cooldown, now) {
                return Decision::Suppress(reason);
            }
            if config.repeat_policy == RepeatPolicy::Release
                && state.last_action_label == Some(gesture)
            {
                return Decision::Suppress(SuppressReason::AwaitingRelease);
            }
            Decision::Execute
        }
        ActionClass::Continuous => {
            match gate(state.last_volume_change_time, config.volume_interval, now) {
                Some(reason) => Decision::Suppress(reason),
                None => Decision::Execute,
            }
        }
    }
}

/// 命令调度器，对执行器实现泛型
pub struct Dispatcher<E> {
    executor: E,
    mapping: ActionMapping,
    config: DispatchConfig,
    state: DispatchState,
}

impl<E: PlayerExecutor> Dispatcher<E> {
    pub fn new(executor: E, mapping: ActionMapping, config: DispatchConfig) -> Self {
        Self {
            executor,
            mapping,
            state: DispatchState::new(config.initially_playing),
            config,
        }
    }

    pub fn state(&self) -> &DispatchState {
        &self.state
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    pub fn mapping(&self) -> &ActionMapping {
        &self.mapping
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn executor_mut(&mut self) -> &mut E {
        &mut self.executor
    }

    /// 处理一帧的稳定手势
    ///
    /// 没有稳定手势或手势未映射动作时返回 `Skipped`。
    pub async fn dispatch(&mut self, stable: Option<Gesture>, now: Duration) -> ActionResult {
        let Some(gesture) = stable else {
            self.note_release(now);
            return ActionResult::Skipped;
        };
        let Some(descriptor) = self.mapping.get(gesture).copied() else {
            return ActionResult::Skipped;
        };

        if let Decision::Suppress(reason) = decide(&self.state, &descriptor, gesture, now, &self.config) {
            debug!(%gesture, ?reason, "动作被抑制");
            return ActionResult::Suppressed { gesture, reason };
        }

        match self.execute(&descriptor.command).await {
            Ok(()) => {
                self.state.record(gesture, &descriptor, now);
                info!(%gesture, command = ?descriptor.command, player = self.executor.name(), "已执行");
                ActionResult::Executed {
                    gesture,
                    action: descriptor,
                }
            }
            Err(e) => {
                warn!(%gesture, player = self.executor.name(), "执行失败: {}", e);
                ActionResult::Suppressed {
                    gesture,
                    reason: SuppressReason::ExecutorFailed,
                }
            }
        }
    }

    /// 在超时限制内执行一条命令，超时记为 `ExecutorError::Timeout`
    pub async fn execute(&mut self, command: &ActionCommand) -> Result<(), ExecutorError> {
        let timeout = self.config.executor_timeout;
        tokio::time::timeout(timeout, self.executor.execute(command))
            .await
            .unwrap_or(Err(ExecutorError::Timeout(timeout)))
    }

    /// 检查播放器是否可达，同样受超时约束
    pub async fn probe(&mut self) -> bool {
        tokio::time::timeout(self.config.executor_timeout, self.executor.probe())
            .await
            .unwrap_or(false)
    }

    // 松开手势且冷却已过时，允许同一限频手势再次触发
    fn note_release(&mut self, now: Duration) {
        if self.config.repeat_policy != RepeatPolicy::Release {
            return;
        }
        let Some(last) = self.state.last_action_label else {
            return;
        };
        let rate_limited = self
            .mapping
            .get(last)
            .is_some_and(|d| d.class == ActionClass::RateLimited);
        let cooled = elapsed_since(self.state.last_action_time, now)
            .is_none_or(|elapsed| elapsed > self.config.cooldown);
        if rate_limited && cooled {
            self.state.last_action_label = None;
        }
    }
}
