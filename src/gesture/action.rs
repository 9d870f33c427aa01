//! 手势到播放命令的映射

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::{DEFAULT_SEEK_SECONDS, DEFAULT_VOLUME_STEP};
use crate::gesture::label::Gesture;

/// 动作类别，决定调度器使用哪一套抑制规则
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActionClass {
    /// 有状态动作（播放/暂停），只有会改变播放状态时才执行
    Stateful { playing: bool },
    /// 限频动作（快进/快退），受冷却时间约束
    RateLimited,
    /// 连续动作（音量），按自己的间隔重复执行
    Continuous,
}

/// 发送给播放器的命令
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "amount", rename_all = "snake_case")]
pub enum ActionCommand {
    Play,
    Pause,
    Stop,
    /// 相对跳转，单位秒
    Seek(i32),
    /// 相对音量调整，单位百分比
    Volume(i32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionDescriptor {
    pub class: ActionClass,
    pub command: ActionCommand,
}

impl ActionDescriptor {
    pub fn new(class: ActionClass, command: ActionCommand) -> Self {
        Self { class, command }
    }
}

/// 手势 → 动作 的静态映射，启动时加载一次
#[derive(Debug, Clone, PartialEq)]
pub struct ActionMapping {
    actions: HashMap<Gesture, ActionDescriptor>,
}

impl ActionMapping {
    pub fn empty() -> Self {
        Self {
            actions: HashMap::new(),
        }
    }

    /// 用配置文件中的条目覆盖默认映射
    pub fn with_overrides(mut self, overrides: &HashMap<Gesture, ActionDescriptor>) -> Self {
        for (gesture, descriptor) in overrides {
            self.actions.insert(*gesture, *descriptor);
        }
        self
    }

    pub fn insert(&mut self, gesture: Gesture, descriptor: ActionDescriptor) {
        self.actions.insert(gesture, descriptor);
    }

    pub fn get(&self, gesture: Gesture) -> Option<&ActionDescriptor> {
        self.actions.get(&gesture)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl Default for ActionMapping {
    fn default() -> Self {
        let mut mapping = Self::empty();
        mapping.insert(
            Gesture::Play,
            ActionDescriptor::new(ActionClass::Stateful { playing: true }, ActionCommand::Play),
        );
        // stop 只暂停，不结束播放
        mapping.insert(
            Gesture::Stop,
            ActionDescriptor::new(ActionClass::Stateful { playing: false }, ActionCommand::Pause),
        );
        mapping.insert(
            Gesture::Forward,
            ActionDescriptor::new(ActionClass::RateLimited, ActionCommand::Seek(DEFAULT_SEEK_SECONDS)),
        );
        mapping.insert(
            Gesture::Reverse,
            ActionDescriptor::new(ActionClass::RateLimited, ActionCommand::Seek(-DEFAULT_SEEK_SECONDS)),
        );
        mapping.insert(
            Gesture::VolumeUp,
            ActionDescriptor::new(ActionClass::Continuous, ActionCommand::Volume(DEFAULT_VOLUME_STEP)),
        );
        mapping.insert(
            Gesture::VolumeDown,
            ActionDescriptor::new(ActionClass::Continuous, ActionCommand::Volume(-DEFAULT_VOLUME_STEP)),
        );
        mapping
    }
}
