use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// 手势词表
///
/// 分类器输出的类别名是字符串，只有能解析为 `Gesture` 的标签才会参与控制，
/// 其余标签一律视为"无手势"。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gesture {
    Play,
    Stop,
    Forward,
    Reverse,
    VolumeUp,
    VolumeDown,
}

impl Gesture {
    pub const ALL: [Gesture; 6] = [
        Gesture::Play,
        Gesture::Stop,
        Gesture::Forward,
        Gesture::Reverse,
        Gesture::VolumeUp,
        Gesture::VolumeDown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Gesture::Play => "play",
            Gesture::Stop => "stop",
            Gesture::Forward => "forward",
            Gesture::Reverse => "reverse",
            Gesture::VolumeUp => "volume_up",
            Gesture::VolumeDown => "volume_down",
        }
    }
}

impl fmt::Display for Gesture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 未知的手势标签
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownLabel(pub String);

impl FromStr for Gesture {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim();
        Gesture::ALL
            .into_iter()
            .find(|g| g.as_str().eq_ignore_ascii_case(label))
            .ok_or_else(|| UnknownLabel(label.to_string()))
    }
}

/// 单帧分类结果
///
/// 每处理一帧产生一个，置信度为百分比 `[0, 100]`。
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// 类别名称
    pub label: String,
    /// 置信度（百分比）
    pub confidence: f32,
}

impl Detection {
    pub fn new(label: impl Into<String>, confidence: f32) -> Self {
        Self {
            label: label.into(),
            confidence,
        }
    }

    /// 解析为词表内的手势，未知标签返回 `None`
    pub fn gesture(&self) -> Option<Gesture> {
        self.label.parse().ok()
    }
}
