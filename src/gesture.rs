//! Gesture模块 - 手势稳定与命令调度
//!
//! 逐帧的分类结果经过两步变成播放器命令：
//!
//! 1. [`Stabilizer`] 过滤低置信度和抖动，只有同一手势持续保持足够久才输出
//! 2. [`Dispatcher`] 按动作类别（stateful / rate-limited / continuous）决定是否真正调用执行器
//!
//! 两者的核心都是纯函数（[`stabilize`]、[`decide`]），状态保存在显式的结构体里。
//!
//! # 示例
//!
//! ```
//! use std::time::Duration;
//! use gestctl::gesture::{Detection, Gesture, Stabilizer, StabilizerConfig};
//!
//! let mut stabilizer = Stabilizer::new(StabilizerConfig::default());
//! let play = Detection::new("play", 95.0);
//! assert!(stabilizer.observe(&play, Duration::ZERO).is_none());
//! let stable = stabilizer.observe(&play, Duration::from_millis(600)).unwrap();
//! assert_eq!(stable.gesture, Gesture::Play);
//! ```

pub mod action;
pub mod dispatch;
pub mod label;
pub mod stabilizer;

pub use action::{ActionClass, ActionCommand, ActionDescriptor, ActionMapping};
pub use dispatch::{
    ActionResult, Decision, DispatchConfig, DispatchState, Dispatcher, RepeatPolicy,
    SuppressReason, decide,
};
pub use label::{Detection, Gesture, UnknownLabel};
pub use stabilizer::{StableGesture, Stabilizer, StabilizerConfig, StabilizerState, stabilize};
