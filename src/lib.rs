pub mod config;
pub mod controller;
pub mod error;
pub mod gesture;
pub mod player;
pub mod utils;
pub mod vision;

// 重新导出常用类型
pub use controller::{ControllerOptions, FrameReport, GestureController, RunSummary, StopReason};
pub use error::{Error, ExecutorError, Result};
pub use gesture::{Detection, Dispatcher, Gesture, Stabilizer};
pub use player::{PlayerBackend, PlayerExecutor};
pub use vision::{GestureClassifier, OnnxClassifier};
