//! 错误类型
//!
//! 库内统一使用 [`Error`]，播放器执行器使用单独的 [`ExecutorError`]，
//! 因为执行失败不是致命错误，调度器只记录日志并保持状态不变。

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// 启动时无法加载识别模型，没有可恢复的路径
    #[error("手势识别模型不可用 ({path}): {reason}")]
    ClassifierUnavailable { path: PathBuf, reason: String },

    #[error("模型信息无效: {0}")]
    ModelInfo(String),

    #[error("推理失败: {0}")]
    Inference(#[from] ort::Error),

    #[error("模型输出不符合预期: {0}")]
    ModelOutput(String),

    #[error("图像处理失败: {0}")]
    Image(#[from] image::ImageError),

    #[error("叠加绘制失败: {0}")]
    Overlay(String),

    #[error("配置错误: {0}")]
    Config(String),

    #[error("帧源错误: {0}")]
    FrameSource(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl From<serde_yaml::Error> for Error {
    fn from(e: serde_yaml::Error) -> Self {
        Error::Config(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::ModelInfo(e.to_string())
    }
}

/// 播放器执行器的单次调用错误
#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("播放器不可达: {0}")]
    Unreachable(#[from] io::Error),

    #[error("播放器在 {0:?} 内未响应")]
    Timeout(Duration),

    #[error("未找到命令行工具 `{0}`")]
    ToolMissing(String),

    #[error("`{program}` 执行失败 (退出码 {code:?})")]
    Rejected { program: String, code: Option<i32> },

    #[error("命令编码失败: {0}")]
    Encode(#[from] serde_json::Error),
}
