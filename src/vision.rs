//! Vision模块 - 手势分类
//!
//! 该模块负责从一帧图像得到 (标签, 置信度)，包括：
//! - 模型加载
//! - 识别区域裁剪与预处理
//! - 模型推理
//! - 类别表加载
//! - 状态叠加绘制
//!
//! # 工作流程
//!
//! 1. 使用 `extract_roi` 镜像整帧并裁剪出识别区域
//! 2. `OnnxClassifier::classify` 缩放区域、转为张量、推理并取最大概率类别
//! 3. 需要时用 `draw_overlay` 绘制区域和保持进度
//!
//! # 示例
//!
//! ```no_run
//! use gestctl::config::ModelSettings;
//! use gestctl::vision::{GestureClassifier, OnnxClassifier, RoiPlacement, extract_roi};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut classifier = OnnxClassifier::from_settings(&ModelSettings::default())?;
//! let frame = image::open("frames/0001.png")?;
//! let (_, _, roi) = extract_roi(&frame, &RoiPlacement::default(), true);
//! let detection = classifier.classify(&roi)?;
//! # Ok(())
//! # }
//! ```

pub mod classify;
pub mod infer;
pub mod model;
pub mod model_info;
pub mod overlay;
pub mod prevs;

// 重新导出常用类型和函数
pub use classify::{GestureClassifier, OnnxClassifier, top_class};
pub use model::load_model;
pub use model_info::ModelInfo;
pub use overlay::{OverlayState, OverlayStatus, draw_overlay, save_overlay};
pub use prevs::{Roi, RoiPlacement, TensorLayout, extract_roi, image_to_tensor, resize_image};
