use std::fmt::Display;
use std::path::Path;

use ort::session::{Session, builder::GraphOptimizationLevel};
use tracing::info;

use crate::error::{Error, Result};

fn unavailable<E: Display>(path: &Path) -> impl Fn(E) -> Error + '_ {
    move |e| Error::ClassifierUnavailable {
        path: path.to_path_buf(),
        reason: e.to_string(),
    }
}

/// 加载手势分类模型
///
/// 加载ONNX格式的分类模型（MobileNetV2迁移学习导出），并应用优化配置。
///
/// # 参数
/// * `model_path` - 模型文件路径
/// * `intra_threads` - 算子内并行线程数
///
/// # 返回值
/// 返回加载的Session对象
///
/// # 错误处理
/// 文件不存在或加载失败都返回 `Error::ClassifierUnavailable`，启动阶段应直接退出
///
/// # 示例
///
/// ```no_run
/// use std::path::Path;
/// use gestctl::vision::model::load_model;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let model = load_model(Path::new("gesture_model.onnx"), 4)?;
/// # Ok(())
/// # }
/// ```
pub fn load_model(model_path: &Path, intra_threads: usize) -> Result<Session> {
    if !model_path.exists() {
        return Err(unavailable(model_path)("模型文件不存在"));
    }

    let model = Session::builder()
        .map_err(unavailable(model_path))?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .map_err(unavailable(model_path))?
        .with_intra_threads(intra_threads)
        .map_err(unavailable(model_path))?
        .commit_from_file(model_path)
        .map_err(unavailable(model_path))?;
    info!("模型已加载: {}", model_path.display());
    Ok(model)
}
