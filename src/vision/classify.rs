use std::time::Instant;

use image::DynamicImage;
use ort::session::Session;
use tracing::debug;

use crate::config::ModelSettings;
use crate::error::{Error, Result};
use crate::gesture::Detection;
use crate::vision::infer::run_inference;
use crate::vision::model::load_model;
use crate::vision::model_info::ModelInfo;
use crate::vision::prevs::{TensorLayout, image_to_tensor, resize_image};

/// 手势分类器
///
/// 输入已经裁剪好的手势区域，输出 (标签, 置信度百分比)。
pub trait GestureClassifier {
    fn classify(&mut self, roi: &DynamicImage) -> Result<Detection>;
}

/// 基于ONNX模型的分类器
///
/// # 示例
///
/// ```no_run
/// use std::path::Path;
/// use gestctl::vision::{GestureClassifier, OnnxClassifier, TensorLayout, load_model};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let model = load_model(Path::new("gesture_model.onnx"), 4)?;
/// let names = vec!["play".to_string(), "stop".to_string()];
/// let mut classifier = OnnxClassifier::new(model, names, 128).with_layout(TensorLayout::Nchw);
/// let roi = image::open("hand.png")?;
/// let detection = classifier.classify(&roi)?;
/// println!("{} {:.1}%", detection.label, detection.confidence);
/// # Ok(())
/// # }
/// ```
pub struct OnnxClassifier {
    model: Session,
    class_names: Vec<String>,
    input_size: u32,
    layout: TensorLayout,
}

impl OnnxClassifier {
    pub fn new(model: Session, class_names: Vec<String>, input_size: u32) -> Self {
        Self {
            model,
            class_names,
            input_size,
            layout: TensorLayout::default(),
        }
    }

    /// 设置输入张量的维度顺序
    pub fn with_layout(mut self, layout: TensorLayout) -> Self {
        self.layout = layout;
        self
    }

    /// 按配置加载模型和类别表
    ///
    /// 输入尺寸优先取模型信息里的值，其次是配置。
    pub fn from_settings(settings: &ModelSettings) -> Result<Self> {
        let model = load_model(&settings.path, settings.intra_threads)?;
        let info = ModelInfo::load(&settings.info_path, &settings.class_names_path, &settings.dataset_dir)?;
        let input_size = info.input_size.unwrap_or(settings.input_size);
        Ok(Self::new(model, info.class_names, input_size).with_layout(settings.layout))
    }

    pub fn class_names(&self) -> &[String] {
        &self.class_names
    }
}

impl GestureClassifier for OnnxClassifier {
    fn classify(&mut self, roi: &DynamicImage) -> Result<Detection> {
        let resized = resize_image(roi, self.input_size, self.input_size);
        let input = image_to_tensor(&resized, self.layout);

        let start_time = Instant::now();
        let scores = run_inference(&mut self.model, &input)?;
        debug!("模型推理耗时: {:?}", start_time.elapsed());

        top_class(&scores, &self.class_names)
    }
}

/// 取得分最高的类别
///
/// 模型最后一层是 softmax 时直接使用输出，否则先做 softmax 归一化。
///
/// # 返回值
/// 返回类别名和置信度（0-100）
///
/// # 错误处理
/// 输出长度和类别表长度不一致时返回Err
pub fn top_class(scores: &[f32], class_names: &[String]) -> Result<Detection> {
    if scores.len() != class_names.len() {
        return Err(Error::ModelOutput(format!(
            "模型输出 {} 个类别，类别表有 {} 个",
            scores.len(),
            class_names.len()
        )));
    }

    let probabilities = if is_distribution(scores) {
        scores.to_vec()
    } else {
        softmax(scores)
    };

    probabilities
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(index, &p)| Detection::new(class_names[index].clone(), p * 100.0))
        .ok_or_else(|| Error::ModelOutput("模型输出为空".to_string()))
}

fn is_distribution(scores: &[f32]) -> bool {
    let sum: f32 = scores.iter().sum();
    scores.iter().all(|s| (0.0..=1.0).contains(s)) && (sum - 1.0).abs() < 1e-3
}

fn softmax(scores: &[f32]) -> Vec<f32> {
    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = scores.iter().map(|s| (s - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.iter().map(|e| e / sum).collect()
}
