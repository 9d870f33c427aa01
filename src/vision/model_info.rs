use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use crate::config::DEFAULT_CLASS_NAMES;
use crate::error::{Error, Result};

/// 训练脚本导出的 model_info.json
///
/// 两种写法都接受：`class_names` + `input_shape: [h, w, c]`，
/// 或者 `classes` + `img_size`。
#[derive(Debug, Deserialize)]
struct RawModelInfo {
    #[serde(alias = "classes")]
    class_names: Vec<String>,
    #[serde(default)]
    img_size: Option<u32>,
    #[serde(default)]
    input_shape: Option<Vec<u32>>,
    #[serde(default, alias = "version")]
    model_version: Option<String>,
}

/// 模型的类别表和输入尺寸
///
/// 类别表的顺序就是模型输出的下标顺序（训练时按字母序生成）。
#[derive(Debug, Clone, PartialEq)]
pub struct ModelInfo {
    pub class_names: Vec<String>,
    /// 正方形输入的边长，未提供时由配置决定
    pub input_size: Option<u32>,
    pub version: Option<String>,
}

impl ModelInfo {
    pub fn from_json(contents: &str) -> Result<Self> {
        let raw: RawModelInfo = serde_json::from_str(contents)?;
        let input_size = raw
            .img_size
            .or_else(|| raw.input_shape.as_ref().and_then(|shape| shape.first().copied()));
        Self::checked(raw.class_names, input_size, raw.model_version)
    }

    /// 解析 class_names.txt，每行一个类别，忽略空行
    pub fn from_class_list(contents: &str) -> Result<Self> {
        let class_names = contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        Self::checked(class_names, None, None)
    }

    fn checked(class_names: Vec<String>, input_size: Option<u32>, version: Option<String>) -> Result<Self> {
        if class_names.is_empty() {
            return Err(Error::ModelInfo("类别表为空".to_string()));
        }
        if input_size == Some(0) {
            return Err(Error::ModelInfo("输入尺寸不能为 0".to_string()));
        }
        Ok(Self {
            class_names,
            input_size,
            version,
        })
    }

    /// 训练数据目录的子目录名，按字母序排列，与训练时的类别下标一致
    pub fn from_dataset_dir(dir: &Path) -> Result<Self> {
        let mut class_names = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                class_names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        class_names.sort();
        Self::checked(class_names, None, None)
    }

    /// 按优先级加载类别表
    ///
    /// 依次尝试 model_info.json、class_names.txt、训练数据目录，
    /// 都不存在时使用内置的五类默认表。
    /// 文件存在但内容无效时返回错误，不会静默回退。
    ///
    /// # 参数
    /// * `info_path` - model_info.json 路径
    /// * `class_names_path` - class_names.txt 路径
    /// * `dataset_dir` - 训练数据目录
    pub fn load(info_path: &Path, class_names_path: &Path, dataset_dir: &Path) -> Result<Self> {
        if info_path.exists() {
            let info = Self::from_json(&fs::read_to_string(info_path)?)?;
            info!("已加载 {}: {} 个类别", info_path.display(), info.class_names.len());
            return Ok(info);
        }
        if class_names_path.exists() {
            let info = Self::from_class_list(&fs::read_to_string(class_names_path)?)?;
            info!("已加载 {}: {} 个类别", class_names_path.display(), info.class_names.len());
            return Ok(info);
        }
        if dataset_dir.is_dir() {
            let info = Self::from_dataset_dir(dataset_dir)?;
            warn!("使用训练数据目录 {} 的类别: {:?}", dataset_dir.display(), info.class_names);
            return Ok(info);
        }
        warn!(
            "未找到 {}、{} 或 {}，使用默认类别表 {:?}",
            info_path.display(),
            class_names_path.display(),
            dataset_dir.display(),
            DEFAULT_CLASS_NAMES
        );
        Ok(Self::default())
    }
}

impl Default for ModelInfo {
    fn default() -> Self {
        Self {
            class_names: DEFAULT_CLASS_NAMES.iter().map(|name| name.to_string()).collect(),
            input_size: None,
            version: None,
        }
    }
}
