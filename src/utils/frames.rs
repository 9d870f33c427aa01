use std::fs;
use std::path::{Path, PathBuf};

use image::DynamicImage;
use tracing::{debug, info};

use crate::error::{Error, Result};

const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

/// 帧源，每次调用给出下一帧，`None` 表示结束
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<Option<DynamicImage>>;
}

/// 从目录中按文件名顺序读取图像序列
pub struct ImageDirSource {
    files: Vec<PathBuf>,
    cursor: usize,
    looping: bool,
}

impl ImageDirSource {
    /// 扫描目录中的图像文件
    ///
    /// # 参数
    /// * `dir` - 图像目录
    /// * `looping` - 读完后是否从头开始
    ///
    /// # 错误处理
    /// 目录不可读或没有图像文件时返回 `Error::FrameSource`
    pub fn open(dir: &Path, looping: bool) -> Result<Self> {
        let entries = fs::read_dir(dir)
            .map_err(|e| Error::FrameSource(format!("无法读取 {}: {}", dir.display(), e)))?;

        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && is_image(path))
            .collect();
        files.sort();

        if files.is_empty() {
            return Err(Error::FrameSource(format!("{} 中没有图像文件", dir.display())));
        }
        info!("帧源: {} ({} 帧{})", dir.display(), files.len(), if looping { "，循环" } else { "" });

        Ok(Self {
            files,
            cursor: 0,
            looping,
        })
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.iter().any(|known| ext.eq_ignore_ascii_case(known)))
}

impl FrameSource for ImageDirSource {
    fn next_frame(&mut self) -> Result<Option<DynamicImage>> {
        if self.cursor >= self.files.len() {
            if !self.looping {
                return Ok(None);
            }
            self.cursor = 0;
        }
        let path = &self.files[self.cursor];
        self.cursor += 1;
        debug!("读取帧 {}", path.display());
        Ok(Some(image::open(path)?))
    }
}
