use image::{DynamicImage, GenericImageView, imageops::FilterType};
use ndarray::{Array, Array4};
use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_ROI_SIZE;

/// 模型输入张量的维度顺序
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TensorLayout {
    /// (1, height, width, 3)，Keras 导出的模型默认如此
    #[default]
    Nhwc,
    /// (1, 3, height, width)
    Nchw,
}

/// 手势识别区域的放置方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RoiPlacement {
    /// 画面中央的正方形
    Centered { size: u32 },
    /// 固定左上角的正方形
    Fixed { x: u32, y: u32, size: u32 },
}

impl Default for RoiPlacement {
    fn default() -> Self {
        RoiPlacement::Centered {
            size: DEFAULT_ROI_SIZE,
        }
    }
}

impl RoiPlacement {
    pub fn size(&self) -> u32 {
        match self {
            RoiPlacement::Centered { size } | RoiPlacement::Fixed { size, .. } => *size,
        }
    }

    /// 计算在给定画面尺寸下的实际区域
    ///
    /// 区域边长不超过画面短边，固定位置越界时向内平移。
    pub fn resolve(&self, width: u32, height: u32) -> Roi {
        let size = self.size().min(width).min(height);
        let (x, y) = match self {
            RoiPlacement::Centered { .. } => ((width - size) / 2, (height - size) / 2),
            RoiPlacement::Fixed { x, y, .. } => ((*x).min(width - size), (*y).min(height - size)),
        };
        Roi {
            x,
            y,
            width: size,
            height: size,
        }
    }
}

/// 画面中的矩形区域
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Roi {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// 镜像画面（如需要）并裁剪出识别区域
///
/// # 参数
/// * `frame` - 原始帧
/// * `placement` - 区域放置方式
/// * `mirror` - 是否水平翻转
///
/// # 返回值
/// 返回 (处理后的整帧, 区域坐标, 裁剪出的区域图像)
pub fn extract_roi(
    frame: &DynamicImage,
    placement: &RoiPlacement,
    mirror: bool,
) -> (DynamicImage, Roi, DynamicImage) {
    let frame = if mirror { frame.fliph() } else { frame.clone() };
    let roi = placement.resolve(frame.width(), frame.height());
    let cropped = frame.crop_imm(roi.x, roi.y, roi.width, roi.height);
    (frame, roi, cropped)
}

/// 调整图像大小以适应模型输入
///
/// 使用CatmullRom插值算法将图像调整为指定尺寸。
pub fn resize_image(img: &DynamicImage, width: u32, height: u32) -> DynamicImage {
    img.resize_exact(width, height, FilterType::CatmullRom)
}

/// 将图像转换为模型输入张量
///
/// 像素值归一化到[0, 1]，通道顺序为RGB，维度顺序由 `layout` 决定。
///
/// # 参数
/// * `img` - 已经缩放到模型输入尺寸的图像
/// * `layout` - 张量维度顺序
///
/// # 示例
///
/// ```
/// use image::DynamicImage;
/// use gestctl::vision::prevs::{image_to_tensor, TensorLayout};
///
/// let img = DynamicImage::new_rgb8(128, 128);
/// let tensor = image_to_tensor(&img, TensorLayout::Nhwc);
/// assert_eq!(tensor.shape(), &[1, 128, 128, 3]);
/// ```
pub fn image_to_tensor(img: &DynamicImage, layout: TensorLayout) -> Array4<f32> {
    let (width, height) = (img.width() as usize, img.height() as usize);
    let mut tensor: Array4<f32> = match layout {
        TensorLayout::Nhwc => Array::zeros((1, height, width, 3)),
        TensorLayout::Nchw => Array::zeros((1, 3, height, width)),
    };

    for (x, y, pixel) in img.pixels() {
        let (x, y) = (x as usize, y as usize);
        let [r, g, b, _] = pixel.0;
        for (channel, value) in [r, g, b].into_iter().enumerate() {
            let index = match layout {
                TensorLayout::Nhwc => [0, y, x, channel],
                TensorLayout::Nchw => [0, channel, y, x],
            };
            tensor[index] = value as f32 / 255.0;
        }
    }

    tensor
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn centered_roi_in_vga_frame() {
        let roi = RoiPlacement::Centered { size: 300 }.resolve(640, 480);
        assert_eq!(roi, Roi { x: 170, y: 90, width: 300, height: 300 });
    }

    #[test]
    fn roi_is_clamped_to_frame() {
        let roi = RoiPlacement::Centered { size: 300 }.resolve(200, 100);
        assert_eq!(roi, Roi { x: 50, y: 0, width: 100, height: 100 });

        let roi = RoiPlacement::Fixed { x: 500, y: 400, size: 300 }.resolve(640, 480);
        assert_eq!(roi, Roi { x: 340, y: 180, width: 300, height: 300 });
    }

    #[test]
    fn mirror_flips_before_cropping() {
        let mut img = RgbImage::new(4, 2);
        img.put_pixel(0, 0, Rgb([255, 0, 0]));
        let frame = DynamicImage::ImageRgb8(img);

        let placement = RoiPlacement::Fixed { x: 2, y: 0, size: 2 };
        let (_, _, plain) = extract_roi(&frame, &placement, false);
        let (_, _, mirrored) = extract_roi(&frame, &placement, true);

        assert_eq!(plain.to_rgb8().get_pixel(1, 0), &Rgb([0, 0, 0]));
        assert_eq!(mirrored.to_rgb8().get_pixel(1, 0), &Rgb([255, 0, 0]));
    }

    #[test]
    fn tensor_layouts_place_channels() {
        let mut img = RgbImage::new(2, 2);
        img.put_pixel(1, 0, Rgb([255, 51, 0]));
        let img = DynamicImage::ImageRgb8(img);

        let nhwc = image_to_tensor(&img, TensorLayout::Nhwc);
        assert_eq!(nhwc.shape(), &[1, 2, 2, 3]);
        assert_eq!(nhwc[[0, 0, 1, 0]], 1.0);
        assert!((nhwc[[0, 0, 1, 1]] - 0.2).abs() < 1e-6);

        let nchw = image_to_tensor(&img, TensorLayout::Nchw);
        assert_eq!(nchw.shape(), &[1, 3, 2, 2]);
        assert_eq!(nchw[[0, 0, 0, 1]], 1.0);
        assert_eq!(nchw[[0, 2, 0, 1]], 0.0);
    }
}
