use std::path::Path;

use image::{DynamicImage, GenericImageView, ImageBuffer};
use raqote::{DrawOptions, DrawTarget, LineJoin, PathBuilder, SolidSource, Source, StrokeStyle};

use crate::error::{Error, Result};
use crate::vision::prevs::Roi;

const STABLE_COLOR: SolidSource = SolidSource { r: 0x00, g: 0xFF, b: 0x00, a: 0xFF };
const HOLDING_COLOR: SolidSource = SolidSource { r: 0xFF, g: 0xA5, b: 0x00, a: 0xFF };
const IDLE_COLOR: SolidSource = SolidSource { r: 0xFF, g: 0x00, b: 0x00, a: 0xFF };
const PAUSED_COLOR: SolidSource = SolidSource { r: 0x80, g: 0x80, b: 0x80, a: 0xFF };

const BAR_HEIGHT: f32 = 8.0;
const BAR_GAP: f32 = 6.0;
const MARKER_SIZE: f32 = 16.0;

/// 识别区域当前的状态
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OverlayState {
    /// 本帧得到稳定手势
    Stable,
    /// 候选手势保持中，`progress` 为 [0, 1]
    Holding { progress: f32 },
    /// 置信度不足或没有手势
    Idle,
}

/// 一帧叠加层需要的信息
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayStatus {
    pub roi: Roi,
    pub state: OverlayState,
    pub playing: bool,
    /// 最近一次检查时播放器是否可达
    pub player_reachable: bool,
}

fn to_premultiplied(image: &DynamicImage) -> Vec<u32> {
    image
        .to_rgba8()
        .chunks(4)
        .map(|pixel| u32::from_le_bytes([pixel[2], pixel[1], pixel[0], pixel[3]]))
        .collect()
}

fn fill_rect(dt: &mut DrawTarget, x: f32, y: f32, width: f32, height: f32, color: SolidSource) {
    let mut pb = PathBuilder::new();
    pb.rect(x, y, width, height);
    dt.fill(&pb.finish(), &Source::Solid(color), &DrawOptions::new());
}

/// 在帧上绘制识别区域和状态
///
/// 区域框按状态着色（绿色稳定、橙色保持中、红色无手势），
/// 保持中时在框下方画进度条，左上角的方块表示播放（绿）或暂停（灰），
/// 播放器不可达时旁边再画一个红色方块。
///
/// # 参数
/// * `image` - 已经镜像过的整帧
/// * `status` - 本帧状态
///
/// # 返回值
/// 返回绘制后的图像
pub fn draw_overlay(image: &DynamicImage, status: &OverlayStatus) -> Result<DynamicImage> {
    let (img_width, img_height) = image.dimensions();
    let mut dt = DrawTarget::new(img_width as i32, img_height as i32);

    let image_data = to_premultiplied(image);
    let img = raqote::Image {
        width: img_width as i32,
        height: img_height as i32,
        data: &image_data,
    };
    dt.draw_image_at(0.0, 0.0, &img, &DrawOptions::new());

    let roi = status.roi;
    let color = match status.state {
        OverlayState::Stable => STABLE_COLOR,
        OverlayState::Holding { .. } => HOLDING_COLOR,
        OverlayState::Idle => IDLE_COLOR,
    };

    let mut pb = PathBuilder::new();
    pb.rect(roi.x as f32, roi.y as f32, roi.width as f32, roi.height as f32);
    dt.stroke(
        &pb.finish(),
        &Source::Solid(color),
        &StrokeStyle {
            join: LineJoin::Round,
            width: 3.0,
            ..StrokeStyle::default()
        },
        &DrawOptions::default(),
    );

    if let OverlayState::Holding { progress } = status.state {
        let bar_y = (roi.y + roi.height) as f32 + BAR_GAP;
        let filled = roi.width as f32 * progress.clamp(0.0, 1.0);
        fill_rect(&mut dt, roi.x as f32, bar_y, filled, BAR_HEIGHT, HOLDING_COLOR);
    }

    let marker = if status.playing { STABLE_COLOR } else { PAUSED_COLOR };
    fill_rect(&mut dt, 10.0, 10.0, MARKER_SIZE, MARKER_SIZE, marker);
    if !status.player_reachable {
        fill_rect(&mut dt, 14.0 + MARKER_SIZE, 10.0, MARKER_SIZE, MARKER_SIZE, IDLE_COLOR);
    }

    let pixels: Vec<u8> = dt
        .get_data()
        .iter()
        .flat_map(|&pixel| {
            let [b, g, r, a] = pixel.to_le_bytes();
            [r, g, b, a]
        })
        .collect();

    ImageBuffer::from_raw(img_width, img_height, pixels)
        .map(DynamicImage::ImageRgba8)
        .ok_or_else(|| Error::Overlay(format!("绘制结果尺寸不匹配 {}x{}", img_width, img_height)))
}

/// 保存叠加帧，格式由扩展名决定
pub fn save_overlay(image: &DynamicImage, path: &Path) -> Result<()> {
    image.save(path)?;
    Ok(())
}
