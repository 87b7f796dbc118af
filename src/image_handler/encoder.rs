//! # 导出编码
//!
//! 表面像素 → 目标格式字节。支持 `image/png`、`image/jpeg`、`image/webp`（无损）；
//! 其它类型一律回退为 PNG，输出的媒体类型也随之变为 `image/png`。
//! JPEG 不带透明通道，透明像素按“合成到黑色背景”处理。

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbaImage};

use super::ImageError;

pub const DEFAULT_EXPORT_TYPE: &str = "image/png";

/// 实际使用的导出格式。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Png,
    Jpeg,
    WebP,
}

impl ExportFormat {
    /// 解析请求的媒体类型，不支持的类型回退 PNG。
    pub fn resolve(media_type: Option<&str>) -> Self {
        match media_type.map(|t| t.trim().to_ascii_lowercase()).as_deref() {
            Some("image/jpeg") => Self::Jpeg,
            Some("image/webp") => Self::WebP,
            _ => Self::Png,
        }
    }

    pub fn media_type(self) -> &'static str {
        match self {
            Self::Png => DEFAULT_EXPORT_TYPE,
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
        }
    }
}

/// 编码结果。
pub(crate) struct EncodedImage {
    pub(crate) format: ExportFormat,
    pub(crate) bytes: Vec<u8>,
}

/// 质量取值：0..=1 的有限数，否则使用默认值。
pub(crate) fn jpeg_quality(quality: Option<f64>, default_quality: f64) -> u8 {
    let q = quality
        .filter(|q| q.is_finite() && (0.0..=1.0).contains(q))
        .unwrap_or(default_quality);
    (q * 100.0).round().clamp(1.0, 100.0) as u8
}

pub(crate) fn encode(
    pixels: &RgbaImage,
    media_type: Option<&str>,
    quality: Option<f64>,
    default_quality: f64,
) -> Result<EncodedImage, ImageError> {
    let format = ExportFormat::resolve(media_type);
    let (width, height) = pixels.dimensions();
    let mut bytes = Vec::new();

    match format {
        ExportFormat::Png => PngEncoder::new(&mut bytes)
            .write_image(pixels.as_raw(), width, height, ExtendedColorType::Rgba8)
            .map_err(|e| ImageError::Encode(format!("PNG 编码失败：{}", e)))?,
        ExportFormat::Jpeg => {
            let rgb = composite_on_black(pixels);
            JpegEncoder::new_with_quality(&mut bytes, jpeg_quality(quality, default_quality))
                .write_image(&rgb, width, height, ExtendedColorType::Rgb8)
                .map_err(|e| ImageError::Encode(format!("JPEG 编码失败：{}", e)))?
        }
        ExportFormat::WebP => WebPEncoder::new_lossless(&mut bytes)
            .write_image(pixels.as_raw(), width, height, ExtendedColorType::Rgba8)
            .map_err(|e| ImageError::Encode(format!("WebP 编码失败：{}", e)))?,
    }

    log::debug!(
        "🧪 导出编码完成 - {} {}x{} {} bytes",
        format.media_type(),
        width,
        height,
        bytes.len()
    );

    Ok(EncodedImage { format, bytes })
}

fn composite_on_black(pixels: &RgbaImage) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(pixels.as_raw().len() / 4 * 3);
    for pixel in pixels.pixels() {
        let [r, g, b, a] = pixel.0;
        let alpha = u16::from(a);
        for channel in [r, g, b] {
            rgb.push(((u16::from(channel) * alpha + 127) / 255) as u8);
        }
    }
    rgb
}
