//! # 解码流水线模块
//!
//! ## 设计思路
//!
//! 将“字节 → 图像”的过程集中管理，并在关键节点增加资源上限控制。
//! 优先做尺寸检查，再进行完整解码，降低恶意输入触发高内存开销的风险。
//!
//! ## 实现思路
//!
//! 1. 文件签名校验（`infer`），拒绝非图片内容
//! 2. 读取 header 尺寸，按像素 / 内存上限快速拒绝
//! 3. 完整解码；动图只保留首帧
//! 4. 再次核对解码后尺寸

use std::io::Cursor;

use image::GenericImageView;

use super::source::{LoadedImage, RawImageData};
use super::{ImageConfig, ImageError};

/// 将原始字节解码为可绘制的首帧图像。
pub(crate) fn decode_first_frame(
    raw: RawImageData,
    config: &ImageConfig,
) -> Result<LoadedImage, ImageError> {
    validate_image_signature(&raw.bytes)?;

    let (header_width, header_height) = inspect_dimensions_from_memory(&raw.bytes)?;
    validate_pixel_limits(config, header_width, header_height)?;
    validate_decoded_memory_limits(config, header_width, header_height)?;

    let decoded = image::load_from_memory(&raw.bytes)
        .map_err(|e| ImageError::Decode(format!("图片解码失败：{}", e)))?;

    let (width, height) = decoded.dimensions();
    validate_pixel_limits(config, width, height)?;

    log::debug!(
        "🖼️ 图片解码成功 - 来源: {} 尺寸: {}x{} 同源: {}",
        raw.source_hint,
        width,
        height,
        raw.origin_clean
    );

    Ok(LoadedImage::new(decoded, raw.origin_clean))
}

/// 通过文件签名（magic bytes）校验输入是否为图片。
pub(crate) fn validate_image_signature(bytes: &[u8]) -> Result<(), ImageError> {
    if bytes.is_empty() {
        return Err(ImageError::InvalidFormat("图片内容为空".to_string()));
    }

    let kind = infer::get(bytes)
        .ok_or_else(|| ImageError::InvalidFormat("无法识别图片类型".to_string()))?;

    if kind.matcher_type() != infer::MatcherType::Image {
        return Err(ImageError::InvalidFormat(format!(
            "文件签名不是图片类型：{}",
            kind.mime_type()
        )));
    }

    Ok(())
}

/// 仅通过图片头信息读取宽高。
fn inspect_dimensions_from_memory(bytes: &[u8]) -> Result<(u32, u32), ImageError> {
    image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| ImageError::InvalidFormat(format!("无法识别图片格式：{}", e)))?
        .into_dimensions()
        .map_err(|e| ImageError::InvalidFormat(format!("无法读取图片尺寸：{}", e)))
}

fn validate_pixel_limits(config: &ImageConfig, width: u32, height: u32) -> Result<(), ImageError> {
    let pixels = u64::from(width) * u64::from(height);

    if pixels > config.max_decoded_pixels {
        return Err(ImageError::ResourceLimit(format!(
            "图片像素过大：{} 像素（限制：{} 像素）",
            pixels, config.max_decoded_pixels
        )));
    }

    Ok(())
}

fn validate_decoded_memory_limits(
    config: &ImageConfig,
    width: u32,
    height: u32,
) -> Result<(), ImageError> {
    let estimated = (u64::from(width) * u64::from(height))
        .checked_mul(4)
        .ok_or_else(|| ImageError::ResourceLimit("图片解码内存估算溢出".to_string()))?;

    if estimated > config.max_decoded_bytes {
        return Err(ImageError::ResourceLimit(format!(
            "图片解码预计内存过大：{:.2} MB（限制：{:.2} MB）",
            estimated as f64 / 1024.0 / 1024.0,
            config.max_decoded_bytes as f64 / 1024.0 / 1024.0
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use image::{DynamicImage, ImageBuffer, ImageFormat, Rgba};

    fn create_png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = ImageBuffer::from_fn(width, height, |x, y| {
            Rgba([(x % 255) as u8, (y % 255) as u8, ((x + y) % 255) as u8, 255])
        });

        let mut cursor = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img)
            .write_to(&mut cursor, ImageFormat::Png)
            .expect("failed to encode test image");
        cursor.into_inner()
    }

    fn raw(bytes: Vec<u8>) -> RawImageData {
        RawImageData {
            bytes: Bytes::from(bytes),
            source_hint: "test",
            origin_clean: true,
        }
    }

    #[test]
    fn decodes_natural_dimensions() {
        let loaded = decode_first_frame(raw(create_png_bytes(7, 3)), &ImageConfig::default())
            .expect("decode should succeed");

        assert_eq!(loaded.dimensions(), (7, 3));
        assert!(loaded.is_origin_clean());
    }

    #[test]
    fn rejects_too_many_pixels_before_decode() {
        let config = ImageConfig {
            max_decoded_pixels: 100,
            ..ImageConfig::default()
        };

        let result = decode_first_frame(raw(create_png_bytes(20, 20)), &config);

        assert!(matches!(result, Err(ImageError::ResourceLimit(_))));
    }

    #[test]
    fn rejects_non_image_payload() {
        let result = decode_first_frame(raw(b"<html>not an image</html>".to_vec()), &ImageConfig::default());
        assert!(matches!(result, Err(ImageError::InvalidFormat(_))));
    }

    #[test]
    fn rejects_empty_payload() {
        assert!(matches!(
            validate_image_signature(&[]),
            Err(ImageError::InvalidFormat(_))
        ));
    }
}
