//! # 绘制表面
//!
//! ## 设计思路
//!
//! 画布能力拆成两层：`CanvasSurfaceFactory` 负责按尺寸创建表面，
//! `RenderSurface` 负责绘制与导出。异步导出 Blob 是可选能力，
//! 不支持时由调用方回退为“导出 Data URL 再转 Blob”。
//!
//! ## 实现思路
//!
//! `RasterSurface` 以 `RgbaImage` 为像素缓冲：
//! - 绘制跨域且未经 CORS 放行的图片后，表面被标记为已污染，之后任何导出都失败
//! - 零面积表面导出 Data URL 时返回 `data:,`
//! - 异步导出在 `spawn_blocking` 中编码，避免阻塞调度线程

use std::future::Future;

use image::{RgbaImage, imageops};

use super::encoder::{self, EncodedImage};
use super::source::LoadedImage;
use super::ImageError;
use crate::blob::Blob;
use crate::codec::{Base64Codec, StandardBase64};
use crate::data_url::format_data_url;

/// 零面积表面的 Data URL。
pub const EMPTY_DATA_URL: &str = "data:,";

/// 2D 绘制表面。
pub trait RenderSurface: Send + Sync {
    fn width(&self) -> u32;

    fn height(&self) -> u32;

    /// 在 (`x`, `y`) 处以自然尺寸绘制整张图片。
    fn draw_image(&mut self, image: &LoadedImage, x: i64, y: i64);

    fn to_data_url(&self, media_type: Option<&str>, quality: Option<f64>) -> Result<String, ImageError>;

    /// 是否支持原生异步导出 Blob。
    fn supports_to_blob(&self) -> bool {
        false
    }

    fn to_blob(
        &self,
        _media_type: Option<&str>,
        _quality: Option<f64>,
    ) -> impl Future<Output = Result<Blob, ImageError>> + Send {
        async { Err(ImageError::Encode("表面不支持异步导出 Blob".to_string())) }
    }
}

/// 按尺寸创建绘制表面的能力。
pub trait CanvasSurfaceFactory: Send + Sync {
    type Surface: RenderSurface;

    fn create_surface(&self, width: u32, height: u32) -> Result<Self::Surface, ImageError>;
}

/// 基于 `RgbaImage` 的表面。
#[derive(Debug, Clone)]
pub struct RasterSurface {
    pixels: RgbaImage,
    origin_clean: bool,
    default_quality: f64,
    blob_export: bool,
}

impl RasterSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: RgbaImage::new(width, height),
            origin_clean: true,
            default_quality: 0.92,
            blob_export: true,
        }
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn is_origin_clean(&self) -> bool {
        self.origin_clean
    }

    fn ensure_origin_clean(&self) -> Result<(), ImageError> {
        if self.origin_clean {
            Ok(())
        } else {
            Err(ImageError::Tainted(
                "绘制过未经 CORS 放行的跨域图片，禁止导出".to_string(),
            ))
        }
    }

    fn is_zero_area(&self) -> bool {
        self.pixels.width() == 0 || self.pixels.height() == 0
    }
}

impl RenderSurface for RasterSurface {
    fn width(&self) -> u32 {
        self.pixels.width()
    }

    fn height(&self) -> u32 {
        self.pixels.height()
    }

    fn draw_image(&mut self, image: &LoadedImage, x: i64, y: i64) {
        if !image.is_origin_clean() {
            self.origin_clean = false;
        }
        imageops::overlay(&mut self.pixels, &image.image().to_rgba8(), x, y);
    }

    fn to_data_url(&self, media_type: Option<&str>, quality: Option<f64>) -> Result<String, ImageError> {
        self.ensure_origin_clean()?;
        if self.is_zero_area() {
            return Ok(EMPTY_DATA_URL.to_string());
        }

        let EncodedImage { format, bytes } =
            encoder::encode(&self.pixels, media_type, quality, self.default_quality)?;
        Ok(format_data_url(format.media_type(), &StandardBase64.encode(&bytes)))
    }

    fn supports_to_blob(&self) -> bool {
        self.blob_export
    }

    async fn to_blob(&self, media_type: Option<&str>, quality: Option<f64>) -> Result<Blob, ImageError> {
        self.ensure_origin_clean()?;
        if self.is_zero_area() {
            return Err(ImageError::Encode("零面积表面无法导出 Blob".to_string()));
        }

        let pixels = self.pixels.clone();
        let media_type = media_type.map(str::to_string);
        let default_quality = self.default_quality;

        let EncodedImage { format, bytes } = tokio::task::spawn_blocking(move || {
            encoder::encode(&pixels, media_type.as_deref(), quality, default_quality)
        })
        .await
        .map_err(|e| ImageError::Encode(format!("编码线程执行失败：{}", e)))??;

        Ok(Blob::new(bytes, format.media_type()))
    }
}

/// `RasterSurface` 工厂。
#[derive(Debug, Clone, Copy)]
pub struct RasterSurfaceFactory {
    default_quality: f64,
    blob_export: bool,
}

impl Default for RasterSurfaceFactory {
    fn default() -> Self {
        Self {
            default_quality: 0.92,
            blob_export: true,
        }
    }
}

impl RasterSurfaceFactory {
    pub fn new(default_quality: f64) -> Self {
        Self {
            default_quality,
            ..Self::default()
        }
    }

    /// 关闭原生 Blob 导出，`canvas_to_blob` 将走 Data URL 回退路径。
    pub fn without_blob_export(mut self) -> Self {
        self.blob_export = false;
        self
    }
}

impl CanvasSurfaceFactory for RasterSurfaceFactory {
    type Surface = RasterSurface;

    fn create_surface(&self, width: u32, height: u32) -> Result<RasterSurface, ImageError> {
        u64::from(width)
            .checked_mul(u64::from(height))
            .and_then(|pixels| pixels.checked_mul(4))
            .filter(|bytes| usize::try_from(*bytes).is_ok())
            .ok_or_else(|| ImageError::ResourceLimit(format!("表面尺寸过大：{}x{}", width, height)))?;

        Ok(RasterSurface {
            pixels: RgbaImage::new(width, height),
            origin_clean: true,
            default_quality: self.default_quality,
            blob_export: self.blob_export,
        })
    }
}
