//! # 转换门面（BlobUtil）
//!
//! ## 设计思路
//!
//! `BlobUtil` 持有每种宿主能力的一个实例，并把所有公开转换操作暴露为方法：
//! 同步转换直接返回 `Result`，依赖宿主读取 / 加载 / 导出的转换为 `async fn`。
//! 能力通过泛型参数注入，默认全部是进程内实现。
//!
//! ## 实现思路
//!
//! - Blob 构造统一走 `BlobProviders`（原生优先，Builder 回退）。
//! - Object URL 注册表与图片加载器共享，`blob:` 地址可直接作为图片来源。
//! - 图片链路记录 `load/paint/export/total` 阶段耗时，便于性能诊断。
//! - 任一环节失败即向上传播，不重试、不返回部分结果。

use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;

use crate::BlobError;
use crate::blob::{Blob, BlobOptions, BlobPart};
use crate::codec::{Base64Codec, StandardBase64, array_buffer_to_binary_string, encode_binary_string};
use crate::data_url::{DataUrl, format_data_url};
use crate::image_handler::{
    CanvasSurfaceFactory, CrossOrigin, DEFAULT_EXPORT_TYPE, ImageConfig, ImageDecoder, ImageSource,
    LoadedImage, RasterSurfaceFactory, RenderSurface, SourceImageLoader,
};
use crate::provider::{AsyncByteReader, BlobProviders, BlobReader, UrlRegistries};

/// 二进制转换门面。
///
/// # 示例
/// ```rust
/// use blob_util::BlobUtil;
///
/// let util = BlobUtil::new()?;
/// let blob = util.data_url_to_blob("data:text/plain;base64,Zm9v")?;
/// assert_eq!(blob.media_type(), "text/plain");
/// assert_eq!(&blob.bytes()[..], b"foo");
/// # Ok::<(), blob_util::BlobError>(())
/// ```
pub struct BlobUtil<R = BlobReader, D = SourceImageLoader, F = RasterSurfaceFactory> {
    blob_providers: BlobProviders,
    url_registries: UrlRegistries,
    base64: Arc<dyn Base64Codec>,
    reader: R,
    decoder: D,
    surfaces: F,
}

impl BlobUtil {
    /// 使用默认配置创建门面。
    pub fn new() -> Result<Self, BlobError> {
        Self::with_config(ImageConfig::default())
    }

    /// 使用指定图片配置创建门面。
    pub fn with_config(config: ImageConfig) -> Result<Self, BlobError> {
        let url_registries = UrlRegistries::default();
        let surfaces = RasterSurfaceFactory::new(config.default_quality);
        let decoder = SourceImageLoader::new(config, url_registries.clone())?;

        Ok(Self {
            blob_providers: BlobProviders::default(),
            url_registries,
            base64: Arc::new(StandardBase64),
            reader: BlobReader::default(),
            decoder,
            surfaces,
        })
    }
}

impl<R, F> BlobUtil<R, SourceImageLoader, F> {
    /// 替换 Object URL 注册表，并让图片加载器使用同一组注册表。
    pub fn with_url_registries(self, url_registries: UrlRegistries) -> Result<Self, BlobError> {
        let config = self.decoder.config_snapshot()?;
        let decoder = SourceImageLoader::new(config, url_registries.clone())?;

        Ok(Self {
            url_registries,
            decoder,
            ..self
        })
    }
}

impl<R, D, F> BlobUtil<R, D, F> {
    pub fn with_reader<R2: AsyncByteReader>(self, reader: R2) -> BlobUtil<R2, D, F> {
        BlobUtil {
            blob_providers: self.blob_providers,
            url_registries: self.url_registries,
            base64: self.base64,
            reader,
            decoder: self.decoder,
            surfaces: self.surfaces,
        }
    }

    pub fn with_decoder<D2: ImageDecoder>(self, decoder: D2) -> BlobUtil<R, D2, F> {
        BlobUtil {
            blob_providers: self.blob_providers,
            url_registries: self.url_registries,
            base64: self.base64,
            reader: self.reader,
            decoder,
            surfaces: self.surfaces,
        }
    }

    pub fn with_surfaces<F2: CanvasSurfaceFactory>(self, surfaces: F2) -> BlobUtil<R, D, F2> {
        BlobUtil {
            blob_providers: self.blob_providers,
            url_registries: self.url_registries,
            base64: self.base64,
            reader: self.reader,
            decoder: self.decoder,
            surfaces,
        }
    }

    pub fn with_blob_providers(self, blob_providers: BlobProviders) -> Self {
        Self { blob_providers, ..self }
    }

    pub fn with_base64(self, base64: Arc<dyn Base64Codec>) -> Self {
        Self { base64, ..self }
    }

    pub fn url_registries(&self) -> &UrlRegistries {
        &self.url_registries
    }

    pub fn decoder(&self) -> &D {
        &self.decoder
    }
}

impl<R, D, F> BlobUtil<R, D, F>
where
    R: AsyncByteReader,
    D: ImageDecoder,
    F: CanvasSurfaceFactory,
{
    /// 由有序片段构造 Blob；`options` 可直接传媒体类型字符串。
    pub fn create_blob(&self, parts: &[BlobPart], options: impl Into<BlobOptions>) -> Result<Blob, BlobError> {
        self.blob_providers.create_blob(parts, &options.into())
    }

    /// 为 Blob 注册一个 Object URL。
    pub fn create_object_url(&self, blob: &Blob) -> Result<String, BlobError> {
        self.url_registries.create_object_url(blob)
    }

    /// 撤销 Object URL；未知地址视为成功。
    pub fn revoke_object_url(&self, url: &str) -> Result<(), BlobError> {
        self.url_registries.revoke_object_url(url)
    }

    /// 读取为二进制字符串，读取结果为空时返回空字符串。
    pub async fn blob_to_binary_string(&self, blob: &Blob) -> Result<String, BlobError> {
        if self.reader.supports_binary_string() {
            let binary = self.reader.read_as_binary_string(blob).await?;
            return Ok(binary.unwrap_or_default());
        }

        let buffer = self.reader.read_as_array_buffer(blob).await?;
        Ok(buffer
            .map(|bytes| array_buffer_to_binary_string(&bytes))
            .unwrap_or_default())
    }

    /// 读取为字节缓冲，读取结果为空时返回零长度缓冲。
    pub async fn blob_to_array_buffer(&self, blob: &Blob) -> Result<Bytes, BlobError> {
        let buffer = self.reader.read_as_array_buffer(blob).await?;
        Ok(buffer.unwrap_or_default())
    }

    pub fn base64_string_to_blob(&self, base64: &str, media_type: Option<&str>) -> Result<Blob, BlobError> {
        let bytes = Bytes::from(self.base64.decode(base64)?);
        self.array_buffer_to_blob(bytes, media_type)
    }

    pub fn binary_string_to_blob(&self, binary: &str, media_type: Option<&str>) -> Result<Blob, BlobError> {
        let base64 = encode_binary_string(self.base64.as_ref(), binary)?;
        self.base64_string_to_blob(&base64, media_type)
    }

    pub async fn blob_to_base64_string(&self, blob: &Blob) -> Result<String, BlobError> {
        let binary = self.blob_to_binary_string(blob).await?;
        encode_binary_string(self.base64.as_ref(), &binary)
    }

    /// 生成 `data:<blob 类型>;base64,<载荷>`。
    pub async fn blob_to_data_url(&self, blob: &Blob) -> Result<String, BlobError> {
        let base64 = self.blob_to_base64_string(blob).await?;
        Ok(format_data_url(blob.media_type(), &base64))
    }

    pub fn data_url_to_blob(&self, data_url: &str) -> Result<Blob, BlobError> {
        let parsed = DataUrl::parse(data_url)?;
        self.base64_string_to_blob(parsed.payload, Some(parsed.media_type))
    }

    pub fn array_buffer_to_blob(&self, buffer: impl Into<Bytes>, media_type: Option<&str>) -> Result<Blob, BlobError> {
        self.create_blob(&[BlobPart::Bytes(buffer.into())], media_type)
    }

    /// 加载图片并导出为 Data URL，`media_type` 默认 `image/png`。
    pub async fn img_src_to_data_url(
        &self,
        src: &str,
        media_type: Option<&str>,
        cross_origin: Option<CrossOrigin>,
        quality: Option<f64>,
    ) -> Result<String, BlobError> {
        let total_start = Instant::now();
        let media_type = media_type.unwrap_or(DEFAULT_EXPORT_TYPE);

        let load_start = Instant::now();
        let image = self.load_image(src, cross_origin).await?;
        let load_ms = load_start.elapsed().as_millis();

        let paint_start = Instant::now();
        let surface = self.paint_to_surface(&image)?;
        let paint_ms = paint_start.elapsed().as_millis();

        let export_start = Instant::now();
        let data_url = surface.to_data_url(Some(media_type), quality)?;
        let export_ms = export_start.elapsed().as_millis();

        log::info!(
            "✅ 图片已导出为 Data URL - 来源: {} 类型: {} 尺寸: {}x{} | load={}ms paint={}ms export={}ms total={}ms",
            source_hint(src),
            media_type,
            image.width(),
            image.height(),
            load_ms,
            paint_ms,
            export_ms,
            total_start.elapsed().as_millis()
        );

        Ok(data_url)
    }

    /// 优先使用表面的原生 Blob 导出，否则导出 Data URL 再转换。
    pub async fn canvas_to_blob<S: RenderSurface>(
        &self,
        surface: &S,
        media_type: Option<&str>,
        quality: Option<f64>,
    ) -> Result<Blob, BlobError> {
        if surface.supports_to_blob() {
            log::debug!("🎨 使用原生 Blob 导出");
            return Ok(surface.to_blob(media_type, quality).await?);
        }

        log::debug!("🎨 表面不支持原生 Blob 导出，回退到 Data URL");
        let data_url = surface.to_data_url(media_type, quality)?;
        self.data_url_to_blob(&data_url)
    }

    /// 加载图片并导出为 Blob。
    pub async fn img_src_to_blob(
        &self,
        src: &str,
        media_type: Option<&str>,
        cross_origin: Option<CrossOrigin>,
        quality: Option<f64>,
    ) -> Result<Blob, BlobError> {
        let total_start = Instant::now();

        let load_start = Instant::now();
        let image = self.load_image(src, cross_origin).await?;
        let load_ms = load_start.elapsed().as_millis();

        let paint_start = Instant::now();
        let surface = self.paint_to_surface(&image)?;
        let paint_ms = paint_start.elapsed().as_millis();

        let export_start = Instant::now();
        let blob = self.canvas_to_blob(&surface, media_type, quality).await?;
        let export_ms = export_start.elapsed().as_millis();

        log::info!(
            "✅ 图片已导出为 Blob - 来源: {} 类型: {} 大小: {} bytes | load={}ms paint={}ms export={}ms total={}ms",
            source_hint(src),
            blob.media_type(),
            blob.size(),
            load_ms,
            paint_ms,
            export_ms,
            total_start.elapsed().as_millis()
        );

        Ok(blob)
    }

    async fn load_image(&self, src: &str, cross_origin: Option<CrossOrigin>) -> Result<LoadedImage, BlobError> {
        Ok(self.decoder.load_image(src, cross_origin).await?)
    }

    /// 按图片自然尺寸创建表面，并在 (0, 0) 绘制整张图片。
    fn paint_to_surface(&self, image: &LoadedImage) -> Result<F::Surface, BlobError> {
        let mut surface = self.surfaces.create_surface(image.width(), image.height())?;
        surface.draw_image(image, 0, 0);
        Ok(surface)
    }
}

fn source_hint(src: &str) -> &'static str {
    ImageSource::parse(src).map(|source| source.hint()).unwrap_or("unknown")
}
