//! # 默认实例与自由函数
//!
//! 进程级懒加载的默认 `BlobUtil`，以及与其方法同名的自由函数，
//! 方便不需要注入能力的调用方直接使用。

use bytes::Bytes;
use once_cell::sync::Lazy;

use crate::BlobError;
use crate::blob::{Blob, BlobOptions, BlobPart};
use crate::image_handler::{CrossOrigin, RenderSurface};
use crate::util::BlobUtil;

pub use crate::codec::{array_buffer_to_binary_string, binary_string_to_array_buffer};

static DEFAULT: Lazy<Result<BlobUtil, String>> = Lazy::new(|| {
    BlobUtil::new().map_err(|e| {
        log::error!("❌ 默认 BlobUtil 初始化失败：{}", e);
        e.to_string()
    })
});

/// 默认实例。初始化失败时每次调用都会返回同一错误。
pub fn default_util() -> Result<&'static BlobUtil, BlobError> {
    DEFAULT
        .as_ref()
        .map_err(|e| BlobError::Config(format!("默认实例初始化失败：{}", e)))
}

pub fn create_blob(parts: &[BlobPart], options: impl Into<BlobOptions>) -> Result<Blob, BlobError> {
    default_util()?.create_blob(parts, options)
}

pub fn create_object_url(blob: &Blob) -> Result<String, BlobError> {
    default_util()?.create_object_url(blob)
}

pub fn revoke_object_url(url: &str) -> Result<(), BlobError> {
    default_util()?.revoke_object_url(url)
}

pub async fn blob_to_binary_string(blob: &Blob) -> Result<String, BlobError> {
    default_util()?.blob_to_binary_string(blob).await
}

pub async fn blob_to_array_buffer(blob: &Blob) -> Result<Bytes, BlobError> {
    default_util()?.blob_to_array_buffer(blob).await
}

pub fn base64_string_to_blob(base64: &str, media_type: Option<&str>) -> Result<Blob, BlobError> {
    default_util()?.base64_string_to_blob(base64, media_type)
}

pub fn binary_string_to_blob(binary: &str, media_type: Option<&str>) -> Result<Blob, BlobError> {
    default_util()?.binary_string_to_blob(binary, media_type)
}

pub async fn blob_to_base64_string(blob: &Blob) -> Result<String, BlobError> {
    default_util()?.blob_to_base64_string(blob).await
}

pub async fn blob_to_data_url(blob: &Blob) -> Result<String, BlobError> {
    default_util()?.blob_to_data_url(blob).await
}

pub fn data_url_to_blob(data_url: &str) -> Result<Blob, BlobError> {
    default_util()?.data_url_to_blob(data_url)
}

pub fn array_buffer_to_blob(buffer: impl Into<Bytes>, media_type: Option<&str>) -> Result<Blob, BlobError> {
    default_util()?.array_buffer_to_blob(buffer, media_type)
}

pub async fn img_src_to_data_url(
    src: &str,
    media_type: Option<&str>,
    cross_origin: Option<CrossOrigin>,
    quality: Option<f64>,
) -> Result<String, BlobError> {
    default_util()?
        .img_src_to_data_url(src, media_type, cross_origin, quality)
        .await
}

pub async fn canvas_to_blob<S: RenderSurface>(
    surface: &S,
    media_type: Option<&str>,
    quality: Option<f64>,
) -> Result<Blob, BlobError> {
    default_util()?.canvas_to_blob(surface, media_type, quality).await
}

pub async fn img_src_to_blob(
    src: &str,
    media_type: Option<&str>,
    cross_origin: Option<CrossOrigin>,
    quality: Option<f64>,
) -> Result<Blob, BlobError> {
    default_util()?
        .img_src_to_blob(src, media_type, cross_origin, quality)
        .await
}
