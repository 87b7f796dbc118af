//! # 数据源与中间模型
//!
//! ## 设计思路
//!
//! 将“外部输入类型”和“流水线中间结果”解耦：
//! - `ImageSource` 表示 `src` 字符串解析出的来源语义
//! - `CrossOrigin` 表示调用方请求的跨域模式
//! - `RawImageData` 表示已加载但未解码的字节
//! - `LoadedImage` 表示已解码、可绘制到表面的首帧图像

use std::convert::Infallible;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use bytes::Bytes;
use image::{DynamicImage, GenericImageView};

use super::ImageError;
use crate::provider::OBJECT_URL_SCHEME;

/// 图片输入来源。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// `data:` URL，进程内解码。
    DataUrl(String),
    /// `blob:` Object URL，通过注册表解析。
    ObjectUrl(String),
    /// 网络地址来源。
    Http(reqwest::Url),
    /// 本地文件路径来源（含 `file://`）。
    FilePath(PathBuf),
}

impl ImageSource {
    pub fn parse(src: &str) -> Result<Self, ImageError> {
        let src = src.trim();
        if src.is_empty() {
            return Err(ImageError::InvalidFormat("图片地址为空".to_string()));
        }

        let lower = src.get(..8).unwrap_or(src).to_ascii_lowercase();

        // 协议名不区分大小写，统一成小写后再交给解析 / 注册表
        if lower.starts_with("data:") {
            return Ok(Self::DataUrl(format!("data:{}", &src[5..])));
        }
        if lower.starts_with(OBJECT_URL_SCHEME) {
            return Ok(Self::ObjectUrl(format!(
                "{}{}",
                OBJECT_URL_SCHEME,
                &src[OBJECT_URL_SCHEME.len()..]
            )));
        }
        if lower.starts_with("http://") || lower.starts_with("https://") {
            let url = reqwest::Url::parse(src)
                .map_err(|e| ImageError::InvalidFormat(format!("URL 格式错误：{}", e)))?;
            return Ok(Self::Http(url));
        }
        if lower.starts_with("file://") {
            let path = reqwest::Url::parse(src)
                .ok()
                .and_then(|url| url.to_file_path().ok())
                .ok_or_else(|| ImageError::InvalidFormat(format!("无效的文件 URL：{}", src)))?;
            return Ok(Self::FilePath(path));
        }

        Ok(Self::FilePath(PathBuf::from(src)))
    }

    /// 来源提示（用于日志与诊断）。
    pub fn hint(&self) -> &'static str {
        match self {
            Self::DataUrl(_) => "data-url",
            Self::ObjectUrl(_) => "object-url",
            Self::Http(_) => "http",
            Self::FilePath(_) => "file",
        }
    }
}

/// 跨域模式，对应 `crossorigin` 属性。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrossOrigin {
    Anonymous,
    UseCredentials,
}

impl CrossOrigin {
    /// 按 `crossorigin` 属性取值：缺省或空串表示不启用跨域模式。
    pub fn from_attribute(value: Option<&str>) -> Option<Self> {
        value
            .filter(|v| !v.trim().is_empty())
            .and_then(|v| v.parse().ok())
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Anonymous => "anonymous",
            Self::UseCredentials => "use-credentials",
        }
    }
}

/// 与属性解析一致：只有 `use-credentials` 特殊，其余（含空串）都是匿名。
impl FromStr for CrossOrigin {
    type Err = Infallible;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.trim().eq_ignore_ascii_case("use-credentials") {
            Ok(Self::UseCredentials)
        } else {
            Ok(Self::Anonymous)
        }
    }
}

impl fmt::Display for CrossOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 加载阶段输出：原始字节与来源标识。
pub(crate) struct RawImageData {
    pub(crate) bytes: Bytes,
    pub(crate) source_hint: &'static str,
    /// 是否满足同源（或 CORS 已放行）。
    pub(crate) origin_clean: bool,
}

/// 解码阶段输出：首帧图像。
#[derive(Debug, Clone)]
pub struct LoadedImage {
    image: DynamicImage,
    origin_clean: bool,
}

impl LoadedImage {
    pub fn new(image: DynamicImage, origin_clean: bool) -> Self {
        Self { image, origin_clean }
    }

    /// 自然宽度。
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// 自然高度。
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    pub fn is_origin_clean(&self) -> bool {
        self.origin_clean
    }
}
