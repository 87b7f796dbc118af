//! # 错误模型模块
//!
//! ## 设计思路
//!
//! 使用单一错误枚举承载图片链路（加载 → 解码 → 绘制 → 导出）中的所有错误来源。
//! 通过 `thiserror` 保持人类可读错误，同时让调用侧可按分支匹配。

/// 图片处理统一错误类型。
///
/// 在库入口被上转为 `BlobError::Image`。
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("网络错误：{0}")]
    Network(String),

    #[error("解码错误：{0}")]
    Decode(String),

    #[error("格式错误：{0}")]
    InvalidFormat(String),

    #[error("文件错误：{0}")]
    FileSystem(String),

    #[error("超时错误：{0}")]
    Timeout(String),

    #[error("资源限制：{0}")]
    ResourceLimit(String),

    /// CORS 校验未通过，图片加载失败。
    #[error("跨域加载被拒绝：{0}")]
    CrossOrigin(String),

    /// 画布已被跨域图片污染，禁止导出。
    #[error("画布已被污染：{0}")]
    Tainted(String),

    #[error("资源不存在：{0}")]
    NotFound(String),

    #[error("编码错误：{0}")]
    Encode(String),
}

impl ImageError {
    /// 稳定错误码。
    pub fn code(&self) -> &'static str {
        match self {
            Self::Network(_) => "network",
            Self::Decode(_) => "decode",
            Self::InvalidFormat(_) => "invalid_format",
            Self::FileSystem(_) => "file_system",
            Self::Timeout(_) => "timeout",
            Self::ResourceLimit(_) => "resource_limit",
            Self::CrossOrigin(_) => "cross_origin",
            Self::Tainted(_) => "tainted",
            Self::NotFound(_) => "not_found",
            Self::Encode(_) => "encode",
        }
    }

    /// 出错所在阶段，便于日志归类。
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Network(_)
            | Self::FileSystem(_)
            | Self::Timeout(_)
            | Self::CrossOrigin(_)
            | Self::NotFound(_) => "load",
            Self::Decode(_) | Self::InvalidFormat(_) | Self::ResourceLimit(_) => "decode",
            Self::Tainted(_) | Self::Encode(_) => "export",
        }
    }
}

impl From<ImageError> for String {
    fn from(error: ImageError) -> Self {
        error.to_string()
    }
}
