//! 统一错误类型模块
//!
//! # 设计思路
//!
//! 定义全局统一的 `BlobError` 枚举，所有转换函数统一返回 `Result<T, BlobError>`。
//! 同步函数直接返回 `Err`，异步函数以 `Err` 结束 future，不做重试或兜底。
//!
//! # 实现思路
//!
//! - 使用 `thiserror` 派生可读错误消息。
//! - 为 `ImageError` / `ReadError` / `DecodeError` 提供 `From` 转换，调用侧直接 `?`。
//! - `code()` 输出稳定的机器可读错误码，便于调用方按分支处理。

use crate::image_handler::ImageError;
use crate::provider::ReadError;

/// 库级统一错误类型
#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    /// 没有任何可用的 Blob 构造 / Object URL 能力
    #[error("{0} unsupported")]
    Unsupported(String),

    /// Data URL 缺少 `data:<media-type>` 段
    #[error("Data URL 格式不匹配: {0}")]
    DataUrlMismatch(String),

    /// 二进制字符串中出现超出 U+00FF 的字符
    #[error("二进制字符串第 {index} 个字符超出 Latin-1 范围: {ch:?}")]
    InvalidCharacter { index: usize, ch: char },

    /// Base64 载荷非法
    #[error("Base64 解码失败: {0}")]
    Base64(#[from] base64::DecodeError),

    /// 非“能力不支持”类的构造错误，原样上抛
    #[error("Blob 构造失败: {0}")]
    Construction(String),

    /// 宿主读取失败
    #[error("{0}")]
    Read(#[from] ReadError),

    /// 图片加载 / 解码 / 导出错误
    #[error("{0}")]
    Image(#[from] ImageError),

    /// 文件系统 I/O 错误
    #[error("文件系统错误: {0}")]
    Io(#[from] std::io::Error),

    /// 配置非法
    #[error("配置错误: {0}")]
    Config(String),
}

impl BlobError {
    /// 稳定错误码。
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unsupported(_) => "unsupported",
            Self::DataUrlMismatch(_) => "data_url_mismatch",
            Self::InvalidCharacter { .. } => "invalid_character",
            Self::Base64(_) => "base64",
            Self::Construction(_) => "construction",
            Self::Read(_) => "read",
            Self::Image(err) => err.code(),
            Self::Io(_) => "io",
            Self::Config(_) => "config",
        }
    }
}

impl From<BlobError> for String {
    fn from(error: BlobError) -> Self {
        error.to_string()
    }
}
