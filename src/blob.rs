//! # Blob 数据模型
//!
//! ## 设计思路
//!
//! `Blob` 是不可变、带媒体类型标签的字节序列，内部用 `bytes::Bytes` 保存，
//! 克隆只增加引用计数。每次转换调用只是借用或产出 `Blob`，不会跨调用持有。
//!
//! 媒体类型按 File API 规则规范化：ASCII 小写；
//! 出现 U+0020..U+007E 以外的字符时整体置为空串。

use std::fmt;

use bytes::{Bytes, BytesMut};

/// 不可变字节序列 + 媒体类型。
#[derive(Clone, PartialEq, Eq)]
pub struct Blob {
    bytes: Bytes,
    media_type: String,
}

impl Blob {
    /// 由原始字节与媒体类型创建。
    pub fn new(bytes: impl Into<Bytes>, media_type: &str) -> Self {
        Self {
            bytes: bytes.into(),
            media_type: normalize_media_type(media_type),
        }
    }

    /// 无类型 Blob（`type == ""`）。
    pub fn untyped(bytes: impl Into<Bytes>) -> Self {
        Self::new(bytes, "")
    }

    /// 按顺序拼接各部分。
    pub fn from_parts(parts: &[BlobPart], media_type: &str) -> Self {
        let capacity = parts.iter().map(BlobPart::len).sum();
        let mut buf = BytesMut::with_capacity(capacity);
        for part in parts {
            buf.extend_from_slice(part.as_bytes());
        }
        Self::new(buf.freeze(), media_type)
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }
}

impl fmt::Debug for Blob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Blob")
            .field("size", &self.bytes.len())
            .field("media_type", &self.media_type)
            .finish()
    }
}

fn normalize_media_type(media_type: &str) -> String {
    if media_type.chars().all(|c| (' '..='~').contains(&c)) {
        media_type.to_ascii_lowercase()
    } else {
        String::new()
    }
}

/// Blob 的组成部分。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlobPart {
    /// 文本，按 UTF-8 编码写入。
    Text(String),
    /// 原始字节。
    Bytes(Bytes),
    /// 已有 Blob 的全部内容。
    Blob(Blob),
}

impl BlobPart {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(text) => text.as_bytes(),
            Self::Bytes(bytes) => bytes,
            Self::Blob(blob) => blob.bytes(),
        }
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<&str> for BlobPart {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for BlobPart {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Bytes> for BlobPart {
    fn from(bytes: Bytes) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<Vec<u8>> for BlobPart {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(Bytes::from(bytes))
    }
}

impl From<&[u8]> for BlobPart {
    fn from(bytes: &[u8]) -> Self {
        Self::Bytes(Bytes::copy_from_slice(bytes))
    }
}

impl From<Blob> for BlobPart {
    fn from(blob: Blob) -> Self {
        Self::Blob(blob)
    }
}

/// 构造选项；裸字符串视为媒体类型。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlobOptions {
    pub media_type: Option<String>,
}

impl BlobOptions {
    pub fn typed(media_type: impl Into<String>) -> Self {
        Self {
            media_type: Some(media_type.into()),
        }
    }

    pub fn media_type(&self) -> &str {
        self.media_type.as_deref().unwrap_or("")
    }
}

impl From<&str> for BlobOptions {
    fn from(media_type: &str) -> Self {
        Self::typed(media_type)
    }
}

impl From<String> for BlobOptions {
    fn from(media_type: String) -> Self {
        Self::typed(media_type)
    }
}

impl From<Option<&str>> for BlobOptions {
    fn from(media_type: Option<&str>) -> Self {
        Self {
            media_type: media_type.map(str::to_string),
        }
    }
}
