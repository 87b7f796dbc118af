//! # 异步字节读取能力
//!
//! 对应宿主的异步文件读取：读取完成后回调一次，结果可能为空（`None`）。
//! 空结果由调用方决定默认值（空缓冲 / 空字符串）。

use std::future::Future;

use bytes::Bytes;

use crate::blob::Blob;
use crate::codec::array_buffer_to_binary_string;

/// 读取失败，原样透传给调用方。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("读取 Blob 失败: {0}")]
pub struct ReadError(pub String);

/// 异步读取 Blob 内容的能力。
pub trait AsyncByteReader: Send + Sync {
    /// 是否支持直接读出二进制字符串。
    fn supports_binary_string(&self) -> bool {
        false
    }

    fn read_as_binary_string(
        &self,
        _blob: &Blob,
    ) -> impl Future<Output = Result<Option<String>, ReadError>> + Send {
        async { Err(ReadError("不支持以二进制字符串读取".to_string())) }
    }

    fn read_as_array_buffer(
        &self,
        blob: &Blob,
    ) -> impl Future<Output = Result<Option<Bytes>, ReadError>> + Send;
}

/// 进程内读取器：让出一次调度后返回 Blob 内容。
#[derive(Debug, Clone, Copy)]
pub struct BlobReader {
    binary_string_mode: bool,
}

impl Default for BlobReader {
    fn default() -> Self {
        Self {
            binary_string_mode: true,
        }
    }
}

impl BlobReader {
    /// 只支持读取为字节缓冲的读取器。
    pub fn array_buffer_only() -> Self {
        Self {
            binary_string_mode: false,
        }
    }
}

impl AsyncByteReader for BlobReader {
    fn supports_binary_string(&self) -> bool {
        self.binary_string_mode
    }

    async fn read_as_binary_string(&self, blob: &Blob) -> Result<Option<String>, ReadError> {
        if !self.binary_string_mode {
            return Err(ReadError("不支持以二进制字符串读取".to_string()));
        }
        tokio::task::yield_now().await;
        Ok(Some(array_buffer_to_binary_string(blob.bytes())))
    }

    async fn read_as_array_buffer(&self, blob: &Blob) -> Result<Option<Bytes>, ReadError> {
        tokio::task::yield_now().await;
        Ok(Some(blob.bytes().clone()))
    }
}
