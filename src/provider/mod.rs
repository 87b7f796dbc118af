//! # 宿主能力（provider）
//!
//! 原本散落在宿主全局对象上的能力，统一抽象为可注入的 trait：
//!
//! - `blob`：Blob 构造（原生 + 追加式 builder 回退）
//! - `url`：Object URL 注册表
//! - `reader`：异步字节读取
//!
//! 图片解码与绘制表面属于 `image_handler`，base64 属于 `codec`。

mod blob;
mod reader;
mod url;

pub use blob::{
    AppendBlobBuilder, AppendBlobBuilderFactory, BlobBuilder, BlobBuilderFactory, BlobConstructor,
    BlobProvider, BlobProviders, ConstructError, NativeBlobConstructor,
};
pub use reader::{AsyncByteReader, BlobReader, ReadError};
pub use url::{MemoryUrlRegistry, OBJECT_URL_SCHEME, ObjectUrlRegistry, UrlRegistries};
