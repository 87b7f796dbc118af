//! # blob-util 库入口
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  api（默认实例 + 自由函数）                              │
//! │       ↓                                                  │
//! │  util::BlobUtil（门面，持有各宿主能力）                  │
//! │       │                                                  │
//! │  ┌────┼──────────────┬──────────────┬─────────────────┐  │
//! │  │ provider          │ codec        │ image_handler   │  │
//! │  │  ├─ blob  构造回退 │  二进制串    │  ├─ loader 加载 │  │
//! │  │  ├─ url   注册表   │  base64      │  ├─ pipeline    │  │
//! │  │  └─ reader 读取    │ data_url     │  └─ surface 导出│  │
//! │  └───────────────────┴──────────────┴─────────────────┘  │
//! │       ↓                                                  │
//! │  error::BlobError（统一错误类型）                        │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | 统一错误类型 `BlobError` |
//! | [`blob`] | 不可变 Blob、片段与构造选项 |
//! | [`codec`] | 二进制字符串 ⇄ 字节缓冲、base64 能力 |
//! | [`data_url`] | Data URL 拆分与拼接 |
//! | [`provider`] | Blob 构造、Object URL 注册表、异步读取等宿主能力 |
//! | [`image_handler`] | 图片加载、解码、绘制表面与导出编码 |
//! | [`util`] | `BlobUtil` 门面 |
//! | [`api`] | 默认实例与同名自由函数 |

pub mod api;
pub mod blob;
pub mod codec;
pub mod data_url;
pub mod error;
pub mod image_handler;
pub mod provider;
pub mod util;

pub use api::*;
pub use blob::{Blob, BlobOptions, BlobPart};
pub use error::BlobError;
pub use image_handler::{CrossOrigin, ImageConfig, ImageError};
pub use util::BlobUtil;
