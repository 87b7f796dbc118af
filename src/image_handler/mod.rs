//! # 图片处理模块（image_handler）
//!
//! ## 设计思路
//!
//! 该模块将“图片来源识别 → 加载校验 → 解码首帧 → 绘制到表面 → 导出编码”
//! 按职责拆分为多个子模块，避免单文件膨胀与耦合。
//!
//! - `source`：`src` 字符串解析、跨域模式、中间数据模型
//! - `loader`：Data URL / Object URL / HTTP / 文件加载与安全校验
//! - `pipeline`：签名校验、像素限制、首帧解码
//! - `surface`：绘制表面与 Data URL / Blob 导出
//! - `encoder`：PNG / JPEG / WebP 编码与质量处理
//! - `config/error`：配置与错误
//!
//! ## 实现思路
//!
//! 宿主能力以 trait 表达（`ImageDecoder`、`CanvasSurfaceFactory`、`RenderSurface`），
//! 默认实现全部在进程内完成，调用方可替换任意一层做测试或接入其它后端。
//!
//! ## 新同事快速上手
//!
//! ```text
//! BlobUtil::img_src_to_blob / img_src_to_data_url
//!    ↓
//! loader.rs（来源加载 + 体积 / CORS 校验）
//!    ↓
//! pipeline.rs（签名 + 像素限制 + 首帧解码，spawn_blocking）
//!    ↓
//! surface.rs（按自然尺寸绘制，跨域图片污染表面）
//!    ↓
//! encoder.rs（导出编码，不支持的类型回退 PNG）
//! ```

mod config;
mod encoder;
mod error;
mod loader;
mod pipeline;
mod source;
mod surface;

pub use config::ImageConfig;
pub use encoder::{DEFAULT_EXPORT_TYPE, ExportFormat};
pub use error::ImageError;
pub use loader::{ImageDecoder, SourceImageLoader};
pub use source::{CrossOrigin, ImageSource, LoadedImage};
pub use surface::{CanvasSurfaceFactory, EMPTY_DATA_URL, RasterSurface, RasterSurfaceFactory, RenderSurface};
