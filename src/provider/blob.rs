//! # Blob 构造能力
//!
//! ## 设计思路
//!
//! 宿主可能提供“原生构造”，也可能只提供旧式“追加式 builder”。
//! 两类能力统一收敛到一个有序的 `BlobProvider` 列表，按优先级依次尝试：
//!
//! ```text
//! Native   ── Ok ──────────────▶ 返回
//!          ── Unsupported ─────▶ 下一个 provider
//!          ── Failed ──────────▶ 原样上抛（不回退）
//! Builder  ── 不可用 ──────────▶ 下一个 provider
//!          ── append… get_blob ▶ 返回
//! 列表耗尽 ───────────────────▶ BlobError::Unsupported("Blob")
//! ```

use std::sync::Arc;

use bytes::BytesMut;

use crate::blob::{Blob, BlobOptions, BlobPart};
use crate::BlobError;

/// 原生构造失败的两种语义。
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConstructError {
    /// 宿主不支持该构造方式，允许回退。
    #[error("不支持: {0}")]
    Unsupported(String),
    /// 其它构造错误，不允许回退。
    #[error("{0}")]
    Failed(String),
}

/// 原生 Blob 构造能力。
pub trait BlobConstructor: Send + Sync {
    fn name(&self) -> &'static str;

    fn construct(&self, parts: &[BlobPart], options: &BlobOptions) -> Result<Blob, ConstructError>;
}

/// 追加式 builder：按顺序累积，最后以指定类型定稿。
pub trait BlobBuilder {
    fn append(&mut self, part: &BlobPart);

    fn get_blob(self: Box<Self>, media_type: &str) -> Blob;
}

/// builder 工厂；返回 `None` 表示宿主没有这一实现。
pub trait BlobBuilderFactory: Send + Sync {
    fn name(&self) -> &'static str;

    fn new_builder(&self) -> Option<Box<dyn BlobBuilder>>;
}

/// 进程内原生实现，总是可用。
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeBlobConstructor;

impl BlobConstructor for NativeBlobConstructor {
    fn name(&self) -> &'static str {
        "Blob"
    }

    fn construct(&self, parts: &[BlobPart], options: &BlobOptions) -> Result<Blob, ConstructError> {
        Ok(Blob::from_parts(parts, options.media_type()))
    }
}

/// 基于 `BytesMut` 的追加式 builder。
#[derive(Debug, Default)]
pub struct AppendBlobBuilder {
    buf: BytesMut,
}

impl BlobBuilder for AppendBlobBuilder {
    fn append(&mut self, part: &BlobPart) {
        self.buf.extend_from_slice(part.as_bytes());
    }

    fn get_blob(self: Box<Self>, media_type: &str) -> Blob {
        Blob::new(self.buf.freeze(), media_type)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AppendBlobBuilderFactory;

impl BlobBuilderFactory for AppendBlobBuilderFactory {
    fn name(&self) -> &'static str {
        "BlobBuilder"
    }

    fn new_builder(&self) -> Option<Box<dyn BlobBuilder>> {
        Some(Box::new(AppendBlobBuilder::default()))
    }
}

/// 单个构造能力条目。
#[derive(Clone)]
pub enum BlobProvider {
    Native(Arc<dyn BlobConstructor>),
    Builder(Arc<dyn BlobBuilderFactory>),
}

impl BlobProvider {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Native(native) => native.name(),
            Self::Builder(factory) => factory.name(),
        }
    }
}

/// 按优先级排列的构造能力列表。
#[derive(Clone)]
pub struct BlobProviders {
    providers: Vec<BlobProvider>,
}

impl Default for BlobProviders {
    fn default() -> Self {
        Self::new(vec![
            BlobProvider::Native(Arc::new(NativeBlobConstructor)),
            BlobProvider::Builder(Arc::new(AppendBlobBuilderFactory)),
        ])
    }
}

impl BlobProviders {
    pub fn new(providers: Vec<BlobProvider>) -> Self {
        Self { providers }
    }

    pub fn push(&mut self, provider: BlobProvider) {
        self.providers.push(provider);
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.providers.iter().map(BlobProvider::name).collect()
    }

    /// 依次尝试各 provider 构造 Blob。
    pub fn create_blob(&self, parts: &[BlobPart], options: &BlobOptions) -> Result<Blob, BlobError> {
        for provider in &self.providers {
            match provider {
                BlobProvider::Native(native) => match native.construct(parts, options) {
                    Ok(blob) => {
                        log::debug!("🧱 {} 构造成功 - {} bytes", native.name(), blob.size());
                        return Ok(blob);
                    }
                    Err(ConstructError::Unsupported(reason)) => {
                        log::warn!("⚠️ {} 不可用，尝试下一个构造方式：{}", native.name(), reason);
                    }
                    Err(ConstructError::Failed(message)) => {
                        return Err(BlobError::Construction(message));
                    }
                },
                BlobProvider::Builder(factory) => {
                    let Some(mut builder) = factory.new_builder() else {
                        log::debug!("{} 不可用，跳过", factory.name());
                        continue;
                    };
                    for part in parts {
                        builder.append(part);
                    }
                    let blob = builder.get_blob(options.media_type());
                    log::debug!("🧱 {} 回退构造成功 - {} bytes", factory.name(), blob.size());
                    return Ok(blob);
                }
            }
        }

        Err(BlobError::Unsupported("Blob".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct RejectingConstructor(ConstructError);

    impl BlobConstructor for RejectingConstructor {
        fn name(&self) -> &'static str {
            "rejecting"
        }

        fn construct(&self, _parts: &[BlobPart], _options: &BlobOptions) -> Result<Blob, ConstructError> {
            Err(self.0.clone())
        }
    }

    #[derive(Default)]
    struct CountingFactory {
        created: AtomicUsize,
    }

    impl BlobBuilderFactory for CountingFactory {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn new_builder(&self) -> Option<Box<dyn BlobBuilder>> {
            self.created.fetch_add(1, Ordering::SeqCst);
            Some(Box::new(AppendBlobBuilder::default()))
        }
    }

    struct MissingFactory;

    impl BlobBuilderFactory for MissingFactory {
        fn name(&self) -> &'static str {
            "missing"
        }

        fn new_builder(&self) -> Option<Box<dyn BlobBuilder>> {
            None
        }
    }

    fn parts() -> Vec<BlobPart> {
        vec![BlobPart::from("fo"), BlobPart::from("o")]
    }

    #[test]
    fn native_provider_wins_when_supported() {
        let blob = BlobProviders::default()
            .create_blob(&parts(), &BlobOptions::from("text/plain"))
            .expect("create blob failed");

        assert_eq!(blob.bytes().as_ref(), b"foo");
        assert_eq!(blob.media_type(), "text/plain");
    }

    #[test]
    fn unsupported_native_falls_back_to_builder() {
        let factory = Arc::new(CountingFactory::default());
        let providers = BlobProviders::new(vec![
            BlobProvider::Native(Arc::new(RejectingConstructor(ConstructError::Unsupported(
                "TypeError".to_string(),
            )))),
            BlobProvider::Builder(Arc::new(MissingFactory)),
            BlobProvider::Builder(factory.clone()),
        ]);

        let blob = providers
            .create_blob(&parts(), &BlobOptions::from("text/plain"))
            .expect("fallback should succeed");

        assert_eq!(blob.bytes().as_ref(), b"foo");
        assert_eq!(blob.media_type(), "text/plain");
        assert_eq!(factory.created.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn other_native_errors_are_reraised_without_fallback() {
        let factory = Arc::new(CountingFactory::default());
        let providers = BlobProviders::new(vec![
            BlobProvider::Native(Arc::new(RejectingConstructor(ConstructError::Failed(
                "quota exceeded".to_string(),
            )))),
            BlobProvider::Builder(factory.clone()),
        ]);

        let result = providers.create_blob(&parts(), &BlobOptions::default());

        assert!(matches!(result, Err(BlobError::Construction(msg)) if msg == "quota exceeded"));
        assert_eq!(factory.created.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn no_capability_means_blob_unsupported() {
        let providers = BlobProviders::new(vec![
            BlobProvider::Native(Arc::new(RejectingConstructor(ConstructError::Unsupported(
                "TypeError".to_string(),
            )))),
            BlobProvider::Builder(Arc::new(MissingFactory)),
        ]);

        let err = providers
            .create_blob(&parts(), &BlobOptions::default())
            .expect_err("nothing can build a blob");

        assert_eq!(err.to_string(), "Blob unsupported");
    }
}
