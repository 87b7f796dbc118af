//! # Object URL 注册表
//!
//! ## 设计思路
//!
//! 标准实现与带厂商前缀的实现统一抽象为 `ObjectUrlRegistry`，
//! 由 `UrlRegistries` 按顺序选出第一个可用者，转发创建 / 撤销 / 解析。
//!
//! ## 实现思路
//!
//! `MemoryUrlRegistry` 用互斥保护的 `HashMap` 保存 `blob:` URL → Blob 的映射，
//! 撤销前都可以解析回原 Blob（图片加载会用到）。撤销未知 URL 视为空操作。

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::blob::Blob;
use crate::BlobError;

pub const OBJECT_URL_SCHEME: &str = "blob:";

/// Object URL 能力。
pub trait ObjectUrlRegistry: Send + Sync {
    fn name(&self) -> &'static str;

    fn is_available(&self) -> bool {
        true
    }

    fn create_object_url(&self, blob: &Blob) -> String;

    fn revoke_object_url(&self, url: &str);

    /// 解析尚未撤销的 URL。
    fn resolve_object_url(&self, url: &str) -> Option<Blob>;
}

/// 进程内注册表。
pub struct MemoryUrlRegistry {
    origin: String,
    seed: u64,
    next_id: AtomicU64,
    entries: Mutex<HashMap<String, Blob>>,
}

impl MemoryUrlRegistry {
    pub fn new(origin: impl Into<String>) -> Self {
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0x9E37_79B9_7F4A_7C15);

        Self {
            origin: origin.into(),
            seed,
            next_id: AtomicU64::new(1),
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryUrlRegistry {
    fn default() -> Self {
        Self::new("null")
    }
}

impl ObjectUrlRegistry for MemoryUrlRegistry {
    fn name(&self) -> &'static str {
        "URL"
    }

    fn create_object_url(&self, blob: &Blob) -> String {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let url = format!("{}{}/{:016x}-{:08x}", OBJECT_URL_SCHEME, self.origin, self.seed, id);

        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(url.clone(), blob.clone());

        log::debug!("🔗 注册 Object URL - {} ({} bytes)", url, blob.size());
        url
    }

    fn revoke_object_url(&self, url: &str) {
        let removed = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(url);

        if removed.is_some() {
            log::debug!("🔗 撤销 Object URL - {}", url);
        }
    }

    fn resolve_object_url(&self, url: &str) -> Option<Blob> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(url)
            .cloned()
    }
}

/// 按优先级排列的注册表列表。
#[derive(Clone)]
pub struct UrlRegistries {
    registries: Vec<Arc<dyn ObjectUrlRegistry>>,
}

impl Default for UrlRegistries {
    fn default() -> Self {
        let registry: Arc<dyn ObjectUrlRegistry> = Arc::new(MemoryUrlRegistry::default());
        Self::new(vec![registry])
    }
}

impl UrlRegistries {
    pub fn new(registries: Vec<Arc<dyn ObjectUrlRegistry>>) -> Self {
        Self { registries }
    }

    /// 第一个可用的注册表。
    pub fn select(&self) -> Result<&Arc<dyn ObjectUrlRegistry>, BlobError> {
        self.registries
            .iter()
            .find(|registry| registry.is_available())
            .ok_or_else(|| BlobError::Unsupported("URL".to_string()))
    }

    pub fn create_object_url(&self, blob: &Blob) -> Result<String, BlobError> {
        Ok(self.select()?.create_object_url(blob))
    }

    pub fn revoke_object_url(&self, url: &str) -> Result<(), BlobError> {
        self.select()?.revoke_object_url(url);
        Ok(())
    }

    pub fn resolve_object_url(&self, url: &str) -> Option<Blob> {
        self.select().ok()?.resolve_object_url(url)
    }
}
