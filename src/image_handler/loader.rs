//! # 加载与校验模块
//!
//! ## 设计思路
//!
//! 统一处理不同来源（Data URL / Object URL / HTTP / 本地文件）的原始字节加载，
//! 并在“尽可能早”的阶段执行体积校验，尽快失败。
//! 解码放到阻塞线程池，加载完成后整体作为一次“图片就绪”事件返回。
//!
//! ## 实现思路
//!
//! - Data URL：格式解析 + 解码前体积估算 + base64 解码。
//! - Object URL：经注册表解析，已撤销视为不存在。
//! - HTTP：按页面来源判定是否跨域；带跨域模式时附带 `Origin` 并校验 CORS 响应头，
//!   不带跨域模式时允许加载，但结果标记为非同源，绘制后会污染表面。
//!   重定向手动跟随，逐跳重新判定来源，任意一跳跨域即按跨域处理。
//! - 文件：存在性 + metadata 体积限制 + 读取。
//! - 默认不设超时，`download_timeout_secs` 可选开启。

use std::future::Future;
use std::path::Path;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use bytes::Bytes;
use reqwest::header::{
    ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_LENGTH, HeaderMap,
    LOCATION, ORIGIN,
};
use reqwest::redirect;

use super::pipeline;
use super::source::{CrossOrigin, ImageSource, LoadedImage, RawImageData};
use super::{ImageConfig, ImageError};
use crate::codec::{Base64Codec, StandardBase64};
use crate::data_url::DataUrl;
use crate::provider::UrlRegistries;

const BUFFER_INITIAL_CAPACITY: usize = 16 * 1024;

/// 图片解码能力：按 `src` 加载并解码首帧。
pub trait ImageDecoder: Send + Sync {
    fn load_image(
        &self,
        src: &str,
        cross_origin: Option<CrossOrigin>,
    ) -> impl Future<Output = Result<LoadedImage, ImageError>> + Send;
}

/// 默认图片加载器。
pub struct SourceImageLoader {
    config: Arc<RwLock<ImageConfig>>,
    http_client: reqwest::Client,
    registries: UrlRegistries,
}

impl SourceImageLoader {
    /// 根据初始配置创建加载器，`registries` 用于解析 `blob:` 地址。
    pub fn new(config: ImageConfig, registries: UrlRegistries) -> Result<Self, ImageError> {
        config.validate()?;

        // 重定向手动跟随，每一跳都重新判定来源
        let http_client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .redirect(redirect::Policy::none())
            .build()
            .map_err(|e| ImageError::Network(format!("无法创建 HTTP 客户端：{}", e)))?;

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            http_client,
            registries,
        })
    }

    /// 获取配置快照，保证单次加载链路使用一致参数。
    pub fn config_snapshot(&self) -> Result<ImageConfig, ImageError> {
        self.config
            .read()
            .map(|cfg| cfg.clone())
            .map_err(|_| ImageError::ResourceLimit("配置读取锁已中毒".to_string()))
    }

    /// 运行时替换配置；不影响进行中的加载。
    pub fn set_config(&self, config: ImageConfig) -> Result<(), ImageError> {
        config.validate()?;
        let mut guard = self
            .config
            .write()
            .map_err(|_| ImageError::ResourceLimit("配置写入锁已中毒".to_string()))?;
        *guard = config;
        Ok(())
    }

    async fn load_raw(
        &self,
        source: &ImageSource,
        cross_origin: Option<CrossOrigin>,
        config: &ImageConfig,
    ) -> Result<RawImageData, ImageError> {
        match source {
            ImageSource::DataUrl(data_url) => Self::load_from_data_url(data_url, config),
            ImageSource::ObjectUrl(url) => self.load_from_object_url(url, config),
            ImageSource::Http(url) => self.load_from_http(url, cross_origin, config).await,
            ImageSource::FilePath(path) => Self::load_from_file(path, config),
        }
    }

    fn load_from_data_url(data_url: &str, config: &ImageConfig) -> Result<RawImageData, ImageError> {
        let parsed = DataUrl::parse(data_url)
            .map_err(|e| ImageError::InvalidFormat(e.to_string()))?;

        let estimated_len = estimate_base64_decoded_upper_bound_len(parsed.payload);
        if estimated_len > config.max_file_size {
            return Err(ImageError::ResourceLimit(format!(
                "Base64 预计解码体积过大：{:.2} MB（限制：{:.2} MB）",
                estimated_len as f64 / 1024.0 / 1024.0,
                config.max_file_size as f64 / 1024.0 / 1024.0
            )));
        }

        let bytes = StandardBase64
            .decode(parsed.payload)
            .map_err(|e| ImageError::Decode(format!("Base64 解码失败：{}", e)))?;

        Ok(RawImageData {
            bytes: Bytes::from(bytes),
            source_hint: "data-url",
            origin_clean: true,
        })
    }

    fn load_from_object_url(&self, url: &str, config: &ImageConfig) -> Result<RawImageData, ImageError> {
        let blob = self
            .registries
            .resolve_object_url(url)
            .ok_or_else(|| ImageError::NotFound(format!("Object URL 不存在或已撤销：{}", url)))?;

        ensure_within_limit(blob.size() as u64, config)?;

        Ok(RawImageData {
            bytes: blob.into_bytes(),
            source_hint: "object-url",
            origin_clean: true,
        })
    }

    fn load_from_file(path: &Path, config: &ImageConfig) -> Result<RawImageData, ImageError> {
        log::debug!("📁 读取本地图片 - 路径: {}", path.display());

        if !path.exists() {
            return Err(ImageError::FileSystem(format!("文件不存在：{}", path.display())));
        }

        let metadata = std::fs::metadata(path)
            .map_err(|e| ImageError::FileSystem(format!("无法读取文件信息：{}", e)))?;
        ensure_within_limit(metadata.len(), config)?;

        let bytes = std::fs::read(path)
            .map_err(|e| ImageError::FileSystem(format!("无法读取图片文件：{}", e)))?;

        Ok(RawImageData {
            bytes: Bytes::from(bytes),
            source_hint: "file",
            origin_clean: true,
        })
    }

    async fn load_from_http(
        &self,
        url: &reqwest::Url,
        cross_origin: Option<CrossOrigin>,
        config: &ImageConfig,
    ) -> Result<RawImageData, ImageError> {
        log::debug!("🌐 开始下载图片 - URL: {}", redact_url_for_log(url));

        let page_origin = config.normalized_origin();
        let mut request_origin = page_origin.unwrap_or("null").to_string();
        let mut current_url = url.clone();
        // 链路中任意一跳跨域，整张图片即视为跨域
        let mut crossed = false;

        let mut response = None;
        for redirect_count in 0..=config.max_redirects {
            let hop_cross = !is_same_origin(&current_url, page_origin);
            crossed |= hop_cross;
            let cors_mode = cross_origin.filter(|_| crossed);

            let mut request = self.http_client.get(current_url.clone());
            if cors_mode.is_some() {
                request = request.header(ORIGIN, request_origin.as_str());
            }
            if let Some(secs) = config.download_timeout_secs {
                request = request.timeout(Duration::from_secs(secs));
            }

            let hop = request.send().await.map_err(|e| map_reqwest_error(e, config))?;

            if let Some(mode) = cors_mode {
                check_cors(hop.headers(), mode, &request_origin)?;
            }

            if !hop.status().is_redirection() {
                response = Some(hop);
                break;
            }

            if redirect_count >= config.max_redirects {
                return Err(ImageError::Network(format!(
                    "重定向次数超过限制（{}）",
                    config.max_redirects
                )));
            }

            let location = hop
                .headers()
                .get(LOCATION)
                .ok_or_else(|| ImageError::Network("重定向响应缺少 Location 头".to_string()))?
                .to_str()
                .map_err(|e| ImageError::InvalidFormat(format!("重定向地址无效：{}", e)))?;
            let next_url = current_url
                .join(location)
                .map_err(|e| ImageError::InvalidFormat(format!("重定向 URL 解析失败：{}", e)))?;

            if hop_cross && next_url.origin() != current_url.origin() {
                request_origin = "null".to_string();
            }

            log::debug!("↪️ 跳转到: {}", redact_url_for_log(&next_url));
            current_url = next_url;
        }

        let Some(mut response) = response else {
            return Err(ImageError::Network(format!(
                "重定向次数超过限制（{}）",
                config.max_redirects
            )));
        };

        if !response.status().is_success() {
            return Err(ImageError::Network(format!(
                "HTTP {}: {}",
                response.status().as_u16(),
                status_message(response.status().as_u16())
            )));
        }

        let declared_len = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|cl| cl.to_str().ok())
            .and_then(|cl| cl.parse::<u64>().ok());
        if let Some(size) = declared_len {
            ensure_within_limit(size, config)?;
        }

        let initial_capacity = declared_len
            .and_then(|len| usize::try_from(len.min(config.max_file_size)).ok())
            .filter(|len| *len > 0)
            .unwrap_or(BUFFER_INITIAL_CAPACITY);
        let mut buffer = Vec::with_capacity(initial_capacity);

        while let Some(chunk) = response.chunk().await.map_err(|e| map_reqwest_error(e, config))? {
            ensure_within_limit((buffer.len() + chunk.len()) as u64, config)?;
            buffer.extend_from_slice(&chunk);
        }

        let origin_clean = !crossed || cross_origin.is_some();
        log::debug!(
            "✅ 下载完成 - {} bytes 跨域: {} 跨域模式: {:?} 可导出: {}",
            buffer.len(),
            crossed,
            cross_origin,
            origin_clean
        );

        Ok(RawImageData {
            bytes: Bytes::from(buffer),
            source_hint: "http",
            origin_clean,
        })
    }
}

impl ImageDecoder for SourceImageLoader {
    async fn load_image(
        &self,
        src: &str,
        cross_origin: Option<CrossOrigin>,
    ) -> Result<LoadedImage, ImageError> {
        let config = self.config_snapshot()?;
        let source = ImageSource::parse(src)?;

        let raw = self.load_raw(&source, cross_origin, &config).await?;

        tokio::task::spawn_blocking(move || pipeline::decode_first_frame(raw, &config))
            .await
            .map_err(|e| ImageError::Decode(format!("解码线程执行失败：{}", e)))?
    }
}

fn is_same_origin(url: &reqwest::Url, page_origin: Option<&str>) -> bool {
    page_origin.is_some_and(|origin| url.origin().ascii_serialization() == origin)
}

fn ensure_within_limit(size: u64, config: &ImageConfig) -> Result<(), ImageError> {
    if size > config.max_file_size {
        return Err(ImageError::ResourceLimit(format!(
            "文件过大：{:.2} MB（限制：{:.2} MB）",
            size as f64 / 1024.0 / 1024.0,
            config.max_file_size as f64 / 1024.0 / 1024.0
        )));
    }
    Ok(())
}

fn estimate_base64_decoded_upper_bound_len(base64_data: &str) -> u64 {
    let len = base64_data.trim().len() as u64;
    len.div_ceil(4) * 3
}

/// 校验 CORS 响应头。
fn check_cors(headers: &HeaderMap, mode: CrossOrigin, origin: &str) -> Result<(), ImageError> {
    let allow_origin = headers
        .get(ACCESS_CONTROL_ALLOW_ORIGIN)
        .and_then(|v| v.to_str().ok())
        .map(str::trim);

    let allowed = match mode {
        CrossOrigin::Anonymous => matches!(allow_origin, Some(o) if o == "*" || o == origin),
        CrossOrigin::UseCredentials => {
            let allow_credentials = headers
                .get(ACCESS_CONTROL_ALLOW_CREDENTIALS)
                .and_then(|v| v.to_str().ok())
                .is_some_and(|v| v.trim() == "true");
            allow_origin == Some(origin) && allow_credentials
        }
    };

    if allowed {
        Ok(())
    } else {
        Err(ImageError::CrossOrigin(format!(
            "模式 {} 下来源 {} 未被允许（Access-Control-Allow-Origin: {}）",
            mode,
            origin,
            allow_origin.unwrap_or("<缺失>")
        )))
    }
}

/// 日志中去掉 query 与 fragment。
fn redact_url_for_log(url: &reqwest::Url) -> String {
    let mut redacted = url.clone();
    redacted.set_query(None);
    redacted.set_fragment(None);
    redacted.to_string()
}

/// 统一映射 reqwest 错误到业务错误。
fn map_reqwest_error(e: reqwest::Error, config: &ImageConfig) -> ImageError {
    if e.is_timeout() {
        ImageError::Timeout(format!(
            "下载超时（{}秒）",
            config.download_timeout_secs.unwrap_or_default()
        ))
    } else if e.is_connect() {
        ImageError::Network(format!("无法连接：{}", e))
    } else {
        ImageError::Network(format!("请求失败：{}", e))
    }
}

/// 常见 HTTP 状态码本地化文案。
fn status_message(code: u16) -> &'static str {
    match code {
        404 => "未找到",
        403 => "访问被拒绝",
        500..=599 => "服务器错误",
        _ => "请求失败",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn headers(pairs: &[(reqwest::header::HeaderName, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(name.clone(), HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn anonymous_cors_accepts_wildcard_and_exact_origin() {
        let origin = "https://app.example";

        assert!(check_cors(&headers(&[(ACCESS_CONTROL_ALLOW_ORIGIN, "*")]), CrossOrigin::Anonymous, origin).is_ok());
        assert!(check_cors(
            &headers(&[(ACCESS_CONTROL_ALLOW_ORIGIN, "https://app.example")]),
            CrossOrigin::Anonymous,
            origin
        )
        .is_ok());
        assert!(matches!(
            check_cors(&HeaderMap::new(), CrossOrigin::Anonymous, origin),
            Err(ImageError::CrossOrigin(_))
        ));
    }

    #[test]
    fn credentialed_cors_needs_exact_origin_and_credentials_flag() {
        let origin = "https://app.example";

        assert!(matches!(
            check_cors(
                &headers(&[
                    (ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
                    (ACCESS_CONTROL_ALLOW_CREDENTIALS, "true"),
                ]),
                CrossOrigin::UseCredentials,
                origin
            ),
            Err(ImageError::CrossOrigin(_))
        ));
        assert!(check_cors(
            &headers(&[
                (ACCESS_CONTROL_ALLOW_ORIGIN, "https://app.example"),
                (ACCESS_CONTROL_ALLOW_CREDENTIALS, "true"),
            ]),
            CrossOrigin::UseCredentials,
            origin
        )
        .is_ok());
    }

    #[test]
    fn same_origin_compares_scheme_host_and_port() {
        let url = reqwest::Url::parse("http://127.0.0.1:8080/a.png").expect("valid url");

        assert!(is_same_origin(&url, Some("http://127.0.0.1:8080")));
        assert!(!is_same_origin(&url, Some("http://127.0.0.1:9090")));
        assert!(!is_same_origin(&url, Some("https://127.0.0.1:8080")));
        assert!(!is_same_origin(&url, None));
    }

    #[test]
    fn base64_estimate_is_an_upper_bound() {
        assert_eq!(estimate_base64_decoded_upper_bound_len("Zm9v"), 3);
        assert_eq!(estimate_base64_decoded_upper_bound_len("Zm9vYg"), 6);
        assert_eq!(estimate_base64_decoded_upper_bound_len(""), 0);
    }

    #[test]
    fn data_url_over_limit_is_rejected_before_decode() {
        let config = ImageConfig {
            max_file_size: 8,
            ..ImageConfig::default()
        };
        let data_url = format!("data:image/png;base64,{}", "A".repeat(64));

        let result = SourceImageLoader::load_from_data_url(&data_url, &config);

        assert!(matches!(result, Err(ImageError::ResourceLimit(_))));
    }

    #[test]
    fn redact_url_for_log_removes_query_and_fragment() {
        let url = reqwest::Url::parse("https://example.com:8443/path/img.png?token=abc123#hash")
            .expect("valid url");

        assert_eq!(redact_url_for_log(&url), "https://example.com:8443/path/img.png");
    }

    #[test]
    fn set_config_rejects_invalid_values() {
        let loader = SourceImageLoader::new(ImageConfig::default(), UrlRegistries::default())
            .expect("loader init failed");

        let bad = ImageConfig {
            default_quality: -1.0,
            ..ImageConfig::default()
        };

        assert!(matches!(loader.set_config(bad), Err(ImageError::InvalidFormat(_))));
        assert_eq!(loader.config_snapshot().expect("snapshot failed"), ImageConfig::default());
    }
}
