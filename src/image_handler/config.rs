//! # 配置模块
//!
//! ## 设计思路
//!
//! 将图片链路的“可调策略”集中到 `ImageConfig`：体积 / 像素上限、可选超时、
//! 页面来源（决定跨域判定）以及导出默认质量。
//!
//! ## 实现思路
//!
//! - `Default` 提供可直接使用的配置，默认不设超时。
//! - 派生 serde，`#[serde(default)]` 允许 JSON 只写部分字段。
//! - `validate` 在加载 / 运行时替换配置前做统一校验。

use serde::{Deserialize, Serialize};

use super::ImageError;

/// 图片处理配置。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// 读取原始字节时允许的最大体积（字节）。
    pub max_file_size: u64,
    /// 网络请求整体超时（秒）；`None` 表示不限，由调用方负责。
    pub download_timeout_secs: Option<u64>,
    /// 单次加载允许跟随的最大重定向次数。
    pub max_redirects: usize,
    /// 解码后的像素上限（`width * height`）。
    pub max_decoded_pixels: u64,
    /// 解码阶段允许的预计内存上限（按 RGBA 估算，字节）。
    pub max_decoded_bytes: u64,
    /// 当前页面来源，如 `https://example.com`；`None` 时所有网络图片都视为跨域。
    pub origin: Option<String>,
    /// 有损格式未指定质量时使用的默认质量（0..=1）。
    pub default_quality: f64,
    /// 请求使用的 User-Agent。
    pub user_agent: String,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            max_file_size: 50 * 1024 * 1024,
            download_timeout_secs: None,
            max_redirects: 20,
            max_decoded_pixels: 40_000_000,
            max_decoded_bytes: 160 * 1024 * 1024,
            origin: None,
            default_quality: 0.92,
            user_agent: concat!("blob-util/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ImageConfig {
    /// 从 JSON 文本解析配置并校验。
    ///
    /// # 示例
    /// ```rust
    /// use blob_util::image_handler::ImageConfig;
    ///
    /// let config = ImageConfig::from_json_str(r#"{ "origin": "https://example.com" }"#)?;
    /// assert_eq!(config.origin.as_deref(), Some("https://example.com"));
    /// assert_eq!(config.default_quality, 0.92);
    /// # Ok::<(), blob_util::image_handler::ImageError>(())
    /// ```
    pub fn from_json_str(json: &str) -> Result<Self, ImageError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| ImageError::InvalidFormat(format!("配置解析失败：{}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ImageError> {
        if self.max_file_size == 0 {
            return Err(ImageError::InvalidFormat("max_file_size 必须大于 0".to_string()));
        }
        if self.max_decoded_pixels == 0 || self.max_decoded_bytes == 0 {
            return Err(ImageError::InvalidFormat("解码上限必须大于 0".to_string()));
        }
        if self.download_timeout_secs == Some(0) {
            return Err(ImageError::InvalidFormat("download_timeout_secs 必须大于 0".to_string()));
        }
        if !(0.0..=1.0).contains(&self.default_quality) {
            return Err(ImageError::InvalidFormat(format!(
                "default_quality 超出范围：{}（可选：0..=1）",
                self.default_quality
            )));
        }
        Ok(())
    }

    /// 规范化后的页面来源（去掉末尾 `/`）。
    pub(crate) fn normalized_origin(&self) -> Option<&str> {
        self.origin.as_deref().map(|o| o.trim_end_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        ImageConfig::default().validate().expect("default config must be valid");
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = ImageConfig::from_json_str(r#"{ "download_timeout_secs": 5 }"#).expect("parse failed");

        assert_eq!(config.download_timeout_secs, Some(5));
        assert_eq!(config.max_file_size, ImageConfig::default().max_file_size);
    }

    #[test]
    fn rejects_out_of_range_quality() {
        let result = ImageConfig::from_json_str(r#"{ "default_quality": 1.5 }"#);
        assert!(matches!(result, Err(ImageError::InvalidFormat(_))));
    }

    #[test]
    fn rejects_zero_timeout() {
        let config = ImageConfig {
            download_timeout_secs: Some(0),
            ..ImageConfig::default()
        };
        assert!(matches!(config.validate(), Err(ImageError::InvalidFormat(_))));
    }

    #[test]
    fn origin_is_normalized() {
        let config = ImageConfig {
            origin: Some("https://example.com/".to_string()),
            ..ImageConfig::default()
        };
        assert_eq!(config.normalized_origin(), Some("https://example.com"));
    }
}
