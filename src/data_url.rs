//! `data:<media-type>;base64,<payload>` 的拆分与拼接。

use once_cell::sync::Lazy;
use regex::Regex;

use crate::BlobError;

static MEDIA_TYPE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"data:([^;]+);").expect("media type pattern is valid"));

/// 拆分后的 Data URL 视图。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataUrl<'a> {
    pub media_type: &'a str,
    pub payload: &'a str,
}

impl<'a> DataUrl<'a> {
    /// 按 `data:([^;]+);` 提取媒体类型（必须以 `;` 结束），去掉首个逗号及之前的内容得到载荷。
    pub fn parse(input: &'a str) -> Result<Self, BlobError> {
        let media_type = MEDIA_TYPE_PATTERN
            .captures(input)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
            .ok_or_else(|| BlobError::DataUrlMismatch(preview(input)))?;

        let payload = match input.find(',') {
            Some(idx) if idx > 0 => &input[idx + 1..],
            _ => input,
        };

        Ok(Self { media_type, payload })
    }
}

pub fn format_data_url(media_type: &str, base64: &str) -> String {
    format!("data:{};base64,{}", media_type, base64)
}

fn preview(input: &str) -> String {
    const LIMIT: usize = 32;
    match input.char_indices().nth(LIMIT) {
        Some((idx, _)) => format!("{}…", &input[..idx]),
        None => input.to_string(),
    }
}
