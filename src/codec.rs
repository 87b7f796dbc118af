//! # 字节 / 字符串编码模块
//!
//! ## 设计思路
//!
//! “二进制字符串”是每个字符码点即一个字节（0..=255）的字符串，
//! 作为 base64 编码的中间表示。这里集中放置：
//!
//! - 二进制字符串 ⇄ 字节缓冲的同步互转
//! - 可注入的 `Base64Codec` 能力及其默认实现 `StandardBase64`
//! - `btoa` / `atob` 语义的两个辅助函数
//!
//! ## 实现思路
//!
//! 字符串转字节时按 UTF-16 码元逐个截断到低 8 位，与类型化数组写入语义一致；
//! base64 编码则严格要求字符不超过 U+00FF，否则返回 `InvalidCharacter`。
//! 解码走宽松模式：忽略 ASCII 空白，填充可省略。

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig, general_purpose};
use base64::Engine as _;
use bytes::Bytes;

use crate::BlobError;

const FORGIVING: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// 二进制字符串 → 字节缓冲。
///
/// 缓冲长度等于字符串的 UTF-16 长度，第 `i` 个字节为第 `i` 个码元对 256 取模。
pub fn binary_string_to_array_buffer(binary: &str) -> Bytes {
    binary
        .encode_utf16()
        .map(|unit| (unit & 0xFF) as u8)
        .collect::<Vec<u8>>()
        .into()
}

/// 字节缓冲 → 二进制字符串。
pub fn array_buffer_to_binary_string(buffer: &[u8]) -> String {
    buffer.iter().map(|&byte| char::from(byte)).collect()
}

/// Base64 编解码能力。
pub trait Base64Codec: Send + Sync {
    fn encode(&self, bytes: &[u8]) -> String;

    fn decode(&self, input: &str) -> Result<Vec<u8>, BlobError>;
}

/// 标准字母表的 base64 实现。
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardBase64;

impl Base64Codec for StandardBase64 {
    fn encode(&self, bytes: &[u8]) -> String {
        general_purpose::STANDARD.encode(bytes)
    }

    fn decode(&self, input: &str) -> Result<Vec<u8>, BlobError> {
        let compact: String = input
            .chars()
            .filter(|c| !matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0C'))
            .collect();
        Ok(FORGIVING.decode(compact)?)
    }
}

/// `btoa`：二进制字符串 → base64。
pub fn encode_binary_string(codec: &dyn Base64Codec, binary: &str) -> Result<String, BlobError> {
    let bytes = binary
        .chars()
        .enumerate()
        .map(|(index, ch)| u8::try_from(u32::from(ch)).map_err(|_| BlobError::InvalidCharacter { index, ch }))
        .collect::<Result<Vec<u8>, BlobError>>()?;
    Ok(codec.encode(&bytes))
}

/// `atob`：base64 → 二进制字符串。
pub fn decode_to_binary_string(codec: &dyn Base64Codec, base64: &str) -> Result<String, BlobError> {
    let bytes = codec.decode(base64)?;
    Ok(array_buffer_to_binary_string(&bytes))
}
