use crate::errors::EncodingWarning;
use encoding_rs::{mem, Encoding, EUC_JP};
use log::warn;
use std::borrow::Cow;

/// 解码结果，失败时保留原始文本并附带警告
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Normalized {
    Decoded(String),
    Fallback { original: String, warning: EncodingWarning },
}

impl Normalized {
    pub fn text(&self) -> &str {
        match self {
            Normalized::Decoded(text) => text,
            Normalized::Fallback { original, .. } => original,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Normalized::Decoded(text) => text,
            Normalized::Fallback { original, .. } => original,
        }
    }

    pub fn warning(&self) -> Option<&EncodingWarning> {
        match self {
            Normalized::Decoded(_) => None,
            Normalized::Fallback { warning, .. } => Some(warning),
        }
    }
}

/// 页面文本在 DOM 解析时的形态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellEncoding {
    /// 整页已解码，单元格只需去除首尾空白
    Unicode,
    /// 整页无法解码，字节逐个映射为字符，需要逐单元格解码
    RawBytes,
}

/// 将页面字节解码为 Unicode 文本
#[derive(Debug, Clone, Copy)]
pub struct TextNormalizer {
    encoding: &'static Encoding,
}

impl TextNormalizer {
    pub fn new(encoding: &'static Encoding) -> Self {
        Self { encoding }
    }

    pub fn euc_jp() -> Self {
        Self::new(EUC_JP)
    }

    /// 把抓取到的页面字节逐字节映射为字符，供 DOM 解析使用
    pub fn preserve_bytes(body: &[u8]) -> Cow<'_, str> {
        mem::decode_latin1(body)
    }

    /// 先整页严格解码；失败时退回逐字节映射，由单元格各自解码
    pub fn decode_page(&self, body: &[u8]) -> (String, CellEncoding) {
        match self
            .encoding
            .decode_without_bom_handling_and_without_replacement(body)
        {
            Some(text) => (text.into_owned(), CellEncoding::Unicode),
            None => {
                warn!(
                    "Page is not valid {} ({} bytes), decoding cell by cell",
                    self.encoding.name(),
                    body.len()
                );
                (Self::preserve_bytes(body).into_owned(), CellEncoding::RawBytes)
            }
        }
    }

    pub fn normalize_cell(&self, raw: &str, encoding: CellEncoding) -> Normalized {
        match encoding {
            CellEncoding::Unicode => Normalized::Decoded(raw.trim().to_string()),
            CellEncoding::RawBytes => self.normalize(raw),
        }
    }

    pub fn normalize(&self, raw: &str) -> Normalized {
        // 含有单字节范围以外的字符，说明已经是解码后的文本
        if !mem::is_str_latin1(raw) {
            return Normalized::Decoded(raw.trim().to_string());
        }

        // &nbsp; 解析后为 U+00A0；0xA0 在 EUC-JP 中不会出现
        let raw_bytes = raw.replace('\u{a0}', " ");
        let bytes = mem::encode_latin1_lossy(&raw_bytes);
        match self
            .encoding
            .decode_without_bom_handling_and_without_replacement(&bytes)
        {
            Some(text) => Normalized::Decoded(text.trim().to_string()),
            None => {
                let warning = EncodingWarning {
                    encoding: self.encoding.name(),
                    len: bytes.len(),
                };
                warn!("{}", warning);
                Normalized::Fallback {
                    original: raw.to_string(),
                    warning,
                }
            }
        }
    }
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::euc_jp()
    }
}
