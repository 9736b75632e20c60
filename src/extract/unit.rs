use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::utils::FixerError;

/// 句子单元 ID
///
/// 字符串形式：`{content_path}#{block_index}-{sentence_index}`
/// 解析时按最后一个 `#` 分割，内容路径本身可以包含 `#`。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UnitId {
    pub content_path: String,
    pub block_index: usize,
    pub sentence_index: usize,
}

impl UnitId {
    pub fn new(content_path: impl Into<String>, block_index: usize, sentence_index: usize) -> Self {
        Self {
            content_path: content_path.into(),
            block_index,
            sentence_index,
        }
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}-{}", self.content_path, self.block_index, self.sentence_index)
    }
}

impl FromStr for UnitId {
    type Err = FixerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || FixerError::InvalidUnitId(s.to_string());

        let (content_path, indices) = s.rsplit_once('#').ok_or_else(invalid)?;
        let (block, sentence) = indices.split_once('-').ok_or_else(invalid)?;

        if content_path.is_empty() {
            return Err(invalid());
        }

        Ok(UnitId {
            content_path: content_path.to_string(),
            block_index: block.parse().map_err(|_| invalid())?,
            sentence_index: sentence.parse().map_err(|_| invalid())?,
        })
    }
}

impl TryFrom<String> for UnitId {
    type Error = FixerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<UnitId> for String {
    fn from(id: UnitId) -> Self {
        id.to_string()
    }
}

/// 句子单元
///
/// - `text`: 修剪后的句子文本，用于显示、搜索，以及未修订时的 diff 基准
/// - `context`: 所属块的内部标记，仅用于显示，不作为修补目标
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentenceUnit {
    pub id: UnitId,
    pub text: String,
    pub content_path: String,
    pub context: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_id_display_and_parse() {
        let id = UnitId::new("OEBPS/Text/ch01.xhtml", 12, 3);
        let s = id.to_string();
        assert_eq!(s, "OEBPS/Text/ch01.xhtml#12-3");
        assert_eq!(s.parse::<UnitId>().unwrap(), id);
    }

    #[test]
    fn test_unit_id_path_with_hash() {
        let id: UnitId = "weird#name.xhtml#4-0".parse().unwrap();
        assert_eq!(id.content_path, "weird#name.xhtml");
        assert_eq!(id.block_index, 4);
        assert_eq!(id.sentence_index, 0);
    }

    #[test]
    fn test_unit_id_invalid() {
        for bad in ["", "no-hash", "path#x-1", "path#1", "#1-2", "path#1-"] {
            assert!(bad.parse::<UnitId>().is_err(), "{:?} should be rejected", bad);
        }
    }

    #[test]
    fn test_unit_id_serde_as_string() {
        let id = UnitId::new("a.xhtml", 1, 2);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"a.xhtml#1-2\"");
        let back: UnitId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
