/// 句子切分
///
/// 两种策略都保证：按顺序拼接所有片段恰好还原输入字符串（无缺口、无重叠）。
/// 这是重建阶段按 `sentence_index` 定位片段的前提。
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use unicode_segmentation::{USentenceBoundIndices, UnicodeSegmentation};

/// 句末标点（一个或多个）后接空白或文本结尾
static SENTENCE_END: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[.!?]+(?:\s+|$)").expect("sentence boundary pattern is valid")
});

/// 切分出的片段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    /// 片段文本（包含其后的空白）
    pub text: &'a str,
    /// 片段在原文中的字节偏移
    pub offset: usize,
}

/// 切分策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Segmenter {
    /// Unicode 句子边界（UAX #29）
    #[default]
    Unicode,
    /// 按 `.`、`!`、`?` 切分的启发式回退
    Punctuation,
}

impl Segmenter {
    /// 对文本进行切分，返回惰性迭代器；可对同一文本重复调用得到相同结果
    pub fn segment<'a>(&self, text: &'a str) -> Segments<'a> {
        let inner = match self {
            Segmenter::Unicode => SegmentsInner::Unicode(text.split_sentence_bound_indices()),
            Segmenter::Punctuation => SegmentsInner::Punctuation { text, pos: 0 },
        };
        Segments { inner }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Segmenter::Unicode => "unicode",
            Segmenter::Punctuation => "punctuation",
        }
    }
}

impl std::str::FromStr for Segmenter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "unicode" => Ok(Segmenter::Unicode),
            "punctuation" => Ok(Segmenter::Punctuation),
            other => Err(format!("unknown segmenter: {}", other)),
        }
    }
}

/// 片段迭代器
pub struct Segments<'a> {
    inner: SegmentsInner<'a>,
}

enum SegmentsInner<'a> {
    Unicode(USentenceBoundIndices<'a>),
    Punctuation { text: &'a str, pos: usize },
}

impl<'a> Iterator for Segments<'a> {
    type Item = Segment<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.inner {
            SegmentsInner::Unicode(bounds) => bounds
                .next()
                .map(|(offset, text)| Segment { text, offset }),
            SegmentsInner::Punctuation { text, pos } => {
                if *pos >= text.len() {
                    return None;
                }
                let start = *pos;
                let end = SENTENCE_END
                    .find_at(text, start)
                    .map(|m| m.end())
                    .unwrap_or(text.len());
                *pos = end;
                Some(Segment {
                    text: &text[start..end],
                    offset: start,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pieces(segmenter: Segmenter, text: &str) -> Vec<&str> {
        segmenter.segment(text).map(|s| s.text).collect()
    }

    fn assert_covers(segmenter: Segmenter, text: &str) {
        let mut expected_offset = 0;
        let mut joined = String::new();
        for segment in segmenter.segment(text) {
            assert_eq!(segment.offset, expected_offset, "gap before {:?}", segment.text);
            expected_offset += segment.text.len();
            joined.push_str(segment.text);
        }
        assert_eq!(joined, text);
    }

    #[test]
    fn test_segments_cover_input() {
        let samples = [
            "",
            "   ",
            "no terminal punctuation",
            "One. Two! Three? Four",
            "Wait... what?!  Really.\n",
            "Version 3.14 is out. Get it.",
            "...leading dots. ok",
            "첫 문장입니다. 두 번째 문장입니다.",
        ];
        for segmenter in [Segmenter::Unicode, Segmenter::Punctuation] {
            for sample in samples {
                assert_covers(segmenter, sample);
            }
        }
    }

    #[test]
    fn test_punctuation_split() {
        assert_eq!(
            pieces(Segmenter::Punctuation, "One. Two! Three? Four"),
            vec!["One. ", "Two! ", "Three? ", "Four"]
        );
        assert_eq!(
            pieces(Segmenter::Punctuation, "Version 3.14 is out. Get it."),
            vec!["Version 3.14 is out. ", "Get it."]
        );
    }

    #[test]
    fn test_punctuation_single_segment_without_terminal() {
        assert_eq!(pieces(Segmenter::Punctuation, "no end"), vec!["no end"]);
        assert_eq!(pieces(Segmenter::Punctuation, "  "), vec!["  "]);
        assert!(pieces(Segmenter::Punctuation, "").is_empty());
    }

    #[test]
    fn test_unicode_keeps_trailing_whitespace_with_sentence() {
        let parts = pieces(Segmenter::Unicode, "The fox ran. The dog slept.");
        assert_eq!(parts, vec!["The fox ran. ", "The dog slept."]);
    }

    #[test]
    fn test_segmentation_is_restartable() {
        let text = "A b. C d. E f.";
        for segmenter in [Segmenter::Unicode, Segmenter::Punctuation] {
            let first: Vec<_> = segmenter.segment(text).collect();
            let second: Vec<_> = segmenter.segment(text).collect();
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_from_str() {
        assert_eq!("unicode".parse::<Segmenter>().unwrap(), Segmenter::Unicode);
        assert_eq!("Punctuation".parse::<Segmenter>().unwrap(), Segmenter::Punctuation);
        assert!("icu".parse::<Segmenter>().is_err());
    }
}
