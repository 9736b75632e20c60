use log::debug;

use super::unit::{SentenceUnit, UnitId};
use super::walker::eligible_blocks;
use crate::markup::{MarkupDocument, MarkupError};
use crate::segment::Segmenter;

/// 从内容文件的标记文本中提取句子单元
///
/// # 参数
/// * `markup` - 内容文件的 XHTML 文本
/// * `content_path` - 该文件在归档中的路径
/// * `segmenter` - 切分策略（重建时必须使用相同策略）
pub fn extract_units(
    markup: &str,
    content_path: &str,
    segmenter: Segmenter,
) -> Result<Vec<SentenceUnit>, MarkupError> {
    let doc = MarkupDocument::parse(markup)?;
    Ok(extract_from_document(&doc, content_path, segmenter))
}

/// 从已解析的文档中提取句子单元
pub fn extract_from_document(
    doc: &MarkupDocument,
    content_path: &str,
    segmenter: Segmenter,
) -> Vec<SentenceUnit> {
    let mut units = Vec::new();

    for block in eligible_blocks(doc) {
        let context = doc.inner_markup(block.node);

        for (sentence_index, segment) in segmenter.segment(&block.text).enumerate() {
            let text = segment.text.trim();
            if text.is_empty() {
                continue;
            }

            units.push(SentenceUnit {
                id: UnitId::new(content_path, block.block_index, sentence_index),
                text: text.to_string(),
                content_path: content_path.to_string(),
                context: context.clone(),
            });
        }
    }

    debug!("{}: 提取到 {} 个句子单元", content_path, units.len());
    units
}
