/// 重建驱动
///
/// 对有修订的内容文件重新解析，用与提取完全相同的遍历规则恢复 `block_index`，
/// 把修订句子拼回块的完整文本，再交给结构化修补器。
use log::{debug, trace};

use crate::extract::walk_blocks;
use crate::markup::{MarkupDocument, MarkupError};
use crate::patch::{apply_text, PatchOutcome};
use crate::revision::FileRevisions;
use crate::segment::Segmenter;

/// 单个内容文件的重建结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebuiltContent {
    pub markup: String,
    /// 实际被修补的块数
    pub blocks_patched: usize,
    /// 找到对应句子的修订数
    pub revisions_applied: usize,
    /// 块存在但句子序号越界的修订数
    pub revisions_unmatched: usize,
}

/// 把修订文本放回原片段的位置，保留原片段首尾的空白
///
/// 提取时显示的文本经过修剪，被修剪掉的空白不属于修订内容，需要重新接回，
/// 否则句子之间的间距会丢失。
pub fn splice_revision(original_segment: &str, revised: &str) -> String {
    let rest = original_segment.trim_start();
    let leading = &original_segment[..original_segment.len() - rest.len()];
    let trailing = &rest[rest.trim_end().len()..];
    format!("{}{}{}", leading, revised, trailing)
}

/// 计算块的目标文本
///
/// 返回（目标文本，命中的修订数）
fn block_target(
    text: &str,
    block_index: usize,
    revisions: &FileRevisions,
    segmenter: Segmenter,
) -> (String, usize) {
    let mut target = String::with_capacity(text.len());
    let mut applied = 0;

    for (sentence_index, segment) in segmenter.segment(text).enumerate() {
        match revisions.get(block_index, sentence_index) {
            Some(revised) => {
                target.push_str(&splice_revision(segment.text, revised));
                applied += 1;
            }
            None => target.push_str(segment.text),
        }
    }

    (target, applied)
}

/// 在已解析的文档上应用修订
pub fn rebuild_document(
    doc: &mut MarkupDocument,
    revisions: &FileRevisions,
    segmenter: Segmenter,
) -> (usize, usize) {
    let mut blocks_patched = 0;
    let mut applied = 0;

    walk_blocks(doc, |doc, block| {
        if !revisions.touches_block(block.block_index) {
            return;
        }

        let (target, hits) = block_target(&block.text, block.block_index, revisions, segmenter);
        applied += hits;

        if let PatchOutcome::Patched { .. } = apply_text(doc, block.node, &target) {
            trace!("{}: 块 {} 已修补", revisions.content_path, block.block_index);
            blocks_patched += 1;
        }
    });

    (blocks_patched, applied)
}

/// 重建单个内容文件
///
/// # 参数
/// * `original_markup` - 未修改的原始内容
/// * `revisions` - 该文件的修订（可以为空，此时仅做解析-序列化往返）
/// * `segmenter` - 必须与提取时使用的策略一致
pub fn rebuild_content(
    original_markup: &str,
    revisions: &FileRevisions,
    segmenter: Segmenter,
) -> Result<RebuiltContent, MarkupError> {
    let mut doc = MarkupDocument::parse(original_markup)?;
    let (blocks_patched, revisions_applied) = rebuild_document(&mut doc, revisions, segmenter);

    debug!(
        "{}: 修补 {} 个块，应用 {}/{} 条修订",
        revisions.content_path,
        blocks_patched,
        revisions_applied,
        revisions.len()
    );

    Ok(RebuiltContent {
        markup: doc.serialize(),
        blocks_patched,
        revisions_applied,
        revisions_unmatched: revisions.len() - revisions_applied.min(revisions.len()),
    })
}
