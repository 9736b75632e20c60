/// 块遍历规则
///
/// 提取与重建必须得到完全相同的 `block_index`，因此两者都只通过本模块遍历。
///
/// 规则：
/// 1. 按文档顺序访问所有标签属于 [`BLOCK_TAGS`] 的元素，每个元素都占用一个序号，
///    无论之后是否因为已消费、纯空白或含有嵌套块而被跳过
/// 2. 已消费的元素跳过
/// 3. 纯空白文本的元素跳过（不消费）
/// 4. 直接子元素中含有 [`NESTED_BLOCK_TAGS`] 的元素跳过（不消费，交给更深的节点）
/// 5. 否则接受该元素，并将其与所有后代标记为已消费
use std::collections::HashSet;

use crate::markup::{MarkupDocument, NodeId};

/// 候选块标签
pub const BLOCK_TAGS: &[&str] = &[
    "p", "h1", "h2", "h3", "h4", "h5", "h6", "li", "div", "span",
];

/// 出现在直接子元素中时使父元素不可作为块的标签
pub const NESTED_BLOCK_TAGS: &[&str] = &[
    "p", "div", "h1", "h2", "h3", "h4", "h5", "h6", "li", "ul", "ol", "table",
    "blockquote", "section", "article", "aside", "nav", "header", "footer",
];

/// 被接受的块
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub node: NodeId,
    /// 在所有候选块元素中的序号
    pub block_index: usize,
    /// 块的完整纯文本（未修剪）
    pub text: String,
}

fn is_block_tag(doc: &MarkupDocument, id: NodeId) -> bool {
    doc.tag_name(id).is_some_and(|name| BLOCK_TAGS.contains(&name))
}

fn has_nested_block_child(doc: &MarkupDocument, id: NodeId) -> bool {
    doc.children(id)
        .iter()
        .filter_map(|child| doc.tag_name(*child))
        .any(|name| NESTED_BLOCK_TAGS.contains(&name))
}

/// 按遍历规则返回文档中所有被接受的块
pub fn eligible_blocks(doc: &MarkupDocument) -> Vec<Block> {
    let mut consumed: HashSet<NodeId> = HashSet::new();
    let mut blocks = Vec::new();

    let candidates = doc
        .descendants(doc.root())
        .into_iter()
        .filter(|id| is_block_tag(doc, *id));

    for (block_index, node) in candidates.enumerate() {
        if consumed.contains(&node) {
            continue;
        }

        let text = doc.text_content(node);
        if text.trim().is_empty() {
            continue;
        }

        if has_nested_block_child(doc, node) {
            continue;
        }

        consumed.insert(node);
        consumed.extend(doc.descendants(node));

        blocks.push(Block {
            node,
            block_index,
            text,
        });
    }

    blocks
}

/// 对每个被接受的块调用 `visit`
///
/// 块列表在回调前一次性计算，回调只能修改块内部的文本叶子，
/// 不影响后续块的判定。
pub fn walk_blocks<F>(doc: &mut MarkupDocument, mut visit: F)
where
    F: FnMut(&mut MarkupDocument, &Block),
{
    for block in eligible_blocks(doc) {
        visit(doc, &block);
    }
}
