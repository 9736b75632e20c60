/// 结构化修补器
///
/// 在块的文本叶子上重放编辑脚本：
/// 1. 按文档顺序收集块内文本叶子，复制为独立的字符缓冲区
/// 2. 用 `(叶子, 叶内偏移)` 游标在缓冲区上执行相等/插入/删除
/// 3. 一次性写回内容发生变化的叶子；游标越过最后一个叶子后的插入追加为新的尾部叶子
///
/// 元素、属性、注释等非文本节点不会被访问，格式因此得以保留。
use log::trace;

use super::script::{EditKind, EditScript};
use crate::markup::{MarkupDocument, NodeId};

/// 修补结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchOutcome {
    /// 当前文本已等于目标文本，未做任何修改
    Unchanged,
    /// 已修补
    Patched {
        /// 被改写的已有叶子数
        leaves_rewritten: usize,
        /// 是否追加了新的尾部叶子
        appended: bool,
    },
}

/// 叶子缓冲区上的游标
struct Cursor {
    leaf: usize,
    offset: usize,
}

struct LeafBuffers {
    buffers: Vec<Vec<char>>,
    /// 游标越过最后一个叶子后插入的文本
    tail: String,
}

impl LeafBuffers {
    fn is_exhausted(&self, cursor: &Cursor) -> bool {
        cursor.leaf >= self.buffers.len()
    }

    fn available(&self, cursor: &Cursor) -> usize {
        self.buffers[cursor.leaf].len().saturating_sub(cursor.offset)
    }

    /// 前进 `count` 个字符；恰好耗尽当前叶子时移动到下一叶子的起点
    fn advance(&self, cursor: &mut Cursor, mut count: usize) {
        while count > 0 && !self.is_exhausted(cursor) {
            let available = self.available(cursor);
            if available > count {
                cursor.offset += count;
                count = 0;
            } else {
                count -= available;
                cursor.leaf += 1;
                cursor.offset = 0;
            }
        }
    }

    fn insert(&mut self, cursor: &mut Cursor, text: &str) {
        if self.is_exhausted(cursor) {
            self.tail.push_str(text);
            return;
        }
        let chars: Vec<char> = text.chars().collect();
        let count = chars.len();
        let buffer = &mut self.buffers[cursor.leaf];
        let at = cursor.offset.min(buffer.len());
        buffer.splice(at..at, chars);
        cursor.offset = at + count;
    }

    /// 删除 `count` 个字符，可跨越多个叶子；游标不前进。
    /// 删除恰好到达叶子末尾时游标停留在该叶子，紧随其后的插入仍落在同一叶子中。
    fn delete(&mut self, cursor: &mut Cursor, mut count: usize) {
        while count > 0 && !self.is_exhausted(cursor) {
            let available = self.available(cursor);
            let start = cursor.offset;
            if available >= count {
                self.buffers[cursor.leaf].drain(start..start + count);
                count = 0;
            } else {
                self.buffers[cursor.leaf].truncate(start);
                count -= available;
                cursor.leaf += 1;
                cursor.offset = 0;
            }
        }
    }
}

/// 将块 `block` 的扁平文本修改为 `target`
///
/// 若当前文本已等于目标文本，则严格不做修改。
pub fn apply_text(doc: &mut MarkupDocument, block: NodeId, target: &str) -> PatchOutcome {
    let leaves = doc.text_leaves(block);
    let originals: Vec<String> = leaves
        .iter()
        .map(|id| doc.leaf_text(*id).unwrap_or_default().to_string())
        .collect();

    let current: String = originals.concat();
    if current == target {
        return PatchOutcome::Unchanged;
    }

    let script = EditScript::between(&current, target);
    let mut buffers = LeafBuffers {
        buffers: originals.iter().map(|text| text.chars().collect()).collect(),
        tail: String::new(),
    };
    let mut cursor = Cursor { leaf: 0, offset: 0 };

    for op in script.ops() {
        match op.kind {
            EditKind::Equal => buffers.advance(&mut cursor, op.char_len()),
            EditKind::Insert => buffers.insert(&mut cursor, &op.text),
            EditKind::Delete => buffers.delete(&mut cursor, op.char_len()),
        }
    }

    let mut leaves_rewritten = 0;
    for ((leaf, original), buffer) in leaves.iter().zip(&originals).zip(&buffers.buffers) {
        let updated: String = buffer.iter().collect();
        if &updated != original {
            doc.set_leaf_text(*leaf, updated);
            leaves_rewritten += 1;
        }
    }

    let appended = !buffers.tail.is_empty();
    if appended {
        doc.append_text(block, buffers.tail);
    }

    trace!("修补块：改写 {} 个叶子，追加尾部叶子：{}", leaves_rewritten, appended);
    PatchOutcome::Patched {
        leaves_rewritten,
        appended,
    }
}
