/// 字符级编辑脚本
///
/// 原始 diff 由 `similar` 按字符计算，随后经过两步整理：
/// - 规整：相邻同类操作合并；两个相等段之间的所有变更合并为一个删除加一个插入
/// - 语义清理：若某个相等段不长于其两侧的变更，则将其并入变更，
///   避免一次人工修改被拆成许多单字符操作
use similar::{ChangeTag, TextDiff};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKind {
    Equal,
    Insert,
    Delete,
}

/// 单个编辑操作
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditOp {
    pub kind: EditKind,
    pub text: String,
}

impl EditOp {
    fn new(kind: EditKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    /// 字符数（编辑脚本的所有长度都以字符计）
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// 编辑脚本
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EditScript {
    ops: Vec<EditOp>,
}

impl EditScript {
    /// 计算把 `old` 变为 `new` 的编辑脚本（已语义清理）
    pub fn between(old: &str, new: &str) -> Self {
        let diff = TextDiff::from_chars(old, new);

        let raw = diff
            .iter_all_changes()
            .map(|change| {
                let kind = match change.tag() {
                    ChangeTag::Equal => EditKind::Equal,
                    ChangeTag::Insert => EditKind::Insert,
                    ChangeTag::Delete => EditKind::Delete,
                };
                EditOp::new(kind, change.value())
            })
            .collect();

        let mut script = EditScript { ops: normalize(raw) };
        script.cleanup_semantic();
        script
    }

    pub fn ops(&self) -> &[EditOp] {
        &self.ops
    }

    pub fn is_identity(&self) -> bool {
        self.ops.iter().all(|op| op.kind == EditKind::Equal)
    }

    /// 源文本（相等段 + 删除段）
    pub fn source_text(&self) -> String {
        self.ops
            .iter()
            .filter(|op| op.kind != EditKind::Insert)
            .map(|op| op.text.as_str())
            .collect()
    }

    /// 目标文本（相等段 + 插入段）
    pub fn target_text(&self) -> String {
        self.ops
            .iter()
            .filter(|op| op.kind != EditKind::Delete)
            .map(|op| op.text.as_str())
            .collect()
    }

    /// 消除夹在两组变更之间的短相等段
    fn cleanup_semantic(&mut self) {
        loop {
            let Some(index) = self.find_absorbable_equality() else {
                break;
            };

            let equality = self.ops.remove(index);
            self.ops.insert(index, EditOp::new(EditKind::Insert, equality.text.clone()));
            self.ops.insert(index, EditOp::new(EditKind::Delete, equality.text));
            self.ops = normalize(std::mem::take(&mut self.ops));
        }
    }

    fn find_absorbable_equality(&self) -> Option<usize> {
        (0..self.ops.len()).find(|&index| {
            if self.ops[index].kind != EditKind::Equal {
                return false;
            }
            let before = self.change_lengths(index, Direction::Backward);
            let after = self.change_lengths(index, Direction::Forward);
            let len = self.ops[index].char_len();

            before.has_changes()
                && after.has_changes()
                && len <= before.largest()
                && len <= after.largest()
        })
    }

    /// 统计相等段一侧（直到下一个相等段为止）的插入与删除字符数
    fn change_lengths(&self, index: usize, direction: Direction) -> ChangeLengths {
        let mut lengths = ChangeLengths::default();
        let neighbours: Box<dyn Iterator<Item = &EditOp> + '_> = match direction {
            Direction::Backward => Box::new(self.ops[..index].iter().rev()),
            Direction::Forward => Box::new(self.ops[index + 1..].iter()),
        };

        for op in neighbours {
            match op.kind {
                EditKind::Equal => break,
                EditKind::Insert => lengths.inserted += op.char_len(),
                EditKind::Delete => lengths.deleted += op.char_len(),
            }
        }
        lengths
    }
}

enum Direction {
    Backward,
    Forward,
}

#[derive(Default)]
struct ChangeLengths {
    inserted: usize,
    deleted: usize,
}

impl ChangeLengths {
    fn has_changes(&self) -> bool {
        self.inserted + self.deleted > 0
    }

    fn largest(&self) -> usize {
        self.inserted.max(self.deleted)
    }
}

/// 规整操作序列：合并相邻相等段；两个相等段之间的变更合并为「删除 + 插入」；丢弃空操作
fn normalize(ops: Vec<EditOp>) -> Vec<EditOp> {
    let mut out: Vec<EditOp> = Vec::with_capacity(ops.len());
    let mut deleted = String::new();
    let mut inserted = String::new();

    fn flush(out: &mut Vec<EditOp>, deleted: &mut String, inserted: &mut String) {
        if !deleted.is_empty() {
            out.push(EditOp::new(EditKind::Delete, std::mem::take(deleted)));
        }
        if !inserted.is_empty() {
            out.push(EditOp::new(EditKind::Insert, std::mem::take(inserted)));
        }
    }

    for op in ops {
        if op.text.is_empty() {
            continue;
        }
        match op.kind {
            EditKind::Delete => deleted.push_str(&op.text),
            EditKind::Insert => inserted.push_str(&op.text),
            EditKind::Equal => {
                flush(&mut out, &mut deleted, &mut inserted);
                match out.last_mut() {
                    Some(last) if last.kind == EditKind::Equal => last.text.push_str(&op.text),
                    _ => out.push(op),
                }
            }
        }
    }
    flush(&mut out, &mut deleted, &mut inserted);
    out
}
