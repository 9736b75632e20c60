/// EPUB 编辑会话
///
/// 管理一个已加载的文档和它的修订映射。所有修改只发生在映射上，
/// 文档内容只有在显式调用 `save` 时才会被重建并写出。
use std::path::{Path, PathBuf};

use log::{debug, info};

use super::history::{RevisionChange, RevisionHistory};
use crate::document::{EpubDocument, RebuildReport};
use crate::extract::{SentenceUnit, UnitId};
use crate::revision::Revisions;
use crate::utils::{create_backup, FixerError};

/// 审阅列表中显示的原文占位
pub const ORIGINAL_NOT_FOUND: &str = "(original not found)";

/// 审阅条目
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewItem {
    pub id: UnitId,
    /// 原文；修订 ID 不属于当前文档时为 `None`
    pub original: Option<String>,
    pub revised: String,
}

impl ReviewItem {
    pub fn original_or_placeholder(&self) -> &str {
        self.original.as_deref().unwrap_or(ORIGINAL_NOT_FOUND)
    }
}

/// 编辑会话
///
/// # 使用示例
///
/// ```rust,ignore
/// use epub_fixer::{EngineConfig, EpubEditor};
///
/// let mut editor = EpubEditor::load(Path::new("book.epub"), EngineConfig::default())?;
/// let hit = editor.search("qick")[0].0.id.clone();
/// editor.commit(&hit, "The quick fox.")?;
///
/// for item in editor.review() {
///     println!("{} -> {}", item.original_or_placeholder(), item.revised);
/// }
/// editor.save(Path::new("fixed_book.epub"))?;
/// ```
pub struct EpubEditor {
    document: EpubDocument,
    revisions: Revisions,
    history: RevisionHistory,
}

impl EpubEditor {
    pub fn new(document: EpubDocument) -> Self {
        Self {
            document,
            revisions: Revisions::new(),
            history: RevisionHistory::new(),
        }
    }

    /// 加载 EPUB 并开始新的会话
    pub fn load(path: &Path, config: crate::config::EngineConfig) -> Result<Self, FixerError> {
        Ok(Self::new(EpubDocument::load(path, config)?))
    }

    pub fn document(&self) -> &EpubDocument {
        &self.document
    }

    pub fn revisions(&self) -> &Revisions {
        &self.revisions
    }

    pub fn history(&self) -> &RevisionHistory {
        &self.history
    }

    /// 提交一条修订（覆盖同一单元的旧修订）
    ///
    /// # 返回
    /// ID 不属于当前文档时返回 `UnknownUnit`
    pub fn commit(&mut self, id: &UnitId, text: impl Into<String>) -> Result<(), FixerError> {
        if !self.document.contains(id) {
            return Err(FixerError::UnknownUnit(id.to_string()));
        }
        let text = text.into();
        let previous = self.revisions.insert(id.clone(), text.clone());
        debug!("提交修订 {}", id);
        self.history.record(RevisionChange::new(id.clone(), previous, text));
        Ok(())
    }

    /// 导入外部修订（如 JSON 文件），不校验 ID
    ///
    /// 不属于当前文档的条目保留在映射中，审阅时显示为原文缺失，重建时被忽略。
    pub fn import(&mut self, revisions: Revisions) -> usize {
        let mut imported = 0;
        for (id, text) in revisions.sorted() {
            let previous = self.revisions.insert(id.clone(), text);
            self.history.record(RevisionChange::new(id.clone(), previous, text));
            imported += 1;
        }
        info!("导入 {} 条修订", imported);
        imported
    }

    /// 撤销最近一次提交，返回被撤销的单元
    pub fn undo(&mut self) -> Option<UnitId> {
        let change = self.history.undo()?.clone();
        match change.previous {
            Some(previous) => {
                self.revisions.insert(change.unit_id.clone(), previous);
            }
            None => {
                self.revisions.remove(&change.unit_id);
            }
        }
        Some(change.unit_id)
    }

    /// 重做最近一次撤销的提交
    pub fn redo(&mut self) -> Option<UnitId> {
        let change = self.history.redo()?.clone();
        self.revisions.insert(change.unit_id.clone(), change.revised);
        Some(change.unit_id)
    }

    /// 当前显示的文本：有修订时为修订文本，否则为原文
    pub fn display_text(&self, id: &UnitId) -> Option<&str> {
        self.revisions
            .get(id)
            .or_else(|| self.document.find(id).map(|unit| unit.text.as_str()))
    }

    /// 在原文中搜索，结果附带当前显示文本
    pub fn search(&self, term: &str) -> Vec<(&SentenceUnit, &str)> {
        self.document
            .search(term)
            .into_iter()
            .map(|unit| {
                let shown = self.revisions.get(&unit.id).unwrap_or(&unit.text);
                (unit, shown)
            })
            .collect()
    }

    /// 审阅列表：按文档顺序，原文缺失的条目排在最后
    pub fn review(&self) -> Vec<ReviewItem> {
        let mut items: Vec<(Option<usize>, ReviewItem)> = self
            .revisions
            .sorted()
            .into_iter()
            .map(|(id, revised)| {
                let unit = self.document.find(id);
                let item = ReviewItem {
                    id: id.clone(),
                    original: unit.map(|u| u.text.clone()),
                    revised: revised.to_string(),
                };
                (self.document.position(id), item)
            })
            .collect();

        // None 排在 Some 之后
        items.sort_by_key(|(position, _)| position.map_or((1, 0), |p| (0, p)));
        items.into_iter().map(|(_, item)| item).collect()
    }

    pub fn is_modified(&self) -> bool {
        !self.revisions.is_empty()
    }

    pub fn modified_count(&self) -> usize {
        self.revisions.len()
    }

    /// 默认输出文件名（配置前缀 + 原文件名）
    pub fn output_file_name(&self) -> String {
        self.document
            .config()
            .output_file_name(self.document.file_name())
    }

    /// 重建并保存
    ///
    /// 目标文件已存在且配置要求备份时，先创建带时间戳的备份。
    pub fn save(&self, output: &Path) -> Result<(RebuildReport, Option<PathBuf>), FixerError> {
        let backup = if self.document.config().create_backup && output.exists() {
            Some(create_backup(output)?)
        } else {
            None
        };
        let report = self.document.save(&self.revisions, output)?;
        Ok((report, backup))
    }

    pub fn summary(&self) -> String {
        format!(
            "{}: {} 个句子单元, {} 条修订 ({})",
            self.document.file_name(),
            self.document.units().len(),
            self.revisions.len(),
            self.history.summary()
        )
    }
}
