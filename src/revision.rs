/// 修订存储
///
/// 单元 ID 到替换文本的映射。映射本身是普通值，由调用方持有并显式传入重建流程；
/// 其唯一约束是所有键都由当前加载文档的提取过程产生。
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use crate::extract::UnitId;
use crate::utils::FixerError;

/// 修订映射
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Revisions {
    entries: HashMap<UnitId, String>,
}

/// 列表形式的修订条目（与提取输出的结构兼容，多余字段被忽略）
#[derive(Debug, Clone, Deserialize)]
struct RevisionEntry {
    id: UnitId,
    text: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RevisionFile {
    Map(HashMap<UnitId, String>),
    List(Vec<RevisionEntry>),
}

impl Revisions {
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加或覆盖修订，返回被覆盖的旧文本
    pub fn insert(&mut self, id: UnitId, text: impl Into<String>) -> Option<String> {
        self.entries.insert(id, text.into())
    }

    pub fn remove(&mut self, id: &UnitId) -> Option<String> {
        self.entries.remove(id)
    }

    pub fn get(&self, id: &UnitId) -> Option<&str> {
        self.entries.get(id).map(String::as_str)
    }

    pub fn contains(&self, id: &UnitId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&UnitId, &str)> {
        self.entries.iter().map(|(id, text)| (id, text.as_str()))
    }

    /// 按 ID 排序的条目（用于稳定的输出顺序）
    pub fn sorted(&self) -> Vec<(&UnitId, &str)> {
        let mut items: Vec<_> = self.iter().collect();
        items.sort_by(|a, b| a.0.cmp(b.0));
        items
    }

    /// 涉及的内容文件路径
    pub fn content_paths(&self) -> BTreeSet<&str> {
        self.entries.keys().map(|id| id.content_path.as_str()).collect()
    }

    /// 取出属于某个内容文件的修订
    pub fn for_content_path(&self, content_path: &str) -> FileRevisions {
        let edits = self
            .entries
            .iter()
            .filter(|(id, _)| id.content_path == content_path)
            .map(|(id, text)| ((id.block_index, id.sentence_index), text.clone()))
            .collect();
        FileRevisions {
            content_path: content_path.to_string(),
            edits,
        }
    }

    /// 拆分为（保留的修订，被过滤掉的 ID）
    pub fn partition<F>(&self, mut keep: F) -> (Revisions, Vec<UnitId>)
    where
        F: FnMut(&UnitId, &str) -> bool,
    {
        let mut kept = Revisions::new();
        let mut dropped = Vec::new();
        for (id, text) in &self.entries {
            if keep(id, text) {
                kept.entries.insert(id.clone(), text.clone());
            } else {
                dropped.push(id.clone());
            }
        }
        dropped.sort();
        (kept, dropped)
    }

    /// 从 JSON 解析：支持 `{ "id": "text" }` 对象，或 `[{ "id", "text", ... }]` 数组
    pub fn from_json(json: &str) -> Result<Self, FixerError> {
        let entries = match serde_json::from_str::<RevisionFile>(json)? {
            RevisionFile::Map(map) => map,
            RevisionFile::List(list) => list.into_iter().map(|e| (e.id, e.text)).collect(),
        };
        Ok(Self { entries })
    }

    pub fn to_json_pretty(&self) -> Result<String, FixerError> {
        let ordered: std::collections::BTreeMap<String, &str> = self
            .iter()
            .map(|(id, text)| (id.to_string(), text))
            .collect();
        Ok(serde_json::to_string_pretty(&ordered)?)
    }
}

impl FromIterator<(UnitId, String)> for Revisions {
    fn from_iter<T: IntoIterator<Item = (UnitId, String)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// 单个内容文件的修订，按 `(block_index, sentence_index)` 索引
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileRevisions {
    pub content_path: String,
    edits: HashMap<(usize, usize), String>,
}

impl FileRevisions {
    pub fn new(content_path: impl Into<String>) -> Self {
        Self {
            content_path: content_path.into(),
            edits: HashMap::new(),
        }
    }

    pub fn insert(&mut self, block_index: usize, sentence_index: usize, text: impl Into<String>) {
        self.edits.insert((block_index, sentence_index), text.into());
    }

    /// 该块是否有任何修订
    pub fn touches_block(&self, block_index: usize) -> bool {
        self.edits.keys().any(|(block, _)| *block == block_index)
    }

    pub fn get(&self, block_index: usize, sentence_index: usize) -> Option<&str> {
        self.edits.get(&(block_index, sentence_index)).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }
}
