/// 已加载的 EPUB 文档
///
/// 持有容器、包信息以及按 spine 顺序提取出的全部句子单元。
/// 加载和重建都是整体操作：重建产生新的容器值，不修改文档本身，
/// 因此重建失败后文档与修订映射仍可直接重试。
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::path::Path;

use log::{debug, info, warn};
use rayon::prelude::*;

use crate::config::EngineConfig;
use crate::extract::{extract_units, SentenceUnit, UnitId};
use crate::io::{ArchiveReader, ArchiveWriter, EpubArchive};
use crate::markup::MarkupDocument;
use crate::package::PackageInfo;
use crate::rebuild::{rebuild_content, RebuiltContent};
use crate::revision::{FileRevisions, Revisions};
use crate::utils::FixerError;

/// 非致命问题的类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    /// spine 引用的条目在容器中不存在
    MissingEntry,
    /// 内容文件无法解析
    MalformedMarkup,
}

/// 被跳过的内容文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentWarning {
    pub content_path: String,
    pub kind: WarningKind,
    pub message: String,
}

impl ContentWarning {
    fn from_error(content_path: &str, error: &FixerError) -> Self {
        let kind = match error {
            FixerError::MissingEntry(_) => WarningKind::MissingEntry,
            _ => WarningKind::MalformedMarkup,
        };
        Self {
            content_path: content_path.to_string(),
            kind,
            message: error.to_string(),
        }
    }
}

impl fmt::Display for ContentWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// 重建统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RebuildReport {
    /// 被改写的内容文件
    pub files_rebuilt: Vec<String>,
    pub blocks_patched: usize,
    pub revisions_applied: usize,
    /// 与原文相同而被忽略的修订数
    pub revisions_unchanged: usize,
    /// 不属于当前文档的修订 ID
    pub stale: Vec<UnitId>,
    pub warnings: Vec<ContentWarning>,
}

/// 单个内容文件的往返校验结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundtripCheck {
    pub content_path: String,
    /// 序列化结果与原文逐字节相同
    pub identical_bytes: bool,
    /// 重新解析后的文本叶子与标签结构相同
    pub identical_structure: bool,
}

impl RoundtripCheck {
    pub fn passed(&self) -> bool {
        self.identical_structure
    }
}

pub struct EpubDocument {
    file_name: String,
    archive: EpubArchive,
    package: PackageInfo,
    units: Vec<SentenceUnit>,
    index: HashMap<UnitId, usize>,
    warnings: Vec<ContentWarning>,
    config: EngineConfig,
}

impl EpubDocument {
    /// 从文件加载 EPUB
    ///
    /// # 参数
    /// * `path` - EPUB 文件路径
    /// * `config` - 引擎配置（切分策略在文档生命周期内固定）
    ///
    /// # 返回
    /// 容器无法打开或不是合法 EPUB 时返回错误，不会产生部分文档
    pub fn load(path: &Path, config: EngineConfig) -> Result<Self, FixerError> {
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("book.epub")
            .to_string();
        let archive = EpubArchive::open(path)?;
        Self::from_archive(file_name, archive, config)
    }

    /// 从已打开的容器构建文档
    pub fn from_archive(
        file_name: impl Into<String>,
        archive: EpubArchive,
        config: EngineConfig,
    ) -> Result<Self, FixerError> {
        let file_name = file_name.into();
        let mut package = PackageInfo::resolve(&archive)?;

        // 同一文件在 spine 中重复出现时只处理一次，否则单元 ID 会冲突
        let mut seen = BTreeSet::new();
        package.content_paths.retain(|path| seen.insert(path.clone()));

        let results = map_paths(&package.content_paths, config.parallel, |path| {
            extract_file(&archive, path, &config)
        });

        let mut units = Vec::new();
        let mut warnings = Vec::new();
        for result in results {
            match result {
                Ok(file_units) => units.extend(file_units),
                Err(warning) => {
                    warn!("跳过 {}: {}", warning.content_path, warning.message);
                    warnings.push(warning);
                }
            }
        }

        let index = units
            .iter()
            .enumerate()
            .map(|(position, unit)| (unit.id.clone(), position))
            .collect();

        info!(
            "{}: {} 个内容文件，{} 个句子单元，{} 个警告",
            file_name,
            package.content_paths.len(),
            units.len(),
            warnings.len()
        );

        Ok(Self {
            file_name,
            archive,
            package,
            units,
            index,
            warnings,
            config,
        })
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn package(&self) -> &PackageInfo {
        &self.package
    }

    pub fn archive(&self) -> &EpubArchive {
        &self.archive
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// spine 顺序的全部句子单元
    pub fn units(&self) -> &[SentenceUnit] {
        &self.units
    }

    /// 加载时被跳过的内容文件
    pub fn warnings(&self) -> &[ContentWarning] {
        &self.warnings
    }

    pub fn find(&self, id: &UnitId) -> Option<&SentenceUnit> {
        self.index.get(id).map(|&position| &self.units[position])
    }

    /// 单元在 spine 顺序中的位置
    pub fn position(&self, id: &UnitId) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn contains(&self, id: &UnitId) -> bool {
        self.index.contains_key(id)
    }

    /// 不区分大小写的子串搜索；空关键字不返回结果
    pub fn search(&self, term: &str) -> Vec<&SentenceUnit> {
        if term.is_empty() {
            return Vec::new();
        }
        let term = term.to_lowercase();
        self.units
            .iter()
            .filter(|unit| unit.text.to_lowercase().contains(&term))
            .collect()
    }

    /// 过滤修订：去掉不属于本文档的 ID 和与原文相同的文本
    ///
    /// # 返回
    /// （生效的修订，与原文相同的条数，不属于本文档的 ID）
    pub fn effective_revisions(&self, revisions: &Revisions) -> (Revisions, usize, Vec<UnitId>) {
        let (kept, dropped) = revisions.partition(|id, text| {
            self.find(id).is_some_and(|unit| unit.text != text)
        });

        let (unchanged, stale): (Vec<UnitId>, Vec<UnitId>) =
            dropped.into_iter().partition(|id| self.contains(id));

        for id in &stale {
            debug!("忽略不属于当前文档的修订: {}", id);
        }

        (kept, unchanged.len(), stale)
    }

    /// 应用修订并生成新的容器
    ///
    /// 只有含有效修订的内容文件会被重新解析和改写，其余条目原样保留。
    pub fn rebuild(&self, revisions: &Revisions) -> Result<(EpubArchive, RebuildReport), FixerError> {
        let (effective, revisions_unchanged, stale) = self.effective_revisions(revisions);
        let touched = effective.content_paths();

        // 保持 spine 顺序
        let paths: Vec<String> = self
            .package
            .content_paths
            .iter()
            .filter(|path| touched.contains(path.as_str()))
            .cloned()
            .collect();

        let results = map_paths(&paths, self.config.parallel, |path| {
            self.rebuild_file(path, &effective.for_content_path(path))
        });

        let mut archive = self.archive.clone();
        let mut report = RebuildReport {
            revisions_unchanged,
            stale,
            ..RebuildReport::default()
        };

        for (path, result) in paths.iter().zip(results) {
            match result {
                Ok(rebuilt) => {
                    report.blocks_patched += rebuilt.blocks_patched;
                    report.revisions_applied += rebuilt.revisions_applied;
                    if rebuilt.blocks_patched > 0 {
                        archive.write_entry(path, rebuilt.markup)?;
                        report.files_rebuilt.push(path.clone());
                    }
                }
                Err(warning) => {
                    warn!("重建时跳过 {}: {}", warning.content_path, warning.message);
                    report.warnings.push(warning);
                }
            }
        }

        info!(
            "重建完成：{} 个文件，{} 个块，{} 条修订",
            report.files_rebuilt.len(),
            report.blocks_patched,
            report.revisions_applied
        );
        Ok((archive, report))
    }

    fn rebuild_file(
        &self,
        content_path: &str,
        revisions: &FileRevisions,
    ) -> Result<RebuiltContent, ContentWarning> {
        let markup = read_content(&self.archive, content_path)?;
        rebuild_content(&markup, revisions, self.config.segmenter).map_err(|source| {
            ContentWarning::from_error(
                content_path,
                &FixerError::MalformedMarkup {
                    path: content_path.to_string(),
                    source,
                },
            )
        })
    }

    /// 重建并写入文件
    pub fn save(&self, revisions: &Revisions, output: &Path) -> Result<RebuildReport, FixerError> {
        let (archive, report) = self.rebuild(revisions)?;
        archive.write_to_file(output)?;
        info!("已保存: {}", output.display());
        Ok(report)
    }

    /// 对每个内容文件做一次无修订的解析-序列化往返，检查文本与结构是否保持不变
    pub fn verify_roundtrip(&self) -> Vec<RoundtripCheck> {
        let results = map_paths(&self.package.content_paths, self.config.parallel, |path| {
            let markup = read_content(&self.archive, path).ok()?;
            let original = MarkupDocument::parse(&markup).ok()?;
            let rebuilt =
                rebuild_content(&markup, &FileRevisions::new(path.as_str()), self.config.segmenter)
                    .ok()?;
            let reparsed = MarkupDocument::parse(&rebuilt.markup).ok()?;

            Some(RoundtripCheck {
                content_path: path.clone(),
                identical_bytes: rebuilt.markup == markup,
                identical_structure: reparsed.outline() == original.outline(),
            })
        });
        results.into_iter().flatten().collect()
    }
}

/// 读取内容文件，缺失时转换为警告
fn read_content(archive: &EpubArchive, content_path: &str) -> Result<String, ContentWarning> {
    archive
        .read_entry(content_path)
        .map_err(|e| ContentWarning::from_error(content_path, &e))?
        .ok_or_else(|| {
            ContentWarning::from_error(
                content_path,
                &FixerError::MissingEntry(content_path.to_string()),
            )
        })
}

fn extract_file(
    archive: &EpubArchive,
    content_path: &str,
    config: &EngineConfig,
) -> Result<Vec<SentenceUnit>, ContentWarning> {
    let markup = read_content(archive, content_path)?;
    let units = extract_units(&markup, content_path, config.segmenter).map_err(|source| {
        ContentWarning::from_error(
            content_path,
            &FixerError::MalformedMarkup {
                path: content_path.to_string(),
                source,
            },
        )
    })?;
    debug!("{}: {} 个句子单元", content_path, units.len());
    Ok(units)
}

/// 按内容文件处理，结果保持输入顺序
fn map_paths<T, F>(paths: &[String], parallel: bool, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(&String) -> T + Sync + Send,
{
    if parallel {
        paths.par_iter().map(f).collect()
    } else {
        paths.iter().map(f).collect()
    }
}
