/// 包文档解析
///
/// `META-INF/container.xml` → OPF 包文档 → 按 spine 顺序排列的内容文件路径。
/// 任何一步缺失都视为不是合法的 EPUB。
use std::collections::HashMap;

use log::{debug, warn};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::io::ArchiveReader;
use crate::markup::entities::resolve_entity;
use crate::utils::FixerError;

pub const CONTAINER_PATH: &str = "META-INF/container.xml";

/// 包文档信息
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageInfo {
    /// OPF 文件在容器中的路径
    pub opf_path: String,
    /// spine 顺序的内容文件路径
    pub content_paths: Vec<String>,
    /// `dc:language`
    pub language: Option<String>,
    /// `dc:title`
    pub title: Option<String>,
}

impl PackageInfo {
    /// 从容器中解析包文档
    pub fn resolve(archive: &impl ArchiveReader) -> Result<Self, FixerError> {
        let container = archive
            .read_entry(CONTAINER_PATH)?
            .ok_or_else(|| FixerError::InvalidArchive(format!("{} not found", CONTAINER_PATH)))?;

        let opf_path = find_rootfile(&container)
            .map_err(|e| FixerError::InvalidArchive(format!("{}: {}", CONTAINER_PATH, e)))?
            .ok_or_else(|| FixerError::InvalidArchive("OPF path not found".to_string()))?;

        let opf = archive.read_entry(&opf_path)?.ok_or_else(|| {
            FixerError::InvalidArchive(format!("OPF file ({}) not found", opf_path))
        })?;

        let mut package = parse_opf(&opf, &opf_path)
            .map_err(|e| FixerError::InvalidArchive(format!("{}: {}", opf_path, e)))?;
        package.opf_path = opf_path;

        debug!(
            "包文档 {}：{} 个内容文件",
            package.opf_path,
            package.content_paths.len()
        );
        Ok(package)
    }
}

/// 读取属性值（按本地名匹配，忽略前缀）
fn attribute(element: &BytesStart, name: &str) -> Option<String> {
    element
        .attributes()
        .with_checks(false)
        .flatten()
        .find(|attr| attr.key.local_name().as_ref() == name.as_bytes())
        .and_then(|attr| attr.unescape_value_with(resolve_entity).ok())
        .map(|value| value.into_owned())
}

/// 找到第一个 `rootfile@full-path`
fn find_rootfile(container: &str) -> Result<Option<String>, quick_xml::Error> {
    let mut reader = Reader::from_str(container);
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"rootfile" => {
                if let Some(path) = attribute(&e, "full-path") {
                    return Ok(Some(path));
                }
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum MetadataField {
    Title,
    Language,
}

/// 解析 OPF：manifest 的 id → href，spine 的 idref 顺序，以及书名与语言
fn parse_opf(opf: &str, opf_path: &str) -> Result<PackageInfo, quick_xml::Error> {
    let base_dir = opf_path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("");

    let mut reader = Reader::from_str(opf);
    let mut manifest: HashMap<String, String> = HashMap::new();
    let mut spine: Vec<String> = Vec::new();
    let mut package = PackageInfo::default();
    let mut capturing: Option<MetadataField> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) => match e.local_name().as_ref() {
                b"item" => {
                    if let (Some(id), Some(href)) = (attribute(&e, "id"), attribute(&e, "href")) {
                        manifest.insert(id, href);
                    }
                }
                b"itemref" => {
                    if let Some(idref) = attribute(&e, "idref") {
                        spine.push(idref);
                    }
                }
                b"title" if package.title.is_none() => capturing = Some(MetadataField::Title),
                b"language" if package.language.is_none() => {
                    capturing = Some(MetadataField::Language)
                }
                _ => {}
            },
            Event::Text(t) => {
                if let Some(field) = capturing {
                    let value = t.unescape_with(resolve_entity)?.trim().to_string();
                    if !value.is_empty() {
                        match field {
                            MetadataField::Title => package.title = Some(value),
                            MetadataField::Language => package.language = Some(value),
                        }
                    }
                }
            }
            Event::End(_) => capturing = None,
            Event::Eof => break,
            _ => {}
        }
    }

    for idref in spine {
        match manifest.get(&idref) {
            Some(href) => package.content_paths.push(join_archive_path(base_dir, href)),
            None => warn!("spine 项 {} 不在 manifest 中，已跳过", idref),
        }
    }

    Ok(package)
}

/// 将相对 href 解析为容器内路径
///
/// 去掉片段标识，规整 `.` 与 `..`；以 `/` 开头的 href 视为从容器根开始。
pub fn join_archive_path(base_dir: &str, href: &str) -> String {
    let href = href.split('#').next().unwrap_or_default();

    let mut parts: Vec<&str> = Vec::new();
    let start = if href.starts_with('/') { "" } else { base_dir };
    for part in start.split('/').chain(href.split('/')) {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            _ => parts.push(part),
        }
    }
    parts.join("/")
}
