//! EPUB 加载、提取与往返重建集成测试
//!
//! 测试书在临时目录中生成：两个章节，spine 顺序与 manifest 顺序不同，
//! 包含嵌套块、格式标签、实体与只含空白的段落。

mod common;

use std::io::Cursor;

use common::*;
use epub_fixer::{
    ArchiveReader, EngineConfig, EpubArchive, EpubDocument, FixerError, Revisions, Segmenter,
};
use zip::{CompressionMethod, ZipArchive};

fn load(segmenter: Segmenter) -> EpubDocument {
    let config = EngineConfig {
        segmenter,
        ..EngineConfig::default()
    };
    EpubDocument::from_archive("book.epub", build_archive(), config).unwrap()
}

#[test]
fn test_units_follow_spine_and_block_rules() {
    let document = load(Segmenter::Unicode);
    let units: Vec<(String, &str)> = document
        .units()
        .iter()
        .map(|u| (u.id.to_string(), u.text.as_str()))
        .collect();

    assert_eq!(
        units,
        vec![
            (format!("{}#0-0", CH1_PATH), "Chaptr 1"),
            // div (#1) 含有嵌套段落，被跳过但占用序号
            (format!("{}#2-0", CH1_PATH), "The qick brown fox jumps."),
            (format!("{}#2-1", CH1_PATH), "It landed softly."),
            (format!("{}#3-0", CH1_PATH), "Second paragraph & more."),
            (format!("{}#4-0", CH1_PATH), "Item one."),
            (format!("{}#0-0", CH2_PATH), "Another chapter begins here."),
            (format!("{}#0-1", CH2_PATH), "Really it does!"),
            (format!("{}#1-0", CH2_PATH), "Loose span text."),
        ]
    );

    let package = document.package();
    assert_eq!(package.title.as_deref(), Some("A Small Test Book"));
    assert_eq!(package.language.as_deref(), Some("en"));
    assert!(document.warnings().is_empty());
}

#[test]
fn test_context_is_block_inner_markup() {
    let document = load(Segmenter::Unicode);
    let unit = &document.units()[1];
    assert_eq!(unit.content_path, CH1_PATH);
    assert_eq!(
        unit.context,
        "The <b>qick</b> brown fox jumps.  It landed <i>softly</i>."
    );
}

#[test]
fn test_extraction_is_deterministic() {
    let first = load(Segmenter::Unicode);
    let second = load(Segmenter::Unicode);
    assert_eq!(first.units(), second.units());

    let sequential = EpubDocument::from_archive(
        "book.epub",
        build_archive(),
        EngineConfig {
            parallel: false,
            ..EngineConfig::default()
        },
    )
    .unwrap();
    assert_eq!(first.units(), sequential.units());
}

#[test]
fn test_empty_revisions_rebuild_is_identity() {
    let document = load(Segmenter::Unicode);
    let (archive, report) = document.rebuild(&Revisions::new()).unwrap();

    assert!(report.files_rebuilt.is_empty());
    for name in document.archive().entry_names() {
        assert_eq!(archive.entry_bytes(&name), document.archive().entry_bytes(&name), "{}", name);
    }

    let checks = document.verify_roundtrip();
    assert_eq!(checks.len(), 2);
    assert!(checks.iter().all(|c| c.identical_bytes && c.identical_structure));
}

#[test]
fn test_load_and_save_from_disk() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = write_book(dir.path());

    let document = EpubDocument::load(&path, EngineConfig::default()).unwrap();
    assert_eq!(document.file_name(), "book.epub");
    assert_eq!(document.units().len(), 8);

    let output = dir.path().join("out").join("copy.epub");
    document.save(&Revisions::new(), &output).unwrap();

    let bytes = std::fs::read(&output).unwrap();
    let mut zip = ZipArchive::new(Cursor::new(bytes)).unwrap();
    let first = zip.by_index(0).unwrap();
    assert_eq!(first.name(), "mimetype");
    assert_eq!(first.compression(), CompressionMethod::Stored);
    drop(first);

    let reloaded = EpubDocument::load(&output, EngineConfig::default()).unwrap();
    assert_eq!(reloaded.units(), document.units());
}

#[test]
fn test_punctuation_segmenter_end_to_end() {
    let document = load(Segmenter::Punctuation);
    let texts: Vec<&str> = document.units().iter().map(|u| u.text.as_str()).collect();
    assert!(texts.contains(&"The qick brown fox jumps."));
    assert!(texts.contains(&"Really it does!"));

    let target = document
        .units()
        .iter()
        .find(|u| u.text == "It landed softly.")
        .unwrap();
    let mut revisions = Revisions::new();
    revisions.insert(target.id.clone(), "It landed very softly.");

    let (archive, report) = document.rebuild(&revisions).unwrap();
    assert_eq!(report.revisions_applied, 1);
    let chapter = archive.read_entry(CH1_PATH).unwrap().unwrap();
    assert!(chapter.contains("jumps.  It landed "));
    assert!(chapter.contains("softly</i>.</p>"));
}

#[test]
fn test_not_an_epub() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("broken.epub");
    std::fs::write(&path, b"this is not a zip").unwrap();
    assert!(matches!(
        EpubDocument::load(&path, EngineConfig::default()),
        Err(FixerError::InvalidArchive(_))
    ));

    // 合法 ZIP 但没有 container.xml
    let empty = EpubArchive::new();
    assert!(matches!(
        EpubDocument::from_archive("empty.epub", empty, EngineConfig::default()),
        Err(FixerError::InvalidArchive(_))
    ));
}
