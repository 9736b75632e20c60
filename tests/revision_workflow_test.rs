//! 修订工作流集成测试：搜索 → 提交 → 审阅 → 保存 → 重新加载

mod common;

use common::*;
use epub_fixer::{
    ArchiveReader, EngineConfig, EpubArchive, EpubDocument, EpubEditor, FixerError, MarkupDocument,
    Revisions, UnitId,
};

fn editor() -> EpubEditor {
    let document =
        EpubDocument::from_archive("book.epub", build_archive(), EngineConfig::default()).unwrap();
    EpubEditor::new(document)
}

fn find_id(editor: &EpubEditor, term: &str) -> UnitId {
    editor.search(term)[0].0.id.clone()
}

/// 元素名序列，用于确认没有标签被增删或重排
fn element_outline(markup: &str) -> Vec<String> {
    MarkupDocument::parse(markup)
        .unwrap()
        .outline()
        .into_iter()
        .filter(|line| line.trim_start().starts_with('<'))
        .collect()
}

#[test]
fn test_fix_typo_and_reload() {
    let dir = tempfile::TempDir::new().unwrap();
    let mut editor = editor();

    let id = find_id(&editor, "QICK");
    editor.commit(&id, "The quick brown fox jumps.").unwrap();

    let output = dir.path().join(editor.output_file_name());
    assert!(output.ends_with("fixed_book.epub"));
    let (report, _) = editor.save(&output).unwrap();
    assert_eq!(report.files_rebuilt, vec![CH1_PATH]);
    assert_eq!(report.blocks_patched, 1);

    let saved = EpubArchive::open(&output).unwrap();
    let chapter = saved.read_entry(CH1_PATH).unwrap().unwrap();
    assert_eq!(chapter, CH1.replace("<b>qick</b>", "<b>quick</b>"));
    assert_eq!(element_outline(&chapter), element_outline(CH1));

    // 未涉及的章节逐字节保留
    assert_eq!(saved.read_entry(CH2_PATH).unwrap().as_deref(), Some(CH2));

    let reloaded = EpubDocument::load(&output, EngineConfig::default()).unwrap();
    let texts: Vec<&str> = reloaded.units().iter().map(|u| u.text.as_str()).collect();
    assert!(texts.contains(&"The quick brown fox jumps."));
    assert!(texts.contains(&"It landed softly."));
    assert!(!texts.contains(&"The qick brown fox jumps."));
    // 修订后单元 ID 不变
    assert_eq!(reloaded.find(&id).unwrap().text, "The quick brown fox jumps.");
}

#[test]
fn test_several_revisions_across_files() {
    let mut editor = editor();
    editor.commit(&find_id(&editor, "chaptr"), "Chapter 1").unwrap();
    editor.commit(&find_id(&editor, "landed"), "It landed gently.").unwrap();
    editor.commit(&find_id(&editor, "really"), "Really, it does!").unwrap();
    editor.commit(&find_id(&editor, "& more"), "Second paragraph & much more.").unwrap();

    let (archive, report) = editor.document().rebuild(editor.revisions()).unwrap();
    assert_eq!(report.revisions_applied, 4);
    assert_eq!(report.files_rebuilt, vec![CH1_PATH, CH2_PATH]);

    let ch1 = archive.read_entry(CH1_PATH).unwrap().unwrap();
    assert!(ch1.contains(r#"<h1 id="c1">Chapter 1</h1>"#));
    assert!(ch1.contains("The <b>qick</b> brown fox jumps.  It landed"));
    assert!(ch1.contains("</i>.</p>"));
    assert!(ch1.contains("<p>Second paragraph &amp; much more.</p>"));
    assert_eq!(element_outline(&ch1).len(), element_outline(CH1).len());

    let ch2 = archive.read_entry(CH2_PATH).unwrap().unwrap();
    assert!(ch2.contains("<em>"));
    let rebuilt = EpubDocument::from_archive("fixed.epub", archive, EngineConfig::default()).unwrap();
    let texts: Vec<&str> = rebuilt.units().iter().map(|u| u.text.as_str()).collect();
    assert!(texts.contains(&"Really, it does!"));
    assert!(texts.contains(&"It landed gently."));
}

#[test]
fn test_undo_before_save() {
    let mut editor = editor();
    let id = find_id(&editor, "qick");
    editor.commit(&id, "The quick brown fox jumps.").unwrap();
    editor.undo();
    assert!(!editor.is_modified());

    let (archive, report) = editor.document().rebuild(editor.revisions()).unwrap();
    assert_eq!(report.revisions_applied, 0);
    assert_eq!(archive.read_entry(CH1_PATH).unwrap().as_deref(), Some(CH1));

    editor.redo();
    assert_eq!(editor.display_text(&id), Some("The quick brown fox jumps."));
}

#[test]
fn test_revision_file_from_extract_output() {
    let editor_source = editor();
    let mut units = editor_source.document().units().to_vec();
    units[4].text = "Item number one.".to_string();
    let json = serde_json::to_string_pretty(&units).unwrap();

    let revisions = Revisions::from_json(&json).unwrap();
    assert_eq!(revisions.len(), units.len());

    let document = editor_source.document();
    let (archive, report) = document.rebuild(&revisions).unwrap();
    assert_eq!(report.revisions_applied, 1);
    assert_eq!(report.revisions_unchanged, units.len() - 1);
    assert!(archive
        .read_entry(CH1_PATH)
        .unwrap()
        .unwrap()
        .contains("<li>Item number one.</li>"));
}

#[test]
fn test_stale_revisions_reviewed_and_ignored() {
    let mut editor = editor();
    let json = format!(
        r#"{{
            "OEBPS/Text/missing.xhtml#0-0": "Ghost line.",
            "{}#9-0": "No such block.",
            "{}#1-0": "Loose span text, fixed."
        }}"#,
        CH1_PATH, CH2_PATH
    );
    editor.import(Revisions::from_json(&json).unwrap());

    let review = editor.review();
    assert_eq!(review.len(), 3);
    assert_eq!(review[0].original.as_deref(), Some("Loose span text."));
    assert_eq!(review[1].original_or_placeholder(), "(original not found)");
    assert_eq!(review[2].original_or_placeholder(), "(original not found)");

    let (archive, report) = editor.document().rebuild(editor.revisions()).unwrap();
    assert_eq!(report.stale.len(), 2);
    assert_eq!(report.revisions_applied, 1);
    assert_eq!(archive.read_entry(CH1_PATH).unwrap().as_deref(), Some(CH1));
    assert!(archive
        .read_entry(CH2_PATH)
        .unwrap()
        .unwrap()
        .contains("<span>Loose span text, fixed.</span>"));
}

#[test]
fn test_commit_rejects_unknown_unit() {
    let mut editor = editor();
    let result = editor.commit(&UnitId::new(CH1_PATH, 1, 0), "div is never a unit");
    assert!(matches!(result, Err(FixerError::UnknownUnit(_))));
}
