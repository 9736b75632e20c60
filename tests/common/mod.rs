//! 集成测试共用的测试书构造

use std::path::{Path, PathBuf};

use epub_fixer::{ArchiveWriter, EpubArchive};

pub const CONTAINER: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>
"#;

pub const OPF: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0" unique-identifier="uid">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:identifier id="uid">test-book</dc:identifier>
    <dc:title>A Small Test Book</dc:title>
    <dc:language>en</dc:language>
  </metadata>
  <manifest>
    <item id="style" href="style.css" media-type="text/css"/>
    <item id="ch2" href="Text/ch2.xhtml" media-type="application/xhtml+xml"/>
    <item id="ch1" href="Text/ch1.xhtml" media-type="application/xhtml+xml"/>
  </manifest>
  <spine>
    <itemref idref="ch1"/>
    <itemref idref="ch2"/>
  </spine>
</package>
"#;

pub const CH1_PATH: &str = "OEBPS/Text/ch1.xhtml";
pub const CH2_PATH: &str = "OEBPS/Text/ch2.xhtml";

pub const CH1: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml">
<head><title>Chapter 1</title><link rel="stylesheet" href="../style.css"/></head>
<body>
  <h1 id="c1">Chaptr 1</h1>
  <div class="scene">
    <p>The <b>qick</b> brown fox jumps.  It landed <i>softly</i>.</p>
    <p>Second paragraph &amp; more.</p>
  </div>
  <ul><li>Item one.</li></ul>
</body>
</html>
"#;

pub const CH2: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<html xmlns="http://www.w3.org/1999/xhtml">
<body>
  <p>Another chapter begins here. <em>Really</em> it does!</p>
  <span>Loose span text.</span>
  <p>   </p>
</body>
</html>
"#;

pub fn build_archive() -> EpubArchive {
    let mut archive = EpubArchive::new();
    archive
        .write_entry("META-INF/container.xml", CONTAINER.to_string())
        .unwrap();
    archive.write_entry("OEBPS/content.opf", OPF.to_string()).unwrap();
    archive
        .write_entry("OEBPS/style.css", "p { margin: 0; }".to_string())
        .unwrap();
    archive.write_entry(CH1_PATH, CH1.to_string()).unwrap();
    archive.write_entry(CH2_PATH, CH2.to_string()).unwrap();
    archive
}

/// 在临时目录中写出测试书，返回文件路径
pub fn write_book(dir: &Path) -> PathBuf {
    let path = dir.join("book.epub");
    build_archive().write_to_file(&path).unwrap();
    path
}
