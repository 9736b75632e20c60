pub mod config;
pub mod document;
pub mod editor;
pub mod extract;
pub mod io;
pub mod markup;
pub mod package;
pub mod patch;
pub mod rebuild;
pub mod revision;
pub mod segment;
pub mod utils;

// 重新导出主要结构
pub use config::EngineConfig;
pub use document::{ContentWarning, EpubDocument, RebuildReport, RoundtripCheck, WarningKind};
pub use editor::{EpubEditor, ReviewItem, RevisionChange, RevisionHistory};
pub use extract::{extract_units, SentenceUnit, UnitId};
pub use io::{ArchiveReader, ArchiveWriter, EpubArchive};
pub use markup::{MarkupDocument, MarkupError};
pub use package::PackageInfo;
pub use patch::{apply_text, EditScript, PatchOutcome};
pub use rebuild::{rebuild_content, RebuiltContent};
pub use revision::{FileRevisions, Revisions};
pub use segment::{Segment, Segmenter};
pub use utils::{truncate_for_display, FixerError};

// 常量定义
pub const SUPPORTED_EXTENSIONS: &[&str] = &["epub"];
