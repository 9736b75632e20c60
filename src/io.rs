/// IO 抽象层模块
///
/// 该模块提供容器读写的抽象接口，引擎只依赖 trait，便于替换实现和测试 mock。
///
/// # 架构设计
///
/// - **traits**: 定义 ArchiveReader/ArchiveWriter trait 接口
/// - **epub_io**: 基于 ZIP 的 EPUB 容器实现
///
/// # 使用示例
///
/// ```rust,ignore
/// use epub_fixer::io::{ArchiveReader, EpubArchive};
///
/// let archive = EpubArchive::open(Path::new("book.epub"))?;
/// let chapter = archive.read_entry("OEBPS/ch1.xhtml")?;
/// ```
pub mod traits;
pub mod epub_io;

// === 导出 trait 定义 ===
pub use traits::{ArchiveReader, ArchiveWriter};

// === 导出默认实现 ===
pub use epub_io::{decode_entry, EpubArchive, EPUB_MIMETYPE, MIMETYPE_ENTRY};
