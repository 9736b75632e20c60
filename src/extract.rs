/// 句子单元提取模块
///
/// - **walker**: 块遍历规则（提取与重建共用的唯一实现）
/// - **unit**: 句子单元与单元 ID
/// - **extractor**: 从内容文件提取句子单元
pub mod extractor;
pub mod unit;
pub mod walker;

pub use extractor::{extract_from_document, extract_units};
pub use unit::{SentenceUnit, UnitId};
pub use walker::{eligible_blocks, walk_blocks, Block, BLOCK_TAGS, NESTED_BLOCK_TAGS};
