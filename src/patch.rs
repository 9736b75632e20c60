/// 结构化修补模块
///
/// 将块的纯文本变更转换为针对文本叶子的插入/删除操作，标签与属性保持不变。
///
/// - **script**: 字符级编辑脚本与语义清理
/// - **patcher**: 在文本叶子上重放编辑脚本
pub mod patcher;
pub mod script;

pub use patcher::{apply_text, PatchOutcome};
pub use script::{EditKind, EditOp, EditScript};
