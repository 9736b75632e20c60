/// 编辑器层模块
///
/// 该模块提供有状态的编辑接口，支持修订追踪、撤销/重做与审阅。
/// 遵循"修改-保存分离"原则，所有修改操作仅在修订映射上进行，需要显式调用保存。
///
/// # 架构设计
///
/// - **session**: 编辑会话，持有文档与修订映射
/// - **history**: 提交历史，支持撤销/重做
pub mod history;
pub mod session;

// === 导出公共接口 ===
pub use history::{RevisionChange, RevisionHistory};
pub use session::{EpubEditor, ReviewItem, ORIGINAL_NOT_FOUND};
