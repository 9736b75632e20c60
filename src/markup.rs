/// 标记树模块
///
/// 将 XHTML 内容文件解析为可原样序列化的树结构。
/// 非文本节点保留原始源码，未修改的文本节点保留原始（转义后的）字节，
/// 因此未修改的树序列化后与输入一致。
///
/// # 架构设计
///
/// - **tree**: 基于 arena 的节点树、解析与序列化
/// - **entities**: 实体引用的解码与文本转义
pub mod entities;
pub mod tree;

pub use tree::{Element, MarkupDocument, MarkupError, NodeId, NodeKind, TextLeaf};
