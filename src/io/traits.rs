/// IO 抽象层 - trait 定义
///
/// 引擎只通过这两个接口访问容器中的条目，不关心底层是 ZIP 文件、内存还是测试 mock。
use crate::utils::FixerError;

/// 容器条目读取 trait
///
/// # 职责
/// - 按路径读取条目并解码为文本
/// - 条目不存在时返回 `Ok(None)`，由调用方决定跳过
pub trait ArchiveReader {
    /// 读取条目文本
    ///
    /// # 参数
    /// * `path` - 容器内路径（以 `/` 分隔，不带前导斜杠）
    fn read_entry(&self, path: &str) -> Result<Option<String>, FixerError>;

    /// 条目是否存在
    fn contains_entry(&self, path: &str) -> bool;

    /// 所有条目路径（按容器内原始顺序）
    fn entry_names(&self) -> Vec<String>;
}

/// 容器条目写入 trait
///
/// # 职责
/// - 覆盖已有条目，或在末尾新增条目
/// - 不负责序列化整个容器
pub trait ArchiveWriter {
    /// 写入条目文本
    ///
    /// # 参数
    /// * `path` - 容器内路径
    /// * `content` - 新的条目内容
    fn write_entry(&mut self, path: &str, content: String) -> Result<(), FixerError>;
}
