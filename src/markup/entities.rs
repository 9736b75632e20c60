/// 实体引用处理
///
/// XML 只预定义了五个实体，而 XHTML 内容文件（尤其是声明了 XHTML 1.1 DTD 的
/// EPUB2 书籍）常用 `&nbsp;`、`&eacute;`、`&euro;` 等 HTML 命名实体。
/// 解码时先查 XML 预定义实体，再查完整的 HTML5 实体表。
use std::borrow::Cow;

use quick_xml::escape::{
    partial_escape, resolve_html5_entity, resolve_xml_entity, unescape_with, EscapeError,
};

/// 解析命名实体（不含 `&` 和 `;`）
pub fn resolve_entity(name: &str) -> Option<&'static str> {
    resolve_xml_entity(name).or_else(|| resolve_html5_entity(name))
}

/// 将原始（转义的）文本解码为纯文本
pub fn decode_text(raw: &str) -> Result<Cow<'_, str>, EscapeError> {
    unescape_with(raw, resolve_entity)
}

/// 将纯文本转义为可写入文本节点的形式（仅转义 `<`、`>`、`&`）
pub fn encode_text(text: &str) -> Cow<'_, str> {
    partial_escape(text)
}
