/// 无损标记树
///
/// 使用 quick-xml 的事件流构建 arena 树。每个节点保留足以原样重建源码的信息：
/// - 元素：起始标签内部的原始内容、结束标签的完整原始源码
/// - 文本：原始转义字节（未修改时原样输出）与解码后的纯文本
/// - CDATA、注释、声明、处理指令、DOCTYPE：读取位置之间截取的完整原始源码
use std::fmt::Write as _;

use quick_xml::events::Event;
use quick_xml::Reader;
use thiserror::Error;

use super::entities::{decode_text, encode_text};

/// 标记解析错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MarkupError {
    #[error("syntax error at byte {position}: {message}")]
    Syntax { position: u64, message: String },

    #[error("undecodable text at byte {position}: {message}")]
    Text { position: u64, message: String },

    #[error("unexpected closing tag {0}")]
    UnexpectedClose(String),

    #[error("unclosed element <{0}>")]
    Unclosed(String),
}

/// 节点句柄（arena 索引）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// 元素节点
#[derive(Debug, Clone)]
pub struct Element {
    /// 小写的本地名（去掉命名空间前缀）
    pub name: String,
    /// `<` 与 `>` 之间的原始内容（自闭合标签不含 `/`）
    raw_start: String,
    /// 结束标签的完整原始源码（如 `</p >`）；自闭合元素为 None
    raw_end: Option<String>,
}

impl Element {
    /// 是否为自闭合元素（`<br/>`）
    pub fn is_self_closing(&self) -> bool {
        self.raw_end.is_none()
    }

    /// 限定名（含前缀），用于补写结束标签
    fn qualified_name(&self) -> &str {
        self.raw_start
            .split(|c: char| c.is_ascii_whitespace())
            .next()
            .unwrap_or(&self.raw_start)
    }
}

/// 文本叶子（普通文本或 CDATA）
#[derive(Debug, Clone)]
pub struct TextLeaf {
    /// 原始源码；文本被修改后置为 None，序列化时重新转义
    raw: Option<String>,
    /// 解码后的纯文本
    text: String,
    cdata: bool,
}

impl TextLeaf {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_cdata(&self) -> bool {
        self.cdata
    }

    /// 文本是否已被修改
    pub fn is_dirty(&self) -> bool {
        self.raw.is_none()
    }
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    Root,
    Element(Element),
    Text(TextLeaf),
    /// 注释、XML 声明、处理指令、DOCTYPE 的原始源码
    Raw(String),
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// 标记文档
#[derive(Debug, Clone)]
pub struct MarkupDocument {
    nodes: Vec<Node>,
}

fn utf8(bytes: &[u8], position: u64) -> Result<&str, MarkupError> {
    std::str::from_utf8(bytes).map_err(|e| MarkupError::Text {
        position,
        message: e.to_string(),
    })
}

/// 两个读取位置之间的原始源码
fn source(input: &str, start: u64, end: u64) -> Result<&str, MarkupError> {
    usize::try_from(start)
        .ok()
        .zip(usize::try_from(end).ok())
        .and_then(|(start, end)| input.get(start..end))
        .ok_or_else(|| MarkupError::Syntax {
            position: start,
            message: format!("event span {}..{} outside input", start, end),
        })
}

impl MarkupDocument {
    /// 解析标记文本
    ///
    /// 结束标签不匹配、元素未闭合、无法解码的实体都会返回错误。
    pub fn parse(input: &str) -> Result<Self, MarkupError> {
        let mut reader = Reader::from_str(input);
        reader.config_mut().trim_text(false);

        let mut doc = MarkupDocument {
            nodes: vec![Node {
                kind: NodeKind::Root,
                parent: None,
                children: Vec::new(),
            }],
        };
        let mut stack = vec![doc.root()];

        loop {
            let position = reader.buffer_position();
            let event = reader.read_event().map_err(|e| MarkupError::Syntax {
                position: reader.error_position(),
                message: e.to_string(),
            })?;
            let parent = *stack.last().unwrap_or(&NodeId(0));

            match event {
                Event::Start(e) => {
                    let element = Element {
                        name: utf8(e.local_name().as_ref(), position)?.to_ascii_lowercase(),
                        raw_start: utf8(&e, position)?.to_string(),
                        raw_end: Some(String::new()),
                    };
                    let id = doc.push(parent, NodeKind::Element(element));
                    stack.push(id);
                }
                Event::Empty(e) => {
                    let element = Element {
                        name: utf8(e.local_name().as_ref(), position)?.to_ascii_lowercase(),
                        raw_start: utf8(&e, position)?.to_string(),
                        raw_end: None,
                    };
                    doc.push(parent, NodeKind::Element(element));
                }
                Event::End(_) => {
                    let raw = source(input, position, reader.buffer_position())?;
                    if stack.len() <= 1 {
                        return Err(MarkupError::UnexpectedClose(raw.to_string()));
                    }
                    if let NodeKind::Element(element) = &mut doc.nodes[parent.0].kind {
                        element.raw_end = Some(raw.to_string());
                    }
                    stack.pop();
                }
                Event::Text(e) => {
                    let raw = utf8(&e, position)?;
                    let text = decode_text(raw).map_err(|err| MarkupError::Text {
                        position,
                        message: err.to_string(),
                    })?;
                    let leaf = TextLeaf {
                        text: text.into_owned(),
                        raw: Some(raw.to_string()),
                        cdata: false,
                    };
                    doc.push(parent, NodeKind::Text(leaf));
                }
                Event::CData(e) => {
                    let leaf = TextLeaf {
                        raw: Some(source(input, position, reader.buffer_position())?.to_string()),
                        text: utf8(&e, position)?.to_string(),
                        cdata: true,
                    };
                    doc.push(parent, NodeKind::Text(leaf));
                }
                Event::Comment(_) | Event::Decl(_) | Event::PI(_) | Event::DocType(_) => {
                    let raw = source(input, position, reader.buffer_position())?;
                    doc.push(parent, NodeKind::Raw(raw.to_string()));
                }
                Event::Eof => break,
            }
        }

        if stack.len() > 1 {
            let open = stack
                .last()
                .and_then(|id| doc.element(*id))
                .map(|e| e.name.clone())
                .unwrap_or_default();
            return Err(MarkupError::Unclosed(open));
        }

        Ok(doc)
    }

    fn push(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.nodes[id.0].kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    /// 元素的小写本地名；非元素节点返回 None
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|e| e.name.as_str())
    }

    /// 按文档顺序（深度优先前序）返回 `id` 的所有后代，不含自身
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut pending: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = pending.pop() {
            out.push(next);
            pending.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    /// 文本叶子（文本与 CDATA），按文档顺序
    pub fn text_leaves(&self, id: NodeId) -> Vec<NodeId> {
        self.descendants(id)
            .into_iter()
            .filter(|n| matches!(self.kind(*n), NodeKind::Text(_)))
            .collect()
    }

    pub fn leaf_text(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].kind {
            NodeKind::Text(leaf) => Some(leaf.text()),
            _ => None,
        }
    }

    /// 扁平化纯文本：所有后代文本叶子的拼接
    pub fn text_content(&self, id: NodeId) -> String {
        self.text_leaves(id)
            .into_iter()
            .filter_map(|leaf| self.leaf_text(leaf))
            .collect()
    }

    /// 替换文本叶子的内容；内容不变时保留原始字节
    pub fn set_leaf_text(&mut self, id: NodeId, text: String) {
        if let NodeKind::Text(leaf) = &mut self.nodes[id.0].kind {
            if leaf.text != text {
                leaf.text = text;
                leaf.raw = None;
            }
        }
    }

    /// 在 `parent` 末尾追加新的文本叶子
    pub fn append_text(&mut self, parent: NodeId, text: String) -> NodeId {
        let leaf = TextLeaf {
            raw: None,
            text,
            cdata: false,
        };
        self.push(parent, NodeKind::Text(leaf))
    }

    /// 序列化整个文档
    pub fn serialize(&self) -> String {
        self.inner_markup(self.root())
    }

    /// 序列化节点的全部子节点（即元素的 innerHTML）
    pub fn inner_markup(&self, id: NodeId) -> String {
        let mut out = String::new();
        for child in self.children(id) {
            self.write_node(*child, &mut out);
        }
        out
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        match self.kind(id) {
            NodeKind::Root => {
                for child in self.children(id) {
                    self.write_node(*child, out);
                }
            }
            NodeKind::Raw(raw) => out.push_str(raw),
            NodeKind::Text(leaf) => match (&leaf.raw, leaf.cdata) {
                (Some(raw), _) => out.push_str(raw),
                (None, true) => {
                    let _ = write!(out, "<![CDATA[{}]]>", leaf.text.replace("]]>", "]]]]><![CDATA[>"));
                }
                (None, false) => out.push_str(&encode_text(&leaf.text)),
            },
            NodeKind::Element(element) => {
                let children = self.children(id);
                match &element.raw_end {
                    None if children.is_empty() => {
                        let _ = write!(out, "<{}/>", element.raw_start);
                    }
                    raw_end => {
                        let _ = write!(out, "<{}>", element.raw_start);
                        for child in children {
                            self.write_node(*child, out);
                        }
                        match raw_end.as_deref().filter(|raw| !raw.is_empty()) {
                            Some(raw) => out.push_str(raw),
                            None => {
                                let _ = write!(out, "</{}>", element.qualified_name());
                            }
                        }
                    }
                }
            }
        }
    }

    /// 结构轮廓：每个元素与文本叶子一行，用于比较两棵树的标签结构与文本
    pub fn outline(&self) -> Vec<String> {
        let mut lines = Vec::new();
        self.outline_node(self.root(), 0, &mut lines);
        lines
    }

    fn outline_node(&self, id: NodeId, depth: usize, lines: &mut Vec<String>) {
        for child in self.children(id) {
            let indent = "  ".repeat(depth);
            match self.kind(*child) {
                NodeKind::Element(element) => {
                    lines.push(format!("{}<{}>", indent, element.raw_start));
                    self.outline_node(*child, depth + 1, lines);
                }
                NodeKind::Text(leaf) => lines.push(format!("{}{:?}", indent, leaf.text)),
                NodeKind::Raw(raw) => lines.push(format!("{}{}", indent, raw)),
                NodeKind::Root => {}
            }
        }
    }
}
