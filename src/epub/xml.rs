//! 强类型的XML元素树
//!
//! 用quick-xml的事件流构建一棵以数组为存储的元素树（元素通过下标引用子节点），
//! 对外只暴露 `attribute(name)`、`children(name)`、`text()` 等显式访问方法。
//! 元素名与属性名都同时支持带前缀的限定名（如 `dc:title`）和本地名（如 `title`）匹配。

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::epub::error::{EpubError, Result};

/// 节点在文档数组中的下标
pub type NodeId = usize;

#[derive(Debug, Clone)]
enum Node {
    Element {
        name: String,
        attributes: Vec<(String, String)>,
        children: Vec<NodeId>,
    },
    Text(String),
}

/// 解析后的XML文档
#[derive(Debug, Clone)]
pub struct XmlDocument {
    nodes: Vec<Node>,
    root: NodeId,
}

/// 元素的子节点：元素或文本
#[derive(Debug, Clone, Copy)]
pub enum XmlChild<'a> {
    Element(XmlElement<'a>),
    Text(&'a str),
}

/// 指向文档中某个元素的轻量句柄
#[derive(Debug, Clone, Copy)]
pub struct XmlElement<'a> {
    doc: &'a XmlDocument,
    id: NodeId,
}

impl XmlDocument {
    /// 解析XML文本
    ///
    /// 文本节点保留原始空白，由调用方决定是否裁剪。
    /// 根元素之外的文本与多余的顶层元素会被忽略。
    pub fn parse(xml: &str) -> Result<XmlDocument> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(false);
        reader.config_mut().expand_empty_elements = true;

        let mut nodes: Vec<Node> = Vec::new();
        let mut stack: Vec<NodeId> = Vec::new();
        let mut root = None;
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(ref e) => {
                    let parent = stack.last().copied();
                    let id = nodes.len();
                    nodes.push(Node::Element {
                        name: String::from_utf8_lossy(e.name().as_ref()).into_owned(),
                        attributes: Self::read_attributes(e)?,
                        children: Vec::new(),
                    });
                    match parent {
                        Some(parent) => Self::push_child(&mut nodes, parent, id),
                        // 多余的顶层元素不挂到树上
                        None if root.is_some() => {}
                        None => root = Some(id),
                    }
                    stack.push(id);
                }
                Event::End(_) => {
                    stack.pop();
                }
                Event::Text(e) => {
                    if let Some(&parent) = stack.last() {
                        let text = e.unescape()?.into_owned();
                        Self::push_text(&mut nodes, parent, text);
                    }
                }
                Event::CData(e) => {
                    if let Some(&parent) = stack.last() {
                        let text = String::from_utf8_lossy(&e.into_inner()).into_owned();
                        Self::push_text(&mut nodes, parent, text);
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        let root = root.ok_or_else(|| EpubError::InvalidXml("文档中没有根元素".to_string()))?;
        Ok(XmlDocument { nodes, root })
    }

    /// 根元素
    pub fn root(&self) -> XmlElement<'_> {
        XmlElement {
            doc: self,
            id: self.root,
        }
    }

    fn read_attributes(e: &BytesStart) -> Result<Vec<(String, String)>> {
        let mut attributes = Vec::new();
        for attr_result in e.attributes() {
            let attr = attr_result
                .map_err(|err| EpubError::Xml(quick_xml::Error::InvalidAttr(err)))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            // 出版商常在属性里写HTML实体，无法转义时保留原文
            let value = match attr.unescape_value() {
                Ok(value) => value.into_owned(),
                Err(_) => String::from_utf8_lossy(&attr.value).into_owned(),
            };
            attributes.push((key, value));
        }
        Ok(attributes)
    }

    fn push_child(nodes: &mut [Node], parent: NodeId, child: NodeId) {
        if let Node::Element { children, .. } = &mut nodes[parent] {
            children.push(child);
        }
    }

    fn push_text(nodes: &mut Vec<Node>, parent: NodeId, text: String) {
        let id = nodes.len();
        nodes.push(Node::Text(text));
        Self::push_child(nodes, parent, id);
    }
}

/// 取限定名的本地部分：`dc:title` → `title`
fn local_part(name: &str) -> &str {
    name.rsplit(':').next().unwrap_or(name)
}

impl<'a> XmlElement<'a> {
    fn data(&self) -> (&'a str, &'a [(String, String)], &'a [NodeId]) {
        match &self.doc.nodes[self.id] {
            Node::Element {
                name,
                attributes,
                children,
            } => (name.as_str(), attributes.as_slice(), children.as_slice()),
            Node::Text(_) => ("", &[][..], &[][..]),
        }
    }

    /// 带前缀的限定名
    pub fn name(&self) -> &'a str {
        self.data().0
    }

    /// 去掉命名空间前缀后的本地名
    pub fn local_name(&self) -> &'a str {
        local_part(self.name())
    }

    /// 元素名是否匹配（限定名或本地名）
    pub fn is(&self, name: &str) -> bool {
        self.name() == name || self.local_name() == name
    }

    /// 按名称取属性值
    ///
    /// 先按完整属性名匹配，再按本地名匹配，因此 `attribute("href")`
    /// 也能取到 `xlink:href`。
    pub fn attribute(&self, name: &str) -> Option<&'a str> {
        let attributes = self.data().1;
        attributes
            .iter()
            .find(|(key, _)| key == name)
            .or_else(|| attributes.iter().find(|(key, _)| local_part(key) == name))
            .map(|(_, value)| value.as_str())
    }

    /// 全部属性（保持文档中的顺序）
    pub fn attributes(&self) -> &'a [(String, String)] {
        self.data().1
    }

    /// 子元素列表；`name`为`None`时返回所有子元素
    pub fn children(&self, name: Option<&str>) -> Vec<XmlElement<'a>> {
        self.nodes()
            .filter_map(|child| match child {
                XmlChild::Element(element) => Some(element),
                XmlChild::Text(_) => None,
            })
            .filter(|element| name.is_none_or(|name| element.is(name)))
            .collect()
    }

    /// 第一个匹配名称的子元素
    pub fn child(&self, name: &str) -> Option<XmlElement<'a>> {
        self.children(Some(name)).into_iter().next()
    }

    /// 子节点（元素与文本），保持文档顺序
    pub fn nodes(self) -> impl Iterator<Item = XmlChild<'a>> + 'a {
        let doc = self.doc;
        self.data().2.iter().map(move |&id| match &doc.nodes[id] {
            Node::Element { .. } => XmlChild::Element(XmlElement { doc, id }),
            Node::Text(text) => XmlChild::Text(text.as_str()),
        })
    }

    /// 所有后代文本拼接后去掉首尾空白
    pub fn text(&self) -> String {
        let mut result = String::new();
        self.collect_text(&mut result);
        result.trim().to_string()
    }

    fn collect_text(&self, result: &mut String) {
        for child in self.nodes() {
            match child {
                XmlChild::Text(text) => result.push_str(text),
                XmlChild::Element(element) => element.collect_text(result),
            }
        }
    }
}
