//! 章节内容模块
//!
//! 章节的XHTML被解析为 [`ContentNode`] 树：内部链接带上跳转回调，
//! 外部链接标记为在阅读区之外打开，图片替换为已解析的资源。

mod loader;

use std::fmt;
use std::sync::Arc;

use quick_xml::escape::{escape, partial_escape};

use crate::epub::chapters::Chapter;
use crate::epub::resources::ResourceBlob;

pub use loader::ContentLoader;

/// 内部链接被激活时调用的回调，参数为目标章节
pub type NavigateCallback = Arc<dyn Fn(&Chapter) + Send + Sync>;

/// 改写后的链接
#[derive(Clone)]
pub enum Link {
    /// 指向章节序列中的另一个章节
    Chapter {
        href: String,
        chapter: Chapter,
        on_activate: NavigateCallback,
    },
    /// 在阅读区之外打开
    External { href: String },
    /// 同一文档内的锚点（`#note`）
    Local { href: String },
    /// 清单中有该文件但不在章节序列里，保持无效
    Unresolved { href: String },
}

/// 激活链接的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkActivation {
    /// 已调用跳转回调，值为目标章节序号
    Navigated(usize),
    /// 应由外部打开的地址
    OpenExternal(String),
    /// 文档内跳转的片段（不含`#`）
    ScrollTo(String),
    /// 什么都不做
    Inert,
}

impl Link {
    /// 原始链接地址
    pub fn href(&self) -> &str {
        match self {
            Link::Chapter { href, .. }
            | Link::External { href }
            | Link::Local { href }
            | Link::Unresolved { href } => href,
        }
    }

    /// 目标章节（仅内部链接）
    pub fn chapter(&self) -> Option<&Chapter> {
        match self {
            Link::Chapter { chapter, .. } => Some(chapter),
            _ => None,
        }
    }

    pub fn is_external(&self) -> bool {
        matches!(self, Link::External { .. })
    }

    /// 模拟一次点击
    ///
    /// 只有内部链接会调用跳转回调。
    pub fn activate(&self) -> LinkActivation {
        match self {
            Link::Chapter {
                chapter,
                on_activate,
                ..
            } => {
                on_activate(chapter);
                LinkActivation::Navigated(chapter.index)
            }
            Link::External { href } => LinkActivation::OpenExternal(href.clone()),
            Link::Local { href } => LinkActivation::ScrollTo(href.trim_start_matches('#').to_string()),
            Link::Unresolved { .. } => LinkActivation::Inert,
        }
    }
}

impl fmt::Debug for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Link::Chapter { href, chapter, .. } => f
                .debug_struct("Chapter")
                .field("href", href)
                .field("chapter", &chapter.index)
                .finish_non_exhaustive(),
            Link::External { href } => f.debug_struct("External").field("href", href).finish(),
            Link::Local { href } => f.debug_struct("Local").field("href", href).finish(),
            Link::Unresolved { href } => f.debug_struct("Unresolved").field("href", href).finish(),
        }
    }
}

/// 内容树中的元素
#[derive(Debug, Clone, Default)]
pub struct ContentElement {
    /// 元素名（保留命名空间前缀）
    pub name: String,
    /// 属性，保持文档顺序
    pub attributes: Vec<(String, String)>,
    pub children: Vec<ContentNode>,
    /// 锚点改写结果
    pub link: Option<Link>,
    /// 图片解析结果
    pub image: Option<ResourceBlob>,
}

/// 内容树节点
#[derive(Debug, Clone)]
pub enum ContentNode {
    Element(ContentElement),
    Text(String),
}

/// 取限定名的本地部分：`xlink:href` → `href`
pub(crate) fn local_part(name: &str) -> &str {
    name.rsplit(':').next().unwrap_or(name)
}

/// 没有内容的HTML元素，序列化时自闭合
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// 纯文本输出时跳过的元素
const SKIPPED_IN_TEXT: &[&str] = &["head", "script", "style", "title", "img", "image"];

/// 纯文本输出时在结束处换行的元素
const BLOCK_ELEMENTS: &[&str] = &[
    "p", "div", "h1", "h2", "h3", "h4", "h5", "h6", "li", "tr", "blockquote", "section", "br",
];

impl ContentElement {
    pub fn local_name(&self) -> &str {
        local_part(&self.name)
    }

    /// 按名称取属性值，先匹配完整属性名，再匹配本地名
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attribute_index(name)
            .map(|index| self.attributes[index].1.as_str())
    }

    /// 设置属性；已存在（含带前缀的同名属性）时覆盖
    pub fn set_attribute(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attribute_index(name) {
            Some(index) => self.attributes[index].1 = value,
            None => self.attributes.push((name.to_string(), value)),
        }
    }

    fn attribute_index(&self, name: &str) -> Option<usize> {
        self.attributes
            .iter()
            .position(|(key, _)| key == name)
            .or_else(|| self.attributes.iter().position(|(key, _)| local_part(key) == name))
    }

    fn write_html(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for (key, value) in &self.attributes {
            out.push(' ');
            out.push_str(key);
            out.push_str("=\"");
            out.push_str(&escape(value.as_str()));
            out.push('"');
        }
        if self.children.is_empty() && VOID_ELEMENTS.contains(&self.local_name()) {
            out.push_str("/>");
            return;
        }
        out.push('>');
        for child in &self.children {
            child.write_html(out);
        }
        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }
}

impl ContentNode {
    fn write_html(&self, out: &mut String) {
        match self {
            ContentNode::Text(text) => out.push_str(&partial_escape(text.as_str())),
            ContentNode::Element(element) => element.write_html(out),
        }
    }

    fn write_text(&self, out: &mut String) {
        match self {
            ContentNode::Text(text) => out.push_str(text),
            ContentNode::Element(element) => {
                let name = element.local_name();
                if SKIPPED_IN_TEXT.contains(&name) {
                    return;
                }
                for child in &element.children {
                    child.write_text(out);
                }
                if BLOCK_ELEMENTS.contains(&name) {
                    out.push('\n');
                }
            }
        }
    }

    fn visit<'a>(&'a self, visitor: &mut impl FnMut(&'a ContentElement)) {
        if let ContentNode::Element(element) = self {
            visitor(element);
            for child in &element.children {
                child.visit(visitor);
            }
        }
    }
}

/// 加载并改写后的章节内容
///
/// 内容一次性完整生成，每次切换到该章节都会重新生成。
#[derive(Debug, Clone)]
pub struct ChapterContent {
    /// 所属章节
    pub chapter: Chapter,
    /// `<html>`元素的子节点（通常是`head`和`body`）
    pub nodes: Vec<ContentNode>,
}

impl ChapterContent {
    /// 序列化为HTML片段
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for node in &self.nodes {
            node.write_html(&mut out);
        }
        out
    }

    /// 纯文本内容
    ///
    /// 每行内的连续空白合并为一个空格，空行最多保留一个。
    pub fn text(&self) -> String {
        let mut raw = String::new();
        for node in &self.nodes {
            node.write_text(&mut raw);
        }

        let mut result = String::new();
        let mut blank_lines = 0;
        for line in raw.lines() {
            let line = line.split_whitespace().collect::<Vec<_>>().join(" ");
            if line.is_empty() {
                blank_lines += 1;
                if blank_lines > 1 || result.is_empty() {
                    continue;
                }
            } else {
                blank_lines = 0;
            }
            result.push_str(&line);
            result.push('\n');
        }
        result.trim_end().to_string()
    }

    /// 先序遍历所有元素
    pub fn elements(&self) -> Vec<&ContentElement> {
        let mut elements = Vec::new();
        for node in &self.nodes {
            node.visit(&mut |element| elements.push(element));
        }
        elements
    }

    /// 所有改写过的链接，保持文档顺序
    pub fn links(&self) -> Vec<&Link> {
        self.elements()
            .into_iter()
            .filter_map(|element| element.link.as_ref())
            .collect()
    }

    /// 所有已解析的图片，保持文档顺序
    pub fn images(&self) -> Vec<&ResourceBlob> {
        self.elements()
            .into_iter()
            .filter_map(|element| element.image.as_ref())
            .collect()
    }
}
