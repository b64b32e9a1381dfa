//! 目录文档解析器模块
//!
//! 支持两种目录格式：EPUB2的NCX文件（`navMap`/`navPoint`）
//! 与EPUB3的XHTML导航文档（`nav` > `ol` > `li` > `a`）。

use scraper::{ElementRef, Html};
use tracing::debug;

use crate::epub::error::{EpubError, Result};
use crate::epub::ncx::navigation::{NavNodeId, NavTree};
use crate::epub::opf::TocSource;
use crate::epub::xml::{XmlDocument, XmlElement};

/// 目录文档解析结果
#[derive(Debug, Clone)]
pub struct TableOfContents {
    /// 文档标题
    pub title: Option<String>,
    /// 导航树
    pub tree: NavTree,
}

impl TableOfContents {
    /// 按目录来源选择解析方式
    pub fn parse(source: &TocSource, content: &str) -> Result<Self> {
        match source {
            TocSource::Ncx(_) => Self::parse_ncx(content),
            TocSource::Nav(_) => Self::parse_nav(content),
        }
    }

    /// 解析NCX文件内容
    ///
    /// # 错误
    /// * [`EpubError::InvalidXml`] / [`EpubError::Xml`] - 不是合法的XML
    /// * [`EpubError::NavigationParseError`] - 缺少`navMap`元素
    pub fn parse_ncx(xml_content: &str) -> Result<Self> {
        let doc = XmlDocument::parse(xml_content)?;
        let ncx = doc.root();

        let nav_map = ncx
            .child("navMap")
            .ok_or_else(|| EpubError::NavigationParseError("NCX文件中缺少navMap元素".to_string()))?;

        let title = ncx
            .child("docTitle")
            .and_then(|doc_title| doc_title.child("text"))
            .map(|text| text.text())
            .filter(|text| !text.is_empty());

        let mut tree = NavTree::new();
        // 显式栈先序构建，避免深层嵌套时递归过深
        let mut stack: Vec<(XmlElement<'_>, NavNodeId)> = nav_map
            .children(Some("navPoint"))
            .into_iter()
            .rev()
            .map(|point| (point, NavTree::ROOT))
            .collect();

        while let Some((point, parent)) = stack.pop() {
            let label = point
                .child("navLabel")
                .map(|nav_label| match nav_label.child("text") {
                    Some(text) => text.text(),
                    None => nav_label.text(),
                });
            let target = point
                .child("content")
                .and_then(|content| content.attribute("src"))
                .map(str::to_string);

            let id = tree.add_child(parent, label, target);
            stack.extend(
                point
                    .children(Some("navPoint"))
                    .into_iter()
                    .rev()
                    .map(|child| (child, id)),
            );
        }

        debug!(nav_points = tree.len(), depth = tree.depth(), "NCX解析完成");
        Ok(Self { title, tree })
    }

    /// 解析EPUB3导航文档
    ///
    /// 使用HTML5解析器，出版商常见的命名实体（如`&nbsp;`）不会导致失败。
    /// 优先选取`epub:type`包含`toc`的`nav`元素，没有时退回第一个`nav`元素。
    ///
    /// # 错误
    /// * [`EpubError::NavigationParseError`] - 文档中没有`nav`元素
    pub fn parse_nav(html_content: &str) -> Result<Self> {
        let document = Html::parse_document(html_content);
        let navs: Vec<ElementRef<'_>> = document
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .filter(|element| element.value().name() == "nav")
            .collect();

        let nav = navs
            .iter()
            .find(|nav| {
                nav.value()
                    .attr("epub:type")
                    .is_some_and(|types| types.split_whitespace().any(|t| t == "toc"))
            })
            .or_else(|| navs.first())
            .ok_or_else(|| EpubError::NavigationParseError("导航文档中缺少nav元素".to_string()))?;

        let title = child_elements(*nav)
            .find(|element| matches!(element.value().name(), "h1" | "h2" | "h3" | "h4" | "h5" | "h6"))
            .map(collect_text)
            .filter(|text| !text.is_empty());

        let mut tree = NavTree::new();
        let mut stack: Vec<(ElementRef<'_>, NavNodeId)> = Vec::new();
        if let Some(list) = child_elements(*nav).find(|element| element.value().name() == "ol") {
            stack.extend(list_items(list).rev().map(|item| (item, NavTree::ROOT)));
        }

        while let Some((item, parent)) = stack.pop() {
            let anchor = child_elements(item).find(|element| matches!(element.value().name(), "a" | "span"));
            let label = anchor.map(collect_text);
            let target = anchor
                .filter(|anchor| anchor.value().name() == "a")
                .and_then(|anchor| anchor.value().attr("href"))
                .map(str::to_string);

            let id = tree.add_child(parent, label, target);
            if let Some(nested) = child_elements(item).find(|element| element.value().name() == "ol") {
                stack.extend(list_items(nested).rev().map(|child| (child, id)));
            }
        }

        debug!(nav_points = tree.len(), depth = tree.depth(), "导航文档解析完成");
        Ok(Self { title, tree })
    }
}

fn child_elements(element: ElementRef<'_>) -> impl DoubleEndedIterator<Item = ElementRef<'_>> {
    element.children().filter_map(ElementRef::wrap)
}

fn list_items(list: ElementRef<'_>) -> impl DoubleEndedIterator<Item = ElementRef<'_>> {
    child_elements(list).filter(|element| element.value().name() == "li")
}

fn collect_text(element: ElementRef<'_>) -> String {
    element.text().collect::<Vec<_>>().join("").split_whitespace().collect::<Vec<_>>().join(" ")
}
