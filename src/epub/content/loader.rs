//! 章节内容加载与改写

use scraper::node::Node;
use scraper::{ElementRef, Html};
use tracing::{debug, instrument};

use crate::epub::chapters::{Chapter, ChapterSet};
use crate::epub::config::ContentConfig;
use crate::epub::content::{ChapterContent, ContentElement, ContentNode, Link, NavigateCallback};
use crate::epub::error::Result;
use crate::epub::path::{has_url_scheme, normalize_file_name};
use crate::epub::resources::ManifestResolver;
use crate::epub::xml::{XmlChild, XmlDocument, XmlElement};

/// 章节内容加载器
///
/// 同一章节每次加载都会完整地重新解析和改写；图片经由资源解析器的缓存读取。
pub struct ContentLoader<'a> {
    resolver: &'a ManifestResolver,
    chapters: &'a ChapterSet,
    config: &'a ContentConfig,
    on_navigate: NavigateCallback,
}

impl<'a> ContentLoader<'a> {
    pub fn new(
        resolver: &'a ManifestResolver,
        chapters: &'a ChapterSet,
        config: &'a ContentConfig,
        on_navigate: NavigateCallback,
    ) -> Self {
        Self {
            resolver,
            chapters,
            config,
            on_navigate,
        }
    }

    /// 加载章节内容
    ///
    /// 先按XML解析，失败时退回HTML5解析。单个链接或图片解析失败只会让该元素保持原样。
    ///
    /// # 错误
    /// * [`crate::epub::EpubError::ContentFileMissing`] - 压缩包中找不到章节文件
    #[instrument(skip_all, fields(chapter = %chapter.file_name, index = chapter.index))]
    pub fn load(&self, chapter: &Chapter) -> Result<ChapterContent> {
        let source = self.resolver.read_text(&chapter.href)?;

        let nodes = match XmlDocument::parse(&source) {
            Ok(doc) => self.convert_xml_root(doc.root()),
            Err(err) => {
                debug!(error = %err, "不是合法的XML，改用HTML解析");
                self.convert_html_root(&Html::parse_document(&source))
            }
        };

        Ok(ChapterContent {
            chapter: chapter.clone(),
            nodes,
        })
    }

    fn convert_xml_root(&self, root: XmlElement<'_>) -> Vec<ContentNode> {
        if root.is("html") {
            root.nodes().map(|child| self.convert_xml(child)).collect()
        } else {
            vec![self.convert_xml(XmlChild::Element(root))]
        }
    }

    fn convert_xml(&self, node: XmlChild<'_>) -> ContentNode {
        match node {
            XmlChild::Text(text) => ContentNode::Text(text.to_string()),
            XmlChild::Element(element) => {
                let mut converted = ContentElement {
                    name: element.name().to_string(),
                    attributes: element.attributes().to_vec(),
                    children: element.nodes().map(|child| self.convert_xml(child)).collect(),
                    ..Default::default()
                };
                self.rewrite(&mut converted);
                ContentNode::Element(converted)
            }
        }
    }

    fn convert_html_root(&self, document: &Html) -> Vec<ContentNode> {
        self.convert_html_children(document.root_element())
    }

    fn convert_html_children(&self, element: ElementRef<'_>) -> Vec<ContentNode> {
        element
            .children()
            .filter_map(|child| match child.value() {
                Node::Text(text) => Some(ContentNode::Text(String::from(&**text))),
                Node::Element(_) => ElementRef::wrap(child).map(|child| self.convert_html(child)),
                _ => None,
            })
            .collect()
    }

    fn convert_html(&self, element: ElementRef<'_>) -> ContentNode {
        let mut converted = ContentElement {
            name: element.value().name().to_string(),
            attributes: element
                .value()
                .attrs()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect(),
            children: self.convert_html_children(element),
            ..Default::default()
        };
        self.rewrite(&mut converted);
        ContentNode::Element(converted)
    }

    fn rewrite(&self, element: &mut ContentElement) {
        let name = element.local_name().to_string();
        match name.as_str() {
            "a" => self.rewrite_anchor(element),
            "img" => self.rewrite_image(element, "src"),
            "image" => self.rewrite_image(element, "href"),
            _ => {}
        }
    }

    /// 改写锚点
    ///
    /// 目标文件在清单中时视为内部链接；否则在阅读区之外打开。
    fn rewrite_anchor(&self, element: &mut ContentElement) {
        let Some(href) = element.attribute("href").map(str::to_string) else {
            return;
        };
        let href_trimmed = href.trim();
        if href_trimmed.is_empty() {
            return;
        }

        if href_trimmed.starts_with('#') {
            element.link = Some(Link::Local { href });
            return;
        }

        let file_name = normalize_file_name(href_trimmed);
        let manifest_known =
            !has_url_scheme(href_trimmed) && self.resolver.manifest().contains_file_name(&file_name);

        if !manifest_known {
            element.set_attribute("target", self.config.external_link_target.clone());
            element.link = Some(Link::External { href });
            return;
        }

        match self.chapters.by_path(&file_name) {
            Some(chapter) => {
                if self.config.mark_internal_links {
                    element.set_attribute("data-chapter-index", chapter.index.to_string());
                }
                element.link = Some(Link::Chapter {
                    href,
                    chapter: chapter.clone(),
                    on_activate: self.on_navigate.clone(),
                });
            }
            None => {
                debug!(href = %href, "清单中的文件不在章节序列中，链接保持无效");
                element.link = Some(Link::Unresolved { href });
            }
        }
    }

    /// 把图片地址替换为已解析的资源
    fn rewrite_image(&self, element: &mut ContentElement, attribute: &str) {
        let Some(src) = element.attribute(attribute).map(str::to_string) else {
            return;
        };
        let src = src.trim();
        if src.is_empty() || has_url_scheme(src) {
            return;
        }

        let file_name = normalize_file_name(src);
        let href = self
            .resolver
            .manifest()
            .find_by_file_name(&file_name)
            .map(|item| item.href.as_str())
            .unwrap_or(src);

        match self.resolver.load_blob(href) {
            Ok(blob) => {
                element.set_attribute(attribute, blob.data_uri());
                element.image = Some(blob);
            }
            Err(err) => debug!(src = %src, error = %err, "图片无法解析，保持原样"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use crate::epub::config::ReaderConfig;
    use crate::epub::content::LinkActivation;
    use crate::epub::reader::Epub;
    use crate::epub::test_support::{CHAPTER_C, FIGURE_PNG, sample_builder, sample_epub};
    use crate::epub::EpubError;

    fn load(epub: &Epub, index: usize, on_navigate: NavigateCallback) -> ChapterContent {
        let chapters = epub.load_chapters().unwrap();
        let config = ContentConfig::default();
        let loader = ContentLoader::new(epub.resources(), chapters, &config, on_navigate);
        loader.load(chapters.by_index(index).unwrap()).unwrap()
    }

    fn noop() -> NavigateCallback {
        Arc::new(|_: &Chapter| {})
    }

    #[test]
    fn test_anchor_classification() {
        let epub = Epub::open_book(sample_epub()).unwrap();
        let content = load(&epub, 0, noop());

        let links: Vec<(&str, &str)> = content
            .links()
            .into_iter()
            .map(|link| {
                let kind = match link {
                    Link::Chapter { .. } => "chapter",
                    Link::External { .. } => "external",
                    Link::Local { .. } => "local",
                    Link::Unresolved { .. } => "unresolved",
                };
                (link.href(), kind)
            })
            .collect();
        assert_eq!(
            links,
            vec![
                ("b.xhtml#mid", "chapter"),
                ("http://example.com/", "external"),
                ("missing.xhtml", "external"),
                ("#top", "local"),
                ("notes.xhtml", "unresolved"),
            ]
        );

        let html = content.to_html();
        assert!(html.contains(r#"<a href="b.xhtml#mid" data-chapter-index="1">"#));
        assert!(html.contains(r#"<a href="missing.xhtml" target="_blank">"#));
        assert!(html.contains(r##"<a href="#top">"##));
    }

    #[test]
    fn test_internal_link_round_trip() {
        let epub = Epub::open_book(sample_epub()).unwrap();
        let visited = Arc::new(Mutex::new(Vec::new()));
        let sink = visited.clone();
        let content = load(
            &epub,
            0,
            Arc::new(move |chapter: &Chapter| sink.lock().unwrap().push(chapter.file_name.clone())),
        );

        for link in content.links() {
            let activation = link.activate();
            if link.is_external() {
                assert!(matches!(activation, LinkActivation::OpenExternal(_)));
            }
        }
        assert_eq!(*visited.lock().unwrap(), vec!["b.xhtml".to_string()]);
    }

    #[test]
    fn test_images_resolved_and_missing_left_alone() {
        let epub = Epub::open_book(sample_epub()).unwrap();
        let content = load(&epub, 0, noop());

        let images = content.images();
        assert_eq!(images.len(), 1);
        assert_eq!(&images[0].data[..], FIGURE_PNG);
        assert_eq!(images[0].media_type, "image/png");

        let html = content.to_html();
        assert!(html.contains(r#"src="data:image/png;base64,"#));
        assert!(html.contains(r#"src="../Images/absent.png""#));
    }

    #[test]
    fn test_reload_is_idempotent() {
        let epub = Epub::open_book(sample_epub()).unwrap();
        let first = load(&epub, 0, noop());
        let second = load(&epub, 0, noop());
        assert_eq!(first.to_html(), second.to_html());
        assert_eq!(first.links().len(), second.links().len());
        assert_eq!(first.images(), second.images());
    }

    #[test]
    fn test_html_fallback() {
        assert!(XmlDocument::parse(CHAPTER_C).is_err());

        let epub = Epub::open_book(sample_epub()).unwrap();
        let content = load(&epub, 2, noop());
        assert!(content.text().contains("Chapter Three"));

        let links = content.links();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].chapter().unwrap().file_name, "a.xhtml");
        // svg中的<image xlink:href>同样被替换
        assert_eq!(content.images().len(), 1);
    }

    #[test]
    fn test_external_link_target_from_config() {
        let mut config = ReaderConfig::default();
        config.content.external_link_target = "_system".to_string();
        config.content.mark_internal_links = false;
        let epub = Epub::open_book_with_config(sample_epub(), config).unwrap();
        epub.load_chapters().unwrap();

        let content = epub.load_chapter_content(0usize, |_: &Chapter| {}).unwrap();
        let html = content.to_html();
        assert!(html.contains(r#"target="_system""#));
        assert!(!html.contains("data-chapter-index"));
    }

    #[test]
    fn test_missing_content_file() {
        let bytes = sample_builder().remove("OEBPS/Text/b.xhtml").build();
        let epub = Epub::open_book(bytes).unwrap();
        epub.load_chapters().unwrap();
        assert!(matches!(
            epub.load_chapter_content(1usize, |_: &Chapter| {}),
            Err(EpubError::ContentFileMissing(_))
        ));
    }
}
