//! 元数据处理模块
//!
//! 提供EPUB元数据的结构定义，以及从OPF的`<metadata>`元素中提取字段的功能。

use crate::epub::config::{MetadataTagConfig, MetadataTagConfigs};
use crate::epub::xml::XmlElement;

/// OPF文件中的元数据信息
///
/// 打开书籍时构建一次，之后只读。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    /// 书籍标题（第一个标题元素）
    pub title: Option<String>,
    /// 所有创建者用分隔符拼接后的作者
    pub author: Option<String>,
    /// 所有创建者
    pub creators: Vec<String>,
    /// 所有语言用分隔符拼接后的语言
    pub language: Option<String>,
    /// 所有语言
    pub languages: Vec<String>,
    /// 出版日期（第一个日期元素）
    pub date: Option<String>,
    /// 书籍描述
    pub description: Option<String>,
    /// 所有主题
    pub subjects: Vec<String>,
    /// 封面图片的相对路径
    pub cover_image_path: Option<String>,
}

impl Metadata {
    /// 从`<metadata>`元素中提取元数据
    ///
    /// 每个字段都可以出现零次、一次或多次；空白内容的元素会被忽略。
    /// 封面路径需要清单信息，由 [`crate::epub::opf::Opf`] 在解析完清单后填入。
    pub fn from_element(metadata: XmlElement<'_>, tags: &MetadataTagConfigs) -> Self {
        let values = |config: &MetadataTagConfig| -> Vec<String> {
            metadata
                .children(None)
                .into_iter()
                .filter(|element| config.matches(element.name(), element.local_name()))
                .map(|element| element.text())
                .filter(|text| !text.is_empty())
                .collect()
        };

        let creators = values(&tags.creator);
        let languages = values(&tags.language);

        Metadata {
            title: values(&tags.title).into_iter().next(),
            author: join_non_empty(&creators, &tags.author_separator),
            creators,
            language: join_non_empty(&languages, &tags.language_separator),
            languages,
            date: values(&tags.date).into_iter().next(),
            description: values(&tags.description).into_iter().next(),
            subjects: values(&tags.subject),
            cover_image_path: None,
        }
    }

    /// 作者列表，没有作者时为空
    pub fn authors(&self) -> &[String] {
        &self.creators
    }
}

fn join_non_empty(values: &[String], separator: &str) -> Option<String> {
    if values.is_empty() {
        None
    } else {
        Some(values.join(separator))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::epub::xml::XmlDocument;

    fn parse(metadata_xml: &str) -> Metadata {
        let doc = XmlDocument::parse(metadata_xml).unwrap();
        Metadata::from_element(doc.root(), &MetadataTagConfigs::default())
    }

    #[test]
    fn test_repeated_fields() {
        let metadata = parse(
            r#"<metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
                <dc:title>Main Title</dc:title>
                <dc:title>Subtitle</dc:title>
                <dc:creator>Alice</dc:creator>
                <dc:creator>Bob</dc:creator>
                <dc:language>en</dc:language>
                <dc:language>fr</dc:language>
                <dc:date>2020-01-01</dc:date>
                <dc:date>2021-02-02</dc:date>
                <dc:subject>Fiction</dc:subject>
                <dc:subject>Adventure</dc:subject>
                <dc:description>  A story.  </dc:description>
            </metadata>"#,
        );

        assert_eq!(metadata.title.as_deref(), Some("Main Title"));
        assert_eq!(metadata.author.as_deref(), Some("Alice & Bob"));
        assert_eq!(metadata.authors(), ["Alice", "Bob"]);
        assert_eq!(metadata.language.as_deref(), Some("en, fr"));
        assert_eq!(metadata.date.as_deref(), Some("2020-01-01"));
        assert_eq!(metadata.description.as_deref(), Some("A story."));
        assert_eq!(metadata.subjects, vec!["Fiction", "Adventure"]);
        assert_eq!(metadata.cover_image_path, None);
    }

    #[test]
    fn test_missing_fields() {
        let metadata = parse("<metadata><dc:creator>   </dc:creator></metadata>");
        assert_eq!(metadata, Metadata::default());
    }

    #[test]
    fn test_custom_tags_and_separator() {
        let doc = XmlDocument::parse(
            "<metadata><dc:creator>A</dc:creator><author>B</author></metadata>",
        )
        .unwrap();
        let mut tags = MetadataTagConfigs::default();
        tags.creator.tags.push("author".to_string());
        tags.author_separator = " / ".to_string();

        let metadata = Metadata::from_element(doc.root(), &tags);
        assert_eq!(metadata.author.as_deref(), Some("A / B"));
    }
}
