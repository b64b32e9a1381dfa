//! OPF解析器模块
//!
//! 提供OPF（Open Packaging Format）文件的XML解析功能。

use std::sync::Arc;

use crate::epub::config::MetadataTagConfigs;
use crate::epub::error::{EpubError, Result};
use crate::epub::opf::{
    manifest::{Manifest, ManifestItem},
    metadata::Metadata,
    spine::{Spine, SpineItem},
};
use crate::epub::xml::{XmlDocument, XmlElement};

/// 目录文档的来源
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TocSource {
    /// EPUB2的NCX文件，值为相对于OPF的路径
    Ncx(String),
    /// EPUB3的导航文档，值为相对于OPF的路径
    Nav(String),
}

impl TocSource {
    /// 相对于OPF的路径
    pub fn href(&self) -> &str {
        match self {
            TocSource::Ncx(href) | TocSource::Nav(href) => href,
        }
    }

    fn from_item(item: &ManifestItem) -> Self {
        if item.is_ncx() {
            TocSource::Ncx(item.href.clone())
        } else {
            TocSource::Nav(item.href.clone())
        }
    }
}

/// OPF文件解析结果
#[derive(Debug, Clone)]
pub struct Opf {
    /// EPUB版本
    pub version: String,
    /// 元数据
    pub metadata: Metadata,
    /// 清单项(文件列表)，与资源解析器共享
    pub manifest: Arc<Manifest>,
    /// 脊柱(阅读顺序与目录引用)
    pub spine: Spine,
    /// `<meta name="cover">`引用的清单项ID
    pub cover_id: Option<String>,
}

impl Opf {
    /// 解析OPF文件内容
    ///
    /// # 参数
    /// * `xml_content` - OPF文件的XML内容
    /// * `tags` - 元数据字段的标签映射
    ///
    /// # 返回值
    /// * `Result<Opf>` - 解析后的OPF信息；封面路径已写入 `metadata.cover_image_path`
    pub fn parse_xml(xml_content: &str, tags: &MetadataTagConfigs) -> Result<Opf> {
        let doc = XmlDocument::parse(xml_content)?;
        let package = doc.root();

        let metadata_element = package.child("metadata");
        let mut metadata = metadata_element
            .map(|element| Metadata::from_element(element, tags))
            .unwrap_or_default();
        let cover_id = metadata_element.and_then(|element| Self::parse_cover_id(element, tags));

        let manifest = package
            .child("manifest")
            .map(Self::parse_manifest)
            .unwrap_or_default();
        let spine = package
            .child("spine")
            .map(Self::parse_spine)
            .unwrap_or_default();

        let mut opf = Opf {
            version: package.attribute("version").unwrap_or_default().to_string(),
            metadata: Metadata::default(),
            manifest: Arc::new(manifest),
            spine,
            cover_id,
        };
        metadata.cover_image_path = opf.cover_href().map(str::to_string);
        opf.metadata = metadata;
        Ok(opf)
    }

    /// 定位目录文档
    ///
    /// 脊柱带`toc`属性时必须能在清单中解析；
    /// 没有`toc`属性时依次尝试EPUB3导航文档和清单中的NCX文件。
    ///
    /// # 错误
    /// * [`EpubError::ManifestEntryMissing`] - 目录引用无法解析，或书中没有任何目录文档
    pub fn toc_source(&self) -> Result<TocSource> {
        if let Some(toc_id) = &self.spine.toc {
            return self
                .manifest
                .get(toc_id)
                .map(TocSource::from_item)
                .ok_or_else(|| EpubError::ManifestEntryMissing(toc_id.clone()));
        }

        self.manifest
            .nav_item()
            .or_else(|| self.manifest.iter().find(|item| item.is_ncx()))
            .map(TocSource::from_item)
            .ok_or_else(|| EpubError::ManifestEntryMissing("toc".to_string()))
    }

    /// 封面图片的相对路径
    ///
    /// 优先使用`<meta name="cover">`指向的清单项，其次是带`cover-image`属性的清单项。
    pub fn cover_href(&self) -> Option<&str> {
        self.cover_id
            .as_deref()
            .and_then(|id| self.manifest.href(id))
            .or_else(|| self.manifest.cover_image_item().map(|item| item.href.as_str()))
    }

    fn parse_cover_id(metadata: XmlElement<'_>, tags: &MetadataTagConfigs) -> Option<String> {
        metadata
            .children(Some("meta"))
            .into_iter()
            .find(|meta| meta.attribute("name") == Some(tags.cover_meta_name.as_str()))
            .and_then(|meta| meta.attribute("content"))
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
    }

    fn parse_manifest(manifest_element: XmlElement<'_>) -> Manifest {
        let mut manifest = Manifest::new();
        for item in manifest_element.children(Some("item")) {
            let (Some(id), Some(href)) = (item.attribute("id"), item.attribute("href")) else {
                continue;
            };
            manifest.insert(ManifestItem {
                id: id.trim().to_string(),
                href: href.trim().to_string(),
                media_type: item.attribute("media-type").unwrap_or_default().to_string(),
                properties: item.attribute("properties").map(str::to_string),
            });
        }
        manifest
    }

    fn parse_spine(spine_element: XmlElement<'_>) -> Spine {
        let items = spine_element
            .children(Some("itemref"))
            .into_iter()
            .filter_map(|itemref| {
                let idref = itemref.attribute("idref")?;
                Some(SpineItem {
                    idref: idref.to_string(),
                    linear: itemref.attribute("linear") != Some("no"),
                })
            })
            .collect();

        Spine {
            toc: spine_element
                .attribute("toc")
                .map(str::trim)
                .filter(|toc| !toc.is_empty())
                .map(str::to_string),
            items,
        }
    }
}
