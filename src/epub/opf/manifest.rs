//! 清单模块
//!
//! 提供EPUB包中文件清单的结构定义，以及 id → href 的查找表。

use std::collections::HashMap;

use crate::epub::path::normalize_file_name;

/// NCX文件的媒体类型
pub const NCX_MEDIA_TYPE: &str = "application/x-dtbncx+xml";

/// 清单项信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestItem {
    /// 项目ID
    pub id: String,
    /// 文件路径(相对于OPF文件)
    pub href: String,
    /// 媒体类型
    pub media_type: String,
    /// 属性(如nav、cover-image等)
    pub properties: Option<String>,
}

impl ManifestItem {
    /// 创建新的清单项
    pub fn new(id: &str, href: &str, media_type: &str) -> Self {
        Self {
            id: id.to_string(),
            href: href.to_string(),
            media_type: media_type.to_string(),
            properties: None,
        }
    }

    /// 检查是否包含指定属性
    pub fn has_property(&self, property: &str) -> bool {
        self.properties
            .as_deref()
            .is_some_and(|properties| properties.split_whitespace().any(|p| p == property))
    }

    /// 检查是否为导航文档
    pub fn is_nav(&self) -> bool {
        self.has_property("nav")
    }

    /// 检查是否为封面图片
    pub fn is_cover_image(&self) -> bool {
        self.has_property("cover-image")
    }

    /// 检查是否为NCX文件
    pub fn is_ncx(&self) -> bool {
        self.media_type == NCX_MEDIA_TYPE || self.href.to_lowercase().ends_with(".ncx")
    }

    /// 检查是否为图片文件
    pub fn is_image(&self) -> bool {
        self.media_type.starts_with("image/")
    }
}

/// 清单：以id为键的清单项表
///
/// 打开书籍时构建一次，之后只读。
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    items: HashMap<String, ManifestItem>,
    order: Vec<String>,
    file_names: HashMap<String, String>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// 加入清单项
    ///
    /// id或href为空的项会被忽略；重复的id保留第一次出现的项。
    pub fn insert(&mut self, item: ManifestItem) -> bool {
        if item.id.is_empty() || item.href.is_empty() || self.items.contains_key(&item.id) {
            return false;
        }
        self.file_names
            .entry(normalize_file_name(&item.href).to_lowercase())
            .or_insert_with(|| item.id.clone());
        self.order.push(item.id.clone());
        self.items.insert(item.id.clone(), item);
        true
    }

    /// 根据ID获取清单项
    pub fn get(&self, id: &str) -> Option<&ManifestItem> {
        self.items.get(id)
    }

    /// 根据ID获取相对路径
    pub fn href(&self, id: &str) -> Option<&str> {
        self.items.get(id).map(|item| item.href.as_str())
    }

    /// 清单中是否有文件名相同的资源（忽略大小写）
    pub fn contains_file_name(&self, file_name: &str) -> bool {
        self.file_names.contains_key(&file_name.to_lowercase())
    }

    /// 根据裸文件名查找清单项
    pub fn find_by_file_name(&self, file_name: &str) -> Option<&ManifestItem> {
        self.file_names
            .get(&file_name.to_lowercase())
            .and_then(|id| self.items.get(id))
    }

    /// 按文档顺序遍历清单项
    pub fn iter(&self) -> impl Iterator<Item = &ManifestItem> {
        self.order.iter().filter_map(|id| self.items.get(id))
    }

    /// EPUB3导航文档
    pub fn nav_item(&self) -> Option<&ManifestItem> {
        self.iter().find(|item| item.is_nav())
    }

    /// 带`cover-image`属性的清单项
    pub fn cover_image_item(&self) -> Option<&ManifestItem> {
        self.iter().find(|item| item.is_cover_image())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_skips_incomplete_items() {
        let mut manifest = Manifest::new();
        assert!(manifest.insert(ManifestItem::new("a", "Text/a.xhtml", "application/xhtml+xml")));
        assert!(!manifest.insert(ManifestItem::new("", "Text/b.xhtml", "application/xhtml+xml")));
        assert!(!manifest.insert(ManifestItem::new("c", "", "application/xhtml+xml")));
        assert!(!manifest.insert(ManifestItem::new("a", "Text/dup.xhtml", "application/xhtml+xml")));

        assert_eq!(manifest.len(), 1);
        assert_eq!(manifest.href("a"), Some("Text/a.xhtml"));
        assert_eq!(manifest.href("missing"), None);
    }

    #[test]
    fn test_file_name_lookup() {
        let mut manifest = Manifest::new();
        manifest.insert(ManifestItem::new("img", "Images/Pic%201.PNG", "image/png"));
        assert!(manifest.contains_file_name("pic 1.png"));
        assert!(!manifest.contains_file_name("pic.png"));
        assert_eq!(manifest.find_by_file_name("Pic 1.png").unwrap().id, "img");
    }

    #[test]
    fn test_properties() {
        let mut nav = ManifestItem::new("nav", "nav.xhtml", "application/xhtml+xml");
        nav.properties = Some("scripted nav".to_string());
        let mut cover = ManifestItem::new("cover", "cover.jpg", "image/jpeg");
        cover.properties = Some("cover-image".to_string());

        let mut manifest = Manifest::new();
        manifest.insert(nav);
        manifest.insert(cover);
        manifest.insert(ManifestItem::new("ncx", "toc.ncx", NCX_MEDIA_TYPE));

        assert_eq!(manifest.nav_item().unwrap().id, "nav");
        assert_eq!(manifest.cover_image_item().unwrap().id, "cover");
        assert!(manifest.get("ncx").unwrap().is_ncx());
        assert!(manifest.get("cover").unwrap().is_image());
        let ids: Vec<&str> = manifest.iter().map(|item| item.id.as_str()).collect();
        assert_eq!(ids, vec!["nav", "cover", "ncx"]);
    }
}
