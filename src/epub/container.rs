use tracing::{debug, instrument};

use crate::epub::archive::Archive;
use crate::epub::error::{EpubError, Result};
use crate::epub::path::root_folder;
use crate::epub::xml::XmlDocument;

/// OCF容器描述文件的固定路径
pub const CONTAINER_PATH: &str = "META-INF/container.xml";

/// OPF文件的标准媒体类型
pub const OPF_MEDIA_TYPE: &str = "application/oebps-package+xml";

/// Container.xml中的rootfile信息
#[derive(Debug, Clone)]
pub struct RootFile {
    pub full_path: String,
    pub media_type: String,
}

/// Container.xml的解析结果
#[derive(Debug, Clone)]
pub struct Container {
    pub rootfiles: Vec<RootFile>,
}

/// 容器解析得到的包文档位置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageLocation {
    /// OPF文件在压缩包中的路径
    pub opf_path: String,
    /// 解析其余相对路径时使用的目录前缀
    pub folder: String,
}

impl Container {
    /// 解析container.xml内容
    ///
    /// 缺少`full-path`属性的rootfile会被跳过；
    /// 一个有效rootfile都没有时由 [`Container::resolve`] 报告错误。
    pub fn parse_xml(xml_content: &str) -> Result<Container> {
        let doc = XmlDocument::parse(xml_content)?;
        let rootfiles = doc
            .root()
            .children(Some("rootfiles"))
            .into_iter()
            .flat_map(|rootfiles| rootfiles.children(Some("rootfile")))
            .filter_map(|rootfile| {
                let full_path = rootfile.attribute("full-path")?.trim();
                if full_path.is_empty() {
                    return None;
                }
                Some(RootFile {
                    full_path: full_path.to_string(),
                    media_type: rootfile.attribute("media-type").unwrap_or_default().to_string(),
                })
            })
            .collect();

        Ok(Container { rootfiles })
    }

    /// 获取主要的OPF文件路径
    ///
    /// 优先取媒体类型为`application/oebps-package+xml`的rootfile，
    /// 否则退回第一个rootfile。
    pub fn get_opf_path(&self) -> Option<&str> {
        self.rootfiles
            .iter()
            .find(|rootfile| rootfile.media_type == OPF_MEDIA_TYPE)
            .or_else(|| self.rootfiles.first())
            .map(|rootfile| rootfile.full_path.as_str())
    }

    /// 在压缩包中定位包文档
    ///
    /// # 错误
    /// * [`EpubError::ContainerNotFound`] - 没有container.xml
    /// * [`EpubError::RootfileMissing`] - 没有`full-path`属性，或目标文件不在压缩包中
    #[instrument(skip(archive))]
    pub fn resolve(archive: &Archive) -> Result<PackageLocation> {
        let entry = archive
            .exact(CONTAINER_PATH)
            .ok_or(EpubError::ContainerNotFound)?;
        let container = Self::parse_xml(&archive.read_text(entry)?)?;

        let full_path = container.get_opf_path().ok_or_else(|| {
            EpubError::RootfileMissing("container.xml中没有找到带full-path的rootfile".to_string())
        })?;
        let opf_entry = archive
            .exact(full_path)
            .ok_or_else(|| EpubError::RootfileMissing(format!("压缩包中不存在 {}", full_path)))?;

        let location = PackageLocation {
            opf_path: opf_entry.name.clone(),
            folder: root_folder(full_path),
        };
        debug!(opf = %location.opf_path, folder = %location.folder, "已定位OPF文件");
        Ok(location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::epub::test_support::{CONTAINER_XML, ZipBuilder};

    #[test]
    fn test_parse_container_xml() {
        let container_xml = r#"<?xml version="1.0"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
    <rootfiles>
        <rootfile full-path="OEBPS/toc.ncx" media-type="application/x-dtbncx+xml"/>
        <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
        <rootfile media-type="application/oebps-package+xml"/>
    </rootfiles>
</container>"#;

        let container = Container::parse_xml(container_xml).unwrap();
        assert_eq!(container.rootfiles.len(), 2);
        assert_eq!(container.rootfiles[0].full_path, "OEBPS/toc.ncx");
        assert_eq!(container.get_opf_path(), Some("OEBPS/content.opf"));
    }

    #[test]
    fn test_get_opf_path_falls_back_to_first() {
        let container = Container {
            rootfiles: vec![RootFile {
                full_path: "content.opf".to_string(),
                media_type: String::new(),
            }],
        };
        assert_eq!(container.get_opf_path(), Some("content.opf"));
    }

    #[test]
    fn test_resolve_nested_root() {
        let archive = Archive::open(
            ZipBuilder::new()
                .file(CONTAINER_PATH, CONTAINER_XML)
                .file("OEBPS/content.opf", "<package/>")
                .build(),
        )
        .unwrap();
        let location = Container::resolve(&archive).unwrap();
        assert_eq!(location.opf_path, "OEBPS/content.opf");
        assert_eq!(location.folder, "OEBPS/");
    }

    #[test]
    fn test_resolve_root_without_folder() {
        let archive = Archive::open(
            ZipBuilder::new()
                .file(
                    CONTAINER_PATH,
                    r#"<container><rootfiles><rootfile full-path="content.opf"/></rootfiles></container>"#,
                )
                .file("content.opf", "<package/>")
                .build(),
        )
        .unwrap();
        let location = Container::resolve(&archive).unwrap();
        assert_eq!(location.folder, "");
    }

    #[test]
    fn test_container_not_found() {
        let archive = Archive::open(ZipBuilder::new().file("OEBPS/content.opf", "<package/>").build()).unwrap();
        assert!(matches!(Container::resolve(&archive), Err(EpubError::ContainerNotFound)));
    }

    #[test]
    fn test_rootfile_missing() {
        let no_attribute = Archive::open(
            ZipBuilder::new()
                .file(CONTAINER_PATH, "<container><rootfiles><rootfile/></rootfiles></container>")
                .build(),
        )
        .unwrap();
        assert!(matches!(Container::resolve(&no_attribute), Err(EpubError::RootfileMissing(_))));

        let no_target = Archive::open(ZipBuilder::new().file(CONTAINER_PATH, CONTAINER_XML).build()).unwrap();
        assert!(matches!(Container::resolve(&no_target), Err(EpubError::RootfileMissing(_))));
    }
}
