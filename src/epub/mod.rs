pub mod archive;
pub mod chapters;
pub mod config;
pub mod container;
pub mod content;
pub mod error;
pub mod ncx;
pub mod opf;
pub mod path;
pub mod reader;
pub mod resources;
pub mod xml;

#[cfg(test)]
pub(crate) mod test_support;

// 重新导出错误处理
pub use error::{EpubError, Result};

// 重新导出压缩包与容器相关
pub use archive::{Archive, ArchiveEntry};
pub use container::{Container, PackageLocation, RootFile};

// 重新导出EPUB读取器
pub use reader::Epub;

// 重新导出章节与内容
pub use chapters::{Chapter, ChapterRef, ChapterSet};
pub use content::{ChapterContent, ContentElement, ContentNode, Link, LinkActivation};
pub use resources::{ManifestResolver, ResourceBlob};

// 重新导出配置
pub use config::{ContentConfig, MetadataTagConfig, MetadataTagConfigs, ReaderConfig};

// 重新导出OPF相关
pub use opf::{Manifest, ManifestItem, Metadata, Opf, Spine, SpineItem, TocSource};

// 重新导出目录相关
pub use ncx::{NavTree, TableOfContents, TocEntry, TocTree, TocTreeNode, TocTreeStyle, flatten};
