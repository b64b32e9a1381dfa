pub mod epub;

#[cfg(feature = "async")]
pub mod async_api;

// === 核心API重新导出 ===

/// EPUB文件读取器（主要接口）
pub use epub::Epub;

/// 错误处理
pub use epub::{EpubError, Result};

// === 数据结构 ===

/// 书籍元数据
pub use epub::Metadata;

/// 章节序列与章节内容
pub use epub::{Chapter, ChapterContent, ChapterRef, ChapterSet, Link, LinkActivation};

/// 已解析的资源
pub use epub::ResourceBlob;

/// 配置
pub use epub::{ContentConfig, ReaderConfig};

// === 底层组件（高级用法） ===

/// 压缩包与容器组件
pub use epub::{Archive, Container, PackageLocation};

/// OPF组件
pub use epub::{Manifest, ManifestItem, Opf, Spine, SpineItem};

/// 目录组件
pub use epub::{TableOfContents, TocEntry, TocTree, TocTreeStyle};

// === 库信息 ===

/// BookLoom库的版本信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// BookLoom库的描述
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

// === 便捷函数 ===

/// 从字节打开EPUB
///
/// 这是 `Epub::open_book` 的便捷包装函数。
///
/// # 示例
///
/// ```no_run
/// let bytes = std::fs::read("book.epub")?;
/// let epub = bookloom::open_book(bytes)?;
/// let chapters = epub.load_chapters()?;
/// println!("章节数: {}", chapters.len());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn open_book(bytes: Vec<u8>) -> Result<Epub> {
    Epub::open_book(bytes)
}

/// 快速打开EPUB文件
pub fn open<P: AsRef<std::path::Path>>(path: P) -> Result<Epub> {
    Epub::from_path(path)
}
