//! 异步API
//!
//! 启用`async`特性后可用：
//!
//! ```toml
//! [dependencies]
//! bookloom = { version = "0.1", features = ["async"] }
//! ```
//!
//! 解析都是CPU密集的同步操作，这里统一放到tokio的阻塞线程池中执行。

use std::path::Path;
use std::sync::Arc;

use crate::epub::{Chapter, ChapterContent, ChapterRef, ChapterSet, Epub, ReaderConfig, ResourceBlob};
use crate::epub::error::{EpubError, Result};

async fn blocking<T, F>(task: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| EpubError::Io(std::io::Error::other(e.to_string())))?
}

/// 异步打开EPUB字节
///
/// # 示例
///
/// ```no_run
/// # async fn example(bytes: Vec<u8>) -> bookloom::Result<()> {
/// let epub = bookloom::async_api::open_book(bytes).await?;
/// println!("{:?}", epub.metadata().title);
/// # Ok(())
/// # }
/// ```
pub async fn open_book(bytes: Vec<u8>) -> Result<Arc<Epub>> {
    open_book_with_config(bytes, ReaderConfig::default()).await
}

/// 异步打开EPUB字节，使用指定配置
pub async fn open_book_with_config(bytes: Vec<u8>, config: ReaderConfig) -> Result<Arc<Epub>> {
    blocking(move || Epub::open_book_with_config(bytes, config).map(Arc::new)).await
}

/// 异步打开EPUB文件
pub async fn open_file(path: impl AsRef<Path>) -> Result<Arc<Epub>> {
    let path = path.as_ref().to_path_buf();
    blocking(move || Epub::from_path(path).map(Arc::new)).await
}

/// 异步构建章节序列，返回一份拷贝
pub async fn load_chapters(epub: Arc<Epub>) -> Result<ChapterSet> {
    blocking(move || epub.load_chapters().cloned()).await
}

/// 异步加载章节内容
///
/// 会先确保章节序列已经构建。
pub async fn load_chapter_content<F>(
    epub: Arc<Epub>,
    chapter: impl Into<ChapterRef>,
    on_navigate: F,
) -> Result<ChapterContent>
where
    F: Fn(&Chapter) + Send + Sync + 'static,
{
    let chapter = chapter.into();
    blocking(move || {
        epub.load_chapters()?;
        epub.load_chapter_content(chapter, on_navigate)
    })
    .await
}

/// 异步读取封面图片
pub async fn resolve_cover_image(epub: Arc<Epub>) -> Result<Option<ResourceBlob>> {
    blocking(move || epub.resolve_cover_image()).await
}
