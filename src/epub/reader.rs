use std::fs;
use std::path::Path;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use once_cell::sync::OnceCell;
use tracing::{info, instrument, warn};

use crate::epub::archive::Archive;
use crate::epub::chapters::{Chapter, ChapterRef, ChapterSet};
use crate::epub::config::ReaderConfig;
use crate::epub::container::{Container, PackageLocation};
use crate::epub::content::{ChapterContent, ContentLoader};
use crate::epub::error::{EpubError, Result};
use crate::epub::ncx::{TableOfContents, flatten};
use crate::epub::opf::{Metadata, Opf};
use crate::epub::resources::{ManifestResolver, ResourceBlob};

/// 表示一个已打开的EPUB文件
///
/// 打开时完成容器解析与OPF解析；目录和章节序列在第一次调用
/// [`Epub::load_chapters`] 时构建，之后只读。
#[derive(Debug)]
pub struct Epub {
    archive: Archive,
    location: PackageLocation,
    opf: Opf,
    resources: ManifestResolver,
    config: ReaderConfig,
    toc: OnceCell<TableOfContents>,
    chapters: OnceCell<ChapterSet>,
}

impl Epub {
    /// 从字节打开EPUB，使用默认配置
    ///
    /// # 参数
    /// * `bytes` - epub文件的完整内容
    ///
    /// # 返回值
    /// * `Result<Epub>` - 成功返回Epub实例，失败返回错误
    ///
    /// # 错误
    /// * [`EpubError::UnsupportedFormat`] - 不是ZIP，或mimetype不是`application/epub+zip`
    /// * [`EpubError::ContainerNotFound`] / [`EpubError::RootfileMissing`] - 找不到OPF文件
    pub fn open_book(bytes: Vec<u8>) -> Result<Epub> {
        Self::open_book_with_config(bytes, ReaderConfig::default())
    }

    /// 从字节打开EPUB，使用指定配置
    #[instrument(skip_all, fields(size = bytes.len()))]
    pub fn open_book_with_config(bytes: Vec<u8>, config: ReaderConfig) -> Result<Epub> {
        let archive = Archive::open(bytes)?;
        if !archive.check_mimetype()? {
            warn!("压缩包中缺少mimetype文件，继续按EPUB处理");
        }

        let location = Container::resolve(&archive)?;
        let opf_entry = archive
            .exact(&location.opf_path)
            .ok_or_else(|| EpubError::RootfileMissing(location.opf_path.clone()))?;
        let opf = Opf::parse_xml(&archive.read_text(opf_entry)?, &config.metadata)?;

        let resources =
            ManifestResolver::new(archive.clone(), Arc::clone(&opf.manifest), location.folder.clone());

        info!(
            title = opf.metadata.title.as_deref().unwrap_or_default(),
            version = %opf.version,
            manifest_items = opf.manifest.len(),
            "EPUB已打开"
        );

        Ok(Epub {
            archive,
            location,
            opf,
            resources,
            config,
            toc: OnceCell::new(),
            chapters: OnceCell::new(),
        })
    }

    /// 从文件路径打开EPUB
    ///
    /// 文件扩展名必须是`.epub`（忽略大小写）。
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Epub> {
        Self::from_path_with_config(path, ReaderConfig::default())
    }

    /// 从文件路径打开EPUB，使用指定配置
    pub fn from_path_with_config<P: AsRef<Path>>(path: P, config: ReaderConfig) -> Result<Epub> {
        let path = path.as_ref();
        let is_epub = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("epub"));
        if !is_epub {
            return Err(EpubError::UnsupportedFormat(format!(
                "不是epub文件: {}",
                path.display()
            )));
        }

        Self::open_book_with_config(fs::read(path)?, config)
    }

    /// 从base64文本打开EPUB
    ///
    /// 可以带`data:application/epub+zip;base64,`前缀，文本中的空白会被忽略。
    pub fn from_base64(encoded: &str) -> Result<Epub> {
        let payload = match encoded.find(";base64,") {
            Some(pos) if encoded.trim_start().starts_with("data:") => &encoded[pos + ";base64,".len()..],
            _ => encoded,
        };
        let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
        Self::open_book(BASE64.decode(compact)?)
    }

    /// 书籍元数据
    pub fn metadata(&self) -> &Metadata {
        &self.opf.metadata
    }

    /// OPF解析结果
    pub fn opf(&self) -> &Opf {
        &self.opf
    }

    /// OPF文件位置
    pub fn package_location(&self) -> &PackageLocation {
        &self.location
    }

    pub fn archive(&self) -> &Archive {
        &self.archive
    }

    /// 清单资源解析器
    pub fn resources(&self) -> &ManifestResolver {
        &self.resources
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// 解析目录文档（只解析一次）
    ///
    /// # 错误
    /// * [`EpubError::ManifestEntryMissing`] - 目录引用无法在清单中解析
    /// * [`EpubError::ContentFileMissing`] - 目录文件不在压缩包中
    pub fn toc(&self) -> Result<&TableOfContents> {
        self.toc.get_or_try_init(|| {
            let source = self.opf.toc_source()?;
            let content = self.resources.read_text(source.href())?;
            TableOfContents::parse(&source, &content)
        })
    }

    /// 构建章节序列（只构建一次）
    ///
    /// 平铺目录、按文件名去重并编号，章节大小取压缩包条目的解压大小。
    #[instrument(skip(self))]
    pub fn load_chapters(&self) -> Result<&ChapterSet> {
        self.chapters.get_or_try_init(|| {
            let entries = flatten(&self.toc()?.tree);
            let chapters = ChapterSet::build(&entries, |href| match self.resources.locate(href) {
                Some(entry) => entry.size,
                None => {
                    warn!(href, "章节文件不在压缩包中，大小按0计算");
                    0
                }
            });
            info!(
                toc_entries = entries.len(),
                chapters = chapters.len(),
                total_size = chapters.total_size(),
                "章节序列已构建"
            );
            Ok(chapters)
        })
    }

    /// 已构建的章节序列
    ///
    /// # 错误
    /// * [`EpubError::ChaptersNotLoaded`] - 尚未调用 [`Epub::load_chapters`]
    pub fn chapters(&self) -> Result<&ChapterSet> {
        self.chapters.get().ok_or(EpubError::ChaptersNotLoaded)
    }

    /// 按序号或路径查找章节
    pub fn chapter(&self, chapter: impl Into<ChapterRef>) -> Result<&Chapter> {
        let chapter = chapter.into();
        self.chapters()?
            .get(&chapter)
            .ok_or_else(|| EpubError::ChapterNotFound(chapter.to_string()))
    }

    /// 加载并改写章节内容
    ///
    /// `on_navigate`在内部链接被激活时调用，参数为目标章节。
    ///
    /// # 错误
    /// * [`EpubError::ChaptersNotLoaded`] - 尚未调用 [`Epub::load_chapters`]
    /// * [`EpubError::ChapterNotFound`] - 序号越界或路径不在章节序列中
    /// * [`EpubError::ContentFileMissing`] - 章节文件不在压缩包中
    pub fn load_chapter_content<F>(
        &self,
        chapter: impl Into<ChapterRef>,
        on_navigate: F,
    ) -> Result<ChapterContent>
    where
        F: Fn(&Chapter) + Send + Sync + 'static,
    {
        let chapter = self.chapter(chapter)?;
        let loader = ContentLoader::new(
            &self.resources,
            self.chapters()?,
            &self.config.content,
            Arc::new(on_navigate),
        );
        loader.load(chapter)
    }

    /// 读取封面图片
    ///
    /// 书中没有封面标记，或封面文件不在压缩包中时返回`Ok(None)`。
    pub fn resolve_cover_image(&self) -> Result<Option<ResourceBlob>> {
        self.resources.cover(self.opf.cover_href())
    }
}
