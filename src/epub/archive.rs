//! 压缩包访问模块
//!
//! 打开ZIP字节流，并在打开时一次性建立"规范化路径 → 条目"的索引，
//! 之后的路径查找都在索引上完成，能容忍大小写与URL编码的差异。

use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, instrument};
use zip::ZipArchive;

use crate::epub::error::{EpubError, Result};
use crate::epub::path::{normalize_entry_path, normalize_file_name};

/// EPUB要求的mimetype内容
pub const EPUB_MIMETYPE: &str = "application/epub+zip";

/// 读取条目时预分配缓冲区的上限；头部声明的大小不可信
const MAX_PREALLOCATION: usize = 16 << 20;

/// 按头部声明的解压大小计算初始缓冲区容量
fn initial_capacity(declared_size: u64) -> usize {
    usize::try_from(declared_size)
        .unwrap_or(usize::MAX)
        .min(MAX_PREALLOCATION)
}

/// 压缩包中的一个文件条目
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// 条目在压缩包中的序号
    pub index: usize,
    /// 条目原始名称
    pub name: String,
    /// 解压后的字节数
    pub size: u64,
}

/// 只读的EPUB压缩包句柄
///
/// 克隆开销很小：底层字节与中央目录通过`Arc`共享，
/// 每次读取都在自己的克隆上进行，因此并发读取不同章节无需加锁。
#[derive(Clone)]
pub struct Archive {
    zip: ZipArchive<Cursor<Arc<[u8]>>>,
    entries: Arc<[ArchiveEntry]>,
    by_path: Arc<HashMap<String, usize>>,
    by_file_name: Arc<HashMap<String, usize>>,
}

impl std::fmt::Debug for Archive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Archive")
            .field("entries", &self.entries.len())
            .finish()
    }
}

impl Archive {
    /// 从字节打开压缩包
    ///
    /// 不是合法ZIP的输入返回 [`EpubError::UnsupportedFormat`]。
    #[instrument(skip(bytes), fields(size = bytes.len()))]
    pub fn open(bytes: Vec<u8>) -> Result<Archive> {
        let data: Arc<[u8]> = Arc::from(bytes);
        let mut zip = ZipArchive::new(Cursor::new(data))
            .map_err(|e| EpubError::UnsupportedFormat(format!("无法作为ZIP打开: {}", e)))?;

        let mut entries = Vec::with_capacity(zip.len());
        for i in 0..zip.len() {
            let file = zip.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            entries.push(ArchiveEntry {
                index: i,
                name: file.name().to_string(),
                size: file.size(),
            });
        }

        let mut by_path = HashMap::with_capacity(entries.len());
        let mut by_file_name = HashMap::with_capacity(entries.len());
        for (pos, entry) in entries.iter().enumerate() {
            by_path.entry(normalize_entry_path(&entry.name)).or_insert(pos);
            by_file_name
                .entry(normalize_file_name(&entry.name).to_lowercase())
                .or_insert(pos);
        }

        debug!(entries = entries.len(), "压缩包索引已建立");

        Ok(Archive {
            zip,
            entries: entries.into(),
            by_path: Arc::new(by_path),
            by_file_name: Arc::new(by_file_name),
        })
    }

    /// 检查mimetype条目
    ///
    /// 条目存在但内容不是`application/epub+zip`时返回
    /// [`EpubError::UnsupportedFormat`]；条目缺失时返回`Ok(false)`。
    pub fn check_mimetype(&self) -> Result<bool> {
        let Some(entry) = self.exact("mimetype") else {
            return Ok(false);
        };
        let content = self.read_text(entry)?;
        let content = content.trim();
        if content != EPUB_MIMETYPE {
            return Err(EpubError::UnsupportedFormat(format!(
                "mimetype应为 {}, 实际为 {}",
                EPUB_MIMETYPE, content
            )));
        }
        Ok(true)
    }

    /// 所有文件条目
    pub fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    /// 按完整路径精确查找（忽略大小写与URL编码）
    pub fn exact(&self, path: &str) -> Option<&ArchiveEntry> {
        self.by_path
            .get(&normalize_entry_path(path))
            .map(|&pos| &self.entries[pos])
    }

    /// 容错查找条目
    ///
    /// 匹配优先级：
    /// 1. 完整路径匹配
    /// 2. 后缀匹配（条目路径以`/`+请求路径结尾）
    /// 3. 仅文件名匹配
    pub fn find(&self, path: &str) -> Option<&ArchiveEntry> {
        if let Some(entry) = self.exact(path) {
            return Some(entry);
        }

        let needle = normalize_entry_path(path);
        if needle.is_empty() {
            return None;
        }
        let suffix = format!("/{}", needle);
        if let Some(entry) = self
            .entries
            .iter()
            .find(|entry| normalize_entry_path(&entry.name).ends_with(&suffix))
        {
            return Some(entry);
        }

        let file_name = normalize_file_name(path).to_lowercase();
        if file_name.is_empty() {
            return None;
        }
        self.by_file_name
            .get(&file_name)
            .map(|&pos| &self.entries[pos])
    }

    /// 读取条目的原始字节
    pub fn read_bytes(&self, entry: &ArchiveEntry) -> Result<Bytes> {
        let mut zip = self.zip.clone();
        let mut file = zip.by_index(entry.index)?;
        let mut buffer = Vec::with_capacity(initial_capacity(entry.size));
        file.read_to_end(&mut buffer)?;
        Ok(Bytes::from(buffer))
    }

    /// 读取条目并解码为文本
    ///
    /// 会去掉UTF-8 BOM；非法UTF-8序列按替换字符处理。
    pub fn read_text(&self, entry: &ArchiveEntry) -> Result<String> {
        let bytes = self.read_bytes(entry)?;
        let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(&bytes[..]);
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }
}
