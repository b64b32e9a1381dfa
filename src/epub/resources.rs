//! 清单资源解析模块
//!
//! 把清单中的id映射为压缩包内的路径，并按需把资源（封面、插图等）读取为可复用的 [`ResourceBlob`]。
//! 读取结果按路径缓存，缓存只增不减，随书籍一起释放。

use std::collections::HashMap;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use bytes::Bytes;
use parking_lot::RwLock;
use tracing::{debug, instrument, warn};

use crate::epub::archive::{Archive, ArchiveEntry};
use crate::epub::error::{EpubError, Result};
use crate::epub::opf::Manifest;
use crate::epub::path::{join_folder, normalize_entry_path, normalize_file_name};

/// 已解析的资源
///
/// 克隆开销很小，数据通过 [`Bytes`] 共享。
#[derive(Clone, PartialEq, Eq)]
pub struct ResourceBlob {
    /// 资源在压缩包中的路径
    pub path: String,
    /// 媒体类型
    pub media_type: String,
    /// 资源内容
    pub data: Bytes,
}

impl ResourceBlob {
    /// `data:` URI形式，可直接写入`src`属性
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.media_type, BASE64.encode(&self.data))
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl std::fmt::Debug for ResourceBlob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceBlob")
            .field("path", &self.path)
            .field("media_type", &self.media_type)
            .field("len", &self.data.len())
            .finish()
    }
}

/// 清单资源解析器
#[derive(Debug)]
pub struct ManifestResolver {
    archive: Archive,
    manifest: Arc<Manifest>,
    folder: String,
    cache: RwLock<HashMap<String, ResourceBlob>>,
}

impl ManifestResolver {
    /// 创建解析器
    ///
    /// `folder`是OPF所在的目录前缀，清单中的href都相对于它。
    pub fn new(archive: Archive, manifest: Arc<Manifest>, folder: impl Into<String>) -> Self {
        Self {
            archive,
            manifest,
            folder: folder.into(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// 根据清单id取相对路径
    pub fn href(&self, id: &str) -> Option<&str> {
        self.manifest.href(id)
    }

    /// 根据清单id取压缩包内的完整路径
    ///
    /// # 错误
    /// * [`EpubError::ManifestEntryMissing`] - 清单中没有该id
    pub fn resolve_path(&self, id: &str) -> Result<String> {
        self.href(id)
            .map(|href| join_folder(&self.folder, href))
            .ok_or_else(|| EpubError::ManifestEntryMissing(id.to_string()))
    }

    /// 容错定位href对应的压缩包条目
    ///
    /// 先按OPF目录拼接后查找，再按原样查找；两者都会退回后缀与文件名匹配。
    /// `#`片段与`?`查询部分会被忽略。
    pub fn locate(&self, href: &str) -> Option<&ArchiveEntry> {
        let path = href.split(['#', '?']).next().unwrap_or_default();
        if path.is_empty() {
            return None;
        }
        self.archive
            .find(&join_folder(&self.folder, path))
            .or_else(|| self.archive.find(path))
    }

    /// 读取href对应的文本文件
    ///
    /// # 错误
    /// * [`EpubError::ContentFileMissing`] - 压缩包中找不到该文件
    pub fn read_text(&self, href: &str) -> Result<String> {
        let entry = self
            .locate(href)
            .ok_or_else(|| EpubError::ContentFileMissing(href.to_string()))?;
        self.archive.read_text(entry)
    }

    /// 读取资源
    ///
    /// 同一条目只会从压缩包解压一次，之后直接返回缓存。
    ///
    /// # 错误
    /// * [`EpubError::ContentFileMissing`] - 压缩包中找不到该资源
    #[instrument(skip(self))]
    pub fn load_blob(&self, href: &str) -> Result<ResourceBlob> {
        let entry = self
            .locate(href)
            .ok_or_else(|| EpubError::ContentFileMissing(href.to_string()))?;
        let key = normalize_entry_path(&entry.name);

        if let Some(blob) = self.cache.read().get(&key) {
            return Ok(blob.clone());
        }

        let data = self.archive.read_bytes(entry)?;
        let blob = ResourceBlob {
            path: entry.name.clone(),
            media_type: self.media_type(&entry.name),
            data,
        };
        debug!(path = %blob.path, media_type = %blob.media_type, len = blob.len(), "资源已读取");

        Ok(self.cache.write().entry(key).or_insert(blob).clone())
    }

    /// 读取封面图片
    ///
    /// 书中没有封面标记，或标记的文件不在压缩包中时返回`Ok(None)`。
    pub fn cover(&self, cover_href: Option<&str>) -> Result<Option<ResourceBlob>> {
        let Some(href) = cover_href else {
            return Ok(None);
        };
        match self.load_blob(href) {
            Ok(blob) => Ok(Some(blob)),
            Err(EpubError::ContentFileMissing(path)) => {
                warn!(path = %path, "封面文件不在压缩包中");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// 已缓存的资源数量
    pub fn cached_len(&self) -> usize {
        self.cache.read().len()
    }

    /// 媒体类型优先取清单声明，其次按扩展名推断
    fn media_type(&self, entry_name: &str) -> String {
        self.manifest
            .find_by_file_name(&normalize_file_name(entry_name))
            .map(|item| item.media_type.trim())
            .filter(|media_type| !media_type.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| {
                mime_guess::from_path(entry_name)
                    .first()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "application/octet-stream".to_string())
            })
    }
}
