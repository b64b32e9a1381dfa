//! 章节仓库模块
//!
//! 由平铺后的目录项构建去重、编号的章节序列，并提供按序号和按文件名两种查找方式。

use std::collections::HashMap;
use std::fmt;

use crate::epub::ncx::TocEntry;
use crate::epub::path::normalize_file_name;

/// 一个去重、编号、可导航的内容文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chapter {
    /// 目录中第一次出现时的标题
    pub title: String,
    /// 规范化后的裸文件名，章节的唯一标识
    pub file_name: String,
    /// 目录中的原始引用（去掉片段之前），用于在压缩包中定位
    pub href: String,
    /// 解压后的字节数
    pub size: u64,
    /// 在章节序列中的位置
    pub index: usize,
}

/// 章节的引用方式：序号或文件路径
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChapterRef {
    Index(usize),
    Path(String),
}

impl From<usize> for ChapterRef {
    fn from(index: usize) -> Self {
        ChapterRef::Index(index)
    }
}

impl From<&str> for ChapterRef {
    fn from(path: &str) -> Self {
        ChapterRef::Path(path.to_string())
    }
}

impl From<String> for ChapterRef {
    fn from(path: String) -> Self {
        ChapterRef::Path(path)
    }
}

impl From<&Chapter> for ChapterRef {
    fn from(chapter: &Chapter) -> Self {
        ChapterRef::Index(chapter.index)
    }
}

impl fmt::Display for ChapterRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChapterRef::Index(index) => write!(f, "#{}", index),
            ChapterRef::Path(path) => write!(f, "{}", path),
        }
    }
}

/// 有序章节序列与按文件名的索引
///
/// 两个视图指向同一组章节：`by_path`只保存序号。
/// 满足 `ordered()[i].index == i`，且 `by_path(&ordered()[i].file_name)` 返回同一章节。
#[derive(Debug, Clone, Default)]
pub struct ChapterSet {
    ordered: Vec<Chapter>,
    by_path: HashMap<String, usize>,
}

impl ChapterSet {
    /// 由平铺后的目录项构建章节序列
    ///
    /// 按顺序遍历，每个文件名只保留第一次出现的目录项，并依次编号；
    /// 之后引用同一文件的目录项（例如指向文件内锚点的子目录）整体丢弃。
    /// `size_of`根据目录引用返回内容文件的解压大小。
    pub fn build<F>(entries: &[TocEntry], mut size_of: F) -> Self
    where
        F: FnMut(&str) -> u64,
    {
        let mut set = ChapterSet::default();
        for entry in entries {
            let file_name = normalize_file_name(&entry.target);
            if file_name.is_empty() || set.by_path.contains_key(&file_name) {
                continue;
            }
            let href = entry
                .target
                .split('#')
                .next()
                .unwrap_or_default()
                .to_string();
            let index = set.ordered.len();
            set.by_path.insert(file_name.clone(), index);
            set.ordered.push(Chapter {
                title: entry.title.clone(),
                size: size_of(&href),
                file_name,
                href,
                index,
            });
        }
        set
    }

    /// 有序章节序列
    pub fn ordered(&self) -> &[Chapter] {
        &self.ordered
    }

    /// 按序号查找；越界时返回`None`
    pub fn by_index(&self, index: usize) -> Option<&Chapter> {
        self.ordered.get(index)
    }

    /// 按文件名精确查找
    ///
    /// 参数可以是完整链接，会先规范化为裸文件名。
    pub fn by_path(&self, path: &str) -> Option<&Chapter> {
        self.by_path
            .get(&normalize_file_name(path))
            .map(|&index| &self.ordered[index])
    }

    /// 按引用查找
    pub fn get(&self, chapter: &ChapterRef) -> Option<&Chapter> {
        match chapter {
            ChapterRef::Index(index) => self.by_index(*index),
            ChapterRef::Path(path) => self.by_path(path),
        }
    }

    /// 所有章节的大小之和
    pub fn total_size(&self) -> u64 {
        self.ordered.iter().map(|chapter| chapter.size).sum()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Chapter> {
        self.ordered.iter()
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }
}

impl<'a> IntoIterator for &'a ChapterSet {
    type Item = &'a Chapter;
    type IntoIter = std::slice::Iter<'a, Chapter>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
