//! 脊柱模块
//!
//! 提供EPUB包中阅读顺序（脊柱）的结构定义。这里的脊柱主要用于定位目录文件。

/// 脊柱项信息(阅读顺序)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpineItem {
    /// 引用的清单项ID
    pub idref: String,
    /// 是否线性阅读
    pub linear: bool,
}

/// 脊柱
#[derive(Debug, Clone, Default)]
pub struct Spine {
    /// `toc`属性引用的清单项ID
    pub toc: Option<String>,
    /// 阅读顺序
    pub items: Vec<SpineItem>,
}

impl Spine {
    /// 线性阅读的脊柱项
    pub fn linear_items(&self) -> impl Iterator<Item = &SpineItem> {
        self.items.iter().filter(|item| item.linear)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
