//! 目录（Table of Contents）解析模块
//!
//! 此模块提供EPUB目录文档的解析与平铺功能。EPUB2使用NCX文件，
//! EPUB3使用XHTML导航文档，两者都被解析为同一棵导航树。

pub mod navigation;
pub mod parser;
pub mod toc_tree;

pub use navigation::{NavNode, NavNodeId, NavTree};
pub use parser::TableOfContents;
pub use toc_tree::{TocEntry, TocTree, TocTreeNode, TocTreeStyle, flatten};
