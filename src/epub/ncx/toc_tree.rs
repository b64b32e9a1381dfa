//! 目录树（Table of Contents Tree）模块
//!
//! 提供导航树的平铺（得到章节候选序列）以及命令行下的树形显示功能。

use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::epub::ncx::navigation::NavTree;
use crate::epub::ncx::parser::TableOfContents;

/// 平铺后的目录项：尚未去重、尚未编号
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    /// 导航标签
    pub title: String,
    /// 目标内容引用（可带目录前缀与片段）
    pub target: String,
}

/// 先序遍历导航树，得到有序的 `(标题, 目标)` 序列
///
/// 只有同时带标签和目标的节点才会产生目录项；
/// 无论父节点是否产生目录项，都会继续遍历其子节点。
pub fn flatten(tree: &NavTree) -> Vec<TocEntry> {
    let mut entries = Vec::new();
    let mut stack: Vec<usize> = tree.root().children.iter().rev().copied().collect();

    while let Some(id) = stack.pop() {
        let Some(node) = tree.get(id) else {
            continue;
        };
        if let (Some(label), Some(target)) = (&node.label, &node.target) {
            entries.push(TocEntry {
                title: label.clone(),
                target: target.clone(),
            });
        }
        stack.extend(node.children.iter().rev().copied());
    }

    entries
}

/// 目录树显示样式
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TocTreeStyle {
    /// 树状符号
    TreeSymbols,
    /// 缩进加圆点
    Indented,
}

/// 目录树节点
#[derive(Debug, Clone)]
pub struct TocTreeNode {
    /// 标题
    pub title: String,
    /// 源文件路径
    pub src: Option<String>,
    /// 子节点
    pub children: Vec<TocTreeNode>,
}

impl TocTreeNode {
    fn from_nav(tree: &NavTree, id: usize) -> Self {
        let node = tree.get(id);
        Self {
            title: node
                .and_then(|node| node.label.clone())
                .filter(|label| !label.is_empty())
                .unwrap_or_else(|| "(无标题)".to_string()),
            src: node.and_then(|node| node.target.clone()),
            children: tree
                .children(id)
                .map(|(child, _)| Self::from_nav(tree, child))
                .collect(),
        }
    }

    /// 包括自身在内的节点数
    pub fn total_nodes(&self) -> usize {
        1 + self.children.iter().map(TocTreeNode::total_nodes).sum::<usize>()
    }
}

/// 目录树结构
#[derive(Debug, Clone)]
pub struct TocTree {
    /// 文档标题
    pub title: Option<String>,
    /// 根节点列表
    pub roots: Vec<TocTreeNode>,
    /// 显示样式
    pub style: TocTreeStyle,
    /// 是否显示文件路径
    pub show_paths: bool,
    /// 只显示小于该深度的节点
    pub max_depth: Option<u32>,
}

impl TocTree {
    /// 由解析后的目录文档创建目录树
    pub fn new(toc: &TableOfContents) -> Self {
        Self {
            title: toc.title.clone(),
            roots: toc
                .tree
                .children(NavTree::ROOT)
                .map(|(id, _)| TocTreeNode::from_nav(&toc.tree, id))
                .collect(),
            style: TocTreeStyle::TreeSymbols,
            show_paths: true,
            max_depth: None,
        }
    }

    /// 设置显示样式
    pub fn with_style(mut self, style: TocTreeStyle) -> Self {
        self.style = style;
        self
    }

    /// 设置是否显示文件路径
    pub fn with_show_paths(mut self, show_paths: bool) -> Self {
        self.show_paths = show_paths;
        self
    }

    /// 设置最大显示深度
    pub fn with_max_depth(mut self, max_depth: Option<u32>) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// 节点总数
    pub fn total_nodes(&self) -> usize {
        self.roots.iter().map(TocTreeNode::total_nodes).sum()
    }

    fn label(&self, node: &TocTreeNode) -> String {
        match (&node.src, self.show_paths) {
            (Some(src), true) => format!("{} → {}", node.title, src),
            _ => node.title.clone(),
        }
    }
}

impl Display for TocTree {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        if let Some(title) = &self.title {
            writeln!(f, "📖 {}", title)?;
            writeln!(f, "{}", "═".repeat(39))?;
        }

        // (节点, 深度, 是否为同级最后一个, 上级前缀)
        let mut stack: Vec<(&TocTreeNode, u32, bool, String)> = Vec::new();
        let last = self.roots.len().saturating_sub(1);
        stack.extend(
            self.roots
                .iter()
                .enumerate()
                .rev()
                .map(|(i, root)| (root, 0, i == last, String::new())),
        );

        while let Some((node, depth, is_last, prefix)) = stack.pop() {
            if self.max_depth.is_some_and(|max_depth| depth >= max_depth) {
                continue;
            }

            let child_prefix = match self.style {
                TocTreeStyle::TreeSymbols => {
                    let branch = if is_last { "└── " } else { "├── " };
                    writeln!(f, "{}{}{}", prefix, branch, self.label(node))?;
                    format!("{}{}", prefix, if is_last { "    " } else { "│   " })
                }
                TocTreeStyle::Indented => {
                    writeln!(f, "{}• {}", "  ".repeat(depth as usize), self.label(node))?;
                    String::new()
                }
            };

            let last_child = node.children.len().saturating_sub(1);
            stack.extend(
                node.children
                    .iter()
                    .enumerate()
                    .rev()
                    .map(|(i, child)| (child, depth + 1, i == last_child, child_prefix.clone())),
            );
        }

        Ok(())
    }
}
