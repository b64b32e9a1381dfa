//! 导航树数据结构定义
//!
//! 目录以数组存储的节点树表示：每个节点保存子节点与父节点的下标，
//! 根节点是一个不带标签和目标的虚拟节点。

/// 节点在导航树中的下标
pub type NavNodeId = usize;

/// 导航点
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavNode {
    /// 导航标签文本
    pub label: Option<String>,
    /// 目标内容引用（相对于目录文件的路径，可带片段）
    pub target: Option<String>,
    /// 子导航点
    pub children: Vec<NavNodeId>,
    /// 父导航点
    pub parent: Option<NavNodeId>,
}

impl NavNode {
    /// 同时带有标签和目标的节点才会成为章节
    pub fn is_chapter(&self) -> bool {
        self.label.is_some() && self.target.is_some()
    }
}

/// 导航树
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavTree {
    nodes: Vec<NavNode>,
}

impl NavTree {
    /// 根节点的下标
    pub const ROOT: NavNodeId = 0;

    /// 创建只含虚拟根节点的导航树
    pub fn new() -> Self {
        Self {
            nodes: vec![NavNode::default()],
        }
    }

    /// 在`parent`下追加一个导航点，返回新节点的下标
    ///
    /// 标签只去掉首尾空白：存在但为空的标签仍然算作标签。空白的目标视为缺失。
    pub fn add_child(
        &mut self,
        parent: NavNodeId,
        label: Option<String>,
        target: Option<String>,
    ) -> NavNodeId {
        let id = self.nodes.len();
        self.nodes.push(NavNode {
            label: label.map(|s| s.trim().to_string()),
            target: target.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()),
            children: Vec::new(),
            parent: Some(parent),
        });
        if let Some(parent) = self.nodes.get_mut(parent) {
            parent.children.push(id);
        }
        id
    }

    pub fn root(&self) -> &NavNode {
        &self.nodes[Self::ROOT]
    }

    pub fn get(&self, id: NavNodeId) -> Option<&NavNode> {
        self.nodes.get(id)
    }

    /// 节点的子导航点
    pub fn children(&self, id: NavNodeId) -> impl Iterator<Item = (NavNodeId, &NavNode)> {
        self.nodes
            .get(id)
            .map(|node| node.children.as_slice())
            .unwrap_or_default()
            .iter()
            .map(|&child| (child, &self.nodes[child]))
    }

    /// 导航点数量（不含虚拟根节点）
    pub fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 获取导航深度
    pub fn depth(&self) -> usize {
        let mut max_depth = 0;
        let mut stack = vec![(Self::ROOT, 0usize)];
        while let Some((id, depth)) = stack.pop() {
            max_depth = max_depth.max(depth);
            stack.extend(self.nodes[id].children.iter().map(|&child| (child, depth + 1)));
        }
        max_depth
    }
}

impl Default for NavTree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_tree() {
        let mut tree = NavTree::new();
        assert!(tree.is_empty());

        let part = tree.add_child(NavTree::ROOT, Some("第一部".to_string()), None);
        let chapter = tree.add_child(part, Some(" 第一章 ".to_string()), Some("a.xhtml".to_string()));
        let untitled = tree.add_child(part, Some("  ".to_string()), Some("b.xhtml".to_string()));
        tree.add_child(part, Some("第三章".to_string()), Some("  ".to_string()));

        assert_eq!(tree.len(), 4);
        assert_eq!(tree.depth(), 2);
        assert!(!tree.get(part).unwrap().is_chapter());

        let node = tree.get(chapter).unwrap();
        assert_eq!(node.label.as_deref(), Some("第一章"));
        assert_eq!(node.parent, Some(part));
        assert!(node.is_chapter());

        let children: Vec<_> = tree.children(part).map(|(_, node)| node.is_chapter()).collect();
        assert_eq!(children, vec![true, true, false]);
        assert_eq!(tree.get(untitled).unwrap().label.as_deref(), Some(""));
        assert_eq!(tree.children(99).count(), 0);
    }
}
