//! 阅读器配置模块
//!
//! 提供元数据标签映射与章节内容改写选项的配置管理，支持从YAML文件加载。

use crate::epub::error::{EpubError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// 默认配置文件路径
pub const DEFAULT_CONFIG_PATH: &str = "bookloom.yaml";

/// 单个元数据字段的标签配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataTagConfig {
    /// 可接受的元素名（本地名或带前缀的限定名）
    pub tags: Vec<String>,
    /// 可选的描述
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl MetadataTagConfig {
    /// 创建带描述的标签配置
    pub fn with_description(tags: &[&str], description: &str) -> Self {
        Self {
            tags: tags.iter().map(|tag| tag.to_string()).collect(),
            description: Some(description.to_string()),
        }
    }

    /// 元素名是否属于该字段
    pub fn matches(&self, qualified_name: &str, local_name: &str) -> bool {
        self.tags
            .iter()
            .any(|tag| tag == qualified_name || tag == local_name)
    }
}

/// 元数据标签配置，定义每个元数据字段对应的可能标签
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataTagConfigs {
    pub title: MetadataTagConfig,
    pub creator: MetadataTagConfig,
    pub language: MetadataTagConfig,
    pub date: MetadataTagConfig,
    pub description: MetadataTagConfig,
    pub subject: MetadataTagConfig,
    /// 多个作者之间的分隔符
    pub author_separator: String,
    /// 多个语言之间的分隔符
    pub language_separator: String,
    /// 标记封面的`<meta name="...">`名称
    pub cover_meta_name: String,
}

impl Default for MetadataTagConfigs {
    fn default() -> Self {
        Self {
            title: MetadataTagConfig::with_description(&["title"], "书籍标题"),
            creator: MetadataTagConfig::with_description(&["creator"], "作者/创建者信息"),
            language: MetadataTagConfig::with_description(&["language"], "书籍语言"),
            date: MetadataTagConfig::with_description(&["date"], "出版日期"),
            description: MetadataTagConfig::with_description(&["description"], "书籍描述/简介"),
            subject: MetadataTagConfig::with_description(&["subject"], "书籍主题/分类"),
            author_separator: " & ".to_string(),
            language_separator: ", ".to_string(),
            cover_meta_name: "cover".to_string(),
        }
    }
}

/// 章节内容改写选项
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    /// 外部链接的`target`属性值
    pub external_link_target: String,
    /// 是否为内部链接写入`data-chapter-index`属性
    pub mark_internal_links: bool,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            external_link_target: "_blank".to_string(),
            mark_internal_links: true,
        }
    }
}

/// 阅读器配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// 元数据标签映射
    pub metadata: MetadataTagConfigs,
    /// 章节内容改写
    pub content: ContentConfig,
}

impl ReaderConfig {
    /// 从指定的配置文件中加载配置
    ///
    /// 文件中缺失的字段使用默认值。
    ///
    /// # 示例
    ///
    /// ```rust,no_run
    /// use bookloom::ReaderConfig;
    /// let config = ReaderConfig::from_file("bookloom.yaml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| EpubError::ConfigError(format!("无法读取配置文件: {}", e)))?;

        serde_yml::from_str(&content)
            .map_err(|e| EpubError::ConfigError(format!("配置文件格式错误: {}", e)))
    }

    /// 在指定路径生成默认配置文件
    pub fn generate_default_config<P: AsRef<Path>>(path: P) -> Result<()> {
        let yaml_content = serde_yml::to_string(&Self::default())
            .map_err(|e| EpubError::ConfigError(format!("序列化配置失败: {}", e)))?;

        let content_with_header = format!(
            "# bookloom 阅读器配置文件\n# metadata: 元数据字段与标签的映射\n# content: 章节内容改写选项\n\n{}",
            yaml_content
        );

        fs::write(path, content_with_header)
            .map_err(|e| EpubError::ConfigError(format!("写入配置文件失败: {}", e)))
    }

    /// 尝试从配置文件加载，如果文件不存在则先生成配置文件再使用默认配置
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match Self::from_file(path) {
            Ok(config) => config,
            Err(err) => {
                if !path.exists() {
                    if let Err(write_err) = Self::generate_default_config(path) {
                        tracing::warn!(path = %path.display(), error = %write_err, "无法生成默认配置文件");
                    }
                } else {
                    tracing::warn!(path = %path.display(), error = %err, "配置文件无效，使用默认配置");
                }
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bookloom.yaml");

        ReaderConfig::generate_default_config(&path).unwrap();
        let loaded = ReaderConfig::from_file(&path).unwrap();
        assert_eq!(loaded, ReaderConfig::default());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.yaml");
        fs::write(
            &path,
            "metadata:\n  author_separator: \" / \"\ncontent:\n  external_link_target: _system\n",
        )
        .unwrap();

        let config = ReaderConfig::from_file(&path).unwrap();
        assert_eq!(config.metadata.author_separator, " / ");
        assert_eq!(config.metadata.language_separator, ", ");
        assert_eq!(config.content.external_link_target, "_system");
        assert!(config.content.mark_internal_links);
    }

    #[test]
    fn test_load_or_default_generates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.yaml");

        let config = ReaderConfig::load_or_default(&path);
        assert_eq!(config, ReaderConfig::default());
        assert!(path.exists());
    }

    #[test]
    fn test_invalid_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.yaml");
        fs::write(&path, "metadata: [not, a, map]\n").unwrap();
        assert!(matches!(ReaderConfig::from_file(&path), Err(EpubError::ConfigError(_))));
    }

    #[test]
    fn test_tag_matches() {
        let tags = MetadataTagConfigs::default();
        assert!(tags.title.matches("dc:title", "title"));
        assert!(!tags.title.matches("dc:creator", "creator"));
    }
}
