use std::io;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EpubError>;

/// Epub相关的错误类型
///
/// 打开书籍（容器解析、OPF解析、目录构建）阶段的错误对该书籍是不可恢复的，
/// 会整体返回给调用方；章节内单个链接或图片的解析失败不会产生错误。
#[derive(Error, Debug)]
pub enum EpubError {
    #[error("IO错误: {0}")]
    Io(#[from] io::Error),

    #[error("Zip文件错误: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML解析错误: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("XML结构无效: {0}")]
    InvalidXml(String),

    #[error("Base64解码错误: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("不支持的文件格式: {0}")]
    UnsupportedFormat(String),

    #[error("缺少容器描述文件 META-INF/container.xml")]
    ContainerNotFound,

    #[error("rootfile无效: {0}")]
    RootfileMissing(String),

    #[error("清单中找不到条目: {0}")]
    ManifestEntryMissing(String),

    #[error("压缩包中找不到内容文件: {0}")]
    ContentFileMissing(String),

    #[error("导航文件解析错误: {0}")]
    NavigationParseError(String),

    #[error("章节列表尚未加载")]
    ChaptersNotLoaded,

    #[error("找不到章节: {0}")]
    ChapterNotFound(String),

    #[error("配置文件错误: {0}")]
    ConfigError(String),
}
