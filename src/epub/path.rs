//! 路径规范化工具
//!
//! 出版商对相对路径的编码和大小写并不统一，这里集中处理所有路径形式的转换。

use std::borrow::Cow;

/// 将任意链接或引用规范化为裸文件名
///
/// 去掉目录前缀、`#`片段以及`?`/`&`之后的查询部分，并做URL解码。
/// 章节的身份标识、目录去重、章节内链接的匹配都基于这个结果。
///
/// ```rust
/// use bookloom::epub::path::normalize_file_name;
///
/// assert_eq!(normalize_file_name("../Text/ch%201.xhtml#mid"), "ch 1.xhtml");
/// assert_eq!(normalize_file_name("b.xhtml?x=1"), "b.xhtml");
/// ```
pub fn normalize_file_name(reference: &str) -> String {
    let without_suffix = reference
        .split(['#', '?', '&'])
        .next()
        .unwrap_or_default();
    let base = without_suffix
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();
    decode(base).into_owned()
}

/// 将压缩包条目路径或href规范化为索引键
///
/// URL解码、反斜杠转正斜杠、去掉开头的`./`与`/`，并转为小写。
pub fn normalize_entry_path(path: &str) -> String {
    let decoded = decode(path);
    let unified = decoded.replace('\\', "/");
    let mut trimmed = unified.as_str();
    loop {
        if let Some(rest) = trimmed.strip_prefix("./") {
            trimmed = rest;
        } else if let Some(rest) = trimmed.strip_prefix('/') {
            trimmed = rest;
        } else {
            break;
        }
    }
    trimmed.to_lowercase()
}

/// 计算rootfile所在的目录前缀
///
/// 保留第一个`/`及其之前的部分；路径中没有`/`时返回空字符串。
/// 之后所有相对于OPF的路径都以此为前缀拼接。
pub fn root_folder(root_path: &str) -> String {
    match root_path.find('/') {
        Some(pos) => root_path[..=pos].to_string(),
        None => String::new(),
    }
}

/// 将目录前缀与相对路径拼接
pub fn join_folder(folder: &str, href: &str) -> String {
    format!("{}{}", folder, href)
}

/// 判断链接是否带有URL协议（http:、mailto: 等）
pub fn has_url_scheme(href: &str) -> bool {
    let Some(colon) = href.find(':') else {
        return false;
    };
    let scheme = &href[..colon];
    !scheme.is_empty()
        && scheme
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic())
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        && !href[..colon].contains('/')
}

fn decode(value: &str) -> Cow<'_, str> {
    urlencoding::decode(value).unwrap_or(Cow::Borrowed(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_file_name() {
        assert_eq!(normalize_file_name("a.xhtml"), "a.xhtml");
        assert_eq!(normalize_file_name("Text/b.xhtml#mid"), "b.xhtml");
        assert_eq!(normalize_file_name("../Images/c%20d.png"), "c d.png");
        assert_eq!(normalize_file_name("e.xhtml?page=2"), "e.xhtml");
        assert_eq!(normalize_file_name("f.xhtml&x"), "f.xhtml");
        assert_eq!(normalize_file_name("#note"), "");
    }

    #[test]
    fn test_normalize_entry_path() {
        assert_eq!(normalize_entry_path("./OEBPS/Text/A.xhtml"), "oebps/text/a.xhtml");
        assert_eq!(normalize_entry_path("/OEBPS\\img%201.png"), "oebps/img 1.png");
    }

    #[test]
    fn test_root_folder() {
        assert_eq!(root_folder("OEBPS/content.opf"), "OEBPS/");
        assert_eq!(root_folder("content.opf"), "");
        assert_eq!(root_folder("a/b/content.opf"), "a/");
        assert_eq!(join_folder("OEBPS/", "toc.ncx"), "OEBPS/toc.ncx");
    }

    #[test]
    fn test_has_url_scheme() {
        assert!(has_url_scheme("https://example.com/a.xhtml"));
        assert!(has_url_scheme("mailto:someone@example.com"));
        assert!(!has_url_scheme("Text/a.xhtml"));
        assert!(!has_url_scheme("a.xhtml#x:y"));
        assert!(!has_url_scheme("#note"));
    }
}
