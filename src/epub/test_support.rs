//! 测试用的内存EPUB构造工具

use std::io::{Cursor, Write};

use zip::ZipWriter;
use zip::write::FileOptions;

/// 指向`OEBPS/content.opf`的container.xml
pub const CONTAINER_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
    <rootfiles>
        <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
    </rootfiles>
</container>"#;

/// 在内存中构造ZIP压缩包
#[derive(Default)]
pub struct ZipBuilder {
    files: Vec<(String, Vec<u8>)>,
}

impl ZipBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file(mut self, name: &str, content: impl AsRef<[u8]>) -> Self {
        self.files.push((name.to_string(), content.as_ref().to_vec()));
        self
    }

    /// 替换同名文件的内容，没有同名文件时追加
    pub fn replace(mut self, name: &str, content: impl AsRef<[u8]>) -> Self {
        self.files.retain(|(existing, _)| existing != name);
        self.file(name, content)
    }

    /// 删除同名文件
    pub fn remove(mut self, name: &str) -> Self {
        self.files.retain(|(existing, _)| existing != name);
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, content) in self.files {
            zip.start_file(name, FileOptions::<()>::default()).unwrap();
            zip.write_all(&content).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }
}

pub const SAMPLE_OPF: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="2.0" unique-identifier="BookId">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:opf="http://www.idpf.org/2007/opf">
    <dc:title>Sample Book</dc:title>
    <dc:creator opf:role="aut">Alice</dc:creator>
    <dc:creator opf:role="aut">Bob</dc:creator>
    <dc:language>en</dc:language>
    <dc:date>2021-03-04</dc:date>
    <dc:subject>Fiction</dc:subject>
    <dc:subject>Testing</dc:subject>
    <dc:description>A tiny book.</dc:description>
    <meta name="cover" content="cover-image"/>
  </metadata>
  <manifest>
    <item id="ncx" href="toc.ncx" media-type="application/x-dtbncx+xml"/>
    <item id="a" href="Text/a.xhtml" media-type="application/xhtml+xml"/>
    <item id="b" href="Text/b.xhtml" media-type="application/xhtml+xml"/>
    <item id="c" href="Text/c.xhtml" media-type="application/xhtml+xml"/>
    <item id="notes" href="Text/notes.xhtml" media-type="application/xhtml+xml"/>
    <item id="figure" href="Images/figure.png" media-type="image/png"/>
    <item id="cover-image" href="Images/cover.png" media-type="image/png"/>
  </manifest>
  <spine toc="ncx">
    <itemref idref="a"/>
    <itemref idref="b"/>
    <itemref idref="c"/>
    <itemref idref="notes" linear="no"/>
  </spine>
</package>"#;

pub const SAMPLE_NCX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1">
  <docTitle><text>Sample Book</text></docTitle>
  <navMap>
    <navPoint id="n1" playOrder="1">
      <navLabel><text>Ch1</text></navLabel>
      <content src="Text/a.xhtml"/>
    </navPoint>
    <navPoint id="n2" playOrder="2">
      <navLabel><text>Ch2</text></navLabel>
      <content src="Text/b.xhtml"/>
      <navPoint id="n3" playOrder="3">
        <navLabel><text>Ch2-anchor</text></navLabel>
        <content src="Text/b.xhtml#mid"/>
      </navPoint>
    </navPoint>
    <navPoint id="n4" playOrder="4">
      <navLabel><text>Ch3</text></navLabel>
      <content src="Text/c.xhtml"/>
    </navPoint>
  </navMap>
</ncx>"#;

pub const CHAPTER_A: &str = r##"<?xml version="1.0" encoding="utf-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml">
<head><title>Ch1</title></head>
<body>
<h1 id="top">Chapter One</h1>
<p>See <a href="b.xhtml#mid">chapter two</a>, <a href="http://example.com/">the web</a>, <a href="missing.xhtml">a lost page</a>, <a href="#top">the top</a> and <a href="notes.xhtml">the notes</a>.</p>
<img src="../Images/figure.png" alt="figure"/>
<img src="../Images/absent.png" alt="absent"/>
</body>
</html>"##;

pub const CHAPTER_B: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<html xmlns="http://www.w3.org/1999/xhtml">
<body>
<h1>Chapter Two</h1>
<p id="mid">Middle &amp; end.</p>
<a href="../Text/c.xhtml">next</a>
</body>
</html>"#;

/// 含HTML命名实体，不是合法XML
pub const CHAPTER_C: &str = r#"<html>
<body>
<h1>Chapter&nbsp;Three</h1>
<p>Back to <a href="a.xhtml">the start</a>.<br>
<svg xmlns:xlink="http://www.w3.org/1999/xlink"><image xlink:href="../Images/figure.png"/></svg>
</body>
</html>"#;

pub const NOTES: &str = "<html><body><p>Notes</p></body></html>";

pub const FIGURE_PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 1];
pub const COVER_PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 2];

/// 三章节的示例书籍
pub fn sample_builder() -> ZipBuilder {
    ZipBuilder::new()
        .file("mimetype", "application/epub+zip")
        .file("META-INF/container.xml", CONTAINER_XML)
        .file("OEBPS/content.opf", SAMPLE_OPF)
        .file("OEBPS/toc.ncx", SAMPLE_NCX)
        .file("OEBPS/Text/a.xhtml", CHAPTER_A)
        .file("OEBPS/Text/b.xhtml", CHAPTER_B)
        .file("OEBPS/Text/c.xhtml", CHAPTER_C)
        .file("OEBPS/Text/notes.xhtml", NOTES)
        .file("OEBPS/Images/figure.png", FIGURE_PNG)
        .file("OEBPS/Images/cover.png", COVER_PNG)
}

pub fn sample_epub() -> Vec<u8> {
    sample_builder().build()
}
