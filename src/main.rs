use std::fs;
use std::path::{Path, PathBuf};

use bookloom::epub::config::DEFAULT_CONFIG_PATH;
use bookloom::epub::ncx::TocTreeStyle;
use bookloom::{Chapter, ChapterRef, Epub, Link, ReaderConfig, Result, TocTree};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// 📚 BookLoom - EPUB阅读核心工具
#[derive(Parser)]
#[command(name = "bookloom")]
#[command(about = "把EPUB文件解析为可导航的章节序列")]
#[command(version)]
struct Args {
    /// EPUB文件路径
    #[arg(help = "要处理的EPUB文件路径")]
    epub_file: PathBuf,

    /// 详细输出模式
    #[arg(short, long, help = "显示详细信息并输出调试日志")]
    verbose: bool,

    /// 显示元数据信息
    #[arg(short, long, help = "显示EPUB元数据信息")]
    metadata: bool,

    /// 显示目录树
    #[arg(short, long, help = "显示EPUB目录树结构")]
    toc: bool,

    /// 列出章节
    #[arg(short = 'l', long, help = "列出去重后的章节序列")]
    list: bool,

    /// 显示指定章节内容
    #[arg(short, long, help = "显示指定章节的内容（使用章节索引，从1开始）")]
    chapter: Option<usize>,

    /// 按文件名显示章节内容
    #[arg(short, long, conflicts_with = "chapter", help = "按文件名显示章节内容，如 chapter1.xhtml")]
    path: Option<String>,

    /// 章节内容显示格式
    #[arg(long, value_enum, default_value = "text", help = "章节内容的显示格式")]
    format: ContentFormat,

    /// 章节内容最大显示长度
    #[arg(long, default_value = "2000", help = "章节内容最大显示字符数（0表示不限制）")]
    max_length: usize,

    /// 导出封面图片
    #[arg(long, value_name = "OUT", help = "把封面图片写入指定文件")]
    cover: Option<PathBuf>,

    /// 配置文件路径
    #[arg(long, value_name = "PATH", help = "阅读器配置文件，不存在时生成默认配置；未指定时读取当前目录的 bookloom.yaml（如果存在）")]
    config: Option<PathBuf>,
}

/// 章节内容显示格式
#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ContentFormat {
    /// 改写后的HTML
    Html,
    /// 纯文本
    Text,
}

fn main() {
    let args = Args::parse();

    let default_filter = if args.verbose { "bookloom=debug" } else { "bookloom=info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    println!("📚 BookLoom - EPUB阅读核心工具");
    println!("正在打开EPUB文件: {}", args.epub_file.display());

    match process_epub(&args) {
        Ok(_) => println!("🎉 EPUB文件处理完成！"),
        Err(e) => {
            eprintln!("❌ 错误: {}", e);
            std::process::exit(1);
        }
    }
}

fn process_epub(args: &Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => ReaderConfig::load_or_default(path),
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => ReaderConfig::load_or_default(DEFAULT_CONFIG_PATH),
        None => ReaderConfig::default(),
    };
    let epub = Epub::from_path_with_config(&args.epub_file, config)?;

    if args.verbose {
        let location = epub.package_location();
        println!("\n📦 包文档: {}", location.opf_path);
        println!("  压缩包文件数: {}", epub.archive().entries().len());
        let opf = epub.opf();
        println!("  清单项目: {} 个", opf.manifest.len());
        println!(
            "  图片资源: {} 个",
            opf.manifest.iter().filter(|item| item.is_image()).count()
        );
        println!(
            "  脊柱项目: {} 个（线性 {} 个）",
            opf.spine.len(),
            opf.spine.linear_items().count()
        );
        if let Some(cover_id) = &opf.cover_id {
            match epub.resources().resolve_path(cover_id) {
                Ok(path) => println!("  封面清单项: {} → {}", cover_id, path),
                Err(e) => println!("  ⚠️  封面清单项无效: {}", e),
            }
        }
    }

    if args.metadata {
        display_metadata(&epub);
    }

    if args.toc {
        display_table_of_contents(&epub, args.verbose)?;
    }

    let chapters = epub.load_chapters()?;
    println!("\n📑 共 {} 个章节，总大小 {} 字节", chapters.len(), chapters.total_size());

    if args.list {
        for chapter in chapters {
            println!(
                "  {}. {} [{}] ({} 字节)",
                chapter.index + 1,
                chapter.title,
                chapter.file_name,
                chapter.size
            );
        }
    }

    let selected = match (&args.chapter, &args.path) {
        (Some(0), _) => {
            println!("  ❌ 章节索引从1开始");
            None
        }
        (Some(index), _) => Some(ChapterRef::Index(index - 1)),
        (None, Some(path)) => Some(ChapterRef::Path(path.clone())),
        (None, None) => None,
    };
    if let Some(chapter) = selected {
        display_chapter_content(&epub, chapter, args.format, args.max_length, args.verbose)?;
    }

    if let Some(out) = &args.cover {
        export_cover(&epub, out)?;
    }

    Ok(())
}

/// 显示EPUB元数据信息
fn display_metadata(epub: &Epub) {
    let metadata = epub.metadata();
    println!("\n📊 EPUB元数据信息:");
    println!("  📖 EPUB版本: {}", epub.opf().version);

    let fields = [
        ("标题", &metadata.title),
        ("作者", &metadata.author),
        ("语言", &metadata.language),
        ("出版日期", &metadata.date),
        ("描述", &metadata.description),
        ("封面", &metadata.cover_image_path),
    ];
    for (label, value) in fields {
        if let Some(value) = value {
            println!("    {}: {}", label, value);
        }
    }

    if !metadata.subjects.is_empty() {
        println!("\n  🏷️  主题:");
        for (i, subject) in metadata.subjects.iter().enumerate() {
            println!("    {}. {}", i + 1, subject);
        }
    }
}

/// 显示目录树
fn display_table_of_contents(epub: &Epub, verbose: bool) -> Result<()> {
    println!("\n🌳 目录树:");
    let toc = epub.toc()?;

    let mut toc_tree = TocTree::new(toc).with_style(TocTreeStyle::TreeSymbols);
    if verbose {
        toc_tree = toc_tree.with_show_paths(true);
    } else {
        toc_tree = toc_tree.with_show_paths(false).with_max_depth(Some(3));
    }

    println!("  📊 目录节点: {} 个，最大深度: {}", toc_tree.total_nodes(), toc.tree.depth());
    println!("\n{}", toc_tree);
    Ok(())
}

/// 显示指定章节的内容
fn display_chapter_content(
    epub: &Epub,
    chapter: ChapterRef,
    format: ContentFormat,
    max_length: usize,
    verbose: bool,
) -> Result<()> {
    let content = epub.load_chapter_content(chapter, |target: &Chapter| {
        println!("  ➡️  跳转到章节 {}: {}", target.index + 1, target.title);
    })?;
    let chapter = &content.chapter;

    println!("\n📖 章节内容:");
    println!("  📄 章节 {}: {}", chapter.index + 1, chapter.title);
    println!("  📁 源文件: {}", chapter.href);
    println!("  🖼️  已解析图片: {} 个", content.images().len());

    let links = content.links();
    println!("  🔗 链接: {} 个", links.len());
    if verbose {
        for link in &links {
            let kind = match link {
                Link::Chapter { chapter, .. } => format!("章节 {}", chapter.index + 1),
                Link::External { .. } => "外部".to_string(),
                Link::Local { .. } => "页内".to_string(),
                Link::Unresolved { .. } => "无效".to_string(),
            };
            println!("    {} -> {}", link.href(), kind);
        }
    }

    if verbose {
        println!("  📦 已缓存资源: {} 个", epub.resources().cached_len());
    }

    let text = match format {
        ContentFormat::Html => content.to_html(),
        ContentFormat::Text => content.text(),
    };
    let total = text.chars().count();
    println!("  📏 内容长度: {} 字符", total);

    let display: String = if max_length > 0 && total > max_length {
        println!("  ✂️  内容已截断到 {} 字符", max_length);
        text.chars().take(max_length).collect()
    } else {
        text
    };

    let rule = "━".repeat(20);
    println!("\n{}", rule);
    println!("{}", display);
    println!("{}", rule);

    if max_length > 0 && total > max_length {
        println!(
            "  💡 提示: 还有 {} 个字符未显示。使用 --max-length 0 显示完整内容。",
            total - max_length
        );
    }

    Ok(())
}

/// 导出封面图片
fn export_cover(epub: &Epub, out: &Path) -> Result<()> {
    match epub.resolve_cover_image()? {
        Some(cover) => {
            fs::write(out, &cover.data)?;
            println!(
                "\n🖼️  封面已导出: {} ({}, {} 字节)",
                out.display(),
                cover.media_type,
                cover.len()
            );
        }
        None => println!("\n🖼️  这本书没有封面"),
    }
    Ok(())
}
