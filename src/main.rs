use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};

use epub_fixer::{
    truncate_for_display, EngineConfig, EpubDocument, EpubEditor, Revisions, Segmenter,
    SentenceUnit, SUPPORTED_EXTENSIONS,
};

#[derive(Parser)]
#[command(name = "epub_fixer")]
#[command(about = "提取 EPUB 中的句子并在不破坏标记的前提下应用文本修订")]
#[command(version = "0.1.0")]
struct Cli {
    /// 输入 EPUB 文件路径
    #[arg(short, long)]
    input: PathBuf,

    /// 输出路径（提取模式为 JSON，应用修订模式为 EPUB）
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// 显示文档统计信息
    #[arg(long)]
    stats: bool,

    /// 搜索句子（不区分大小写）
    #[arg(long)]
    search: Option<String>,

    /// 审阅模式：列出修订文件中每条修订的原文与修改后文本
    #[arg(long)]
    review: Option<PathBuf>,

    /// 应用修订模式：从修订 JSON 文件重建 EPUB
    #[arg(long)]
    apply_revisions: Option<PathBuf>,

    /// 测试模式：不做任何修订直接重建，验证解析和重建逻辑
    #[arg(long)]
    test_rebuild: bool,

    /// 句子切分策略（unicode 或 punctuation）
    #[arg(long)]
    segmenter: Option<Segmenter>,

    /// 配置文件（JSON）
    #[arg(long)]
    config: Option<PathBuf>,

    /// 静默模式(仅输出错误)
    #[arg(long)]
    quiet: bool,

    /// 输出调试日志
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    validate_input(&cli.input)?;
    let config = load_config(&cli)?;

    if cli.test_rebuild {
        return handle_test_rebuild(&cli, config);
    }

    if let Some(revision_file) = &cli.review {
        return handle_review(&cli, config, revision_file);
    }

    if let Some(revision_file) = &cli.apply_revisions {
        return handle_apply_revisions(&cli, config, revision_file);
    }

    if let Some(term) = &cli.search {
        return handle_search(&cli, config, term);
    }

    // 默认模式：句子提取
    handle_extraction(&cli, config)
}

/// 初始化日志；RUST_LOG 优先于命令行开关
fn init_logging(cli: &Cli) {
    let level = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

/// 验证输入文件
fn validate_input(input: &Path) -> Result<()> {
    if !input.exists() {
        bail!("输入文件不存在: {:?}", input);
    }

    let extension = input
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase());

    if !SUPPORTED_EXTENSIONS.iter().any(|&ext| Some(ext) == extension.as_deref()) {
        bail!("输入文件必须是 EPUB 文件");
    }

    Ok(())
}

/// 加载配置：配置文件 < 命令行参数
fn load_config(cli: &Cli) -> Result<EngineConfig> {
    let mut config = match &cli.config {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("读取配置文件失败: {:?}", path))?,
        None => EngineConfig::default(),
    };
    if let Some(segmenter) = cli.segmenter {
        config.segmenter = segmenter;
    }
    Ok(config)
}

fn load_document(cli: &Cli, config: EngineConfig) -> Result<EpubDocument> {
    EpubDocument::load(&cli.input, config).with_context(|| format!("解析 EPUB 失败: {:?}", cli.input))
}

fn load_revisions(revision_file: &Path) -> Result<Revisions> {
    let content = std::fs::read_to_string(revision_file)
        .with_context(|| format!("读取修订文件失败: {:?}", revision_file))?;
    Revisions::from_json(&content).with_context(|| format!("解析修订文件失败: {:?}", revision_file))
}

/// 处理句子提取
fn handle_extraction(cli: &Cli, config: EngineConfig) -> Result<()> {
    let document = load_document(cli, config)?;

    if cli.stats {
        print_stats(&document);
        return Ok(());
    }

    let output_path = cli
        .output
        .clone()
        .unwrap_or_else(|| cli.input.with_extension("json"));

    let json_output = serde_json::to_string_pretty(document.units()).context("序列化JSON失败")?;
    std::fs::write(&output_path, json_output)
        .with_context(|| format!("写入文件失败: {:?}", output_path))?;

    if !cli.quiet {
        print_extraction_summary(&document, &output_path);
    }

    Ok(())
}

/// 打印文档统计信息
fn print_stats(document: &EpubDocument) {
    let package = document.package();
    println!("文件: {}", document.file_name());
    if let Some(title) = &package.title {
        println!("书名: {}", title);
    }
    if let Some(language) = &package.language {
        println!("语言: {}", language);
    }
    println!("包文档: {}", package.opf_path);
    println!("内容文件: {}", package.content_paths.len());
    println!("句子单元: {}", document.units().len());
    println!("切分策略: {}", document.config().segmenter.name());

    if !document.warnings().is_empty() {
        println!("\n跳过的内容文件:");
        for warning in document.warnings() {
            println!("  - {}", warning);
        }
    }
}

/// 打印提取摘要信息
fn print_extraction_summary(document: &EpubDocument, output_path: &Path) {
    println!("提取到 {} 个句子单元", document.units().len());
    println!("结果已写入: {:?}", output_path);
    print_samples(document.units());
}

fn print_samples(units: &[SentenceUnit]) {
    if units.is_empty() {
        return;
    }
    println!("\n样例句子:");
    for (i, unit) in units.iter().take(3).enumerate() {
        println!("{}. [{}] \"{}\"", i + 1, unit.id, truncate_for_display(&unit.text, 50));
    }
    if units.len() > 3 {
        println!("... 还有 {} 个句子", units.len() - 3);
    }
}

/// 处理搜索
fn handle_search(cli: &Cli, config: EngineConfig, term: &str) -> Result<()> {
    let document = load_document(cli, config)?;
    let hits = document.search(term);

    if cli.quiet {
        for unit in &hits {
            println!("{}\t{}", unit.id, unit.text);
        }
        return Ok(());
    }

    println!("搜索 \"{}\"：找到 {} 个句子", term, hits.len());
    for unit in hits {
        println!("[{}] {}", unit.id, unit.text);
    }
    Ok(())
}

/// 处理修订审阅
fn handle_review(cli: &Cli, config: EngineConfig, revision_file: &Path) -> Result<()> {
    let mut editor = EpubEditor::new(load_document(cli, config)?);
    editor.import(load_revisions(revision_file)?);

    let review = editor.review();
    println!("共 {} 条修订", review.len());
    for (i, item) in review.iter().enumerate() {
        println!("\n{}. [{}]", i + 1, item.id);
        println!("  原文: {}", item.original_or_placeholder());
        println!("  修改: {}", item.revised);
    }
    Ok(())
}

/// 处理修订应用
fn handle_apply_revisions(cli: &Cli, config: EngineConfig, revision_file: &Path) -> Result<()> {
    let mut editor = EpubEditor::new(load_document(cli, config)?);
    let imported = editor.import(load_revisions(revision_file)?);

    if !cli.quiet {
        println!("准备应用 {} 条修订", imported);
    }

    let output_path = cli.output.clone().unwrap_or_else(|| {
        cli.input
            .with_file_name(editor.output_file_name())
    });

    let (report, backup) = editor
        .save(&output_path)
        .with_context(|| format!("应用修订失败: {:?}", output_path))?;

    if !cli.quiet {
        if let Some(backup) = backup {
            println!("已备份原输出文件: {:?}", backup);
        }
        println!(
            "修订应用完成：{} 个文件，{} 个块，{} 条修订",
            report.files_rebuilt.len(),
            report.blocks_patched,
            report.revisions_applied
        );
        if report.revisions_unchanged > 0 {
            println!("与原文相同而跳过: {} 条", report.revisions_unchanged);
        }
        if !report.stale.is_empty() {
            println!("不属于本书的修订: {} 条", report.stale.len());
        }
        for warning in &report.warnings {
            println!("⚠ {}", warning);
        }
        println!("输出到: {:?}", output_path);
    }

    Ok(())
}

/// 处理测试重建模式
fn handle_test_rebuild(cli: &Cli, config: EngineConfig) -> Result<()> {
    if !cli.quiet {
        println!("测试模式：解析并重建文件 {:?}", cli.input);
    }

    let document = load_document(cli, config)?;
    let checks = document.verify_roundtrip();
    let failed: Vec<_> = checks.iter().filter(|check| !check.passed()).collect();

    if !cli.quiet {
        for check in &checks {
            let status = match (check.identical_bytes, check.identical_structure) {
                (true, _) => "✓ 完全一致",
                (false, true) => "✓ 结构一致（字节有差异）",
                (false, false) => "⚠ 结构不一致",
            };
            println!("  {} {}", status, check.content_path);
        }
        for warning in document.warnings() {
            println!("  - 跳过 {}", warning);
        }
    }

    if let Some(output) = &cli.output {
        let (archive, _) = document.rebuild(&Revisions::new())?;
        archive
            .write_to_file(output)
            .with_context(|| format!("写入重建文件失败: {:?}", output))?;
        if !cli.quiet {
            println!("重建文件输出到: {:?}", output);
        }
    }

    if !failed.is_empty() {
        bail!("{} 个内容文件重建后结构不一致", failed.len());
    }

    if !cli.quiet {
        println!("测试完成：{} 个内容文件全部通过", checks.len());
    }
    Ok(())
}
