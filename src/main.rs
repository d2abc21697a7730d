use std::path::PathBuf;
use std::process;

use clap::Parser;

use mhtml_unpack::core::{
    print_error_message, print_info_message, unpack_archive, FilenamePolicy, OutputLayout,
    UnpackOptions, UnpackSummary,
};
use mhtml_unpack::env::EnvConfig;

#[derive(Parser)]
#[command(name = "mhtml-unpack", version, about)]
/// Unpack an MHTML web archive into main.html and a resource/ directory
struct Cli {
    /// MHTML archive to unpack
    #[arg(value_name = "ARCHIVE")]
    archive: PathBuf,

    /// Output directory (supports %name% and %timestamp%)
    #[arg(short, long, value_name = "DIR")]
    output: Option<String>,

    /// Output layout: fixed or co-located
    #[arg(short, long, value_name = "LAYOUT")]
    layout: Option<OutputLayout>,

    /// Use random file names for saved resources
    #[arg(short, long)]
    random_names: bool,

    /// Download fonts referenced by style sheets but missing from the archive
    #[arg(short = 'f', long)]
    download_fonts: bool,

    /// Inline saved style sheets into <style> elements
    #[arg(short, long)]
    inline_css: bool,

    /// Font download timeout in seconds
    #[arg(short, long, value_name = "SECONDS")]
    timeout: Option<u64>,

    /// User-Agent used for font downloads
    #[arg(short, long, value_name = "AGENT")]
    user_agent: Option<String>,

    /// Verbose logging (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only print errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

fn main() {
    let cli = Cli::parse();

    let env_config = match EnvConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            print_error_message(&format!("Error: {}", err), atty::is(atty::Stream::Stderr));
            process::exit(1);
        }
    };
    let use_color = !env_config.no_color && atty::is(atty::Stream::Stderr);

    let log_level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => env_config.log_level.as_str(),
            1 => "debug",
            _ => "trace",
        }
    };
    setup_logging(log_level, use_color);

    let options = build_options(&cli, &env_config);
    match unpack_archive(&cli.archive, &options) {
        Ok(summary) => {
            if !cli.quiet {
                print_summary(&summary);
            }
        }
        Err(err) => {
            print_error_message(&format!("Error: {}", err), use_color);
            process::exit(1);
        }
    }
}

/// 命令行参数覆盖环境变量
fn build_options(cli: &Cli, env_config: &EnvConfig) -> UnpackOptions {
    let mut options = env_config.to_options();

    if let Some(output) = &cli.output {
        options.output_dir = output.clone();
        options.output_layout = OutputLayout::Fixed;
    }
    if let Some(layout) = cli.layout {
        options.output_layout = layout;
    }
    if cli.random_names {
        options.filename_policy = FilenamePolicy::AlwaysRandom;
    }
    options.download_fonts |= cli.download_fonts;
    options.inline_stylesheets |= cli.inline_css;
    if cli.timeout.is_some() {
        options.timeout = cli.timeout;
    }
    options.user_agent = cli.user_agent.clone();

    options
}

fn setup_logging(level: &str, use_color: bool) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(use_color)
        .with_target(false)
        .init();
}

fn print_summary(summary: &UnpackSummary) {
    match &summary.primary_document {
        Some(path) => print_info_message(&format!("Primary document: {}", path.display())),
        None => print_info_message("No HTML document found in archive"),
    }
    for path in &summary.secondary_documents {
        print_info_message(&format!("Secondary document: {}", path.display()));
    }
    for document in &summary.documents {
        let title = document
            .title
            .as_deref()
            .map(|title| format!(" ({})", title))
            .unwrap_or_default();
        print_info_message(&format!(
            "{}{}: {} replacements, {} unresolved",
            document.path.display(),
            title,
            document.replacements,
            document.unresolved.len()
        ));
        // BTreeSet 已排序
        for reference in &document.unresolved {
            print_info_message(&format!("  {}", reference));
        }
    }
    print_info_message(&format!(
        "{} resources written, {} parts skipped, {} references rewritten, {} unresolved",
        summary.resources_written,
        summary.parts_skipped,
        summary.total_replacements,
        summary.unresolved_count()
    ));
}
