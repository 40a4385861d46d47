//! UMD Converter CLI
//!
//! Convert UMD ebook files to plain text, FML or JSON.

use clap::{Parser, ValueEnum};
use log::{info, LevelFilter};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use umd_converter::{output, UmdBook};

#[derive(Parser)]
#[command(name = "umd-convert")]
#[command(about = "Convert UMD ebook files to text, FML or JSON")]
#[command(version)]
struct Cli {
    /// Input .umd file(s)
    #[arg(required = true)]
    input: Vec<PathBuf>,

    /// Output file path (for single input) or directory (for multiple inputs)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "txt")]
    format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(short, long)]
    pretty: bool,

    /// Do not write the embedded cover image next to the input
    #[arg(long)]
    no_cover: bool,

    /// Show verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Txt,
    Fml,
    Json,
}

impl OutputFormat {
    fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Txt => "txt",
            OutputFormat::Fml => "fml",
            OutputFormat::Json => "json",
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(default_level)
        .parse_default_env()
        .init();

    let mut success_count = 0;
    let mut error_count = 0;

    for input_path in &cli.input {
        info!("Processing: {}", input_path.display());

        match process_file(&cli, input_path) {
            Ok(output_path) => {
                success_count += 1;
                if cli.verbose {
                    eprintln!("  -> {}", output_path.display());
                }
            }
            Err(e) => {
                error_count += 1;
                eprintln!("Error processing {}: {}", input_path.display(), e);
            }
        }
    }

    if cli.input.len() > 1 {
        eprintln!(
            "\nProcessed {} file(s): {} success, {} errors",
            cli.input.len(),
            success_count,
            error_count
        );
    }

    if error_count > 0 {
        std::process::exit(1);
    }
}

fn process_file(cli: &Cli, input_path: &Path) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let book = UmdBook::from_file(input_path)?;

    if cli.verbose {
        eprintln!("  Title: {}", book.title());
        eprintln!("  Author: {}", book.author());
        eprintln!("  Date: {}", book.date());
        eprintln!("  Chapters: {}", book.chapter_count());
    }

    if let Some(cover) = book.cover() {
        if cli.no_cover {
            info!("Skipping cover ({} bytes)", cover.data.len());
        } else {
            cover.save()?;
            if cli.verbose {
                eprintln!("  Cover: {}", cover.path.display());
            }
        }
    }

    let output_path = get_output_path(cli, input_path);

    let file = File::create(&output_path)?;
    let mut writer = BufWriter::new(file);

    match cli.format {
        OutputFormat::Txt => output::write_text(&book, &mut writer)?,
        OutputFormat::Fml => {
            let source = std::fs::canonicalize(input_path)?;
            output::write_fml(&book, &source, &mut writer)?
        }
        OutputFormat::Json => output::write_json(&book, &mut writer, cli.pretty)?,
    }

    writer.flush()?;

    Ok(output_path)
}

fn get_output_path(cli: &Cli, input_path: &Path) -> PathBuf {
    let extension = cli.format.extension();

    if let Some(ref output) = cli.output {
        if cli.input.len() == 1 {
            // Single file: use output as-is if it has an extension, otherwise add one
            if output.extension().is_some() {
                output.clone()
            } else {
                output.with_extension(extension)
            }
        } else {
            // Multiple files: output is a directory
            let filename = input_path
                .file_stem()
                .unwrap_or_default()
                .to_string_lossy();
            output.join(format!("{}.{}", filename, extension))
        }
    } else {
        input_path.with_extension(extension)
    }
}
