//! PDF Watermark CLI tool
//!
//! Stamps a repeating text watermark on every page of a PDF and writes
//! `<name>_watermarked.pdf` next to the input. Prints the number of pages
//! processed.

use anyhow::Context;
use clap::error::ErrorKind;
use clap::Parser;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

use pdf_watermark::fonts::{default_search_dirs, discover_font, FontSource};
use pdf_watermark::watermark::{parse_start_number, watermark_file, WatermarkOptions};
use pdf_watermark::Error;

/// PDF Watermark - Stamp a repeating label along the edge of every page
#[derive(Parser)]
#[command(name = "pdf-watermark")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    # Stamp the file name on every page
    pdf-watermark --path report.pdf

    # Stamp a label with page numbers starting at 5
    pdf-watermark --path report.pdf --text \"CONFIDENTIAL\" --start 5 --nombre")]
struct Cli {
    /// Input PDF file
    #[arg(long, default_value = "")]
    path: String,

    /// Watermark text (defaults to the input file name)
    #[arg(long, default_value = "")]
    text: String,

    /// Page number of the first page, used with --nombre
    #[arg(long, default_value = "1")]
    start: String,

    /// Append the page number "(p.NNN)" to the watermark
    #[arg(long)]
    nombre: bool,

    /// TrueType font file to use instead of searching for one
    #[arg(long)]
    font: Option<PathBuf>,

    /// Directory to search for a .ttf file (default: current directory, then the executable's directory)
    #[arg(long)]
    font_dir: Option<PathBuf>,

    /// Increase log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 1,
            };
            let _ = e.print();
            process::exit(code);
        }
    };

    init_logging(cli.verbose);

    match run(&cli) {
        Ok(count) => {
            println!("{}", count);
        }
        Err(e) => {
            if let Some(Error::FontNotFound { .. }) = e.downcast_ref::<Error>() {
                eprintln!("{}", e);
                println!("0");
            } else {
                eprintln!("Error: {:#}", e);
            }
            process::exit(1);
        }
    }
}

/// Log to stderr; stdout carries the page count
fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Stamp the input and return the number of pages processed
fn run(cli: &Cli) -> anyhow::Result<usize> {
    let start_number = parse_start_number(&cli.start)?;

    let font_path = match (&cli.font, &cli.font_dir) {
        (Some(path), _) => path.clone(),
        (None, Some(dir)) => discover_font(std::slice::from_ref(dir))?,
        (None, None) => discover_font(&default_search_dirs())?,
    };
    let font = FontSource::load(&font_path)
        .with_context(|| format!("Failed to read font {}", font_path.display()))?;
    tracing::info!(font = %font_path.display(), "using font");

    let options = WatermarkOptions {
        label: cli.text.clone(),
        start_number,
        numbered: cli.nombre,
        ..Default::default()
    };

    let input = PathBuf::from(&cli.path);
    let report = watermark_file(&input, &options, Some(&font))?;

    tracing::info!(output = %report.output_path.display(), "done");
    Ok(report.page_count)
}
