use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "usbpd",
    version,
    about = "Table of contents, chunking and structure validation for section-numbered specifications"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Parse(ParseArgs),
    Toc(TocArgs),
    Status(StatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// PDF document, or a form-feed separated text dump (`.txt`).
    #[arg(long)]
    pub input_pdf: PathBuf,

    #[arg(long)]
    pub max_pages: Option<usize>,

    /// Drop header/footer lines repeated across pages before parsing.
    #[arg(long, default_value_t = false)]
    pub strip_running_lines: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ParseArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[arg(long, default_value = "out/usbpd")]
    pub output_dir: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct TocArgs {
    #[command(flatten)]
    pub source: SourceArgs,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, default_value = "out/usbpd")]
    pub output_dir: PathBuf,
}
