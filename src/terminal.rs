use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Virmerge: batch reports from per-sample viral abundance tables
#[derive(Debug, Parser)]
#[command(author, version, about)]
#[command(styles=get_styles())]
#[command(arg_required_else_help(true))]
#[clap(name = "virmerge", version)]
pub struct App {
    #[clap(subcommand)]
    pub command: Commands,
    /// Logging level (off, error, warn, info, debug, trace)
    #[arg(long, short = 'L', global = true, default_value = "info")]
    pub log_level: log::LevelFilter,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Merge per-sample result tables into a two-sheet spreadsheet
    Merge(MergeArgs),
}

#[derive(Debug, Args)]
pub struct MergeArgs {
    /// Per-sample result tables (.tsv)
    ///
    /// Tab-delimited tables with a header line, one per sample. Files that
    /// cannot be read or parsed are skipped with a warning. Multiple files
    /// can be specified consecutively or using multiple input arguments,
    /// for example: '-i s1.tsv -i s2.tsv' or '-i s1.tsv s2.tsv'
    #[arg(short, long, num_args(1..))]
    pub input: Vec<PathBuf>,
    /// File with additional result table paths, one per line
    #[arg(long, short = 'l')]
    pub input_list: Option<PathBuf>,
    /// Merged output spreadsheet (.xlsx)
    ///
    /// If the spreadsheet cannot be written, the sorted long table is
    /// written as comma-delimited backup next to it ('{stem}_backup.csv')
    #[arg(short, long)]
    pub output: PathBuf,
    /// Print merged table to console
    #[clap(long, short = 'T', help_heading = "Output options")]
    pub table: bool,
    /// Column holding the sample identifier
    #[clap(long, default_value = "sample_ID", help_heading = "Column options")]
    pub sample_column: String,
    /// Column holding the reference sequence accession
    #[clap(long, default_value = "accession", help_heading = "Column options")]
    pub accession_column: String,
    /// Column holding the normalized abundance
    #[clap(long, default_value = "RPKMF", help_heading = "Column options")]
    pub abundance_column: String,
}

pub fn get_styles() -> clap::builder::Styles {
    clap::builder::Styles::styled()
        .header(
            anstyle::Style::new()
                .bold()
                .underline()
                .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
        )
        .literal(
            anstyle::Style::new()
                .bold()
                .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
        )
}
