use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::extract::{ExtractOptions, Layout};

#[derive(Parser, Debug)]
#[command(name = "hcad-extract")]
#[command(version)]
#[command(about = "Safely extract HCAD property-assessment ZIP archives", long_about = None)]
#[command(after_help = "Examples:\n  \
  hcad-extract extract --indir downloads/2025 --outdir extracted --workers 4\n  \
  hcad-extract extract --pattern '*owner*.zip' --manifest extracted\n  \
  hcad-extract extract --layout hcad --clean\n  \
  hcad-extract list -v downloads/2025/Real_acct_owner.zip")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Quiet mode (-qq => errors only)
    #[arg(short = 'q', action = clap::ArgAction::Count, global = true, conflicts_with = "verbose")]
    pub quiet: u8,

    /// More logging (-vv => trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Log level or filter directive; overrides -q/-v (RUST_LOG overrides both)
    #[arg(long, value_name = "LEVEL", global = true, env = "HCAD_LOG")]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Extract every archive in a directory and record a manifest
    Extract(ExtractArgs),
    /// List the members of one archive
    List(ListArgs),
}

#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// Directory to search for .zip archives (recursively)
    #[arg(long, value_name = "DIR", default_value = "downloads", env = "HCAD_INDIR")]
    pub indir: PathBuf,

    /// Directory to extract into; each archive gets its own subdirectory
    #[arg(long, value_name = "DIR", default_value = "extracted", env = "HCAD_OUTDIR")]
    pub outdir: PathBuf,

    /// Glob pattern to filter archives by file name or relative path (e.g. '*owner*.zip')
    #[arg(long, value_name = "GLOB")]
    pub pattern: Option<String>,

    /// Number of archives extracted in parallel
    #[arg(
        long,
        value_name = "N",
        default_value_t = 1,
        env = "HCAD_WORKERS",
        value_parser = clap::value_parser!(u16).range(1..)
    )]
    pub workers: u16,

    /// Manifest JSON file, or directory to create a timestamped manifest in
    #[arg(long, value_name = "PATH", env = "HCAD_MANIFEST")]
    pub manifest: Option<PathBuf>,

    /// Remove each archive's existing destination directory before extracting
    #[arg(long)]
    pub clean: bool,

    /// Output layout; `hcad` splits gis_data/ from pdata/ and unpacks the
    /// archives inside GIS_Public.zip
    #[arg(long, value_enum, default_value_t = Layout::Flat, env = "HCAD_LAYOUT")]
    pub layout: Layout,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// ZIP archive to inspect
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Show sizes, compression ratio and timestamps, and flag unsafe names
    #[arg(short = 'l', long = "long")]
    pub long: bool,
}

impl Cli {
    /// Log filter derived from the flags.
    pub fn log_level(&self) -> String {
        if let Some(level) = &self.log_level {
            return level.clone();
        }
        match (self.quiet, self.verbose) {
            (q, _) if q > 1 => "error",
            (1, _) => "warn",
            (_, 0) => "info",
            (_, 1) => "debug",
            _ => "trace",
        }
        .to_string()
    }
}

impl From<&ExtractArgs> for ExtractOptions {
    fn from(args: &ExtractArgs) -> Self {
        Self {
            indir: args.indir.clone(),
            outdir: args.outdir.clone(),
            pattern: args.pattern.clone(),
            workers: args.workers as usize,
            manifest: args.manifest.clone(),
            clean: args.clean,
            layout: args.layout,
        }
    }
}
