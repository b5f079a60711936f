use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use skydm_types::FileKind;

#[derive(Parser)]
#[command(name = "skydm", about = "SkyDM: versioned data products, fuzzy lookup and changelogs", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Find the best match for a name among candidates
    Match(MatchArgs),
    /// List the products in a products file
    Products(ProductsArgs),
    /// Show every version of a product and where its file is
    Expand(ExpandArgs),
    /// Show the changelog between versions of a product
    Changelog(ChangelogArgs),
    /// Compare the structure of two files
    Diff(DiffArgs),
}

#[derive(Args)]
pub struct MatchArgs {
    pub query: String,
    #[arg(required = true)]
    pub candidates: Vec<String>,
    #[arg(long)]
    pub min_score: Option<u8>,
}

/// Where product definitions come from.
#[derive(Args)]
pub struct ProductSource {
    /// Products YAML file
    pub products: PathBuf,
    /// Datamodel schema YAML file
    #[arg(long)]
    pub datamodel: Option<PathBuf>,
}

#[derive(Args)]
pub struct ProductsArgs {
    #[command(flatten)]
    pub source: ProductSource,
}

#[derive(Args)]
pub struct ExpandArgs {
    #[command(flatten)]
    pub source: ProductSource,
    pub product: String,
}

#[derive(Args)]
pub struct ChangelogArgs {
    #[command(flatten)]
    pub source: ProductSource,
    pub product: String,
    /// Restrict to these versions
    #[arg(long, num_args = 1..)]
    pub versions: Vec<String>,
    /// Emit the report as a list of lines
    #[arg(long)]
    pub split: bool,
    /// Include the full line-by-line structure report
    #[arg(long)]
    pub full: bool,
}

#[derive(Args)]
pub struct DiffArgs {
    pub file1: PathBuf,
    pub file2: PathBuf,
    #[arg(long, default_value = "fits")]
    pub kind: FileKind,
    #[arg(long)]
    pub full: bool,
}
