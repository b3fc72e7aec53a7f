use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use purine_lookup::config::{ViewPreset, DEFAULT_SOURCE, DEFAULT_TOP_N, SOURCE_ENV};
use purine_lookup::HeaderStyle;

#[derive(Parser, Debug)]
#[command(name = "purine-lookup", version, about = "Food purine content lookup")]
pub struct Cli {
    #[arg(long, global = true, help = "Output machine-readable JSON")]
    pub json: bool,
    #[arg(
        long,
        global = true,
        env = SOURCE_ENV,
        default_value = DEFAULT_SOURCE,
        help = "Reference table (.csv, .json or .parquet)"
    )]
    pub data: PathBuf,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search by name, pinyin or initials and filter by category and range.
    Search {
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Per-category averages and the highest-purine foods.
    Insights {
        #[arg(long, default_value_t = DEFAULT_TOP_N)]
        top: usize,
        #[arg(long, default_value_t = false, help = "Rank categories lowest first")]
        ascending: bool,
    },
    /// Write the current search result as CSV.
    Export {
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(long, help = "Output file (default: purine_data_<term>.csv)")]
        out: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = HeaderArg::Plain)]
        header: HeaderArg,
    },
    /// Convert the reference table to Parquet with stored search keys.
    Convert {
        #[arg(long, default_value = "purine_data.parquet")]
        out: PathBuf,
    },
    /// List categories in table order.
    Categories,
}

#[derive(Args, Debug, Clone)]
pub struct FilterArgs {
    /// Food name, full pinyin or initials, e.g. 牛肉, niurou or NR.
    pub term: Option<String>,
    #[arg(short, long = "category", help = "Restrict to a category (repeatable)")]
    pub categories: Vec<String>,
    #[arg(long, help = "Lower bound on total purine (mg/100g)")]
    pub min: Option<f64>,
    #[arg(long, help = "Upper bound on total purine (mg/100g)")]
    pub max: Option<f64>,
    #[arg(long, help = "Default-filter preset: compact or bilingual (default: from headers)")]
    pub preset: Option<ViewPreset>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum HeaderArg {
    Plain,
    Bilingual,
    Canonical,
}

impl From<HeaderArg> for HeaderStyle {
    fn from(arg: HeaderArg) -> Self {
        match arg {
            HeaderArg::Plain => HeaderStyle::Plain,
            HeaderArg::Bilingual => HeaderStyle::Bilingual,
            HeaderArg::Canonical => HeaderStyle::Canonical,
        }
    }
}
