use std::path::PathBuf;

use clap::Parser;

use casgains::app::approot::{self, Options, OutputFormat};
use casgains::lookup::NullLookup;
use casgains::util::rw::WriteHandle;

const ABOUT: &str =
    "Parse mutual fund consolidated account statements (CAS) and compute \
     FIFO capital gains";

#[derive(clap::ValueEnum, PartialEq, Eq, Clone, Copy, Debug)]
enum Format {
    Text,
    Csv,
    Json,
}

#[derive(Parser, Debug)]
#[command(version = casgains::app::CASGAINS_APP_VERSION, about = ABOUT)]
struct Args {
    /// CAS PDF file (CAMS or KFINTECH)
    file: PathBuf,

    /// PDF password
    #[arg(short, long, default_value = "")]
    password: String,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// For CSV output, write one file per table into this directory
    #[arg(long, value_name = "DIR")]
    csv_dir: Option<String>,

    /// Compute FIFO capital gains
    #[arg(short, long, default_value_t = false)]
    gains: bool,

    /// Consolidated Schedule-112A rows for a financial year
    /// (e.g. FY2020-21); implies --gains
    #[arg(long, value_name = "FY")]
    gains_112a: Option<String>,

    /// Keep transactions in statement order (skip the chronological
    /// re-sort)
    #[arg(long, default_value_t = false)]
    no_sort: bool,

    /// Use the plain-text PDF backend instead of the layout-aware one
    #[arg(long, default_value_t = false)]
    plain_text: bool,
}

fn main() {
    let args = Args::parse();
    casgains::tracing::setup_tracing();

    let options = Options {
        file: args.file,
        password: args.password,
        format: match args.format {
            Format::Text => OutputFormat::Text,
            Format::Csv => OutputFormat::Csv,
            Format::Json => OutputFormat::Json,
        },
        csv_output_dir: args.csv_dir,
        gains: args.gains,
        gains_112a: args.gains_112a,
        sort_transactions: !args.no_sort,
        plain_text_backend: args.plain_text,
    };

    let res = approot::run(
        &options,
        &NullLookup,
        WriteHandle::stdout_write_handle(),
        WriteHandle::stderr_write_handle(),
    );
    if res.is_err() {
        std::process::exit(1);
    }
}
