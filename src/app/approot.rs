use std::io::Write;
use std::path::PathBuf;

use crate::app::outfmt::csv::CsvWriter;
use crate::app::outfmt::model::{CasWriter, OutputType};
use crate::app::outfmt::text::TextWriter;
use crate::app::render;
use crate::gains::report::CapitalGainsReport;
use crate::lookup::SchemeLookup;
use crate::statement::{read_statement, ReadOptions};
use crate::util::rw::WriteHandle;
use crate::write_errln;

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum OutputFormat {
    Text,
    Csv,
    Json,
}

pub struct Options {
    pub file: PathBuf,
    pub password: String,
    pub format: OutputFormat,
    /// For CSV output, write one file per table into this directory
    /// instead of streaming everything to stdout.
    pub csv_output_dir: Option<String>,
    pub gains: bool,
    pub gains_112a: Option<String>,
    pub sort_transactions: bool,
    pub plain_text_backend: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            file: PathBuf::new(),
            password: String::new(),
            format: OutputFormat::Text,
            csv_output_dir: None,
            gains: false,
            gains_112a: None,
            sort_transactions: true,
            plain_text_backend: false,
        }
    }
}

/// Parse the statement and write the requested outputs.
///
/// A document that cannot be parsed at all fails immediately. A parsed
/// document whose gains are incomplete still emits the statement and a
/// best-effort gains report; per-fund gains errors appear in the report
/// output, and the exit result is still an error so scripts notice.
pub fn run(
    options: &Options,
    lookup: &dyn SchemeLookup,
    out_w: WriteHandle,
    mut err_w: WriteHandle,
) -> Result<(), ()> {
    let read_opts = ReadOptions {
        sort_transactions: options.sort_transactions,
        plain_text_backend: options.plain_text_backend,
    };
    let data = match read_statement(
        options.file.clone(),
        &options.password,
        lookup,
        &read_opts,
    ) {
        Ok(data) => data,
        Err(e) => {
            write_errln!(err_w, "Error: {}", e);
            return Err(());
        }
    };

    let want_gains = options.gains || options.gains_112a.is_some();
    let mut gains_failed = false;
    let report = if want_gains {
        match CapitalGainsReport::new(&data, lookup) {
            Ok(report) => {
                gains_failed = !report.errors().is_empty();
                Some(report)
            }
            Err(e) => {
                write_errln!(err_w, "Gains computation failed: {}", e);
                gains_failed = true;
                None
            }
        }
    } else {
        None
    };

    let write_res = match options.format {
        OutputFormat::Json => write_json(options, &data, &report, out_w),
        OutputFormat::Text | OutputFormat::Csv => {
            write_tables(options, &data, &report, out_w)
        }
    };
    if let Err(e) = write_res {
        write_errln!(err_w, "Error writing output: {}", e);
        return Err(());
    }

    if gains_failed {
        Err(())
    } else {
        Ok(())
    }
}

fn write_json(
    options: &Options,
    data: &crate::statement::model::CasData,
    report: &Option<CapitalGainsReport>,
    mut out_w: WriteHandle,
) -> Result<(), String> {
    let mut doc = serde_json::json!({ "statement": data });
    if let Some(report) = report {
        let errors: Vec<String> = report
            .errors()
            .iter()
            .map(|e| format!("{}: {}", e.fund, e.error))
            .collect();
        doc["gains"] = serde_json::json!({
            "summary": report.summary().map_err(|e| e.to_string())?,
            "entries": report.sorted_gains(),
            "errors": errors,
        });
        if let Some(fin_year) = &options.gains_112a {
            doc["schedule_112a"] =
                serde_json::json!(report.schedule_112a(fin_year));
        }
    }
    let rendered =
        serde_json::to_string_pretty(&doc).map_err(|e| e.to_string())?;
    writeln!(out_w, "{}", rendered).map_err(|e| e.to_string())?;
    Ok(())
}

fn write_tables(
    options: &Options,
    data: &crate::statement::model::CasData,
    report: &Option<CapitalGainsReport>,
    out_w: WriteHandle,
) -> Result<(), String> {
    let mut writer: Box<dyn CasWriter> = match options.format {
        OutputFormat::Text => Box::new(TextWriter::new(out_w)),
        OutputFormat::Csv => match &options.csv_output_dir {
            Some(dir) => {
                Box::new(CsvWriter::new(dir).map_err(|e| e.to_string())?)
            }
            None => Box::new(CsvWriter::new_to_writer(out_w)),
        },
        OutputFormat::Json => unreachable!("handled by write_json"),
    };

    writer.print_render_table(
        OutputType::Holdings,
        "",
        &render::render_holdings_table(data),
    )?;
    writer.print_render_table(
        OutputType::Transactions,
        &data.investor_info.name,
        &render::render_transactions_table(data),
    )?;

    if let Some(report) = report {
        writer.print_render_table(
            OutputType::GainsSummary,
            "",
            &render::render_gains_summary_table(report)?,
        )?;
        writer.print_render_table(
            OutputType::GainsEntries,
            "",
            &render::render_gains_entries_table(report),
        )?;
        if let Some(fin_year) = &options.gains_112a {
            writer.print_render_table(
                OutputType::Schedule112a,
                fin_year,
                &render::render_112a_table(report, fin_year),
            )?;
        }
    }

    writer.finish()
}
