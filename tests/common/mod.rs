#![allow(dead_code)]

/// Builders for synthetic statement text, shaped like the logical-line
/// stream the row grouper emits (cells joined with "\t\t", lines joined
/// with U+2029).

pub const DETAILED_HEADER: &str =
    "Consolidated Account Statement\u{2029}01-Apr-2019 To 31-Mar-2022";

pub fn statement_text(lines: &[&str]) -> String {
    let mut all = vec![DETAILED_HEADER];
    all.extend_from_slice(lines);
    all.join("\u{2029}")
}

pub fn folio_line(folio: &str, pan: &str) -> String {
    format!("Folio No : {}\t\tPAN : {}\t\tKYC : OK\t\tPAN : OK", folio, pan)
}

pub fn scheme_line(rta_code: &str, name: &str, rta: &str) -> String {
    format!("{}-{}\t\tRegistrar : {}", rta_code, name, rta)
}

pub fn txn_line(date: &str, desc: &str, amount: &str, units: &str, nav: &str, balance: &str) -> String {
    format!(
        "{}\t\t{}\t\t{}\t\t{}\t\t{}\t\t{}",
        date, desc, amount, units, nav, balance
    )
}

pub fn tax_line(date: &str, desc: &str, amount: &str) -> String {
    format!("{}\t\t{}\t\t{}", date, desc, amount)
}
