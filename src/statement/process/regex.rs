//! Regular expressions for the various CAS sections. Cells within a
//! reconstructed row are separated by "\t\t" (see pdftext::rowgroup).

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    pub static ref CAS_TYPE_RE: Regex =
        Regex::new(r"(?is)consolidated\s+account\s+(statement|summary)").unwrap();

    pub static ref DETAILED_DATE_RE: Regex = Regex::new(
        r"(?is)(?P<from>\d{2}-[a-zA-Z]{3}-\d{4})\s+to\s+(?P<to>\d{2}-[a-zA-Z]{3}-\d{4})"
    )
    .unwrap();

    pub static ref SUMMARY_DATE_RE: Regex =
        Regex::new(r"(?is)as\s+on\s+(?P<date>\d{2}-[a-zA-Z]{3}-\d{4})").unwrap();

    pub static ref AMC_RE: Regex =
        Regex::new(r"(?is)^(.+?)\s+(MF|Mutual\s+Fund)$").unwrap();

    pub static ref FOLIO_RE: Regex = Regex::new(
        r"(?is)Folio\s+No\s*:\s+([\d/\s]+)\s+.*?(?:PAN\s*:\s+([A-Z]{5}\d{4}[A-Z])\s+)?.*?KYC\s*:\s*(OK|NOT\s+OK)\s*.*?(?:PAN\s*:\s*(OK|NOT\s+OK))?$"
    )
    .unwrap();

    pub static ref SCHEME_RE: Regex = Regex::new(
        r"(?is)([\s\w]+)-\s*\d*\s*(.+?)\s*(?:\(Advisor\s*:\s*(.+?)\))*\s+Registrar\s*:\s*(.*)\s*$"
    )
    .unwrap();

    // A row holding only the Registrar column: long scheme names push it
    // onto its own logical line, above the scheme row proper.
    pub static ref REGISTRAR_PUSHED_RE: Regex =
        Regex::new(r"(?i)^\s*Registrar\s*:\s*(.*)$").unwrap();

    pub static ref OPEN_UNITS_RE: Regex =
        Regex::new(r"Opening\s+Unit\s+Balance.+?([\d,.]+)").unwrap();

    pub static ref CLOSE_UNITS_RE: Regex =
        Regex::new(r"Closing\s+Unit\s+Balance.+?([\d,.]+)").unwrap();

    pub static ref VALUATION_RE: Regex = Regex::new(
        r"(?i)Valuation\s+on\s+(\d{2}-[A-Za-z]{3}-\d{4})\s*:\s*INR\s*([\d,.]+)"
    )
    .unwrap();

    pub static ref NAV_RE: Regex = Regex::new(
        r"(?i)NAV\s+on\s+(\d{2}-[A-Za-z]{3}-\d{4})\s*:\s*INR\s*([\d,.]+)"
    )
    .unwrap();

    // Transaction rows come in three shapes, tried in this order:
    // full (amount, units, nav, closing balance), unit entries without
    // nav/balance columns, and tax entries carrying only an amount.
    // Negative values are printed in parentheses; the leading '(' is kept
    // in the capture and handled by the decimal parser.
    pub static ref TXN_FULL_RE: Regex = Regex::new(
        r"(?i)(\d{2}-[A-Za-z]{3}-\d{4})\t\t([^\t]+?)\t\t([-(]?[\d,.]+)\)?\t\t([-(]?[\d,.]+)\)?\t\t([-(]?[\d,.]+)\)?\t\t([-(]?[\d,.]+)\)?"
    )
    .unwrap();

    pub static ref TXN_UNITS_RE: Regex = Regex::new(
        r"(?i)(\d{2}-[A-Za-z]{3}-\d{4})\t\t([^\t]+?)\t\t([-(]?[\d,.]+)\)?\t\t([-(]?[\d,.]+)\)?\s*$"
    )
    .unwrap();

    pub static ref TXN_TAX_RE: Regex = Regex::new(
        r"(?i)(\d{2}-[A-Za-z]{3}-\d{4})\t\t([^\t]+?)\t\t([-(]?[\d,.]+)\)?\s*$"
    )
    .unwrap();

    pub static ref DIVIDEND_RE: Regex = Regex::new(
        r"(?is)(?:dividend|idcw).*?@\s*Rs\.?\s*([\d.]+)\s+per\s+unit"
    )
    .unwrap();

    // A wrapped description continuation: a newline inside a transaction
    // row whose following text holds no tab-separated columns.
    pub static ref DESCRIPTION_TAIL_RE: Regex =
        Regex::new(r"\d{2}-[A-Za-z]{3}-\d{4}\t\t.*(\n[^\t]+)(\t|$)").unwrap();

    pub static ref SUMMARY_ROW_RE: Regex = Regex::new(
        r"(?ism)([\d/\s]+)\s+([\s\w]+)-\s*\d*\s*(.+?)\s*([\d,.]+)\s*(\d{2}-[A-Za-z]{3}-\d{4})\s*([\d,.]+)\s*([\d,.]+)\s*(\w+)\s*$"
    )
    .unwrap();

    pub static ref FORMER_NAME_RE: Regex =
        Regex::new(r"(?is)\((formerly|erstwhile).+?\)").unwrap();

    // ISIN printed inline on a scheme row, e.g. "- ISIN: INF846K01EW2".
    pub static ref ISIN_SUFFIX_RE: Regex =
        Regex::new(r"(?i)\s*-?\s*ISIN\s*:\s*([A-Z0-9]{12})").unwrap();
}
