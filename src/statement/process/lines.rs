use rust_decimal::Decimal;
use time::Date;

use crate::util::date::parse_cas_date;
use crate::util::decimal::parse_cas_decimal;

use super::regex::{
    AMC_RE, CLOSE_UNITS_RE, DESCRIPTION_TAIL_RE, FOLIO_RE, FORMER_NAME_RE,
    ISIN_SUFFIX_RE, NAV_RE, OPEN_UNITS_RE, SCHEME_RE, TXN_FULL_RE, TXN_TAX_RE,
    TXN_UNITS_RE, VALUATION_RE,
};

#[derive(PartialEq, Eq, Clone, Debug)]
pub struct FolioAnchor {
    pub folio: String,
    pub pan: Option<String>,
    pub kyc: Option<String>,
    pub pan_kyc: Option<String>,
}

#[derive(PartialEq, Eq, Clone, Debug)]
pub struct SchemeAnchor {
    pub rta_code: String,
    /// Normalized name: historical parentheticals and ISIN suffix
    /// stripped, whitespace collapsed.
    pub name: String,
    pub advisor: Option<String>,
    pub rta: String,
    /// ISIN printed inline on the scheme row, where present.
    pub isin: Option<String>,
}

/// Closing-balance / valuation / NAV data. These can share one row, so
/// they are matched together rather than as exclusive kinds.
#[derive(PartialEq, Eq, Clone, Debug, Default)]
pub struct FooterFields {
    pub close: Option<Decimal>,
    pub valuation: Option<(Date, Decimal)>,
    pub nav: Option<(Date, Decimal)>,
}

#[derive(PartialEq, Eq, Clone, Debug)]
pub struct TxnFields {
    pub date: Date,
    pub description: String,
    pub amount: Decimal,
    pub units: Option<Decimal>,
    pub nav: Option<Decimal>,
    pub balance: Option<Decimal>,
}

/// One logical line, tagged by the kind of anchor it matched.
#[derive(PartialEq, Clone, Debug)]
pub enum LineKind {
    Amc(String),
    Folio(FolioAnchor),
    Scheme(SchemeAnchor),
    OpenUnits(Decimal),
    SchemeFooter(FooterFields),
    Transaction(TxnFields),
    Other,
}

/// Classify a logical line. Matchers run in fixed priority order; the
/// first that matches wins.
pub fn classify_line(line: &str) -> LineKind {
    if let Some(kind) = match_amc(line) {
        return kind;
    }
    if let Some(kind) = match_folio(line) {
        return kind;
    }
    if let Some(kind) = match_scheme(line) {
        return kind;
    }
    if let Some(kind) = match_open_units(line) {
        return kind;
    }
    if let Some(kind) = match_scheme_footer(line) {
        return kind;
    }
    if let Some(kind) = match_transaction(line) {
        return kind;
    }
    LineKind::Other
}

pub fn normalize_scheme_name(raw: &str) -> String {
    let stripped = FORMER_NAME_RE.replace_all(raw, "");
    stripped.split_whitespace().collect::<Vec<&str>>().join(" ")
}

fn match_amc(line: &str) -> Option<LineKind> {
    AMC_RE
        .captures(line)
        .map(|m| LineKind::Amc(m.get(0).unwrap().as_str().trim().to_string()))
}

fn match_folio(line: &str) -> Option<LineKind> {
    let m = FOLIO_RE.captures(line)?;
    let group_str =
        |i: usize| m.get(i).map(|g| g.as_str().trim().to_string());
    Some(LineKind::Folio(FolioAnchor {
        folio: group_str(1)?,
        pan: group_str(2),
        kyc: group_str(3),
        pan_kyc: group_str(4),
    }))
}

fn match_scheme(line: &str) -> Option<LineKind> {
    let m = SCHEME_RE.captures(line)?;
    let raw_name = m.get(2).unwrap().as_str();
    let isin = ISIN_SUFFIX_RE
        .captures(raw_name)
        .map(|im| im.get(1).unwrap().as_str().to_string());
    let name = ISIN_SUFFIX_RE.replace_all(raw_name, "");
    Some(LineKind::Scheme(SchemeAnchor {
        rta_code: m.get(1).unwrap().as_str().trim().to_string(),
        name: normalize_scheme_name(&name),
        advisor: m.get(3).map(|g| g.as_str().trim().to_string()),
        rta: m.get(4).unwrap().as_str().trim().to_string(),
        isin,
    }))
}

fn match_open_units(line: &str) -> Option<LineKind> {
    let m = OPEN_UNITS_RE.captures(line)?;
    let units = parse_cas_decimal(m.get(1).unwrap().as_str()).ok()?;
    Some(LineKind::OpenUnits(units))
}

fn match_scheme_footer(line: &str) -> Option<LineKind> {
    let mut fields = FooterFields::default();

    if let Some(m) = CLOSE_UNITS_RE.captures(line) {
        fields.close = parse_cas_decimal(m.get(1).unwrap().as_str()).ok();
    }
    if let Some(m) = VALUATION_RE.captures(line) {
        let date = parse_cas_date(m.get(1).unwrap().as_str()).ok();
        let value = parse_cas_decimal(m.get(2).unwrap().as_str()).ok();
        if let (Some(date), Some(value)) = (date, value) {
            fields.valuation = Some((date, value));
        }
    }
    if let Some(m) = NAV_RE.captures(line) {
        let date = parse_cas_date(m.get(1).unwrap().as_str()).ok();
        let nav = parse_cas_decimal(m.get(2).unwrap().as_str()).ok();
        if let (Some(date), Some(nav)) = (date, nav) {
            fields.nav = Some((date, nav));
        }
    }

    if fields == FooterFields::default() {
        None
    } else {
        Some(LineKind::SchemeFooter(fields))
    }
}

/// Split off a wrapped description continuation (a newline within the row
/// followed by text with no tab-separated columns). Returns the row with
/// the continuation removed, plus the continuation text.
fn strip_description_tail(line: &str) -> (String, Option<String>) {
    if let Some(m) = DESCRIPTION_TAIL_RE.captures(line) {
        let tail = m.get(1).unwrap().as_str();
        let cleaned = line.replacen(tail, "", 1);
        return (cleaned, Some(tail.trim().to_string()));
    }
    (line.to_string(), None)
}

fn match_transaction(line: &str) -> Option<LineKind> {
    let (line, tail) = strip_description_tail(line);

    let m = TXN_FULL_RE
        .captures(&line)
        .or_else(|| TXN_UNITS_RE.captures(&line))
        .or_else(|| TXN_TAX_RE.captures(&line))?;

    let date = parse_cas_date(m.get(1).unwrap().as_str()).ok()?;
    let mut description = m.get(2).unwrap().as_str().trim().to_string();
    if let Some(tail) = tail {
        if !tail.is_empty() {
            description = format!("{} {}", description, tail);
        }
    }
    let amount = parse_cas_decimal(m.get(3).unwrap().as_str()).ok()?;

    let dec_group = |i: usize| -> Option<Decimal> {
        m.get(i)
            .and_then(|g| parse_cas_decimal(g.as_str()).ok())
    };

    let (units, nav, balance) = match m.len() {
        7 => (dec_group(4), dec_group(5), dec_group(6)),
        5 => (dec_group(4), None, None),
        _ => (None, None, None),
    };

    Some(LineKind::Transaction(TxnFields {
        date,
        description,
        amount,
        units,
        nav,
        balance,
    }))
}

// MARK: tests
