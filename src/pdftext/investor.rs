use lazy_static::lazy_static;
use regex::Regex;

use crate::errors::CasError;
use crate::statement::model::InvestorInfo;

use super::extract::PageText;

lazy_static! {
    static ref EMAIL_ANCHOR_RE: Regex =
        Regex::new(r"(?i)^\s*email\s+id\s*:\s*(\S+)").unwrap();
    static ref MOBILE_RE: Regex =
        Regex::new(r"(?i)mobile\s*:\s*([+\d]+)").unwrap();
    // Headings that mark the end of the address block when no mobile
    // number is printed.
    static ref TERMINATOR_RE: Regex =
        Regex::new(r"(?i)^\s*(Folio\s+No|Date\s+Transaction)").unwrap();
}

/// Extract the investor name/email/address/mobile block from the first
/// page. The block sits in the left half of the upper page area, starting
/// right below an "Email Id:" anchor line.
pub fn parse_investor_info(page: &PageText) -> Result<InvestorInfo, CasError> {
    let mut elements: Vec<&super::extract::TextFragment> = page
        .fragments
        .iter()
        .filter(|f| f.x1 < page.width / 1.5 && f.y1 > page.height / 2.0)
        .collect();
    elements.sort_by(|a, b| b.y1.partial_cmp(&a.y1).unwrap());

    let mut email: Option<String> = None;
    let mut name: Option<String> = None;
    let mut mobile: Option<String> = None;
    let mut address_lines: Vec<String> = Vec::new();

    'scan: for el in elements {
        for txt in el.text.lines().map(str::trim) {
            if txt.is_empty() {
                continue;
            }
            if email.is_none() {
                if let Some(m) = EMAIL_ANCHOR_RE.captures(txt) {
                    email = Some(m.get(1).unwrap().as_str().to_string());
                }
                continue;
            }
            if name.is_none() {
                name = Some(txt.to_string());
                continue;
            }
            if TERMINATOR_RE.is_match(txt) {
                break 'scan;
            }
            if let Some(m) = MOBILE_RE.captures(txt) {
                mobile = Some(m.get(1).unwrap().as_str().to_string());
            }
            address_lines.push(txt.to_string());
            if mobile.is_some() {
                break 'scan;
            }
        }
    }

    match email {
        Some(email) => Ok(InvestorInfo {
            name: name.unwrap_or_default(),
            email,
            address: address_lines.join("\n"),
            mobile: mobile.unwrap_or_default(),
        }),
        None => Err(CasError::InvestorInfo),
    }
}

// MARK: tests
