//! Tab-delimited statement parser.
//!
//! Data rows look like
//! `Date\tBranchCode\tBranchDesc\tOpCode\tReference\tDescription\tAmount\tBalance`
//! with `DD/MM/YYYY` dates and `1.234,56` amounts (leading `-` for debits).

use std::str::FromStr;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use super::types::{Movement, ParsedStatement, SkippedLine};
use crate::text::normalize_text;

const MIN_FIELDS: usize = 7;
const FIELD_DATE: usize = 0;
const FIELD_REFERENCE: usize = 4;
const FIELD_DESCRIPTION: usize = 5;
const FIELD_AMOUNT: usize = 6;

/// Lines starting with these (normalized) phrases are export chrome.
const HEADER_PHRASES: &[&str] = &[
    "FECHA",
    "MOVIMIENTOS",
    "ULTIMOS MOVIMIENTOS",
    "CONSULTA DE MOVIMIENTOS",
    "SALDO",
    "CUENTA",
    "TOTAL",
    "PAGINA",
];

static LEADING_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\d{1,2}[/-]\d{1,2}[/-]\d{2,4}").expect("valid regex"));

static TIMESTAMP_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\d{1,2}[/-]\d{1,2}[/-]\d{2,4}\s+)?\d{1,2}:\d{2}(:\d{2})?\s*(HS|hs)?\s*$")
        .expect("valid regex")
});

static STATEMENT_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,2})([/-])(\d{1,2})([/-])(\d{2}|\d{4})$").expect("valid regex")
});

static DEBIT_KEYWORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(DEBITO|DEB|DB|DEBIN ENVIADO|IMPUESTO|IMP|IIBB|IVA|LEY 25 ?413|COMISION|COMISIONES|PERCEPCION|RETENCION|SELLADO|MANTENIMIENTO|EXTRACCION|ENVIADA|ENVIADO|ENVIO)\b",
    )
    .expect("valid regex")
});

/// Parses a raw statement export into incoming-transfer movements.
///
/// Never fails as a whole: malformed data lines are collected in
/// [`ParsedStatement::malformed`] and logged.
#[must_use]
pub fn parse_statement(raw: &str) -> ParsedStatement {
    let mut parsed = ParsedStatement::default();

    for (index, line) in raw.lines().enumerate() {
        let line_no = index + 1;
        let line = line.trim_end_matches('\r');

        if !is_data_line(line) {
            parsed.ignored += 1;
            continue;
        }

        match parse_data_line(line) {
            Ok(Some(movement)) => parsed.movements.push(movement.at_line(line_no)),
            Ok(None) => {
                debug!(line = line_no, "discarding non-credit statement line");
                parsed.discarded += 1;
            }
            Err(reason) => {
                warn!(line = line_no, %reason, "skipping malformed statement line");
                parsed.malformed.push(SkippedLine {
                    line: line_no,
                    reason,
                    content: line.to_string(),
                });
            }
        }
    }

    debug!(
        movements = parsed.movements.len(),
        discarded = parsed.discarded,
        malformed = parsed.malformed.len(),
        ignored = parsed.ignored,
        "statement parsed"
    );
    parsed
}

/// True for lines that look like a movement row.
fn is_data_line(line: &str) -> bool {
    if line.trim().is_empty() {
        return false;
    }
    if TIMESTAMP_LINE.is_match(line) {
        return false;
    }
    if !LEADING_DATE.is_match(line) {
        let normalized = normalize_text(line);
        if HEADER_PHRASES.iter().any(|p| normalized.starts_with(p)) {
            return false;
        }
    }
    LEADING_DATE.is_match(line) && line.contains('\t')
}

/// `Ok(None)` means the line is valid but not an incoming credit.
fn parse_data_line(line: &str) -> Result<Option<Movement>, String> {
    let fields: Vec<&str> = line.split('\t').map(str::trim).collect();
    if fields.len() < MIN_FIELDS {
        return Err(format!(
            "expected at least {MIN_FIELDS} tab-separated fields, found {}",
            fields.len()
        ));
    }

    let date = parse_statement_date(fields[FIELD_DATE])
        .ok_or_else(|| format!("invalid date '{}'", fields[FIELD_DATE]))?;

    let raw_amount = fields[FIELD_AMOUNT];
    if raw_amount.starts_with('-') {
        return Ok(None);
    }
    let amount =
        parse_amount(raw_amount).ok_or_else(|| format!("invalid amount '{raw_amount}'"))?;
    if amount <= Decimal::ZERO {
        return Ok(None);
    }

    let description = fields[FIELD_DESCRIPTION];
    if is_debit_description(description) {
        return Ok(None);
    }

    let reference = Some(fields[FIELD_REFERENCE])
        .filter(|r| !r.is_empty())
        .map(ToString::to_string);

    Ok(Some(Movement::new(date, description, amount, reference)))
}

/// Parses `DD/MM/YYYY` or `DD-MM-YYYY`; 2-digit years map to 2000-2099.
///
/// ```
/// use amarra_core::statement::parse_statement_date;
/// use chrono::NaiveDate;
///
/// assert_eq!(
///     parse_statement_date("05-11-25"),
///     NaiveDate::from_ymd_opt(2025, 11, 5)
/// );
/// assert_eq!(parse_statement_date("31/02/2025"), None);
/// ```
#[must_use]
pub fn parse_statement_date(input: &str) -> Option<NaiveDate> {
    let caps = STATEMENT_DATE.captures(input.trim())?;
    if caps[2] != caps[4] {
        return None;
    }
    let day: u32 = caps[1].parse().ok()?;
    let month: u32 = caps[3].parse().ok()?;
    let year_text = &caps[5];
    let mut year: i32 = year_text.parse().ok()?;
    if year_text.len() == 2 {
        year += 2000;
    }
    if !(1900..=2099).contains(&year) {
        return None;
    }
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Parses `1.234,56` style amounts (`.` thousands, `,` decimals).
#[must_use]
pub fn parse_amount(input: &str) -> Option<Decimal> {
    let cleaned: String = input
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '$' && *c != '.')
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    Decimal::from_str(&cleaned).ok()
}

/// True if the description names a debit, fee, tax or outbound transfer.
#[must_use]
pub fn is_debit_description(description: &str) -> bool {
    DEBIT_KEYWORDS.is_match(&normalize_text(description))
}
