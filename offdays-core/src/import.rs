//! Delimited-text roster import and export.
//!
//! The roster export format is a header line followed by comma-delimited
//! rows of `name, email, team, birthday, hiringDate, totalVacationDays`.
//! Fields may be double-quoted; a quote inside a quoted field is escaped by
//! doubling it, and quoted fields may contain embedded delimiters. Rows that
//! cannot be used are reported as structured per-line errors rather than
//! silently shifting columns.
//!
//! Email format is deliberately not validated here; ledger validation is the
//! only gate.

use chrono::NaiveDate;
use serde::Serialize;

use crate::person::{Person, PersonDraft, DEFAULT_VACATION_DAYS};

const DELIMITER: char = ',';
const HEADER_ROW: &str = "Name,Email,Team,Birthday,HiringDate,TotalVacationDays";

/// A row the parser could not turn into a candidate person.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowError {
    /// 1-based line number in the submitted text.
    pub line: usize,
    pub reason: String,
}

/// An accepted row, keeping its source line for downstream error reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportRow {
    pub line: usize,
    pub draft: PersonDraft,
}

/// Outcome of parsing one roster document.
#[derive(Debug, Default)]
pub struct ImportReport {
    pub accepted: Vec<ImportRow>,
    pub rejected: Vec<RowError>,
}

/// Parse a roster document into candidate person drafts.
///
/// The first line is assumed to be a header and skipped; blank lines are
/// skipped; every other line either yields a draft or a [`RowError`].
pub fn parse_roster(text: &str) -> ImportReport {
    let mut report = ImportReport::default();

    for (index, line) in text.lines().enumerate() {
        if index == 0 || line.trim().is_empty() {
            continue;
        }
        let number = index + 1;

        match split_fields(line).and_then(|fields| row_to_draft(&fields)) {
            Ok(draft) => report.accepted.push(ImportRow { line: number, draft }),
            Err(reason) => report.rejected.push(RowError { line: number, reason }),
        }
    }

    report
}

/// Serialize a roster back into the format [`parse_roster`] accepts: header
/// line first, every field quoted, quotes escaped by doubling, absent dates
/// and teams as empty fields.
pub fn export_roster(persons: &[Person]) -> String {
    let mut out = String::from(HEADER_ROW);
    out.push('\n');

    for person in persons {
        let fields = [
            person.name.as_str().into(),
            person.email.as_str().into(),
            person.team.clone().unwrap_or_default(),
            date_field(person.birthday),
            date_field(person.hiring_date),
            person.total_vacation_days.to_string(),
        ];
        let row: Vec<String> = fields.iter().map(|f| quote_field(f)).collect();
        out.push_str(&row.join(&DELIMITER.to_string()));
        out.push('\n');
    }

    out
}

fn date_field(date: Option<NaiveDate>) -> String {
    date.map(|d| d.to_string()).unwrap_or_default()
}

fn quote_field(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

/// Split one line into fields, honoring quoting and doubled-quote escapes.
/// Each field is trimmed after unquoting.
fn split_fields(line: &str) -> Result<Vec<String>, String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(c);
            }
        } else {
            match c {
                '"' => in_quotes = true,
                DELIMITER => fields.push(std::mem::take(&mut field)),
                _ => field.push(c),
            }
        }
    }

    if in_quotes {
        return Err("unterminated quoted field".to_string());
    }

    fields.push(field);
    Ok(fields.into_iter().map(|f| f.trim().to_string()).collect())
}

/// Positional mapping to person fields. Name and email are the minimum;
/// the allowance falls back to the default when absent or non-numeric.
fn row_to_draft(fields: &[String]) -> Result<PersonDraft, String> {
    let name = fields.first().cloned().unwrap_or_default();
    let email = fields.get(1).cloned().unwrap_or_default();

    if name.is_empty() || email.is_empty() {
        return Err("row needs at least a name and an email".to_string());
    }

    let team = fields.get(2).filter(|f| !f.is_empty()).cloned();
    let birthday = parse_optional_date(fields.get(3), "birthday")?;
    let hiring_date = parse_optional_date(fields.get(4), "hiringDate")?;
    let total_vacation_days = fields
        .get(5)
        .and_then(|f| f.parse::<u32>().ok())
        .unwrap_or(DEFAULT_VACATION_DAYS);

    Ok(PersonDraft {
        name,
        email,
        team,
        birthday,
        hiring_date,
        total_vacation_days: Some(total_vacation_days),
    })
}

fn parse_optional_date(field: Option<&String>, label: &str) -> Result<Option<NaiveDate>, String> {
    match field.map(String::as_str).unwrap_or("") {
        "" => Ok(None),
        raw => raw
            .parse::<NaiveDate>()
            .map(Some)
            .map_err(|_| format!("invalid {label} date '{raw}', expected YYYY-MM-DD")),
    }
}
