//! Rendering of the certificate inventory.
//!
//! Rows are sorted with a stable sort and written either as an aligned text table
//! or as a JSON array.

use std::cmp::Ordering;
use std::io::Write;
use std::str::FromStr;

use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

use crate::cert::Certificate;
use crate::error::{Result, VaultOpenVpnError};

/// Date format of the table columns.
const DATE_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

const TABLE_HEADER: [&str; 4] = ["FQDN", "NOT BEFORE", "NOT AFTER", "SERIAL"];

/// Ordering of the listed certificates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    /// By common name, older certificates first within one name.
    #[default]
    Fqdn,
    /// By start of validity.
    IssueDate,
    /// By end of validity.
    ExpireDate,
}

impl FromStr for SortKey {
    type Err = VaultOpenVpnError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fqdn" => Ok(SortKey::Fqdn),
            "issuedate" => Ok(SortKey::IssueDate),
            "expiredate" => Ok(SortKey::ExpireDate),
            other => Err(VaultOpenVpnError::ConfigurationError(format!(
                "Unknown sort key {other:?} (expected fqdn, issuedate or expiredate)"
            ))),
        }
    }
}

/// Rendering of the listed certificates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl FromStr for OutputFormat {
    type Err = VaultOpenVpnError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            other => Err(VaultOpenVpnError::ConfigurationError(format!(
                "Unknown output format {other:?} (expected table or json)"
            ))),
        }
    }
}

/// One listed certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListRow {
    #[serde(rename = "FQDN")]
    pub fqdn: String,
    #[serde(rename = "NotBefore", with = "time::serde::rfc3339")]
    pub not_before: OffsetDateTime,
    #[serde(rename = "NotAfter", with = "time::serde::rfc3339")]
    pub not_after: OffsetDateTime,
    #[serde(rename = "Serial")]
    pub serial: String,
}

impl From<&Certificate> for ListRow {
    fn from(cert: &Certificate) -> Self {
        ListRow {
            fqdn: cert.common_name.clone(),
            not_before: cert.not_before,
            not_after: cert.not_after,
            serial: cert.serial.clone(),
        }
    }
}

impl ListRow {
    fn compare(&self, other: &ListRow, key: SortKey) -> Ordering {
        match key {
            SortKey::Fqdn => self
                .fqdn
                .cmp(&other.fqdn)
                .then_with(|| self.not_before.cmp(&other.not_before)),
            SortKey::IssueDate => self.not_before.cmp(&other.not_before),
            SortKey::ExpireDate => self.not_after.cmp(&other.not_after),
        }
    }

    fn cells(&self) -> Result<[String; 4]> {
        Ok([
            self.fqdn.clone(),
            format_date(self.not_before)?,
            format_date(self.not_after)?,
            self.serial.clone(),
        ])
    }
}

/// Sorts rows in place. Rows comparing equal keep their relative order.
pub fn sort_rows(rows: &mut [ListRow], key: SortKey) {
    rows.sort_by(|a, b| a.compare(b, key));
}

/// Writes rows in the requested format.
pub fn write_rows<W: Write>(out: &mut W, rows: &[ListRow], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => write_table(out, rows),
        OutputFormat::Json => write_json(out, rows),
    }
}

/// Writes rows as a JSON array followed by a newline.
pub fn write_json<W: Write>(out: &mut W, rows: &[ListRow]) -> Result<()> {
    serde_json::to_writer(&mut *out, rows)
        .map_err(|e| VaultOpenVpnError::EncodingError(e.to_string()))?;
    writeln!(out)?;
    Ok(())
}

/// Writes rows as a left-aligned table with an underlined header.
pub fn write_table<W: Write>(out: &mut W, rows: &[ListRow]) -> Result<()> {
    let body = rows
        .iter()
        .map(ListRow::cells)
        .collect::<Result<Vec<_>>>()?;

    let mut widths = TABLE_HEADER.map(str::len);
    for cells in &body {
        for (width, cell) in widths.iter_mut().zip(cells) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let header = TABLE_HEADER.map(str::to_string);
    let rule = widths.map(|w| "-".repeat(w));

    for line in std::iter::once(&header).chain(std::iter::once(&rule)).chain(&body) {
        let padded = line
            .iter()
            .zip(widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join("   ");
        writeln!(out, "{}", padded.trim_end())?;
    }

    Ok(())
}

fn format_date(value: OffsetDateTime) -> Result<String> {
    value
        .to_offset(time::UtcOffset::UTC)
        .format(DATE_FORMAT)
        .map_err(|e| VaultOpenVpnError::EncodingError(e.to_string()))
}
