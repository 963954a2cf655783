// ==========================================
// Invoice Ingest - Field Extractor
// ==========================================
// Responsibility: classified row -> typed record. Header fields may be
// packed comma-joined into a single cell, so markers are searched per
// cell and a value runs to the next marker or the cell boundary. Line
// items are read through the detected pattern's slots.
// ==========================================
// A failed required field produces a row-scoped error for that row
// only; the scan continues.
// ==========================================

use crate::domain::invoice::{InvoiceHeaderRecord, LineItemRecord};
use crate::domain::types::{LineItemPattern, ProductCategory, RowError, RowErrorKind, Severity};
use chrono::{Local, NaiveDate};
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

// Header markers. "Invoice #" is also the header-row anchor used by
// the classifier; the rest label the packed sub-fields.
static HEADER_MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(invoice\s*#|invoice\s+date\s*:|customer\s*:|vehicle\s*:|mileage\s*:|salesperson\s*:|tax\s*:|total\s*:)",
    )
    .unwrap()
});

/// Canonical marker keys for the extraction map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Marker {
    InvoiceNumber,
    InvoiceDate,
    Customer,
    Vehicle,
    Mileage,
    Salesperson,
    Tax,
    Total,
}

fn marker_key(matched: &str) -> Marker {
    let lower = matched.to_lowercase();
    if lower.starts_with("invoice") {
        if lower.contains('#') {
            Marker::InvoiceNumber
        } else {
            Marker::InvoiceDate
        }
    } else if lower.starts_with("customer") {
        Marker::Customer
    } else if lower.starts_with("vehicle") {
        Marker::Vehicle
    } else if lower.starts_with("mileage") {
        Marker::Mileage
    } else if lower.starts_with("salesperson") {
        Marker::Salesperson
    } else if lower.starts_with("tax") {
        Marker::Tax
    } else {
        Marker::Total
    }
}

// ==========================================
// FieldExtractor
// ==========================================
pub struct FieldExtractor;

impl FieldExtractor {
    pub fn new() -> Self {
        Self
    }

    // ==========================================
    // header extraction
    // ==========================================

    /// Extract a header record from a row classified as InvoiceHeader.
    pub fn extract_header(
        &self,
        cells: &[String],
        row_number: usize,
    ) -> Result<InvoiceHeaderRecord, RowError> {
        let raw = cells.join(",");
        let values = scan_marker_values(cells);

        let invoice_number = values
            .get(&Marker::InvoiceNumber)
            .map(|v| v.to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                RowError::new(
                    RowErrorKind::MissingData,
                    Severity::Error,
                    row_number,
                    "header row has no invoice number",
                    raw.clone(),
                )
            })?;

        let date_text = values
            .get(&Marker::InvoiceDate)
            .map(|v| v.to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                RowError::new(
                    RowErrorKind::MissingData,
                    Severity::Error,
                    row_number,
                    format!("invoice {}: header row has no invoice date", invoice_number),
                    raw.clone(),
                )
            })?;

        let invoice_date = parse_us_date(&date_text).ok_or_else(|| {
            RowError::new(
                RowErrorKind::Format,
                Severity::Error,
                row_number,
                format!(
                    "invoice {}: unparseable invoice date '{}'",
                    invoice_number, date_text
                ),
                raw.clone(),
            )
        })?;

        if invoice_date > Local::now().date_naive() {
            return Err(RowError::new(
                RowErrorKind::Validation,
                Severity::Error,
                row_number,
                format!(
                    "invoice {}: invoice date {} is in the future",
                    invoice_number, invoice_date
                ),
                raw,
            ));
        }

        // The remaining fields are genuinely absent on some layouts;
        // failing the whole header for them would sacrifice the row.
        let customer_name = values
            .get(&Marker::Customer)
            .map(|v| v.to_string())
            .unwrap_or_default();
        let salesperson = values
            .get(&Marker::Salesperson)
            .map(|v| v.to_string())
            .unwrap_or_default();
        let vehicle_info = values
            .get(&Marker::Vehicle)
            .map(|v| v.to_string())
            .filter(|v| !v.is_empty());
        let mileage = values
            .get(&Marker::Mileage)
            .and_then(|v| v.replace(',', "").parse::<u32>().ok());
        let tax_amount = values
            .get(&Marker::Tax)
            .and_then(|v| crate::parser::numeric::parse_currency(v))
            .unwrap_or(0.0);
        let total_amount = values
            .get(&Marker::Total)
            .and_then(|v| crate::parser::numeric::parse_currency(v))
            .unwrap_or(0.0);

        Ok(InvoiceHeaderRecord {
            invoice_number,
            customer_name,
            vehicle_info,
            mileage,
            invoice_date,
            salesperson,
            tax_amount,
            total_amount,
        })
    }

    // ==========================================
    // line-item extraction
    // ==========================================

    /// Extract a line item through a resolved pattern.
    pub fn extract_line_item(
        &self,
        cells: &[String],
        pattern: &LineItemPattern,
        row_number: usize,
    ) -> Result<LineItemRecord, RowError> {
        let raw = cells.join(",");
        let slot = |i: usize| -> &str { cells.get(pattern.slots[i]).map(String::as_str).unwrap_or("") };

        let product_code = slot(0).trim().to_string();
        if product_code.is_empty() {
            return Err(RowError::new(
                RowErrorKind::MissingData,
                Severity::Error,
                row_number,
                "line item has no product code",
                raw,
            ));
        }

        let quantity = crate::parser::numeric::parse_quantity(slot(3)).ok_or_else(|| {
            RowError::new(
                RowErrorKind::Format,
                Severity::Error,
                row_number,
                format!("line item {}: unparseable quantity '{}'", product_code, slot(3)),
                raw.clone(),
            )
        })?;

        // Money slots: blank is zero, anything else must parse.
        let mut money = [0.0f64; 4];
        for (i, field) in ["parts cost", "labor cost", "FET", "line total"]
            .iter()
            .enumerate()
        {
            let cell = slot(4 + i);
            if cell.trim().is_empty() {
                continue;
            }
            money[i] = crate::parser::numeric::parse_currency(cell).ok_or_else(|| {
                RowError::new(
                    RowErrorKind::Format,
                    Severity::Error,
                    row_number,
                    format!(
                        "line item {}: unparseable {} '{}'",
                        product_code, field, cell
                    ),
                    raw.clone(),
                )
            })?;
        }

        let cost = crate::parser::numeric::parse_currency(slot(8)).unwrap_or(0.0);
        let gross_profit_margin = crate::parser::numeric::parse_percent(slot(9)).unwrap_or(0.0);
        let gross_profit = crate::parser::numeric::parse_currency(slot(10)).unwrap_or(0.0);

        let category = ProductCategory::from_code(&product_code);

        Ok(LineItemRecord {
            description: slot(1).trim().to_string(),
            adjustment: slot(2).trim().to_string(),
            quantity,
            parts_cost: money[0],
            labor_cost: money[1],
            fet: money[2],
            line_total: money[3],
            cost,
            gross_profit_margin,
            gross_profit,
            category,
            product_code,
        })
    }
}

impl Default for FieldExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Scan every cell for marker/value pairs. A value runs from the end
/// of its marker to the start of the next marker in the same cell, or
/// to the cell boundary.
fn scan_marker_values(cells: &[String]) -> HashMap<Marker, String> {
    let mut values = HashMap::new();
    for cell in cells {
        let matches: Vec<_> = HEADER_MARKER_RE.find_iter(cell).collect();
        for (i, m) in matches.iter().enumerate() {
            let end = matches.get(i + 1).map(|n| n.start()).unwrap_or(cell.len());
            let value = cell[m.end()..end]
                .trim_matches(|c: char| c.is_whitespace() || c == ',' || c == ':')
                .to_string();
            let value = crate::parser::numeric::clean_text(&value);
            // First occurrence wins; later report copies repeat markers.
            values.entry(marker_key(m.as_str())).or_insert(value);
        }
    }
    values
}

/// US-style report date: m/d/Y with a 2-digit-year fallback. The
/// format is picked by the width of the year segment: chrono's `%Y`
/// accepts 2-digit input as a literal ancient year ("1/2/24" would
/// read as 0024), so falling back on parse failure never triggers.
fn parse_us_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    let year_digits = value.rsplit('/').next()?.trim().len();
    let format = if year_digits <= 2 { "%m/%d/%y" } else { "%m/%d/%Y" };
    NaiveDate::parse_from_str(value, format).ok()
}
