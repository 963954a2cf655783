// ==========================================
// Invoice Ingest - Invoice Domain Model
// ==========================================
// Responsibility: typed records produced by the parsing pipeline.
// These are plain data: persistence, IDs and transactions belong to
// external collaborators.
// ==========================================

use crate::domain::types::{ProductCategory, RowError, Severity};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// InvoiceHeaderRecord - extracted header fields
// ==========================================
// Invariants: invoice_number is non-empty; invoice_date is a valid
// calendar date not in the future. Both are enforced at extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceHeaderRecord {
    pub invoice_number: String,
    /// Authoritative customer name; the preceding customer-name row is
    /// informational only. May be empty on layouts that omit it.
    pub customer_name: String,
    pub vehicle_info: Option<String>,
    pub mileage: Option<u32>,
    pub invoice_date: NaiveDate,
    pub salesperson: String,
    pub tax_amount: f64,
    pub total_amount: f64,
}

// ==========================================
// LineItemRecord - one extracted line item
// ==========================================
// The 11 slot fields in layout order plus the derived category.
// Invariant: quantity > 0 for an item to be considered valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItemRecord {
    pub product_code: String,
    pub description: String,
    /// Free-text adjustment flag column; usually blank.
    pub adjustment: String,
    pub quantity: f64,
    pub parts_cost: f64,
    pub labor_cost: f64,
    /// Federal excise tax, a fixed per-unit charge included in the total.
    pub fet: f64,
    pub line_total: f64,
    pub cost: f64,
    /// Gross-profit margin as a percentage of the line total.
    pub gross_profit_margin: f64,
    pub gross_profit: f64,
    /// Derived from the product code, never read from the row.
    pub category: ProductCategory,
}

// ==========================================
// Product categorization - deterministic prefix rules
// ==========================================

/// Code prefixes sold as tires by the shop-management system.
const TIRE_PREFIXES: &[&str] = &["OP", "GY", "MIC", "BFG", "HAN", "TOY", "COO", "GT"];

/// Code prefixes for labor/service operations.
const SERVICE_PREFIXES: &[&str] = &["SVC", "LAB", "ALIGN", "BAL", "ROT", "MNT", "FLUSH", "INSP"];

/// Code prefixes for pass-through fees and surcharges.
const FEE_PREFIXES: &[&str] = &["FEE", "ENV", "DISP", "HAZ", "SHOP", "STATE"];

impl ProductCategory {
    /// Categorize a product code. Pure: the same code always yields the
    /// same category.
    pub fn from_code(code: &str) -> Self {
        let code = code.trim().to_uppercase();
        if code.is_empty() {
            return ProductCategory::Other;
        }
        if FEE_PREFIXES.iter().any(|p| code.starts_with(p)) {
            return ProductCategory::Fee;
        }
        if SERVICE_PREFIXES.iter().any(|p| code.starts_with(p)) {
            return ProductCategory::Service;
        }
        if TIRE_PREFIXES.iter().any(|p| code.starts_with(p)) {
            return ProductCategory::Tire;
        }
        // Dashed or purely numeric codes are part numbers in this
        // system's catalog.
        if code.contains('-') || code.chars().all(|c| c.is_ascii_digit()) {
            return ProductCategory::Part;
        }
        ProductCategory::Other
    }
}

// ==========================================
// ParsedInvoice - one assembled invoice record
// ==========================================
// Lifecycle: opened at an InvoiceHeader row, accumulates line items in
// row order, sealed at a terminator / next header / end of stream.
// Sealed instances are never mutated again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedInvoice {
    pub header: InvoiceHeaderRecord,
    /// Line items in source row order.
    pub line_items: Vec<LineItemRecord>,
    /// Source row number of the header row, for traceability.
    pub header_row_number: usize,
    /// Source row numbers of the line items, index-aligned with
    /// `line_items`.
    pub line_item_row_numbers: Vec<usize>,
}

impl ParsedInvoice {
    pub fn open(header: InvoiceHeaderRecord, header_row_number: usize) -> Self {
        Self {
            header,
            line_items: Vec::new(),
            header_row_number,
            line_item_row_numbers: Vec::new(),
        }
    }

    pub fn push_line_item(&mut self, item: LineItemRecord, row_number: usize) {
        self.line_items.push(item);
        self.line_item_row_numbers.push(row_number);
    }
}

// ==========================================
// ValidationResult - financial-consistency verdict
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    /// 100 minus fixed per-check penalties; a row is accepted only with
    /// zero hard errors and confidence >= the configured threshold.
    pub confidence: u8,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    /// Auto-corrected record, present only when the original failed and
    /// the correction pass produced a valid replacement. The original
    /// record is never mutated.
    pub corrected: Option<LineItemRecord>,
}

// ==========================================
// BatchSummary - per-scan bookkeeping
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total_rows: usize,
    pub invoice_count: usize,
    pub line_item_count: usize,
    pub error_count: usize,
    pub warning_count: usize,
    pub elapsed_ms: u64,
}

// ==========================================
// ParseBatchResult - complete batch output
// ==========================================
// Everything the persistence collaborator needs; duplicates are
// advisory, the invoices themselves are retained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseBatchResult {
    pub batch_id: String,
    pub invoices: Vec<ParsedInvoice>,
    /// Each repeated invoice number exactly once, in first-occurrence
    /// order.
    pub duplicate_invoice_numbers: Vec<String>,
    pub row_errors: Vec<RowError>,
    pub summary: BatchSummary,
}

impl ParseBatchResult {
    pub fn error_count(&self) -> usize {
        self.row_errors
            .iter()
            .filter(|e| e.severity == Severity::Error)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.row_errors
            .iter()
            .filter(|e| e.severity == Severity::Warning)
            .count()
    }

    /// Batch report as JSON, for logging and external auditing.
    pub fn report_json(&self) -> serde_json::Value {
        serde_json::json!({
            "batch_id": self.batch_id,
            "summary": self.summary,
            "duplicate_invoice_numbers": self.duplicate_invoice_numbers,
            "row_errors": self.row_errors,
        })
    }
}

// ==========================================
// Format pre-check report
// ==========================================

/// Row-count breakdown of a sampled format check.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormatSummary {
    pub total_rows: usize,
    pub header_rows: usize,
    pub line_item_rows: usize,
    pub ignored_rows: usize,
    pub error_rows: usize,
    pub estimated_invoices: usize,
}

/// Lightweight pre-check result, usable on a small sample before
/// committing to a full parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormatValidationReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub summary: FormatSummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_tire_prefix() {
        assert_eq!(ProductCategory::from_code("OP19"), ProductCategory::Tire);
        assert_eq!(ProductCategory::from_code("mic2055"), ProductCategory::Tire);
    }

    #[test]
    fn test_category_service_and_fee() {
        assert_eq!(
            ProductCategory::from_code("BAL4"),
            ProductCategory::Service
        );
        assert_eq!(ProductCategory::from_code("ENV01"), ProductCategory::Fee);
    }

    #[test]
    fn test_category_part_shapes() {
        assert_eq!(
            ProductCategory::from_code("WB-1042-X"),
            ProductCategory::Part
        );
        assert_eq!(ProductCategory::from_code("88123"), ProductCategory::Part);
    }

    #[test]
    fn test_category_fallback() {
        assert_eq!(ProductCategory::from_code("ZZTOP1"), ProductCategory::Other);
        assert_eq!(ProductCategory::from_code(""), ProductCategory::Other);
    }

    #[test]
    fn test_category_is_pure() {
        // Same code, same category, every time.
        for _ in 0..3 {
            assert_eq!(ProductCategory::from_code("OP19"), ProductCategory::Tire);
        }
    }

    #[test]
    fn test_parsed_invoice_row_order() {
        let header = InvoiceHeaderRecord {
            invoice_number: "3-100001".to_string(),
            customer_name: "DOE, JANE".to_string(),
            vehicle_info: None,
            mileage: None,
            invoice_date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            salesperson: "J DOE".to_string(),
            tax_amount: 1.0,
            total_amount: 11.0,
        };
        let mut invoice = ParsedInvoice::open(header, 10);
        let item = LineItemRecord {
            product_code: "OP19".to_string(),
            description: "Tire 205/55".to_string(),
            adjustment: String::new(),
            quantity: 1.0,
            parts_cost: 10.0,
            labor_cost: 0.0,
            fet: 0.0,
            line_total: 10.0,
            cost: 5.0,
            gross_profit_margin: 50.0,
            gross_profit: 5.0,
            category: ProductCategory::Tire,
        };
        invoice.push_line_item(item.clone(), 11);
        invoice.push_line_item(item, 12);

        assert_eq!(invoice.header_row_number, 10);
        assert_eq!(invoice.line_item_row_numbers, vec![11, 12]);
    }
}
