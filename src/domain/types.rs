// ==========================================
// Invoice Ingest - Core Types
// ==========================================
// Responsibility: closed enums and small value types shared by the
// whole parsing pipeline. Every downstream consumer matches
// exhaustively on these instead of probing loose string arrays.
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// RowKind - classification of one tokenized row
// ==========================================
// Produced by the RowClassifier cascade; consumed by the assembler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RowKind {
    /// Informational customer-name row preceding an invoice header.
    CustomerStart,
    /// Row carrying the invoice-number marker and packed header fields.
    InvoiceHeader,
    /// Terminator row ("Totals for Invoice ...").
    InvoiceEnd,
    /// Line item starting at cell offset 0 (standard layout).
    LineItem,
    /// Line item found at a non-zero offset inside an otherwise
    /// ignorable report-banner row.
    LineItemEmbedded,
    /// Boilerplate, blank, or unrecognizable row.
    Ignore,
}

// ==========================================
// LineItemPattern - detected 11-field column layout
// ==========================================
// The export format does not preserve a stable column count, so the
// layout has to be located per row at one of the known offsets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineItemPattern {
    /// Index of the first cell of the 11-field layout within the row.
    pub offset: usize,
    /// Cell indices of the 11 field slots, in order:
    /// product code, description, adjustment, quantity, parts cost,
    /// labor cost, FET, line total, cost, GPM %, gross profit $.
    pub slots: [usize; 11],
    /// Heuristic match strength, 0-100.
    pub confidence: u8,
}

impl LineItemPattern {
    pub fn at_offset(offset: usize, confidence: u8) -> Self {
        let mut slots = [0usize; 11];
        for (i, slot) in slots.iter_mut().enumerate() {
            *slot = offset + i;
        }
        Self {
            offset,
            slots,
            confidence,
        }
    }
}

// ==========================================
// Severity - weight of a recorded row problem
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    /// The row (or a derived value) could not be used as-is.
    Error,
    /// The row was usable but something was inferred or suspicious.
    Warning,
}

// ==========================================
// RowErrorKind - row-scoped error taxonomy
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RowErrorKind {
    /// Row fails tokenization or a required marker/shape is absent.
    Format,
    /// A required field is blank.
    MissingData,
    /// A value is outside its allowed domain (negative amount, future
    /// date, impossible margin).
    Validation,
    /// Line item encountered with no open invoice.
    BusinessRule,
    /// Invoice number seen more than once in one batch (advisory).
    Duplicate,
}

// ==========================================
// RowError - one recorded row-scoped problem
// ==========================================
// Row-scoped problems are data, not control flow: they are appended to
// the batch-level list and never interrupt the scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowError {
    pub row_number: usize,
    pub kind: RowErrorKind,
    pub severity: Severity,
    pub message: String,
    /// Raw row content, kept for auditing.
    pub raw_content: String,
}

impl RowError {
    pub fn new(
        kind: RowErrorKind,
        severity: Severity,
        row_number: usize,
        message: impl Into<String>,
        raw_content: impl Into<String>,
    ) -> Self {
        Self {
            row_number,
            kind,
            severity,
            message: message.into(),
            raw_content: raw_content.into(),
        }
    }
}

// ==========================================
// ProductCategory - derived line-item category
// ==========================================
// A pure function of the product code; prefix rules live in
// domain::invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductCategory {
    Tire,
    Service,
    Part,
    Fee,
    Other,
}
