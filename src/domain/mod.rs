// ==========================================
// Invoice Ingest - Domain Layer
// ==========================================
// Responsibility: typed records and closed enums. Plain data only;
// no I/O, no persistence.
// ==========================================

pub mod invoice;
pub mod types;

// Re-export core types
pub use invoice::{
    BatchSummary, FormatSummary, FormatValidationReport, InvoiceHeaderRecord, LineItemRecord,
    ParseBatchResult, ParsedInvoice, ValidationResult,
};
pub use types::{LineItemPattern, ProductCategory, RowError, RowErrorKind, RowKind, Severity};
