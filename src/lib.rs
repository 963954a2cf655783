// ==========================================
// Invoice Ingest - Core Library
// ==========================================
// Ingestion core for invoice export reports produced by a third-party
// shop-management point-of-sale system. The exports are fixed-width
// printed reports mechanically converted to comma-separated text, with
// no reliable fixed schema; column offsets are inferred per row.
// ==========================================
// Positioning: pure parsing core. Persistence, HTTP surfaces,
// scheduling and batch lifecycle are external collaborators that call
// in and receive plain data back.
// ==========================================

// ==========================================
// Module declarations
// ==========================================

// Domain layer - typed records and closed enums
pub mod domain;

// Parser layer - the resilient-parsing pipeline
pub mod parser;

// Configuration layer - pipeline thresholds
pub mod config;

// Logging
pub mod logging;

// ==========================================
// Re-export core types
// ==========================================

pub use config::ParserConfig;

pub use domain::{
    BatchSummary, FormatSummary, FormatValidationReport, InvoiceHeaderRecord, LineItemPattern,
    LineItemRecord, ParseBatchResult, ParsedInvoice, ProductCategory, RowError, RowErrorKind,
    RowKind, Severity, ValidationResult,
};

pub use parser::{
    FieldExtractor, FileLineSupplier, FinancialValidator, InvoiceAssembler, InvoiceParser,
    LineSupplier, ParseError, ParseResult, PatternDetector, RowClassifier,
};

// ==========================================
// Constants
// ==========================================

// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// System name
pub const APP_NAME: &str = "invoice-ingest";
