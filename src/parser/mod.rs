// ==========================================
// Invoice Ingest - Parser Layer
// ==========================================
// Responsibility: the resilient-parsing engine. Raw line -> tokens ->
// classification (+ pattern for line items) -> typed fields ->
// validated/corrected -> assembled invoice -> deduplicated batch.
// ==========================================

// Module declarations
pub mod deduplicator;
pub mod error;
pub mod field_extractor;
pub mod financial_validator;
pub mod invoice_assembler;
pub mod invoice_parser;
pub mod line_supply;
pub mod numeric;
pub mod pattern_detector;
pub mod row_classifier;
pub mod row_tokenizer;

// Re-export core types
pub use error::{ParseError, ParseResult};
pub use field_extractor::FieldExtractor;
pub use financial_validator::FinancialValidator;
pub use invoice_assembler::InvoiceAssembler;
pub use invoice_parser::InvoiceParser;
pub use line_supply::{FileLineSupplier, LineSupplier};
pub use pattern_detector::{PatternDetector, CANDIDATE_OFFSETS, SLOT_COUNT};
pub use row_classifier::{ClassifiedRow, RowClassifier};
pub use row_tokenizer::tokenize;
