// ==========================================
// Invoice Ingest - Invoice Parser (facade)
// ==========================================
// Responsibility: the complete batch pipeline, one sequential fold
// over the row stream in file order.
// Flow: tokenize -> classify -> extract -> validate/correct -> assemble
//       -> deduplicate -> normalize
// ==========================================
// Resilience contract: a failure on one row is recorded and never
// aborts the scan of subsequent rows. Only file-scoped failures
// (parse_file) abort the operation.
// ==========================================

use crate::config::ParserConfig;
use crate::domain::invoice::{
    BatchSummary, FormatSummary, FormatValidationReport, LineItemRecord, ParseBatchResult,
};
use crate::domain::types::{LineItemPattern, RowError, RowErrorKind, RowKind, Severity};
use crate::parser::deduplicator;
use crate::parser::error::ParseResult;
use crate::parser::field_extractor::FieldExtractor;
use crate::parser::financial_validator::FinancialValidator;
use crate::parser::invoice_assembler::InvoiceAssembler;
use crate::parser::line_supply::{FileLineSupplier, LineSupplier};
use crate::parser::row_classifier::RowClassifier;
use crate::parser::row_tokenizer::tokenize;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

// ==========================================
// InvoiceParser
// ==========================================
pub struct InvoiceParser {
    config: ParserConfig,
    classifier: RowClassifier,
    extractor: FieldExtractor,
    validator: FinancialValidator,
}

impl InvoiceParser {
    pub fn new() -> Self {
        Self::with_config(ParserConfig::default())
    }

    pub fn with_config(config: ParserConfig) -> Self {
        Self {
            classifier: RowClassifier::new(config.confidence_threshold),
            extractor: FieldExtractor::new(),
            validator: FinancialValidator::new(config.clone()),
            config,
        }
    }

    // ==========================================
    // parse_rows - the complete batch scan
    // ==========================================

    /// Parse an ordered stream of raw text lines into the batch result.
    pub fn parse_rows<I, S>(&self, lines: I) -> ParseBatchResult
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.scan(lines, 0, 0, &mut |_, _| {})
    }

    /// Same scan, reporting `(lines_processed, total_lines)` every
    /// `interval` rows. Progress batching is purely a reporting
    /// concern: the result is invariant to the interval.
    pub fn parse_rows_with_progress<I, S, F>(
        &self,
        lines: I,
        total_lines: usize,
        interval: usize,
        mut progress: F,
    ) -> ParseBatchResult
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        F: FnMut(usize, usize),
    {
        self.scan(lines, total_lines, interval, &mut progress)
    }

    /// Read a whole export file through the file line supplier.
    /// File-scoped errors abort here.
    pub fn parse_file<P: AsRef<Path>>(&self, path: P) -> ParseResult<ParseBatchResult> {
        let supplier =
            FileLineSupplier::new(path.as_ref()).with_max_bytes(self.config.max_file_bytes);
        let lines = supplier.supply_lines()?;
        info!(
            file = %path.as_ref().display(),
            total_lines = lines.len(),
            "export file loaded"
        );
        Ok(self.parse_rows(lines))
    }

    fn scan<I, S>(
        &self,
        lines: I,
        total_lines: usize,
        interval: usize,
        progress: &mut dyn FnMut(usize, usize),
    ) -> ParseBatchResult
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let started = Instant::now();
        let batch_id = Uuid::new_v4().to_string();
        let mut assembler = InvoiceAssembler::new();
        let mut row_errors: Vec<RowError> = Vec::new();
        let mut total_rows = 0usize;
        let mut line_item_count = 0usize;

        debug!(batch_id = %batch_id, "batch scan started");

        for (idx, line) in lines.into_iter().enumerate() {
            let row_number = idx + 1;
            total_rows += 1;
            let raw = line.as_ref();
            let cells = tokenize(raw);
            let classified = self.classifier.classify(&cells);

            match classified.kind {
                RowKind::InvoiceHeader => {
                    match self.extractor.extract_header(&cells, row_number) {
                        Ok(header) => {
                            debug!(
                                row = row_number,
                                invoice = %header.invoice_number,
                                "invoice opened"
                            );
                            assembler.on_header(header, row_number);
                        }
                        Err(err) => {
                            warn!(row = row_number, error = %err.message, "header row rejected");
                            row_errors.push(err);
                        }
                    }
                }
                RowKind::LineItem | RowKind::LineItemEmbedded => {
                    if let Some(pattern) = classified.pattern {
                        if let Some(item) =
                            self.prepare_line_item(&cells, &pattern, row_number, raw, &mut row_errors)
                        {
                            match assembler.on_line_item(item, row_number, raw) {
                                Ok(()) => line_item_count += 1,
                                Err(err) => {
                                    warn!(row = row_number, error = %err.message, "line item dropped");
                                    row_errors.push(err);
                                }
                            }
                        }
                    }
                }
                RowKind::InvoiceEnd => {
                    // Same-row ordering rule: an embedded item on the
                    // terminator row belongs to the invoice being
                    // sealed and goes in first.
                    let embedded = classified.pattern.and_then(|pattern| {
                        self.prepare_line_item(&cells, &pattern, row_number, raw, &mut row_errors)
                    });
                    let had_embedded = embedded.is_some();
                    match assembler.on_invoice_end(embedded, row_number, raw) {
                        Ok(()) => {
                            if had_embedded {
                                line_item_count += 1;
                            }
                        }
                        Err(err) => {
                            warn!(row = row_number, error = %err.message, "embedded item dropped");
                            row_errors.push(err);
                        }
                    }
                }
                // Customer-name rows are informational only; the header
                // carries the authoritative name.
                RowKind::CustomerStart | RowKind::Ignore => {}
            }

            if interval > 0 && row_number % interval == 0 {
                progress(row_number, total_lines);
            }
        }

        // Trailing tick, unless the loop already reported the last row.
        if interval > 0 && total_rows % interval != 0 {
            progress(total_rows, total_lines);
        }

        // final flush, then the post-pass
        let mut invoices = assembler.finish();

        let duplicates = deduplicator::find_duplicates(&invoices);
        for (number, rows) in &duplicates {
            for &row in &rows[1..] {
                row_errors.push(RowError::new(
                    RowErrorKind::Duplicate,
                    Severity::Warning,
                    row,
                    format!("invoice number {} already seen in this batch", number),
                    String::new(),
                ));
            }
        }
        let duplicate_invoice_numbers: Vec<String> =
            duplicates.into_iter().map(|(number, _)| number).collect();

        deduplicator::normalize_invoices(&mut invoices);

        let error_count = row_errors
            .iter()
            .filter(|e| e.severity == Severity::Error)
            .count();
        let warning_count = row_errors.len() - error_count;
        let summary = BatchSummary {
            total_rows,
            invoice_count: invoices.len(),
            line_item_count,
            error_count,
            warning_count,
            elapsed_ms: started.elapsed().as_millis() as u64,
        };

        info!(
            batch_id = %batch_id,
            total_rows = summary.total_rows,
            invoices = summary.invoice_count,
            line_items = summary.line_item_count,
            errors = summary.error_count,
            warnings = summary.warning_count,
            duplicates = duplicate_invoice_numbers.len(),
            elapsed_ms = summary.elapsed_ms,
            "batch scan completed"
        );

        ParseBatchResult {
            batch_id,
            invoices,
            duplicate_invoice_numbers,
            row_errors,
            summary,
        }
    }

    /// Extract and validate one line item; corrections are applied and
    /// surfaced as warnings. Returns None when the row yields nothing
    /// usable (the problem is already recorded).
    fn prepare_line_item(
        &self,
        cells: &[String],
        pattern: &LineItemPattern,
        row_number: usize,
        raw: &str,
        row_errors: &mut Vec<RowError>,
    ) -> Option<LineItemRecord> {
        let item = match self.extractor.extract_line_item(cells, pattern, row_number) {
            Ok(item) => item,
            Err(err) => {
                warn!(row = row_number, error = %err.message, "line item extraction failed");
                row_errors.push(err);
                return None;
            }
        };

        let verdict = self.validator.validate_and_correct(&item);
        for warning in &verdict.warnings {
            row_errors.push(RowError::new(
                RowErrorKind::Validation,
                Severity::Warning,
                row_number,
                warning.clone(),
                raw,
            ));
        }
        if !verdict.is_valid {
            // The item can fail on warnings alone when their combined
            // penalties push confidence under the threshold.
            let message = if verdict.errors.is_empty() {
                format!(
                    "confidence {} below threshold {}",
                    verdict.confidence, self.config.confidence_threshold
                )
            } else {
                verdict.errors.join("; ")
            };
            row_errors.push(RowError::new(
                RowErrorKind::Validation,
                Severity::Error,
                row_number,
                message,
                raw,
            ));
            return None;
        }
        Some(verdict.corrected.unwrap_or(item))
    }

    // ==========================================
    // validate_format - lightweight pre-check
    // ==========================================

    /// Classify a small sample without assembling invoices, to judge
    /// whether a file looks like a known export before committing to a
    /// full parse.
    pub fn validate_format<I, S>(&self, sample_lines: I) -> FormatValidationReport
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut summary = FormatSummary::default();
        let mut errors: Vec<String> = Vec::new();
        let mut warnings: Vec<String> = Vec::new();
        let mut terminator_rows = 0usize;
        let mut item_before_header = false;

        for (idx, line) in sample_lines.into_iter().enumerate() {
            let row_number = idx + 1;
            summary.total_rows += 1;
            let cells = tokenize(line.as_ref());
            let classified = self.classifier.classify(&cells);

            match classified.kind {
                RowKind::InvoiceHeader => {
                    summary.header_rows += 1;
                    if self.extractor.extract_header(&cells, row_number).is_err() {
                        summary.error_rows += 1;
                    }
                }
                RowKind::LineItem | RowKind::LineItemEmbedded => {
                    summary.line_item_rows += 1;
                    if summary.header_rows == 0 {
                        item_before_header = true;
                    }
                    let extractable = classified.pattern.is_some_and(|pattern| {
                        self.extractor
                            .extract_line_item(&cells, &pattern, row_number)
                            .is_ok()
                    });
                    if !extractable {
                        summary.error_rows += 1;
                    }
                }
                RowKind::InvoiceEnd => {
                    terminator_rows += 1;
                    if classified.pattern.is_some() {
                        summary.line_item_rows += 1;
                    }
                }
                RowKind::CustomerStart | RowKind::Ignore => summary.ignored_rows += 1,
            }
        }

        summary.estimated_invoices = summary.header_rows.max(terminator_rows);

        if summary.header_rows == 0 {
            errors.push("no invoice header row found in sample".to_string());
        }
        if item_before_header {
            warnings.push("line items appear before the first invoice header".to_string());
        }
        if summary.header_rows > 0 && terminator_rows == 0 {
            warnings.push(
                "no terminator rows in sample; invoices will close implicitly".to_string(),
            );
        }

        FormatValidationReport {
            is_valid: errors.is_empty(),
            errors,
            warnings,
            summary,
        }
    }
}

impl Default for InvoiceParser {
    fn default() -> Self {
        Self::new()
    }
}
