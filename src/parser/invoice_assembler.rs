// ==========================================
// Invoice Ingest - Invoice Assembler
// ==========================================
// Responsibility: the state machine that folds classified rows, in
// file order, into sealed invoice records. The parsing state is a
// single owned value, mutated only here, and drained into the result
// at end of scan.
// ==========================================
// States: no active invoice / in invoice. An invoice is sealed at a
// terminator row, at the next header row (implicit close, guarding
// against a missing terminator), or at end of stream.
// ==========================================

use crate::domain::invoice::{InvoiceHeaderRecord, LineItemRecord, ParsedInvoice};
use crate::domain::types::{RowError, RowErrorKind, Severity};
use tracing::debug;

// ==========================================
// ParsingState - owned accumulator for one file scan
// ==========================================
#[derive(Debug, Default)]
struct ParsingState {
    current: Option<ParsedInvoice>,
    completed: Vec<ParsedInvoice>,
}

// ==========================================
// InvoiceAssembler
// ==========================================
pub struct InvoiceAssembler {
    state: ParsingState,
}

impl InvoiceAssembler {
    pub fn new() -> Self {
        Self {
            state: ParsingState::default(),
        }
    }

    pub fn has_open_invoice(&self) -> bool {
        self.state.current.is_some()
    }

    /// Header row: seal any open invoice first (implicit close), then
    /// open a new one.
    pub fn on_header(&mut self, header: InvoiceHeaderRecord, row_number: usize) {
        if let Some(open) = self.state.current.take() {
            debug!(
                invoice = %open.header.invoice_number,
                "implicit close: next header before terminator"
            );
            self.state.completed.push(open);
        }
        self.state.current = Some(ParsedInvoice::open(header, row_number));
    }

    /// Line item row: append to the open invoice in row order. With no
    /// open invoice the row is discarded and reported; the scan
    /// continues.
    pub fn on_line_item(
        &mut self,
        item: LineItemRecord,
        row_number: usize,
        raw: &str,
    ) -> Result<(), RowError> {
        match self.state.current.as_mut() {
            Some(invoice) => {
                invoice.push_line_item(item, row_number);
                Ok(())
            }
            None => Err(RowError::new(
                RowErrorKind::BusinessRule,
                Severity::Error,
                row_number,
                "line item with no open invoice",
                raw,
            )),
        }
    }

    /// Terminator row. The report layout can place an invoice's final
    /// line item and its totals caption on one physical line, so any
    /// embedded item found on the row MUST be appended before the
    /// invoice is sealed, or the last item is silently lost. Taking the
    /// item here makes that ordering impossible to skip.
    pub fn on_invoice_end(
        &mut self,
        embedded_item: Option<LineItemRecord>,
        row_number: usize,
        raw: &str,
    ) -> Result<(), RowError> {
        let pending = match embedded_item {
            Some(item) => {
                self.on_line_item(item, row_number, raw).err()
            }
            None => None,
        };
        if let Some(open) = self.state.current.take() {
            self.state.completed.push(open);
        }
        // A terminator with no open invoice is a no-op; an orphan
        // embedded item on it is still reported.
        match pending {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// End of stream: final flush. A file need not end with an explicit
    /// terminator.
    pub fn finish(mut self) -> Vec<ParsedInvoice> {
        if let Some(open) = self.state.current.take() {
            debug!(
                invoice = %open.header.invoice_number,
                "final flush: invoice open at end of stream"
            );
            self.state.completed.push(open);
        }
        self.state.completed
    }
}

impl Default for InvoiceAssembler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::ProductCategory;
    use chrono::NaiveDate;

    fn header(number: &str) -> InvoiceHeaderRecord {
        InvoiceHeaderRecord {
            invoice_number: number.to_string(),
            customer_name: String::new(),
            vehicle_info: None,
            mileage: None,
            invoice_date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            salesperson: String::new(),
            tax_amount: 0.0,
            total_amount: 0.0,
        }
    }

    fn item(code: &str) -> LineItemRecord {
        LineItemRecord {
            product_code: code.to_string(),
            description: String::new(),
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
        }
    }

    #[test]
    fn test_explicit_close() {
        let mut assembler = InvoiceAssembler::new();
        assembler.on_header(header("A-1"), 1);
        assembler.on_line_item(item("OP19"), 2, "raw").unwrap();
        assembler.on_invoice_end(None, 3, "raw").unwrap();

        let invoices = assembler.finish();
        assert_eq!(invoices.len(), 1);
        assert_eq!(invoices[0].line_items.len(), 1);
    }

    #[test]
    fn test_implicit_close_on_next_header() {
        let mut assembler = InvoiceAssembler::new();
        assembler.on_header(header("A-1"), 1);
        assembler.on_line_item(item("OP19"), 2, "raw").unwrap();
        // No terminator for A-1.
        assembler.on_header(header("A-2"), 3);

        let invoices = assembler.finish();
        assert_eq!(invoices.len(), 2);
        assert_eq!(invoices[0].header.invoice_number, "A-1");
        assert_eq!(invoices[0].line_items.len(), 1);
        assert_eq!(invoices[1].header.invoice_number, "A-2");
    }

    #[test]
    fn test_final_flush_without_terminator() {
        let mut assembler = InvoiceAssembler::new();
        assembler.on_header(header("A-1"), 1);
        let invoices = assembler.finish();
        assert_eq!(invoices.len(), 1);
    }

    #[test]
    fn test_orphan_line_item_reported_and_discarded() {
        let mut assembler = InvoiceAssembler::new();
        let err = assembler
            .on_line_item(item("OP19"), 1, "OP19,...")
            .unwrap_err();
        assert_eq!(err.kind, RowErrorKind::BusinessRule);

        // The scan continues normally afterwards.
        assembler.on_header(header("A-1"), 2);
        assembler.on_line_item(item("OP19"), 3, "raw").unwrap();
        let invoices = assembler.finish();
        assert_eq!(invoices.len(), 1);
        assert_eq!(invoices[0].line_items.len(), 1);
    }

    #[test]
    fn test_terminator_without_open_invoice_is_noop() {
        let mut assembler = InvoiceAssembler::new();
        assembler.on_invoice_end(None, 1, "raw").unwrap();
        assert!(assembler.finish().is_empty());
    }

    #[test]
    fn test_embedded_item_appended_before_seal() {
        let mut assembler = InvoiceAssembler::new();
        assembler.on_header(header("A-1"), 1);
        assembler.on_line_item(item("OP19"), 2, "raw").unwrap();
        // Terminator row that also carries the final line item.
        assembler
            .on_invoice_end(Some(item("BAL4")), 3, "raw")
            .unwrap();

        let invoices = assembler.finish();
        assert_eq!(invoices.len(), 1);
        assert_eq!(invoices[0].line_items.len(), 2);
        assert_eq!(invoices[0].line_items[1].product_code, "BAL4");
        assert_eq!(invoices[0].line_item_row_numbers, vec![2, 3]);
    }

    #[test]
    fn test_row_order_preserved() {
        let mut assembler = InvoiceAssembler::new();
        assembler.on_header(header("A-1"), 1);
        for row in 2..6 {
            assembler.on_line_item(item("OP19"), row, "raw").unwrap();
        }
        let invoices = assembler.finish();
        let rows = &invoices[0].line_item_row_numbers;
        assert!(rows.windows(2).all(|w| w[0] < w[1]));
    }
}
