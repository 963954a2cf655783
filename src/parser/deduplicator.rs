// ==========================================
// Invoice Ingest - Deduplicator / Normalizer
// ==========================================
// Responsibility: post-pass over the completed invoices. Duplicate
// invoice numbers are advisory: they are reported, the invoices are
// retained, and the skip/merge/overwrite decision belongs to the
// persistence collaborator.
// ==========================================

use crate::domain::invoice::ParsedInvoice;
use crate::parser::numeric::{clean_text, round_cents};
use std::collections::HashMap;

// ==========================================
// duplicate detection
// ==========================================

/// Invoice numbers seen more than once, each reported exactly once in
/// first-occurrence order, with the header row numbers of every
/// occurrence.
pub fn find_duplicates(invoices: &[ParsedInvoice]) -> Vec<(String, Vec<usize>)> {
    let mut occurrences: HashMap<&str, Vec<usize>> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();

    for invoice in invoices {
        let number = invoice.header.invoice_number.as_str();
        let rows = occurrences.entry(number).or_default();
        if rows.is_empty() {
            order.push(number);
        }
        rows.push(invoice.header_row_number);
    }

    order
        .into_iter()
        .filter_map(|number| {
            let rows = &occurrences[number];
            (rows.len() > 1).then(|| (number.to_string(), rows.clone()))
        })
        .collect()
}

// ==========================================
// normalization
// ==========================================

/// Normalize free-text fields (trim, collapse whitespace runs) and
/// round invoice-level aggregates to cents, in place over the sealed
/// batch. Purely cosmetic: no amounts are recomputed here.
pub fn normalize_invoices(invoices: &mut [ParsedInvoice]) {
    for invoice in invoices {
        let header = &mut invoice.header;
        header.invoice_number = clean_text(&header.invoice_number);
        header.customer_name = clean_text(&header.customer_name);
        header.salesperson = clean_text(&header.salesperson);
        header.vehicle_info = header
            .vehicle_info
            .take()
            .map(|v| clean_text(&v))
            .filter(|v| !v.is_empty());
        header.tax_amount = round_cents(header.tax_amount);
        header.total_amount = round_cents(header.total_amount);

        for item in &mut invoice.line_items {
            item.product_code = clean_text(&item.product_code);
            item.description = clean_text(&item.description);
            item.adjustment = clean_text(&item.adjustment);
            item.parts_cost = round_cents(item.parts_cost);
            item.labor_cost = round_cents(item.labor_cost);
            item.fet = round_cents(item.fet);
            item.line_total = round_cents(item.line_total);
            item.cost = round_cents(item.cost);
            item.gross_profit = round_cents(item.gross_profit);
        }
    }
}
