// ==========================================
// Invoice Ingest - Row Classifier
// ==========================================
// Responsibility: assign a RowKind to one tokenized row via an ordered
// rule cascade. Termination and header markers are unambiguous textual
// anchors and run before the probabilistic pattern rules, which could
// otherwise misfire on rows that happen to contain numeric cells.
// ==========================================

use crate::domain::types::{LineItemPattern, RowKind};
use crate::parser::pattern_detector::PatternDetector;
use regex::Regex;
use std::sync::LazyLock;

// ===== textual anchors =====

/// Phrases meaning "totals for this invoice". Matched case-insensitively
/// against every cell: the terminator text can sit in a different cell
/// than line-item data on the same physical row.
const TERMINATOR_PHRASES: &[&str] = &["totals for invoice", "total for invoice"];

/// Marker introducing an invoice number, also the header-row anchor.
const INVOICE_NUMBER_MARKER: &str = "invoice #";

/// Known report-title banners and the fixed line-item offset of the
/// layout each one produces. Exactly one banner variant is documented;
/// a new one found in production data is a format change, not a line
/// to quietly add.
const REPORT_BANNERS: &[(&str, usize)] = &[("invoice register", 26)];

/// Report/summary boilerplate keywords; a first cell starting with one
/// of these is ignorable.
const IGNORE_KEYWORDS: &[&str] = &[
    "page ",
    "report date",
    "date range",
    "printed",
    "continued",
    "grand total",
    "subtotal",
    "sub total",
    "salesperson totals",
    "customer totals",
    "store totals",
    "qty",
    "product code",
    "description",
    "parts",
    "labor",
    "fet",
    "invoice date",
    "---",
    "===",
];

// "LASTNAME, FIRSTNAME" with optional middle parts.
static NAME_COMMA: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z.'\-]+\s*,\s*[A-Za-z][A-Za-z.'\- ]*$").unwrap()
});

// 1-4 purely alphabetic words.
static NAME_WORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z.'\-]*(?:\s+[A-Za-z][A-Za-z.'\-]*){0,3}$").unwrap()
});

// ==========================================
// ClassifiedRow - kind plus the detected pattern when relevant
// ==========================================
// The pattern is present for LineItem / LineItemEmbedded, and for an
// InvoiceEnd row that also carries an embedded line item. The assembler
// must append that item before sealing (same-row ordering rule).
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedRow {
    pub kind: RowKind,
    pub pattern: Option<LineItemPattern>,
}

impl ClassifiedRow {
    fn plain(kind: RowKind) -> Self {
        Self {
            kind,
            pattern: None,
        }
    }
}

// ==========================================
// RowClassifier
// ==========================================
pub struct RowClassifier {
    detector: PatternDetector,
}

impl RowClassifier {
    pub fn new(confidence_threshold: u8) -> Self {
        Self {
            detector: PatternDetector::new(confidence_threshold),
        }
    }

    /// Ordered cascade; each rule short-circuits.
    pub fn classify(&self, cells: &[String]) -> ClassifiedRow {
        // 1. termination scan over the whole row. Termination must never
        //    suppress extraction of a line item on the same row, so the
        //    pattern scan still runs and rides along.
        if cells.iter().any(|c| is_terminator_cell(c)) {
            return ClassifiedRow {
                kind: RowKind::InvoiceEnd,
                pattern: self.detector.detect(cells),
            };
        }

        // 2. header detection: invoice-number marker in any cell.
        if cells
            .iter()
            .any(|c| c.to_lowercase().contains(INVOICE_NUMBER_MARKER))
        {
            return ClassifiedRow::plain(RowKind::InvoiceHeader);
        }

        let first = cells.first().map(|c| c.trim()).unwrap_or_default();
        let first_lower = first.to_lowercase();

        // 3. report banner with possibly embedded line item, at that
        //    banner's fixed offset only.
        if let Some(&(_, offset)) = REPORT_BANNERS
            .iter()
            .find(|(banner, _)| first_lower.contains(banner))
        {
            return match self.detector.detect_at(cells, offset) {
                Some(pattern) => ClassifiedRow {
                    kind: RowKind::LineItemEmbedded,
                    pattern: Some(pattern),
                },
                None => ClassifiedRow::plain(RowKind::Ignore),
            };
        }

        // 4. generic ignore-by-keyword.
        if IGNORE_KEYWORDS.iter().any(|k| first_lower.starts_with(k)) {
            return ClassifiedRow::plain(RowKind::Ignore);
        }

        // 5. customer-name heuristic.
        if looks_like_customer_name(first) {
            return ClassifiedRow::plain(RowKind::CustomerStart);
        }

        // 6. generic line-item detection over all known offsets.
        if let Some(pattern) = self.detector.detect(cells) {
            let kind = if pattern.offset == 0 {
                RowKind::LineItem
            } else {
                RowKind::LineItemEmbedded
            };
            return ClassifiedRow {
                kind,
                pattern: Some(pattern),
            };
        }

        // 7. everything else.
        ClassifiedRow::plain(RowKind::Ignore)
    }
}

fn is_terminator_cell(cell: &str) -> bool {
    let lower = cell.to_lowercase();
    TERMINATOR_PHRASES.iter().any(|p| lower.contains(p))
}

/// Trimmed first cell of 3+ characters, free of boilerplate keywords
/// and currency symbols, shaped like "LAST, FIRST" or a short run of
/// alphabetic words with at least one word of 3+ characters.
fn looks_like_customer_name(first: &str) -> bool {
    if first.len() < 3 || first.contains('$') {
        return false;
    }
    let lower = first.to_lowercase();
    if IGNORE_KEYWORDS.iter().any(|k| lower.contains(k.trim())) {
        return false;
    }
    if NAME_COMMA.is_match(first) {
        return true;
    }
    NAME_WORDS.is_match(first) && first.split_whitespace().any(|w| w.len() >= 3)
}
