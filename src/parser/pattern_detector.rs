// ==========================================
// Invoice Ingest - Line-Item Pattern Detector
// ==========================================
// Responsibility: locate the 11-field line-item layout within a
// tokenized row and score the match. The conversion that produced
// these files does not preserve a stable column count, so the layout
// is searched at each of the known starting offsets.
// ==========================================
// Slots: code, description, adjustment, quantity, parts, labor, FET,
// total, cost, GPM %, gross profit $.
// ==========================================

use crate::domain::types::LineItemPattern;
use crate::parser::numeric::{is_currency_or_blank, parse_currency, parse_percent, parse_quantity};
use regex::Regex;
use std::sync::LazyLock;

/// Documented contract: the three known report layouts. A layout at
/// any other offset is a new variant and must be flagged, not silently
/// added here.
pub const CANDIDATE_OFFSETS: [usize; 3] = [0, 11, 26];

/// Number of contiguous cells in one line-item layout.
pub const SLOT_COUNT: usize = 11;

// ===== scoring weights (sum to 100) =====
const SCORE_PRODUCT_CODE: u8 = 30;
const SCORE_QUANTITY: u8 = 20;
const SCORE_MONEY_GROUP: u8 = 25;
const SCORE_COST_PROFIT: u8 = 15;
const SCORE_MARGIN: u8 = 10;

/// Largest plausible absolute quantity on a single line.
const QUANTITY_MAGNITUDE_LIMIT: f64 = 1000.0;

/// Largest plausible absolute margin percentage.
const MARGIN_MAGNITUDE_LIMIT: f64 = 1000.0;

// Known product-code shapes: dashed part numbers ("WB-1042-X"),
// short pure-numeric SKUs, and letter-prefixed codes ("OP19").
static CODE_DASHED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9]+(?:-[A-Za-z0-9]+)+$").unwrap());
static CODE_NUMERIC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{1,6}$").unwrap());
static CODE_PREFIXED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z]{1,5}\d[A-Za-z0-9]*$").unwrap());

fn is_product_code_shape(cell: &str) -> bool {
    let cell = cell.trim();
    !cell.is_empty()
        && (CODE_DASHED.is_match(cell) || CODE_NUMERIC.is_match(cell) || CODE_PREFIXED.is_match(cell))
}

// ==========================================
// PatternDetector
// ==========================================
pub struct PatternDetector {
    confidence_threshold: u8,
}

impl PatternDetector {
    pub fn new(confidence_threshold: u8) -> Self {
        Self {
            confidence_threshold,
        }
    }

    /// Scan all candidate offsets and return the best match at or above
    /// the threshold. Ties favor the lower offset (the standard
    /// non-embedded layout).
    pub fn detect(&self, cells: &[String]) -> Option<LineItemPattern> {
        let mut best: Option<LineItemPattern> = None;
        for &offset in &CANDIDATE_OFFSETS {
            if let Some(candidate) = self.score_window(cells, offset) {
                match best {
                    // Strict '>' keeps the earlier (lower) offset on ties.
                    Some(b) if candidate.confidence > b.confidence => best = Some(candidate),
                    None => best = Some(candidate),
                    _ => {}
                }
            }
        }
        best
    }

    /// Score a single offset only. Used for report-banner rows whose
    /// layout position is fixed.
    pub fn detect_at(&self, cells: &[String], offset: usize) -> Option<LineItemPattern> {
        self.score_window(cells, offset)
    }

    /// Attempt to read 11 contiguous cells at `offset` and score them.
    /// Candidates below the threshold are discarded.
    fn score_window(&self, cells: &[String], offset: usize) -> Option<LineItemPattern> {
        if cells.len() < offset + SLOT_COUNT {
            return None;
        }
        let window = &cells[offset..offset + SLOT_COUNT];
        let mut confidence: u8 = 0;

        // product code shape
        if is_product_code_shape(&window[0]) {
            confidence += SCORE_PRODUCT_CODE;
        }

        // quantity: numeric (accounting negatives), bounded magnitude
        if let Some(qty) = parse_quantity(&window[3]) {
            if qty.abs() <= QUANTITY_MAGNITUDE_LIMIT {
                confidence += SCORE_QUANTITY;
            }
        }

        // parts / labor / FET / total: all currency or blank
        if window[4..8].iter().all(|c| is_currency_or_blank(c)) {
            confidence += SCORE_MONEY_GROUP;
        }

        // cost and gross profit: both currency
        if parse_currency(&window[8]).is_some() && parse_currency(&window[10]).is_some() {
            confidence += SCORE_COST_PROFIT;
        }

        // margin percentage, bounded
        if let Some(margin) = parse_percent(&window[9]) {
            if margin.abs() <= MARGIN_MAGNITUDE_LIMIT {
                confidence += SCORE_MARGIN;
            }
        }

        if confidence < self.confidence_threshold {
            return None;
        }
        Some(LineItemPattern::at_offset(offset, confidence))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    fn full_item() -> Vec<String> {
        cells(&[
            "OP19",
            "Tire 205/55",
            "",
            "1",
            "10.00",
            "0.00",
            "0.00",
            "10.00",
            "5.00",
            "50.00",
            "5.00",
        ])
    }

    #[test]
    fn test_detect_standard_layout_full_score() {
        let detector = PatternDetector::new(60);
        let pattern = detector.detect(&full_item()).expect("pattern");
        assert_eq!(pattern.offset, 0);
        assert_eq!(pattern.confidence, 100);
    }

    #[test]
    fn test_detect_embedded_layout_at_offset_26() {
        let detector = PatternDetector::new(60);
        let mut row = vec![String::new(); 26];
        row[0] = "INVOICE REGISTER".to_string();
        row.extend(full_item());
        let pattern = detector.detect(&row).expect("pattern");
        assert_eq!(pattern.offset, 26);
        assert_eq!(pattern.slots[0], 26);
    }

    #[test]
    fn test_threshold_boundary() {
        // code (+30) + money group (+25) = 55: rejected at 60,
        // accepted at 55.
        let row = cells(&[
            "OP19", "desc", "", "bad-qty", "1.00", "", "", "2.00", "x", "x", "x",
        ]);
        assert!(PatternDetector::new(60).detect(&row).is_none());
        let pattern = PatternDetector::new(55).detect(&row).expect("pattern");
        assert_eq!(pattern.confidence, 55);
    }

    #[test]
    fn test_exact_threshold_confidence_accepted() {
        // quantity (+20) + money group (+25) + cost/profit (+15) = 60:
        // a candidate sitting exactly on the default threshold passes.
        let row = cells(&[
            "??", "desc", "", "1", "10.00", "", "", "10.00", "5.00", "x", "5.00",
        ]);
        let detector = PatternDetector::new(crate::config::defaults::CONFIDENCE_THRESHOLD);
        let pattern = detector.detect(&row).expect("pattern");
        assert_eq!(pattern.confidence, 60);
    }

    #[test]
    fn test_quantity_magnitude_limit() {
        let mut row = full_item();
        row[3] = "1500".to_string();
        let pattern = PatternDetector::new(60).detect(&row).expect("pattern");
        // Quantity points withheld: 100 - 20.
        assert_eq!(pattern.confidence, 80);
    }

    #[test]
    fn test_accounting_negative_quantity_accepted() {
        let mut row = full_item();
        row[3] = "(2)".to_string();
        let pattern = PatternDetector::new(60).detect(&row).expect("pattern");
        assert_eq!(pattern.confidence, 100);
    }

    #[test]
    fn test_short_row_rejected() {
        let row = cells(&["OP19", "Tire"]);
        assert!(PatternDetector::new(60).detect(&row).is_none());
    }

    #[test]
    fn test_tie_prefers_lower_offset() {
        // The same full-score window appears at offsets 0 and 11.
        let mut row = full_item();
        row.extend(full_item());
        let pattern = PatternDetector::new(60).detect(&row).expect("pattern");
        assert_eq!(pattern.offset, 0);
    }

    #[test]
    fn test_detect_at_restricts_offset() {
        let detector = PatternDetector::new(60);
        // Valid at offset 0 but not at 26.
        assert!(detector.detect_at(&full_item(), 26).is_none());
        assert!(detector.detect_at(&full_item(), 0).is_some());
    }
}
