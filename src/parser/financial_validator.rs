// ==========================================
// Invoice Ingest - Financial Validator
// ==========================================
// Responsibility: check a line item's internal arithmetic, assign a
// confidence score, and optionally produce a corrected replacement.
// Correction is a pure function: the extracted record is never
// mutated, so downstream auditing can see what was inferred.
// ==========================================

use crate::config::ParserConfig;
use crate::domain::invoice::{LineItemRecord, ValidationResult};

// ===== fixed penalties =====
const PENALTY_COMPONENT_SUM: u8 = 30;
const PENALTY_GROSS_PROFIT: u8 = 25;
const PENALTY_IMPOSSIBLE_MARGIN: u8 = 25;
const PENALTY_QUANTITY_NOT_POSITIVE: u8 = 30;
const PENALTY_MARGIN_MISMATCH: u8 = 10;
const PENALTY_EXTREME_NEGATIVE_MARGIN: u8 = 10;
const PENALTY_RANGE_WARNING: u8 = 5;

/// When the component-sum mismatch exceeds this share of the reported
/// total, the total itself is presumed wrong and is recomputed.
const LARGE_MISMATCH_SHARE: f64 = 0.10;

// ==========================================
// FinancialValidator
// ==========================================
pub struct FinancialValidator {
    config: ParserConfig,
}

impl FinancialValidator {
    pub fn new(config: ParserConfig) -> Self {
        Self { config }
    }

    /// Validate one line item, without attempting correction.
    pub fn validate(&self, item: &LineItemRecord) -> ValidationResult {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();
        let mut confidence: u8 = 100;
        let tolerance = self.config.tolerance_for(item.line_total);

        // quantity must be positive for the item to be usable
        if item.quantity <= 0.0 {
            errors.push(format!("quantity {} is not positive", item.quantity));
            confidence = confidence.saturating_sub(PENALTY_QUANTITY_NOT_POSITIVE);
        }

        // parts + labor + FET ~= total, with the pure-service form
        // (no parts cost) allowed to satisfy labor + FET ~= total.
        let component_sum = item.parts_cost + item.labor_cost + item.fet;
        let mut sum_ok = (component_sum - item.line_total).abs() <= tolerance;
        if !sum_ok && item.parts_cost == 0.0 {
            sum_ok = (item.labor_cost + item.fet - item.line_total).abs() <= tolerance;
        }
        if !sum_ok {
            errors.push(format!(
                "components {:.2} do not add up to line total {:.2}",
                component_sum, item.line_total
            ));
            confidence = confidence.saturating_sub(PENALTY_COMPONENT_SUM);
        }

        // total - cost ~= gross profit
        if ((item.line_total - item.cost) - item.gross_profit).abs() > tolerance {
            errors.push(format!(
                "gross profit {:.2} != line total {:.2} - cost {:.2}",
                item.gross_profit, item.line_total, item.cost
            ));
            confidence = confidence.saturating_sub(PENALTY_GROSS_PROFIT);
        }

        // margin ~= gross profit / total * 100, within a wider band;
        // a mismatch is suspicious but not disqualifying.
        if item.line_total != 0.0 {
            let expected_margin = item.gross_profit / item.line_total * 100.0;
            if (expected_margin - item.gross_profit_margin).abs() > self.config.margin_tolerance_pct
            {
                warnings.push(format!(
                    "margin {:.2}% deviates from computed {:.2}%",
                    item.gross_profit_margin, expected_margin
                ));
                confidence = confidence.saturating_sub(PENALTY_MARGIN_MISMATCH);
            }
        }

        // margin over 100% with a positive cost is mathematically
        // impossible; under -100% is merely extreme.
        if item.gross_profit_margin > 100.0 && item.cost > 0.0 {
            errors.push(format!(
                "margin {:.2}% over 100% with positive cost {:.2}",
                item.gross_profit_margin, item.cost
            ));
            confidence = confidence.saturating_sub(PENALTY_IMPOSSIBLE_MARGIN);
        } else if item.gross_profit_margin < -100.0 {
            warnings.push(format!(
                "margin {:.2}% below -100%",
                item.gross_profit_margin
            ));
            confidence = confidence.saturating_sub(PENALTY_EXTREME_NEGATIVE_MARGIN);
        }

        // range sanity: suspicious, not disqualifying
        if item.quantity > self.config.quantity_warn_limit {
            warnings.push(format!("quantity {} unusually large", item.quantity));
            confidence = confidence.saturating_sub(PENALTY_RANGE_WARNING);
        }
        if item.quantity > 0.0 {
            let unit_price = item.line_total / item.quantity;
            if unit_price > self.config.unit_price_warn_limit {
                warnings.push(format!("unit price {:.2} unusually large", unit_price));
                confidence = confidence.saturating_sub(PENALTY_RANGE_WARNING);
            }
        }
        for (name, value) in [
            ("parts cost", item.parts_cost),
            ("labor cost", item.labor_cost),
            ("FET", item.fet),
            ("cost", item.cost),
        ] {
            if value < 0.0 {
                warnings.push(format!("negative {} {:.2}", name, value));
                confidence = confidence.saturating_sub(PENALTY_RANGE_WARNING);
            }
        }

        let is_valid = errors.is_empty() && confidence >= self.config.confidence_threshold;
        ValidationResult {
            is_valid,
            confidence,
            errors,
            warnings,
            corrected: None,
        }
    }

    /// Recompute derived fields from the components, in fixed order:
    /// line total first (only when the mismatch is large relative to
    /// the reported total), then gross profit from the possibly
    /// corrected total, then the margin from the corrected gross
    /// profit. Returns the corrected record and one warning per field
    /// actually changed.
    pub fn correct(&self, item: &LineItemRecord) -> (LineItemRecord, Vec<String>) {
        let mut corrected = item.clone();
        let mut warnings = Vec::new();

        // step 1: line total from parts + labor + FET
        let component_sum = corrected.parts_cost + corrected.labor_cost + corrected.fet;
        let mismatch = (component_sum - corrected.line_total).abs();
        let tolerance = self.config.tolerance_for(corrected.line_total);
        let large = mismatch > (LARGE_MISMATCH_SHARE * corrected.line_total.abs()).max(tolerance);
        if large {
            warnings.push(format!(
                "line total corrected from {:.2} to {:.2} (recomputed from parts + labor + FET)",
                corrected.line_total, component_sum
            ));
            corrected.line_total = component_sum;
        }

        // step 2: gross profit from the (possibly corrected) total
        let tolerance = self.config.tolerance_for(corrected.line_total);
        let expected_profit = corrected.line_total - corrected.cost;
        if (expected_profit - corrected.gross_profit).abs() > tolerance {
            warnings.push(format!(
                "gross profit corrected from {:.2} to {:.2}",
                corrected.gross_profit, expected_profit
            ));
            corrected.gross_profit = expected_profit;
        }

        // step 3: margin from the corrected gross profit
        if corrected.line_total != 0.0 {
            let expected_margin = corrected.gross_profit / corrected.line_total * 100.0;
            if (expected_margin - corrected.gross_profit_margin).abs()
                > self.config.margin_tolerance_pct
            {
                warnings.push(format!(
                    "margin corrected from {:.2}% to {:.2}%",
                    corrected.gross_profit_margin, expected_margin
                ));
                corrected.gross_profit_margin = expected_margin;
            }
        }

        (corrected, warnings)
    }

    /// Validate, and if the item fails, attempt the correction pass and
    /// re-validate the corrected record. A successful correction is
    /// surfaced through `corrected` plus its warnings, never silently.
    pub fn validate_and_correct(&self, item: &LineItemRecord) -> ValidationResult {
        let first = self.validate(item);
        if first.is_valid {
            return first;
        }

        let (corrected, correction_warnings) = self.correct(item);
        if correction_warnings.is_empty() {
            // Nothing correctable; the original verdict stands.
            return first;
        }

        let second = self.validate(&corrected);
        if second.is_valid {
            let mut warnings = correction_warnings;
            warnings.extend(second.warnings);
            ValidationResult {
                is_valid: true,
                confidence: second.confidence,
                errors: Vec::new(),
                warnings,
                corrected: Some(corrected),
            }
        } else {
            first
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::ProductCategory;

    fn item() -> LineItemRecord {
        LineItemRecord {
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
        }
    }

    fn validator() -> FinancialValidator {
        FinancialValidator::new(ParserConfig::default())
    }

    #[test]
    fn test_consistent_item_full_confidence() {
        let result = validator().validate(&item());
        assert!(result.is_valid);
        assert_eq!(result.confidence, 100);
        assert!(result.errors.is_empty());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_component_sum_mismatch_is_error() {
        let mut bad = item();
        bad.line_total = 12.0;
        let result = validator().validate(&bad);
        assert!(!result.is_valid);
        assert_eq!(result.errors.len(), 2); // sum and gross-profit both off
    }

    #[test]
    fn test_tolerance_scales_with_total() {
        // 1% of 1000 = 10; a 9-dollar slip passes, the derived fields
        // staying consistent with the reported total.
        let mut big = item();
        big.parts_cost = 991.0;
        big.line_total = 1000.0;
        big.cost = 500.0;
        big.gross_profit = 500.0;
        big.gross_profit_margin = 50.0;
        let result = validator().validate(&big);
        assert!(result.is_valid, "{:?}", result.errors);
    }

    #[test]
    fn test_margin_mismatch_is_warning_not_error() {
        let mut off = item();
        off.gross_profit_margin = 55.0; // computed is 50.0
        let result = validator().validate(&off);
        assert!(result.is_valid);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.confidence, 90);
    }

    #[test]
    fn test_impossible_margin_is_error() {
        let mut bad = item();
        bad.gross_profit_margin = 150.0;
        let result = validator().validate(&bad);
        assert!(!result.is_valid);
        assert!(result
            .errors
            .iter()
            .any(|e| e.contains("over 100%")));
    }

    #[test]
    fn test_extreme_negative_margin_is_warning() {
        let mut odd = item();
        odd.parts_cost = -10.0;
        odd.line_total = -10.0;
        odd.cost = 5.0;
        odd.gross_profit = -15.0;
        odd.gross_profit_margin = 150.0; // -15/-10*100
        // Margin over 100 with positive cost is still an error here, so
        // flip the cost sign to isolate the negative-margin path.
        odd.cost = -5.0;
        odd.gross_profit = -5.0;
        odd.gross_profit_margin = -150.0;
        let result = validator().validate(&odd);
        assert!(result
            .warnings
            .iter()
            .any(|w| w.contains("below -100%")));
    }

    #[test]
    fn test_zero_quantity_invalid() {
        let mut bad = item();
        bad.quantity = 0.0;
        let result = validator().validate(&bad);
        assert!(!result.is_valid);
    }

    #[test]
    fn test_range_warnings_do_not_invalidate() {
        let mut big = item();
        big.quantity = 200.0;
        big.parts_cost = 2000.0;
        big.line_total = 2000.0;
        big.cost = 1000.0;
        big.gross_profit = 1000.0;
        big.gross_profit_margin = 50.0;
        let result = validator().validate(&big);
        assert!(result.is_valid);
        assert!(result
            .warnings
            .iter()
            .any(|w| w.contains("unusually large")));
    }

    #[test]
    fn test_corrupted_total_corrected_with_one_warning() {
        // Total read as 0.00 while every other field is already
        // consistent with the recomputed total.
        let mut bad = item();
        bad.line_total = 0.0;
        let result = validator().validate_and_correct(&bad);

        assert!(result.is_valid);
        assert_eq!(result.warnings.len(), 1);
        let corrected = result.corrected.expect("corrected record");
        assert_eq!(corrected.line_total, 10.0);
        assert_eq!(corrected.gross_profit, 5.0);
        assert_eq!(corrected.gross_profit_margin, 50.0);
        // The original is untouched.
        assert_eq!(bad.line_total, 0.0);
    }

    #[test]
    fn test_correction_cascades_through_profit_and_margin() {
        let mut bad = item();
        bad.line_total = 0.0;
        bad.gross_profit = 0.0;
        bad.gross_profit_margin = 0.0;
        let result = validator().validate_and_correct(&bad);

        assert!(result.is_valid);
        let corrected = result.corrected.expect("corrected record");
        assert_eq!(corrected.line_total, 10.0);
        assert_eq!(corrected.gross_profit, 5.0);
        assert_eq!(corrected.gross_profit_margin, 50.0);
        assert_eq!(result.warnings.len(), 3);
    }

    #[test]
    fn test_uncorrectable_item_keeps_original_verdict() {
        let mut bad = item();
        bad.quantity = 0.0; // correction never touches quantity
        let result = validator().validate_and_correct(&bad);
        assert!(!result.is_valid);
        assert!(result.corrected.is_none());
    }
}
