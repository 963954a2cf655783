// ==========================================
// Invoice Ingest - Configuration Layer
// ==========================================
// Responsibility: tunable thresholds for the parsing pipeline.
// Defaults mirror the behavior observed across the known export
// layouts; the candidate offset set itself is a documented contract in
// the pattern detector, not a tunable.
// ==========================================

use serde::{Deserialize, Serialize};

/// Default values, grouped so callers and tests can reference them by
/// name instead of repeating literals.
pub mod defaults {
    /// Minimum pattern/validation confidence for a row to be accepted.
    pub const CONFIDENCE_THRESHOLD: u8 = 60;

    /// Absolute floor of the financial tolerance, in dollars.
    pub const TOLERANCE_FLOOR: f64 = 0.05;

    /// Relative component of the financial tolerance (1% of line total).
    pub const TOLERANCE_RELATIVE: f64 = 0.01;

    /// Allowed gross-profit-margin deviation, in percentage points.
    pub const MARGIN_TOLERANCE_PCT: f64 = 2.0;

    /// Quantities above this are flagged as suspicious (warning).
    pub const QUANTITY_WARN_LIMIT: f64 = 100.0;

    /// Unit prices above this are flagged as suspicious (warning).
    pub const UNIT_PRICE_WARN_LIMIT: f64 = 10_000.0;

    /// File-size ceiling for the file line supplier (file-scoped error).
    pub const MAX_FILE_BYTES: u64 = 50 * 1024 * 1024;

    /// Default progress-report interval, in rows.
    pub const PROGRESS_INTERVAL: usize = 500;
}

// ==========================================
// ParserConfig
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParserConfig {
    pub confidence_threshold: u8,
    pub tolerance_floor: f64,
    pub tolerance_relative: f64,
    pub margin_tolerance_pct: f64,
    pub quantity_warn_limit: f64,
    pub unit_price_warn_limit: f64,
    pub max_file_bytes: u64,
    pub progress_interval: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: defaults::CONFIDENCE_THRESHOLD,
            tolerance_floor: defaults::TOLERANCE_FLOOR,
            tolerance_relative: defaults::TOLERANCE_RELATIVE,
            margin_tolerance_pct: defaults::MARGIN_TOLERANCE_PCT,
            quantity_warn_limit: defaults::QUANTITY_WARN_LIMIT,
            unit_price_warn_limit: defaults::UNIT_PRICE_WARN_LIMIT,
            max_file_bytes: defaults::MAX_FILE_BYTES,
            progress_interval: defaults::PROGRESS_INTERVAL,
        }
    }
}

impl ParserConfig {
    /// Dynamic financial tolerance for one line item:
    /// max(floor, relative share of the line total).
    pub fn tolerance_for(&self, line_total: f64) -> f64 {
        self.tolerance_floor
            .max(self.tolerance_relative * line_total.abs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_threshold() {
        let config = ParserConfig::default();
        assert_eq!(config.confidence_threshold, 60);
    }

    #[test]
    fn test_tolerance_floor_dominates_small_totals() {
        let config = ParserConfig::default();
        assert_eq!(config.tolerance_for(1.0), 0.05);
        assert_eq!(config.tolerance_for(0.0), 0.05);
    }

    #[test]
    fn test_tolerance_relative_dominates_large_totals() {
        let config = ParserConfig::default();
        assert!((config.tolerance_for(1000.0) - 10.0).abs() < f64::EPSILON);
        // Negative totals use the magnitude.
        assert!((config.tolerance_for(-1000.0) - 10.0).abs() < f64::EPSILON);
    }
}
