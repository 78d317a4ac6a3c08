//! Stock health: reorder level and status
//!
//! The single source of the reorder arithmetic used by part listings,
//! reports, exports and purchase-order generation.
//!
//! ```text
//! effective_weekly_usage = weekly_usage if weekly_usage > 0 else monthly_usage / 4.33
//! reorder_level = ceil(effective_weekly_usage * lead_time_weeks + safety_stock)   (0 without usage)
//! status = Out of Stock | Critical | Reorder Needed | Healthy
//! ```

use serde::{Deserialize, Serialize};

/// Average number of weeks in a month
pub const WEEKS_PER_MONTH: f64 = 4.33;

/// Slack for float noise when rounding up (e.g. 0.1 * 3.0 + 0.7)
const CEIL_EPSILON: f64 = 1e-9;

/// Stock health classification, ordered from most to least urgent
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    OutOfStock,
    Critical,
    ReorderNeeded,
    Healthy,
}

impl StockStatus {
    pub fn all() -> [StockStatus; 4] {
        [
            StockStatus::OutOfStock,
            StockStatus::Critical,
            StockStatus::ReorderNeeded,
            StockStatus::Healthy,
        ]
    }

    /// Whether restocking should be triggered
    pub fn needs_reorder(&self) -> bool {
        !matches!(self, StockStatus::Healthy)
    }

    /// Machine-friendly key (used by CSV/JSON and filters)
    pub fn key(&self) -> &'static str {
        match self {
            StockStatus::OutOfStock => "out_of_stock",
            StockStatus::Critical => "critical",
            StockStatus::ReorderNeeded => "reorder_needed",
            StockStatus::Healthy => "healthy",
        }
    }
}

impl std::fmt::Display for StockStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StockStatus::OutOfStock => write!(f, "Out of Stock"),
            StockStatus::Critical => write!(f, "Critical"),
            StockStatus::ReorderNeeded => write!(f, "Reorder Needed"),
            StockStatus::Healthy => write!(f, "Healthy"),
        }
    }
}

impl std::str::FromStr for StockStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace([' ', '-'], "_").as_str() {
            "out_of_stock" | "out" => Ok(StockStatus::OutOfStock),
            "critical" => Ok(StockStatus::Critical),
            "reorder_needed" | "reorder" => Ok(StockStatus::ReorderNeeded),
            "healthy" => Ok(StockStatus::Healthy),
            _ => Err(format!(
                "Invalid stock status: {}. Use out_of_stock, critical, reorder_needed, or healthy",
                s
            )),
        }
    }
}

/// The fields of a part that drive stock health
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StockInputs {
    pub quantity: u32,
    pub min_stock: u32,
    pub weekly_usage: f64,
    pub monthly_usage: f64,
    pub lead_time_weeks: f64,
    pub safety_stock: f64,
}

/// Derived stock metrics for one part
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StockAssessment {
    pub effective_weekly_usage: f64,
    pub reorder_level: u32,
    pub status: StockStatus,
    pub suggested_order_qty: u32,
    pub weeks_of_cover: Option<f64>,
}

/// Treat missing, negative and NaN inputs as zero
fn sanitize(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Weekly usage, falling back to monthly usage spread over 4.33 weeks
pub fn effective_weekly_usage(weekly_usage: f64, monthly_usage: f64) -> f64 {
    let weekly = sanitize(weekly_usage);
    if weekly > 0.0 {
        weekly
    } else {
        sanitize(monthly_usage) / WEEKS_PER_MONTH
    }
}

/// Quantity at or below which the part should be reordered
pub fn reorder_level(inputs: &StockInputs) -> u32 {
    let usage = effective_weekly_usage(inputs.weekly_usage, inputs.monthly_usage);
    if usage <= 0.0 {
        return 0;
    }

    let raw = usage * sanitize(inputs.lead_time_weeks) + sanitize(inputs.safety_stock);
    if raw <= 0.0 {
        return 0;
    }
    // Snap values a hair above an integer down to it, but any positive demand needs a unit
    let nearest = raw.round();
    let level = if (raw - nearest).abs() < CEIL_EPSILON {
        nearest
    } else {
        raw.ceil()
    }
    .max(1.0);
    if level >= u32::MAX as f64 {
        u32::MAX
    } else {
        level as u32
    }
}

/// Classify stock health from quantity, minimum stock and reorder level
pub fn stock_status(quantity: u32, min_stock: u32, reorder_level: u32) -> StockStatus {
    if quantity == 0 {
        StockStatus::OutOfStock
    } else if quantity <= min_stock {
        StockStatus::Critical
    } else if reorder_level > 0 && quantity <= reorder_level {
        StockStatus::ReorderNeeded
    } else {
        StockStatus::Healthy
    }
}

/// How many weeks current stock lasts at the effective usage rate
pub fn weeks_of_cover(quantity: u32, effective_weekly_usage: f64) -> Option<f64> {
    if effective_weekly_usage > 0.0 {
        Some(quantity as f64 / effective_weekly_usage)
    } else {
        None
    }
}

/// Quantity that brings the part back above its thresholds
///
/// Zero for healthy parts. Otherwise the gap to the larger of the reorder
/// level and one unit above minimum stock.
pub fn suggested_order_qty(inputs: &StockInputs, reorder_level: u32, status: StockStatus) -> u32 {
    if !status.needs_reorder() {
        return 0;
    }
    let target = reorder_level.max(inputs.min_stock.saturating_add(1));
    target.saturating_sub(inputs.quantity).max(1)
}

/// Compute every derived stock metric for one part
pub fn assess(inputs: &StockInputs) -> StockAssessment {
    let usage = effective_weekly_usage(inputs.weekly_usage, inputs.monthly_usage);
    let level = reorder_level(inputs);
    let status = stock_status(inputs.quantity, inputs.min_stock, level);

    StockAssessment {
        effective_weekly_usage: usage,
        reorder_level: level,
        status,
        suggested_order_qty: suggested_order_qty(inputs, level, status),
        weeks_of_cover: weeks_of_cover(inputs.quantity, usage),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(quantity: u32, min_stock: u32) -> StockInputs {
        StockInputs {
            quantity,
            min_stock,
            ..Default::default()
        }
    }

    #[test]
    fn test_no_usage_means_no_reorder_level() {
        for qty in [0, 1, 50, 10_000] {
            let i = StockInputs {
                quantity: qty,
                lead_time_weeks: 4.0,
                safety_stock: 10.0,
                ..Default::default()
            };
            assert_eq!(reorder_level(&i), 0);
        }
    }

    #[test]
    fn test_zero_quantity_is_out_of_stock() {
        let i = StockInputs {
            quantity: 0,
            min_stock: 0,
            weekly_usage: 100.0,
            lead_time_weeks: 3.0,
            ..Default::default()
        };
        assert_eq!(assess(&i).status, StockStatus::OutOfStock);
        assert_eq!(assess(&inputs(0, 5)).status, StockStatus::OutOfStock);
        assert_eq!(stock_status(0, 0, 0), StockStatus::OutOfStock);
    }

    #[test]
    fn test_at_or_below_min_stock_is_critical() {
        assert_eq!(assess(&inputs(5, 5)).status, StockStatus::Critical);
        assert_eq!(assess(&inputs(1, 5)).status, StockStatus::Critical);
        assert_eq!(stock_status(3, 10, 50), StockStatus::Critical);
    }

    #[test]
    fn test_weekly_usage_reorder_level() {
        let i = StockInputs {
            quantity: 100,
            weekly_usage: 10.0,
            lead_time_weeks: 2.0,
            safety_stock: 5.0,
            ..Default::default()
        };
        assert_eq!(reorder_level(&i), 25);
    }

    #[test]
    fn test_monthly_usage_fallback() {
        let i = StockInputs {
            quantity: 100,
            monthly_usage: 43.3,
            lead_time_weeks: 1.0,
            ..Default::default()
        };
        let a = assess(&i);
        assert!((a.effective_weekly_usage - 10.0).abs() < 1e-9);
        assert_eq!(a.reorder_level, 10);
    }

    #[test]
    fn test_weekly_usage_takes_precedence() {
        assert_eq!(effective_weekly_usage(2.0, 100.0), 2.0);
        assert_eq!(effective_weekly_usage(0.0, 0.0), 0.0);
        assert_eq!(effective_weekly_usage(-3.0, 0.0), 0.0);
    }

    #[test]
    fn test_reorder_needed_band() {
        let mut i = StockInputs {
            quantity: 25,
            min_stock: 5,
            weekly_usage: 10.0,
            lead_time_weeks: 2.0,
            safety_stock: 5.0,
            ..Default::default()
        };
        assert_eq!(assess(&i).status, StockStatus::ReorderNeeded);
        i.quantity = 26;
        assert_eq!(assess(&i).status, StockStatus::Healthy);
    }

    #[test]
    fn test_ceil_rounds_fractional_levels_up() {
        let i = StockInputs {
            quantity: 1,
            weekly_usage: 1.5,
            lead_time_weeks: 1.0,
            ..Default::default()
        };
        assert_eq!(reorder_level(&i), 2);

        let noisy = StockInputs {
            weekly_usage: 0.1,
            lead_time_weeks: 3.0,
            safety_stock: 0.7,
            ..Default::default()
        };
        assert_eq!(reorder_level(&noisy), 1);
    }

    #[test]
    fn test_tiny_positive_demand_still_reorders() {
        let tiny = StockInputs {
            quantity: 1,
            weekly_usage: 1e-10,
            lead_time_weeks: 1.0,
            ..Default::default()
        };
        assert_eq!(reorder_level(&tiny), 1);
        assert_eq!(assess(&tiny).status, StockStatus::ReorderNeeded);

        let no_lead = StockInputs {
            weekly_usage: 3.0,
            ..Default::default()
        };
        assert_eq!(reorder_level(&no_lead), 0);
    }

    #[test]
    fn test_assessment_is_idempotent() {
        let i = StockInputs {
            quantity: 12,
            min_stock: 4,
            weekly_usage: 3.5,
            monthly_usage: 20.0,
            lead_time_weeks: 2.5,
            safety_stock: 3.0,
        };
        assert_eq!(assess(&i), assess(&i));
    }

    #[test]
    fn test_suggested_order_qty() {
        let i = StockInputs {
            quantity: 3,
            min_stock: 5,
            weekly_usage: 10.0,
            lead_time_weeks: 2.0,
            safety_stock: 5.0,
            ..Default::default()
        };
        assert_eq!(assess(&i).suggested_order_qty, 22);

        // No usage data: top up to one above minimum stock
        assert_eq!(assess(&inputs(0, 4)).suggested_order_qty, 5);

        let healthy = StockInputs { quantity: 100, ..i };
        assert_eq!(assess(&healthy).suggested_order_qty, 0);
    }

    #[test]
    fn test_weeks_of_cover() {
        assert_eq!(weeks_of_cover(20, 4.0), Some(5.0));
        assert_eq!(weeks_of_cover(20, 0.0), None);
    }

    #[test]
    fn test_status_parse_and_display() {
        assert_eq!("reorder".parse::<StockStatus>().unwrap(), StockStatus::ReorderNeeded);
        assert_eq!("Out of Stock".parse::<StockStatus>().unwrap(), StockStatus::OutOfStock);
        assert_eq!(StockStatus::ReorderNeeded.to_string(), "Reorder Needed");
        assert!(StockStatus::OutOfStock < StockStatus::Healthy);
        assert!("plenty".parse::<StockStatus>().is_err());
    }
}
