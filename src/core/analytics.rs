//! KPI aggregation over loaded records
//!
//! Pure functions over slices; commands load the records and render the
//! results.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::core::stock::{StockAssessment, StockStatus};
use crate::entities::movement::{Movement, MovementKind};
use crate::entities::order::{Order, OrderStatus};
use crate::entities::part::Part;
use crate::entities::quote::Quote;

/// Stock overview across all parts
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InventorySummary {
    pub part_count: usize,
    pub total_units: u64,
    pub total_value: f64,
    pub by_status: BTreeMap<StockStatus, usize>,
    pub value_by_category: BTreeMap<String, f64>,
    /// Keyed by facility ID, "unassigned" when a part has none
    pub value_by_facility: BTreeMap<String, f64>,
}

impl InventorySummary {
    pub fn count(&self, status: StockStatus) -> usize {
        self.by_status.get(&status).copied().unwrap_or(0)
    }

    /// Parts that need restocking
    pub fn needing_reorder(&self) -> usize {
        self.by_status
            .iter()
            .filter(|(s, _)| s.needs_reorder())
            .map(|(_, n)| n)
            .sum()
    }
}

pub fn inventory_summary(parts: &[Part]) -> InventorySummary {
    let mut summary = InventorySummary {
        part_count: parts.len(),
        ..Default::default()
    };

    for status in StockStatus::all() {
        summary.by_status.insert(status, 0);
    }

    for part in parts {
        let value = part.stock_value();
        summary.total_units += part.quantity as u64;
        summary.total_value += value;
        *summary.by_status.entry(part.assess().status).or_insert(0) += 1;
        *summary
            .value_by_category
            .entry(part.category.to_string())
            .or_insert(0.0) += value;
        *summary
            .value_by_facility
            .entry(part.facility.clone().unwrap_or_else(|| "unassigned".to_string()))
            .or_insert(0.0) += value;
    }

    summary
}

/// A part that needs restocking, with its assessment
#[derive(Debug, Clone)]
pub struct ReorderItem<'a> {
    pub part: &'a Part,
    pub assessment: StockAssessment,
}

impl ReorderItem<'_> {
    /// Cost of the suggested order at the part's unit price
    pub fn suggested_cost(&self) -> f64 {
        self.assessment.suggested_order_qty as f64 * self.part.unit_price
    }
}

/// Parts needing reorder, most urgent first
///
/// Ordered by status severity, then by weeks of cover (parts without usage
/// data last), then by part number.
pub fn reorder_list(parts: &[Part]) -> Vec<ReorderItem<'_>> {
    let mut items: Vec<ReorderItem> = parts
        .iter()
        .map(|part| ReorderItem {
            part,
            assessment: part.assess(),
        })
        .filter(|item| item.assessment.status.needs_reorder())
        .collect();

    items.sort_by(|a, b| {
        a.assessment
            .status
            .cmp(&b.assessment.status)
            .then_with(|| {
                let cover = |i: &ReorderItem| i.assessment.weeks_of_cover.unwrap_or(f64::INFINITY);
                cover(a).total_cmp(&cover(b))
            })
            .then_with(|| a.part.part_number.cmp(&b.part.part_number))
    });
    items
}

/// Outbound usage for one part over a window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageRow {
    pub part: String,
    pub units_out: u64,
    pub units_in: u64,
    pub issues: usize,
}

impl UsageRow {
    /// Observed weekly usage over a window of `days`
    pub fn weekly_rate(&self, days: u32) -> f64 {
        if days == 0 {
            return 0.0;
        }
        self.units_out as f64 * 7.0 / days as f64
    }
}

/// Movement totals per part since `since`, highest outbound first
pub fn usage_since(movements: &[Movement], since: DateTime<Utc>) -> Vec<UsageRow> {
    let mut rows: HashMap<&str, UsageRow> = HashMap::new();

    for mov in movements.iter().filter(|m| m.created >= since) {
        let row = rows.entry(mov.part.as_str()).or_insert_with(|| UsageRow {
            part: mov.part.clone(),
            units_out: 0,
            units_in: 0,
            issues: 0,
        });
        match mov.kind {
            MovementKind::Out => {
                row.units_out += mov.quantity as u64;
                row.issues += 1;
            }
            MovementKind::In => row.units_in += mov.quantity as u64,
            MovementKind::Adjust => {}
        }
    }

    let mut rows: Vec<UsageRow> = rows.into_values().collect();
    rows.sort_by(|a, b| b.units_out.cmp(&a.units_out).then_with(|| a.part.cmp(&b.part)));
    rows
}

/// Purchasing overview
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OrderSummary {
    pub draft: usize,
    pub open: usize,
    pub received: usize,
    pub cancelled: usize,
    /// Value still to be delivered on open orders
    pub open_value: f64,
    /// Value of fully received orders
    pub received_spend: f64,
    /// Mean days from ordering to full receipt
    pub avg_lead_days: Option<f64>,
    pub spend_by_supplier: BTreeMap<String, f64>,
}

pub fn order_summary(orders: &[Order]) -> OrderSummary {
    let mut summary = OrderSummary::default();
    let mut lead_days = Vec::new();

    for order in orders {
        match order.order_status {
            OrderStatus::Draft => summary.draft += 1,
            OrderStatus::Ordered | OrderStatus::PartiallyReceived => {
                summary.open += 1;
                summary.open_value += order.outstanding_value();
            }
            OrderStatus::Received => {
                summary.received += 1;
                let total = order.total();
                summary.received_spend += total;
                *summary
                    .spend_by_supplier
                    .entry(order.supplier.clone())
                    .or_insert(0.0) += total;
                if let (Some(ordered), Some(received)) = (order.ordered_at, order.received_at) {
                    lead_days.push((received - ordered).num_seconds() as f64 / 86_400.0);
                }
            }
            OrderStatus::Cancelled => summary.cancelled += 1,
        }
    }

    if !lead_days.is_empty() {
        summary.avg_lead_days = Some(lead_days.iter().sum::<f64>() / lead_days.len() as f64);
    }
    summary
}

/// Cheapest quote still valid on `today`, per part
pub fn best_quotes(quotes: &[Quote], today: NaiveDate) -> BTreeMap<String, &Quote> {
    let mut best: BTreeMap<String, &Quote> = BTreeMap::new();
    for quote in quotes.iter().filter(|q| q.is_valid_on(today)) {
        best.entry(quote.part.clone())
            .and_modify(|current| {
                if quote.unit_price < current.unit_price {
                    *current = quote;
                }
            })
            .or_insert(quote);
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::identity::{EntityId, EntityPrefix};
    use crate::entities::part::PartCategory;
    use chrono::Duration;

    fn part(number: &str, qty: u32, min: u32, weekly: f64, price: f64) -> Part {
        let mut p = Part::new(number.into(), number.into(), "test".into());
        p.quantity = qty;
        p.min_stock = min;
        p.weekly_usage = weekly;
        p.lead_time_weeks = 2.0;
        p.unit_price = price;
        p
    }

    fn movement(part: &str, kind: MovementKind, qty: u32, age_days: i64) -> Movement {
        Movement {
            id: EntityId::new(EntityPrefix::Mov),
            part: part.into(),
            kind,
            quantity: qty,
            quantity_before: 100,
            quantity_after: 100,
            reason: None,
            reference: None,
            created: Utc::now() - Duration::days(age_days),
            author: "test".into(),
        }
    }

    #[test]
    fn test_inventory_summary() {
        let mut a = part("A", 0, 1, 1.0, 3.0);
        a.category = PartCategory::Fastener;
        let b = part("B", 2, 5, 1.0, 10.0);
        let mut c = part("C", 100, 1, 1.0, 1.5);
        c.facility = Some("FAC-1".into());

        let summary = inventory_summary(&[a, b, c]);
        assert_eq!(summary.part_count, 3);
        assert_eq!(summary.total_units, 102);
        assert_eq!(summary.total_value, 20.0 + 150.0);
        assert_eq!(summary.count(StockStatus::OutOfStock), 1);
        assert_eq!(summary.count(StockStatus::Critical), 1);
        assert_eq!(summary.count(StockStatus::ReorderNeeded), 0);
        assert_eq!(summary.count(StockStatus::Healthy), 1);
        assert_eq!(summary.needing_reorder(), 2);
        assert_eq!(summary.value_by_category["fastener"], 0.0);
        assert_eq!(summary.value_by_facility["FAC-1"], 150.0);
        assert_eq!(summary.value_by_facility["unassigned"], 20.0);
    }

    #[test]
    fn test_reorder_list_ordering() {
        let parts = vec![
            part("HEALTHY", 100, 1, 1.0, 1.0),
            part("REORDER-SLOW", 10, 1, 4.0, 1.0), // level 8 -> healthy
            part("REORDER-FAST", 10, 1, 10.0, 1.0), // level 20, 1 week cover
            part("REORDER-MID", 9, 1, 5.0, 1.0),    // level 10, 1.8 weeks cover
            part("CRIT", 1, 2, 0.0, 1.0),
            part("OUT", 0, 0, 0.0, 1.0),
        ];
        let list = reorder_list(&parts);
        let order: Vec<&str> = list.iter().map(|i| i.part.part_number.as_str()).collect();
        assert_eq!(order, vec!["OUT", "CRIT", "REORDER-FAST", "REORDER-MID"]);
        assert_eq!(list[2].assessment.suggested_order_qty, 10);
        assert_eq!(list[2].suggested_cost(), 10.0);
    }

    #[test]
    fn test_usage_since_window() {
        let movements = vec![
            movement("PART-A", MovementKind::Out, 5, 1),
            movement("PART-A", MovementKind::Out, 3, 2),
            movement("PART-A", MovementKind::In, 10, 2),
            movement("PART-B", MovementKind::Out, 20, 60),
            movement("PART-C", MovementKind::Out, 1, 3),
        ];
        let rows = usage_since(&movements, Utc::now() - Duration::days(30));
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].part, "PART-A");
        assert_eq!(rows[0].units_out, 8);
        assert_eq!(rows[0].units_in, 10);
        assert_eq!(rows[0].issues, 2);
        assert!((rows[0].weekly_rate(28) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_order_summary() {
        let now = Utc::now();
        let mut received = Order::new("SUP-1".into(), "test".into());
        received.add_line("PART-A".into(), 10, 2.0).unwrap();
        received.submit(now - Duration::days(4)).unwrap();
        received.receive(None, None, now).unwrap();

        let mut open = Order::new("SUP-2".into(), "test".into());
        open.add_line("PART-B".into(), 4, 5.0).unwrap();
        open.submit(now).unwrap();
        open.receive(Some(0), Some(1), now).unwrap();

        let draft = Order::new("SUP-2".into(), "test".into());

        let summary = order_summary(&[received, open, draft]);
        assert_eq!(summary.draft, 1);
        assert_eq!(summary.open, 1);
        assert_eq!(summary.received, 1);
        assert_eq!(summary.open_value, 15.0);
        assert_eq!(summary.received_spend, 20.0);
        assert_eq!(summary.spend_by_supplier["SUP-1"], 20.0);
        let lead = summary.avg_lead_days.unwrap();
        assert!((lead - 4.0).abs() < 1e-6);
    }

    #[test]
    fn test_best_quotes_skips_invalid() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let cheap_expired = {
            let mut q = Quote::new("SUP-1".into(), "PART-A".into(), 1.0, "test".into());
            q.valid_until = NaiveDate::from_ymd_opt(2024, 1, 1);
            q
        };
        let mid = Quote::new("SUP-2".into(), "PART-A".into(), 2.0, "test".into());
        let high = Quote::new("SUP-3".into(), "PART-A".into(), 3.0, "test".into());
        let quotes = vec![cheap_expired, high, mid];

        let best = best_quotes(&quotes, today);
        assert_eq!(best["PART-A"].supplier, "SUP-2");
    }
}
