//! Purchase order entity and its receive workflow
//!
//! ```text
//! draft ──submit──> ordered ──receive──> partially_received ──receive──> received
//!   │                  │
//!   └──cancel──────────┴──> cancelled
//! ```

use chrono::{DateTime, Utc};
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::entity::{check_non_negative, check_not_blank, default_revision, Entity};
use crate::core::identity::{EntityId, EntityPrefix};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Draft,
    Ordered,
    PartiallyReceived,
    Received,
    Cancelled,
}

impl OrderStatus {
    /// Still expecting goods
    pub fn is_open(&self) -> bool {
        matches!(self, OrderStatus::Ordered | OrderStatus::PartiallyReceived)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatus::Draft => write!(f, "draft"),
            OrderStatus::Ordered => write!(f, "ordered"),
            OrderStatus::PartiallyReceived => write!(f, "partially_received"),
            OrderStatus::Received => write!(f, "received"),
            OrderStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "draft" => Ok(OrderStatus::Draft),
            "ordered" => Ok(OrderStatus::Ordered),
            "partially_received" | "partial" => Ok(OrderStatus::PartiallyReceived),
            "received" => Ok(OrderStatus::Received),
            "cancelled" | "canceled" => Ok(OrderStatus::Cancelled),
            _ => Err(format!(
                "Invalid order status: {}. Use draft, ordered, partially_received, received, or cancelled",
                s
            )),
        }
    }
}

/// One part on a purchase order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    /// Part ordered (PART-...)
    pub part: String,

    /// Units ordered
    pub quantity: u32,

    /// Units received so far
    #[serde(default)]
    pub received: u32,

    #[serde(default)]
    pub unit_price: f64,
}

impl OrderLine {
    pub fn outstanding(&self) -> u32 {
        self.quantity.saturating_sub(self.received)
    }

    pub fn line_total(&self) -> f64 {
        self.quantity as f64 * self.unit_price
    }
}

/// Errors raised by order workflow transitions
#[derive(Debug, Error, Diagnostic, PartialEq)]
pub enum OrderError {
    #[error("order is {current}, expected {expected}")]
    #[diagnostic(code(depot::order::state))]
    InvalidState { current: OrderStatus, expected: &'static str },

    #[error("order has no lines")]
    #[diagnostic(code(depot::order::empty), help("Add lines with `depot order add-line`"))]
    Empty,

    /// Holds the 0-based line index; messages show the 1-based line number
    #[error("order has no line {}", .0 + 1)]
    #[diagnostic(code(depot::order::line))]
    NoSuchLine(usize),

    #[error("cannot receive {} units on line {}: only {} outstanding", .requested, .line + 1, .outstanding)]
    #[diagnostic(code(depot::order::over_receipt))]
    OverReceipt { line: usize, requested: u32, outstanding: u32 },

    #[error("quantity must be greater than zero")]
    #[diagnostic(code(depot::order::quantity))]
    ZeroQuantity,
}

/// A receipt against one order line
#[derive(Debug, Clone, PartialEq)]
pub struct Receipt {
    pub line: usize,
    pub part: String,
    pub quantity: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Unique identifier (ORD-...)
    pub id: EntityId,

    /// Supplier ordered from (SUP-...)
    pub supplier: String,

    /// Receiving facility (FAC-...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facility: Option<String>,

    #[serde(default)]
    pub order_status: OrderStatus,

    #[serde(default)]
    pub lines: Vec<OrderLine>,

    /// Supplier-facing PO reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ordered_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub received_at: Option<DateTime<Utc>>,

    pub created: DateTime<Utc>,

    pub author: String,

    #[serde(default = "default_revision")]
    pub entity_revision: u32,
}

impl Entity for Order {
    const PREFIX: EntityPrefix = EntityPrefix::Ord;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn title(&self) -> &str {
        self.reference.as_deref().unwrap_or("")
    }

    fn created(&self) -> DateTime<Utc> {
        self.created
    }

    fn author(&self) -> &str {
        &self.author
    }

    fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        check_not_blank(&mut issues, "supplier", &self.supplier);
        for (i, line) in self.lines.iter().enumerate() {
            if line.quantity == 0 {
                issues.push(format!("lines[{}] quantity must be greater than zero", i));
            }
            if line.received > line.quantity {
                issues.push(format!(
                    "lines[{}] received {} exceeds ordered {}",
                    i, line.received, line.quantity
                ));
            }
            check_non_negative(&mut issues, &format!("lines[{}].unit_price", i), line.unit_price);
        }
        if self.order_status != OrderStatus::Draft && self.lines.is_empty() {
            issues.push(format!("{} order has no lines", self.order_status));
        }
        issues
    }
}

impl Order {
    pub fn new(supplier: String, author: String) -> Self {
        Self {
            id: EntityId::new(EntityPrefix::Ord),
            supplier,
            facility: None,
            order_status: OrderStatus::Draft,
            lines: Vec::new(),
            reference: None,
            notes: None,
            ordered_at: None,
            received_at: None,
            created: Utc::now(),
            author,
            entity_revision: 1,
        }
    }

    fn require(&self, allowed: &[OrderStatus], expected: &'static str) -> Result<(), OrderError> {
        if allowed.contains(&self.order_status) {
            Ok(())
        } else {
            Err(OrderError::InvalidState {
                current: self.order_status,
                expected,
            })
        }
    }

    /// Add a line (draft only); merges with an existing line for the same part
    pub fn add_line(&mut self, part: String, quantity: u32, unit_price: f64) -> Result<(), OrderError> {
        self.require(&[OrderStatus::Draft], "draft")?;
        if quantity == 0 {
            return Err(OrderError::ZeroQuantity);
        }
        if let Some(line) = self.lines.iter_mut().find(|l| l.part == part) {
            line.quantity = line.quantity.saturating_add(quantity);
            line.unit_price = unit_price;
        } else {
            self.lines.push(OrderLine {
                part,
                quantity,
                received: 0,
                unit_price,
            });
        }
        self.entity_revision += 1;
        Ok(())
    }

    /// Place the order with the supplier
    pub fn submit(&mut self, at: DateTime<Utc>) -> Result<(), OrderError> {
        self.require(&[OrderStatus::Draft], "draft")?;
        if self.lines.is_empty() {
            return Err(OrderError::Empty);
        }
        self.order_status = OrderStatus::Ordered;
        self.ordered_at = Some(at);
        self.entity_revision += 1;
        Ok(())
    }

    pub fn cancel(&mut self) -> Result<(), OrderError> {
        self.require(&[OrderStatus::Draft, OrderStatus::Ordered], "draft or ordered")?;
        self.order_status = OrderStatus::Cancelled;
        self.entity_revision += 1;
        Ok(())
    }

    /// Receive goods against the order
    ///
    /// `line = None` receives everything outstanding. With a line index,
    /// `quantity = None` receives that line's outstanding units. Returns the
    /// receipts so the caller can book stock movements.
    pub fn receive(
        &mut self,
        line: Option<usize>,
        quantity: Option<u32>,
        at: DateTime<Utc>,
    ) -> Result<Vec<Receipt>, OrderError> {
        self.require(
            &[OrderStatus::Ordered, OrderStatus::PartiallyReceived],
            "ordered or partially_received",
        )?;

        let mut receipts = Vec::new();
        match line {
            Some(idx) => {
                let l = self.lines.get_mut(idx).ok_or(OrderError::NoSuchLine(idx))?;
                let outstanding = l.outstanding();
                let qty = quantity.unwrap_or(outstanding);
                if qty == 0 {
                    return Err(OrderError::ZeroQuantity);
                }
                if qty > outstanding {
                    return Err(OrderError::OverReceipt {
                        line: idx,
                        requested: qty,
                        outstanding,
                    });
                }
                l.received += qty;
                receipts.push(Receipt {
                    line: idx,
                    part: l.part.clone(),
                    quantity: qty,
                });
            }
            None => {
                for (idx, l) in self.lines.iter_mut().enumerate() {
                    let qty = l.outstanding();
                    if qty > 0 {
                        l.received += qty;
                        receipts.push(Receipt {
                            line: idx,
                            part: l.part.clone(),
                            quantity: qty,
                        });
                    }
                }
            }
        }

        if self.lines.iter().all(|l| l.outstanding() == 0) {
            self.order_status = OrderStatus::Received;
            self.received_at = Some(at);
        } else {
            self.order_status = OrderStatus::PartiallyReceived;
        }
        self.entity_revision += 1;
        Ok(receipts)
    }

    pub fn total(&self) -> f64 {
        self.lines.iter().map(OrderLine::line_total).sum()
    }

    /// Value of units not yet received
    pub fn outstanding_value(&self) -> f64 {
        self.lines
            .iter()
            .map(|l| l.outstanding() as f64 * l.unit_price)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order_with_lines() -> Order {
        let mut order = Order::new("SUP-1".into(), "test".into());
        order.add_line("PART-A".into(), 10, 2.0).unwrap();
        order.add_line("PART-B".into(), 4, 5.0).unwrap();
        order
    }

    #[test]
    fn test_submit_requires_lines() {
        let mut order = Order::new("SUP-1".into(), "test".into());
        assert_eq!(order.submit(Utc::now()), Err(OrderError::Empty));

        let mut order = order_with_lines();
        order.submit(Utc::now()).unwrap();
        assert_eq!(order.order_status, OrderStatus::Ordered);
        assert!(order.ordered_at.is_some());
        assert!(matches!(
            order.add_line("PART-C".into(), 1, 1.0),
            Err(OrderError::InvalidState { .. })
        ));
    }

    #[test]
    fn test_partial_then_full_receipt() {
        let mut order = order_with_lines();
        order.submit(Utc::now()).unwrap();

        let receipts = order.receive(Some(0), Some(4), Utc::now()).unwrap();
        assert_eq!(receipts, vec![Receipt { line: 0, part: "PART-A".into(), quantity: 4 }]);
        assert_eq!(order.order_status, OrderStatus::PartiallyReceived);
        assert_eq!(order.outstanding_value(), 6.0 * 2.0 + 4.0 * 5.0);

        let receipts = order.receive(None, None, Utc::now()).unwrap();
        assert_eq!(receipts.len(), 2);
        assert_eq!(receipts[0].quantity, 6);
        assert_eq!(order.order_status, OrderStatus::Received);
        assert!(order.received_at.is_some());
        assert!(order.validate().is_empty());
    }

    #[test]
    fn test_over_receipt_rejected() {
        let mut order = order_with_lines();
        order.submit(Utc::now()).unwrap();
        let err = order.receive(Some(1), Some(5), Utc::now()).unwrap_err();
        assert_eq!(
            err,
            OrderError::OverReceipt { line: 1, requested: 5, outstanding: 4 }
        );
        assert_eq!(order.order_status, OrderStatus::Ordered);
        assert_eq!(order.receive(Some(7), None, Utc::now()), Err(OrderError::NoSuchLine(7)));
    }

    #[test]
    fn test_line_errors_use_one_based_numbers() {
        let mut order = order_with_lines();
        order.submit(Utc::now()).unwrap();

        let err = order.receive(Some(1), Some(9), Utc::now()).unwrap_err();
        assert_eq!(err.to_string(), "cannot receive 9 units on line 2: only 4 outstanding");

        let err = order.receive(Some(7), None, Utc::now()).unwrap_err();
        assert_eq!(err.to_string(), "order has no line 8");
    }

    #[test]
    fn test_receive_requires_submitted_order() {
        let mut order = order_with_lines();
        assert!(matches!(
            order.receive(None, None, Utc::now()),
            Err(OrderError::InvalidState { current: OrderStatus::Draft, .. })
        ));
    }

    #[test]
    fn test_cancel_rules() {
        let mut order = order_with_lines();
        order.cancel().unwrap();
        assert_eq!(order.order_status, OrderStatus::Cancelled);
        assert!(order.submit(Utc::now()).is_err());

        let mut received = order_with_lines();
        received.submit(Utc::now()).unwrap();
        received.receive(None, None, Utc::now()).unwrap();
        assert!(received.cancel().is_err());
    }

    #[test]
    fn test_add_line_merges_and_totals() {
        let mut order = order_with_lines();
        order.add_line("PART-A".into(), 5, 1.5).unwrap();
        assert_eq!(order.lines.len(), 2);
        assert_eq!(order.lines[0].quantity, 15);
        assert_eq!(order.total(), 15.0 * 1.5 + 4.0 * 5.0);
        assert_eq!(order.add_line("PART-C".into(), 0, 1.0), Err(OrderError::ZeroQuantity));
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!("partially-received".parse::<OrderStatus>().unwrap(), OrderStatus::PartiallyReceived);
        assert_eq!("canceled".parse::<OrderStatus>().unwrap(), OrderStatus::Cancelled);
        assert!(OrderStatus::Ordered.is_open());
        assert!(!OrderStatus::Draft.is_open());
    }
}
