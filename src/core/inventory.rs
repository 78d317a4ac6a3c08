//! Stock movements applied to parts
//!
//! Every quantity change goes through here so that the part and the
//! movement record it produces always agree.

use chrono::Utc;
use miette::Diagnostic;
use thiserror::Error;

use crate::core::entity::Entity;
use crate::core::identity::{EntityId, EntityPrefix};
use crate::entities::movement::{Movement, MovementKind};
use crate::entities::part::Part;

/// Errors raised when changing stock
#[derive(Debug, Error, Diagnostic, PartialEq, Eq)]
pub enum StockError {
    #[error("quantity must be greater than zero")]
    #[diagnostic(code(depot::stock::zero_quantity))]
    ZeroQuantity,

    #[error("cannot use {requested} of {part}: only {available} in stock")]
    #[diagnostic(
        code(depot::stock::insufficient),
        help("Receive stock first or correct the count with `depot part adjust`")
    )]
    Insufficient {
        part: String,
        requested: u32,
        available: u32,
    },

    #[error("receiving {requested} would overflow the quantity of {part}")]
    #[diagnostic(code(depot::stock::overflow))]
    Overflow { part: String, requested: u32 },

    #[error("count for {part} is already {quantity}")]
    #[diagnostic(code(depot::stock::no_change))]
    NoChange { part: String, quantity: u32 },
}

/// Context recorded on a movement
#[derive(Debug, Clone, Default)]
pub struct MovementContext {
    pub reason: Option<String>,
    pub reference: Option<String>,
    pub author: String,
}

fn record(part: &Part, kind: MovementKind, quantity: u32, before: u32, ctx: MovementContext) -> Movement {
    Movement {
        id: EntityId::new(EntityPrefix::Mov),
        part: part.id().to_string(),
        kind,
        quantity,
        quantity_before: before,
        quantity_after: part.quantity,
        reason: ctx.reason,
        reference: ctx.reference,
        created: Utc::now(),
        author: ctx.author,
    }
}

/// Issue stock (outbound); never takes the quantity below zero
pub fn use_part(part: &mut Part, quantity: u32, ctx: MovementContext) -> Result<Movement, StockError> {
    if quantity == 0 {
        return Err(StockError::ZeroQuantity);
    }
    let before = part.quantity;
    let after = before.checked_sub(quantity).ok_or_else(|| StockError::Insufficient {
        part: part.id().to_string(),
        requested: quantity,
        available: before,
    })?;

    part.quantity = after;
    part.touch();
    tracing::info!(part = %part.id, before, after, "stock issued");
    Ok(record(part, MovementKind::Out, quantity, before, ctx))
}

/// Receive stock (inbound)
pub fn receive_part(part: &mut Part, quantity: u32, ctx: MovementContext) -> Result<Movement, StockError> {
    if quantity == 0 {
        return Err(StockError::ZeroQuantity);
    }
    let before = part.quantity;
    let after = before.checked_add(quantity).ok_or_else(|| StockError::Overflow {
        part: part.id().to_string(),
        requested: quantity,
    })?;

    part.quantity = after;
    part.touch();
    tracing::info!(part = %part.id, before, after, "stock received");
    Ok(record(part, MovementKind::In, quantity, before, ctx))
}

/// Set the quantity to a physical count
pub fn adjust_part(part: &mut Part, counted: u32, ctx: MovementContext) -> Result<Movement, StockError> {
    let before = part.quantity;
    if counted == before {
        return Err(StockError::NoChange {
            part: part.id().to_string(),
            quantity: before,
        });
    }

    part.quantity = counted;
    part.touch();
    tracing::info!(part = %part.id, before, after = counted, "stock adjusted");
    Ok(record(part, MovementKind::Adjust, before.abs_diff(counted), before, ctx))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn part_with(qty: u32) -> Part {
        let mut part = Part::new("P-1".into(), "Seal kit".into(), "test".into());
        part.quantity = qty;
        part
    }

    fn ctx() -> MovementContext {
        MovementContext {
            author: "tester".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_use_part_decrements_and_records() {
        let mut part = part_with(10);
        let mov = use_part(&mut part, 3, ctx()).unwrap();
        assert_eq!(part.quantity, 7);
        assert_eq!(mov.kind, MovementKind::Out);
        assert_eq!((mov.quantity_before, mov.quantity_after), (10, 7));
        assert_eq!(mov.part, part.id.to_string());
        assert!(mov.validate().is_empty());
        assert_eq!(part.entity_revision, 2);
    }

    #[test]
    fn test_use_part_never_goes_negative() {
        let mut part = part_with(2);
        let err = use_part(&mut part, 3, ctx()).unwrap_err();
        assert!(matches!(err, StockError::Insufficient { requested: 3, available: 2, .. }));
        assert_eq!(part.quantity, 2);
        assert_eq!(part.entity_revision, 1);
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let mut part = part_with(2);
        assert_eq!(use_part(&mut part, 0, ctx()).unwrap_err(), StockError::ZeroQuantity);
        assert_eq!(receive_part(&mut part, 0, ctx()).unwrap_err(), StockError::ZeroQuantity);
    }

    #[test]
    fn test_receive_part_overflow() {
        let mut part = part_with(u32::MAX - 1);
        assert!(matches!(
            receive_part(&mut part, 2, ctx()),
            Err(StockError::Overflow { .. })
        ));
        let mov = receive_part(&mut part, 1, ctx()).unwrap();
        assert_eq!(mov.quantity_after, u32::MAX);
    }

    #[test]
    fn test_adjust_records_absolute_difference() {
        let mut part = part_with(10);
        let mov = adjust_part(&mut part, 4, ctx()).unwrap();
        assert_eq!(mov.quantity, 6);
        assert_eq!(mov.delta(), -6);
        assert!(mov.validate().is_empty());
        assert!(matches!(adjust_part(&mut part, 4, ctx()), Err(StockError::NoChange { .. })));
    }
}
