//! Core module - fundamental types and utilities

pub mod analytics;
pub mod bom;
pub mod config;
pub mod entity;
pub mod identity;
pub mod inventory;
pub mod loader;
pub mod logging;
pub mod project;
pub mod shortid;
pub mod stock;

pub use config::Config;
pub use entity::Entity;
pub use identity::{EntityId, EntityPrefix, IdParseError};
pub use inventory::{MovementContext, StockError};
pub use project::{Project, ProjectError};
pub use shortid::ShortIdIndex;
pub use stock::{StockAssessment, StockStatus};
