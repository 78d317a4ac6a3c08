//! Depot: maintenance warehouse toolkit
//!
//! Tracks spare parts, machines and purchasing as plain YAML records in a
//! project directory, with reorder-level analysis over the stock on hand.

pub mod cli;
pub mod core;
pub mod entities;
pub mod yaml;
