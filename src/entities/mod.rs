//! Record type definitions
//!
//! **Inventory:**
//! - [`Part`] - Stocked items with usage rates and reorder inputs
//! - [`Movement`] - Append-only stock changes (in, out, adjust)
//! - [`Facility`] - Sites holding stock and machines
//!
//! **Maintenance:**
//! - [`Machine`] - Equipment maintained from stock
//! - [`Assembly`] - Machine sub-structures with parts lists
//! - [`Hotspot`] - Drawing callouts linking to parts or sub-assemblies
//!
//! **Purchasing:**
//! - [`Supplier`] - Vendors
//! - [`Quote`] - Supplier price offers
//! - [`Order`] - Purchase orders with a receive workflow

pub mod assembly;
pub mod facility;
pub mod hotspot;
pub mod machine;
pub mod movement;
pub mod order;
pub mod part;
pub mod quote;
pub mod supplier;

pub use assembly::Assembly;
pub use facility::Facility;
pub use hotspot::Hotspot;
pub use machine::Machine;
pub use movement::Movement;
pub use order::Order;
pub use part::Part;
pub use quote::Quote;
pub use supplier::Supplier;
