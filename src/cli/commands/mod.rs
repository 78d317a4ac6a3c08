//! CLI command implementations

pub mod asm;
pub mod completions;
pub mod export;
pub mod facility;
pub mod hotspot;
pub mod init;
pub mod machine;
pub mod movement;
pub mod order;
pub mod part;
pub mod quote;
pub mod report;
pub mod status;
pub mod sup;
pub mod validate;
pub mod where_used;
