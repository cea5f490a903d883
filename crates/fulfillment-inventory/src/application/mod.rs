//! Application layer for the Inventory context.

pub mod command_handlers;
pub mod query_handlers;
