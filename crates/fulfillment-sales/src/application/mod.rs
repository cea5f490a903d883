//! Application layer for the Sales context.

pub mod command_handlers;
pub mod query_handlers;
