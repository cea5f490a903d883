//! Domain layer for the Inventory context.

pub mod commands;
pub mod product;
pub mod repository;
