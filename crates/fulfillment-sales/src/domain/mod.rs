//! Domain layer for the Sales context.

pub mod commands;
pub mod order;
pub mod repository;
pub mod stock;
