//! Domain model module declarations.

pub mod catalog;
pub mod money;
pub mod order;
pub mod session;
