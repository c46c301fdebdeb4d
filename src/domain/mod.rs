//! Domain model for the storefront service.

pub mod aggregates;
pub mod events;
pub mod value_objects;
