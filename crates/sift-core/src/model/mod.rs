//! Work item vocabulary the filter criteria operate over.

pub mod item;

pub use item::{Direction, ItemState, OrderBy, UnknownState};
