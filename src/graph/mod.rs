//! Schema graph selection and rendering.
//!
//! This module provides:
//! - Table selection from a filter (schemas, table names,
//!   relationship-expansion depth)
//! - GraphViz DOT rendering of the selected tables in two modes

mod dot;
mod select;

pub use dot::{to_dot, RenderMode};
pub use select::{select, Expansion, TableFilter};
