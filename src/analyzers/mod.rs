//! Rent aggregation, trend estimation and the affordability view.
//!
//! Every function here is pure: complete canonical tables in, complete
//! derived tables out.

pub mod affordability;
pub mod aggregate;
pub mod risk;
pub mod trend;
pub mod utility;
