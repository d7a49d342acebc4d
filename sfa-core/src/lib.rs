//! Core record types and table loading for temperature and sap-flow data.
//!
//! Input tables are produced by the acquisition layer and are assumed to be
//! well-formed; see [`table`] for the accepted layouts.

pub mod date_range;
pub mod error;
pub mod reading;
pub mod table;
pub mod tree;
