//! Household battery dispatch simulation and grid cost comparison.
//!
//! The [`core`] engine is a set of pure functions over an explicit battery configuration and an
//! aligned time series; [`dataset`] turns CSV files into such a series.

pub mod core;
pub mod dataset;
pub mod error;
pub mod prelude;
pub mod quantity;
