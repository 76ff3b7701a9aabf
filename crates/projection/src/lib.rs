//! Coordinate reference system transformations.
//!
//! Implements the HRRR native projection from scratch without external dependencies.

pub mod lambert;

pub use lambert::LambertConformal;
