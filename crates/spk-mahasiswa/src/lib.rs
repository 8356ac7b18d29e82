//! Decision support for student potential mapping and scholarship applicant ranking.
//!
//! The `potential` workflow turns a graded roster into potential tiers with a fitted
//! clustering model and merges applicant lists against the classified roster. The `saw`
//! workflow normalizes applicant scores against externally managed criteria and ranks them
//! with Simple Additive Weighting.

pub mod config;
pub mod error;
pub mod snapshot;
pub mod table;
pub mod telemetry;
pub mod workflows;

pub use error::{AppError, ErrorKind};
pub use table::{Cell, ScoreTable, TableError};
