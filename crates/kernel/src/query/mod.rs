//! Dynamic conference query compilation.
//!
//! Turns caller-supplied `(field, operator, value)` filters into a validated,
//! correctly-ordered query plan for the storage backend.

pub mod catalog;
pub mod compiler;
pub mod planner;

pub use catalog::{ConferenceField, FilterOp};
pub use compiler::{CompiledFilters, FilterCompiler, FilterValue, Predicate, RawFilter};
pub use planner::{QueryPlan, QueryPlanner};

use thiserror::Error;

use crate::error::AppError;

/// Errors produced while compiling a filter list.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    /// Unknown field token, unknown operator token, or an uncoercible value.
    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    /// Inequality operators were applied to more than one distinct field.
    #[error("inequality filter is allowed on only one field")]
    MultipleInequalityFields,
}

impl From<QueryError> for AppError {
    fn from(err: QueryError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}
