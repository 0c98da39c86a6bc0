mod date;
mod engine;

pub use date::{BOUND_FORMAT, DateFilter, DateRange, format_bound, parse_date};
pub use engine::{
    Filter, FilterEngine, FilterKind, Operand, RecordSelection, apply_filters, check_match,
    collect_domain,
};

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum FilterError {
    #[error("No filter registered for attribute '{0}'")]
    UnknownAttribute(String),
    #[error("Date range start {start} is after end {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },
    #[error("The dataset has no date attribute to filter on")]
    NoDateAttribute,
}
