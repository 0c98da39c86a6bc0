use super::FilterError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%Y"];

/// Display format of dataset bounds in the interchange payload.
pub const BOUND_FORMAT: &str = "%m/%d/%Y";

/// Parse a raw date cell. Accepts `YYYY-MM-DD` and `MM/DD/YYYY`, optionally
/// followed by a time part, which is ignored.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let day = raw.split([' ', 'T']).next().unwrap_or(raw);

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(day, fmt).ok())
}

pub fn format_bound(date: NaiveDate) -> String {
    date.format(BOUND_FORMAT).to_string()
}

/// Inclusive range of days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, FilterError> {
        if start > end {
            return Err(FilterError::InvalidDateRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Bounds as `[start, end]` strings in `MM/DD/YYYY`.
    pub fn formatted(&self) -> [String; 2] {
        [format_bound(self.start), format_bound(self.end)]
    }
}

/// Dataset-wide bounds plus the range currently selected by the user.
/// The filter is inactive until a range is selected.
#[derive(Debug, Clone, PartialEq)]
pub struct DateFilter {
    bounds: DateRange,
    selected: Option<DateRange>,
}

impl DateFilter {
    pub fn new(bounds: DateRange) -> Self {
        Self {
            bounds,
            selected: None,
        }
    }

    pub fn bounds(&self) -> DateRange {
        self.bounds
    }

    pub fn selected(&self) -> Option<DateRange> {
        self.selected
    }

    pub fn is_active(&self) -> bool {
        self.selected.is_some()
    }

    pub fn select(&mut self, range: DateRange) {
        self.selected = Some(range);
    }

    pub fn clear(&mut self) {
        self.selected = None;
    }

    /// Whether a link dated `date` passes. Undated links only pass while the
    /// filter is inactive.
    pub fn accepts(&self, date: Option<NaiveDate>) -> bool {
        match (self.selected, date) {
            (None, _) => true,
            (Some(range), Some(date)) => range.contains(date),
            (Some(_), None) => false,
        }
    }
}
