use super::roles::{AttributeSpec, MappingError, RoleMapping};
use crate::filter::{DateRange, parse_date};
use chrono::NaiveDate;
use indexmap::IndexMap;

/// Attribute name to raw value, in declaration order.
pub type Attributes = IndexMap<String, String>;

/// One row of the uploaded table, keyed by column name.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    fields: IndexMap<String, String>,
}

impl Record {
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            fields: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields.get(column).map(String::as_str)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Project the record onto a group of attribute specs.
    /// Returns `None` when any of the mapped columns is absent.
    pub fn project(&self, specs: &[AttributeSpec]) -> Option<Attributes> {
        specs
            .iter()
            .map(|spec| {
                self.get(&spec.name)
                    .map(|value| (spec.attribute.clone(), value.to_string()))
            })
            .collect()
    }

    /// Parsed value of the mapped date column, if any.
    pub fn date(&self, mapping: &RoleMapping) -> Option<NaiveDate> {
        let spec = mapping.date()?;
        self.get(&spec.name).and_then(parse_date)
    }
}

/// The parsed table together with the role mapping it was validated against.
#[derive(Debug, Clone)]
pub struct RecordStore {
    header: Vec<String>,
    records: Vec<Record>,
    mapping: RoleMapping,
}

impl RecordStore {
    pub fn new(
        header: Vec<String>,
        records: Vec<Record>,
        mapping: RoleMapping,
    ) -> Result<Self, MappingError> {
        mapping.validate(&header)?;
        Ok(Self {
            header,
            records,
            mapping,
        })
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn mapping(&self) -> &RoleMapping {
        &self.mapping
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Earliest and latest parseable date across the whole table.
    pub fn date_bounds(&self) -> Option<DateRange> {
        let mut dates = self.records.iter().filter_map(|r| r.date(&self.mapping));
        let first = dates.next()?;
        let (start, end) = dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d)));
        Some(DateRange { start, end })
    }
}
