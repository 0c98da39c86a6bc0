use super::FilterError;
use super::date::{DateFilter, DateRange};
use crate::model::{Record, RecordStore, RoleMapping, Side};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

/// Which node side a filter is evaluated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    Source,
    Target,
    #[default]
    Both,
}

impl FilterKind {
    /// Kind of a filter over an attribute mapped on `sides`.
    pub fn for_sides(sides: &[Side]) -> Self {
        match sides {
            [Side::Source] => FilterKind::Source,
            [Side::Target] => FilterKind::Target,
            _ => FilterKind::Both,
        }
    }

    pub fn applies_to(self, side: Side) -> bool {
        match self {
            FilterKind::Source => side == Side::Source,
            FilterKind::Target => side == Side::Target,
            FilterKind::Both => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Operand {
    #[default]
    Equals,
}

/// A categorical filter over one node attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub attribute: String,
    pub kind: FilterKind,
    pub values: IndexSet<String>,
    #[serde(default)]
    pub operand: Operand,
}

impl Filter {
    pub fn new(attribute: impl Into<String>, kind: FilterKind) -> Self {
        Self {
            attribute: attribute.into(),
            kind,
            values: IndexSet::new(),
            operand: Operand::Equals,
        }
    }

    pub fn check_match(&self, value: &str) -> bool {
        check_match(self, value)
    }
}

pub fn check_match(filter: &Filter, value: &str) -> bool {
    match filter.operand {
        Operand::Equals => filter.values.contains(value),
    }
}

/// Distinct values of a node attribute across every side that maps it,
/// in first-seen order.
pub fn collect_domain(records: &[Record], mapping: &RoleMapping, attribute: &str) -> IndexSet<String> {
    let sides = mapping.sides_with(attribute);
    let mut domain = IndexSet::new();

    for record in records {
        for side in &sides {
            let Some(node) = record.project(mapping.group(*side)) else {
                continue;
            };
            if let Some(value) = node.get(attribute) {
                if !domain.contains(value) {
                    domain.insert(value.clone());
                }
            }
        }
    }

    domain
}

/// Non-destructive result of applying filters to the record store: which
/// record sides still yield a node and which records may still yield a link.
#[derive(Debug, Clone)]
pub struct RecordSelection<'a> {
    records: &'a [Record],
    side_excluded: Vec<[bool; 2]>,
    link_excluded: Vec<bool>,
}

impl<'a> RecordSelection<'a> {
    /// Selection that keeps everything.
    pub fn all(records: &'a [Record]) -> Self {
        Self {
            records,
            side_excluded: vec![[false; 2]; records.len()],
            link_excluded: vec![false; records.len()],
        }
    }

    pub fn records(&self) -> &'a [Record] {
        self.records
    }

    pub fn side_included(&self, index: usize, side: Side) -> bool {
        !self.side_excluded[index][side.index()]
    }

    pub fn link_included(&self, index: usize) -> bool {
        !self.link_excluded[index]
    }

    pub fn excluded_sides(&self, side: Side) -> usize {
        self.side_excluded
            .iter()
            .filter(|flags| flags[side.index()])
            .count()
    }
}

/// Apply categorical filters and the date filter without touching `records`.
pub fn apply_filters<'a>(
    records: &'a [Record],
    filters: &[Filter],
    date: Option<&DateFilter>,
    mapping: &RoleMapping,
) -> RecordSelection<'a> {
    let mut selection = RecordSelection::all(records);

    for (index, record) in records.iter().enumerate() {
        for side in Side::BOTH {
            let Some(node) = record.project(mapping.group(side)) else {
                continue;
            };
            let rejected = filters
                .iter()
                .filter(|f| f.kind.applies_to(side))
                .any(|f| match node.get(&f.attribute) {
                    Some(value) => !f.check_match(value),
                    None => false,
                });
            selection.side_excluded[index][side.index()] = rejected;
        }

        if let Some(date_filter) = date {
            selection.link_excluded[index] = !date_filter.accepts(record.date(mapping));
        }
    }

    tracing::debug!(
        records = records.len(),
        excluded_sources = selection.excluded_sides(Side::Source),
        excluded_targets = selection.excluded_sides(Side::Target),
        "applied filters"
    );

    selection
}

/// Holds the active attribute filters and the date filter.
#[derive(Debug, Clone, Default)]
pub struct FilterEngine {
    filters: Vec<Filter>,
    date: Option<DateFilter>,
}

impl FilterEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a filter with an empty value set. Returns the existing filter
    /// if the attribute already has one.
    pub fn add_filter(&mut self, attribute: &str, kind: FilterKind) -> &Filter {
        let index = match self.position(attribute) {
            Some(index) => index,
            None => {
                self.filters.push(Filter::new(attribute, kind));
                self.filters.len() - 1
            }
        };
        &self.filters[index]
    }

    /// Register one all-selected filter per node attribute and set up the date
    /// filter from the dataset bounds. Returns the domain of every attribute.
    pub fn seed_from_store(&mut self, store: &RecordStore) -> IndexMap<String, IndexSet<String>> {
        let mapping = store.mapping();
        let mut domains = IndexMap::new();

        for attribute in mapping.node_attributes() {
            let kind = FilterKind::for_sides(&mapping.sides_with(attribute));
            let domain = collect_domain(store.records(), mapping, attribute);

            self.add_filter(attribute, kind);
            if let Some(index) = self.position(attribute) {
                self.filters[index].values = domain.clone();
            }
            domains.insert(attribute.to_string(), domain);
        }

        self.date = store.date_bounds().map(DateFilter::new);
        domains
    }

    /// Replace the accepted values of a filter.
    pub fn set_filter_values<I, S>(&mut self, attribute: &str, values: I) -> Result<(), FilterError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let index = self
            .position(attribute)
            .ok_or_else(|| FilterError::UnknownAttribute(attribute.to_string()))?;
        self.filters[index].values = values.into_iter().map(Into::into).collect();
        Ok(())
    }

    pub fn filter(&self, attribute: &str) -> Option<&Filter> {
        self.filters.iter().find(|f| f.attribute == attribute)
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn has_filter(&self, attribute: &str) -> bool {
        self.position(attribute).is_some()
    }

    pub fn date_filter(&self) -> Option<&DateFilter> {
        self.date.as_ref()
    }

    pub fn set_date_bounds(&mut self, bounds: DateRange) {
        self.date = Some(DateFilter::new(bounds));
    }

    pub fn select_date_range(&mut self, range: DateRange) -> Result<(), FilterError> {
        let filter = self.date.as_mut().ok_or(FilterError::NoDateAttribute)?;
        filter.select(range);
        Ok(())
    }

    pub fn clear_date_range(&mut self) {
        if let Some(filter) = self.date.as_mut() {
            filter.clear();
        }
    }

    pub fn apply<'a>(&self, records: &'a [Record], mapping: &RoleMapping) -> RecordSelection<'a> {
        apply_filters(records, &self.filters, self.date.as_ref(), mapping)
    }

    fn position(&self, attribute: &str) -> Option<usize> {
        self.filters.iter().position(|f| f.attribute == attribute)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::roles::tests::enron_mapping;
    use chrono::NaiveDate;

    fn record(from: &str, from_job: &str, to: &str, to_job: &str, date: &str) -> Record {
        Record::from_pairs([
            ("date", date),
            ("fromEmail", from),
            ("fromJobtitle", from_job),
            ("toEmail", to),
            ("toJobtitle", to_job),
            ("messageType", "TO"),
            ("sentiment", "0.1"),
        ])
    }

    fn records() -> Vec<Record> {
        vec![
            record("a", "CEO", "b", "Trader", "2001-01-01"),
            record("b", "Trader", "c", "CEO", "2001-01-02"),
            record("c", "CEO", "a", "Trader", "2001-01-03"),
        ]
    }

    #[test]
    fn test_check_match_is_set_membership() {
        let mut filter = Filter::new("jobtitle", FilterKind::Both);
        assert!(!filter.check_match("CEO"));

        filter.values.insert("CEO".to_string());
        assert!(filter.check_match("CEO"));
        assert!(!filter.check_match("ceo"));
    }

    #[test]
    fn test_collect_domain_first_seen_order() {
        let domain = collect_domain(&records(), &enron_mapping(), "email");
        assert_eq!(domain.into_iter().collect::<Vec<_>>(), vec!["a", "b", "c"]);

        let jobs = collect_domain(&records(), &enron_mapping(), "jobtitle");
        assert_eq!(jobs.into_iter().collect::<Vec<_>>(), vec!["CEO", "Trader"]);
    }

    #[test]
    fn test_source_filter_leaves_targets_alone() {
        let records = records();
        let mapping = enron_mapping();
        let mut filter = Filter::new("jobtitle", FilterKind::Source);
        filter.values.insert("Trader".to_string());

        let selection = apply_filters(&records, &[filter], None, &mapping);

        assert!(!selection.side_included(0, Side::Source));
        assert!(selection.side_included(1, Side::Source));
        assert!(!selection.side_included(2, Side::Source));
        assert_eq!(selection.excluded_sides(Side::Target), 0);
    }

    #[test]
    fn test_target_filter_leaves_sources_alone() {
        let records = records();
        let mapping = enron_mapping();
        let filter = Filter::new("jobtitle", FilterKind::Target);

        let selection = apply_filters(&records, &[filter], None, &mapping);

        assert_eq!(selection.excluded_sides(Side::Target), 3);
        assert_eq!(selection.excluded_sides(Side::Source), 0);
    }

    #[test]
    fn test_filter_on_unmapped_attribute_excludes_nothing() {
        let records = records();
        let filter = Filter::new("department", FilterKind::Both);

        let selection = apply_filters(&records, &[filter], None, &enron_mapping());
        assert_eq!(selection.excluded_sides(Side::Source), 0);
        assert_eq!(selection.excluded_sides(Side::Target), 0);
    }

    #[test]
    fn test_apply_does_not_mutate_records() {
        let records = records();
        let before = records.clone();
        let mut engine = FilterEngine::new();
        engine.add_filter("email", FilterKind::Both);

        let _ = engine.apply(&records, &enron_mapping());
        assert_eq!(records, before);
    }

    #[test]
    fn test_set_values_unknown_attribute() {
        let mut engine = FilterEngine::new();
        assert_eq!(
            engine.set_filter_values("jobtitle", ["CEO"]),
            Err(FilterError::UnknownAttribute("jobtitle".to_string()))
        );
    }

    #[test]
    fn test_date_range_marks_links() {
        let records = records();
        let mapping = enron_mapping();
        let mut engine = FilterEngine::new();
        let day = |d| NaiveDate::from_ymd_opt(2001, 1, d).unwrap();

        assert_eq!(
            engine.select_date_range(DateRange::new(day(1), day(2)).unwrap()),
            Err(FilterError::NoDateAttribute)
        );

        engine.set_date_bounds(DateRange::new(day(1), day(3)).unwrap());
        engine
            .select_date_range(DateRange::new(day(2), day(3)).unwrap())
            .unwrap();
        let selection = engine.apply(&records, &mapping);

        assert!(!selection.link_included(0));
        assert!(selection.link_included(1));
        assert!(selection.link_included(2));
    }
}
