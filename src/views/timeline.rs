use super::{HighlightTarget, ViewKind, ViewPayload, ViewSettings, ViewState, Visualization};
use crate::filter::{DateRange, Filter};
use crate::graph::{NumericPolicy, coerce_numeric};
use crate::model::{GraphView, Link, RecordStore};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Links of one day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateBucket {
    pub date: NaiveDate,
    pub count: usize,
    /// Mean main attribute, `None` when no link of the day had a number.
    pub mean: Option<f64>,
}

/// Buckets around the one closest to the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HoverWindow {
    pub index: usize,
    pub left: usize,
    pub right: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelinePayload {
    pub main_attribute: String,
    pub buckets: Vec<DateBucket>,
    pub count_max: usize,
    pub mean_min: Option<f64>,
    pub mean_max: Option<f64>,
    pub hover_window: usize,
    pub selected: Option<DateRange>,
    pub highlight: Option<HighlightTarget>,
    pub highlighted_dates: Vec<NaiveDate>,
}

/// Link count and mean main attribute per day.
#[derive(Debug, Clone)]
pub struct LineDiagram {
    state: ViewState,
    policy: NumericPolicy,
    hover_window: usize,
    main_attribute: String,
    buckets: Vec<DateBucket>,
}

impl LineDiagram {
    pub(crate) fn new(state: ViewState, settings: &ViewSettings) -> Self {
        Self {
            state,
            policy: settings.numeric_policy,
            hover_window: settings.hover_window,
            main_attribute: String::new(),
            buckets: Vec::new(),
        }
    }

    pub fn buckets(&self) -> &[DateBucket] {
        &self.buckets
    }

    /// Window around the bucket nearest to `date`. Ties go to the earlier day.
    pub fn window_at(&self, date: NaiveDate) -> Option<HoverWindow> {
        let (index, _) = self
            .buckets
            .iter()
            .enumerate()
            .min_by_key(|(_, b)| (b.date - date).num_days().abs())?;

        Some(HoverWindow {
            index,
            left: index.saturating_sub(self.hover_window),
            right: (index + self.hover_window).min(self.buckets.len() - 1),
        })
    }

    /// Date range a click at `date` selects: the dates of the hover window edges.
    pub fn click_range(&self, date: NaiveDate) -> Option<DateRange> {
        let window = self.window_at(date)?;
        Some(DateRange {
            start: self.buckets[window.left].date,
            end: self.buckets[window.right].date,
        })
    }

    fn bucketize(&self, links: &[Link]) -> Vec<DateBucket> {
        // date -> (count, numeric count, sum)
        let mut days: BTreeMap<NaiveDate, (usize, usize, f64)> = BTreeMap::new();

        for link in links {
            let Some(date) = link.date else {
                continue;
            };
            let value = match (coerce_numeric(link.attribute(&self.main_attribute)), self.policy) {
                (Some(v), _) => Some(v),
                (None, NumericPolicy::Zero) => Some(0.0),
                (None, NumericPolicy::Skip) => None,
            };
            let day = days.entry(date).or_default();
            day.0 += 1;
            if let Some(v) = value {
                day.1 += 1;
                day.2 += v;
            }
        }

        days.into_iter()
            .map(|(date, (count, numeric, sum))| DateBucket {
                date,
                count,
                mean: (numeric > 0).then(|| sum / numeric as f64),
            })
            .collect()
    }

    fn highlighted_dates(&self) -> Vec<NaiveDate> {
        let Some(highlight) = &self.state.highlight else {
            return Vec::new();
        };
        let dates: BTreeSet<NaiveDate> = self
            .state
            .graph
            .links
            .iter()
            .filter(|link| match highlight {
                HighlightTarget::Node { identity } => link.touches(identity),
                HighlightTarget::Pair { source, target } => {
                    link.source == *source && link.target == *target
                }
            })
            .filter_map(|link| link.date)
            .collect();
        dates.into_iter().collect()
    }
}

impl Visualization for LineDiagram {
    fn kind(&self) -> ViewKind {
        ViewKind::Timeline
    }

    fn has_filter(&self, attribute: &str) -> bool {
        self.state.filters.has_filter(attribute)
    }

    fn update_filter(&mut self, filter: &Filter) {
        self.state.update_filter(filter);
    }

    fn update_date_range(&mut self, range: Option<DateRange>) {
        self.state.update_date_range(range);
    }

    fn rebuild(&mut self, store: &RecordStore) {
        self.state.rebuild(store);
        self.main_attribute = super::main_attribute(store);
        self.buckets = self.bucketize(&self.state.graph.links);
    }

    fn payload(&self) -> ViewPayload {
        let means = self.buckets.iter().filter_map(|b| b.mean);
        let (mean_min, mean_max) = means.fold((None, None), |(lo, hi): (Option<f64>, Option<f64>), m| {
            (Some(lo.map_or(m, |l| l.min(m))), Some(hi.map_or(m, |h| h.max(m))))
        });

        ViewPayload::Timeline(TimelinePayload {
            main_attribute: self.main_attribute.clone(),
            buckets: self.buckets.clone(),
            count_max: self.buckets.iter().map(|b| b.count).max().unwrap_or(0),
            mean_min,
            mean_max,
            hover_window: self.hover_window,
            selected: self.state.filters.date_filter().and_then(|f| f.selected()),
            highlight: self.state.highlight.clone(),
            highlighted_dates: self.highlighted_dates(),
        })
    }

    fn graph(&self) -> &GraphView {
        &self.state.graph
    }

    fn highlight(&mut self, target: &HighlightTarget) {
        self.state.highlight = Some(target.clone());
    }

    fn clear(&mut self) {
        self.state.highlight = None;
    }

    fn click_range(&self, date: NaiveDate) -> Option<DateRange> {
        LineDiagram::click_range(self, date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views::tests::{enron_store, seeded_filters};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2001, 3, d).unwrap()
    }

    fn diagram(window: usize) -> (LineDiagram, RecordStore) {
        let store = enron_store(&[
            ("2001-03-05", "a", "CEO", "b", "Trader", "1"),
            ("2001-03-01", "a", "CEO", "c", "Analyst", "0.5"),
            ("2001-03-05", "b", "Trader", "c", "Analyst", "0"),
            ("2001-03-10", "c", "Analyst", "a", "CEO", "-1"),
            ("2001-03-20", "c", "Analyst", "b", "Trader", "n/a"),
            ("garbage", "b", "Trader", "a", "CEO", "1"),
        ]);
        let settings = ViewSettings {
            hover_window: window,
            ..ViewSettings::default()
        };
        let mut view = LineDiagram::new(ViewState::new(seeded_filters(&store)), &settings);
        view.rebuild(&store);
        (view, store)
    }

    #[test]
    fn test_buckets_sorted_by_date() {
        let (view, _) = diagram(5);
        let dates: Vec<_> = view.buckets().iter().map(|b| b.date).collect();
        assert_eq!(dates, vec![day(1), day(5), day(10), day(20)]);

        let fifth = &view.buckets()[1];
        assert_eq!(fifth.count, 2);
        assert_eq!(fifth.mean, Some(0.5));
        // non-numeric counts as zero by default
        assert_eq!(view.buckets()[3].mean, Some(0.0));
    }

    #[test]
    fn test_window_clamps_to_edges() {
        let (view, _) = diagram(1);
        let window = view.window_at(day(9)).unwrap();
        assert_eq!(window, HoverWindow { index: 2, left: 1, right: 3 });

        let first = view.window_at(day(1)).unwrap();
        assert_eq!((first.left, first.right), (0, 1));
    }

    #[test]
    fn test_window_tie_prefers_earlier() {
        let (view, _) = diagram(0);
        // equidistant from the 1st and the 5th
        assert_eq!(view.window_at(day(3)).unwrap().index, 0);
    }

    #[test]
    fn test_click_range() {
        let (view, _) = diagram(5);
        let range = view.click_range(day(10)).unwrap();
        assert_eq!(range, DateRange { start: day(1), end: day(20) });

        let (narrow, _) = diagram(1);
        let range = narrow.click_range(day(10)).unwrap();
        assert_eq!(range, DateRange { start: day(5), end: day(20) });
    }

    #[test]
    fn test_date_range_narrows_buckets() {
        let (mut view, store) = diagram(5);
        view.update_date_range(Some(DateRange::new(day(5), day(10)).unwrap()));
        view.rebuild(&store);
        assert_eq!(view.buckets().len(), 2);

        view.update_date_range(None);
        view.rebuild(&store);
        assert_eq!(view.buckets().len(), 4);
    }

    #[test]
    fn test_empty_diagram_has_no_window() {
        let store = enron_store(&[]);
        let mut view = LineDiagram::new(ViewState::new(seeded_filters(&store)), &ViewSettings::default());
        view.rebuild(&store);
        assert!(view.window_at(day(1)).is_none());
        assert!(view.click_range(day(1)).is_none());
    }

    #[test]
    fn test_highlighted_dates() {
        let (mut view, _) = diagram(5);
        view.highlight(&HighlightTarget::Node {
            identity: "a".to_string(),
        });
        let ViewPayload::Timeline(payload) = view.payload() else {
            panic!("expected timeline payload");
        };
        assert_eq!(payload.highlighted_dates, vec![day(1), day(5), day(10)]);
        assert_eq!(payload.count_max, 2);
    }
}
