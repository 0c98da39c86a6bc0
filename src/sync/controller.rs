use super::{RedrawSink, SessionState, SyncError, ViewEvent};
use crate::filter::{DateRange, FilterEngine, FilterError};
use crate::model::RecordStore;
use crate::views::{
    CellInfo, HighlightTarget, ViewKind, ViewPayload, ViewSelection, ViewSettings, Visualization,
};
use chrono::NaiveDate;

/// Keeps the registered views consistent with the session filters.
///
/// Every change is fanned out one view at a time: a view is updated, rebuilt
/// and its redraw published before the next view is touched.
pub struct ViewSyncController {
    session: SessionState,
}

impl ViewSyncController {
    pub fn new(settings: ViewSettings) -> Self {
        Self {
            session: SessionState::new(settings),
        }
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    /// Seed the session with a dataset and redraw every registered view.
    pub fn load(&mut self, store: RecordStore, sink: &mut dyn RedrawSink) {
        tracing::info!(records = store.len(), "seeding session");
        self.session.seed(store);
        let version = self.session.version();
        self.fan_out(version, |_| true, |_| {}, sink);
    }

    /// Register a view. It starts with the session's current filters and is
    /// drawn right away when a dataset is loaded.
    pub fn register(&mut self, kind: ViewKind, sink: &mut dyn RedrawSink) {
        self.session.register(kind);
        if self.session.is_seeded() {
            let version = self.session.version();
            self.fan_out(version, |v| v.kind() == kind, |_| {}, sink);
        }
    }

    pub fn unregister(&mut self, kind: ViewKind) -> bool {
        self.session.unregister(kind)
    }

    /// Make the registry hold exactly the views of `selection`.
    pub fn select(&mut self, selection: ViewSelection, sink: &mut dyn RedrawSink) {
        let wanted = selection.kinds();
        let current: Vec<ViewKind> = self.session.registered().collect();

        for kind in current.iter().filter(|k| !wanted.contains(k)) {
            self.session.unregister(*kind);
        }
        for kind in wanted {
            if !current.contains(&kind) {
                self.register(kind, sink);
            }
        }
    }

    /// Replace a session filter's accepted values and fan the change out.
    pub fn set_filter_values<I, S>(
        &mut self,
        attribute: &str,
        values: I,
        sink: &mut dyn RedrawSink,
    ) -> Result<usize, SyncError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.session.store()?;
        self.session
            .filters_mut()
            .set_filter_values(attribute, values)?;
        self.on_filter_changed(attribute, sink)
    }

    /// Push the session filter on `attribute` to every view that filters on
    /// it. Views without that filter are left untouched. Returns the number
    /// of views rebuilt.
    pub fn on_filter_changed(
        &mut self,
        attribute: &str,
        sink: &mut dyn RedrawSink,
    ) -> Result<usize, SyncError> {
        self.session.store()?;
        let filter = self
            .session
            .filters()
            .filter(attribute)
            .cloned()
            .ok_or_else(|| FilterError::UnknownAttribute(attribute.to_string()))?;

        let version = self.session.bump();
        tracing::debug!(attribute, version, "filter changed");
        Ok(self.fan_out(
            version,
            |v| v.has_filter(attribute),
            |v| v.update_filter(&filter),
            sink,
        ))
    }

    /// Select (or with `None` clear) the date range and fan it out.
    pub fn set_date_range(
        &mut self,
        range: Option<DateRange>,
        sink: &mut dyn RedrawSink,
    ) -> Result<usize, SyncError> {
        self.session.store()?;
        match range {
            Some(range) => self.session.filters_mut().select_date_range(range)?,
            None => self.session.filters_mut().clear_date_range(),
        }
        self.on_date_range_changed(sink)
    }

    /// Push the session's selected date range to every view.
    pub fn on_date_range_changed(&mut self, sink: &mut dyn RedrawSink) -> Result<usize, SyncError> {
        self.session.store()?;
        let range = self.session.selected_date_range();
        let version = self.session.bump();
        tracing::debug!(?range, version, "date range changed");
        Ok(self.fan_out(version, |_| true, |v| v.update_date_range(range), sink))
    }

    /// A click on the line diagram selects the dates of its hover window.
    pub fn on_timeline_click(
        &mut self,
        date: NaiveDate,
        sink: &mut dyn RedrawSink,
    ) -> Result<Option<DateRange>, SyncError> {
        self.session.store()?;
        let range = self
            .session
            .view(ViewKind::Timeline)
            .ok_or(SyncError::ViewNotRegistered(ViewKind::Timeline))?
            .click_range(date);

        if let Some(range) = range {
            self.set_date_range(Some(range), sink)?;
        }
        Ok(range)
    }

    /// Highlight `target` on every view except `origin`; `None` clears.
    pub fn on_hover_or_select(
        &mut self,
        origin: ViewKind,
        target: Option<HighlightTarget>,
        sink: &mut dyn RedrawSink,
    ) -> Result<usize, SyncError> {
        self.session.store()?;
        let (_, _, views) = self.session.parts_mut();
        let mut touched = 0;

        for (kind, view) in views.iter_mut().filter(|(k, _)| **k != origin) {
            match &target {
                Some(t) => view.highlight(t),
                None => view.clear(),
            }
            sink.publish(ViewEvent::Highlight {
                view: *kind,
                origin,
                target: target.clone(),
            });
            touched += 1;
        }
        Ok(touched)
    }

    pub fn clear(&mut self, origin: ViewKind, sink: &mut dyn RedrawSink) -> Result<usize, SyncError> {
        self.on_hover_or_select(origin, None, sink)
    }

    pub fn payload(&self, kind: ViewKind) -> Result<ViewPayload, SyncError> {
        self.session.store()?;
        self.session
            .view(kind)
            .map(|v| v.payload())
            .ok_or(SyncError::ViewNotRegistered(kind))
    }

    /// Hover details of one matrix cell.
    pub fn cell_info(&self, source: &str, target: &str) -> Result<CellInfo, SyncError> {
        self.session.store()?;
        self.session
            .view(ViewKind::Matrix)
            .and_then(|v| v.cell_info(source, target))
            .ok_or(SyncError::ViewNotRegistered(ViewKind::Matrix))
    }

    /// Filters the session currently applies.
    pub fn filters(&self) -> &FilterEngine {
        self.session.filters()
    }

    fn fan_out(
        &mut self,
        version: u64,
        applies: impl Fn(&dyn Visualization) -> bool,
        update: impl Fn(&mut dyn Visualization),
        sink: &mut dyn RedrawSink,
    ) -> usize {
        let (Some(store), _, views) = self.session.parts_mut() else {
            return 0;
        };
        let mut rebuilt = 0;

        for (kind, view) in views.iter_mut() {
            if !applies(&**view) {
                continue;
            }
            update(&mut **view);
            view.rebuild(store);
            sink.publish(ViewEvent::Redraw {
                view: *kind,
                version,
                payload: view.payload(),
            });
            tracing::debug!(view = %kind, version, "redrawn");
            rebuilt += 1;
        }
        rebuilt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views::tests::enron_store;
    use std::collections::BTreeSet;

    fn store() -> RecordStore {
        enron_store(&[
            ("2001-05-01", "ann", "CEO", "bob", "Trader", "0.5"),
            ("2001-05-02", "bob", "Trader", "cid", "Analyst", "-0.2"),
            ("2001-05-03", "cid", "Analyst", "ann", "CEO", "0.1"),
            ("2001-05-04", "ann", "CEO", "cid", "Analyst", "0"),
            ("2001-05-05", "dan", "Lawyer", "bob", "Trader", "1"),
        ])
    }

    fn combined() -> (ViewSyncController, Vec<ViewEvent>) {
        let mut controller = ViewSyncController::new(ViewSettings::default());
        let mut events = Vec::new();
        controller.select(ViewSelection::Combined, &mut events);
        controller.load(store(), &mut events);
        (controller, events)
    }

    fn redraws(events: &[ViewEvent]) -> Vec<(ViewKind, u64)> {
        events
            .iter()
            .filter_map(|e| match e {
                ViewEvent::Redraw { view, version, .. } => Some((*view, *version)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_operations_before_seed_fail() {
        let mut controller = ViewSyncController::new(ViewSettings::default());
        let mut events = Vec::new();
        controller.register(ViewKind::Matrix, &mut events);

        assert!(events.is_empty());
        assert_eq!(
            controller.set_filter_values("jobtitle", ["CEO"], &mut events),
            Err(SyncError::NotSeeded)
        );
        assert_eq!(
            controller.on_date_range_changed(&mut events),
            Err(SyncError::NotSeeded)
        );
        assert_eq!(
            controller.clear(ViewKind::Matrix, &mut events),
            Err(SyncError::NotSeeded)
        );
        assert_eq!(controller.payload(ViewKind::Matrix), Err(SyncError::NotSeeded));
    }

    #[test]
    fn test_load_redraws_every_view_in_order() {
        let (controller, events) = combined();
        assert_eq!(
            redraws(&events),
            vec![
                (ViewKind::Matrix, 1),
                (ViewKind::Hierarchy, 1),
                (ViewKind::Timeline, 1),
            ]
        );
        assert_eq!(controller.session().version(), 1);
    }

    #[test]
    fn test_filter_fan_out_bumps_version() {
        let (mut controller, _) = combined();
        let mut events = Vec::new();

        let rebuilt = controller
            .set_filter_values("jobtitle", ["CEO", "Trader", "Analyst"], &mut events)
            .unwrap();

        assert_eq!(rebuilt, 3);
        assert!(redraws(&events).iter().all(|(_, version)| *version == 2));

        let matrix = controller.session().view(ViewKind::Matrix).unwrap();
        assert!(!matrix.graph().source_nodes.contains("dan"));
    }

    #[test]
    fn test_unknown_filter_attribute() {
        let (mut controller, _) = combined();
        let mut events = Vec::new();
        let err = controller
            .set_filter_values("department", ["x"], &mut events)
            .unwrap_err();
        assert_eq!(
            err,
            SyncError::Filter(FilterError::UnknownAttribute("department".to_string()))
        );
        assert!(events.is_empty());
    }

    #[test]
    fn test_views_agree_on_membership_and_links() {
        let (mut controller, _) = combined();
        let mut events = Vec::new();
        controller
            .set_filter_values("email", ["ann", "bob", "cid"], &mut events)
            .unwrap();
        let day = |d| NaiveDate::from_ymd_opt(2001, 5, d).unwrap();
        controller
            .set_date_range(Some(DateRange::new(day(1), day(3)).unwrap()), &mut events)
            .unwrap();

        let session = controller.session();
        let matrix = session.view(ViewKind::Matrix).unwrap();
        let hierarchy = session.view(ViewKind::Hierarchy).unwrap();

        let ids = |v: &dyn Visualization| {
            v.graph()
                .identities()
                .into_iter()
                .map(String::from)
                .collect::<BTreeSet<_>>()
        };
        assert_eq!(ids(matrix), ids(hierarchy));
        assert_eq!(matrix.graph().links.len(), hierarchy.graph().links.len());
        assert_eq!(matrix.graph().links.len(), 3);

        let (ViewPayload::Matrix(m), ViewPayload::Hierarchy(h)) = (matrix.payload(), hierarchy.payload())
        else {
            panic!("unexpected payload kinds");
        };
        let cell_total: usize = m.cells.iter().map(|c| c.total).sum();
        let edge_total: usize = h.edges.iter().map(|e| e.total).sum();
        assert_eq!(cell_total, edge_total);
    }

    #[test]
    fn test_highlight_skips_origin() {
        let (mut controller, _) = combined();
        let mut events = Vec::new();
        let target = HighlightTarget::Pair {
            source: "ann".to_string(),
            target: "bob".to_string(),
        };

        let touched = controller
            .on_hover_or_select(ViewKind::Matrix, Some(target), &mut events)
            .unwrap();

        assert_eq!(touched, 2);
        let views: Vec<_> = events.iter().map(ViewEvent::view).collect();
        assert_eq!(views, vec![ViewKind::Hierarchy, ViewKind::Timeline]);

        let ViewPayload::Timeline(timeline) = controller.payload(ViewKind::Timeline).unwrap() else {
            panic!("expected timeline payload");
        };
        assert_eq!(timeline.highlighted_dates, vec![NaiveDate::from_ymd_opt(2001, 5, 1).unwrap()]);

        controller.clear(ViewKind::Matrix, &mut events).unwrap();
        let ViewPayload::Timeline(timeline) = controller.payload(ViewKind::Timeline).unwrap() else {
            panic!("expected timeline payload");
        };
        assert!(timeline.highlight.is_none());
    }

    #[test]
    fn test_timeline_click_routes_date_range() {
        let mut controller = ViewSyncController::new(ViewSettings {
            hover_window: 1,
            ..ViewSettings::default()
        });
        let mut events = Vec::new();
        controller.select(ViewSelection::Combined, &mut events);
        controller.load(store(), &mut events);
        events.clear();

        let day = |d| NaiveDate::from_ymd_opt(2001, 5, d).unwrap();
        let range = controller.on_timeline_click(day(3), &mut events).unwrap();

        assert_eq!(range, Some(DateRange { start: day(2), end: day(4) }));
        assert_eq!(controller.session().selected_date_range(), range);
        assert_eq!(redraws(&events).len(), 3);
        let matrix = controller.session().view(ViewKind::Matrix).unwrap();
        assert_eq!(matrix.graph().links.len(), 3);
    }

    #[test]
    fn test_click_without_timeline() {
        let mut controller = ViewSyncController::new(ViewSettings::default());
        let mut events = Vec::new();
        controller.register(ViewKind::Matrix, &mut events);
        controller.load(store(), &mut events);

        let day = NaiveDate::from_ymd_opt(2001, 5, 3).unwrap();
        assert_eq!(
            controller.on_timeline_click(day, &mut events),
            Err(SyncError::ViewNotRegistered(ViewKind::Timeline))
        );
    }

    #[test]
    fn test_select_replaces_registry() {
        let (mut controller, _) = combined();
        let mut events = Vec::new();
        controller.select(ViewSelection::Matrix, &mut events);

        assert_eq!(controller.session().registered().collect::<Vec<_>>(), vec![ViewKind::Matrix]);
        assert!(events.is_empty());
    }

    #[test]
    fn test_filter_change_skips_views_without_that_filter() {
        let (mut controller, _) = combined();
        let narrow = crate::views::create(
            ViewKind::Hierarchy,
            controller.session().settings(),
            &FilterEngine::new(),
        );
        controller.session.insert(ViewKind::Hierarchy, narrow);

        let mut events = Vec::new();
        let rebuilt = controller
            .set_filter_values("jobtitle", ["CEO"], &mut events)
            .unwrap();

        assert_eq!(rebuilt, 2);
        assert_eq!(
            redraws(&events),
            vec![(ViewKind::Matrix, 2), (ViewKind::Timeline, 2)]
        );
        let hierarchy = controller.session().view(ViewKind::Hierarchy).unwrap();
        assert!(!hierarchy.has_filter("jobtitle"));
    }

    #[test]
    fn test_cell_info_reads_matrix() {
        let (controller, _) = combined();
        let info = controller.cell_info("ann", "bob").unwrap();

        assert_eq!(info.source.unwrap().get("jobtitle").unwrap(), "CEO");
        assert_eq!(info.target.unwrap().get("jobtitle").unwrap(), "Trader");
        assert_eq!(info.stats.unwrap().total, 1);
    }

    #[test]
    fn test_cell_info_needs_matrix() {
        let mut controller = ViewSyncController::new(ViewSettings::default());
        assert_eq!(controller.cell_info("ann", "bob"), Err(SyncError::NotSeeded));

        let mut events = Vec::new();
        controller.register(ViewKind::Timeline, &mut events);
        controller.load(store(), &mut events);
        assert_eq!(
            controller.cell_info("ann", "bob"),
            Err(SyncError::ViewNotRegistered(ViewKind::Matrix))
        );
    }

    #[test]
    fn test_late_registration_inherits_filters() {
        let mut controller = ViewSyncController::new(ViewSettings::default());
        let mut events = Vec::new();
        controller.register(ViewKind::Matrix, &mut events);
        controller.load(store(), &mut events);
        controller
            .set_filter_values("jobtitle", ["CEO"], &mut events)
            .unwrap();

        events.clear();
        controller.register(ViewKind::Hierarchy, &mut events);
        assert_eq!(redraws(&events), vec![(ViewKind::Hierarchy, 2)]);

        let hierarchy = controller.session().view(ViewKind::Hierarchy).unwrap();
        let matrix = controller.session().view(ViewKind::Matrix).unwrap();
        assert_eq!(hierarchy.graph(), matrix.graph());
    }
}
