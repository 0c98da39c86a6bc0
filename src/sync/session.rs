use super::SyncError;
use crate::filter::{DateRange, FilterEngine};
use crate::model::RecordStore;
use crate::views::{self, ViewKind, ViewSettings, Visualization};
use indexmap::{IndexMap, IndexSet};

/// Everything one interactive session owns: the loaded dataset, the
/// session-wide filters and the registered views.
pub struct SessionState {
    store: Option<RecordStore>,
    filters: FilterEngine,
    domains: IndexMap<String, IndexSet<String>>,
    views: IndexMap<ViewKind, Box<dyn Visualization>>,
    settings: ViewSettings,
    version: u64,
}

impl SessionState {
    pub fn new(settings: ViewSettings) -> Self {
        Self {
            store: None,
            filters: FilterEngine::new(),
            domains: IndexMap::new(),
            views: IndexMap::new(),
            settings,
            version: 0,
        }
    }

    /// Replace the dataset. Filters start over with every value selected.
    pub(crate) fn seed(&mut self, store: RecordStore) {
        let mut filters = FilterEngine::new();
        self.domains = filters.seed_from_store(&store);
        self.filters = filters;
        self.store = Some(store);
        self.bump();

        let kinds: Vec<ViewKind> = self.views.keys().copied().collect();
        for kind in kinds {
            self.views
                .insert(kind, views::create(kind, &self.settings, &self.filters));
        }
    }

    pub fn is_seeded(&self) -> bool {
        self.store.is_some()
    }

    pub fn store(&self) -> Result<&RecordStore, SyncError> {
        self.store.as_ref().ok_or(SyncError::NotSeeded)
    }

    pub fn filters(&self) -> &FilterEngine {
        &self.filters
    }

    pub(crate) fn filters_mut(&mut self) -> &mut FilterEngine {
        &mut self.filters
    }

    /// Every value each node attribute takes in the dataset.
    pub fn domains(&self) -> &IndexMap<String, IndexSet<String>> {
        &self.domains
    }

    pub fn settings(&self) -> &ViewSettings {
        &self.settings
    }

    pub fn selected_date_range(&self) -> Option<DateRange> {
        self.filters.date_filter().and_then(|f| f.selected())
    }

    /// Dataset version, bumped on every change that triggers a rebuild.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub(crate) fn bump(&mut self) -> u64 {
        self.version += 1;
        self.version
    }

    pub fn registered(&self) -> impl Iterator<Item = ViewKind> + '_ {
        self.views.keys().copied()
    }

    pub fn view(&self, kind: ViewKind) -> Option<&dyn Visualization> {
        self.views.get(&kind).map(|v| v.as_ref())
    }

    /// Create a view whose filters mirror the session's current filters.
    pub(crate) fn register(&mut self, kind: ViewKind) {
        let view = views::create(kind, &self.settings, &self.filters);
        self.insert(kind, view);
    }

    /// Register an already built view, replacing any view of the same kind.
    pub(crate) fn insert(&mut self, kind: ViewKind, view: Box<dyn Visualization>) {
        self.views.insert(kind, view);
    }

    pub(crate) fn unregister(&mut self, kind: ViewKind) -> bool {
        self.views.shift_remove(&kind).is_some()
    }

    /// The store and the views, borrowed apart so views can rebuild against it.
    pub(crate) fn parts_mut(
        &mut self,
    ) -> (
        Option<&RecordStore>,
        &FilterEngine,
        &mut IndexMap<ViewKind, Box<dyn Visualization>>,
    ) {
        (self.store.as_ref(), &self.filters, &mut self.views)
    }
}
