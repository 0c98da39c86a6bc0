//! Fan-out of filter, date and highlight changes to the registered views.

mod controller;
mod session;

pub use controller::ViewSyncController;
pub use session::SessionState;

use crate::filter::FilterError;
use crate::views::{HighlightTarget, ViewKind, ViewPayload};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum SyncError {
    #[error("No dataset has been loaded into the session")]
    NotSeeded,
    #[error("The {0} view is not registered")]
    ViewNotRegistered(ViewKind),
    #[error(transparent)]
    Filter(#[from] FilterError),
}

/// What a view has to redraw.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum ViewEvent {
    Redraw {
        view: ViewKind,
        version: u64,
        payload: ViewPayload,
    },
    Highlight {
        view: ViewKind,
        origin: ViewKind,
        target: Option<HighlightTarget>,
    },
}

impl ViewEvent {
    pub fn view(&self) -> ViewKind {
        match self {
            ViewEvent::Redraw { view, .. } | ViewEvent::Highlight { view, .. } => *view,
        }
    }

    /// SSE event name.
    pub fn name(&self) -> &'static str {
        match self {
            ViewEvent::Redraw { .. } => "redraw",
            ViewEvent::Highlight { .. } => "highlight",
        }
    }
}

/// Receives the events produced by a fan-out, in order.
pub trait RedrawSink {
    fn publish(&mut self, event: ViewEvent);
}

impl RedrawSink for Vec<ViewEvent> {
    fn publish(&mut self, event: ViewEvent) {
        self.push(event);
    }
}

/// Sink that drops everything.
pub struct Discard;

impl RedrawSink for Discard {
    fn publish(&mut self, _event: ViewEvent) {}
}
