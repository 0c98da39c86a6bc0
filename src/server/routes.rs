use super::assets::INDEX_HTML;
use crate::filter::{DateRange, FilterError, parse_date};
use crate::graph::GraphData;
use crate::style;
use crate::sync::{RedrawSink, SyncError, ViewEvent, ViewSyncController};
use crate::views::{CellInfo, HighlightTarget, ViewKind, ViewPayload};
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{
        Html, IntoResponse,
        sse::{Event, KeepAlive, Sse},
    },
    routing::{delete, get, post},
};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, broadcast};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::{Stream, StreamExt};
use tower_http::cors::{Any, CorsLayer};

/// Application state shared across handlers. The controller mutex is the
/// session's single thread of control.
pub struct AppState {
    pub controller: Mutex<ViewSyncController>,
    pub events: broadcast::Sender<ViewEvent>,
}

impl AppState {
    pub fn new(controller: ViewSyncController) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            controller: Mutex::new(controller),
            events,
        }
    }
}

/// Publishes redraws to every connected event stream.
pub struct BroadcastSink<'a> {
    tx: &'a broadcast::Sender<ViewEvent>,
}

impl<'a> BroadcastSink<'a> {
    pub fn new(tx: &'a broadcast::Sender<ViewEvent>) -> Self {
        Self { tx }
    }
}

impl RedrawSink for BroadcastSink<'_> {
    fn publish(&mut self, event: ViewEvent) {
        // No subscribers is fine: the page fetches views on connect.
        let _ = self.tx.send(event);
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type Rejection = (StatusCode, Json<ErrorResponse>);

fn rejection(status: StatusCode, error: impl ToString) -> Rejection {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
}

/// HTTP status for a sync failure.
pub fn status_for(err: &SyncError) -> StatusCode {
    match err {
        SyncError::NotSeeded => StatusCode::CONFLICT,
        SyncError::ViewNotRegistered(_) => StatusCode::NOT_FOUND,
        SyncError::Filter(FilterError::UnknownAttribute(_)) => StatusCode::NOT_FOUND,
        SyncError::Filter(FilterError::InvalidDateRange { .. }) => StatusCode::BAD_REQUEST,
        SyncError::Filter(FilterError::NoDateAttribute) => StatusCode::CONFLICT,
    }
}

fn reject(err: SyncError) -> Rejection {
    rejection(status_for(&err), err)
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub version: u64,
    pub views: Vec<ViewKind>,
    #[serde(flatten)]
    pub graph: GraphData,
}

#[derive(Debug, Serialize)]
pub struct ViewResponse {
    pub view: ViewKind,
    pub version: u64,
    pub payload: ViewPayload,
}

#[derive(Debug, Serialize)]
pub struct FanOutResponse {
    pub version: u64,
    pub views: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<DateRange>,
}

#[derive(Debug, Deserialize)]
pub struct FilterRequest {
    pub values: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct DateRangeRequest {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Deserialize)]
pub struct HighlightRequest {
    /// The view the pointer is over.
    pub source: ViewKind,
    pub target: HighlightTarget,
}

#[derive(Debug, Deserialize)]
pub struct ClickRequest {
    pub date: String,
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/", get(index_handler))
        .route("/api/session", get(session_handler))
        .route("/api/views", get(views_handler))
        .route("/api/views/{view}", get(view_handler))
        .route("/api/views/{view}/click", post(click_handler))
        .route("/api/matrix/cells/{source}/{target}", get(cell_handler))
        .route("/api/filters/{attribute}", post(filter_handler))
        .route("/api/date-range", post(date_range_handler).delete(clear_date_range_handler))
        .route("/api/highlight", post(highlight_handler))
        .route("/api/highlight/{source}", delete(clear_highlight_handler))
        .route("/api/events", get(events_handler))
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server for an already loaded session.
pub async fn serve(
    controller: ViewSyncController,
    port: u16,
    open_browser: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let state = Arc::new(AppState::new(controller));
    let app = router(state);

    let addr = format!("127.0.0.1:{}", port);
    let url = format!("http://{}", addr);

    style::status(&format!("Serving on {}", style::url(&url)));
    style::hint("Press Ctrl+C to stop");

    if open_browser {
        if let Err(e) = open::that(&url) {
            style::warning(&format!("Could not open browser: {}", e));
        }
    }

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}

fn parse_view(name: &str) -> Result<ViewKind, Rejection> {
    ViewKind::parse(name)
        .ok_or_else(|| rejection(StatusCode::NOT_FOUND, format!("Unknown view '{}'", name)))
}

fn parse_day(raw: &str) -> Result<chrono::NaiveDate, Rejection> {
    parse_date(raw)
        .ok_or_else(|| rejection(StatusCode::BAD_REQUEST, format!("Invalid date '{}'", raw)))
}

async fn index_handler() -> impl IntoResponse {
    Html(INDEX_HTML)
}

async fn session_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SessionResponse>, Rejection> {
    let controller = state.controller.lock().await;
    let session = controller.session();
    let store = session.store().map_err(reject)?;

    let graph = GraphData::from_session(
        store,
        session.filters(),
        session.domains(),
        session.settings().numeric_policy,
    );
    Ok(Json(SessionResponse {
        version: session.version(),
        views: session.registered().collect(),
        graph,
    }))
}

async fn views_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ViewResponse>>, Rejection> {
    let controller = state.controller.lock().await;
    let version = controller.session().version();

    let views = controller
        .session()
        .registered()
        .map(|view| {
            controller.payload(view).map(|payload| ViewResponse {
                view,
                version,
                payload,
            })
        })
        .collect::<Result<Vec<_>, _>>()
        .map_err(reject)?;
    Ok(Json(views))
}

async fn view_handler(
    State(state): State<Arc<AppState>>,
    Path(view): Path<String>,
) -> Result<Json<ViewResponse>, Rejection> {
    let view = parse_view(&view)?;
    let controller = state.controller.lock().await;
    let payload = controller.payload(view).map_err(reject)?;
    Ok(Json(ViewResponse {
        view,
        version: controller.session().version(),
        payload,
    }))
}

async fn cell_handler(
    State(state): State<Arc<AppState>>,
    Path((source, target)): Path<(String, String)>,
) -> Result<Json<CellInfo>, Rejection> {
    let controller = state.controller.lock().await;
    let info = controller.cell_info(&source, &target).map_err(reject)?;
    Ok(Json(info))
}

async fn filter_handler(
    State(state): State<Arc<AppState>>,
    Path(attribute): Path<String>,
    Json(request): Json<FilterRequest>,
) -> Result<Json<FanOutResponse>, Rejection> {
    let mut controller = state.controller.lock().await;
    let mut sink = BroadcastSink::new(&state.events);
    let views = controller
        .set_filter_values(&attribute, request.values, &mut sink)
        .map_err(reject)?;

    Ok(Json(FanOutResponse {
        version: controller.session().version(),
        views,
        range: None,
    }))
}

async fn date_range_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<DateRangeRequest>,
) -> Result<Json<FanOutResponse>, Rejection> {
    let range = DateRange::new(parse_day(&request.start)?, parse_day(&request.end)?)
        .map_err(|e| rejection(StatusCode::BAD_REQUEST, e))?;

    let mut controller = state.controller.lock().await;
    let mut sink = BroadcastSink::new(&state.events);
    let views = controller
        .set_date_range(Some(range), &mut sink)
        .map_err(reject)?;

    Ok(Json(FanOutResponse {
        version: controller.session().version(),
        views,
        range: Some(range),
    }))
}

async fn clear_date_range_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<FanOutResponse>, Rejection> {
    let mut controller = state.controller.lock().await;
    let mut sink = BroadcastSink::new(&state.events);
    let views = controller.set_date_range(None, &mut sink).map_err(reject)?;

    Ok(Json(FanOutResponse {
        version: controller.session().version(),
        views,
        range: None,
    }))
}

async fn click_handler(
    State(state): State<Arc<AppState>>,
    Path(view): Path<String>,
    Json(request): Json<ClickRequest>,
) -> Result<Json<FanOutResponse>, Rejection> {
    let view = parse_view(&view)?;
    if view != ViewKind::Timeline {
        return Err(rejection(
            StatusCode::BAD_REQUEST,
            format!("The {} view does not select dates", view),
        ));
    }
    let date = parse_day(&request.date)?;

    let mut controller = state.controller.lock().await;
    let mut sink = BroadcastSink::new(&state.events);
    let range = controller
        .on_timeline_click(date, &mut sink)
        .map_err(reject)?;

    Ok(Json(FanOutResponse {
        version: controller.session().version(),
        views: if range.is_some() {
            controller.session().registered().count()
        } else {
            0
        },
        range,
    }))
}

async fn highlight_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<HighlightRequest>,
) -> Result<Json<FanOutResponse>, Rejection> {
    let mut controller = state.controller.lock().await;
    let mut sink = BroadcastSink::new(&state.events);
    let views = controller
        .on_hover_or_select(request.source, Some(request.target), &mut sink)
        .map_err(reject)?;

    Ok(Json(FanOutResponse {
        version: controller.session().version(),
        views,
        range: None,
    }))
}

async fn clear_highlight_handler(
    State(state): State<Arc<AppState>>,
    Path(source): Path<String>,
) -> Result<Json<FanOutResponse>, Rejection> {
    let source = parse_view(&source)?;
    let mut controller = state.controller.lock().await;
    let mut sink = BroadcastSink::new(&state.events);
    let views = controller.clear(source, &mut sink).map_err(reject)?;

    Ok(Json(FanOutResponse {
        version: controller.session().version(),
        views,
        range: None,
    }))
}

async fn events_handler(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.events.subscribe();

    let stream = BroadcastStream::new(rx).map(|result| {
        let (name, data) = sse_frame(result);
        Ok(Event::default().event(name).data(data))
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

/// Event name and data for one broadcast item. A lagged receiver gets a
/// `resync` telling the page to refetch every view.
fn sse_frame(result: Result<ViewEvent, BroadcastStreamRecvError>) -> (&'static str, String) {
    match result {
        Ok(event) => (event.name(), serde_json::to_string(&event).unwrap_or_default()),
        Err(BroadcastStreamRecvError::Lagged(missed)) => {
            tracing::warn!(missed, "event stream lagged");
            ("resync", missed.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views::{ViewSelection, ViewSettings};
    use crate::views::tests::enron_store;

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(&SyncError::NotSeeded), StatusCode::CONFLICT);
        assert_eq!(
            status_for(&SyncError::ViewNotRegistered(ViewKind::Timeline)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(&SyncError::Filter(FilterError::UnknownAttribute("x".into()))),
            StatusCode::NOT_FOUND
        );
        let day = chrono::NaiveDate::from_ymd_opt(2001, 1, 1).unwrap();
        assert_eq!(
            status_for(&SyncError::Filter(FilterError::InvalidDateRange {
                start: day,
                end: day
            })),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_broadcast_sink_reaches_subscribers() {
        let state = AppState::new(ViewSyncController::new(ViewSettings::default()));
        let mut rx = state.events.subscribe();

        let mut controller = ViewSyncController::new(ViewSettings::default());
        let mut sink = BroadcastSink::new(&state.events);
        controller.select(ViewSelection::Combined, &mut sink);
        controller.load(
            enron_store(&[("2001-01-01", "a", "CEO", "b", "Trader", "1")]),
            &mut sink,
        );

        let first = rx.try_recv().unwrap();
        assert_eq!(first.name(), "redraw");
        assert_eq!(first.view(), ViewKind::Matrix);
        assert_eq!(rx.try_recv().unwrap().view(), ViewKind::Hierarchy);
        assert_eq!(rx.try_recv().unwrap().view(), ViewKind::Timeline);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_lagged_stream_asks_for_resync() {
        let (name, data) = sse_frame(Err(BroadcastStreamRecvError::Lagged(7)));
        assert_eq!(name, "resync");
        assert_eq!(data, "7");

        let (name, data) = sse_frame(Ok(ViewEvent::Highlight {
            view: ViewKind::Timeline,
            origin: ViewKind::Matrix,
            target: None,
        }));
        assert_eq!(name, "highlight");
        assert!(data.contains("\"view\":\"timeline\""));
    }

    #[test]
    fn test_cell_route_returns_hover_details() {
        let mut controller = ViewSyncController::new(ViewSettings::default());
        controller.select(ViewSelection::Matrix, &mut crate::sync::Discard);
        controller.load(
            enron_store(&[
                ("2001-01-01", "a", "CEO", "b", "Trader", "0.5"),
                ("2001-01-02", "a", "CEO", "b", "Trader", "-0.1"),
            ]),
            &mut crate::sync::Discard,
        );
        let state = Arc::new(AppState::new(controller));
        let rt = tokio::runtime::Runtime::new().unwrap();

        let Json(info) = rt
            .block_on(cell_handler(
                State(state.clone()),
                Path(("a".to_string(), "b".to_string())),
            ))
            .unwrap();
        assert_eq!(info.stats.unwrap().total, 2);
        assert_eq!(info.target.unwrap().get("jobtitle").unwrap(), "Trader");

        let Json(empty) = rt
            .block_on(cell_handler(
                State(state),
                Path(("b".to_string(), "a".to_string())),
            ))
            .unwrap();
        assert!(empty.stats.is_none());
    }

    #[test]
    fn test_sink_without_subscribers_does_not_fail() {
        let (tx, _) = broadcast::channel(4);
        let mut sink = BroadcastSink::new(&tx);
        let mut controller = ViewSyncController::new(ViewSettings::default());
        controller.register(ViewKind::Matrix, &mut sink);
        controller.load(enron_store(&[]), &mut sink);
        assert_eq!(controller.session().version(), 1);
    }
}
