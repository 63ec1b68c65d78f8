use crate::basemap::BaseMap;
use crate::carousel::{Carousel, CarouselEvent, CarouselLayout};
use crate::chrome::{BackToTop, BackToTopEvent, NavEvent, ScrollSpy, Section, Visibility};
use crate::config::AppConfig;
use crate::data::Portfolio;
use crate::dotmap::{DotMap, HoverInfo};
use crate::error::VizError;
use crate::graph::{GraphEvent, GraphView};
use crate::markers::{MarkerManager, Reconciliation};
use crate::page;
use crate::render::{render_chart, Chart, ChartOptions};
use crate::svg::Element;
use crate::symbolmap::SymbolMap;
use crate::types::{Responsive, Viewport};
use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::{info, warn};

// The symbol map's marker simulation and the frame it last produced.
pub struct LiveMap {
    pub map: SymbolMap,
    pub markers: MarkerManager,
    pub frame: Reconciliation,
}

pub struct AppState {
    pub config: AppConfig,
    pub portfolio: Portfolio,
    pub live: Mutex<LiveMap>,
    pub dotmap: Mutex<DotMap>,
    pub graph: Mutex<GraphView>,
    pub carousel: Mutex<Carousel>,
    // Set once the page has reported a scroll without a content section.
    content_missing_logged: AtomicBool,
}

impl AppState {
    pub fn new(config: AppConfig, portfolio: Portfolio, base_map: Option<Arc<BaseMap>>) -> Self {
        let map = SymbolMap::new(base_map.clone(), config.layout.symbolmap_width, config.symbol_map.clone());
        let dotmap = DotMap::new(
            &portfolio.travel,
            base_map,
            config.layout.dotmap_width,
            &mut rand::thread_rng(),
        );
        let markers = MarkerManager::new(config.symbol_map.lifespan());
        let graph = GraphView::new(
            &portfolio.skill_graph,
            Viewport::new(config.layout.graph_width, config.layout.graph_height),
        );
        let carousel = Carousel::new(portfolio.gallery.clone(), CarouselLayout::default());
        Self {
            live: Mutex::new(LiveMap { map, markers, frame: Reconciliation::default() }),
            dotmap: Mutex::new(dotmap),
            graph: Mutex::new(graph),
            carousel: Mutex::new(carousel),
            content_missing_logged: AtomicBool::new(false),
            config,
            portfolio,
        }
    }

    fn live(&self) -> MutexGuard<'_, LiveMap> {
        self.live.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn dotmap(&self) -> MutexGuard<'_, DotMap> {
        self.dotmap.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn graph(&self) -> MutexGuard<'_, GraphView> {
        self.graph.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn carousel(&self) -> MutexGuard<'_, Carousel> {
        self.carousel.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // Back-to-top threshold for a scroll report. A page without a content
    // section is only reported once.
    fn back_to_top_threshold(&self, content_top: Option<f64>, window_height: f64) -> f64 {
        match content_top {
            Some(top) => top,
            None => {
                if !self.content_missing_logged.swap(true, Ordering::Relaxed) {
                    warn!("Content section not found; back-to-top button uses half the window height");
                }
                BackToTop::fallback_threshold(window_height)
            }
        }
    }

    // One interval of the marker simulation. Does nothing without a base map.
    pub fn tick(&self, now: Instant) {
        let mut live = self.live();
        if !live.map.is_live() {
            return;
        }
        let frame = live.markers.tick(now);
        live.frame = frame;
    }
}

impl IntoResponse for VizError {
    fn into_response(self) -> Response {
        let status = match self {
            VizError::UnknownChart(_) | VizError::UnknownNode(_) | VizError::MissingContainer(_) => {
                StatusCode::NOT_FOUND
            }
            VizError::MissingCoordinates(_) => StatusCode::BAD_REQUEST,
            VizError::BaseMap(_) | VizError::Topology(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        (status, self.to_string()).into_response()
    }
}

#[derive(Deserialize)]
pub struct HoverParams {
    x: f64,
    y: f64,
}

// Scroll position and section boxes measured by the browser.
#[derive(Deserialize)]
pub struct ScrollReport {
    scroll_y: f64,
    window_height: f64,
    #[serde(default)]
    content_top: Option<f64>,
    #[serde(default)]
    sections: Vec<Section>,
}

#[derive(Serialize)]
pub struct ChromeState {
    active: Option<String>,
    scrolled: bool,
    back_to_top: Visibility,
    nav: String,
    back_to_top_html: String,
}

pub fn app(state: Arc<AppState>) -> Router {
    let site = ServeDir::new(&state.config.output.site_dir);
    Router::new()
        .route("/api/charts/:name", get(chart_handler))
        .route("/api/symbolmap/frame", get(frame_handler))
        .route("/api/symbolmap/markers", get(markers_handler))
        .route("/api/dotmap/hover", get(hover_handler))
        .route("/api/chrome/scroll", post(scroll_handler))
        .route("/api/graph/event", post(graph_event_handler))
        .route("/api/carousel/event", post(carousel_event_handler))
        .fallback_service(site)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start_server(config: AppConfig, portfolio: Portfolio, base_map: Option<Arc<BaseMap>>) -> Result<()> {
    let port = config.server.port;
    let interval = config.symbol_map.interval();
    let state = Arc::new(AppState::new(config, portfolio, base_map));

    if state.live().map.is_live() {
        let ticker = state.clone();
        tokio::spawn(async move {
            let mut timer = tokio::time::interval(interval);
            loop {
                timer.tick().await;
                ticker.tick(Instant::now());
            }
        });
    } else {
        warn!("No base map, symbol map simulation not started");
    }

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    info!("Starting server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(state)).await?;
    Ok(())
}

// SVG charts go out as `image/svg+xml`; tables, the carousel and fallback
// text are HTML fragments.
fn markup_response(element: &Element) -> Response {
    let content_type = if element.name() == "svg" {
        "image/svg+xml"
    } else {
        "text/html; charset=utf-8"
    };
    ([(header::CONTENT_TYPE, content_type)], element.render()).into_response()
}

async fn chart_handler(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Query(options): Query<ChartOptions>,
) -> Result<Response, VizError> {
    let element = match name.as_str() {
        "dotmap" => {
            let mut dotmap = state.dotmap();
            if let Some(width) = options.width {
                dotmap.resize(DotMap::viewport_for(width));
            }
            dotmap.render()
        }
        "symbolmap" => {
            let mut live = state.live();
            if let Some(width) = options.width {
                live.map.resize(SymbolMap::viewport_for(width));
            }
            live.map.render(&live.frame)
        }
        "graph" => {
            let mut graph = state.graph();
            if let Some(width) = options.width {
                if !graph.resize(Viewport::new(width, state.config.layout.graph_height)) {
                    warn!("Graph cannot be drawn at width {}", width);
                }
            }
            if let Some(id) = &options.highlight {
                graph.handle(GraphEvent::Hover(id.clone()))?;
            }
            graph.render()
        }
        "carousel" => state.carousel().render(),
        other => {
            let chart = Chart::from_name(other)?;
            render_chart(chart, &state.portfolio, &state.config.layout, &options)?
        }
    };
    Ok(markup_response(&element))
}

async fn frame_handler(State(state): State<Arc<AppState>>) -> Response {
    let element = {
        let live = state.live();
        live.map.render(&live.frame)
    };
    markup_response(&element)
}

async fn graph_event_handler(
    State(state): State<Arc<AppState>>,
    Json(event): Json<GraphEvent>,
) -> Result<Response, VizError> {
    let element = {
        let mut graph = state.graph();
        graph.handle(event)?;
        graph.render()
    };
    Ok(markup_response(&element))
}

async fn carousel_event_handler(
    State(state): State<Arc<AppState>>,
    Json(event): Json<CarouselEvent>,
) -> Response {
    let element = {
        let mut carousel = state.carousel();
        carousel.handle(event);
        carousel.render()
    };
    markup_response(&element)
}

async fn markers_handler(State(state): State<Arc<AppState>>) -> Json<Reconciliation> {
    let frame = state.live().frame.clone();
    Json(frame)
}

async fn hover_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HoverParams>,
) -> Json<Option<HoverInfo>> {
    let info = state.dotmap().hover_at(params.x, params.y);
    Json(info)
}

async fn scroll_handler(
    State(state): State<Arc<AppState>>,
    Json(report): Json<ScrollReport>,
) -> Json<ChromeState> {
    let mut spy = ScrollSpy::new(page::nav_items(), report.sections);
    spy.handle(NavEvent::Scroll(report.scroll_y));
    let threshold = state.back_to_top_threshold(report.content_top, report.window_height);
    let mut button = BackToTop::with_threshold(threshold);
    button.handle(BackToTopEvent::Scroll(report.scroll_y));

    Json(ChromeState {
        active: spy.active().map(str::to_string),
        scrolled: spy.is_scrolled(),
        back_to_top: button.state(),
        nav: spy.render().render(),
        back_to_top_html: button.render().render(),
    })
}
